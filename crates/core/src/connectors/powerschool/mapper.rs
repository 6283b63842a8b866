use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, SlateError};
use crate::models::{
    course::NewCourse, email::NewEmailAddress, school::NewSchool, teacher::NewTeacher,
    term::NewTerm,
};

use super::models::{RawRecord, RawTable};

/// Maps upstream query records into normalized records.
///
/// Identifying integers and term dates are required: a value that does not
/// parse aborts the run with [`SlateError::MalformedRecord`]. Optional numbers
/// fall back to a default and log the bad value. Flags are set only by the
/// exact string `"1"`.
pub struct RecordTransformer;

impl RecordTransformer {
    pub fn school(record: &RawRecord) -> Result<NewSchool> {
        let t = Fields::of(record, "school", "schools")?;
        Ok(NewSchool {
            external_id: t.required_int("id")?,
            name: t.required_text("name")?,
            school_number: t.required_int("school_number")?,
        })
    }

    pub fn term(record: &RawRecord) -> Result<NewTerm> {
        let t = Fields::of(record, "term", "terms")?;
        Ok(NewTerm {
            external_id: t.required_int("id")?,
            name: t.required_text("name")?,
            abbreviation: t.text("abbreviation").unwrap_or_default(),
            first_day: t.required_date("firstday")?,
            last_day: t.required_date("lastday")?,
            year_id: t.int_or("yearid", 0),
            is_year_record: t.flag("isyearrec"),
            school_number: t.required_int("schoolid")?,
        })
    }

    pub fn teacher(record: &RawRecord) -> Result<NewTeacher> {
        let t = Fields::of(record, "teacher", "teachers")?;
        Ok(NewTeacher {
            external_id: t.required_int("id")?,
            external_dcid: t.required_int("dcid")?,
            first_name: t.text("first_name").unwrap_or_default(),
            last_name: t.text("last_name").unwrap_or_default(),
            display_name: t.text("preferredname"),
            email: t.text("email_addr"),
            staff_status: t.optional_int("staffstatus"),
            is_active: t.flag("staffstatus"),
            school_number: t.optional_int("schoolid"),
        })
    }

    pub fn course(record: &RawRecord) -> Result<NewCourse> {
        let t = Fields::of(record, "course", "courses")?;
        Ok(NewCourse {
            external_id: t.required_int("id")?,
            external_dcid: t.required_int("dcid")?,
            course_number: t.required_text("course_number")?,
            course_name: t.required_text("course_name")?,
            credit_hours: t.float_or("credit_hours", 0.0),
            is_active: t.flag("isactive"),
        })
    }

    pub fn email_address(record: &RawRecord) -> Result<NewEmailAddress> {
        let t = Fields::of(record, "email address", "emailaddress")?;
        Ok(NewEmailAddress {
            external_id: t.required_int("emailaddressid")?,
            email_address: t.required_text("emailaddress")?,
        })
    }
}

/// Typed access to one table of a raw record.
struct Fields<'a> {
    entity: &'static str,
    table: &'a RawTable,
}

impl<'a> Fields<'a> {
    fn of(record: &'a RawRecord, entity: &'static str, table_name: &'static str) -> Result<Self> {
        let table = record.table(table_name).ok_or_else(|| SlateError::MalformedRecord {
            entity,
            field: table_name,
            value: format!("missing table in record {}", record.id),
        })?;
        Ok(Self { entity, table })
    }

    /// Trimmed text; `None` when absent, null or blank.
    fn text(&self, field: &str) -> Option<String> {
        let value = match self.table.get(field)? {
            Value::String(s) => s.trim().to_string(),
            Value::Null => return None,
            other => other.to_string(),
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    fn malformed(&self, field: &'static str, value: Option<String>) -> SlateError {
        SlateError::MalformedRecord {
            entity: self.entity,
            field,
            value: value.unwrap_or_default(),
        }
    }

    fn required_text(&self, field: &'static str) -> Result<String> {
        self.text(field).ok_or_else(|| self.malformed(field, None))
    }

    fn required_int(&self, field: &'static str) -> Result<i64> {
        let raw = self.text(field);
        raw.as_deref()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.malformed(field, raw))
    }

    fn required_date(&self, field: &'static str) -> Result<NaiveDate> {
        let raw = self.text(field);
        raw.as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .ok_or_else(|| self.malformed(field, raw))
    }

    fn optional_int(&self, field: &str) -> Option<i64> {
        let raw = self.text(field)?;
        match raw.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!(entity = self.entity, field, value = %raw, "Unparsable number, treating as absent");
                None
            }
        }
    }

    fn int_or(&self, field: &str, default: i64) -> i64 {
        match self.text(field) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(entity = self.entity, field, value = %raw, default, "Unparsable number, using default");
                default
            }),
        }
    }

    fn float_or(&self, field: &str, default: f64) -> f64 {
        match self.text(field) {
            None => default,
            Some(raw) => match raw.parse::<f64>() {
                Ok(n) if n.is_finite() => n,
                _ => {
                    warn!(entity = self.entity, field, value = %raw, default, "Unparsable number, using default");
                    default
                }
            },
        }
    }

    fn flag(&self, field: &str) -> bool {
        self.text(field).as_deref() == Some("1")
    }
}
