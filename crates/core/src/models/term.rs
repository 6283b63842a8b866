use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A term as normalized from the upstream record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTerm {
    pub external_id: i64,
    pub name: String,
    pub abbreviation: String,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub year_id: i64,
    /// Spans a full academic year rather than a quarter or semester.
    pub is_year_record: bool,
    /// Upstream school number owning the term.
    pub school_number: i64,
}

impl NewTerm {
    /// Whether `date` falls inside `[first_day, last_day]`, inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day <= date && date <= self.last_day
    }
}

/// A persisted term.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
    pub abbreviation: String,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub year_id: i64,
    pub is_year_record: bool,
    pub is_current: bool,
    /// Local school id; `None` when the owning school has not been synced.
    pub school_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year() -> NewTerm {
        NewTerm {
            external_id: 3500,
            name: "2025-2026".into(),
            abbreviation: "25-26".into(),
            first_day: NaiveDate::from_ymd_opt(2025, 8, 25).unwrap(),
            last_day: NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(),
            year_id: 35,
            is_year_record: true,
            school_number: 100,
        }
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let term = year();
        assert!(term.contains(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap()));
        assert!(term.contains(NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()));
        assert!(!term.contains(NaiveDate::from_ymd_opt(2025, 8, 24).unwrap()));
        assert!(!term.contains(NaiveDate::from_ymd_opt(2026, 6, 16).unwrap()));
    }

    #[test]
    fn term_serializes_dates_as_iso() {
        let v = serde_json::to_value(year()).unwrap();
        assert_eq!(v["firstDay"], "2025-08-25");
        assert_eq!(v["isYearRecord"], true);
    }
}
