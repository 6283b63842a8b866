use serde::{Deserialize, Serialize};

/// A course as normalized from the upstream record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub external_id: i64,
    pub external_dcid: i64,
    pub course_number: String,
    pub course_name: String,
    pub credit_hours: f64,
    pub is_active: bool,
}

/// A persisted course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub external_id: i64,
    pub external_dcid: i64,
    pub course_number: String,
    pub course_name: String,
    pub credit_hours: f64,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_camel_case_fields() {
        let course = Course {
            id: 1,
            external_id: 10,
            external_dcid: 110,
            course_number: "MATH3".into(),
            course_name: "Grade 3 Math".into(),
            credit_hours: 1.0,
            is_active: true,
        };
        let json = serde_json::to_string(&course).unwrap();
        assert!(json.contains("\"externalDcid\":110"));
        assert!(json.contains("\"creditHours\":1.0"));
        assert!(json.contains("\"isActive\":true"));
    }
}
