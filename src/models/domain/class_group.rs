use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A class of students owned by one admin. Student ids come from the
/// external identity provider; enrollment only records the membership.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClassGroup {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub admin_id: String,
    pub students: Vec<Enrollment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Enrollment {
    pub student_id: String,
    pub enrolled_at: DateTime<Utc>,
}

impl ClassGroup {
    pub fn new(name: &str, description: Option<String>, admin_id: &str) -> Self {
        ClassGroup {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description,
            admin_id: admin_id.to_string(),
            students: Vec::new(),
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn is_enrolled(&self, student_id: &str) -> bool {
        self.students
            .iter()
            .any(|enrollment| enrollment.student_id == student_id)
    }

    pub fn enroll(&mut self, student_id: &str) {
        self.students.push(Enrollment {
            student_id: student_id.to_string(),
            enrolled_at: Utc::now(),
        });
        self.modified_at = Some(Utc::now());
    }
}
