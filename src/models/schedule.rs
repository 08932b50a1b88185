use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::lesson::{Lesson, LessonStatus};

/// The student a parent-view schedule belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Optional filters for the parent child-schedule query.
/// An absent field places no constraint on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub subject_id: Option<i64>,
    pub status: Option<LessonStatus>,
}

impl ScheduleFilter {
    /// Translate to the API's query-parameter naming
    /// (`date_from`, `date_to`, `subject_id`, `status`).
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(date) = self.date_from {
            params.push(("date_from", date.to_string()));
        }
        if let Some(date) = self.date_to {
            params.push(("date_to", date.to_string()));
        }
        if let Some(id) = self.subject_id {
            params.push(("subject_id", id.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        params
    }
}

/// Wire shape of `GET /parents/children/{child_id}/schedule`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChildScheduleResponse {
    pub student: StudentProfile,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub total_lessons: u32,
}

/// View model handed to the frontend. Identical to the wire response
/// except that `total_lessons` serializes as `totalLessons`.
///
/// Constructed fresh on every successful fetch and superseded, never
/// mutated, by the next one.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ChildSchedule {
    pub student: StudentProfile,
    pub lessons: Vec<Lesson>,
    #[serde(rename = "totalLessons")]
    pub total_lessons: u32,
}

impl From<ChildScheduleResponse> for ChildSchedule {
    fn from(resp: ChildScheduleResponse) -> Self {
        Self {
            student: resp.student,
            lessons: resp.lessons,
            total_lessons: resp.total_lessons,
        }
    }
}
