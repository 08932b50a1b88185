use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Grouping label used when a lesson carries neither `subject_name` nor
/// `subject`. The API guarantees at least one of the two, so this only
/// shows up for malformed payloads.
pub const UNSPECIFIED_SUBJECT: &str = "Unspecified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum LessonStatus {
    Scheduled,
    Completed,
    Cancelled,
    Missed,
}

impl LessonStatus {
    /// Wire representation, also used in query parameters and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::Scheduled => "scheduled",
            LessonStatus::Completed => "completed",
            LessonStatus::Cancelled => "cancelled",
            LessonStatus::Missed => "missed",
        }
    }
}

impl std::fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LessonStatus::Scheduled => write!(f, "Scheduled"),
            LessonStatus::Completed => write!(f, "Completed"),
            LessonStatus::Cancelled => write!(f, "Cancelled"),
            LessonStatus::Missed => write!(f, "Missed"),
        }
    }
}

/// A single lesson as returned by the schedule endpoints.
///
/// The record is owned by the API layer; this library only interprets
/// the subject fields (for grouping) and `is_upcoming`. Everything else
/// passes through to the frontend untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Lesson {
    #[serde(default)]
    pub id: i64,
    pub subject_id: Option<i64>,
    pub subject_name: Option<String>,
    // Older endpoints send "subject" instead of "subject_name"
    pub subject: Option<String>,
    pub tutor_name: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: Option<LessonStatus>,
    #[serde(default)]
    pub is_upcoming: bool,
}

impl Lesson {
    /// Label the lesson groups under: `subject_name` when present,
    /// falling back to the legacy `subject` field.
    pub fn subject_label(&self) -> &str {
        self.subject_name
            .as_deref()
            .or(self.subject.as_deref())
            .unwrap_or(UNSPECIFIED_SUBJECT)
    }
}
