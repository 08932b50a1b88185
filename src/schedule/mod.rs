//! Schedule query adapters.
//!
//! Two independent adapters over the schedule endpoints:
//!
//! - [`ParentScheduleQueries`]: a parent's view of one child's lessons,
//!   filtered by date range, subject and status
//! - [`StudentScheduleQueries`]: the signed-in student's own schedule
//!   plus derived projections (lessons by subject, upcoming lessons)
//!
//! Both register fetch functions against the [`cache`](crate::cache)
//! layer and only ever hand out snapshots; they own no cached data.

pub mod parent;
pub mod projections;
pub mod student;

pub use parent::ParentScheduleQueries;
pub use projections::{LessonProjector, SubjectGroup, SubjectGroups};
pub use student::{StudentScheduleQueries, StudentScheduleView};

use std::future::Future;

use crate::api::ApiError;
use crate::models::{ChildScheduleResponse, Lesson, ScheduleFilter};

/// The slice of the REST API the schedule adapters consume.
///
/// Implemented by [`ApiClient`](crate::api::ApiClient); tests substitute
/// instrumented fakes.
pub trait ScheduleApi: Clone + Send + Sync + 'static {
    /// `GET /parents/children/{child_id}/schedule`
    fn parent_child_schedule(
        &self,
        child_id: &str,
        filter: &ScheduleFilter,
    ) -> impl Future<Output = Result<ChildScheduleResponse, ApiError>> + Send;

    /// `GET /students/me/schedule`
    fn my_schedule(
        &self,
        filters: &[(String, String)],
    ) -> impl Future<Output = Result<Vec<Lesson>, ApiError>> + Send;
}
