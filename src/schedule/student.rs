//! Student-view schedule adapter.
//!
//! Fetches the current student's lesson list and derives two read-only
//! projections from it: lessons grouped by subject and the upcoming
//! subset. The projections are memoized by list identity, so a render
//! that observes an unchanged list pays nothing.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::api::ApiError;
use crate::cache::{QueryCache, QueryKey, QueryOptions, QuerySnapshot};
use crate::models::Lesson;

use super::projections::{LessonProjector, SubjectGroups};
use super::ScheduleApi;

/// Student schedule results are considered fresh for 60 seconds.
const MY_SCHEDULE_STALE_SECS: u64 = 60;

/// One retry after a failure before the query settles into its error
/// state.
const MY_SCHEDULE_RETRIES: u32 = 1;

/// What the student schedule screen renders.
///
/// `lessons` is always a list - empty before the first successful
/// fetch, never absent. On failure the error is populated and the
/// previously fetched lessons stay readable.
#[derive(Clone)]
pub struct StudentScheduleView {
    pub lessons: Arc<Vec<Lesson>>,
    pub lessons_by_subject: Arc<SubjectGroups>,
    pub upcoming_lessons: Arc<Vec<Lesson>>,
    pub is_loading: bool,
    pub error: Option<Arc<ApiError>>,
}

/// Query adapter for the signed-in student's own schedule.
pub struct StudentScheduleQueries<A> {
    api: A,
    cache: QueryCache<Vec<Lesson>>,
    projector: LessonProjector,
}

impl<A: ScheduleApi> StudentScheduleQueries<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            cache: QueryCache::new(),
            projector: LessonProjector::new(),
        }
    }

    fn options() -> QueryOptions {
        QueryOptions {
            stale_after: Duration::from_secs(MY_SCHEDULE_STALE_SECS),
            retries: MY_SCHEDULE_RETRIES,
            refetch_on_activate: false,
        }
    }

    /// Filters are opaque here: whatever pairs the caller passes go
    /// verbatim into the query parameters and, in order, into the cache
    /// key.
    pub fn cache_key(filters: &[(String, String)]) -> QueryKey {
        let mut key = QueryKey::new("student", "my-schedule");
        for (name, value) in filters {
            key = key.push(name).push(value);
        }
        key
    }

    /// Resolve the student's schedule for `filters` and derive the
    /// projected views from whatever the cache currently holds.
    pub async fn my_schedule(&self, filters: &[(String, String)]) -> StudentScheduleView {
        let key = Self::cache_key(filters);

        let api = self.api.clone();
        let owned_filters = filters.to_vec();
        let fetch = move || {
            let api = api.clone();
            let filters = owned_filters.clone();
            async move {
                api.my_schedule(&filters).await.map_err(|err| {
                    // Diagnostics only - the error is re-raised unchanged
                    // so the cache's retry and error state see the
                    // original failure
                    warn!(error = %err, "student schedule fetch failed");
                    err
                })
            }
        };

        let snapshot = self.cache.fetch(key, Self::options(), fetch).await;
        self.view_from(snapshot)
    }

    fn view_from(&self, snapshot: QuerySnapshot<Vec<Lesson>>) -> StudentScheduleView {
        let lessons = snapshot.data.clone().unwrap_or_default();
        let (lessons_by_subject, upcoming_lessons) = self.projector.project(&lessons);
        StudentScheduleView {
            lessons,
            lessons_by_subject,
            upcoming_lessons,
            is_loading: snapshot.is_loading(),
            error: snapshot.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::models::{ChildScheduleResponse, ScheduleFilter};

    use super::*;

    fn lesson(subject_name: Option<&str>, subject: Option<&str>, is_upcoming: bool) -> Lesson {
        Lesson {
            id: 0,
            subject_id: None,
            subject_name: subject_name.map(str::to_string),
            subject: subject.map(str::to_string),
            tutor_name: None,
            starts_at: None,
            ends_at: None,
            status: None,
            is_upcoming,
        }
    }

    /// Serves a fixed lesson list, counting calls.
    #[derive(Clone, Default)]
    struct FakeApi {
        lessons: Vec<Lesson>,
        calls: Arc<AtomicUsize>,
    }

    impl ScheduleApi for FakeApi {
        async fn parent_child_schedule(
            &self,
            _child_id: &str,
            _filter: &ScheduleFilter,
        ) -> Result<ChildScheduleResponse, ApiError> {
            Err(ApiError::InvalidResponse("not under test".to_string()))
        }

        async fn my_schedule(
            &self,
            _filters: &[(String, String)],
        ) -> Result<Vec<Lesson>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.lessons.clone())
        }
    }

    /// Always fails, counting calls.
    #[derive(Clone, Default)]
    struct FailingApi {
        calls: Arc<AtomicUsize>,
    }

    impl ScheduleApi for FailingApi {
        async fn parent_child_schedule(
            &self,
            _child_id: &str,
            _filter: &ScheduleFilter,
        ) -> Result<ChildScheduleResponse, ApiError> {
            Err(ApiError::InvalidResponse("not under test".to_string()))
        }

        async fn my_schedule(
            &self,
            _filters: &[(String, String)],
        ) -> Result<Vec<Lesson>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::ServerError("schedule backend down".to_string()))
        }
    }

    fn sample_lessons() -> Vec<Lesson> {
        vec![
            lesson(Some("Math"), None, true),
            lesson(None, Some("Art"), false),
            lesson(Some("Math"), None, false),
        ]
    }

    #[test]
    fn test_filter_bag_is_key_verbatim() {
        let a = StudentScheduleQueries::<FakeApi>::cache_key(&[
            ("subject".to_string(), "math".to_string()),
            ("upcoming".to_string(), "true".to_string()),
        ]);
        let same = StudentScheduleQueries::<FakeApi>::cache_key(&[
            ("subject".to_string(), "math".to_string()),
            ("upcoming".to_string(), "true".to_string()),
        ]);
        let reordered = StudentScheduleQueries::<FakeApi>::cache_key(&[
            ("upcoming".to_string(), "true".to_string()),
            ("subject".to_string(), "math".to_string()),
        ]);
        let different = StudentScheduleQueries::<FakeApi>::cache_key(&[
            ("subject".to_string(), "art".to_string()),
            ("upcoming".to_string(), "true".to_string()),
        ]);
        let empty = StudentScheduleQueries::<FakeApi>::cache_key(&[]);

        assert_eq!(a, same);
        assert_ne!(a, reordered); // passed through as-is, order included
        assert_ne!(a, different);
        assert_ne!(a, empty);
    }

    #[tokio::test]
    async fn test_derives_groups_and_upcoming() {
        let api = FakeApi {
            lessons: sample_lessons(),
            ..Default::default()
        };
        let queries = StudentScheduleQueries::new(api);

        let view = queries.my_schedule(&[]).await;

        assert_eq!(view.lessons.len(), 3);
        assert!(!view.is_loading);
        assert!(view.error.is_none());

        let groups = &view.lessons_by_subject;
        assert_eq!(groups.subjects().collect::<Vec<_>>(), vec!["Math", "Art"]);
        assert_eq!(groups.get("Math").map(<[Lesson]>::len), Some(2));
        assert_eq!(groups.get("Art").map(<[Lesson]>::len), Some(1));

        assert_eq!(view.upcoming_lessons.len(), 1);
        assert_eq!(view.upcoming_lessons[0].subject_label(), "Math");
    }

    #[tokio::test]
    async fn test_cached_list_reuses_projections_by_reference() {
        let api = FakeApi {
            lessons: sample_lessons(),
            ..Default::default()
        };
        let queries = StudentScheduleQueries::new(api.clone());

        let first = queries.my_schedule(&[]).await;
        let second = queries.my_schedule(&[]).await;

        // One fetch, same list reference, pointer-equal projections
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first.lessons, &second.lessons));
        assert!(Arc::ptr_eq(&first.lessons_by_subject, &second.lessons_by_subject));
        assert!(Arc::ptr_eq(&first.upcoming_lessons, &second.upcoming_lessons));
    }

    #[tokio::test]
    async fn test_failure_retries_once_and_surfaces_original_error() {
        let api = FailingApi::default();
        let queries = StudentScheduleQueries::new(api.clone());

        let view = queries.my_schedule(&[]).await;

        // Initial attempt plus exactly one retry
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
        assert!(!view.is_loading);
        let err = view.error.expect("error should be surfaced");
        assert!(matches!(*err, ApiError::ServerError(_)));
        assert_eq!(err.to_string(), "Server error: schedule backend down");

        // Never an empty success: failure is visible, lessons default to
        // an empty list rather than poisoning the view
        assert!(view.lessons.is_empty());
        assert!(view.lessons_by_subject.is_empty());
        assert!(view.upcoming_lessons.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_filter_bags_fetch_separately() {
        let api = FakeApi {
            lessons: sample_lessons(),
            ..Default::default()
        };
        let queries = StudentScheduleQueries::new(api.clone());

        queries.my_schedule(&[]).await;
        queries
            .my_schedule(&[("subject".to_string(), "math".to_string())])
            .await;

        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }
}
