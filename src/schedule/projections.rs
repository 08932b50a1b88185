use std::sync::{Arc, Mutex, PoisonError};

use crate::models::Lesson;

/// Lessons grouped by subject label, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct SubjectGroups {
    groups: Vec<SubjectGroup>,
}

#[derive(Debug, Clone)]
pub struct SubjectGroup {
    pub subject: String,
    pub lessons: Vec<Lesson>,
}

impl SubjectGroups {
    /// Single pass over the list; a subject's position is where it was
    /// first seen. Labels prefer `subject_name` over the legacy
    /// `subject` field (see [`Lesson::subject_label`]).
    pub fn from_lessons(lessons: &[Lesson]) -> Self {
        let mut groups: Vec<SubjectGroup> = Vec::new();
        for lesson in lessons {
            let label = lesson.subject_label();
            match groups.iter_mut().find(|group| group.subject == label) {
                Some(group) => group.lessons.push(lesson.clone()),
                None => groups.push(SubjectGroup {
                    subject: label.to_string(),
                    lessons: vec![lesson.clone()],
                }),
            }
        }
        Self { groups }
    }

    pub fn get(&self, subject: &str) -> Option<&[Lesson]> {
        self.groups
            .iter()
            .find(|group| group.subject == subject)
            .map(|group| group.lessons.as_slice())
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.subject.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubjectGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

struct ProjectionMemo {
    source: Arc<Vec<Lesson>>,
    by_subject: Arc<SubjectGroups>,
    upcoming: Arc<Vec<Lesson>>,
}

/// Identity-memoized projections over a lesson list.
///
/// The projections are pure functions of the list; recomputation
/// happens if and only if the list *reference* changes, independent of
/// any render mechanism. Projecting the same `Arc` twice returns
/// pointer-equal results.
#[derive(Default)]
pub struct LessonProjector {
    memo: Mutex<Option<ProjectionMemo>>,
}

impl LessonProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(lessons_by_subject, upcoming_lessons)` for `lessons`.
    pub fn project(&self, lessons: &Arc<Vec<Lesson>>) -> (Arc<SubjectGroups>, Arc<Vec<Lesson>>) {
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(memo) = memo.as_ref() {
            if Arc::ptr_eq(&memo.source, lessons) {
                return (memo.by_subject.clone(), memo.upcoming.clone());
            }
        }

        let by_subject = Arc::new(SubjectGroups::from_lessons(lessons));
        let upcoming: Arc<Vec<Lesson>> = Arc::new(
            lessons
                .iter()
                .filter(|lesson| lesson.is_upcoming)
                .cloned()
                .collect(),
        );
        *memo = Some(ProjectionMemo {
            source: Arc::clone(lessons),
            by_subject: Arc::clone(&by_subject),
            upcoming: Arc::clone(&upcoming),
        });
        (by_subject, upcoming)
    }
}

#[cfg(test)]
mod tests {
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

    #[test]
    fn test_grouping_prefers_subject_name_and_keeps_first_seen_order() {
        let lessons = vec![
            lesson(Some("Math"), None, true),
            lesson(None, Some("Art"), false),
            lesson(Some("Math"), None, false),
        ];

        let groups = SubjectGroups::from_lessons(&lessons);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.subjects().collect::<Vec<_>>(), vec!["Math", "Art"]);
        assert_eq!(groups.get("Math").map(<[Lesson]>::len), Some(2));
        assert_eq!(groups.get("Art").map(<[Lesson]>::len), Some(1));
        assert!(groups.get("Math").is_some_and(|g| g[0].is_upcoming && !g[1].is_upcoming));
    }

    #[test]
    fn test_upcoming_subset() {
        let projector = LessonProjector::new();
        let lessons = Arc::new(vec![
            lesson(Some("Math"), None, true),
            lesson(None, Some("Art"), false),
            lesson(Some("Math"), None, false),
        ]);

        let (_, upcoming) = projector.project(&lessons);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].subject_label(), "Math");
        assert!(upcoming[0].is_upcoming);
    }

    #[test]
    fn test_same_reference_yields_pointer_equal_projections() {
        let projector = LessonProjector::new();
        let lessons = Arc::new(vec![lesson(Some("Math"), None, true)]);

        let (groups_a, upcoming_a) = projector.project(&lessons);
        let (groups_b, upcoming_b) = projector.project(&lessons);

        assert!(Arc::ptr_eq(&groups_a, &groups_b));
        assert!(Arc::ptr_eq(&upcoming_a, &upcoming_b));
    }

    #[test]
    fn test_new_reference_recomputes() {
        let projector = LessonProjector::new();
        let first = Arc::new(vec![lesson(Some("Math"), None, true)]);
        let second = Arc::new(vec![lesson(Some("Math"), None, true)]);

        let (groups_a, _) = projector.project(&first);
        let (groups_b, _) = projector.project(&second);

        // Value-equal input through a different reference is a different
        // projection
        assert!(!Arc::ptr_eq(&groups_a, &groups_b));
        assert_eq!(groups_a.len(), groups_b.len());
    }

    #[test]
    fn test_unlabeled_lessons_group_under_unspecified() {
        let groups = SubjectGroups::from_lessons(&[lesson(None, None, false)]);
        assert_eq!(groups.subjects().collect::<Vec<_>>(), vec!["Unspecified"]);
    }
}
