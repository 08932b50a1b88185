use std::fmt;

/// One segment of a cache key.
///
/// Absence is its own variant: a query with an unset filter must never
/// share a key with a query whose filter happens to equal any real
/// value, so `None` is encoded as `Null` rather than skipped or turned
/// into an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySegment {
    Text(String),
    Null,
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Text(s) => write!(f, "{}", s),
            KeySegment::Null => write!(f, "null"),
        }
    }
}

/// Ordered key identifying one query in the cache:
/// `[scope, feature, ...one segment per filter field, in fixed order]`.
///
/// Two invocations with identical scope and identical field values
/// (including absent ones) produce equal keys; any differing field
/// produces a different key. The store's invalidation and refetch
/// behavior rides entirely on this equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    segments: Vec<KeySegment>,
}

impl QueryKey {
    pub fn new(scope: &str, feature: &str) -> Self {
        Self {
            segments: vec![
                KeySegment::Text(scope.to_string()),
                KeySegment::Text(feature.to_string()),
            ],
        }
    }

    /// Append a present value.
    pub fn push(mut self, value: impl ToString) -> Self {
        self.segments.push(KeySegment::Text(value.to_string()));
        self
    }

    /// Append an optional value; `None` becomes the distinct null segment.
    pub fn push_opt(mut self, value: Option<impl ToString>) -> Self {
        self.segments.push(match value {
            Some(v) => KeySegment::Text(v.to_string()),
            None => KeySegment::Null,
        });
        self
    }

    /// Whether this key falls under `prefix` (segment-wise). Used to
    /// invalidate a whole feature's queries at once.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
