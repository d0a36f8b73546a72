use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a point in the upgrade timeline.
///
/// Versions are compared only for equality. There is no ordering between
/// them: the successor of a version is whatever the graph says it is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Version {
    /// Nothing has been applied yet
    Initial,
    Named(String),
}

impl Version {
    pub fn new(label: impl Into<String>) -> Self {
        Version::Named(label.into())
    }

    pub fn initial() -> Self {
        Version::Initial
    }

    pub fn is_initial(&self) -> bool {
        matches!(self, Version::Initial)
    }

    /// Returns the label, `None` for the initial sentinel.
    pub fn label(&self) -> Option<&str> {
        match self {
            Version::Initial => None,
            Version::Named(label) => Some(label),
        }
    }

    /// Derives a synthetic next version.
    ///
    /// Only meant for generating throwaway chains; real graphs always name
    /// their destination versions. The initial sentinel is followed by `"1"`,
    /// a label whose last dot-separated segment is numeric gets that segment
    /// incremented, any other label gets `".1"` appended.
    #[cfg(any(test, feature = "synthetic-versions"))]
    pub fn successor(&self) -> Self {
        match self {
            Version::Initial => Version::new("1"),
            Version::Named(label) => {
                let (head, tail) = match label.rsplit_once('.') {
                    Some((head, tail)) => (Some(head), tail),
                    None => (None, label.as_str()),
                };
                match (head, tail.parse::<u64>()) {
                    (Some(head), Ok(n)) => Version::new(format!("{}.{}", head, n + 1)),
                    (None, Ok(n)) => Version::new((n + 1).to_string()),
                    (_, Err(_)) => Version::new(format!("{}.1", label)),
                }
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Initial => write!(f, "<initial>"),
            Version::Named(label) => write!(f, "{}", label),
        }
    }
}

impl From<&str> for Version {
    fn from(label: &str) -> Self {
        Version::new(label)
    }
}

impl From<String> for Version {
    fn from(label: String) -> Self {
        Version::new(label)
    }
}
