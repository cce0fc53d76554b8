//! A named output unit.

use serde::{Deserialize, Serialize};

/// One complete output: a target filename and its fully composed content.
///
/// An artifact optionally targets a named insertion point inside an already
/// generated file instead of creating a new one. Filenames are unique within
/// one invocation; each artifact is consumed exactly once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Target filename, relative to the host's output root.
    pub name: String,

    /// Named insertion point inside `name`, when augmenting an existing file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insertion_point: Option<String>,

    /// Fully composed text content.
    pub content: String,
}

impl Artifact {
    /// Create an artifact that becomes a new file.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            insertion_point: None,
            content: content.into(),
        }
    }

    /// Create an artifact targeting a named insertion point in `name`.
    #[must_use]
    pub fn at_insertion_point(
        name: impl Into<String>,
        insertion_point: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            insertion_point: Some(insertion_point.into()),
            content: content.into(),
        }
    }
}
