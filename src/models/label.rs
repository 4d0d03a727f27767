//! Represents one content label returned by the vision gateway.

use serde::{Deserialize, Serialize};

/// A single detected label for an image.
///
/// The gateway returns labels ordered by relevance; that order is what the
/// classifier walks, so it must be preserved end to end.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LabelAnnotation {
    /// Human-readable label text, e.g. `"Mammal"`.
    pub description: String,

    /// Gateway confidence in `[0, 1]`. Informational only, the classifier
    /// never looks at it.
    #[serde(default)]
    pub score: f32,
}
