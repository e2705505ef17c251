//! Public vocabulary of the TextGuard service

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of characters of submitted text echoed back in batch results
pub const ECHO_LIMIT: usize = 100;

/// Marker appended to echoed text that was cut at [`ECHO_LIMIT`]
const ELLIPSIS: &str = "...";

/// Binary classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// The text was flagged
    Toxic,
    /// The text was not flagged
    Safe,
}

impl Label {
    /// Wire name of the label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Toxic => "toxic",
            Self::Safe => "safe",
        }
    }

    pub fn is_toxic(&self) -> bool {
        matches!(self, Self::Toxic)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider result mapped onto the public vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Public label
    pub label: Label,

    /// Provider confidence or heuristic intensity (0.0-1.0)
    pub score: f32,
}

impl Verdict {
    pub fn new(label: Label, score: f32) -> Self {
        Self { label, score }
    }
}

/// Text as echoed back to the client: the first [`ECHO_LIMIT`] characters
/// followed by `...` when longer, otherwise the full text.
pub fn echo_text(text: &str) -> String {
    match text.char_indices().nth(ECHO_LIMIT) {
        Some((cut, _)) => {
            let mut echoed = String::with_capacity(cut + ELLIPSIS.len());
            echoed.push_str(&text[..cut]);
            echoed.push_str(ELLIPSIS);
            echoed
        }
        None => text.to_string(),
    }
}
