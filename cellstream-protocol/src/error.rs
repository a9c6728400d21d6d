//! Error types for the cellstream bridge.

use thiserror::Error;

/// Decode-time errors. These are contained per line: a failing line is
/// dropped and the stream continues.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Line is not valid JSON.
    #[error("line is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Line parsed, but the top level is not a JSON object.
    #[error("top-level value is not a JSON object")]
    NotAnObject,

    /// No usable identity could be extracted from the cell object.
    #[error("no cell identity fields present")]
    IdentityMissing,
}

impl DecodeError {
    /// Short stable tag for log lines and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::Parse(_) => "parse",
            DecodeError::NotAnObject => "not-an-object",
            DecodeError::IdentityMissing => "identity-missing",
        }
    }
}
