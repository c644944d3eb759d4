use thiserror::Error;

/// Failures raised or recorded by the extraction engine.
///
/// Only [`ExtractError::EmptyInput`] is ever returned to callers. The other
/// variants describe degraded output and are logged where they occur so a
/// single malformed column never aborts the rest of the document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Nothing to profile: {reason}")]
    EmptyInput { reason: String },
    #[error("Value in '{table}.{column}' (row {row}) cannot be classified: {detail}")]
    UnsupportedValue {
        table: String,
        column: String,
        row: usize,
        detail: String,
    },
    #[error(
        "Statistics for '{table}.{column}' skipped {skipped} value(s) that could not be read as numbers"
    )]
    Computation {
        table: String,
        column: String,
        skipped: usize,
    },
}

impl ExtractError {
    pub fn empty_input(reason: impl Into<String>) -> Self {
        ExtractError::EmptyInput {
            reason: reason.into(),
        }
    }

    pub fn is_empty_input(&self) -> bool {
        matches!(self, ExtractError::EmptyInput { .. })
    }
}
