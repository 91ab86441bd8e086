//! Error Types for Consolidation Advisor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Shape mismatch: {field} has {actual} entries, expected {expected}")]
    ShapeMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("At least one platform is required")]
    EmptyPlatformSet,

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),

    #[error("Invalid chart input: {0}")]
    InvalidChart(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl AdvisorError {
    /// Shorthand for a length mismatch on a named input
    pub fn shape(field: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            field: field.into(),
            expected,
            actual,
        }
    }

    /// Whether the caller sent something unusable (as opposed to a rendering fault)
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::ShapeMismatch { .. }
                | Self::EmptyPlatformSet
                | Self::InvalidRequest(_)
                | Self::Overflow(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::ShapeMismatch { field, expected, actual } => format!(
                "`{field}` has {actual} entries but {expected} platforms were given."
            ),
            Self::EmptyPlatformSet => "Send at least one platform.".into(),
            Self::InvalidRequest(e) => format!("Could not read your request: {e}"),
            Self::Overflow(what) => {
                format!("Those amounts are too large to project ({what} overflowed).")
            }
            Self::InvalidChart(_) | Self::Render(_) => {
                "The chart could not be drawn. Please try again later.".into()
            }
        }
    }
}
