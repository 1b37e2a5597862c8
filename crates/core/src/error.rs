//! Error taxonomy for highlight geometry and selection flows
//!
//! None of these are user-visible failures. They describe control-flow
//! outcomes that the state machines resolve as no-ops or retries.

use crate::highlight::HighlightId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HighlightError {
    /// Viewport metadata for the page is unavailable; retry after the next render
    #[error("page {page_number} has not been rendered yet")]
    PageNotReady { page_number: u32 },

    /// The selection collapsed or produced no rects
    #[error("selection is empty")]
    EmptySelection,

    /// The selection root lies outside the managed container
    #[error("selection is outside the highlighter container")]
    ContainerMismatch,

    /// State moved on before a debounced action fired
    #[error("debounced action fired after its state was discarded")]
    StaleFinalize,

    /// The viewport transform cannot be inverted
    #[error("viewport transform for page {page_number} is singular")]
    InvalidTransform { page_number: u32 },

    #[error("unknown highlight {0}")]
    UnknownHighlight(HighlightId),
}

impl HighlightError {
    /// Whether the failed operation should be retried on the next render pass
    pub fn is_retryable(&self) -> bool {
        matches!(self, HighlightError::PageNotReady { .. })
    }
}

pub type HighlightResult<T> = Result<T, HighlightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_page_not_ready_is_retryable() {
        assert!(HighlightError::PageNotReady { page_number: 2 }.is_retryable());
        assert!(!HighlightError::EmptySelection.is_retryable());
        assert!(!HighlightError::StaleFinalize.is_retryable());
    }

    #[test]
    fn test_display() {
        let err = HighlightError::PageNotReady { page_number: 4 };
        assert_eq!(err.to_string(), "page 4 has not been rendered yet");
    }
}
