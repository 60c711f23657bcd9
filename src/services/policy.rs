//! Page-count policy gate applied to finished extractions.

use thiserror::Error;

use crate::models::ExtractionResult;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Document has too many pages: {pages} (maximum {max})")]
    TooManyPages { pages: u32, max: u32 },
}

/// Rejects documents whose page count exceeds a configured maximum.
///
/// Independent of extraction quality: a `low_quality` or `failed` result
/// passes as long as its page count is within the limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageLimitPolicy {
    max_pages: Option<u32>,
}

impl PageLimitPolicy {
    pub fn new(max_pages: Option<u32>) -> Self {
        Self { max_pages }
    }

    pub fn check(&self, result: &ExtractionResult) -> Result<(), PolicyError> {
        match self.max_pages {
            Some(max) if result.pages > max => Err(PolicyError::TooManyPages {
                pages: result.pages,
                max,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_pages(pages: u32) -> ExtractionResult {
        ExtractionResult::classify("x".repeat(60), pages, false, 90.0, 50)
    }

    #[test]
    fn test_within_limit() {
        let policy = PageLimitPolicy::new(Some(10));
        assert!(policy.check(&result_with_pages(10)).is_ok());
    }

    #[test]
    fn test_over_limit() {
        let err = PageLimitPolicy::new(Some(10))
            .check(&result_with_pages(11))
            .unwrap_err();
        assert_eq!(err, PolicyError::TooManyPages { pages: 11, max: 10 });
        assert!(err.to_string().contains("too many pages"));
    }

    #[test]
    fn test_disabled_by_default() {
        assert!(PageLimitPolicy::default()
            .check(&result_with_pages(10_000))
            .is_ok());
    }
}
