//! Core data types: the canonical post record, pagination cursors, and errors.

use serde::{Deserialize, Serialize};

/// A single post, normalized from whatever shape the provider returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Canonical post link.
    pub url: String,
    /// Raw caption, possibly empty.
    pub text: String,
    /// Caption truncated for display.
    pub title: String,
    /// Like count as a decimal string.
    pub likes: String,
    /// Comment count as a decimal string.
    pub comments: String,
    /// Lower-cased hashtags in caption order, duplicates kept.
    pub hashtags: Vec<String>,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    pub username: String,
}

/// Provider pagination state, read from a `page_info` envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

impl PaginationCursor {
    /// Read `{has_next_page, end_cursor}` from a `page_info` object.
    pub fn from_page_info(page_info: Option<&serde_json::Value>) -> Self {
        let Some(info) = page_info else {
            return Self::default();
        };
        Self {
            end_cursor: info
                .get("end_cursor")
                .and_then(|c| c.as_str())
                .filter(|c| !c.is_empty())
                .map(|c| c.to_string()),
            has_next_page: info
                .get("has_next_page")
                .and_then(|h| h.as_bool())
                .unwrap_or(false),
        }
    }

    /// The cursor for the next request, if the provider says there is one.
    pub fn next(&self) -> Option<&str> {
        if self.has_next_page {
            self.end_cursor.as_deref()
        } else {
            None
        }
    }
}

/// Why a single request, parse step, or strategy attempt stopped.
///
/// These never reach callers of [`crate::Scraper::get_posts`]; they are
/// logged and kept in the attempt report.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Profile identifier could not be resolved")]
    ProfileUnresolved,

    /// The request URL could not be built from the configured base URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl AcquisitionError {
    /// True for failures that look like the provider refusing us rather
    /// than changing its response format.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AcquisitionError::Network(_) | AcquisitionError::Timeout | AcquisitionError::Status(_)
        )
    }
}

impl From<reqwest::Error> for AcquisitionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AcquisitionError::Timeout
        } else if let Some(status) = err.status() {
            AcquisitionError::Status(status.as_u16())
        } else {
            AcquisitionError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AcquisitionError {
    fn from(err: serde_json::Error) -> Self {
        AcquisitionError::Malformed(err.to_string())
    }
}

/// Errors surfaced by [`crate::Scraper::get_posts`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    /// Every strategy came back empty.
    #[error("acquisition failed")]
    Exhausted,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type AcquisitionResult<T> = Result<T, AcquisitionError>;

/// Convenience result type.
pub type ScrapeResult<T> = Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cursor_from_page_info() {
        let info = json!({"has_next_page": true, "end_cursor": "QVFD"});
        let cursor = PaginationCursor::from_page_info(Some(&info));
        assert_eq!(cursor.next(), Some("QVFD"));
    }

    #[test]
    fn test_cursor_without_next_page() {
        let info = json!({"has_next_page": false, "end_cursor": "QVFD"});
        let cursor = PaginationCursor::from_page_info(Some(&info));
        assert_eq!(cursor.next(), None);

        let empty = PaginationCursor::from_page_info(None);
        assert!(!empty.has_next_page);
        assert_eq!(empty.next(), None);
    }

    #[test]
    fn test_cursor_empty_string_is_absent() {
        let info = json!({"has_next_page": true, "end_cursor": ""});
        let cursor = PaginationCursor::from_page_info(Some(&info));
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn test_transport_classification() {
        assert!(AcquisitionError::Timeout.is_transport());
        assert!(AcquisitionError::Status(429).is_transport());
        assert!(!AcquisitionError::Malformed("x".into()).is_transport());
        assert!(!AcquisitionError::ProfileUnresolved.is_transport());
        assert!(!AcquisitionError::InvalidUrl("x".into()).is_transport());
    }

    #[test]
    fn test_exhausted_message_is_opaque() {
        assert_eq!(ScrapeError::Exhausted.to_string(), "acquisition failed");
    }
}
