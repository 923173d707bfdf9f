//! Cursor-based pagination for list endpoints.
//!
//! The cursor is the decimal row offset into the newest-first ordering.
//! A response without a `cursor` field is the last page.

use serde::Deserialize;

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Common pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Cursor from a previous response.
    pub cursor: Option<String>,
    /// Number of items per page (default 50, max 500).
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Resolve effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Decode the cursor to a row offset. An absent or malformed cursor
    /// means the first page.
    pub fn offset(&self) -> u64 {
        self.cursor
            .as_deref()
            .and_then(|c| c.parse::<u64>().ok())
            .unwrap_or(0)
    }
}

/// The cursor for the page after this one, or `None` when a short page
/// signals the end.
pub fn next_cursor(current_offset: u64, returned: usize, page_size: u32) -> Option<String> {
    if (returned as u32) < page_size {
        None
    } else {
        Some((current_offset + returned as u64).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_count_defaults_and_clamps() {
        let p = PaginationParams::default();
        assert_eq!(p.effective_count(), 50);

        let p = PaginationParams {
            cursor: None,
            count: Some(5000),
        };
        assert_eq!(p.effective_count(), 500);

        let p = PaginationParams {
            cursor: None,
            count: Some(0),
        };
        assert_eq!(p.effective_count(), 1);
    }

    #[test]
    fn malformed_cursor_means_first_page() {
        let p = PaginationParams {
            cursor: Some("not-a-number".into()),
            count: None,
        };
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn next_cursor_advances_by_returned_rows() {
        assert_eq!(next_cursor(50, 50, 50), Some("100".to_string()));
        assert!(next_cursor(0, 49, 50).is_none());
        assert!(next_cursor(0, 0, 50).is_none());
    }
}
