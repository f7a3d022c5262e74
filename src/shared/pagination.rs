//! Cursor Pagination
//!
//! Keyset pagination primitives shared by every list endpoint. A cursor is an
//! opaque `base64(JSON {"value": ...})` token carrying the last-seen value of
//! the sort field; the next page is selected with a strict inequality on that
//! value, so the row that produced the cursor is never repeated and offsets
//! never drift under concurrent writes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default page size when the client does not send `limit`.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Hard cap on page size.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl SortOrder {
    /// SQL keyword for the ORDER BY clause.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Comparison operator for the cursor predicate.
    ///
    /// Strict inequality only: the previous page's last item must never
    /// reappear on the next page.
    pub fn cursor_operator(&self) -> &'static str {
        match self {
            Self::Asc => " > ",
            Self::Desc => " < ",
        }
    }
}

/// Wire format of the cursor token payload.
#[derive(Debug, Serialize, Deserialize)]
struct CursorToken {
    value: Value,
}

/// Encode a cursor from the sort-field value of the last returned row.
pub fn encode_cursor(value: &Value) -> String {
    let payload = serde_json::to_vec(&CursorToken {
        value: value.clone(),
    })
    .unwrap_or_default();
    STANDARD.encode(payload)
}

/// Decode a cursor token.
///
/// Malformed base64 or JSON never errors: it degrades to `Value::Null`, and
/// callers omit the cursor predicate entirely, which resets to first-page
/// behavior.
pub fn decode_cursor(token: &str) -> Value {
    let Ok(bytes) = STANDARD.decode(token) else {
        return Value::Null;
    };
    serde_json::from_slice::<CursorToken>(&bytes)
        .map(|t| t.value)
        .unwrap_or(Value::Null)
}

/// Normalized pagination input assembled from raw query parameters.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Decoded cursor value; `Value::Null` when absent or malformed.
    pub cursor: Value,
    /// Whether the client supplied a cursor at all. Reported back as
    /// `hasPreviousPage` — a documented simplification, not a lookbehind.
    pub had_cursor: bool,
    /// Page size, clamped to `1..=MAX_PAGE_LIMIT`.
    pub limit: i64,
    /// Requested sort direction.
    pub order: SortOrder,
}

impl PageRequest {
    pub fn from_parts(cursor: Option<&str>, limit: Option<i64>, order: Option<SortOrder>) -> Self {
        Self {
            cursor: cursor.map(decode_cursor).unwrap_or(Value::Null),
            had_cursor: cursor.is_some(),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
            order: order.unwrap_or_default(),
        }
    }

    /// Row count to fetch: one extra row decides `has_next_page`.
    pub fn fetch_limit(&self) -> i64 {
        self.limit + 1
    }
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> CursorPage<T> {
    /// Assemble a page from up to `limit + 1` fetched rows.
    ///
    /// The extra row, when present, only signals that another page exists and
    /// is discarded; the next cursor encodes the sort value of the last row
    /// actually returned.
    pub fn assemble<F>(mut rows: Vec<T>, request: &PageRequest, cursor_value: F) -> Self
    where
        F: Fn(&T) -> Value,
    {
        let has_next_page = rows.len() as i64 > request.limit;
        if has_next_page {
            rows.truncate(request.limit as usize);
        }

        let next_cursor = if has_next_page {
            rows.last().map(|row| encode_cursor(&cursor_value(row)))
        } else {
            None
        };

        Self {
            items: rows,
            next_cursor,
            has_next_page,
            has_previous_page: request.had_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cursor_roundtrip() {
        let value = json!(42);
        let token = encode_cursor(&value);
        assert_eq!(decode_cursor(&token), value);

        let value = json!("premium-logo-design");
        let token = encode_cursor(&value);
        assert_eq!(decode_cursor(&token), value);
    }

    #[test]
    fn test_decode_malformed_base64_degrades_to_null() {
        assert_eq!(decode_cursor("!!not-base64!!"), Value::Null);
    }

    #[test]
    fn test_decode_non_json_payload_degrades_to_null() {
        let token = STANDARD.encode(b"definitely not json");
        assert_eq!(decode_cursor(&token), Value::Null);
    }

    #[test]
    fn test_decode_wrong_shape_degrades_to_null() {
        let token = STANDARD.encode(br#"{"other": 1}"#);
        // Missing "value" key deserializes with serde error, not a panic.
        assert_eq!(decode_cursor(&token), Value::Null);
    }

    #[test]
    fn test_limit_defaults_and_clamping() {
        assert_eq!(PageRequest::from_parts(None, None, None).limit, 20);
        assert_eq!(PageRequest::from_parts(None, Some(0), None).limit, 1);
        assert_eq!(PageRequest::from_parts(None, Some(500), None).limit, 100);
        assert_eq!(PageRequest::from_parts(None, Some(7), None).limit, 7);
    }

    #[test]
    fn test_cursor_operator_is_strict() {
        assert_eq!(SortOrder::Asc.cursor_operator(), " > ");
        assert_eq!(SortOrder::Desc.cursor_operator(), " < ");
    }

    #[test]
    fn test_assemble_with_extra_row_sets_next_page() {
        let request = PageRequest::from_parts(None, Some(2), None);
        let rows = vec![1, 2, 3];
        let page = CursorPage::assemble(rows, &request, |n| json!(n));

        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_next_page);
        // Cursor encodes the last *returned* row, not the discarded one.
        assert_eq!(page.next_cursor.as_deref().map(decode_cursor), Some(json!(2)));
        assert!(!page.has_previous_page);
    }

    #[test]
    fn test_assemble_exact_page_has_no_next() {
        let request = PageRequest::from_parts(None, Some(3), None);
        let page = CursorPage::assemble(vec![1, 2, 3], &request, |n| json!(n));

        assert_eq!(page.items.len(), 3);
        assert!(!page.has_next_page);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_assemble_reports_previous_page_from_cursor_presence() {
        let token = encode_cursor(&json!(10));
        let request = PageRequest::from_parts(Some(token.as_str()), Some(2), None);
        let page = CursorPage::assemble(vec![11, 12], &request, |n| json!(n));

        assert!(page.has_previous_page);
    }

    #[test]
    fn test_sort_order_query_aliases() {
        let asc: SortOrder = serde_json::from_str("\"ASC\"").unwrap();
        let desc: SortOrder = serde_json::from_str("\"desc\"").unwrap();
        assert_eq!(asc, SortOrder::Asc);
        assert_eq!(desc, SortOrder::Desc);
    }
}
