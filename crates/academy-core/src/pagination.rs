//! Pagination for list endpoints.
//!
//! Lists accept `limit` with either `offset` or `page`. When `page` is present
//! it wins over `offset`. Responses carry a [`PaginationMeta`] next to `data`:
//!
//! ```json
//! { "data": [...], "meta": { "total": 42, "limit": 10, "offset": 20, "has_more": true } }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Query strings may carry `?limit=`; treat the empty string as absent.
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of matching items
    pub total: i64,
    /// Limit that was applied
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Whether more items exist after this page
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        let offset = params.offset();
        Self {
            total,
            limit,
            offset: Some(offset),
            page: params.page(),
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

#[derive(Debug, Clone, Default, Hash, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Maximum number of items to return (1-100, default 20)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    /// Number of items to skip (ignored when `page` is set)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
    /// Page number, 1-indexed
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        if let Some(page) = self.page {
            (page.max(1) - 1).saturating_mul(self.limit())
        } else {
            self.offset.unwrap_or(0).max(0)
        }
    }

    #[must_use]
    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }

    /// `LIMIT .. OFFSET ..` suffix for hand-built queries.
    #[must_use]
    pub fn sql_suffix(&self) -> String {
        format!(" LIMIT {} OFFSET {}", self.limit(), self.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_page_and_offset_saturate() {
        let by_page = PaginationParams {
            page: Some(i64::MAX),
            ..Default::default()
        };
        assert_eq!(by_page.offset(), i64::MAX);
        assert!(!PaginationMeta::new(5, &by_page).has_more);

        let by_offset = PaginationParams {
            offset: Some(i64::MAX),
            limit: Some(50),
            ..Default::default()
        };
        let meta = PaginationMeta::new(5, &by_offset);
        assert_eq!(meta.offset, Some(i64::MAX));
        assert!(!meta.has_more);
    }

    #[test]
    fn defaults_apply_when_empty() {
        let params = PaginationParams::default();
        assert_eq!(params.limit(), DEFAULT_LIMIT);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.page(), None);
    }

    #[test]
    fn limit_is_clamped() {
        let params = PaginationParams {
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(params.limit(), MAX_LIMIT);

        let params = PaginationParams {
            limit: Some(-3),
            ..Default::default()
        };
        assert_eq!(params.limit(), 1);
    }

    #[test]
    fn page_takes_precedence_over_offset() {
        let params = PaginationParams {
            limit: Some(10),
            offset: Some(5),
            page: Some(3),
        };
        assert_eq!(params.offset(), 20);
        assert_eq!(params.sql_suffix(), " LIMIT 10 OFFSET 20");
    }

    #[test]
    fn meta_reports_more_pages() {
        let params = PaginationParams {
            limit: Some(10),
            offset: Some(0),
            page: None,
        };
        let meta = PaginationMeta::new(25, &params);
        assert!(meta.has_more);
        assert_eq!(meta.offset, Some(0));

        let params = PaginationParams {
            limit: Some(10),
            offset: Some(20),
            page: None,
        };
        assert!(!PaginationMeta::new(25, &params).has_more);
    }

    #[test]
    fn empty_query_values_deserialize_as_none() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"limit":"","offset":"15"}"#).unwrap();
        assert_eq!(params.limit, None);
        assert_eq!(params.offset, Some(15));
    }
}
