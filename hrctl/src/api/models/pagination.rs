//! Page, size and sort parameters for list endpoints, and the headers describing the page.
//!
//! Lists are always paged: `page` is zero-based (default 0), `size` defaults to
//! `pagination.default_size` and is clamped to `1..=pagination.max_size`. `sort` may be repeated
//! and takes `<column>` or `<column>,<asc|desc>`.
//!
//! Responses carry `X-Total-Count` and an RFC 5988 `Link` header with `next`, `prev`, `last` and
//! `first` relations. Links keep every other query parameter of the request.

use crate::config::PaginationConfig;
use crate::db::query::{Direction, PageRequest, SortOrder};

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Vec<SortOrder>,
}

impl PageParams {
    /// Zero-based page number, never negative.
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0).max(0)
    }

    /// Page size, defaulted and clamped by `config`.
    #[inline]
    pub fn size(&self, config: &PaginationConfig) -> i64 {
        self.size.unwrap_or(config.default_size).clamp(1, config.max_size)
    }

    pub fn page_request(&self, config: &PaginationConfig) -> PageRequest {
        self.sort
            .iter()
            .cloned()
            .fold(PageRequest::page(self.page(), self.size(config)), PageRequest::sorted_by)
    }
}

/// Parse one `sort` parameter value.
pub fn parse_sort(raw: &str) -> Result<SortOrder, String> {
    let (column, direction) = match raw.split_once(',') {
        Some((column, direction)) => (column.trim(), direction.trim()),
        None => (raw.trim(), "asc"),
    };

    if column.is_empty() {
        return Err(format!("Invalid sort '{raw}'"));
    }

    let direction = match direction.to_ascii_lowercase().as_str() {
        "asc" => Direction::Asc,
        "desc" => Direction::Desc,
        other => return Err(format!("Invalid sort direction '{other}'")),
    };

    Ok(SortOrder {
        column: column.to_string(),
        direction,
    })
}

/// Build the `Link` header for page `page` of `size` items out of `total`.
///
/// `raw_query` is the request's query string; its `page` and `size` pairs are replaced.
pub fn link_header(path: &str, raw_query: Option<&str>, page: i64, size: i64, total: i64) -> String {
    let kept: Vec<&str> = raw_query
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("page=") && !pair.starts_with("size="))
        .collect();

    let link = |target: i64, rel: &str| {
        let mut query = format!("page={target}&size={size}");
        for pair in &kept {
            query.push('&');
            query.push_str(pair);
        }
        format!("<{path}?{query}>; rel=\"{rel}\"")
    };

    let last = if total > 0 { (total - 1) / size } else { 0 };

    let mut links = Vec::with_capacity(4);
    if page < last {
        links.push(link(page + 1, "next"));
    }
    if page > 0 {
        links.push(link(page - 1, "prev"));
    }
    links.push(link(last, "last"));
    links.push(link(0, "first"));

    links.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig {
            default_size: 20,
            max_size: 100,
        }
    }

    #[test]
    fn test_default_values() {
        let p = PageParams::default();
        assert_eq!(p.page(), 0);
        assert_eq!(p.size(&config()), 20);
    }

    #[test]
    fn test_size_clamping() {
        // Zero is clamped to 1
        let p = PageParams {
            size: Some(0),
            ..Default::default()
        };
        assert_eq!(p.size(&config()), 1);

        // Over max is clamped to max_size
        let p = PageParams {
            size: Some(5000),
            ..Default::default()
        };
        assert_eq!(p.size(&config()), 100);

        // Negative page is treated as the first page
        let p = PageParams {
            page: Some(-3),
            ..Default::default()
        };
        assert_eq!(p.page(), 0);
    }

    #[test]
    fn test_page_request_carries_sort_and_offset() {
        let p = PageParams {
            page: Some(2),
            size: Some(10),
            sort: vec![SortOrder::desc("salary")],
        };
        let request = p.page_request(&config());
        assert_eq!(request.offset, 20);
        assert_eq!(request.limit, 10);
        assert_eq!(request.sort, vec![SortOrder::desc("salary")]);
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("last_name,desc").unwrap(), SortOrder::desc("last_name"));
        assert_eq!(parse_sort("last_name,ASC").unwrap(), SortOrder::asc("last_name"));
        assert_eq!(parse_sort("city").unwrap(), SortOrder::asc("city"));
        assert!(parse_sort(",asc").is_err());
        assert!(parse_sort("city,sideways").is_err());
    }

    #[test]
    fn test_link_header_middle_page() {
        let header = link_header("/api/regions", Some("page=1&size=10&sort=region_name,asc"), 1, 10, 35);
        assert_eq!(
            header,
            "</api/regions?page=2&size=10&sort=region_name,asc>; rel=\"next\",\
             </api/regions?page=0&size=10&sort=region_name,asc>; rel=\"prev\",\
             </api/regions?page=3&size=10&sort=region_name,asc>; rel=\"last\",\
             </api/regions?page=0&size=10&sort=region_name,asc>; rel=\"first\""
        );
    }

    #[test]
    fn test_link_header_single_page() {
        let header = link_header("/api/tasks", None, 0, 20, 0);
        assert_eq!(
            header,
            "</api/tasks?page=0&size=20>; rel=\"last\",</api/tasks?page=0&size=20>; rel=\"first\""
        );
    }
}
