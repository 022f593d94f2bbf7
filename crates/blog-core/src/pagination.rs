//! Pagination types for API responses

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Pagination parameters (from query string)
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// Offset (overrides page)
    pub offset: Option<i64>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

impl PaginationParams {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page,
            page_size,
            offset: None,
        }
        .normalized()
    }

    /// Clamp values into the accepted ranges
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.map(|o| o.max(0)),
        }
    }

    /// SQL offset
    pub fn offset(&self) -> i64 {
        self.offset
            .unwrap_or_else(|| (self.page - 1).saturating_mul(self.page_size))
            .max(0)
    }

    /// SQL limit
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Paginated collection response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    #[serde(rename = "_type")]
    pub hal_type: String,

    /// Total count of items
    pub total: i64,

    /// Number of items in this page
    pub count: i64,

    pub page_size: i64,

    pub offset: i64,

    #[serde(rename = "_links")]
    pub links: PaginationLinks,

    #[serde(rename = "_embedded")]
    pub embedded: PaginatedEmbedded<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationLinks {
    #[serde(rename = "self")]
    pub self_link: LinkObject,

    #[serde(rename = "jumpTo")]
    pub jump_to: LinkObject,

    #[serde(rename = "changeSize")]
    pub change_size: LinkObject,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "previousByOffset")]
    pub previous: Option<LinkObject>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "nextByOffset")]
    pub next: Option<LinkObject>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LinkObject {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
}

impl LinkObject {
    fn new(href: String) -> Self {
        Self {
            href,
            templated: None,
        }
    }

    fn templated(href: String) -> Self {
        Self {
            href,
            templated: Some(true),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedEmbedded<T> {
    pub elements: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    pub fn new(
        items: Vec<T>,
        total: i64,
        params: &PaginationParams,
        base_url: &str,
        element_type: &str,
    ) -> Self {
        let offset = params.offset();
        let count = items.len() as i64;
        let page_size = params.page_size;

        let href = |offset: i64| format!("{}?offset={}&pageSize={}", base_url, offset, page_size);

        let previous = (offset > 0).then(|| LinkObject::new(href((offset - page_size).max(0))));
        let next = (offset + count < total).then(|| LinkObject::new(href(offset + page_size)));

        Self {
            hal_type: Self::collection_type(element_type),
            total,
            count,
            page_size,
            offset,
            links: PaginationLinks {
                self_link: LinkObject::new(href(offset)),
                jump_to: LinkObject::templated(format!(
                    "{}?offset={{offset}}&pageSize={}",
                    base_url, page_size
                )),
                change_size: LinkObject::templated(format!(
                    "{}?offset={}&pageSize={{size}}",
                    base_url, offset
                )),
                previous,
                next,
            },
            embedded: PaginatedEmbedded { elements: items },
        }
    }

    /// Append `name=value` to every link href
    pub fn with_link_param(mut self, name: &str, value: &str) -> Self {
        let suffix = format!("&{}={}", name, value);
        let links = &mut self.links;
        for link in [&mut links.self_link, &mut links.jump_to, &mut links.change_size]
            .into_iter()
            .chain(links.previous.as_mut())
            .chain(links.next.as_mut())
        {
            link.href.push_str(&suffix);
        }
        self
    }

    /// Collection type name for the response envelope
    pub fn collection_type(element_type: &str) -> String {
        format!("{}Collection", element_type)
    }
}
