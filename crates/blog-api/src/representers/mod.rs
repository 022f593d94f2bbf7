//! API Representers
//!
//! Projections of the read aggregates into HAL+JSON responses. Entities are
//! never serialized directly: emails and foreign key columns stay out of the
//! API.

pub mod post;

use serde::Serialize;

pub use post::{
    AuthorRepresentation, CommentRepresentation, PostDetailRepresentation, PostRepresentation,
};

/// A HAL link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HalLink {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl HalLink {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: None,
        }
    }

    pub fn with_title(href: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: Some(title.into()),
        }
    }
}
