//! # blog-api
//!
//! HTTP API handlers for Blog RS.
//!
//! Thin axum handlers over the `blog-db` repositories, returning HAL+JSON
//! projections of posts, authors and comments.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod representers;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use extractors::{ApiConfig, AppState, QUERY_COUNT_HEADER};
pub use routes::router;
