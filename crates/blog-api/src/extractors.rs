//! Axum extractors for API handlers

use axum::{
    async_trait,
    body::Body,
    extract::{FromRef, FromRequestParts, Path, Query},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use blog_core::config::ApiSettings;
use blog_core::traits::Id;
use blog_core::PaginationParams;
use blog_db::{Database, FetchStrategy, UnknownFetchStrategy};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    /// `None` when the server started without a reachable database
    pub db: Option<Database>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Prefix for links in responses; empty for relative links
    pub base_url: String,
    pub default_fetch: FetchStrategy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            default_fetch: FetchStrategy::Join,
        }
    }
}

impl ApiConfig {
    pub fn from_settings(settings: &ApiSettings) -> Result<Self, UnknownFetchStrategy> {
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            default_fetch: settings.default_fetch.parse()?,
        })
    }

    /// Absolute (or root-relative) href for an API path
    pub fn href(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl AppState {
    pub fn new(config: ApiConfig, db: Option<Database>) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }

    /// State without a database; data endpoints answer 503
    pub fn without_database() -> Self {
        Self::new(ApiConfig::default(), None)
    }

    pub fn pool(&self) -> ApiResult<&PgPool> {
        self.db
            .as_ref()
            .map(Database::pool)
            .ok_or_else(|| ApiError::unavailable("No database is configured"))
    }
}

/// Numeric path id; anything else is a 400
pub struct PathId(pub Id);

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        match raw.parse::<Id>() {
            Ok(id) if id > 0 => Ok(PathId(id)),
            _ => Err(ApiError::bad_request(format!(
                "'{}' is not a valid id",
                raw
            ))),
        }
    }
}

/// Pagination parameters, normalized into the accepted ranges
pub struct Pagination(pub PaginationParams);

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Ok(Pagination(params.normalized()))
    }
}

impl std::ops::Deref for Pagination {
    type Target = PaginationParams;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Deserialize)]
struct FetchQuery {
    fetch: Option<String>,
}

/// `?fetch=join|batch|lazy`, defaulting to the configured strategy
pub struct Fetch(pub FetchStrategy);

#[async_trait]
impl<S> FromRequestParts<S> for Fetch
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<FetchQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        match query.fetch {
            None => Ok(Fetch(AppState::from_ref(state).config.default_fetch)),
            Some(raw) => raw
                .parse()
                .map(Fetch)
                .map_err(|e: UnknownFetchStrategy| ApiError::bad_request(e.to_string())),
        }
    }
}

/// HAL+JSON body carrying the number of SQL statements spent on it
pub struct HalResponse<T: serde::Serialize> {
    pub body: T,
    pub query_count: u64,
}

impl<T: serde::Serialize> HalResponse<T> {
    pub fn new(body: T, query_count: u64) -> Self {
        Self { body, query_count }
    }
}

pub const QUERY_COUNT_HEADER: &str = "x-query-count";

impl<T: serde::Serialize> IntoResponse for HalResponse<T> {
    fn into_response(self) -> Response {
        let json = match serde_json::to_vec(&self.body) {
            Ok(json) => json,
            Err(e) => return ApiError::internal(e.to_string()).into_response(),
        };

        let mut response = Response::new(Body::from(json));
        *response.status_mut() = StatusCode::OK;
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/hal+json; charset=utf-8"),
        );
        headers.insert(QUERY_COUNT_HEADER, HeaderValue::from(self.query_count));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_from_settings() {
        let config = ApiConfig::from_settings(&ApiSettings {
            base_url: "https://blog.example.com/".into(),
            default_fetch: "batch".into(),
        })
        .unwrap();
        assert_eq!(config.default_fetch, FetchStrategy::Batch);
        assert_eq!(config.href("/api/posts"), "https://blog.example.com/api/posts");

        assert!(ApiConfig::from_settings(&ApiSettings {
            base_url: String::new(),
            default_fetch: "eager".into(),
        })
        .is_err());
    }

    #[test]
    fn test_pool_without_database() {
        let state = AppState::without_database();
        let err = state.pool().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
