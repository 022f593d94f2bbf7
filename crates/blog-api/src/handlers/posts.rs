//! Post API handlers
//!
//! Every response carries `x-query-count`, the number of SQL statements the
//! request cost under the chosen fetch strategy.

use axum::{extract::State, response::IntoResponse};
use blog_core::PaginatedResponse;
use blog_db::{Pagination as PageWindow, PostRepository, Repository, UserRepository};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, Fetch, HalResponse, Pagination, PathId};
use crate::representers::{PostDetailRepresentation, PostRepresentation};

/// GET /api/posts
pub async fn list_posts(
    State(state): State<AppState>,
    pagination: Pagination,
    Fetch(strategy): Fetch,
) -> ApiResult<impl IntoResponse> {
    let repo = PostRepository::new(state.pool()?.clone());

    let page = repo
        .find_page_with_author(PageWindow::from(&pagination.0), strategy)
        .await?;

    let config = &state.config;
    let elements = page
        .items
        .into_iter()
        .map(|item| PostRepresentation::represent(item, config))
        .collect();
    let collection = PaginatedResponse::new(
        elements,
        page.total,
        &pagination.0,
        &config.href("/api/posts"),
        "Post",
    )
    .with_link_param("fetch", strategy.as_str());

    tracing::debug!(
        fetch = %strategy,
        statements = repo.statements(),
        count = collection.count,
        "listed posts"
    );
    Ok(HalResponse::new(collection, repo.statements()))
}

/// GET /api/posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    PathId(id): PathId,
    Fetch(strategy): Fetch,
) -> ApiResult<impl IntoResponse> {
    let repo = PostRepository::new(state.pool()?.clone());

    let detail = repo
        .find_detail(id, strategy)
        .await?
        .ok_or_else(|| ApiError::not_found("Post", id))?;

    tracing::debug!(
        post_id = id,
        fetch = %strategy,
        statements = repo.statements(),
        "loaded post detail"
    );
    Ok(HalResponse::new(
        PostDetailRepresentation::represent(detail, &state.config),
        repo.statements(),
    ))
}

/// GET /api/posts/users/:user_id
pub async fn list_user_posts(
    State(state): State<AppState>,
    PathId(user_id): PathId,
    pagination: Pagination,
    Fetch(strategy): Fetch,
) -> ApiResult<impl IntoResponse> {
    let pool = state.pool()?.clone();
    let repo = PostRepository::new(pool.clone());
    let users = UserRepository::with_stats(pool, Arc::clone(repo.stats()));

    if !users.exists(user_id).await? {
        return Err(ApiError::not_found("User", user_id));
    }

    let page = repo
        .find_page_by_user_with_author(user_id, PageWindow::from(&pagination.0), strategy)
        .await?;

    let config = &state.config;
    let elements = page
        .items
        .into_iter()
        .map(|item| PostRepresentation::represent(item, config))
        .collect();
    let collection = PaginatedResponse::new(
        elements,
        page.total,
        &pagination.0,
        &config.href(&format!("/api/posts/users/{}", user_id)),
        "Post",
    )
    .with_link_param("fetch", strategy.as_str());

    Ok(HalResponse::new(collection, repo.statements()))
}
