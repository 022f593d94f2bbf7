//! API routes

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::extractors::AppState;
use crate::handlers::posts;
use crate::representers::HalLink;

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api", api_router())
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .nest("/posts", posts_router())
}

fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::list_posts))
        .route("/:id", get(posts::get_post))
        .route("/users/:user_id", get(posts::list_user_posts))
}

async fn api_root(State(state): State<AppState>) -> Json<ApiRoot> {
    Json(ApiRoot {
        type_name: "Root",
        instance_name: "Blog RS",
        links: RootLinks {
            self_link: HalLink::new(state.config.href("/api")),
            posts: HalLink::new(state.config.href("/api/posts")),
        },
    })
}

#[derive(Serialize)]
struct ApiRoot {
    #[serde(rename = "_type")]
    type_name: &'static str,
    #[serde(rename = "instanceName")]
    instance_name: &'static str,
    #[serde(rename = "_links")]
    links: RootLinks,
}

#[derive(Serialize)]
struct RootLinks {
    #[serde(rename = "self")]
    self_link: HalLink,
    posts: HalLink,
}
