//! HTTP tests for the post endpoints
//!
//! Tests without a database exercise routing, parameter handling and error
//! bodies. The ignored ones need `DATABASE_URL`.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use blog_api::{router, ApiConfig, AppState, QUERY_COUNT_HEADER};
use blog_db::{
    CommentRepository, Database, DatabaseConfig, FetchStrategy, PostRepository, Repository,
    UserRepository,
};
use blog_models::{NewComment, NewPost, NewUser, User};
use serde_json::Value;
use tower::ServiceExt;

fn app_without_database() -> Router {
    router().with_state(AppState::without_database())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<u64>, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let query_count = response
        .headers()
        .get(QUERY_COUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, query_count, body)
}

#[tokio::test]
async fn test_api_root() {
    let (status, _, body) = get(app_without_database(), "/api").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["_type"], "Root");
    assert_eq!(body["_links"]["posts"]["href"], "/api/posts");
}

#[tokio::test]
async fn test_list_without_database_is_unavailable() {
    let (status, query_count, body) = get(app_without_database(), "/api/posts").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(query_count, None);
    assert_eq!(body["_type"], "Error");
    assert_eq!(body["errorIdentifier"], "ServiceUnavailable");
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    for uri in ["/api/posts/abc", "/api/posts/-4", "/api/posts/users/x1"] {
        let (status, _, body) = get(app_without_database(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["errorIdentifier"], "InvalidRequest", "{}", uri);
    }
}

#[tokio::test]
async fn test_unknown_fetch_strategy_is_bad_request() {
    let (status, _, body) = get(app_without_database(), "/api/posts?fetch=eager").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("eager"));
}

#[tokio::test]
async fn test_malformed_pagination_is_bad_request() {
    let (status, _, body) = get(app_without_database(), "/api/posts?pageSize=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorIdentifier"], "InvalidRequest");
}

#[tokio::test]
async fn test_valid_parameters_reach_the_database_check() {
    let (status, _, _) = get(
        app_without_database(),
        "/api/posts/7?fetch=lazy",
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _, _) = get(
        app_without_database(),
        "/api/posts/users/7?page=2&pageSize=500&fetch=BATCH",
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _, _) = get(app_without_database(), "/api/comments").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn app_with_database() -> (Router, Database) {
    let db = Database::connect(&DatabaseConfig::from_env())
        .await
        .expect("Failed to connect to test database");
    db.migrate().await.expect("Failed to run migrations");
    let app = router().with_state(AppState::new(ApiConfig::default(), Some(db.clone())));
    (app, db)
}

async fn create_user(db: &Database, name: &str) -> User {
    UserRepository::new(db.pool().clone())
        .create(NewUser::new(
            name,
            format!("{}-{}@example.com", name, uuid::Uuid::new_v4()),
        ))
        .await
        .expect("Failed to create user")
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_user_posts_query_count_per_strategy() {
    let (app, db) = app_with_database().await;
    let author = create_user(&db, "writer").await;
    let posts = PostRepository::new(db.pool().clone());
    for i in 0..3 {
        posts
            .create(NewPost::new(author.id, format!("Entry {}", i), "Text"))
            .await
            .unwrap();
    }

    // existence check + fetch statements + COUNT(*)
    for (strategy, expected) in [
        (FetchStrategy::Join, 1 + 1 + 1),
        (FetchStrategy::Batch, 1 + 2 + 1),
        (FetchStrategy::Lazy, 1 + 4 + 1),
    ] {
        let uri = format!("/api/posts/users/{}?fetch={}", author.id, strategy);
        let (status, query_count, body) = get(app.clone(), &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(query_count, Some(expected), "{}", strategy);
        assert_eq!(body["_type"], "PostCollection");
        assert_eq!(body["total"], 3);
        assert_eq!(body["_embedded"]["elements"][0]["title"], "Entry 2");
        assert_eq!(body["_embedded"]["elements"][0]["author"]["name"], "writer");
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_user_posts_pagination_links() {
    let (app, db) = app_with_database().await;
    let author = create_user(&db, "prolific").await;
    let posts = PostRepository::new(db.pool().clone());
    for i in 0..5 {
        posts
            .create(NewPost::new(author.id, format!("Part {}", i), "Text"))
            .await
            .unwrap();
    }

    let uri = format!("/api/posts/users/{}?page=2&pageSize=2&fetch=batch", author.id);
    let (status, _, body) = get(app.clone(), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["offset"], 2);
    assert_eq!(body["pageSize"], 2);
    assert!(body["_links"]["previousByOffset"]["href"]
        .as_str()
        .unwrap()
        .ends_with("offset=0&pageSize=2&fetch=batch"));
    let next = body["_links"]["nextByOffset"]["href"].as_str().unwrap().to_string();
    assert!(next.ends_with("offset=4&pageSize=2&fetch=batch"));

    // following the link keeps the strategy: existence check + 2 fetches + COUNT(*)
    let (status, query_count, body) = get(app, &next).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(query_count, Some(4));
    assert_eq!(body["count"], 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_post_list_query_count_per_strategy() {
    let (app, db) = app_with_database().await;
    let author = create_user(&db, "columnist").await;
    let posts = PostRepository::new(db.pool().clone());
    for i in 0..3 {
        posts
            .create(NewPost::new(author.id, format!("Column {}", i), "Text"))
            .await
            .unwrap();
    }

    // fetch statements + COUNT(*)
    for strategy in FetchStrategy::ALL {
        let uri = format!("/api/posts?pageSize=3&fetch={}", strategy);
        let (status, query_count, body) = get(app.clone(), &uri).await;

        assert_eq!(status, StatusCode::OK);
        let n = body["count"].as_u64().unwrap();
        assert_eq!(n, 3);
        let expected = match strategy {
            FetchStrategy::Join => 1 + 1,
            FetchStrategy::Batch => 2 + 1,
            FetchStrategy::Lazy => 1 + n + 1,
        };
        assert_eq!(query_count, Some(expected), "{}", strategy);
        assert!(body["_links"]["self"]["href"]
            .as_str()
            .unwrap()
            .ends_with(&format!("fetch={}", strategy)));
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_missing_user_and_post_are_not_found() {
    let (app, _db) = app_with_database().await;

    let (status, _, body) = get(app.clone(), &format!("/api/posts/users/{}", i64::MAX)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorIdentifier"], "NotFound");

    let (status, _, _) = get(app, &format!("/api/posts/{}", i64::MAX)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_post_detail_with_comments() {
    let (app, db) = app_with_database().await;
    let author = create_user(&db, "host").await;
    let guest = create_user(&db, "guest").await;
    let post = PostRepository::new(db.pool().clone())
        .create(NewPost::new(author.id, "Welcome", "First post"))
        .await
        .unwrap();
    CommentRepository::new(db.pool().clone())
        .create(NewComment::new(post.id, guest.id, "Hello!"))
        .await
        .unwrap();

    for strategy in FetchStrategy::ALL {
        let uri = format!("/api/posts/{}?fetch={}", post.id, strategy);
        let (status, _, body) = get(app.clone(), &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Welcome");
        assert_eq!(body["author"]["name"], "host");
        assert_eq!(body["commentCount"], 1);
        assert_eq!(body["_embedded"]["comments"][0]["author"]["name"], "guest");
    }
}
