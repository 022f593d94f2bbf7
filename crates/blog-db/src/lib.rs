//! # blog-db
//!
//! Database layer for Blog RS.
//!
//! PostgreSQL access through SQLx:
//!
//! - Connection pool management and embedded migrations
//! - Repository pattern for CRUD operations and by-field finders
//! - Post/author/comment aggregates loaded by join, batch or lazy fetching
//! - Per-repository statement accounting
//!
//! ## Example
//!
//! ```ignore
//! use blog_db::{Database, DatabaseConfig, FetchStrategy, Pagination, PostRepository};
//!
//! let db = Database::connect(&DatabaseConfig::from_env()).await?;
//! db.migrate().await?;
//!
//! let posts = PostRepository::new(db.pool().clone());
//! let page = posts.find_page_with_author(Pagination::default(), FetchStrategy::Batch).await?;
//! assert_eq!(posts.statements(), 3); // posts, authors, count
//! ```

pub mod comments;
pub mod explain;
pub mod fetch;
pub mod pool;
pub mod posts;
pub mod repository;
pub mod stats;
pub mod users;

// Re-exports
pub use comments::CommentRepository;
pub use explain::{explain, ExplainOptions, PlanTarget, QueryPlan, UnknownPlanTarget};
pub use fetch::{
    Author, CommentWithAuthor, FetchStrategy, PostDetail, PostWithAuthor, UnknownFetchStrategy,
};
pub use pool::{Database, DatabaseConfig, PoolStats};
pub use posts::PostRepository;
pub use repository::{
    IntegrityViolation, Pagination, PaginatedResult, Repository, RepositoryError, RepositoryResult,
};
pub use stats::QueryStats;
pub use users::UserRepository;
