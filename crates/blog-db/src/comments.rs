//! Comment repository
//!
//! Database operations for comments.

use std::sync::Arc;

use async_trait::async_trait;
use blog_core::traits::Id;
use blog_models::{validate, Comment, NewComment, UpdateComment};
use sqlx::PgPool;

use crate::repository::{
    Pagination, PaginatedResult, Repository, RepositoryError, RepositoryResult,
};
use crate::stats::QueryStats;

const COMMENT_COLUMNS: &str = "id, content, post_id, user_id, created_at";

/// Comment repository implementation
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
    stats: Arc<QueryStats>,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_stats(pool, QueryStats::new())
    }

    pub fn with_stats(pool: PgPool, stats: Arc<QueryStats>) -> Self {
        Self { pool, stats }
    }

    pub fn stats(&self) -> &Arc<QueryStats> {
        &self.stats
    }

    /// Comments of one post, oldest first
    pub async fn find_by_post(&self, post_id: Id) -> RepositoryResult<Vec<Comment>> {
        self.stats.record("comments.find_by_post");
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE post_id = $1 ORDER BY created_at ASC, id ASC",
            COMMENT_COLUMNS
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Comments of several posts in one statement, grouped by post then age
    pub async fn find_by_posts(&self, post_ids: &[Id]) -> RepositoryResult<Vec<Comment>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.stats.record("comments.find_by_posts");
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE post_id = ANY($1) \
             ORDER BY post_id, created_at ASC, id ASC",
            COMMENT_COLUMNS
        ))
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Comments written by a user, newest first
    pub async fn find_by_user(
        &self,
        user_id: Id,
        pagination: Pagination,
    ) -> RepositoryResult<PaginatedResult<Comment>> {
        self.stats.record("comments.find_by_user");
        let items = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            COMMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await?;

        self.stats.record("comments.count_by_user");
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(PaginatedResult::new(items, total, pagination))
    }

    pub async fn count_by_post(&self, post_id: Id) -> RepositoryResult<i64> {
        self.stats.record("comments.count_by_post");
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id = $1")
                .bind(post_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

#[async_trait]
impl Repository<Comment, NewComment, UpdateComment> for CommentRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Comment>> {
        self.stats.record("comments.find_by_id");
        let row = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE id = $1",
            COMMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Comment>> {
        self.stats.record("comments.find_all");
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            COMMENT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        self.stats.record("comments.count");
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: NewComment) -> RepositoryResult<Comment> {
        validate(&dto)?;

        self.stats.record("comments.create");
        let row = sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO comments (content, post_id, user_id, created_at) \
             VALUES ($1, $2, $3, NOW()) \
             RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(&dto.content)
        .bind(dto.post_id)
        .bind(dto.user_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(comment_id = row.id, post_id = row.post_id, "created comment");
        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdateComment) -> RepositoryResult<Comment> {
        validate(&dto)?;

        self.stats.record("comments.update");
        let row = sqlx::query_as::<_, Comment>(&format!(
            "UPDATE comments SET content = COALESCE($1, content) WHERE id = $2 RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(&dto.content)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Comment", id))?;

        Ok(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        self.stats.record("comments.delete");
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Comment", id));
        }

        Ok(())
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        self.stats.record("comments.exists");
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}
