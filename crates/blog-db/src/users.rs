//! User repository
//!
//! Database operations for users.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use blog_core::traits::Id;
use blog_models::{validate, NewUser, UpdateUser, User};
use sqlx::PgPool;

use crate::fetch::Author;
use crate::repository::{
    Pagination, PaginatedResult, Repository, RepositoryError, RepositoryResult,
};
use crate::stats::QueryStats;

const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";

pub(crate) const SELECT_BY_EMAIL: &str =
    "SELECT id, name, email, created_at, updated_at FROM users WHERE email = $1";

/// User repository implementation
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
    stats: Arc<QueryStats>,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_stats(pool, QueryStats::new())
    }

    /// Share a statement counter with other repositories
    pub fn with_stats(pool: PgPool, stats: Arc<QueryStats>) -> Self {
        Self { pool, stats }
    }

    pub fn stats(&self) -> &Arc<QueryStats> {
        &self.stats
    }

    /// Find a user by email (served by `idx_user_email`)
    pub async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.stats.record("users.find_by_email");
        let row = sqlx::query_as::<_, User>(SELECT_BY_EMAIL)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        self.stats.record("users.exists_by_email");
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// Load several users in one statement
    pub async fn find_by_ids(&self, ids: &[Id]) -> RepositoryResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.stats.record("users.find_by_ids");
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1) ORDER BY id",
            USER_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Single author lookup, the per-row query of lazy loading
    pub async fn find_author(&self, id: Id) -> RepositoryResult<Option<Author>> {
        self.stats.record("users.find_author");
        let row = sqlx::query_as::<_, Author>("SELECT id, name FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Batch author lookup keyed by user id
    pub async fn find_authors(&self, ids: &[Id]) -> RepositoryResult<HashMap<Id, Author>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.stats.record("users.find_authors");
        let rows = sqlx::query_as::<_, Author>("SELECT id, name FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|a| (a.id, a)).collect())
    }

    /// Users ordered by name
    pub async fn find_page(&self, pagination: Pagination) -> RepositoryResult<PaginatedResult<User>> {
        let items = self.find_all(pagination.limit, pagination.offset).await?;
        let total = self.count().await?;
        Ok(PaginatedResult::new(items, total, pagination))
    }
}

#[async_trait]
impl Repository<User, NewUser, UpdateUser> for UserRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<User>> {
        self.stats.record("users.find_by_id");
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<User>> {
        self.stats.record("users.find_all");
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY name ASC, id ASC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        self.stats.record("users.count");
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: NewUser) -> RepositoryResult<User> {
        validate(&dto)?;

        self.stats.record("users.create");
        let row = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, created_at, updated_at) \
             VALUES ($1, $2, NOW(), NOW()) \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&dto.name)
        .bind(&dto.email)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(user_id = row.id, "created user");
        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdateUser) -> RepositoryResult<User> {
        validate(&dto)?;

        self.stats.record("users.update");
        let row = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                name = COALESCE($1, name), \
                email = COALESCE($2, email), \
                updated_at = NOW() \
             WHERE id = $3 \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&dto.name)
        .bind(&dto.email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found("User", id))?;

        Ok(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        self.stats.record("users.delete");
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("User", id));
        }

        Ok(())
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        self.stats.record("users.exists");
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}
