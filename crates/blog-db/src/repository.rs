//! Repository traits and base implementations
//!
//! Provides generic CRUD operations for database entities.

use async_trait::async_trait;
use blog_core::error::ValidationErrors;
use blog_core::traits::Id;

/// SQLSTATE classes raised by the schema's constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityViolation {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl IntegrityViolation {
    pub fn from_sqlstate(code: &str) -> Option<Self> {
        match code {
            "23505" => Some(Self::Unique),
            "23503" => Some(Self::ForeignKey),
            "23502" => Some(Self::NotNull),
            "23514" => Some(Self::Check),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unique => "unique constraint",
            Self::ForeignKey => "foreign key constraint",
            Self::NotNull => "not-null constraint",
            Self::Check => "check constraint",
        }
    }

    pub fn describe(&self, constraint: Option<&str>) -> String {
        match constraint {
            Some(name) => format!("{} {}", self.as_str(), name),
            None => self.as_str().to_string(),
        }
    }
}

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Violates {}: {message}", .violation.describe(.constraint.as_deref()))]
    Integrity {
        violation: IntegrityViolation,
        constraint: Option<String>,
        message: String,
    },

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Rows that the schema's foreign keys should have made impossible
    #[error("Inconsistent data: {0}")]
    Inconsistent(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let violation = db_err
                .code()
                .as_deref()
                .and_then(IntegrityViolation::from_sqlstate);
            if let Some(violation) = violation {
                return RepositoryError::Integrity {
                    violation,
                    constraint: db_err.constraint().map(str::to_string),
                    message: db_err.message().to_string(),
                };
            }
        }

        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                RepositoryError::Unavailable(err.to_string())
            }
            other => RepositoryError::Database(other),
        }
    }
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: Id) -> Self {
        RepositoryError::NotFound(format!("{} with id {} not found", entity, id))
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, RepositoryError::Integrity { .. })
    }
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Base repository trait for CRUD operations
#[async_trait]
pub trait Repository<T, CreateDto, UpdateDto>: Send + Sync {
    /// Find an entity by ID
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<T>>;

    /// Find all entities with pagination
    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<T>>;

    /// Count all entities
    async fn count(&self) -> RepositoryResult<i64>;

    /// Create a new entity
    async fn create(&self, dto: CreateDto) -> RepositoryResult<T>;

    /// Update an existing entity
    async fn update(&self, id: Id, dto: UpdateDto) -> RepositoryResult<T>;

    /// Delete an entity by ID
    async fn delete(&self, id: Id) -> RepositoryResult<()>;

    /// Check if an entity exists
    async fn exists(&self, id: Id) -> RepositoryResult<bool>;
}

/// Pagination parameters for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    pub fn page(page: i64, per_page: i64) -> Self {
        Self {
            limit: per_page,
            offset: (page - 1) * per_page,
        }
    }
}

impl From<&blog_core::PaginationParams> for Pagination {
    fn from(params: &blog_core::PaginationParams) -> Self {
        Self::new(params.limit(), params.offset())
    }
}

/// Query result with pagination metadata
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            limit: pagination.limit,
            offset: pagination.offset,
        }
    }

    pub fn page(&self) -> i64 {
        if self.limit == 0 {
            1
        } else {
            (self.offset / self.limit) + 1
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.limit == 0 {
            1
        } else {
            (self.total + self.limit - 1) / self.limit
        }
    }

    pub fn has_next(&self) -> bool {
        self.offset + self.limit < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.offset > 0
    }

    /// Transform the items, keeping the page metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
