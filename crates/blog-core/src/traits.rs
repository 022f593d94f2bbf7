//! Core traits shared by models and repositories

use chrono::{DateTime, Utc};

/// Primary key type (BIGSERIAL)
pub type Id = i64;

/// Trait for entities that have a primary key
pub trait Identifiable {
    fn id(&self) -> Option<Id>;
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
    fn is_new_record(&self) -> bool {
        !self.is_persisted()
    }
}

/// Trait for entities with a creation timestamp
pub trait Timestamped {
    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Entities without an update column report their creation time
    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.created_at()
    }
}

/// Base trait for all domain entities
pub trait Entity: Identifiable + Timestamped + Send + Sync {
    /// The database table name
    const TABLE_NAME: &'static str;

    /// Human-readable type name for error messages
    const TYPE_NAME: &'static str;
}
