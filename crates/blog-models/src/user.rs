//! User model
//!
//! Table: users

use blog_core::traits::{Entity, Id, Identifiable, Timestamped};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::mapping::{ForeignKey, IndexDef, Mapped, Relation, RelationKind};

/// User entity
///
/// Inverse side of `posts.user_id` and `comments.user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Id,
    pub name: String,
    /// Unique across all users
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identifiable for User {
    fn id(&self) -> Option<Id> {
        Some(self.id)
    }
}

impl Timestamped for User {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }
}

impl Entity for User {
    const TABLE_NAME: &'static str = "users";
    const TYPE_NAME: &'static str = "User";
}

impl Mapped for User {
    const FOREIGN_KEYS: &'static [ForeignKey] = &[];

    const INDEXES: &'static [IndexDef] = &[IndexDef {
        name: "idx_user_email",
        table: "users",
        columns: &["email"],
        unique: true,
    }];

    const RELATIONS: &'static [Relation] = &[
        Relation {
            name: "posts",
            kind: RelationKind::OneToMany,
            target_table: "posts",
            join_column: "user_id",
        },
        Relation {
            name: "comments",
            kind: RelationKind::OneToMany,
            target_table: "comments",
            join_column: "user_id",
        },
    ];
}

/// Attributes for inserting a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(
        email(message = "is not a valid email address"),
        length(max = 255, message = "is too long (maximum is 255 characters)")
    )]
    pub email: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[validate(
        email(message = "is not a valid email address"),
        length(max = 255, message = "is too long (maximum is 255 characters)")
    )]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    #[test]
    fn test_new_user_validation() {
        assert!(validate(&NewUser::new("Ada", "ada@example.com")).is_ok());

        let err = validate(&NewUser::new("", "not-an-email")).unwrap_err();
        assert!(err.has_error("name"));
        assert!(err.has_error("email"));
    }

    #[test]
    fn test_update_user_skips_absent_fields() {
        assert!(validate(&UpdateUser::default()).is_ok());

        let update = UpdateUser {
            name: None,
            email: Some("broken".to_string()),
        };
        let err = validate(&update).unwrap_err();
        assert_eq!(
            err.get("email"),
            Some(&vec!["is not a valid email address".to_string()])
        );
    }
}
