//! Post model
//!
//! Table: posts

use blog_core::traits::{Entity, Id, Identifiable, Timestamped};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::mapping::{ForeignKey, IndexDef, Mapped, Relation, RelationKind};

/// Post entity
///
/// Owning side of the `User 1—N Post` relationship, inverse side of
/// `Post 1—N Comment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub user_id: Id,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for Post {
    fn id(&self) -> Option<Id> {
        Some(self.id)
    }
}

impl Timestamped for Post {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

impl Entity for Post {
    const TABLE_NAME: &'static str = "posts";
    const TYPE_NAME: &'static str = "Post";
}

impl Mapped for Post {
    const FOREIGN_KEYS: &'static [ForeignKey] = &[ForeignKey {
        column: "user_id",
        references_table: "users",
        references_column: "id",
    }];

    const INDEXES: &'static [IndexDef] = &[
        // newest-first listing
        IndexDef {
            name: "idx_post_created_at",
            table: "posts",
            columns: &["created_at"],
            unique: false,
        },
        // per-user listing: equality on user_id, ordered by created_at
        IndexDef {
            name: "idx_post_user_created",
            table: "posts",
            columns: &["user_id", "created_at"],
            unique: false,
        },
    ];

    const RELATIONS: &'static [Relation] = &[
        Relation {
            name: "author",
            kind: RelationKind::ManyToOne,
            target_table: "users",
            join_column: "user_id",
        },
        Relation {
            name: "comments",
            kind: RelationKind::OneToMany,
            target_table: "comments",
            join_column: "post_id",
        },
    ];
}

/// Attributes for inserting a post
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "can't be blank"))]
    pub content: String,

    pub user_id: Id,
}

impl NewPost {
    pub fn new(user_id: Id, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            user_id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePost {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "can't be blank"))]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;

    #[test]
    fn test_title_bounds() {
        assert!(validate(&NewPost::new(1, "Hello", "World")).is_ok());

        let long_title = "x".repeat(201);
        let err = validate(&NewPost::new(1, long_title, "body")).unwrap_err();
        assert!(err.has_error("title"));
        assert!(!err.has_error("content"));
    }

    #[test]
    fn test_blank_content_rejected() {
        let err = validate(&UpdatePost {
            title: None,
            content: Some(String::new()),
        })
        .unwrap_err();
        assert_eq!(err.get("content"), Some(&vec!["can't be blank".to_string()]));
    }
}
