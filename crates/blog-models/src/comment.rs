//! Comment model
//!
//! Table: comments

use blog_core::traits::{Entity, Id, Identifiable, Timestamped};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::mapping::{ForeignKey, IndexDef, Mapped, Relation, RelationKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Id,
    pub content: String,
    pub post_id: Id,
    /// Author
    pub user_id: Id,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for Comment {
    fn id(&self) -> Option<Id> {
        Some(self.id)
    }
}

impl Timestamped for Comment {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

impl Entity for Comment {
    const TABLE_NAME: &'static str = "comments";
    const TYPE_NAME: &'static str = "Comment";
}

impl Mapped for Comment {
    const FOREIGN_KEYS: &'static [ForeignKey] = &[
        ForeignKey {
            column: "post_id",
            references_table: "posts",
            references_column: "id",
        },
        ForeignKey {
            column: "user_id",
            references_table: "users",
            references_column: "id",
        },
    ];

    const INDEXES: &'static [IndexDef] = &[IndexDef {
        name: "idx_comment_post_id",
        table: "comments",
        columns: &["post_id"],
        unique: false,
    }];

    const RELATIONS: &'static [Relation] = &[
        Relation {
            name: "post",
            kind: RelationKind::ManyToOne,
            target_table: "posts",
            join_column: "post_id",
        },
        Relation {
            name: "author",
            kind: RelationKind::ManyToOne,
            target_table: "users",
            join_column: "user_id",
        },
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewComment {
    #[validate(length(min = 1, max = 2000, message = "must be between 1 and 2000 characters"))]
    pub content: String,
    pub post_id: Id,
    pub user_id: Id,
}

impl NewComment {
    pub fn new(post_id: Id, user_id: Id, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            post_id,
            user_id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateComment {
    #[validate(length(min = 1, max = 2000, message = "must be between 1 and 2000 characters"))]
    pub content: Option<String>,
}
