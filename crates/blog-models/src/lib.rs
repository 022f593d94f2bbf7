//! # blog-models
//!
//! Domain models for Blog RS.
//!
//! Each entity maps to one table and implements the core traits from
//! `blog-core` plus [`mapping::Mapped`], which declares its foreign keys,
//! indexes and relationships.

pub use blog_core::traits::{Entity, Id, Identifiable, Timestamped};

pub mod comment;
pub mod mapping;
pub mod post;
pub mod user;
pub mod validation;

pub use comment::{Comment, NewComment, UpdateComment};
pub use mapping::{ForeignKey, IndexDef, Mapped, Relation, RelationKind};
pub use post::{NewPost, Post, UpdatePost};
pub use user::{NewUser, UpdateUser, User};
pub use validation::validate;

/// Every index declared by the mapped entities, in table creation order
pub fn declared_indexes() -> impl Iterator<Item = &'static IndexDef> {
    User::INDEXES
        .iter()
        .chain(Post::INDEXES)
        .chain(Comment::INDEXES)
}

/// Every foreign key as `(table, key)`
pub fn declared_foreign_keys() -> impl Iterator<Item = (&'static str, &'static ForeignKey)> {
    let keys = |table: &'static str, fks: &'static [ForeignKey]| fks.iter().map(move |fk| (table, fk));
    keys(User::TABLE_NAME, User::FOREIGN_KEYS)
        .chain(keys(Post::TABLE_NAME, Post::FOREIGN_KEYS))
        .chain(keys(Comment::TABLE_NAME, Comment::FOREIGN_KEYS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_indexes() {
        let names: Vec<_> = declared_indexes().map(|i| i.name).collect();
        assert_eq!(
            names,
            vec![
                "idx_user_email",
                "idx_post_created_at",
                "idx_post_user_created",
                "idx_comment_post_id",
            ]
        );
        assert!(declared_indexes().filter(|i| i.unique).all(|i| i.table == "users"));
    }

    #[test]
    fn test_many_to_one_relations_have_foreign_keys() {
        fn check<M: Mapped>() {
            for relation in M::RELATIONS {
                if relation.kind == RelationKind::ManyToOne {
                    assert!(
                        M::FOREIGN_KEYS.iter().any(|fk| fk.column == relation.join_column
                            && fk.references_table == relation.target_table),
                        "{}.{} has no foreign key",
                        M::TABLE_NAME,
                        relation.name
                    );
                }
            }
        }
        check::<User>();
        check::<Post>();
        check::<Comment>();
    }

    #[test]
    fn test_one_to_many_relations_are_owned_elsewhere() {
        let owned: Vec<_> = declared_foreign_keys()
            .map(|(table, fk)| (table, fk.column, fk.references_table))
            .collect();

        for relation in User::RELATIONS.iter().chain(Post::RELATIONS) {
            if relation.kind == RelationKind::OneToMany {
                assert!(owned.iter().any(|(table, column, _)| *table == relation.target_table
                    && *column == relation.join_column));
            }
        }
        assert_eq!(owned.len(), 3);
    }

    #[test]
    fn test_models_serialize() {
        let user = User {
            id: 1,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert!(user.is_persisted());
    }
}
