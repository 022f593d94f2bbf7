//! Fetch strategies and read aggregates
//!
//! Loading posts together with their authors (and a post together with its
//! comments) can be shaped three ways:
//!
//! - `Join`: one statement joining the association in
//! - `Batch`: one statement for the parents, one `= ANY($1)` statement per association
//! - `Lazy`: one statement for the parents, one more per parent row (N+1)
//!
//! All three produce identical aggregates; the row-to-aggregate assembly
//! below is shared.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use blog_core::traits::Id;
use blog_models::{Comment, Post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::repository::{RepositoryError, RepositoryResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    #[default]
    Join,
    Batch,
    Lazy,
}

impl FetchStrategy {
    pub const ALL: [FetchStrategy; 3] = [Self::Join, Self::Batch, Self::Lazy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Batch => "batch",
            Self::Lazy => "lazy",
        }
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fetch strategy '{0}' (expected join, batch or lazy)")]
pub struct UnknownFetchStrategy(pub String);

impl FromStr for FetchStrategy {
    type Err = UnknownFetchStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "join" => Ok(Self::Join),
            "batch" => Ok(Self::Batch),
            "lazy" => Ok(Self::Lazy),
            other => Err(UnknownFetchStrategy(other.to_string())),
        }
    }
}

/// Author projection of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Author {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Author,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: Author,
}

/// A post with its author and comments (oldest comment first)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub author: Author,
    pub comments: Vec<CommentWithAuthor>,
}

/// Row of `posts JOIN users`
#[derive(Debug, Clone, FromRow)]
pub(crate) struct PostAuthorRow {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub user_id: Id,
    pub created_at: DateTime<Utc>,
    pub author_name: String,
}

impl From<PostAuthorRow> for PostWithAuthor {
    fn from(row: PostAuthorRow) -> Self {
        PostWithAuthor {
            author: Author {
                id: row.user_id,
                name: row.author_name,
            },
            post: Post {
                id: row.id,
                title: row.title,
                content: row.content,
                user_id: row.user_id,
                created_at: row.created_at,
            },
        }
    }
}

/// Row of `posts JOIN users LEFT JOIN comments LEFT JOIN users`
///
/// Comment columns are NULL for a post without comments.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct PostDetailRow {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub user_id: Id,
    pub created_at: DateTime<Utc>,
    pub author_name: String,
    pub comment_id: Option<Id>,
    pub comment_content: Option<String>,
    pub comment_user_id: Option<Id>,
    pub comment_created_at: Option<DateTime<Utc>>,
    pub comment_author_name: Option<String>,
}

/// Fold fetch-join rows into a single aggregate; `None` for no rows
pub(crate) fn assemble_detail(rows: Vec<PostDetailRow>) -> RepositoryResult<Option<PostDetail>> {
    let mut rows = rows.into_iter();
    let Some(first) = rows.next() else {
        return Ok(None);
    };

    let mut detail = PostDetail {
        post: Post {
            id: first.id,
            title: first.title.clone(),
            content: first.content.clone(),
            user_id: first.user_id,
            created_at: first.created_at,
        },
        author: Author {
            id: first.user_id,
            name: first.author_name.clone(),
        },
        comments: Vec::new(),
    };

    for row in std::iter::once(first).chain(rows) {
        if row.id != detail.post.id {
            return Err(RepositoryError::Inconsistent(format!(
                "detail rows span posts {} and {}",
                detail.post.id, row.id
            )));
        }
        if let Some(comment) = comment_from_row(row)? {
            detail.comments.push(comment);
        }
    }

    Ok(Some(detail))
}

fn comment_from_row(row: PostDetailRow) -> RepositoryResult<Option<CommentWithAuthor>> {
    let post_id = row.id;
    match (
        row.comment_id,
        row.comment_content,
        row.comment_user_id,
        row.comment_created_at,
        row.comment_author_name,
    ) {
        (None, ..) => Ok(None),
        (Some(id), Some(content), Some(user_id), Some(created_at), Some(name)) => {
            Ok(Some(CommentWithAuthor {
                comment: Comment {
                    id,
                    content,
                    post_id,
                    user_id,
                    created_at,
                },
                author: Author { id: user_id, name },
            }))
        }
        (Some(id), ..) => Err(RepositoryError::Inconsistent(format!(
            "comment {} on post {} has no author row",
            id, post_id
        ))),
    }
}

/// Distinct ids in first-seen order, for `= ANY($1)` batches
pub fn distinct_ids<I: IntoIterator<Item = Id>>(ids: I) -> Vec<Id> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Pair each post with its batch-loaded author
pub(crate) fn attach_authors(
    posts: Vec<Post>,
    authors: &HashMap<Id, Author>,
) -> RepositoryResult<Vec<PostWithAuthor>> {
    posts
        .into_iter()
        .map(|post| {
            let author = authors.get(&post.user_id).cloned().ok_or_else(|| {
                RepositoryError::Inconsistent(format!(
                    "post {} references missing user {}",
                    post.id, post.user_id
                ))
            })?;
            Ok(PostWithAuthor { post, author })
        })
        .collect()
}

/// Pair each comment with its batch-loaded author
pub(crate) fn attach_comment_authors(
    comments: Vec<Comment>,
    authors: &HashMap<Id, Author>,
) -> RepositoryResult<Vec<CommentWithAuthor>> {
    comments
        .into_iter()
        .map(|comment| {
            let author = authors.get(&comment.user_id).cloned().ok_or_else(|| {
                RepositoryError::Inconsistent(format!(
                    "comment {} references missing user {}",
                    comment.id, comment.user_id
                ))
            })?;
            Ok(CommentWithAuthor { comment, author })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    fn post(id: Id, user_id: Id) -> Post {
        Post {
            id,
            title: format!("Post {}", id),
            content: "body".into(),
            user_id,
            created_at: at(0),
        }
    }

    fn detail_row(comment: Option<(Id, Id, &str)>) -> PostDetailRow {
        PostDetailRow {
            id: 10,
            title: "Indexes".into(),
            content: "B-trees".into(),
            user_id: 1,
            created_at: at(0),
            author_name: "Ada".into(),
            comment_id: comment.map(|(id, ..)| id),
            comment_content: comment.map(|(id, ..)| format!("comment {}", id)),
            comment_user_id: comment.map(|(_, user, _)| user),
            comment_created_at: comment.map(|(id, ..)| at(id as u32)),
            comment_author_name: comment.map(|(.., name)| name.to_string()),
        }
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("join".parse::<FetchStrategy>(), Ok(FetchStrategy::Join));
        assert_eq!(" Batch ".parse::<FetchStrategy>(), Ok(FetchStrategy::Batch));
        assert_eq!("LAZY".parse::<FetchStrategy>(), Ok(FetchStrategy::Lazy));
        assert!("eager".parse::<FetchStrategy>().is_err());
        assert_eq!(FetchStrategy::default(), FetchStrategy::Join);

        let parsed: FetchStrategy = serde_json::from_str("\"batch\"").unwrap();
        assert_eq!(parsed, FetchStrategy::Batch);
        assert_eq!(FetchStrategy::Lazy.to_string(), "lazy");
    }

    #[test]
    fn test_assemble_detail_without_comments() {
        let detail = assemble_detail(vec![detail_row(None)]).unwrap().unwrap();
        assert_eq!(detail.post.id, 10);
        assert_eq!(detail.author, Author { id: 1, name: "Ada".into() });
        assert!(detail.comments.is_empty());
    }

    #[test]
    fn test_assemble_detail_with_comments() {
        let rows = vec![
            detail_row(Some((1, 2, "Grace"))),
            detail_row(Some((2, 1, "Ada"))),
        ];
        let detail = assemble_detail(rows).unwrap().unwrap();

        assert_eq!(detail.comments.len(), 2);
        assert_eq!(detail.comments[0].comment.id, 1);
        assert_eq!(detail.comments[0].comment.post_id, 10);
        assert_eq!(detail.comments[0].author.name, "Grace");
        assert_eq!(detail.comments[1].author.id, 1);
    }

    #[test]
    fn test_assemble_detail_empty_and_inconsistent() {
        assert!(assemble_detail(Vec::new()).unwrap().is_none());

        let mut orphan = detail_row(Some((3, 2, "Grace")));
        orphan.comment_author_name = None;
        assert!(matches!(
            assemble_detail(vec![orphan]),
            Err(RepositoryError::Inconsistent(_))
        ));

        let mut other_post = detail_row(None);
        other_post.id = 11;
        assert!(assemble_detail(vec![detail_row(None), other_post]).is_err());
    }

    #[test]
    fn test_distinct_ids_keeps_first_seen_order() {
        assert_eq!(distinct_ids(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(distinct_ids(Vec::new()).is_empty());
    }

    #[test]
    fn test_attach_authors() {
        let authors: HashMap<Id, Author> = [
            (1, Author { id: 1, name: "Ada".into() }),
            (2, Author { id: 2, name: "Grace".into() }),
        ]
        .into_iter()
        .collect();

        let attached = attach_authors(vec![post(5, 2), post(4, 1), post(3, 2)], &authors).unwrap();
        let names: Vec<_> = attached.iter().map(|p| p.author.name.as_str()).collect();
        assert_eq!(names, vec!["Grace", "Ada", "Grace"]);
        assert_eq!(attached[0].post.id, 5);

        let err = attach_authors(vec![post(6, 9)], &authors).unwrap_err();
        assert!(matches!(err, RepositoryError::Inconsistent(_)));
    }

    #[test]
    fn test_join_row_conversion() {
        let row = PostAuthorRow {
            id: 7,
            title: "t".into(),
            content: "c".into(),
            user_id: 3,
            created_at: at(5),
            author_name: "Linus".into(),
        };
        let joined = PostWithAuthor::from(row);
        assert_eq!(joined.post.user_id, joined.author.id);
        assert_eq!(joined.author.name, "Linus");
    }
}
