//! Post HAL Representer

use blog_core::traits::Id;
use blog_db::{Author, CommentWithAuthor, PostDetail, PostWithAuthor};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::HalLink;
use crate::extractors::ApiConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRepresentation {
    pub id: Id,
    pub name: String,
}

impl From<Author> for AuthorRepresentation {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            name: author.name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostLinks {
    #[serde(rename = "self")]
    pub self_link: HalLink,
    #[serde(rename = "authorPosts")]
    pub author_posts: HalLink,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRepresentation {
    #[serde(rename = "_type")]
    pub type_name: &'static str,
    pub id: Id,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRepresentation,
    #[serde(rename = "_links")]
    pub links: PostLinks,
}

impl PostRepresentation {
    pub fn represent(item: PostWithAuthor, config: &ApiConfig) -> Self {
        let PostWithAuthor { post, author } = item;
        let links = PostLinks {
            self_link: HalLink::with_title(
                config.href(&format!("/api/posts/{}", post.id)),
                post.title.clone(),
            ),
            author_posts: HalLink::with_title(
                config.href(&format!("/api/posts/users/{}", author.id)),
                author.name.clone(),
            ),
        };

        Self {
            type_name: "Post",
            id: post.id,
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            author: author.into(),
            links,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRepresentation {
    #[serde(rename = "_type")]
    pub type_name: &'static str,
    pub id: Id,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRepresentation,
}

impl From<CommentWithAuthor> for CommentRepresentation {
    fn from(item: CommentWithAuthor) -> Self {
        Self {
            type_name: "Comment",
            id: item.comment.id,
            content: item.comment.content,
            created_at: item.comment.created_at,
            author: item.author.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetailEmbedded {
    pub comments: Vec<CommentRepresentation>,
}

/// A post with its comments embedded, oldest comment first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailRepresentation {
    #[serde(flatten)]
    pub post: PostRepresentation,
    pub comment_count: usize,
    #[serde(rename = "_embedded")]
    pub embedded: PostDetailEmbedded,
}

impl PostDetailRepresentation {
    pub fn represent(detail: PostDetail, config: &ApiConfig) -> Self {
        let PostDetail {
            post,
            author,
            comments,
        } = detail;
        let comments: Vec<CommentRepresentation> =
            comments.into_iter().map(CommentRepresentation::from).collect();

        Self {
            post: PostRepresentation::represent(PostWithAuthor { post, author }, config),
            comment_count: comments.len(),
            embedded: PostDetailEmbedded { comments },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_models::{Comment, Post};
    use chrono::TimeZone;

    fn sample_detail() -> PostDetail {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        PostDetail {
            post: Post {
                id: 3,
                title: "Composite indexes".into(),
                content: "Column order matters".into(),
                user_id: 1,
                created_at: at,
            },
            author: Author {
                id: 1,
                name: "Ada".into(),
            },
            comments: vec![CommentWithAuthor {
                comment: Comment {
                    id: 9,
                    content: "Agreed".into(),
                    post_id: 3,
                    user_id: 2,
                    created_at: at,
                },
                author: Author {
                    id: 2,
                    name: "Grace".into(),
                },
            }],
        }
    }

    #[test]
    fn test_detail_representation() {
        let config = ApiConfig {
            base_url: "http://localhost:8080".into(),
            ..Default::default()
        };
        let json =
            serde_json::to_value(PostDetailRepresentation::represent(sample_detail(), &config))
                .unwrap();

        assert_eq!(json["_type"], "Post");
        assert_eq!(json["id"], 3);
        assert_eq!(json["author"]["name"], "Ada");
        assert_eq!(json["commentCount"], 1);
        assert_eq!(json["_embedded"]["comments"][0]["author"]["name"], "Grace");
        assert_eq!(json["_links"]["self"]["href"], "http://localhost:8080/api/posts/3");
        assert_eq!(
            json["_links"]["authorPosts"]["href"],
            "http://localhost:8080/api/posts/users/1"
        );
        assert!(json.get("userId").is_none());
        assert!(json["author"].get("email").is_none());
    }
}
