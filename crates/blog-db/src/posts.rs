//! Post repository
//!
//! Database operations for posts, including the author/comment aggregates
//! loaded under each [`FetchStrategy`].

use std::sync::Arc;

use async_trait::async_trait;
use blog_core::traits::Id;
use blog_models::{validate, NewPost, Post, UpdatePost};
use sqlx::PgPool;

use crate::comments::CommentRepository;
use crate::fetch::{
    assemble_detail, attach_authors, attach_comment_authors, distinct_ids, Author,
    CommentWithAuthor, FetchStrategy, PostAuthorRow, PostDetail, PostDetailRow, PostWithAuthor,
};
use crate::repository::{
    Pagination, PaginatedResult, Repository, RepositoryError, RepositoryResult,
};
use crate::stats::QueryStats;
use crate::users::UserRepository;

const POST_COLUMNS: &str = "id, title, content, user_id, created_at";

/// Newest posts first (`idx_post_created_at`)
pub(crate) const SELECT_RECENT: &str = "SELECT id, title, content, user_id, created_at \
     FROM posts ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2";

/// One user's posts, newest first (`idx_post_user_created`)
pub(crate) const SELECT_BY_USER: &str = "SELECT id, title, content, user_id, created_at \
     FROM posts WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3";

const SELECT_RECENT_WITH_AUTHOR: &str =
    "SELECT p.id, p.title, p.content, p.user_id, p.created_at, u.name AS author_name \
     FROM posts p JOIN users u ON u.id = p.user_id \
     ORDER BY p.created_at DESC, p.id DESC LIMIT $1 OFFSET $2";

const SELECT_BY_USER_WITH_AUTHOR: &str =
    "SELECT p.id, p.title, p.content, p.user_id, p.created_at, u.name AS author_name \
     FROM posts p JOIN users u ON u.id = p.user_id \
     WHERE p.user_id = $1 \
     ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3";

const SELECT_ONE_WITH_AUTHOR: &str =
    "SELECT p.id, p.title, p.content, p.user_id, p.created_at, u.name AS author_name \
     FROM posts p JOIN users u ON u.id = p.user_id WHERE p.id = $1";

/// Post, author, comments and comment authors in one statement
pub(crate) const SELECT_DETAIL_JOIN: &str =
    "SELECT p.id, p.title, p.content, p.user_id, p.created_at, u.name AS author_name, \
            c.id AS comment_id, c.content AS comment_content, c.user_id AS comment_user_id, \
            c.created_at AS comment_created_at, cu.name AS comment_author_name \
     FROM posts p \
     JOIN users u ON u.id = p.user_id \
     LEFT JOIN comments c ON c.post_id = p.id \
     LEFT JOIN users cu ON cu.id = c.user_id \
     WHERE p.id = $1 \
     ORDER BY c.created_at ASC NULLS FIRST, c.id ASC";

/// Escape `%`, `_` and `\` for use inside a LIKE pattern
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Post repository implementation
#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
    stats: Arc<QueryStats>,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_stats(pool, QueryStats::new())
    }

    pub fn with_stats(pool: PgPool, stats: Arc<QueryStats>) -> Self {
        Self { pool, stats }
    }

    pub fn stats(&self) -> &Arc<QueryStats> {
        &self.stats
    }

    /// Statements executed so far through this repository and its helpers
    pub fn statements(&self) -> u64 {
        self.stats.statements()
    }

    fn users(&self) -> UserRepository {
        UserRepository::with_stats(self.pool.clone(), Arc::clone(&self.stats))
    }

    fn comments(&self) -> CommentRepository {
        CommentRepository::with_stats(self.pool.clone(), Arc::clone(&self.stats))
    }

    async fn fetch_recent(&self, pagination: Pagination) -> RepositoryResult<Vec<Post>> {
        self.stats.record("posts.find_recent");
        let rows = sqlx::query_as::<_, Post>(SELECT_RECENT)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn fetch_by_user(&self, user_id: Id, pagination: Pagination) -> RepositoryResult<Vec<Post>> {
        self.stats.record("posts.find_by_user");
        let rows = sqlx::query_as::<_, Post>(SELECT_BY_USER)
            .bind(user_id)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Newest posts first
    pub async fn find_page(&self, pagination: Pagination) -> RepositoryResult<PaginatedResult<Post>> {
        let items = self.fetch_recent(pagination).await?;
        let total = self.count().await?;
        Ok(PaginatedResult::new(items, total, pagination))
    }

    /// One user's posts, newest first
    pub async fn find_page_by_user(
        &self,
        user_id: Id,
        pagination: Pagination,
    ) -> RepositoryResult<PaginatedResult<Post>> {
        let items = self.fetch_by_user(user_id, pagination).await?;
        let total = self.count_by_user(user_id).await?;
        Ok(PaginatedResult::new(items, total, pagination))
    }

    pub async fn count_by_user(&self, user_id: Id) -> RepositoryResult<i64> {
        self.stats.record("posts.count_by_user");
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Case-insensitive substring match on the title, newest first
    pub async fn find_by_title_containing(
        &self,
        fragment: &str,
        limit: i64,
    ) -> RepositoryResult<Vec<Post>> {
        self.stats.record("posts.find_by_title_containing");
        let pattern = format!("%{}%", escape_like(fragment));
        let rows = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE title ILIKE $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2",
            POST_COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Page of newest posts with their authors
    pub async fn find_page_with_author(
        &self,
        pagination: Pagination,
        strategy: FetchStrategy,
    ) -> RepositoryResult<PaginatedResult<PostWithAuthor>> {
        let items: Vec<PostWithAuthor> = match strategy {
            FetchStrategy::Join => {
                self.stats.record("posts.find_recent_with_author");
                sqlx::query_as::<_, PostAuthorRow>(SELECT_RECENT_WITH_AUTHOR)
                    .bind(pagination.limit)
                    .bind(pagination.offset)
                    .fetch_all(&self.pool)
                    .await?
                    .into_iter()
                    .map(PostWithAuthor::from)
                    .collect()
            }
            FetchStrategy::Batch => {
                let posts = self.fetch_recent(pagination).await?;
                self.batch_authors(posts).await?
            }
            FetchStrategy::Lazy => {
                let posts = self.fetch_recent(pagination).await?;
                self.lazy_authors(posts).await?
            }
        };

        let total = self.count().await?;
        Ok(PaginatedResult::new(items, total, pagination))
    }

    /// Page of one user's posts with the author attached
    pub async fn find_page_by_user_with_author(
        &self,
        user_id: Id,
        pagination: Pagination,
        strategy: FetchStrategy,
    ) -> RepositoryResult<PaginatedResult<PostWithAuthor>> {
        let items: Vec<PostWithAuthor> = match strategy {
            FetchStrategy::Join => {
                self.stats.record("posts.find_by_user_with_author");
                sqlx::query_as::<_, PostAuthorRow>(SELECT_BY_USER_WITH_AUTHOR)
                    .bind(user_id)
                    .bind(pagination.limit)
                    .bind(pagination.offset)
                    .fetch_all(&self.pool)
                    .await?
                    .into_iter()
                    .map(PostWithAuthor::from)
                    .collect()
            }
            FetchStrategy::Batch => {
                let posts = self.fetch_by_user(user_id, pagination).await?;
                self.batch_authors(posts).await?
            }
            FetchStrategy::Lazy => {
                let posts = self.fetch_by_user(user_id, pagination).await?;
                self.lazy_authors(posts).await?
            }
        };

        let total = self.count_by_user(user_id).await?;
        Ok(PaginatedResult::new(items, total, pagination))
    }

    /// A post with its author and comments, `None` when it does not exist
    pub async fn find_detail(
        &self,
        id: Id,
        strategy: FetchStrategy,
    ) -> RepositoryResult<Option<PostDetail>> {
        match strategy {
            FetchStrategy::Join => {
                self.stats.record("posts.find_detail_join");
                let rows = sqlx::query_as::<_, PostDetailRow>(SELECT_DETAIL_JOIN)
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?;
                assemble_detail(rows)
            }
            FetchStrategy::Batch => {
                self.stats.record("posts.find_with_author");
                let Some(row) = sqlx::query_as::<_, PostAuthorRow>(SELECT_ONE_WITH_AUTHOR)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                else {
                    return Ok(None);
                };
                let PostWithAuthor { post, author } = PostWithAuthor::from(row);

                let comments = self.comments().find_by_post(post.id).await?;
                let author_ids = distinct_ids(comments.iter().map(|c| c.user_id));
                let authors = self.users().find_authors(&author_ids).await?;
                let comments = attach_comment_authors(comments, &authors)?;

                Ok(Some(PostDetail {
                    post,
                    author,
                    comments,
                }))
            }
            FetchStrategy::Lazy => {
                let Some(post) = self.find_by_id(id).await? else {
                    return Ok(None);
                };
                let users = self.users();
                let author = self.require_author(&users, post.user_id).await?;

                let mut comments = Vec::new();
                for comment in self.comments().find_by_post(post.id).await? {
                    let author = self.require_author(&users, comment.user_id).await?;
                    comments.push(CommentWithAuthor { comment, author });
                }

                Ok(Some(PostDetail {
                    post,
                    author,
                    comments,
                }))
            }
        }
    }

    async fn batch_authors(&self, posts: Vec<Post>) -> RepositoryResult<Vec<PostWithAuthor>> {
        let ids = distinct_ids(posts.iter().map(|p| p.user_id));
        let authors = self.users().find_authors(&ids).await?;
        attach_authors(posts, &authors)
    }

    async fn lazy_authors(&self, posts: Vec<Post>) -> RepositoryResult<Vec<PostWithAuthor>> {
        let users = self.users();
        let mut items = Vec::with_capacity(posts.len());
        for post in posts {
            let author = self.require_author(&users, post.user_id).await?;
            items.push(PostWithAuthor { post, author });
        }
        Ok(items)
    }

    async fn require_author(
        &self,
        users: &UserRepository,
        user_id: Id,
    ) -> RepositoryResult<Author> {
        users.find_author(user_id).await?.ok_or_else(|| {
            RepositoryError::Inconsistent(format!("author {} does not exist", user_id))
        })
    }
}

#[async_trait]
impl Repository<Post, NewPost, UpdatePost> for PostRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Post>> {
        self.stats.record("posts.find_by_id");
        let row = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Post>> {
        self.fetch_recent(Pagination::new(limit, offset)).await
    }

    async fn count(&self) -> RepositoryResult<i64> {
        self.stats.record("posts.count");
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: NewPost) -> RepositoryResult<Post> {
        validate(&dto)?;

        self.stats.record("posts.create");
        let row = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (title, content, user_id, created_at) \
             VALUES ($1, $2, $3, NOW()) \
             RETURNING {}",
            POST_COLUMNS
        ))
        .bind(&dto.title)
        .bind(&dto.content)
        .bind(dto.user_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(post_id = row.id, user_id = row.user_id, "created post");
        Ok(row)
    }

    async fn update(&self, id: Id, dto: UpdatePost) -> RepositoryResult<Post> {
        validate(&dto)?;

        self.stats.record("posts.update");
        let row = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET \
                title = COALESCE($1, title), \
                content = COALESCE($2, content) \
             WHERE id = $3 \
             RETURNING {}",
            POST_COLUMNS
        ))
        .bind(&dto.title)
        .bind(&dto.content)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Post", id))?;

        Ok(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<()> {
        self.stats.record("posts.delete");
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Post", id));
        }

        Ok(())
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        self.stats.record("posts.exists");
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_list_queries_share_ordering() {
        for sql in [
            SELECT_RECENT,
            SELECT_BY_USER,
            SELECT_RECENT_WITH_AUTHOR,
            SELECT_BY_USER_WITH_AUTHOR,
        ] {
            assert!(sql.contains("created_at DESC"), "{}", sql);
            assert!(sql.contains("id DESC"), "{}", sql);
        }
        assert!(SELECT_DETAIL_JOIN.contains("LEFT JOIN comments"));
    }
}
