//! Generated sample data

use std::fmt;

use anyhow::{Context, Result};
use blog_db::{CommentRepository, Database, PostRepository, Repository, UserRepository};
use blog_models::{NewComment, NewPost, NewUser, User};
use clap::Args;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Paragraphs, Sentence};
use fake::faker::name::en::Name;
use fake::Fake;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    #[arg(long, default_value_t = 10)]
    pub users: usize,

    #[arg(long, default_value_t = 5)]
    pub posts_per_user: usize,

    #[arg(long, default_value_t = 3)]
    pub comments_per_post: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub posts: usize,
    pub comments: usize,
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seeded {} users, {} posts, {} comments",
            self.users, self.posts, self.comments
        )
    }
}

/// Author of the `nth` comment on the post of `owner`: never the owner
/// while there is anyone else
pub fn commenter(owner: usize, nth: usize, user_count: usize) -> usize {
    if user_count <= 1 {
        return owner;
    }
    (owner + 1 + nth % (user_count - 1)) % user_count
}

fn fake_user(index: usize) -> NewUser {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    // prefix keeps repeated runs clear of idx_user_email
    let email = format!("seed{}-{}-{}", index, std::process::id(), email);
    NewUser::new(name, email)
}

fn fake_post(user_id: i64) -> NewPost {
    let title: String = Sentence(3..8).fake();
    let paragraphs: Vec<String> = Paragraphs(2..4).fake();
    NewPost::new(user_id, title.trim_end_matches('.'), paragraphs.join("\n\n"))
}

fn fake_comment(post_id: i64, user_id: i64) -> NewComment {
    let content: String = Sentence(4..16).fake();
    NewComment::new(post_id, user_id, content)
}

pub async fn run(db: &Database, args: &SeedArgs) -> Result<SeedReport> {
    let pool = db.pool().clone();
    let users_repo = UserRepository::new(pool.clone());
    let posts_repo = PostRepository::new(pool.clone());
    let comments_repo = CommentRepository::new(pool);

    let mut report = SeedReport::default();
    let mut users: Vec<User> = Vec::with_capacity(args.users);
    for i in 0..args.users {
        let user = users_repo
            .create(fake_user(i))
            .await
            .with_context(|| format!("Failed to create user {}", i))?;
        users.push(user);
        report.users += 1;
    }
    info!(count = users.len(), "created users");

    for (owner, user) in users.iter().enumerate() {
        for _ in 0..args.posts_per_user {
            let post = posts_repo.create(fake_post(user.id)).await?;
            report.posts += 1;

            for nth in 0..args.comments_per_post {
                let author = &users[commenter(owner, nth, users.len())];
                comments_repo.create(fake_comment(post.id, author.id)).await?;
                report.comments += 1;
            }
        }
    }

    info!(posts = report.posts, comments = report.comments, "created posts and comments");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_models::validate;

    #[test]
    fn test_commenter_skips_owner() {
        for owner in 0..4 {
            for nth in 0..10 {
                let c = commenter(owner, nth, 4);
                assert_ne!(c, owner);
                assert!(c < 4);
            }
        }
        assert_eq!(commenter(0, 3, 1), 0);
    }

    #[test]
    fn test_generated_records_are_valid() {
        for i in 0..20 {
            assert!(validate(&fake_user(i)).is_ok());
            assert!(validate(&fake_post(1)).is_ok());
            assert!(validate(&fake_comment(1, 2)).is_ok());
        }
    }

    #[test]
    fn test_report_display() {
        let report = SeedReport {
            users: 2,
            posts: 4,
            comments: 8,
        };
        assert_eq!(report.to_string(), "seeded 2 users, 4 posts, 8 comments");
    }
}
