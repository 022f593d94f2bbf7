//! Query plans for the canonical finder queries

use std::fmt;
use std::str::FromStr;

use blog_core::traits::Id;
use sqlx::{PgConnection, PgPool};

use crate::posts::{SELECT_BY_USER, SELECT_DETAIL_JOIN, SELECT_RECENT};
use crate::repository::RepositoryResult;
use crate::users::SELECT_BY_EMAIL;

/// Finder query to explain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTarget {
    RecentPosts,
    PostsByUser,
    UserByEmail,
    PostDetail,
}

impl PlanTarget {
    pub const ALL: [PlanTarget; 4] = [
        Self::RecentPosts,
        Self::PostsByUser,
        Self::UserByEmail,
        Self::PostDetail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecentPosts => "recent-posts",
            Self::PostsByUser => "posts-by-user",
            Self::UserByEmail => "user-by-email",
            Self::PostDetail => "post-detail",
        }
    }

    /// Index the query is shaped for
    pub fn expected_index(&self) -> &'static str {
        match self {
            Self::RecentPosts => "idx_post_created_at",
            Self::PostsByUser => "idx_post_user_created",
            Self::UserByEmail => "idx_user_email",
            Self::PostDetail => "idx_comment_post_id",
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Self::RecentPosts => SELECT_RECENT,
            Self::PostsByUser => SELECT_BY_USER,
            Self::UserByEmail => SELECT_BY_EMAIL,
            Self::PostDetail => SELECT_DETAIL_JOIN,
        }
    }
}

impl fmt::Display for PlanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown plan target '{0}' (expected recent-posts, posts-by-user, user-by-email or post-detail)")]
pub struct UnknownPlanTarget(pub String);

impl FromStr for PlanTarget {
    type Err = UnknownPlanTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|target| target.as_str() == s.trim())
            .ok_or_else(|| UnknownPlanTarget(s.to_string()))
    }
}

/// Options and sample parameters for [`explain`]
#[derive(Debug, Clone)]
pub struct ExplainOptions {
    /// Run `EXPLAIN ANALYZE` (executes the query)
    pub analyze: bool,
    /// `SET enable_seqscan = off` for the session, so small tables still show index plans
    pub disable_seqscan: bool,
    pub user_id: Id,
    pub post_id: Id,
    pub email: String,
    pub limit: i64,
}

impl Default for ExplainOptions {
    fn default() -> Self {
        Self {
            analyze: false,
            disable_seqscan: false,
            user_id: 1,
            post_id: 1,
            email: "someone@example.com".to_string(),
            limit: 20,
        }
    }
}

/// Plan lines as returned by PostgreSQL
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub target: PlanTarget,
    pub lines: Vec<String>,
}

impl QueryPlan {
    pub fn uses_index(&self, index: &str) -> bool {
        self.lines.iter().any(|line| line.contains(index))
    }

    pub fn uses_expected_index(&self) -> bool {
        self.uses_index(self.target.expected_index())
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

fn explain_sql(target: PlanTarget, analyze: bool) -> String {
    let prefix = if analyze { "EXPLAIN ANALYZE " } else { "EXPLAIN " };
    format!("{}{}", prefix, target.sql())
}

/// Run `EXPLAIN` for a finder query with sample parameters
pub async fn explain(
    pool: &PgPool,
    target: PlanTarget,
    options: &ExplainOptions,
) -> RepositoryResult<QueryPlan> {
    // SET LOCAL is undone by the rollback
    let mut tx = pool.begin().await?;

    if options.disable_seqscan {
        sqlx::query("SET LOCAL enable_seqscan = off")
            .execute(&mut *tx)
            .await?;
    }

    let result = run_explain(&mut *tx, target, options).await;

    if let Err(e) = tx.rollback().await {
        tracing::warn!(error = %e, "failed to roll back explain transaction");
    }

    let lines = result?;
    tracing::debug!(plan = %target, lines = lines.len(), "explained query");
    Ok(QueryPlan { target, lines })
}

async fn run_explain(
    conn: &mut PgConnection,
    target: PlanTarget,
    options: &ExplainOptions,
) -> RepositoryResult<Vec<String>> {
    let sql = explain_sql(target, options.analyze);
    let query = sqlx::query_scalar::<_, String>(&sql);
    let query = match target {
        PlanTarget::RecentPosts => query.bind(options.limit).bind(0_i64),
        PlanTarget::PostsByUser => query.bind(options.user_id).bind(options.limit).bind(0_i64),
        PlanTarget::UserByEmail => query.bind(options.email.clone()),
        PlanTarget::PostDetail => query.bind(options.post_id),
    };

    Ok(query.fetch_all(conn).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        for target in PlanTarget::ALL {
            assert_eq!(target.as_str().parse::<PlanTarget>(), Ok(target));
        }
        assert!("all-posts".parse::<PlanTarget>().is_err());
    }

    #[test]
    fn test_expected_indexes_are_declared() {
        let declared: Vec<_> = blog_models::declared_indexes().map(|i| i.name).collect();
        for target in PlanTarget::ALL {
            assert!(declared.contains(&target.expected_index()));
        }
    }

    #[test]
    fn test_explain_sql() {
        assert!(explain_sql(PlanTarget::UserByEmail, false).starts_with("EXPLAIN SELECT"));
        assert!(explain_sql(PlanTarget::PostsByUser, true).starts_with("EXPLAIN ANALYZE SELECT"));
    }

    #[test]
    fn test_plan_mentions_index() {
        let plan = QueryPlan {
            target: PlanTarget::PostsByUser,
            lines: vec![
                "Limit  (cost=0.15..8.17 rows=1 width=80)".into(),
                "  ->  Index Scan Backward using idx_post_user_created on posts".into(),
            ],
        };
        assert!(plan.uses_expected_index());
        assert!(!plan.uses_index("idx_post_created_at"));
        assert!(plan.to_string().ends_with("on posts\n"));
    }
}
