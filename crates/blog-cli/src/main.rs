//! blogctl - schema, seed data and query-shape tooling for Blog RS
//!
//! - `migrate`: apply the embedded migrations and check declared indexes
//! - `seed`: fill the database with generated users, posts and comments
//! - `explain`: print the PostgreSQL plan of a finder query
//! - `fetch-demo`: compare statement counts of the join, batch and lazy strategies

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use blog_core::config::AppConfig;
use blog_db::{Database, DatabaseConfig, ExplainOptions, PlanTarget};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod demo;
mod seed;

#[derive(Parser, Debug)]
#[command(name = "blogctl", author, version, about = "Blog RS database tooling")]
struct Cli {
    /// Database URL (overrides configuration and DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Increase log verbosity (-v logs every SQL statement)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply embedded migrations
    Migrate,
    /// Insert generated users, posts and comments
    Seed(seed::SeedArgs),
    /// Show the query plan of a finder query
    Explain(ExplainArgs),
    /// Load the same data with every fetch strategy and report statement counts
    FetchDemo(demo::FetchDemoArgs),
}

#[derive(Args, Debug)]
struct ExplainArgs {
    /// recent-posts, posts-by-user, user-by-email or post-detail
    target: PlanTarget,

    /// Run EXPLAIN ANALYZE (executes the query)
    #[arg(long)]
    analyze: bool,

    /// Disable sequential scans so small tables still show index plans
    #[arg(long)]
    no_seqscan: bool,

    #[arg(long, default_value_t = 1)]
    user_id: i64,

    #[arg(long, default_value_t = 1)]
    post_id: i64,

    #[arg(long, default_value = "someone@example.com")]
    email: String,
}

fn init_tracing(verbose: u8) -> Result<()> {
    let default = match verbose {
        0 => "info,sqlx=warn",
        1 => "info,blog_db::sql=debug,sqlx=warn",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 0)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
}

async fn connect(database_url: Option<String>) -> Result<Database> {
    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(url) = database_url {
        config.database.url = url;
    }

    Database::connect(&DatabaseConfig::from(&config.database))
        .await
        .context("Failed to connect to database")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let db = connect(cli.database_url).await?;

    match cli.command {
        Commands::Migrate => run_migrate(&db).await?,
        Commands::Seed(args) => {
            db.migrate().await.context("Failed to apply migrations")?;
            let report = seed::run(&db, &args).await?;
            println!("{}", report);
        }
        Commands::Explain(args) => run_explain(&db, args).await?,
        Commands::FetchDemo(args) => demo::run(&db, &args).await?,
    }

    db.close().await;
    Ok(())
}

async fn run_migrate(db: &Database) -> Result<()> {
    db.migrate().await.context("Failed to apply migrations")?;

    let missing = db.verify_schema().await?;
    if missing.is_empty() {
        info!("schema is up to date");
        Ok(())
    } else {
        anyhow::bail!("declared indexes missing after migration: {}", missing.join(", "))
    }
}

async fn run_explain(db: &Database, args: ExplainArgs) -> Result<()> {
    let options = ExplainOptions {
        analyze: args.analyze,
        disable_seqscan: args.no_seqscan,
        user_id: args.user_id,
        post_id: args.post_id,
        email: args.email,
        ..Default::default()
    };

    let plan = blog_db::explain(db.pool(), args.target, &options).await?;
    print!("{}", plan);

    let index = args.target.expected_index();
    if plan.uses_index(index) {
        println!("\nuses {}", index);
    } else {
        println!("\ndoes not use {} (try --no-seqscan on small tables)", index);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_explain() {
        let cli = Cli::parse_from(["blogctl", "explain", "posts-by-user", "--no-seqscan", "--user-id", "7"]);
        match cli.command {
            Commands::Explain(args) => {
                assert_eq!(args.target, PlanTarget::PostsByUser);
                assert!(args.no_seqscan);
                assert_eq!(args.user_id, 7);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["blogctl", "explain", "all-posts"]).is_err());
    }

    #[test]
    fn test_parse_seed_defaults() {
        let cli = Cli::parse_from(["blogctl", "-v", "seed", "--users", "3"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Seed(args) => {
                assert_eq!(args.users, 3);
                assert_eq!(args.posts_per_user, 5);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
