//! Side-by-side statement counts of the fetch strategies

use anyhow::{bail, Context, Result};
use blog_db::{Database, FetchStrategy, Pagination, PostRepository, Repository};
use clap::Args;
use std::time::Instant;

#[derive(Args, Debug, Clone)]
pub struct FetchDemoArgs {
    /// Posts per page for the list comparison
    #[arg(long, default_value_t = 20)]
    pub page_size: i64,

    /// Post for the detail comparison (default: the newest post)
    #[arg(long)]
    pub post_id: Option<i64>,
}

#[derive(Debug)]
struct Measurement {
    strategy: FetchStrategy,
    statements: u64,
    rows: usize,
    millis: u128,
}

fn print_table(title: &str, rows: &[Measurement]) {
    println!("{}", title);
    println!("  {:<8} {:>10} {:>8} {:>8}", "fetch", "statements", "rows", "ms");
    for m in rows {
        println!(
            "  {:<8} {:>10} {:>8} {:>8}",
            m.strategy.as_str(),
            m.statements,
            m.rows,
            m.millis
        );
    }
}

pub async fn run(db: &Database, args: &FetchDemoArgs) -> Result<()> {
    let page = Pagination::new(args.page_size.clamp(1, 100), 0);

    let mut list = Vec::new();
    let mut baseline = None;
    for strategy in FetchStrategy::ALL {
        let repo = PostRepository::new(db.pool().clone());
        let started = Instant::now();
        let result = repo.find_page_with_author(page, strategy).await?;
        let millis = started.elapsed().as_millis();

        match &baseline {
            None => baseline = Some(result.items.clone()),
            Some(expected) if *expected != result.items => {
                bail!("{} returned different posts than join", strategy)
            }
            Some(_) => {}
        }

        list.push(Measurement {
            strategy,
            // COUNT(*) for the page total is not part of the fetch
            statements: repo.statements() - 1,
            rows: result.items.len(),
            millis,
        });
    }
    print_table("post list with authors", &list);

    let post_id = match args.post_id {
        Some(id) => id,
        None => {
            let newest = PostRepository::new(db.pool().clone()).find_all(1, 0).await?;
            match newest.first() {
                Some(post) => post.id,
                None => {
                    println!("\nno posts yet; run `blogctl seed` first");
                    return Ok(());
                }
            }
        }
    };

    let mut detail = Vec::new();
    let mut baseline = None;
    for strategy in FetchStrategy::ALL {
        let repo = PostRepository::new(db.pool().clone());
        let started = Instant::now();
        let found = repo
            .find_detail(post_id, strategy)
            .await?
            .with_context(|| format!("post {} does not exist", post_id))?;
        let millis = started.elapsed().as_millis();

        match &baseline {
            None => baseline = Some(found.clone()),
            Some(expected) if *expected != found => {
                bail!("{} returned a different post detail than join", strategy)
            }
            Some(_) => {}
        }

        detail.push(Measurement {
            strategy,
            statements: repo.statements(),
            rows: found.comments.len(),
            millis,
        });
    }
    println!();
    print_table(&format!("post {} with comments", post_id), &detail);

    Ok(())
}
