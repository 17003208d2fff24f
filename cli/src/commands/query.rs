//! `netrag query` — answer one question and print the response.

use colored::Colorize;

use crate::config::AppConfig;
use crate::orchestrator::QueryFlags;

pub async fn run(
    config: AppConfig,
    query: &str,
    no_recommendations: bool,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let orchestrator = super::build_orchestrator(config).await?;

    let flags = QueryFlags {
        include_recommendations: !no_recommendations,
        limit,
    };

    match orchestrator.execute(query, flags).await {
        Ok(response) => {
            println!("{response}");
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            eprintln!(
                "{} Narrow the query or check upstream connectivity.",
                "Tip:".cyan().bold()
            );
            Err(e.into())
        }
    }
}
