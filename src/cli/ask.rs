//! Ask command - answers a single query

use std::io::Write;

use clap::Args;
use futures::StreamExt;

use crate::config::AppConfig;

/// Arguments for the ask command
#[derive(Args, Clone, Debug)]
pub struct AskArgs {
    /// Query text; words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    pub words: Vec<String>,
}

impl AskArgs {
    pub fn query(&self) -> String {
        self.words.join(" ")
    }
}

/// Answer one query, then wait for memoization and flush
pub async fn run(config: AppConfig, args: AskArgs) -> anyhow::Result<()> {
    let orchestrator = crate::create_orchestrator(&config).await?;

    let mut segments = orchestrator.handle(args.query());
    let mut stdout = std::io::stdout();
    while let Some(segment) = segments.next().await {
        writeln!(stdout, "{}", segment)?;
    }
    stdout.flush()?;

    orchestrator
        .shutdown(config.refresh.shutdown_timeout())
        .await?;
    Ok(())
}
