//! Chat command - interactive session on stdin/stdout

use std::io::Write;

use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::info;

use crate::config::AppConfig;

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye"];

/// Run the interactive loop until EOF, an exit word or Ctrl+C
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let orchestrator = crate::create_orchestrator(&config).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    writeln!(
        stdout,
        "{} is listening. Type \"help\" for commands, \"exit\" to leave.",
        config.assistant.name
    )?;

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, ending session");
                None
            }
        };

        let Some(line) = line else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&query.to_lowercase().as_str()) {
            break;
        }

        let mut segments = orchestrator.handle(query);
        while let Some(segment) = segments.next().await {
            writeln!(stdout, "{}", segment)?;
        }
    }

    writeln!(stdout)?;
    orchestrator
        .shutdown(config.refresh.shutdown_timeout())
        .await?;
    Ok(())
}
