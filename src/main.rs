use clap::Parser;
use intent_memo::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli::init(&cli.global);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => cli::chat::run(config).await,
        Command::Ask(args) => cli::ask::run(config, args).await,
        Command::Stats => cli::stats::run(config).await,
    }
}
