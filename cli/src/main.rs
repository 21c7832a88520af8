use anyhow::Context;
use clap::Parser;
use kvfts_core::Host;
use kvfts_search::{SearchConfig, create_module};
use std::io::IsTerminal;
use std::path::PathBuf;

mod logging;
mod shell;

/// Interactive shell over a key-value host with full-text indexes.
#[derive(Parser)]
#[command(name = "kvfts", version, about)]
struct Cli {
    /// Path to the TOML config. Defaults apply when the file is missing.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging();

    let config = match &cli.config {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SearchConfig::default(),
    };

    let module = create_module(config).context("failed to build search module")?;
    let mut host = Host::new();
    host.load_module(module, &[])
        .context("failed to load search module")?;

    let stdin = std::io::stdin();
    let prompt = stdin.is_terminal();
    let result = shell::run(&mut host, stdin.lock(), std::io::stdout().lock(), prompt);

    host.shutdown();
    result
}
