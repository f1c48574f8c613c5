mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli.run().await {
        eprintln!("Error: {err}");
        if let Some(suggestion) = err.recovery_suggestion() {
            eprintln!("Hint: {suggestion}");
        }
        std::process::exit(1);
    }
}
