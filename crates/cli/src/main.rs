use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod report;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = commands::Cli::parse();

    let default_filter = if cli.verbose {
        "passcan=info,passcan_ocr=info"
    } else {
        "passcan=warn,passcan_ocr=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    commands::run(cli).await
}
