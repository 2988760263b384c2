use anyhow::Result;
use clap::Parser;
use headcount_bot::daemon::{init_tracing, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    headcount_bot::daemon::run(cli).await
}
