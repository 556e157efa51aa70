//! GWL CLI - Command line tool for processing groundwater diver logs.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "gwl-cli",
    version,
    about = "Groundwater diver data toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: gwl_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    gwl_cmd::run(cli.command).await
}
