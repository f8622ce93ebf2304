//! CLI entry point for grid erase, clip and conversion

use clap::Parser;
use gridmask::io::cli::{Cli, GridRunner};

fn main() -> gridmask::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    GridRunner::new(cli).run()
}
