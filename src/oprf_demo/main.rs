use anyhow::{Context, Result};
use bark_oprf::cli_utils::DemoArgs;
use bark_oprf::oprf_demo::run;
use clap::Parser;
use tracing::Level;

fn main() -> Result<()> {
    let args = DemoArgs::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    tracing::info!(?args, "starting");

    run(args).with_context(|| "Failed to run the protocol.")?;

    Ok(())
}
