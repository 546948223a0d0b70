//! Binary crate for the `cityweather` web app.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Serving the HTML pages over HTTP
//! - Rendering cities and forecasts as markup

use clap::Parser;

mod cli;
mod logging;
mod render;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    logging::init_logging(&cmd.log_level);
    cmd.run().await
}
