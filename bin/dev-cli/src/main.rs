//! CLI for signing messages with the address of a key store and checking the signatures.

mod cli;
mod handlers;

use anyhow::{Error, Result};
use bip322_common::logging::{self, LoggerConfig};
use clap::Parser;

use crate::handlers::{classify, derive, sign, verify};

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init(LoggerConfig::with_base_name("bip322-cli"));

    let cli = cli::Cli::parse();
    let config = handlers::load_config(&cli.global)?;

    match cli.command {
        cli::Commands::Classify(args) => classify::handle_classify(args, &config),
        cli::Commands::Derive(args) => derive::handle_derive(args, &config),
        cli::Commands::Sign(args) => sign::handle_sign(args, &config).await,
        cli::Commands::Verify(args) => verify::handle_verify(args, &config),
    }
}
