use anyhow::{Context, Result};
use bip322_orchestrator::SigningConfig;
use bip322_tx_template::verify;

use crate::cli::VerifyArgs;

pub(crate) fn handle_verify(args: VerifyArgs, config: &SigningConfig) -> Result<()> {
    verify(&args.address, &args.message, &args.signature, config.network)
        .context("signature is not valid")?;
    println!("valid");

    Ok(())
}
