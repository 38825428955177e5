use anyhow::Result;
use bip322_orchestrator::SigningConfig;
use bip322_primitives::address::classify;

use crate::cli::ClassifyArgs;

pub(crate) fn handle_classify(args: ClassifyArgs, config: &SigningConfig) -> Result<()> {
    let address_type = classify(&args.address, config.network)?;
    println!("{address_type}");

    Ok(())
}
