use anyhow::Result;
use bip322_key_deriv::KeyDeriver;
use bip322_orchestrator::SigningConfig;
use tracing::info;

use crate::cli::DeriveArgs;

pub(crate) fn handle_derive(args: DeriveArgs, config: &SigningConfig) -> Result<()> {
    let key = KeyDeriver::new(config.network).derive_from_str(
        &args.xpub,
        args.index,
        args.address_type,
    )?;
    info!(public_key = %key.public_key(), index = args.index, "derived key");

    println!("{}", key.address());

    Ok(())
}
