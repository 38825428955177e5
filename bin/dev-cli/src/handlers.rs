pub(crate) mod classify;
pub(crate) mod derive;
pub(crate) mod sign;
pub(crate) mod verify;

use std::fs;

use anyhow::{Context, Result};
use bip322_orchestrator::SigningConfig;
use tracing::debug;

use crate::cli::GlobalArgs;

/// Reads the config file if one was given and applies the command line overrides.
pub(crate) fn load_config(args: &GlobalArgs) -> Result<SigningConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;

            SigningConfig::from_toml(&contents)?
        }
        None => SigningConfig::default(),
    };

    if let Some(network) = args.network {
        config.network = network;
    }
    debug!(?config, "loaded config");

    Ok(config)
}
