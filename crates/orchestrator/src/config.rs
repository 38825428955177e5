//! Configuration of a signing session.

use std::time::Duration;

use bip322_primitives::{constants::MAX_CHILD_INDEX, types::SearchSpace};
use bip322_signing_sm::signing::config::SigningSMCfg;
use bitcoin::Network;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{OrchestratorError, OrchestratorResult};

/// Default time a device has to answer a liveness probe.
pub const DEFAULT_LIVENESS_TIMEOUT_MS: u64 = 3_000;

/// Default number of account keys a single search may export from the device.
pub const DEFAULT_MAX_ACCOUNT_EXPORTS: u64 = 1_000;

/// The configuration values that dictate the behavior of a signing session.
///
/// Every field is optional in the TOML representation and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// The network addresses are expected to belong to.
    ///
    /// Also selects the coin type of the derivation paths: `0'` on mainnet, `1'` everywhere
    /// else.
    pub network: Network,

    /// The bounds every signing attempt starts searching with.
    pub initial_search_space: SearchSpace,

    /// The time, in milliseconds, a device has to answer a request that needs no user
    /// interaction: the handshake, liveness probes and key exports.
    pub liveness_timeout_ms: u64,

    /// The most account keys one search may export.
    ///
    /// A search whose account bound needs more exports than this fails before touching the
    /// device.
    pub max_account_exports: u64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            network: Network::Bitcoin,
            initial_search_space: SearchSpace::default(),
            liveness_timeout_ms: DEFAULT_LIVENESS_TIMEOUT_MS,
            max_account_exports: DEFAULT_MAX_ACCOUNT_EXPORTS,
        }
    }
}

impl SigningConfig {
    /// Parses and validates a TOML configuration.
    pub fn from_toml(contents: &str) -> OrchestratorResult<Self> {
        let config: Self = toml::from_str(contents)?;
        debug!(?config, "parsed configuration");

        config.validate()?;

        Ok(config)
    }

    /// Checks the values that cannot be expressed in the types.
    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.liveness_timeout_ms == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "liveness_timeout_ms must be positive".to_string(),
            ));
        }

        if self.max_account_exports == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "max_account_exports must be positive".to_string(),
            ));
        }

        let SearchSpace {
            account_bound,
            address_index_bound,
        } = self.initial_search_space;
        if account_bound > MAX_CHILD_INDEX || address_index_bound > MAX_CHILD_INDEX {
            return Err(OrchestratorError::InvalidConfig(format!(
                "search bounds must not exceed {MAX_CHILD_INDEX}"
            )));
        }

        Ok(())
    }

    /// Returns the liveness timeout.
    pub const fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    /// Returns the part of the configuration the state machine needs.
    pub const fn sm_config(&self) -> SigningSMCfg {
        SigningSMCfg {
            network: self.network,
            initial_search_space: self.initial_search_space,
        }
    }
}
