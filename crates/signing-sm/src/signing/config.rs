//! Configuration shared by all signing sessions.

use bip322_primitives::types::SearchSpace;
use bitcoin::Network;

/// Static configuration of the signing state machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SigningSMCfg {
    /// The network addresses are expected to belong to.
    pub network: Network,
    /// The bounds every new signing attempt starts searching with.
    pub initial_search_space: SearchSpace,
}

impl SigningSMCfg {
    /// Returns the network addresses are expected to belong to.
    pub const fn network(&self) -> Network {
        self.network
    }

    /// Returns the bounds every new signing attempt starts searching with.
    pub const fn initial_search_space(&self) -> SearchSpace {
        self.initial_search_space
    }
}

impl Default for SigningSMCfg {
    fn default() -> Self {
        Self {
            network: Network::Bitcoin,
            initial_search_space: SearchSpace::default(),
        }
    }
}
