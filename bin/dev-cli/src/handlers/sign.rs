//! Runs a full signing session against an in-memory key store.

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use bip322_device::{SoftwareConnector, SoftwareDevice};
use bip322_orchestrator::{Orchestrator, SigningConfig, TracingObserver};
use bip322_signing_sm::signing::state::SigningState;
use bitcoin::bip32::Xpriv;
use tracing::info;

use crate::cli::SignArgs;

pub(crate) async fn handle_sign(args: SignArgs, config: &SigningConfig) -> Result<()> {
    let master = Xpriv::from_str(&args.xprv).context("invalid extended private key")?;
    let connector = SoftwareConnector::new(SoftwareDevice::new(master));
    let mut orchestrator = Orchestrator::new(connector, config, TracingObserver)?;

    orchestrator.connect().await?;
    if orchestrator.state() != &SigningState::AwaitingInput {
        bail!(
            "could not connect to the key store: {:?}",
            orchestrator.context().last_failure()
        );
    }

    info!(action = "signing message", address = %args.address);
    orchestrator.submit(args.address, args.message).await?;

    let mut expansions = 0;
    let signature = loop {
        match orchestrator.state().clone() {
            SigningState::Signed { signature, .. } => break signature,
            SigningState::SearchExhausted { search_space, .. } => {
                if expansions == args.max_expansions {
                    bail!("address not found within {search_space:?}");
                }

                expansions += 1;
                orchestrator.expand_search().await?;
            }
            state => bail!(
                "signing stopped in {state}: {:?}",
                orchestrator.context().last_failure()
            ),
        }
    };

    orchestrator.shutdown().await;
    println!("{signature}");

    Ok(())
}
