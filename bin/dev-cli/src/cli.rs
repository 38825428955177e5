use std::path::PathBuf;

use bip322_primitives::address::AddressType;
use bitcoin::Network;
use clap::{crate_version, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bip322-cli",
    about = "Sign messages with the key behind an address and verify the signatures",
    version = crate_version!()
)]
pub(crate) struct Cli {
    #[clap(flatten)]
    pub(crate) global: GlobalArgs,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct GlobalArgs {
    #[arg(
        long,
        global = true,
        env = "BIP322_CONFIG",
        help = "the path to the signing config file"
    )]
    pub(crate) config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "the network addresses belong to, overrides the config file"
    )]
    pub(crate) network: Option<Network>,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Commands {
    Classify(ClassifyArgs),

    Derive(DeriveArgs),

    Sign(SignArgs),

    Verify(VerifyArgs),
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Print the type of an address", version)]
pub(crate) struct ClassifyArgs {
    #[arg(help = "the address to classify")]
    pub(crate) address: String,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Derive a receive address from an account xpub", version)]
pub(crate) struct DeriveArgs {
    #[arg(long, help = "the account level extended public key")]
    pub(crate) xpub: String,

    #[arg(
        long = "type",
        help = "the address type: legacy, segwit, native-segwit or taproot"
    )]
    pub(crate) address_type: AddressType,

    #[arg(long, default_value_t = 0, help = "the receive address index")]
    pub(crate) index: u32,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Sign a message with an in-memory key store", version)]
pub(crate) struct SignArgs {
    #[arg(
        long,
        env = "BIP322_XPRV",
        help = "the master extended private key of the key store"
    )]
    pub(crate) xprv: String,

    #[arg(long, help = "the address to sign with")]
    pub(crate) address: String,

    #[arg(long, help = "the message to sign")]
    pub(crate) message: String,

    #[arg(
        long,
        default_value_t = 2,
        help = "how many times an unsuccessful search is doubled before giving up"
    )]
    pub(crate) max_expansions: u32,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Verify a signature", version)]
pub(crate) struct VerifyArgs {
    #[arg(long, help = "the address that signed")]
    pub(crate) address: String,

    #[arg(long, help = "the signed message")]
    pub(crate) message: String,

    #[arg(long, help = "the base64 signature")]
    pub(crate) signature: String,
}
