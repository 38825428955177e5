//! Classification of signer addresses into the encodings a hardware signer can prove ownership of.

use std::{fmt, str::FromStr};

use bitcoin::{Address, Network, ScriptBuf};
use serde::{Deserialize, Serialize};

use crate::errors::{AddressError, AddressResult};

/// The address encodings supported for message signing.
///
/// Each variant fixes the BIP-43 purpose of the derivation path, the script the signing key is
/// committed to and the way the signature is finally encoded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum AddressType {
    /// Pay-to-public-key-hash (`1...` on mainnet).
    Legacy,

    /// Pay-to-witness-public-key-hash nested in pay-to-script-hash (`3...` on mainnet).
    Segwit,

    /// Pay-to-witness-public-key-hash (`bc1q...` on mainnet).
    NativeSegwit,

    /// Pay-to-taproot, key path spend only (`bc1p...` on mainnet).
    Taproot,
}

impl AddressType {
    /// All supported address types in ascending purpose order.
    pub const ALL: [AddressType; 4] = [
        AddressType::Legacy,
        AddressType::Segwit,
        AddressType::NativeSegwit,
        AddressType::Taproot,
    ];

    /// Whether signatures for this type are produced through a virtual transaction rather than
    /// the legacy signed-message format.
    pub const fn uses_virtual_tx(&self) -> bool {
        !matches!(self, AddressType::Legacy)
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressType::Legacy => "legacy",
            AddressType::Segwit => "segwit",
            AddressType::NativeSegwit => "native-segwit",
            AddressType::Taproot => "taproot",
        };

        write!(f, "{name}")
    }
}

impl FromStr for AddressType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" | "p2pkh" => Ok(AddressType::Legacy),
            "segwit" | "p2sh-p2wpkh" => Ok(AddressType::Segwit),
            "native-segwit" | "p2wpkh" => Ok(AddressType::NativeSegwit),
            "taproot" | "p2tr" => Ok(AddressType::Taproot),
            other => Err(format!("unknown address type: {other}")),
        }
    }
}

/// Parses `address` and checks that it belongs to `network`.
pub fn parse_address(address: &str, network: Network) -> AddressResult<Address> {
    Address::from_str(address)
        .map_err(|e| AddressError::unsupported(address, e))?
        .require_network(network)
        .map_err(|e| AddressError::unsupported(address, e))
}

/// Determines the [`AddressType`] of an already validated address.
///
/// P2SH addresses are assumed to wrap a P2WPKH output since a script hash alone does not reveal
/// the redeem script. Any other script hash fails later, when no derived key matches.
pub fn classify_address(address: &Address) -> AddressResult<AddressType> {
    match address.address_type() {
        Some(bitcoin::AddressType::P2pkh) => Ok(AddressType::Legacy),
        Some(bitcoin::AddressType::P2sh) => Ok(AddressType::Segwit),
        Some(bitcoin::AddressType::P2wpkh) => Ok(AddressType::NativeSegwit),
        Some(bitcoin::AddressType::P2tr) => Ok(AddressType::Taproot),
        Some(other) => Err(AddressError::unsupported(
            &address.to_string(),
            format!("{other} outputs cannot be signed for"),
        )),
        None => Err(AddressError::unsupported(
            &address.to_string(),
            "non-standard witness program",
        )),
    }
}

/// Parses `address` for `network` and returns its [`AddressType`].
pub fn classify(address: &str, network: Network) -> AddressResult<AddressType> {
    let parsed = parse_address(address, network)?;

    classify_address(&parsed)
}

/// Returns the output script committed to by `address`.
///
/// The address must be one of the supported kinds.
pub fn to_script_pubkey(address: &str, network: Network) -> AddressResult<ScriptBuf> {
    let parsed = parse_address(address, network)?;
    classify_address(&parsed)?;

    Ok(parsed.script_pubkey())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_mainnet() {
        let cases = [
            ("1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA", AddressType::Legacy),
            ("37VucYSaXLCAsxYyAPfbSi9eh4iEcbShgf", AddressType::Segwit),
            (
                "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu",
                AddressType::NativeSegwit,
            ),
            (
                "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr",
                AddressType::Taproot,
            ),
        ];

        for (address, expected) in cases {
            assert_eq!(
                classify(address, Network::Bitcoin).unwrap(),
                expected,
                "{address} must classify as {expected}"
            );
        }
    }

    #[test]
    fn test_classify_rejects_garbage() {
        for address in ["", "not-an-address", "bc1qqqqqqqq"] {
            assert!(matches!(
                classify(address, Network::Bitcoin),
                Err(AddressError::UnsupportedAddressKind { .. })
            ));
        }
    }

    #[test]
    fn test_classify_rejects_wrong_network() {
        let err = classify(
            "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu",
            Network::Testnet,
        )
        .unwrap_err();

        assert!(matches!(err, AddressError::UnsupportedAddressKind { .. }));
    }

    #[test]
    fn test_classify_rejects_p2wsh() {
        // 32-byte witness program
        let p2wsh = "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3";

        assert!(matches!(
            classify(p2wsh, Network::Bitcoin),
            Err(AddressError::UnsupportedAddressKind { .. })
        ));
    }

    #[test]
    fn test_script_pubkey() {
        let cases = [
            (
                "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA",
                "76a914d986ed01b7a22225a70edbf2ba7cfb63a15cb3aa88ac",
            ),
            (
                "37VucYSaXLCAsxYyAPfbSi9eh4iEcbShgf",
                "a9143fb6e95812e57bb4691f9a4a628862a61a4f769b87",
            ),
            (
                "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu",
                "0014c0cebcd6c3d3ca8c75dc5ec62ebe55330ef910e2",
            ),
            (
                "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr",
                "5120a60869f0dbcf1dc659c9cecbaf8050135ea9e8cdc487053f1dc6880949dc684c",
            ),
        ];

        for (address, expected) in cases {
            let spk = to_script_pubkey(address, Network::Bitcoin).unwrap();
            assert_eq!(spk.to_hex_string(), expected, "script for {address}");
        }
    }

    #[test]
    fn test_address_type_str_roundtrip() {
        for address_type in AddressType::ALL {
            let parsed: AddressType = address_type.to_string().parse().unwrap();
            assert_eq!(parsed, address_type);
        }

        assert!("p2wsh".parse::<AddressType>().is_err());
    }

    #[test]
    fn test_only_legacy_skips_virtual_tx() {
        let virtual_tx = AddressType::ALL
            .into_iter()
            .filter(|t| !t.uses_virtual_tx())
            .collect::<Vec<_>>();

        assert_eq!(virtual_tx, vec![AddressType::Legacy]);
    }
}
