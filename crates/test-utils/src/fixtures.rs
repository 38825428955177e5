//! Keys, addresses and signatures with known values.

use std::str::FromStr;

use bip322_device::{DeviceSignature, SoftwareDevice};
use bip322_key_deriv::{FoundPath, KeyDeriver};
use bip322_primitives::{
    address::AddressType,
    paths::{account_path, full_path},
};
use bitcoin::{
    bip32::{Fingerprint, Xpriv, Xpub},
    Network,
};

/// The master key of the test mnemonic.
pub const MASTER_XPRV: &str = "xprv9s21ZrQH143K3GJpoapnV8SFfukcVBSfeCficPSGfubmSFDxo1kuHnLisriDvSnRRuL2Qrg5ggqHKNVpxR86QEC8w35uxmGoggxtQTPvfUu";

/// The fingerprint of [`MASTER_XPRV`].
pub const FINGERPRINT: &str = "73c5da0a";

/// The key at `m/44'/0'/0'`.
pub const BIP44_ACCOUNT_XPUB: &str = "xpub6BosfCnifzxcFwrSzQiqu2DBVTshkCXacvNsWGYJVVhhawA7d4R5WSWGFNbi8Aw6ZRc1brxMyWMzG3DSSSSoekkudhUd9yLb6qx39T9nMdj";

/// The key at `m/49'/0'/0'`.
pub const BIP49_ACCOUNT_XPUB: &str = "xpub6C6nQwHaWbSrzs5tZ1q7m5R9cPK9eYpNMFesiXsYrgc1P8bvLLAet9JfHjYXKjToD8cBRswJXXbbFpXgwsswVPAZzKMa1jUp2kVkGVUaJa7";

/// The key at `m/84'/0'/0'`.
pub const BIP84_ACCOUNT_XPUB: &str = "xpub6CatWdiZiodmUeTDp8LT5or8nmbKNcuyvz7WyksVFkKB4RHwCD3XyuvPEbvqAQY3rAPshWcMLoP2fMFMKHPJ4ZeZXYVUhLv1VMrjPC7PW6V";

/// The key at `m/86'/0'/0'`.
pub const BIP86_ACCOUNT_XPUB: &str = "xpub6BgBgsespWvERF3LHQu6CnqdvfEvtMcQjYrcRzx53QJjSxarj2afYWcLteoGVky7D3UKDP9QyrLprQ3VCECoY49yfdDEHGCtMMj92pReUsQ";

/// The address at `m/44'/0'/0'/0/0`.
pub const LEGACY_ADDRESS: &str = "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA";

/// The address at `m/49'/0'/0'/0/0`.
pub const NESTED_SEGWIT_ADDRESS: &str = "37VucYSaXLCAsxYyAPfbSi9eh4iEcbShgf";

/// The address at `m/84'/0'/0'/0/0`.
pub const NATIVE_SEGWIT_ADDRESS: &str = "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu";

/// The address at `m/84'/0'/0'/0/5`.
pub const NATIVE_SEGWIT_ADDRESS_5: &str = "bc1qnpzzqjzet8gd5gl8l6gzhuc4s9xv0djt0rlu7a";

/// The address at `m/86'/0'/0'/0/0`.
pub const TAPROOT_ADDRESS: &str = "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr";

/// The address at `m/84'/0'/1'/0/0`.
pub const NATIVE_SEGWIT_ACCOUNT_1_ADDRESS: &str = "bc1qku0qh0mc00y8tk0n65x2tqw4trlspak0fnjmfz";

/// A DER encoded ECDSA signature (with the `SIGHASH_ALL` byte) used as a canned device answer.
pub const STUB_DER_SIGNATURE: &str = "304402206517c8637a7bfc3a154edcba6196d64bbd5b73955cb7da7d1626bcdde466c364022022bf10d19fc0bb69b4596e306b362acaa835293cf693bb176f7324b531f5afec01";

/// The encoding of [`STUB_DER_SIGNATURE`] made with the key of [`NATIVE_SEGWIT_ADDRESS`].
pub const STUB_ENCODED_SIGNATURE: &str = "AkcwRAIgZRfIY3p7/DoVTty6YZbWS71bc5Vct9p9Fia83eRmw2QCICK/ENGfwLtptFluMGs2KsqoNSk89pO7F29zJLUx9a/sASEDMNVP0N1CCm5fjTYk9fNILK41D3nV8HU79b7vnC2Rrzw=";

/// Returns [`MASTER_XPRV`].
pub fn master_xpriv() -> Xpriv {
    Xpriv::from_str(MASTER_XPRV).expect("must be a valid xprv")
}

/// Returns [`FINGERPRINT`].
pub fn fingerprint() -> Fingerprint {
    Fingerprint::from_str(FINGERPRINT).expect("must be a valid fingerprint")
}

/// Returns the account 0 key of `address_type`.
pub fn account_xpub(address_type: AddressType) -> Xpub {
    let xpub = match address_type {
        AddressType::Legacy => BIP44_ACCOUNT_XPUB,
        AddressType::Segwit => BIP49_ACCOUNT_XPUB,
        AddressType::NativeSegwit => BIP84_ACCOUNT_XPUB,
        AddressType::Taproot => BIP86_ACCOUNT_XPUB,
    };

    Xpub::from_str(xpub).expect("must be a valid xpub")
}

/// Returns the location of the receive address at `address_index` in account 0.
pub fn found_path(address_type: AddressType, address_index: u32) -> FoundPath {
    let account_xpub = account_xpub(address_type);
    let account_path =
        account_path(address_type, Network::Bitcoin, 0).expect("account 0 is a valid path");
    let key = KeyDeriver::new(Network::Bitcoin)
        .derive(&account_xpub, address_index, address_type)
        .expect("must derive");

    FoundPath {
        account: 0,
        address_index,
        path: full_path(&account_path, address_index).expect("must be a valid index"),
        account_path,
        account_xpub,
        key,
    }
}

/// Returns a device holding [`MASTER_XPRV`].
pub fn software_device() -> SoftwareDevice {
    SoftwareDevice::new(master_xpriv())
}

/// Returns [`STUB_DER_SIGNATURE`] as if made by the key of [`NATIVE_SEGWIT_ADDRESS`].
pub fn stub_device_signature() -> DeviceSignature {
    let found = found_path(AddressType::NativeSegwit, 0);

    DeviceSignature {
        pubkey: found.key.public_key().serialize().to_vec(),
        signature: hex::decode(STUB_DER_SIGNATURE).expect("must be valid hex"),
    }
}
