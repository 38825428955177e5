//! The capability interface of a hardware signing device.
//!
//! The device is treated as an opaque set of remote procedures: it exports extended public keys,
//! reports its master fingerprint and signs either legacy messages or PSBTs under a wallet policy.
//! How the device is reached (USB HID, BLE, a simulator) is up to the implementor of
//! [`DeviceConnector`].

pub mod errors;
pub mod policy;
pub mod software;
pub mod traits;

pub use errors::{DeviceError, DeviceResult, StatusWord};
pub use policy::{KeyInfo, WalletPolicy};
pub use software::{SoftwareConnector, SoftwareDevice};
pub use traits::{DeviceConnector, DeviceSession, DeviceSignature};
