//! IEEE 802.15.4 link-layer security.
//!
//! A [`SecurityContext`] holds the keys, the peer devices and the key-lookup
//! rules of one interface and secures and unsecures frames with them.

pub mod aux_header;
pub mod config;
mod context;
pub mod device;
#[cfg_attr(tarpaulin, skip)]
mod error;
pub mod frame;
pub mod key;
pub mod lookup;
mod slots;
mod tables;
#[cfg(test)]
mod test_vectors;

pub use aux_header::AuxHeader;
pub use config::{Config, KeyIdMode, SecurityLevel};
pub use context::{
    DefaultRawMutex, SecurityContext, Secured, TableGuard, Unsecured,
};
pub use device::DeviceEntry;
pub use error::Error;
pub use frame::{AddrMode, Address};
pub use key::KeyEntry;
pub use lookup::{KeySelector, LookupEntry};
pub use slots::{DevSlot, KeySlot, LookupSlot};

/// The result type for the `security` module.
pub type Result<T> = core::result::Result<T, Error>;
