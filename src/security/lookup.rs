//! Key-lookup rules and the KeyDescriptor lookup procedure.

use super::{
    config::{KeyIdMode, MAX_DEVICES},
    device::DeviceEntry,
    frame::{AddrMode, Address},
    slots::{DevSlot, KeySlot, Slots},
};

/// What a key-lookup rule matches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySelector {
    /// Frames without a key identifier, to or from the device.
    Implicit {
        dev: DevSlot,
        /// Whether the device is addressed by its short or long address.
        addr_mode: AddrMode,
    },
    /// Frames carrying this key identifier.
    Explicit {
        key_id_mode: KeyIdMode,
        key_index: u8,
        /// Zero beyond `key_id_mode.source_len()`.
        key_source: [u8; 8],
    },
}

impl KeySelector {
    /// Creates an explicit selector, keeping only the live key source bytes.
    ///
    /// Returns `None` for the implicit key identifier mode.
    pub fn explicit(
        key_id_mode: KeyIdMode,
        key_index: u8,
        key_source: &[u8; 8],
    ) -> Option<KeySelector> {
        if key_id_mode == KeyIdMode::Implicit {
            return None;
        }
        let len = key_id_mode.source_len();
        let mut source = [0; 8];
        source[..len].copy_from_slice(&key_source[..len]);

        Some(KeySelector::Explicit {
            key_id_mode,
            key_index,
            key_source: source,
        })
    }
}

/// A rule mapping frames to a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LookupEntry {
    pub(crate) key: KeySlot,
    pub(crate) selector: KeySelector,
}

impl Default for LookupEntry {
    fn default() -> LookupEntry {
        LookupEntry {
            key: KeySlot(0),
            selector: KeySelector::Explicit {
                key_id_mode: KeyIdMode::Index,
                key_index: 0,
                key_source: [0; 8],
            },
        }
    }
}

/// The key identification of a frame, as seen by the lookup procedure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KeyQuery<'a> {
    /// No key identifier, the peer's address decides.
    Implicit { pan: u16, addr: Option<&'a Address> },
    Explicit {
        key_id_mode: KeyIdMode,
        key_index: u8,
        key_source: &'a [u8; 8],
    },
}

impl LookupEntry {
    /// Returns the key this rule selects.
    pub fn key(&self) -> KeySlot {
        self.key
    }

    pub fn selector(&self) -> &KeySelector {
        &self.selector
    }

    /// Returns the device of an implicit rule.
    pub fn dev(&self) -> Option<DevSlot> {
        match self.selector {
            KeySelector::Implicit { dev, .. } => Some(dev),
            KeySelector::Explicit { .. } => None,
        }
    }

    /// Whether this rule selects its key for a frame identified by `query`.
    pub(crate) fn matches(
        &self,
        query: &KeyQuery,
        devices: &Slots<DeviceEntry, MAX_DEVICES>,
    ) -> bool {
        match (&self.selector, query) {
            (
                KeySelector::Implicit { dev, addr_mode },
                KeyQuery::Implicit {
                    pan,
                    addr: Some(addr),
                },
            ) => {
                addr.mode() == *addr_mode
                    && devices
                        .get(dev.index())
                        .map_or(false, |d| d.matches(*pan, addr))
            }
            (
                KeySelector::Explicit {
                    key_id_mode,
                    key_index,
                    key_source,
                },
                KeyQuery::Explicit {
                    key_id_mode: mode,
                    key_index: index,
                    key_source: source,
                },
            ) => {
                let len = key_id_mode.source_len();
                key_id_mode == mode
                    && key_index == index
                    && key_source[..len] == source[..len]
            }
            _ => false,
        }
    }
}
