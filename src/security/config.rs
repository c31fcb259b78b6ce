use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::cbor;

/// The number of key slots.
pub const MAX_KEYS: usize = 4;
/// The number of device slots.
pub const MAX_DEVICES: usize = 8;
/// The number of key-lookup slots.
pub const MAX_KEY_LOOKUPS: usize = 8;

// Occupancy and membership sets are u32 bitmaps
const _: () = assert!(MAX_KEYS <= 32);
const _: () = assert!(MAX_DEVICES <= 32);
const _: () = assert!(MAX_KEY_LOOKUPS <= 32);

/// The default PAN ID of an interface.
pub const DEFAULT_PAN_ID: u16 = 0x0023;

/// The security level of a frame (IEEE 802.15.4 table 9-6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityLevel {
    None = 0,
    Mic32 = 1,
    Mic64 = 2,
    Mic128 = 3,
    Enc = 4,
    EncMic32 = 5,
    EncMic64 = 6,
    EncMic128 = 7,
}

impl SecurityLevel {
    /// All security levels, in ascending order.
    pub const ALL: [SecurityLevel; 8] = [
        SecurityLevel::None,
        SecurityLevel::Mic32,
        SecurityLevel::Mic64,
        SecurityLevel::Mic128,
        SecurityLevel::Enc,
        SecurityLevel::EncMic32,
        SecurityLevel::EncMic64,
        SecurityLevel::EncMic128,
    ];

    /// Decodes the three least significant bits.
    pub fn from_bits(bits: u8) -> SecurityLevel {
        SecurityLevel::ALL[(bits & 0b111) as usize]
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Returns the size of the MIC for this level, in bytes.
    pub fn mic_len(self) -> usize {
        match self.bits() & 0b011 {
            0 => 0,
            1 => 4,
            2 => 8,
            _ => 16,
        }
    }

    /// Whether frames with this level carry an encrypted payload.
    pub fn encrypts(self) -> bool {
        self.bits() & 0b100 != 0
    }
}

/// How the key of a frame is determined (IEEE 802.15.4 table 9-7).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyIdMode {
    /// From the addresses of the frame, no key identifier.
    Implicit = 0,
    /// From a one byte key index.
    Index = 1,
    /// From a four byte key source and a key index.
    Source4 = 2,
    /// From an eight byte key source and a key index.
    Source8 = 3,
}

impl KeyIdMode {
    /// All key identifier modes, in ascending order.
    pub const ALL: [KeyIdMode; 4] = [
        KeyIdMode::Implicit,
        KeyIdMode::Index,
        KeyIdMode::Source4,
        KeyIdMode::Source8,
    ];

    /// Decodes the two least significant bits.
    pub fn from_bits(bits: u8) -> KeyIdMode {
        KeyIdMode::ALL[(bits & 0b11) as usize]
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Returns the number of live key source bytes.
    pub fn source_len(self) -> usize {
        match self {
            KeyIdMode::Implicit | KeyIdMode::Index => 0,
            KeyIdMode::Source4 => 4,
            KeyIdMode::Source8 => 8,
        }
    }

    /// Returns the size of the key identifier field, in bytes.
    pub fn key_id_len(self) -> usize {
        match self {
            KeyIdMode::Implicit => 0,
            _ => self.source_len() + 1,
        }
    }
}

/// The defaults an interface secures outgoing frames with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The security level of outgoing frames.
    pub security_level: SecurityLevel,
    /// The key identifier mode of outgoing frames.
    pub key_id_mode: KeyIdMode,
    /// The key index of outgoing frames in explicit modes.
    pub key_index: u8,
    /// The key source of outgoing frames, only the first
    /// `key_id_mode.source_len()` bytes are used.
    pub key_source: [u8; 8],
    /// Whether incoming frames are checked against the device table.
    pub replay_protection: bool,
    /// The PAN ID of the interface, used when a frame omits the PAN.
    pub pan_id: u16,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            security_level: SecurityLevel::EncMic64,
            key_id_mode: KeyIdMode::Implicit,
            key_index: 0,
            key_source: [0; 8],
            replay_protection: cfg!(not(feature = "no_replay")),
            pan_id: DEFAULT_PAN_ID,
        }
    }
}

impl Config {
    /// Returns the CBOR encoding of the configuration.
    pub fn to_cbor(&self) -> cbor::Result<Vec<u8>> {
        cbor::encode(self)
    }

    /// Decodes a configuration from its CBOR encoding.
    pub fn from_cbor(bytes: &mut [u8]) -> cbor::Result<Config> {
        cbor::decode(bytes)
    }
}
