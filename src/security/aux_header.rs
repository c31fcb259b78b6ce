use super::{
    config::{KeyIdMode, SecurityLevel},
    error::Error,
    Result,
};

/// The largest auxiliary security header, in bytes.
pub const MAX_LEN: usize = 1 + 4 + 9;

/// Security control: key identifier mode.
const KEY_ID_MODE_SHIFT: u8 = 3;

/// The auxiliary security header following the MAC header of a secured
/// frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuxHeader {
    pub level: SecurityLevel,
    pub key_id_mode: KeyIdMode,
    pub frame_counter: u32,
    /// Only meaningful if `key_id_mode` isn't `Implicit`.
    pub key_index: u8,
    /// Only the first `key_id_mode.source_len()` bytes are meaningful,
    /// the rest is zero after `read`.
    pub key_source: [u8; 8],
}

impl AuxHeader {
    /// Returns the encoded size, in bytes.
    pub fn len(&self) -> usize {
        1 + 4 + self.key_id_mode.key_id_len()
    }

    /// Returns the security control byte.
    pub fn security_control(&self) -> u8 {
        self.level.bits() | (self.key_id_mode.bits() << KEY_ID_MODE_SHIFT)
    }

    /// Writes the header to the start of `buf` and returns its size.
    pub fn write(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.len();
        if buf.len() < len {
            return Err(Error::BufferTooSmall);
        }

        buf[0] = self.security_control();
        buf[1..5].copy_from_slice(&self.frame_counter.to_le_bytes());
        if self.key_id_mode != KeyIdMode::Implicit {
            let source_len = self.key_id_mode.source_len();
            buf[5..5 + source_len]
                .copy_from_slice(&self.key_source[..source_len]);
            buf[5 + source_len] = self.key_index;
        }

        Ok(len)
    }

    /// Parses the header at the start of `buf`.
    pub fn read(buf: &[u8]) -> Result<AuxHeader> {
        let control = *buf.first().ok_or(Error::InvalidFrame)?;
        let mut header = AuxHeader {
            level: SecurityLevel::from_bits(control),
            key_id_mode: KeyIdMode::from_bits(control >> KEY_ID_MODE_SHIFT),
            frame_counter: 0,
            key_index: 0,
            key_source: [0; 8],
        };
        if buf.len() < header.len() {
            return Err(Error::InvalidFrame);
        }

        let mut counter = [0; 4];
        counter.copy_from_slice(&buf[1..5]);
        header.frame_counter = u32::from_le_bytes(counter);
        if header.key_id_mode != KeyIdMode::Implicit {
            let source_len = header.key_id_mode.source_len();
            header.key_source[..source_len]
                .copy_from_slice(&buf[5..5 + source_len]);
            header.key_index = buf[5 + source_len];
        }

        Ok(header)
    }
}
