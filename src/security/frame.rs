//! Read-only access to the addressing fields of an IEEE 802.15.4 MAC header.
//!
//! All functions take the raw header starting at the frame control field and
//! hand out sub-slices of it. Addresses and PAN IDs are in their on-air byte
//! order there; [`source`] and [`destination`] decode them.

use super::{error::Error, Result};

/// Frame control, first byte: security enabled.
pub const FCF_SECURITY_EN: u8 = 0x08;
/// Frame control, first byte: PAN ID compression.
pub const FCF_PAN_COMP: u8 = 0x40;

/// Frame control, second byte: destination addressing mode.
pub const FCF_DST_ADDR_MASK: u8 = 0x0C;
pub const FCF_DST_ADDR_VOID: u8 = 0x00;
pub const FCF_DST_ADDR_RESV: u8 = 0x04;
pub const FCF_DST_ADDR_SHORT: u8 = 0x08;
pub const FCF_DST_ADDR_LONG: u8 = 0x0C;

/// Frame control, second byte: source addressing mode.
pub const FCF_SRC_ADDR_MASK: u8 = 0xC0;
pub const FCF_SRC_ADDR_VOID: u8 = 0x00;
pub const FCF_SRC_ADDR_RESV: u8 = 0x40;
pub const FCF_SRC_ADDR_SHORT: u8 = 0x80;
pub const FCF_SRC_ADDR_LONG: u8 = 0xC0;

/// Frame control and sequence number.
const FIXED_LEN: usize = 3;
const PAN_LEN: usize = 2;

/// An addressing mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddrMode {
    Void,
    Short,
    Long,
}

impl AddrMode {
    /// Returns the size of an address in this mode, in bytes.
    pub fn len(self) -> usize {
        match self {
            AddrMode::Void => 0,
            AddrMode::Short => 2,
            AddrMode::Long => 8,
        }
    }
}

/// A decoded device address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Address {
    Short(u16),
    /// In network byte order.
    Long([u8; 8]),
}

impl Address {
    /// Decodes an address from its on-air representation.
    ///
    /// Returns `None` for lengths other than 2 and 8.
    pub fn from_wire(bytes: &[u8]) -> Option<Address> {
        match bytes.len() {
            2 => Some(Address::Short(u16::from_le_bytes([bytes[0], bytes[1]]))),
            8 => {
                let mut long = [0; 8];
                for (dst, src) in long.iter_mut().zip(bytes.iter().rev()) {
                    *dst = *src;
                }
                Some(Address::Long(long))
            }
            _ => None,
        }
    }

    /// Returns the addressing mode this address is sent in.
    pub fn mode(&self) -> AddrMode {
        match self {
            Address::Short(_) => AddrMode::Short,
            Address::Long(_) => AddrMode::Long,
        }
    }
}

/// The decoded PAN ID and address of one end of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Peer {
    pub pan: Option<u16>,
    pub addr: Option<Address>,
}

/// Returns the frame control field, failing on truncated headers.
fn fcf(mhr: &[u8]) -> Result<[u8; 2]> {
    match mhr {
        [b0, b1, ..] => Ok([*b0, *b1]),
        _ => Err(Error::InvalidFrame),
    }
}

/// Returns `len` bytes starting at `offset`, failing on truncated headers.
fn field(mhr: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    mhr.get(offset..offset + len).ok_or(Error::InvalidFrame)
}

/// Whether the security enabled bit is set.
pub fn security_enabled(mhr: &[u8]) -> Result<bool> {
    Ok(fcf(mhr)?[0] & FCF_SECURITY_EN != 0)
}

/// Whether the source PAN ID is elided in favor of the destination PAN ID.
pub fn pan_compressed(mhr: &[u8]) -> Result<bool> {
    Ok(fcf(mhr)?[0] & FCF_PAN_COMP != 0)
}

/// Returns the destination addressing mode.
pub fn dst_addr_mode(mhr: &[u8]) -> Result<AddrMode> {
    match fcf(mhr)?[1] & FCF_DST_ADDR_MASK {
        FCF_DST_ADDR_VOID => Ok(AddrMode::Void),
        FCF_DST_ADDR_SHORT => Ok(AddrMode::Short),
        FCF_DST_ADDR_LONG => Ok(AddrMode::Long),
        _ => Err(Error::InvalidFrame),
    }
}

/// Returns the source addressing mode.
pub fn src_addr_mode(mhr: &[u8]) -> Result<AddrMode> {
    match fcf(mhr)?[1] & FCF_SRC_ADDR_MASK {
        FCF_SRC_ADDR_VOID => Ok(AddrMode::Void),
        FCF_SRC_ADDR_SHORT => Ok(AddrMode::Short),
        FCF_SRC_ADDR_LONG => Ok(AddrMode::Long),
        _ => Err(Error::InvalidFrame),
    }
}

/// Returns the offset of the source PAN ID or, if that's elided, of the
/// source address.
fn src_offset(mhr: &[u8]) -> Result<usize> {
    let offset = match dst_addr_mode(mhr)? {
        AddrMode::Void => FIXED_LEN,
        mode => FIXED_LEN + PAN_LEN + mode.len(),
    };

    Ok(offset)
}

/// Returns the destination PAN ID, if there is a destination.
pub fn dst_pan(mhr: &[u8]) -> Result<Option<&[u8]>> {
    match dst_addr_mode(mhr)? {
        AddrMode::Void => Ok(None),
        _ => Ok(Some(field(mhr, FIXED_LEN, PAN_LEN)?)),
    }
}

/// Returns the destination address, if there is one.
pub fn dst_addr(mhr: &[u8]) -> Result<Option<&[u8]>> {
    match dst_addr_mode(mhr)? {
        AddrMode::Void => Ok(None),
        mode => Ok(Some(field(mhr, FIXED_LEN + PAN_LEN, mode.len())?)),
    }
}

/// Returns the source PAN ID, if it's present in the header.
///
/// With PAN ID compression this is `None` and the destination PAN ID
/// applies.
pub fn src_pan(mhr: &[u8]) -> Result<Option<&[u8]>> {
    let offset = src_offset(mhr)?;
    if src_addr_mode(mhr)? == AddrMode::Void || pan_compressed(mhr)? {
        return Ok(None);
    }

    Ok(Some(field(mhr, offset, PAN_LEN)?))
}

/// Returns the source address, if there is one.
pub fn src_addr(mhr: &[u8]) -> Result<Option<&[u8]>> {
    let mut offset = src_offset(mhr)?;
    let mode = src_addr_mode(mhr)?;
    if mode == AddrMode::Void {
        return Ok(None);
    }
    if !pan_compressed(mhr)? {
        offset += PAN_LEN;
    }

    Ok(Some(field(mhr, offset, mode.len())?))
}

/// Returns the length of the MAC header up to the end of the addressing
/// fields.
pub fn header_len(mhr: &[u8]) -> Result<usize> {
    let dst = dst_addr_mode(mhr)?;
    let src = src_addr_mode(mhr)?;
    let compressed = pan_compressed(mhr)?;

    // PAN ID compression needs a destination PAN to fall back to
    if dst == AddrMode::Void && (compressed || src == AddrMode::Void) {
        return Err(Error::InvalidFrame);
    }

    let mut len = src_offset(mhr)?;
    if src != AddrMode::Void {
        if !compressed {
            len += PAN_LEN;
        }
        len += src.len();
    }

    Ok(len)
}

/// Returns the decoded destination PAN ID and address.
pub fn destination(mhr: &[u8]) -> Result<Peer> {
    Ok(Peer {
        pan: dst_pan(mhr)?.map(decode_pan),
        addr: dst_addr(mhr)?.and_then(Address::from_wire),
    })
}

/// Returns the decoded source PAN ID and address.
///
/// A compressed source PAN ID is reported as the destination PAN ID.
pub fn source(mhr: &[u8]) -> Result<Peer> {
    let pan = match src_pan(mhr)? {
        Some(pan) => Some(decode_pan(pan)),
        None if pan_compressed(mhr)? => dst_pan(mhr)?.map(decode_pan),
        None => None,
    };

    Ok(Peer {
        pan,
        addr: src_addr(mhr)?.and_then(Address::from_wire),
    })
}

fn decode_pan(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}
