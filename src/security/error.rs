use core::fmt;

use crate::ccm::LengthError;

/// The error type for the `security` module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// No key-lookup rule matches the frame's key selector.
    NoKey,
    /// No device matches the source address, or it isn't peered with the
    /// key.
    NoDev,
    /// The device can't be peered through this key-lookup rule.
    NoPeer,
    /// The outgoing frame counter of the key is exhausted.
    FrameCounterOverflow,
    /// The frame counter is lower than the one expected from the device.
    FrameCounterError,
    /// The MIC of the frame doesn't match.
    MacCheckFailure,
    /// The operation isn't implemented for the requested mode.
    Unsupported,
    /// The MAC header or auxiliary security header is malformed.
    InvalidFrame,
    /// A buffer is too small for the data that has to go into it.
    BufferTooSmall,
}

impl From<LengthError> for Error {
    fn from(_: LengthError) -> Error {
        Error::Unsupported
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NoKey => write!(f, "No key matches the frame"),
            Error::NoDev => {
                write!(f, "No device matches the frame or it isn't peered")
            }
            Error::NoPeer => write!(f, "Device can't be peered"),
            Error::FrameCounterOverflow => {
                write!(f, "Outgoing frame counter exhausted")
            }
            Error::FrameCounterError => {
                write!(f, "Frame counter lower than expected, replay")
            }
            Error::MacCheckFailure => write!(f, "MIC doesn't match"),
            Error::Unsupported => write!(f, "Unsupported operation"),
            Error::InvalidFrame => write!(f, "Malformed frame header"),
            Error::BufferTooSmall => write!(f, "Buffer too small"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
