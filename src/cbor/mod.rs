//! CBOR encoding of configuration data, on top of `serde_cbor`.

use alloc::vec::Vec;
use core::{cmp, result};
use serde::{Deserialize, Serialize};
use serde_cbor::{de, ser::Write, Serializer};

#[cfg_attr(tarpaulin, skip)]
mod error;
pub use error::CborError;

/// The result type for the `cbor` module.
pub type Result<T> = core::result::Result<T, CborError>;

/// Implements the `Write` trait from `serde_cbor` on a growing `Vec<u8>`.
struct VecWrite {
    vec: Vec<u8>,
}

impl VecWrite {
    /// Constructs a new `VecWrite` with room for a typical configuration.
    fn new() -> VecWrite {
        VecWrite {
            vec: Vec::with_capacity(64),
        }
    }

    fn into_inner(self) -> Vec<u8> {
        self.vec
    }
}

impl Write for VecWrite {
    type Error = serde_cbor::Error;

    fn write_all(&mut self, buf: &[u8]) -> result::Result<(), Self::Error> {
        let free = self.vec.capacity() - self.vec.len();
        if free < buf.len() {
            self.vec.reserve(cmp::max(64, buf.len()));
        }
        self.vec.extend_from_slice(buf);

        Ok(())
    }
}

/// Serializes an object into CBOR.
pub fn encode(object: impl Serialize) -> Result<Vec<u8>> {
    let mut serializer = Serializer::new(VecWrite::new());
    object.serialize(&mut serializer)?;

    Ok(serializer.into_inner().into_inner())
}

/// Deserializes a CBOR encoded object.
///
/// The buffer is used as scratch space while decoding.
pub fn decode<'a, T>(bytes: &'a mut [u8]) -> Result<T>
where
    T: Deserialize<'a>,
{
    Ok(de::from_mut_slice(bytes)?)
}
