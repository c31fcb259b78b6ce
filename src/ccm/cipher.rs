use aes::{
    cipher::{generic_array::GenericArray, BlockEncrypt, NewBlockCipher},
    Aes128,
};

/// The size of a cipher block, in bytes.
pub const BLOCK_LEN: usize = 16;
/// The size of a key, in bytes.
pub const KEY_LEN: usize = 16;

/// A single cipher block.
pub type Block = [u8; BLOCK_LEN];

/// The operations a cipher device offers to the security layer.
///
/// Only `set_key` is mandatory. A driver that has no native ECB or CBC
/// support leaves the provided methods alone, which makes them run on the
/// software AES-128 key schedule passed in as `fallback`.
///
/// Inputs and outputs always have the same length, which is a multiple of
/// [`BLOCK_LEN`].
pub trait CipherOps {
    /// Loads the key into the device.
    fn set_key(&mut self, key: &[u8; KEY_LEN]);

    /// Encrypts every block of `input` independently into `out`.
    fn ecb(&mut self, fallback: &Aes128, out: &mut [u8], input: &[u8]) {
        software_ecb(fallback, out, input);
    }

    /// CBC-encrypts `input` into `out`.
    ///
    /// On return `iv` holds the last ciphertext block, so consecutive calls
    /// continue the same chain.
    fn cbc(
        &mut self,
        fallback: &Aes128,
        out: &mut [u8],
        iv: &mut Block,
        input: &[u8],
    ) {
        for (o, i) in out
            .chunks_exact_mut(BLOCK_LEN)
            .zip(input.chunks_exact(BLOCK_LEN))
        {
            let mut block = *iv;
            xor(&mut block, i);
            self.ecb(fallback, o, &block);
            iv.copy_from_slice(o);
        }
    }
}

/// A cipher device without any hardware support.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareCipher;

impl CipherOps for SoftwareCipher {
    fn set_key(&mut self, _key: &[u8; KEY_LEN]) {}
}

/// Block-cipher adapter combining a device with the software key schedule.
pub struct Cipher<O> {
    ops: O,
    schedule: Aes128,
}

impl<O: CipherOps> Cipher<O> {
    /// Creates a new `Cipher` with an all-zero key.
    pub fn new(ops: O) -> Cipher<O> {
        Cipher {
            ops,
            schedule: Aes128::new(&GenericArray::default()),
        }
    }

    /// Loads the key into the device and into the fallback key schedule.
    ///
    /// The schedule is updated even when the device does its own key
    /// expansion, since any operation the device doesn't override runs on
    /// it.
    pub fn set_key(&mut self, key: &[u8; KEY_LEN]) {
        self.ops.set_key(key);
        self.schedule = Aes128::new(GenericArray::from_slice(key));
    }

    /// Encrypts the blocks of `input` independently into `out`.
    pub fn ecb(&mut self, out: &mut [u8], input: &[u8]) {
        debug_assert_eq!(out.len(), input.len());
        debug_assert_eq!(input.len() % BLOCK_LEN, 0);
        self.ops.ecb(&self.schedule, out, input);
    }

    /// CBC-encrypts `input` into `out`, chaining through `iv`.
    pub fn cbc(&mut self, out: &mut [u8], iv: &mut Block, input: &[u8]) {
        debug_assert_eq!(out.len(), input.len());
        debug_assert_eq!(input.len() % BLOCK_LEN, 0);
        self.ops.cbc(&self.schedule, out, iv, input);
    }

    /// Returns a reference to the underlying device.
    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Returns a mutable reference to the underlying device.
    pub fn ops_mut(&mut self) -> &mut O {
        &mut self.ops
    }
}

/// Encrypts every block with the software key schedule.
pub fn software_ecb(schedule: &Aes128, out: &mut [u8], input: &[u8]) {
    out.copy_from_slice(input);
    for block in out.chunks_exact_mut(BLOCK_LEN) {
        schedule.encrypt_block(GenericArray::from_mut_slice(block));
    }
}

/// XORs `other` into the start of `block`.
pub(crate) fn xor(block: &mut [u8], other: &[u8]) {
    for (b1, b2) in block.iter_mut().zip(other.iter()) {
        *b1 ^= b2;
    }
}
