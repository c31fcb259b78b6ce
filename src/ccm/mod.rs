//! CCM* as used by IEEE 802.15.4 (annex B), built on a [`Cipher`].
//!
//! The engine is stateless apart from the key loaded into the cipher: every
//! block it feeds the cipher is derived from the 13 byte nonce, so the same
//! code authenticates and encrypts outgoing frames and decrypts and verifies
//! incoming ones.

pub mod cipher;

use core::cmp;
use core::fmt;

pub use cipher::{Block, Cipher, CipherOps, SoftwareCipher, BLOCK_LEN, KEY_LEN};

/// The size of the CCM* nonce, in bytes.
pub const NONCE_LEN: usize = 13;
/// The largest MIC, in bytes.
pub const MAX_MIC_LEN: usize = 16;
/// The longest associated data with a two byte length encoding.
pub const MAX_ADATA_LEN: usize = 0xFEFF;
/// The longest message with a two byte length field (L = 2).
pub const MAX_MSG_LEN: usize = 0xFFFF;

/// Flags of the `A_i` blocks: only L - 1.
const FLAGS_CTR: u8 = 0x01;
/// The Adata bit of the `B_0` flags.
const FLAGS_ADATA: u8 = 0x40;

/// The CCM* nonce.
pub type Nonce = [u8; NONCE_LEN];

/// Input too long for the two byte length encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthError;

impl fmt::Display for LengthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CCM* input exceeds the supported length")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LengthError {}

/// Returns the nonce for a frame.
///
/// # Arguments
/// * `src_address` - The sender's long address, in network byte order.
/// * `frame_counter` - The frame counter of the auxiliary security header.
/// * `security_level` - The security level of the frame.
pub fn nonce(
    src_address: &[u8; 8],
    frame_counter: u32,
    security_level: u8,
) -> Nonce {
    let mut nonce = [0; NONCE_LEN];
    nonce[..8].copy_from_slice(src_address);
    nonce[8..12].copy_from_slice(&frame_counter.to_be_bytes());
    nonce[12] = security_level;

    nonce
}

/// Returns the counter block `A_i`.
pub fn ctr_block(nonce: &Nonce, i: u16) -> Block {
    let mut block = [0; BLOCK_LEN];
    block[0] = FLAGS_CTR;
    block[1..=NONCE_LEN].copy_from_slice(nonce);
    block[14..].copy_from_slice(&i.to_be_bytes());

    block
}

/// Returns the first CBC-MAC block `B_0`.
///
/// # Arguments
/// * `nonce` - The frame nonce.
/// * `mic_len` - The size of the MIC, one of 4, 8 or 16.
/// * `has_adata` - Whether there is associated data to authenticate.
/// * `msg_len` - The length of the message.
pub fn b0_block(
    nonce: &Nonce,
    mic_len: usize,
    has_adata: bool,
    msg_len: u16,
) -> Block {
    let mut block = [0; BLOCK_LEN];
    block[0] = FLAGS_CTR | ((((mic_len as u8).saturating_sub(2)) / 2) << 3);
    if has_adata {
        block[0] |= FLAGS_ADATA;
    }
    block[1..=NONCE_LEN].copy_from_slice(nonce);
    block[14..].copy_from_slice(&msg_len.to_be_bytes());

    block
}

/// Fails if the inputs can't be expressed with the length encodings used
/// here.
pub fn check_lengths(
    adata_len: usize,
    msg_len: usize,
) -> Result<(), LengthError> {
    if adata_len > MAX_ADATA_LEN || msg_len > MAX_MSG_LEN {
        return Err(LengthError);
    }

    Ok(())
}

/// Compares two tags, looking at every byte regardless of mismatches.
pub fn tags_match(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// CCM* operations for one frame.
pub struct Ccm<'a, O> {
    cipher: &'a mut Cipher<O>,
    nonce: Nonce,
}

impl<'a, O: CipherOps> Ccm<'a, O> {
    /// Creates a new `Ccm` on a cipher that already has the key loaded.
    pub fn new(cipher: &'a mut Cipher<O>, nonce: Nonce) -> Ccm<'a, O> {
        Ccm { cipher, nonce }
    }

    /// XORs `data` with the keystream starting at `A_first`.
    ///
    /// Encryption and decryption are the same operation.
    pub fn crypt(&mut self, first: u16, data: &mut [u8]) {
        let mut counter = first;
        for chunk in data.chunks_mut(BLOCK_LEN) {
            let a_i = ctr_block(&self.nonce, counter);
            let mut keystream = [0; BLOCK_LEN];
            self.cipher.ecb(&mut keystream, &a_i);
            cipher::xor(chunk, &keystream);
            counter = counter.wrapping_add(1);
        }
    }

    /// Encrypts or decrypts the MIC, which uses `A_0`.
    pub fn crypt_mic(&mut self, mic: &mut [u8]) {
        self.crypt(0, mic);
    }

    /// Encrypts or decrypts the payload, which uses `A_1` onwards.
    pub fn crypt_payload(&mut self, payload: &mut [u8]) {
        self.crypt(1, payload);
    }

    /// Returns the unencrypted MIC over `adata` and `msg`.
    ///
    /// Only the first `mic_len` bytes of the result are the MIC.
    pub fn compute_mic(
        &mut self,
        mic_len: usize,
        adata: &[u8],
        msg: &[u8],
    ) -> Result<Block, LengthError> {
        check_lengths(adata.len(), msg.len())?;
        let b0 = b0_block(
            &self.nonce,
            mic_len,
            !adata.is_empty(),
            msg.len() as u16,
        );

        let mut chain = [0; BLOCK_LEN];
        self.mac_block(&mut chain, &b0);

        if !adata.is_empty() {
            // The first block carries the length prefix
            let mut block = [0; BLOCK_LEN];
            block[..2].copy_from_slice(&(adata.len() as u16).to_be_bytes());
            let first = cmp::min(BLOCK_LEN - 2, adata.len());
            block[2..2 + first].copy_from_slice(&adata[..first]);
            self.mac_block(&mut chain, &block);

            for chunk in adata[first..].chunks(BLOCK_LEN) {
                self.mac_block(&mut chain, chunk);
            }
        }
        for chunk in msg.chunks(BLOCK_LEN) {
            self.mac_block(&mut chain, chunk);
        }

        Ok(chain)
    }

    /// Feeds one (possibly partial, zero-padded) block into the CBC-MAC.
    fn mac_block(&mut self, chain: &mut Block, chunk: &[u8]) {
        let mut block = [0; BLOCK_LEN];
        block[..chunk.len()].copy_from_slice(chunk);
        let mut out = [0; BLOCK_LEN];
        self.cipher.cbc(&mut out, chain, &block);
    }
}
