//! Link-layer security for
//! [IEEE 802.15.4](https://standards.ieee.org/standard/802_15_4-2020.html)
//! networks, intended for embedded devices.
//!
//! Frames are authenticated and optionally encrypted with CCM* on top of a
//! single AES-128 block cipher, which can be a hardware engine behind the
//! [`ccm::CipherOps`] trait or the software fallback. The
//! [`security::SecurityContext`] keeps the key, device and key-lookup tables
//! of an interface and secures outgoing and unsecures incoming frames in
//! place.
//!
//! The tables are fixed-size and nothing on the frame path allocates. Key
//! exchange is out of scope, peering a device with a key assumes both sides
//! already agree on it.
//!
//! ## Security
//! This should **not currently be used in production code**, use at your own
//! risk.

#![no_std]
#[macro_use]
extern crate alloc;
#[cfg(any(feature = "std", test))]
extern crate std;

mod cbor;

pub mod ccm;
pub mod security;

pub use cbor::CborError;
