use core::ops::Range;
use lock_api::{Mutex, MutexGuard, RawMutex};

use crate::ccm::{self, Ccm, Cipher, CipherOps, KEY_LEN};

use super::{
    aux_header::AuxHeader,
    config::{Config, KeyIdMode, SecurityLevel},
    device::DeviceEntry,
    error::Error,
    frame::{self, AddrMode, Address},
    key::KeyEntry,
    lookup::{KeyQuery, KeySelector, LookupEntry},
    slots::{DevSlot, KeySlot, LookupSlot},
    tables::Tables,
    Result,
};

/// The lock used when the host doesn't supply one.
pub type DefaultRawMutex = spin::Mutex<()>;

/// Everything behind the lock.
struct State<O> {
    cipher: Cipher<O>,
    config: Config,
    tables: Tables,
}

/// The result of securing an outgoing frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secured {
    /// The length of the MAC header including the auxiliary security
    /// header.
    pub header_len: usize,
    /// The number of MIC bytes written.
    pub mic_len: usize,
}

/// The layout of an incoming frame after unsecuring it in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unsecured {
    /// The length of the MAC header including the auxiliary security
    /// header.
    pub header_len: usize,
    /// The length of the unsecured payload.
    pub payload_len: usize,
    /// The length of the MIC following the payload.
    pub mic_len: usize,
}

impl Unsecured {
    /// Returns the position of the payload in the frame.
    pub fn payload(&self) -> Range<usize> {
        self.header_len..self.header_len + self.payload_len
    }

    /// Returns the position of the (decrypted) MIC in the frame.
    pub fn mic(&self) -> Range<usize> {
        let start = self.header_len + self.payload_len;
        start..start + self.mic_len
    }
}

/// The link-layer security state of one interface.
///
/// Holds the key, device and key-lookup tables, the cipher and the
/// configuration behind a single lock. Every method takes the lock for its
/// whole duration, including the cipher work, so it must not be called while
/// the same thread holds a [`TableGuard`].
pub struct SecurityContext<O, R: RawMutex = DefaultRawMutex> {
    state: Mutex<R, State<O>>,
}

impl<O: CipherOps> SecurityContext<O, DefaultRawMutex> {
    /// Creates a new `SecurityContext` with empty tables and the default
    /// configuration.
    pub fn new(ops: O) -> SecurityContext<O, DefaultRawMutex> {
        SecurityContext::with_config(ops, Config::default())
    }
}

impl<O: CipherOps, R: RawMutex> SecurityContext<O, R> {
    /// Creates a new `SecurityContext` with empty tables, using the lock
    /// type `R`.
    pub fn with_config(ops: O, config: Config) -> SecurityContext<O, R> {
        SecurityContext {
            state: Mutex::new(State {
                cipher: Cipher::new(ops),
                config,
                tables: Tables::new(),
            }),
        }
    }

    /// Secures an outgoing frame in place.
    ///
    /// Appends the auxiliary security header to the MAC header, writes the
    /// encrypted MIC to `mic` and encrypts the payload, all according to the
    /// configured security level and key identifier mode.
    ///
    /// # Arguments
    /// * `header` - Buffer holding the MAC header, with room for the
    ///   auxiliary security header behind it.
    /// * `header_len` - The length of the MAC header.
    /// * `payload` - The payload, encrypted in place.
    /// * `mic` - Receives the MIC, must hold at least the level's MIC size.
    /// * `src_address` - The long address of this interface, in network
    ///   byte order.
    pub fn encrypt(
        &self,
        header: &mut [u8],
        header_len: usize,
        payload: &mut [u8],
        mic: &mut [u8],
        src_address: &[u8; 8],
    ) -> Result<Secured> {
        let mut guard = self.state.lock();
        let State {
            cipher,
            config,
            tables,
        } = &mut *guard;

        let level = config.security_level;
        if level == SecurityLevel::None {
            log::trace!("Security level none, sending in the clear");
            return Ok(Secured {
                header_len,
                mic_len: 0,
            });
        }

        let mhr = header.get(..header_len).ok_or(Error::InvalidFrame)?;
        let dst = frame::destination(mhr)?;
        let query = match config.key_id_mode {
            KeyIdMode::Implicit => KeyQuery::Implicit {
                pan: dst.pan.unwrap_or(config.pan_id),
                addr: dst.addr.as_ref(),
            },
            key_id_mode => KeyQuery::Explicit {
                key_id_mode,
                key_index: config.key_index,
                key_source: &config.key_source,
            },
        };
        let key_slot = tables.find_key(&query).ok_or(Error::NoKey)?;

        let mut aux = AuxHeader {
            level,
            key_id_mode: config.key_id_mode,
            frame_counter: 0,
            key_index: config.key_index,
            key_source: config.key_source,
        };
        let mic_len = level.mic_len();
        let secured_len = header_len + aux.len();
        if header.len() < secured_len || mic.len() < mic_len {
            return Err(Error::BufferTooSmall);
        }
        ccm::check_lengths(secured_len, payload.len())?;

        let entry = tables
            .keys
            .get_mut(key_slot.index())
            .ok_or(Error::NoKey)?;
        aux.frame_counter = entry
            .reserve_frame_counter()
            .ok_or(Error::FrameCounterOverflow)?;
        cipher.set_key(&entry.key);
        log::trace!(
            "Securing frame with key {} and counter {}",
            key_slot.index(),
            aux.frame_counter
        );

        aux.write(&mut header[header_len..])?;
        let adata = &header[..secured_len];
        let nonce = ccm::nonce(src_address, aux.frame_counter, level.bits());
        let mut engine = Ccm::new(cipher, nonce);
        if mic_len > 0 {
            let mut tag = engine.compute_mic(mic_len, adata, payload)?;
            engine.crypt_mic(&mut tag[..mic_len]);
            mic[..mic_len].copy_from_slice(&tag[..mic_len]);
        }
        if level.encrypts() {
            engine.crypt_payload(payload);
        }

        Ok(Secured {
            header_len: secured_len,
            mic_len,
        })
    }

    /// Unsecures an incoming frame in place.
    ///
    /// `frame` is the whole frame: MAC header, auxiliary security header,
    /// payload and MIC. On success the payload is decrypted and verified and
    /// the returned layout tells where it is.
    ///
    /// # Arguments
    /// * `frame` - The frame, decrypted in place.
    /// * `header_len` - The length of the MAC header.
    pub fn decrypt(
        &self,
        frame: &mut [u8],
        header_len: usize,
    ) -> Result<Unsecured> {
        let aux = AuxHeader::read(
            frame.get(header_len..).ok_or(Error::InvalidFrame)?,
        )?;
        let secured_len = header_len + aux.len();
        let level = aux.level;
        if level == SecurityLevel::None {
            log::trace!("Frame has security level none");
            return Ok(Unsecured {
                header_len: secured_len,
                payload_len: frame.len() - secured_len,
                mic_len: 0,
            });
        }

        let mic_len = level.mic_len();
        let payload_len = frame
            .len()
            .checked_sub(secured_len + mic_len)
            .ok_or(Error::InvalidFrame)?;
        ccm::check_lengths(secured_len, payload_len)?;

        let mut guard = self.state.lock();
        let State {
            cipher,
            config,
            tables,
        } = &mut *guard;

        let src = frame::source(&frame[..header_len])?;
        let pan = src.pan.unwrap_or(config.pan_id);
        let query = match aux.key_id_mode {
            KeyIdMode::Implicit => KeyQuery::Implicit {
                pan,
                addr: src.addr.as_ref(),
            },
            key_id_mode => KeyQuery::Explicit {
                key_id_mode,
                key_index: aux.key_index,
                key_source: &aux.key_source,
            },
        };
        let key_slot = tables.find_key(&query).ok_or(Error::NoKey)?;
        let key = tables.keys.get(key_slot.index()).ok_or(Error::NoKey)?;

        let (dev_slot, nonce_address) = if config.replay_protection {
            let addr = src.addr.ok_or(Error::NoDev)?;
            let dev_slot = tables.find_dev(pan, &addr).ok_or(Error::NoDev)?;
            if !key.is_member(dev_slot) {
                return Err(Error::NoDev);
            }
            let dev = tables
                .devices
                .get(dev_slot.index())
                .ok_or(Error::NoDev)?;
            // Accepting u32::MAX would leave no next counter to expect
            if aux.frame_counter < dev.frame_counter
                || aux.frame_counter == u32::MAX
            {
                return Err(Error::FrameCounterError);
            }
            (Some(dev_slot), dev.long_addr)
        } else {
            match src.addr {
                Some(Address::Long(long)) => (None, long),
                _ => return Err(Error::Unsupported),
            }
        };
        cipher.set_key(&key.key);
        log::trace!(
            "Unsecuring frame with key {} and counter {}",
            key_slot.index(),
            aux.frame_counter
        );

        let (adata, rest) = frame.split_at_mut(secured_len);
        let (payload, received_mic) = rest.split_at_mut(payload_len);
        let nonce = ccm::nonce(&nonce_address, aux.frame_counter, level.bits());
        let mut engine = Ccm::new(cipher, nonce);
        engine.crypt_mic(received_mic);
        if level.encrypts() {
            engine.crypt_payload(payload);
        }
        if mic_len > 0 {
            let tag = engine.compute_mic(mic_len, adata, payload)?;
            if !ccm::tags_match(&tag[..mic_len], received_mic) {
                return Err(Error::MacCheckFailure);
            }
        }

        // Only authentic frames move the replay window
        if let Some(dev) =
            dev_slot.and_then(|d| tables.devices.get_mut(d.index()))
        {
            dev.frame_counter = aux.frame_counter + 1;
        }

        Ok(Unsecured {
            header_len: secured_len,
            payload_len,
            mic_len,
        })
    }

    /// Adds a key, returning the slot of an existing entry with the same
    /// material instead of adding it twice.
    ///
    /// Returns `None` if the key table is full.
    pub fn add_key(&self, key: &[u8; KEY_LEN]) -> Option<KeySlot> {
        let slot = self.state.lock().tables.add_key(key);
        log::debug!("Added key {:?}", slot);

        slot
    }

    /// Adds a peer device, returning the slot of an identical existing
    /// entry instead of adding it twice.
    ///
    /// Returns `None` if the device table is full.
    ///
    /// # Arguments
    /// * `pan_id` - The PAN the device belongs to.
    /// * `short_addr` - The short address of the device.
    /// * `long_addr` - The long address of the device, in network byte
    ///   order.
    pub fn add_dev(
        &self,
        pan_id: u16,
        short_addr: u16,
        long_addr: &[u8; 8],
    ) -> Option<DevSlot> {
        let slot = self
            .state
            .lock()
            .tables
            .add_dev(pan_id, short_addr, long_addr);
        log::debug!(
            "Added device {:?} with PAN {:#06x} short {:#06x}",
            slot,
            pan_id,
            short_addr
        );

        slot
    }

    /// Adds a rule selecting `key` for frames without key identifier to or
    /// from `dev`, addressed in `addr_mode`.
    ///
    /// Returns `None` if the table is full, the key or device slot is free,
    /// `addr_mode` is `Void` or the same rule already selects another key.
    pub fn add_key_lookup_implicit(
        &self,
        key: KeySlot,
        dev: DevSlot,
        addr_mode: AddrMode,
    ) -> Option<LookupSlot> {
        let selector = KeySelector::Implicit { dev, addr_mode };
        let slot = self.state.lock().tables.add_key_lookup(key, selector);
        log::debug!("Added implicit key lookup {:?} for {:?}", slot, dev);

        slot
    }

    /// Adds a rule selecting `key` for frames carrying the given key
    /// identifier.
    ///
    /// Only the first 0, 4 or 8 bytes of `key_source` are used, depending
    /// on `key_id_mode`. Returns `None` if the table is full, the key slot
    /// is free, `key_id_mode` is `Implicit` or the identifier already
    /// selects another key.
    pub fn add_key_lookup_explicit(
        &self,
        key: KeySlot,
        key_id_mode: KeyIdMode,
        key_index: u8,
        key_source: &[u8; 8],
    ) -> Option<LookupSlot> {
        let selector =
            KeySelector::explicit(key_id_mode, key_index, key_source)?;
        let slot = self.state.lock().tables.add_key_lookup(key, selector);
        log::debug!(
            "Added explicit key lookup {:?} for index {}",
            slot,
            key_index
        );

        slot
    }

    /// Removes a key along with every key-lookup rule selecting it.
    ///
    /// Returns whether there was a key in the slot.
    pub fn remove_key(&self, key: KeySlot) -> bool {
        let removed = self.state.lock().tables.remove_key(key);
        log::debug!("Removed key {:?}: {}", key, removed);

        removed
    }

    /// Removes a device, its key memberships and the implicit key-lookup
    /// rules naming it.
    ///
    /// Returns whether there was a device in the slot.
    pub fn remove_dev(&self, dev: DevSlot) -> bool {
        let removed = self.state.lock().tables.remove_dev(dev);
        log::debug!("Removed device {:?}: {}", dev, removed);

        removed
    }

    /// Returns whether there was a rule in the slot.
    pub fn remove_key_lookup(&self, lookup: LookupSlot) -> bool {
        let removed = self.state.lock().tables.remove_key_lookup(lookup);
        log::debug!("Removed key lookup {:?}: {}", lookup, removed);

        removed
    }

    /// Replaces the material of a key.
    ///
    /// Restarts the key's outgoing frame counter and the incoming frame
    /// counters of the devices peered with it. Fails with `NoKey` if the
    /// slot is free and with `Unsupported` if another slot already holds
    /// `material`.
    pub fn update_key(
        &self,
        key: KeySlot,
        material: &[u8; KEY_LEN],
    ) -> Result<()> {
        self.state.lock().tables.update_key(key, material)?;
        log::debug!("Updated key {:?}", key);

        Ok(())
    }

    /// Peers a device with the key selected by a key-lookup rule.
    ///
    /// The device leaves every other key and its incoming frame counter
    /// restarts. Fails with `NoKey` if the rule doesn't exist, `NoDev` if
    /// the device doesn't exist and `NoPeer` if the rule is an implicit one
    /// for another device.
    ///
    /// No pairing exchange takes place, the devices are assumed to agree on
    /// the key already.
    pub fn peer_dev(&self, lookup: LookupSlot, dev: DevSlot) -> Result<()> {
        self.state.lock().tables.peer_dev(lookup, dev)?;
        log::debug!("Peered device {:?} through {:?}", dev, lookup);

        Ok(())
    }

    /// Returns the current configuration.
    pub fn config(&self) -> Config {
        self.state.lock().config
    }

    /// Replaces the configuration, which applies from the next frame on.
    pub fn set_config(&self, config: Config) {
        log::debug!("New configuration {:?}", config);
        self.state.lock().config = config;
    }

    /// Sets the next outgoing frame counter of a key.
    pub fn set_key_frame_counter(
        &self,
        key: KeySlot,
        frame_counter: u32,
    ) -> Result<()> {
        let mut guard = self.state.lock();
        let entry = guard
            .tables
            .keys
            .get_mut(key.index())
            .ok_or(Error::NoKey)?;
        entry.frame_counter = frame_counter;

        Ok(())
    }

    /// Returns the next outgoing frame counter of a key.
    pub fn key_frame_counter(&self, key: KeySlot) -> Option<u32> {
        self.state
            .lock()
            .tables
            .keys
            .get(key.index())
            .map(KeyEntry::frame_counter)
    }

    /// Returns the lowest frame counter accepted from a device.
    pub fn dev_frame_counter(&self, dev: DevSlot) -> Option<u32> {
        self.state
            .lock()
            .tables
            .devices
            .get(dev.index())
            .map(DeviceEntry::frame_counter)
    }

    /// Finds the device with address `addr` in PAN `pan`.
    pub fn find_dev(&self, pan: u16, addr: &Address) -> Option<DevSlot> {
        self.state.lock().tables.find_dev(pan, addr)
    }

    /// Takes the lock for a scan over the tables.
    ///
    /// The lock is held until the guard is released or dropped.
    pub fn iterator_acquire(&self) -> TableGuard<'_, O, R> {
        TableGuard {
            guard: self.state.lock(),
        }
    }

    /// Runs `f` on the cipher device, holding the lock meanwhile.
    pub fn with_cipher_ops<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut O) -> T,
    {
        f(self.state.lock().cipher.ops_mut())
    }
}

/// Read access to the tables while holding the lock of a
/// [`SecurityContext`].
pub struct TableGuard<'a, O, R: RawMutex> {
    guard: MutexGuard<'a, R, State<O>>,
}

impl<'a, O, R: RawMutex> TableGuard<'a, O, R> {
    /// Returns the first occupied key slot after `prev`, starting from the
    /// beginning if `prev` is `None`.
    pub fn key_iterator(&self, prev: Option<KeySlot>) -> Option<KeySlot> {
        let tables = &self.guard.tables;
        tables
            .keys
            .next(prev.map(KeySlot::index))
            .map(|i| KeySlot(i as u8))
    }

    /// Returns the first occupied device slot after `prev`, starting from
    /// the beginning if `prev` is `None`.
    pub fn dev_iterator(&self, prev: Option<DevSlot>) -> Option<DevSlot> {
        let tables = &self.guard.tables;
        tables
            .devices
            .next(prev.map(DevSlot::index))
            .map(|i| DevSlot(i as u8))
    }

    /// Returns the first occupied key-lookup slot after `prev`, starting
    /// from the beginning if `prev` is `None`.
    pub fn key_lookup_iterator(
        &self,
        prev: Option<LookupSlot>,
    ) -> Option<LookupSlot> {
        let tables = &self.guard.tables;
        tables
            .lookups
            .next(prev.map(LookupSlot::index))
            .map(|i| LookupSlot(i as u8))
    }

    /// Returns the key in `slot`, if there is one.
    pub fn key(&self, slot: KeySlot) -> Option<&KeyEntry> {
        self.guard.tables.keys.get(slot.index())
    }

    /// Returns the device in `slot`, if there is one.
    pub fn device(&self, slot: DevSlot) -> Option<&DeviceEntry> {
        self.guard.tables.devices.get(slot.index())
    }

    /// Returns the key-lookup rule in `slot`, if there is one.
    pub fn key_lookup(&self, slot: LookupSlot) -> Option<&LookupEntry> {
        self.guard.tables.lookups.get(slot.index())
    }

    /// Iterates over the keys in slot order.
    pub fn keys(&self) -> impl Iterator<Item = (KeySlot, &KeyEntry)> + '_ {
        self.guard
            .tables
            .keys
            .iter()
            .map(|(i, e)| (KeySlot(i as u8), e))
    }

    /// Iterates over the devices in slot order.
    pub fn devices(
        &self,
    ) -> impl Iterator<Item = (DevSlot, &DeviceEntry)> + '_ {
        self.guard
            .tables
            .devices
            .iter()
            .map(|(i, e)| (DevSlot(i as u8), e))
    }

    /// Iterates over the key-lookup rules in slot order.
    pub fn key_lookups(
        &self,
    ) -> impl Iterator<Item = (LookupSlot, &LookupEntry)> + '_ {
        self.guard
            .tables
            .lookups
            .iter()
            .map(|(i, e)| (LookupSlot(i as u8), e))
    }

    /// Releases the lock.
    pub fn release(self) {}
}
