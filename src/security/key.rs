use crate::ccm::KEY_LEN;

use super::slots::DevSlot;

/// A key and its outgoing frame counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyEntry {
    pub(crate) key: [u8; KEY_LEN],
    pub(crate) frame_counter: u32,
    /// The device slots peered with this key.
    pub(crate) members: u32,
}

impl KeyEntry {
    /// Creates an entry with a zero counter and no members.
    pub(crate) fn new(key: &[u8; KEY_LEN]) -> KeyEntry {
        KeyEntry {
            key: *key,
            frame_counter: 0,
            members: 0,
        }
    }

    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Returns the next frame counter an outgoing frame will carry.
    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    /// Whether `dev` is peered with this key.
    pub fn is_member(&self, dev: DevSlot) -> bool {
        self.members & (1 << dev.index()) != 0
    }

    /// Iterates over the devices peered with this key.
    pub fn members(&self) -> impl Iterator<Item = DevSlot> {
        let members = self.members;
        (0..32u8).filter(move |i| members & (1 << *i) != 0).map(DevSlot)
    }

    pub(crate) fn add_member(&mut self, dev: DevSlot) {
        self.members |= 1 << dev.index();
    }

    pub(crate) fn remove_member(&mut self, dev: DevSlot) {
        self.members &= !(1 << dev.index());
    }

    /// Returns the current counter and advances it, failing if it's
    /// exhausted.
    pub(crate) fn reserve_frame_counter(&mut self) -> Option<u32> {
        let counter = self.frame_counter;
        self.frame_counter = counter.checked_add(1)?;

        Some(counter)
    }
}
