//! The key, device and key-lookup tables and the references between them.
//!
//! Every member bit of a key names an occupied device slot, every rule names
//! an occupied key slot and every implicit rule an occupied device slot.
//! Removals cascade to keep it that way.

use super::{
    config::{MAX_DEVICES, MAX_KEYS, MAX_KEY_LOOKUPS},
    device::DeviceEntry,
    error::Error,
    frame::{AddrMode, Address},
    key::KeyEntry,
    lookup::{KeyQuery, KeySelector, LookupEntry},
    slots::{DevSlot, KeySlot, LookupSlot, Slots},
    Result,
};
use crate::ccm::KEY_LEN;

pub(crate) struct Tables {
    pub keys: Slots<KeyEntry, MAX_KEYS>,
    pub devices: Slots<DeviceEntry, MAX_DEVICES>,
    pub lookups: Slots<LookupEntry, MAX_KEY_LOOKUPS>,
}

impl Tables {
    pub fn new() -> Tables {
        Tables {
            keys: Slots::new(),
            devices: Slots::new(),
            lookups: Slots::new(),
        }
    }

    pub fn add_key(&mut self, key: &[u8; KEY_LEN]) -> Option<KeySlot> {
        let i = match self.keys.position(|e| e.key == *key) {
            Some(i) => i,
            None => self.keys.insert(KeyEntry::new(key))?,
        };

        Some(KeySlot(i as u8))
    }

    pub fn add_dev(
        &mut self,
        pan_id: u16,
        short_addr: u16,
        long_addr: &[u8; 8],
    ) -> Option<DevSlot> {
        let dev = DeviceEntry::new(pan_id, short_addr, long_addr);
        let i = match self.devices.position(|e| e.same_identity(&dev)) {
            Some(i) => i,
            None => self.devices.insert(dev)?,
        };

        Some(DevSlot(i as u8))
    }

    pub fn add_key_lookup(
        &mut self,
        key: KeySlot,
        selector: KeySelector,
    ) -> Option<LookupSlot> {
        if !self.keys.is_used(key.index()) {
            return None;
        }
        if let KeySelector::Implicit { dev, addr_mode } = selector {
            let void = addr_mode == AddrMode::Void;
            if void || !self.devices.is_used(dev.index()) {
                return None;
            }
        }

        // A selector maps to at most one key
        let i = match self.lookups.position(|e| e.selector == selector) {
            Some(i) if self.lookups.get(i)?.key == key => i,
            Some(_) => return None,
            None => self.lookups.insert(LookupEntry { key, selector })?,
        };

        Some(LookupSlot(i as u8))
    }

    /// Removes the key and every rule selecting it.
    pub fn remove_key(&mut self, key: KeySlot) -> bool {
        if self.keys.remove(key.index()).is_none() {
            return false;
        }
        self.remove_lookups_where(|e| e.key == key);

        true
    }

    /// Removes the device, its key memberships and the implicit rules
    /// naming it.
    pub fn remove_dev(&mut self, dev: DevSlot) -> bool {
        if self.devices.remove(dev.index()).is_none() {
            return false;
        }
        for (_, key) in self.keys.iter_mut() {
            key.remove_member(dev);
        }
        self.remove_lookups_where(|e| e.dev() == Some(dev));

        true
    }

    pub fn remove_key_lookup(&mut self, lookup: LookupSlot) -> bool {
        self.lookups.remove(lookup.index()).is_some()
    }

    fn remove_lookups_where<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&LookupEntry) -> bool,
    {
        let mut prev = None;
        while let Some(i) = self.lookups.next(prev) {
            if self.lookups.get(i).map_or(false, |e| predicate(e)) {
                self.lookups.remove(i);
            }
            prev = Some(i);
        }
    }

    /// Replaces the key material, restarting its outgoing counter and the
    /// incoming counters of its members.
    ///
    /// Material already held by another slot is refused with
    /// `Unsupported`.
    pub fn update_key(
        &mut self,
        key: KeySlot,
        material: &[u8; KEY_LEN],
    ) -> Result<()> {
        if !self.keys.is_used(key.index()) {
            return Err(Error::NoKey);
        }
        let holder = self.keys.position(|e| e.key == *material);
        if holder.map_or(false, |i| i != key.index()) {
            return Err(Error::Unsupported);
        }

        let entry = self.keys.get_mut(key.index()).ok_or(Error::NoKey)?;
        entry.key = *material;
        entry.frame_counter = 0;
        let members = *entry;

        for dev in members.members() {
            if let Some(dev) = self.devices.get_mut(dev.index()) {
                dev.frame_counter = 0;
            }
        }

        Ok(())
    }

    /// Makes `dev` a member of the key selected by `lookup`, and of no other
    /// key.
    pub fn peer_dev(&mut self, lookup: LookupSlot, dev: DevSlot) -> Result<()> {
        let rule = *self.lookups.get(lookup.index()).ok_or(Error::NoKey)?;
        if !self.devices.is_used(dev.index()) {
            return Err(Error::NoDev);
        }
        if rule.dev().map_or(false, |d| d != dev) {
            return Err(Error::NoPeer);
        }

        for (_, key) in self.keys.iter_mut() {
            key.remove_member(dev);
        }
        self.keys
            .get_mut(rule.key.index())
            .ok_or(Error::NoKey)?
            .add_member(dev);
        if let Some(dev) = self.devices.get_mut(dev.index()) {
            dev.frame_counter = 0;
        }

        Ok(())
    }

    /// Returns the key of the first rule matching `query`.
    pub fn find_key(&self, query: &KeyQuery) -> Option<KeySlot> {
        self.lookups
            .iter()
            .find(|(_, e)| e.matches(query, &self.devices))
            .map(|(_, e)| e.key)
    }

    pub fn find_dev(&self, pan: u16, addr: &Address) -> Option<DevSlot> {
        self.devices
            .position(|d| d.matches(pan, addr))
            .map(|i| DevSlot(i as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{config::KeyIdMode, test_vectors::*};
    use super::*;

    fn implicit(dev: DevSlot) -> KeySelector {
        KeySelector::Implicit {
            dev,
            addr_mode: AddrMode::Long,
        }
    }

    fn index(key_index: u8) -> KeySelector {
        KeySelector::explicit(KeyIdMode::Index, key_index, &[0; 8]).unwrap()
    }

    #[test]
    fn deduplication() {
        let mut tables = Tables::new();
        let key = tables.add_key(&KEY).unwrap();
        assert_eq!(Some(key), tables.add_key(&KEY));
        assert_eq!(1, tables.keys.iter().count());

        let dev = tables.add_dev(PAN_ID, SHORT_A, &ADDRESS_A).unwrap();
        assert_eq!(Some(dev), tables.add_dev(PAN_ID, SHORT_A, &ADDRESS_A));
        // Any differing field makes a new device
        assert_ne!(Some(dev), tables.add_dev(PAN_ID, SHORT_B, &ADDRESS_A));
        assert_eq!(2, tables.devices.iter().count());

        let rule = tables.add_key_lookup(key, implicit(dev)).unwrap();
        assert_eq!(Some(rule), tables.add_key_lookup(key, implicit(dev)));
        assert_ne!(Some(rule), tables.add_key_lookup(key, index(1)));
        assert_eq!(2, tables.lookups.iter().count());
    }

    #[test]
    fn dangling_references_are_refused() {
        let mut tables = Tables::new();
        assert_eq!(None, tables.add_key_lookup(KeySlot(0), index(0)));

        let key = tables.add_key(&KEY).unwrap();
        assert_eq!(None, tables.add_key_lookup(key, implicit(DevSlot(0))));
        let dev = tables.add_dev(PAN_ID, SHORT_A, &ADDRESS_A).unwrap();
        assert_eq!(
            None,
            tables.add_key_lookup(
                key,
                KeySelector::Implicit {
                    dev,
                    addr_mode: AddrMode::Void
                }
            )
        );
        assert!(tables.add_key_lookup(key, implicit(dev)).is_some());
    }

    #[test]
    fn exhaustion() {
        let mut tables = Tables::new();
        for i in 0..MAX_KEYS {
            assert_eq!(Some(KeySlot(i as u8)), tables.add_key(&[i as u8; 16]));
        }
        assert_eq!(None, tables.add_key(&[0xFF; 16]));

        for i in 0..MAX_DEVICES {
            assert!(tables.add_dev(PAN_ID, i as u16, &ADDRESS_A).is_some());
        }
        assert_eq!(None, tables.add_dev(PAN_ID, 0xFFFF, &ADDRESS_A));

        for i in 0..MAX_KEY_LOOKUPS {
            let rule = tables.add_key_lookup(KeySlot(0), index(i as u8));
            assert!(rule.is_some());
        }
        assert_eq!(None, tables.add_key_lookup(KeySlot(0), index(0xFF)));

        // Nothing was disturbed
        assert_eq!(MAX_KEYS, tables.keys.iter().count());
        assert_eq!(MAX_DEVICES, tables.devices.iter().count());
        assert_eq!(MAX_KEY_LOOKUPS, tables.lookups.iter().count());
        assert_eq!(&[2; 16], tables.keys.get(2).unwrap().key());
    }

    #[test]
    fn key_removal_cascades() {
        let mut tables = Tables::new();
        let key_1 = tables.add_key(&KEY).unwrap();
        let key_2 = tables.add_key(&[0x42; 16]).unwrap();
        let dev = tables.add_dev(PAN_ID, SHORT_A, &ADDRESS_A).unwrap();
        let rule_1 = tables.add_key_lookup(key_1, implicit(dev)).unwrap();
        let rule_2 = tables.add_key_lookup(key_2, index(0)).unwrap();
        let rule_3 = tables.add_key_lookup(key_1, index(1)).unwrap();
        tables.peer_dev(rule_1, dev).unwrap();

        assert!(tables.remove_key(key_1));
        assert!(!tables.remove_key(key_1));
        assert!(!tables.lookups.is_used(rule_1.index()));
        assert!(!tables.lookups.is_used(rule_3.index()));
        assert!(tables.lookups.is_used(rule_2.index()));
        assert!(tables.devices.is_used(dev.index()));
        assert!(!tables.remove_key_lookup(rule_1));
        assert!(tables.remove_key_lookup(rule_2));

        // A new key in the old slot starts without members
        let key_3 = tables.add_key(&[0x17; 16]).unwrap();
        assert_eq!(key_1, key_3);
        let entry = tables.keys.get(key_3.index()).unwrap();
        assert_eq!(0, entry.members().count());
    }

    #[test]
    fn device_removal_cascades() {
        let mut tables = Tables::new();
        let key = tables.add_key(&KEY).unwrap();
        let dev_a = tables.add_dev(PAN_ID, SHORT_A, &ADDRESS_A).unwrap();
        let dev_b = tables.add_dev(PAN_ID, SHORT_B, &ADDRESS_B).unwrap();
        let rule_a = tables.add_key_lookup(key, implicit(dev_a)).unwrap();
        let rule_b = tables.add_key_lookup(key, implicit(dev_b)).unwrap();
        let explicit = tables.add_key_lookup(key, index(0)).unwrap();
        tables.peer_dev(rule_a, dev_a).unwrap();
        tables.peer_dev(rule_b, dev_b).unwrap();

        assert!(tables.remove_dev(dev_a));
        assert!(!tables.remove_dev(dev_a));
        let entry = tables.keys.get(key.index()).unwrap();
        assert!(!entry.is_member(dev_a));
        assert!(entry.is_member(dev_b));
        assert!(!tables.lookups.is_used(rule_a.index()));
        assert!(tables.lookups.is_used(rule_b.index()));
        assert!(tables.lookups.is_used(explicit.index()));
    }

    #[test]
    fn peering() {
        let mut tables = Tables::new();
        let key_1 = tables.add_key(&KEY).unwrap();
        let key_2 = tables.add_key(&[0x42; 16]).unwrap();
        let dev_a = tables.add_dev(PAN_ID, SHORT_A, &ADDRESS_A).unwrap();
        let dev_b = tables.add_dev(PAN_ID, SHORT_B, &ADDRESS_B).unwrap();
        let rule_a = tables.add_key_lookup(key_1, implicit(dev_a)).unwrap();
        let group = tables.add_key_lookup(key_2, index(3)).unwrap();

        assert_eq!(Err(Error::NoKey), tables.peer_dev(LookupSlot(7), dev_a));
        assert_eq!(Err(Error::NoDev), tables.peer_dev(rule_a, DevSlot(7)));
        assert_eq!(Err(Error::NoPeer), tables.peer_dev(rule_a, dev_b));

        tables.devices.get_mut(dev_a.index()).unwrap().frame_counter = 9;
        assert_eq!(Ok(()), tables.peer_dev(rule_a, dev_a));
        assert!(tables.keys.get(key_1.index()).unwrap().is_member(dev_a));
        assert_eq!(0, tables.devices.get(dev_a.index()).unwrap().frame_counter);

        // Peering through another key drops the previous membership
        assert_eq!(Ok(()), tables.peer_dev(group, dev_a));
        assert!(!tables.keys.get(key_1.index()).unwrap().is_member(dev_a));
        assert!(tables.keys.get(key_2.index()).unwrap().is_member(dev_a));
        assert_eq!(Ok(()), tables.peer_dev(group, dev_b));
        assert!(tables.keys.get(key_2.index()).unwrap().is_member(dev_b));
    }

    #[test]
    fn key_update_resets_counters() {
        let mut tables = Tables::new();
        let key = tables.add_key(&KEY).unwrap();
        let dev_a = tables.add_dev(PAN_ID, SHORT_A, &ADDRESS_A).unwrap();
        let dev_b = tables.add_dev(PAN_ID, SHORT_B, &ADDRESS_B).unwrap();
        let rule = tables.add_key_lookup(key, index(0)).unwrap();
        tables.peer_dev(rule, dev_a).unwrap();
        tables.keys.get_mut(key.index()).unwrap().frame_counter = 100;
        tables.devices.get_mut(dev_a.index()).unwrap().frame_counter = 50;
        tables.devices.get_mut(dev_b.index()).unwrap().frame_counter = 50;

        assert_eq!(Ok(()), tables.update_key(key, &[0x99; 16]));
        let entry = tables.keys.get(key.index()).unwrap();
        assert_eq!(&[0x99; 16], entry.key());
        assert_eq!(0, entry.frame_counter());
        assert!(entry.is_member(dev_a));
        assert_eq!(0, tables.devices.get(dev_a.index()).unwrap().frame_counter);
        // Not a member, not affected
        let other = tables.devices.get(dev_b.index()).unwrap();
        assert_eq!(50, other.frame_counter);

        assert_eq!(Err(Error::NoKey), tables.update_key(KeySlot(3), &KEY));
    }

    #[test]
    fn key_update_keeps_material_unique() {
        let mut tables = Tables::new();
        let key_1 = tables.add_key(&KEY).unwrap();
        let key_2 = tables.add_key(&[0x42; 16]).unwrap();
        tables.keys.get_mut(key_2.index()).unwrap().frame_counter = 7;

        assert_eq!(Err(Error::Unsupported), tables.update_key(key_2, &KEY));
        let entry = tables.keys.get(key_2.index()).unwrap();
        assert_eq!(&[0x42; 16], entry.key());
        assert_eq!(7, entry.frame_counter());

        // Rewriting a key with its own material is a plain reset
        assert_eq!(Ok(()), tables.update_key(key_1, &KEY));
        assert_eq!(Some(key_1), tables.add_key(&KEY));
        assert_eq!(2, tables.keys.iter().count());
    }

    #[test]
    fn selector_maps_to_one_key() {
        let mut tables = Tables::new();
        let key_1 = tables.add_key(&KEY).unwrap();
        let key_2 = tables.add_key(&[0x42; 16]).unwrap();
        let dev = tables.add_dev(PAN_ID, SHORT_A, &ADDRESS_A).unwrap();

        let rule = tables.add_key_lookup(key_1, index(1)).unwrap();
        assert_eq!(None, tables.add_key_lookup(key_2, index(1)));
        assert_eq!(Some(rule), tables.add_key_lookup(key_1, index(1)));
        let implicit_rule =
            tables.add_key_lookup(key_1, implicit(dev)).unwrap();
        assert_eq!(None, tables.add_key_lookup(key_2, implicit(dev)));
        assert_eq!(2, tables.lookups.iter().count());

        assert_eq!(
            Some(key_1),
            tables.find_key(&KeyQuery::Explicit {
                key_id_mode: KeyIdMode::Index,
                key_index: 1,
                key_source: &[0; 8]
            })
        );

        // Once the rule is gone the selector is free for another key
        assert!(tables.remove_key_lookup(rule));
        assert!(tables.lookups.is_used(implicit_rule.index()));
        assert!(tables.add_key_lookup(key_2, index(1)).is_some());
        assert_eq!(
            Some(key_2),
            tables.find_key(&KeyQuery::Explicit {
                key_id_mode: KeyIdMode::Index,
                key_index: 1,
                key_source: &[0; 8]
            })
        );
    }

    #[test]
    fn lookups() {
        let mut tables = Tables::new();
        let key_1 = tables.add_key(&KEY).unwrap();
        let key_2 = tables.add_key(&[0x42; 16]).unwrap();
        let dev = tables.add_dev(PAN_ID, SHORT_A, &ADDRESS_A).unwrap();
        tables.add_key_lookup(key_1, implicit(dev)).unwrap();
        tables.add_key_lookup(key_2, index(5)).unwrap();

        let long_a = Address::Long(ADDRESS_A);
        assert_eq!(
            Some(key_1),
            tables.find_key(&KeyQuery::Implicit {
                pan: PAN_ID,
                addr: Some(&long_a)
            })
        );
        assert_eq!(
            Some(key_2),
            tables.find_key(&KeyQuery::Explicit {
                key_id_mode: KeyIdMode::Index,
                key_index: 5,
                key_source: &[0; 8]
            })
        );
        assert_eq!(
            None,
            tables.find_key(&KeyQuery::Explicit {
                key_id_mode: KeyIdMode::Index,
                key_index: 6,
                key_source: &[0; 8]
            })
        );

        assert_eq!(Some(dev), tables.find_dev(PAN_ID, &long_a));
        let short_a = Address::Short(SHORT_A);
        assert_eq!(Some(dev), tables.find_dev(PAN_ID, &short_a));
        assert_eq!(None, tables.find_dev(PAN_ID, &Address::Short(SHORT_B)));
    }
}
