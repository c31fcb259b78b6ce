//! Fixed-capacity tables with stable slot indices.

/// The slot of a key in the key table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeySlot(pub(crate) u8);

/// The slot of a device in the device table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DevSlot(pub(crate) u8);

/// The slot of a rule in the key-lookup table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupSlot(pub(crate) u8);

impl KeySlot {
    /// Returns the position of the slot in its table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl DevSlot {
    /// Returns the position of the slot in its table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl LookupSlot {
    /// Returns the position of the slot in its table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A table of `N` entries with an occupancy bitmap.
///
/// Entries are placed in the lowest free slot and stay there until they are
/// removed, so a slot index identifies an entry for its whole lifetime.
/// `N` is at most 32.
#[derive(Clone, Debug)]
pub(crate) struct Slots<T, const N: usize> {
    used: u32,
    entries: [T; N],
}

impl<T: Copy + Default, const N: usize> Slots<T, N> {
    /// Creates an empty table.
    pub fn new() -> Slots<T, N> {
        Slots {
            used: 0,
            entries: [T::default(); N],
        }
    }

    /// Whether slot `i` holds an entry.
    pub fn is_used(&self, i: usize) -> bool {
        i < N && self.used & (1 << i) != 0
    }

    /// Returns the entry in slot `i`, if there is one.
    pub fn get(&self, i: usize) -> Option<&T> {
        if self.is_used(i) {
            Some(&self.entries[i])
        } else {
            None
        }
    }

    /// Returns the entry in slot `i` mutably, if there is one.
    pub fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        if self.is_used(i) {
            Some(&mut self.entries[i])
        } else {
            None
        }
    }

    /// Stores `entry` in the lowest free slot and returns its index, or
    /// `None` if the table is full.
    pub fn insert(&mut self, entry: T) -> Option<usize> {
        let i = (0..N).find(|&i| !self.is_used(i))?;
        self.entries[i] = entry;
        self.used |= 1 << i;

        Some(i)
    }

    /// Frees slot `i` and returns the entry it held.
    pub fn remove(&mut self, i: usize) -> Option<T> {
        if !self.is_used(i) {
            return None;
        }
        self.used &= !(1 << i);

        Some(core::mem::take(&mut self.entries[i]))
    }

    /// Returns the first occupied slot after `prev`, or the first occupied
    /// slot at all if `prev` is `None`.
    pub fn next(&self, prev: Option<usize>) -> Option<usize> {
        let start = prev.map_or(0, |p| p + 1);
        (start..N).find(|&i| self.is_used(i))
    }

    /// Returns the lowest occupied slot whose entry satisfies `predicate`.
    pub fn position<P>(&self, mut predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter().find(|(_, e)| predicate(*e)).map(|(i, _)| i)
    }

    /// Iterates over the occupied slots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(move |(i, _)| self.used & (1 << *i) != 0)
    }

    /// Iterates mutably over the occupied slots in ascending order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> + '_ {
        let used = self.used;
        self.entries
            .iter_mut()
            .enumerate()
            .filter(move |(i, _)| used & (1 << *i) != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn first_fit() {
        let mut slots: Slots<u8, 3> = Slots::new();
        assert_eq!(Some(0), slots.insert(10));
        assert_eq!(Some(1), slots.insert(11));
        assert_eq!(Some(2), slots.insert(12));
        assert_eq!(None, slots.insert(13));
        assert_eq!(3, slots.iter().count());

        // The freed hole is reused, others keep their slot
        assert_eq!(Some(11), slots.remove(1));
        assert_eq!(None, slots.remove(1));
        assert_eq!(None, slots.get(1));
        assert_eq!(Some(&12), slots.get(2));
        assert_eq!(Some(1), slots.insert(14));
        assert_eq!(Some(&14), slots.get(1));
    }

    #[test]
    fn out_of_range() {
        let mut slots: Slots<u8, 2> = Slots::new();
        assert!(!slots.is_used(2));
        assert!(!slots.is_used(31));
        assert_eq!(None, slots.get(5));
        assert_eq!(None, slots.get_mut(5));
        assert_eq!(None, slots.remove(5));
    }

    #[test]
    fn restartable_iteration() {
        let mut slots: Slots<u8, 5> = Slots::new();
        for v in 0..5 {
            slots.insert(v);
        }
        slots.remove(0);
        slots.remove(3);

        assert_eq!(Some(1), slots.next(None));
        assert_eq!(Some(2), slots.next(Some(1)));
        assert_eq!(Some(4), slots.next(Some(2)));
        assert_eq!(None, slots.next(Some(4)));

        let values: Vec<(usize, u8)> =
            slots.iter().map(|(i, v)| (i, *v)).collect();
        assert_eq!(vec![(1, 1), (2, 2), (4, 4)], values);

        for (_, v) in slots.iter_mut() {
            *v *= 2;
        }
        assert_eq!(Some(4), slots.position(|v| *v == 8));
        assert_eq!(None, slots.position(|v| *v == 0));

        let empty: Slots<u8, 5> = Slots::new();
        assert_eq!(None, empty.next(None));
    }
}
