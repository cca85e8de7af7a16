//! Per-decode storage for constructor arguments and settable properties.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::converter::Decoded;

/// One cell of a [`SlotStore`].
///
/// `Absent` and `Null` are different things: an absent slot was never seen in
/// the input, a null slot was written as an explicit null.
#[derive(Default)]
pub enum Slot {
    /// Nothing was stored.
    #[default]
    Absent,
    /// An explicit null was stored.
    Null,
    /// A decoded value was stored.
    Value(Box<dyn Any + Send>),
}

impl Slot {
    /// Whether nothing was stored here.
    pub const fn is_absent(&self) -> bool {
        matches!(self, Slot::Absent)
    }

    /// Whether an explicit null was stored here.
    pub const fn is_null(&self) -> bool {
        matches!(self, Slot::Null)
    }

    /// The decoded form of a present slot; `None` when absent.
    pub fn into_decoded(self) -> Option<Decoded> {
        match self {
            Slot::Absent => None,
            Slot::Null => Some(None),
            Slot::Value(value) => Some(Some(value)),
        }
    }
}

impl From<Decoded> for Slot {
    fn from(decoded: Decoded) -> Self {
        match decoded {
            Some(value) => Slot::Value(value),
            None => Slot::Null,
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Absent => f.write_str("Absent"),
            Slot::Null => f.write_str("Null"),
            Slot::Value(_) => f.write_str("Value(..)"),
        }
    }
}

/// Bitset over slot indices. One inline word covers the common case.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Presence {
    Inline(u64),
    Words(Vec<u64>),
}

impl Presence {
    const WORD_BITS: usize = 64;

    fn with_capacity(len: usize) -> Self {
        if len <= Self::WORD_BITS {
            Presence::Inline(0)
        } else {
            Presence::Words(alloc::vec![0; len.div_ceil(Self::WORD_BITS)])
        }
    }

    fn word(&self, index: usize) -> u64 {
        match self {
            Presence::Inline(word) => *word,
            Presence::Words(words) => words[index / Self::WORD_BITS],
        }
    }

    fn word_mut(&mut self, index: usize) -> &mut u64 {
        match self {
            Presence::Inline(word) => word,
            Presence::Words(words) => &mut words[index / Self::WORD_BITS],
        }
    }

    const fn mask(index: usize) -> u64 {
        1u64 << (index % Self::WORD_BITS)
    }

    fn contains(&self, index: usize) -> bool {
        self.word(index) & Self::mask(index) != 0
    }

    /// Mark `index`; returns whether it was previously unmarked.
    fn insert(&mut self, index: usize) -> bool {
        let word = self.word_mut(index);
        let fresh = *word & Self::mask(index) == 0;
        *word |= Self::mask(index);
        fresh
    }

    /// Unmark `index`; returns whether it was marked.
    fn remove(&mut self, index: usize) -> bool {
        let word = self.word_mut(index);
        let was_set = *word & Self::mask(index) != 0;
        *word &= !Self::mask(index);
        was_set
    }
}

/// Fixed-capacity, index-addressed storage for one decode call.
///
/// Keeps a presence bit per slot and a running count so that "every slot was
/// filled" is a single comparison.
pub struct SlotStore {
    cells: Vec<Slot>,
    present: Presence,
    count: usize,
}

impl SlotStore {
    /// A store of `len` absent slots.
    pub fn new(len: usize) -> Self {
        let mut cells = Vec::with_capacity(len);
        cells.resize_with(len, Slot::default);
        Self {
            cells,
            present: Presence::with_capacity(len),
            count: 0,
        }
    }

    /// Total number of slots.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the store has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of present slots.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Store a decoded value (or null). Overwriting a present slot does not
    /// change the count.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: Decoded) {
        self.cells[index] = Slot::from(value);
        if self.present.insert(index) {
            self.count += 1;
        }
    }

    /// The slot at `index`, [`Slot::Absent`] when out of bounds.
    pub fn get(&self, index: usize) -> &Slot {
        const ABSENT: &Slot = &Slot::Absent;
        self.cells.get(index).unwrap_or(ABSENT)
    }

    /// Whether a value (or null) was stored at `index`.
    pub fn contains(&self, index: usize) -> bool {
        index < self.cells.len() && self.present.contains(index)
    }

    /// Whether every slot is present.
    pub fn is_fully_initialized(&self) -> bool {
        self.count == self.cells.len()
    }

    /// Move the slot at `index` out, leaving it absent.
    pub fn take(&mut self, index: usize) -> Slot {
        let Some(cell) = self.cells.get_mut(index) else {
            return Slot::Absent;
        };
        if self.present.remove(index) {
            self.count -= 1;
        }
        core::mem::take(cell)
    }

    /// Split the store at `at`: `self` keeps `[0, at)`, the returned store
    /// holds the rest, re-indexed from zero.
    ///
    /// # Panics
    ///
    /// Panics if `at > self.len()`.
    pub fn split_off(&mut self, at: usize) -> SlotStore {
        let tail_cells = self.cells.split_off(at);
        let mut tail = SlotStore {
            present: Presence::with_capacity(tail_cells.len()),
            cells: tail_cells,
            count: 0,
        };
        for offset in 0..tail.cells.len() {
            if self.present.remove(at + offset) {
                self.count -= 1;
                tail.present.insert(offset);
                tail.count += 1;
            }
        }
        if self.cells.len() <= Presence::WORD_BITS
            && let Presence::Words(words) = &self.present
        {
            self.present = Presence::Inline(words.first().copied().unwrap_or(0));
        }
        tail
    }
}

impl fmt::Debug for SlotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotStore")
            .field("cells", &self.cells)
            .field("count", &self.count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<V: Any + Send>(v: V) -> Decoded {
        Some(Box::new(v))
    }

    #[test]
    fn absent_and_null_are_distinct() {
        let mut store = SlotStore::new(2);
        store.set(0, None);
        assert!(store.contains(0));
        assert!(store.get(0).is_null());
        assert!(!store.contains(1));
        assert!(store.get(1).is_absent());
    }

    #[test]
    fn count_increments_once_per_slot() {
        let mut store = SlotStore::new(2);
        store.set(0, value(1i64));
        store.set(0, value(2i64));
        assert_eq!(store.count(), 1);
        assert!(!store.is_fully_initialized());
        store.set(1, None);
        assert!(store.is_fully_initialized());
    }

    #[test]
    fn take_clears_presence() {
        let mut store = SlotStore::new(1);
        store.set(0, value(String::from("x")));
        let Slot::Value(taken) = store.take(0) else {
            panic!("expected a value");
        };
        assert_eq!(*taken.downcast::<String>().unwrap(), "x");
        assert!(!store.contains(0));
        assert_eq!(store.count(), 0);
        assert!(store.take(0).is_absent());
        assert!(store.take(7).is_absent());
    }

    #[test]
    fn empty_store_is_fully_initialized() {
        assert!(SlotStore::new(0).is_fully_initialized());
    }

    #[test]
    fn split_off_moves_tail_presence() {
        let mut store = SlotStore::new(4);
        store.set(0, value(1u8));
        store.set(2, None);
        store.set(3, value(3u8));
        let tail = store.split_off(2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.count(), 1);
        assert!(!store.is_fully_initialized());
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.count(), 2);
        assert!(tail.get(0).is_null());
        assert!(tail.contains(1));
    }

    #[test]
    fn large_stores_track_every_slot() {
        let mut store = SlotStore::new(130);
        for index in (0..130).step_by(3) {
            store.set(index, None);
        }
        assert_eq!(store.count(), 44);
        assert!(store.contains(129));
        assert!(!store.contains(128));
        let tail = store.split_off(64);
        assert_eq!(store.count(), 22);
        assert_eq!(tail.count(), 22);
        assert!(tail.contains(2));
        assert!(store.contains(63));
    }
}
