//! Acdat: Aho-Corasick over a Double-Array Trie
//!
//! Acdat is a library of multi-pattern exact string matching.
//! A fixed set of keys, each associated with a value, is compiled once into an
//! Aho-Corasick automaton encoded as a double-array trie. The automaton then reports
//! every occurrence of every key in an input, including overlapping and nested ones,
//! in a single pass over the input.
//!
//! # Data structures
//!
//! Acdat provides one automaton generic over the unit of keys:
//!
//! - [`CharwiseAutomaton`] matches sequences of characters.
//! - [`BytewiseAutomaton`] matches sequences of bytes.
//!
//! # Examples
//!
//! ## Finding all occurrences of keys in an input text
//!
//! To enumerate all occurrences, use [`DoubleArrayAhoCorasick::scan_all()`].
//!
//! ```
//! use acdat::CharwiseAutomaton;
//!
//! let records = vec![("hers", 0), ("his", 1), ("she", 2), ("he", 3)];
//! let pma = CharwiseAutomaton::with_values(records).unwrap();
//!
//! let hits: Vec<_> = pma
//!     .scan_all("uhers")
//!     .iter()
//!     .map(|h| (h.begin(), h.end(), *h.value()))
//!     .collect();
//!
//! assert_eq!(hits, vec![(1, 3, 3), (1, 5, 0)]);
//! ```
//!
//! ## Stopping a scan early
//!
//! A visitor passed to [`DoubleArrayAhoCorasick::scan()`] decides whether the scan
//! goes on.
//!
//! ```
//! use std::ops::ControlFlow;
//!
//! use acdat::CharwiseAutomaton;
//!
//! let pma = CharwiseAutomaton::new(["foo", "bar"]).unwrap();
//!
//! let mut count = 0;
//! pma.scan("sfwtfoowercwbarqwrcq", |_| {
//!     count += 1;
//!     ControlFlow::Break(())
//! });
//!
//! assert_eq!(count, 1);
//! ```
//!
//! ## Serializing and deserializing the data structure
//!
//! To serialize/deserialize the automaton into/from a byte sequence,
//! use [`DoubleArrayAhoCorasick::serialize_to_vec`]/[`DoubleArrayAhoCorasick::deserialize_from_slice`].
//!
//! ```
//! use acdat::BytewiseAutomaton;
//!
//! let records = [("space", 1u32), ("keyword", 2), ("ch", 3)];
//! let pma = BytewiseAutomaton::with_values(records.map(|(k, v)| (k.as_bytes(), v))).unwrap();
//!
//! let bytes = pma.serialize_to_vec();
//! let (other, rest) = BytewiseAutomaton::<u32>::deserialize_from_slice(&bytes).unwrap();
//!
//! assert!(rest.is_empty());
//! assert_eq!(pma.scan_all(b"a space ch"), other.scan_all(b"a space ch"));
//! ```
#![deny(missing_docs)]

#[cfg(target_pointer_width = "16")]
compile_error!("`target_pointer_width` must be larger than or equal to 32");

pub mod automaton;
mod builder;
pub mod errors;
mod mapper;
pub mod serializer;
pub mod unit;
mod utils;

use core::fmt;
use core::ops::Range;

pub(crate) const ROOT_STATE: u32 = 0;
pub(crate) const END_CODE: u32 = 0;
pub(crate) const MAX_CAPACITY: usize = i32::MAX as usize;
pub(crate) const MAX_NUM_KEYS: usize = i32::MAX as usize;

pub use automaton::{BytewiseAutomaton, CharwiseAutomaton, DoubleArrayAhoCorasick};
pub use builder::Builder;
pub use serializer::Serializable;
pub use unit::{KeyUnit, UnitSequence};

/// An occurrence of a key found in a haystack.
///
/// Positions are counted in units of the automaton, i.e., characters for
/// [`CharwiseAutomaton`] and bytes for [`BytewiseAutomaton`].
pub struct Hit<'a, V> {
    begin: usize,
    end: usize,
    begin_bytes: usize,
    end_bytes: usize,
    value: &'a V,
}

impl<'a, V> Hit<'a, V> {
    /// Starting position of the hit in units.
    #[inline(always)]
    pub const fn begin(&self) -> usize {
        self.begin
    }

    /// Ending position (exclusive) of the hit in units.
    #[inline(always)]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Range of the hit in units.
    #[inline(always)]
    pub const fn range(&self) -> Range<usize> {
        self.begin..self.end
    }

    /// Starting position of the hit in bytes if characters are encoded in UTF-8.
    #[inline(always)]
    pub const fn begin_bytes(&self) -> usize {
        self.begin_bytes
    }

    /// Ending position of the hit in bytes if characters are encoded in UTF-8.
    #[inline(always)]
    pub const fn end_bytes(&self) -> usize {
        self.end_bytes
    }

    /// Value associated with the matched key.
    #[inline(always)]
    pub const fn value(&self) -> &'a V {
        self.value
    }
}

impl<V> Clone for Hit<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Hit<'_, V> {}

impl<V: PartialEq> PartialEq for Hit<'_, V> {
    fn eq(&self, other: &Self) -> bool {
        self.begin == other.begin
            && self.end == other.end
            && self.begin_bytes == other.begin_bytes
            && self.end_bytes == other.end_bytes
            && self.value == other.value
    }
}

impl<V: Eq> Eq for Hit<'_, V> {}

impl<V: fmt::Debug> fmt::Debug for Hit<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hit")
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("value", self.value)
            .finish()
    }
}

/// Statistics of the data structure.
pub trait Statistics {
    /// Returns the total amount of heap used by the array arrangement in bytes.
    fn heap_bytes(&self) -> usize;

    /// Returns the number of reserved elements.
    fn num_elems(&self) -> usize;

    /// Returns the number of vacant elements.
    fn num_vacants(&self) -> usize;

    /// Returns the ratio of vacant elements.
    fn vacant_ratio(&self) -> f64 {
        self.num_vacants() as f64 / self.num_elems() as f64
    }
}

/// Two parallel arrays encoding a trie.
///
/// A transition with label `c` from state `s` goes to `t = base[s] + c`, which is
/// valid iff `check[t] == base[s]`. Since every BASE value is claimed by exactly one
/// state, the check value identifies the owner. A zero check marks a vacant slot.
/// A negative BASE value `b` marks a leaf holding the key id `-b - 1`.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub(crate) struct DoubleArray {
    pub(crate) base: Vec<i32>,
    pub(crate) check: Vec<i32>,
}

impl DoubleArray {
    #[inline(always)]
    pub(crate) fn child(&self, state: u32, label: u32) -> Option<u32> {
        let base = self.base[state as usize];
        if base <= 0 {
            return None;
        }
        let child = base as usize + label as usize;
        match self.check.get(child) {
            Some(&check) if check == base => Some(child as u32),
            _ => None,
        }
    }

    /// Returns the key id accepted exactly at `state`.
    #[inline(always)]
    pub(crate) fn accepted_id(&self, state: u32) -> Option<u32> {
        let leaf = self.child(state, END_CODE)?;
        let base = self.base[leaf as usize];
        if base < 0 {
            Some((-(base + 1)) as u32)
        } else {
            None
        }
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.base.len()
    }

    pub(crate) fn num_vacants(&self) -> usize {
        // The root occupies the slot 0 without a check value.
        self.check.iter().skip(1).filter(|&&c| c == 0).count()
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        (self.base.len() + self.check.len()) * std::mem::size_of::<i32>()
    }
}
