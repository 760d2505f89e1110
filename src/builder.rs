//! Builder of [`DoubleArrayAhoCorasick`].
mod compactor;
mod failure;
mod graph;

use log::debug;

use crate::automaton::{DoubleArrayAhoCorasick, KeyLength};
use crate::errors::{AcdatError, Result};
use crate::mapper::CodeMapper;
use crate::unit::{KeyUnit, UnitSequence};
use crate::{MAX_CAPACITY, MAX_NUM_KEYS};

use compactor::Compactor;
use failure::build_failure_links;
use graph::TrieGraph;

const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Builder of [`DoubleArrayAhoCorasick`].
///
/// # Examples
///
/// ```
/// use acdat::{Builder, CharwiseAutomaton};
///
/// let pma: CharwiseAutomaton<u32> = Builder::new()
///     .initial_capacity(64)
///     .build([("space", 1), ("keyword", 2), ("ch", 3)])
///     .unwrap();
///
/// assert!(pma.matches("  ch"));
/// ```
#[derive(Clone, Debug)]
pub struct Builder {
    initial_capacity: usize,
    max_capacity: usize,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Creates a new builder with the default configuration.
    pub const fn new() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_capacity: MAX_CAPACITY,
        }
    }

    /// Sets the number of array slots allocated before arrangement.
    pub const fn initial_capacity(mut self, n: usize) -> Self {
        self.initial_capacity = n;
        self
    }

    /// Sets the maximum number of array slots.
    ///
    /// Building fails with [`ScaleError`](crate::errors::ScaleError) when the
    /// arrangement needs more. The value is capped at `i32::MAX`.
    pub fn max_capacity(mut self, n: usize) -> Self {
        self.max_capacity = n.min(MAX_CAPACITY);
        self
    }

    /// Builds an automaton from key-value pairs.
    ///
    /// When a key appears more than once, the last value is kept.
    ///
    /// # Errors
    ///
    /// [`AcdatError`] will be returned when
    ///
    /// - `records` contains an empty key,
    /// - the number of distinct keys exceeds `i32::MAX`, or
    /// - the arrangement needs more slots than the maximum capacity.
    pub fn build<U, I, K, V>(self, records: I) -> Result<DoubleArrayAhoCorasick<U, V>>
    where
        U: KeyUnit,
        I: IntoIterator<Item = (K, V)>,
        K: UnitSequence<U>,
    {
        let mut keys = vec![];
        let mut values = vec![];
        for (key, value) in records {
            let mut codes = vec![];
            let mut len_bytes = 0;
            for unit in key.units() {
                codes.push(unit.code());
                len_bytes += unit.len_bytes();
            }
            if codes.is_empty() {
                return Err(AcdatError::input("keys must not contain an empty key."));
            }
            keys.push((codes, len_bytes as u32));
            values.push(value);
        }

        let mapper = CodeMapper::new(&make_freqs(&keys));
        debug!(
            "building automaton from {} keys over {} distinct units",
            keys.len(),
            mapper.alphabet_size()
        );

        let mut graph = TrieGraph::new();
        let mut key_lens = vec![];
        let mut kept_values = Vec::with_capacity(values.len());
        for ((codes, len_bytes), value) in keys.into_iter().zip(values) {
            let value_id = kept_values.len() as u32;
            let mapped = codes.iter().map(|&c| mapper.get(c).unwrap_or_default());
            match graph.insert(mapped, value_id) {
                Ok(node_id) => {
                    if MAX_NUM_KEYS <= kept_values.len() {
                        return Err(AcdatError::scale("number of keys", MAX_NUM_KEYS));
                    }
                    key_lens.push(KeyLength {
                        units: graph.node(node_id).depth,
                        bytes: len_bytes,
                    });
                    kept_values.push(value);
                }
                Err(existing) => kept_values[existing as usize] = value,
            }
        }

        let slack = mapper.alphabet_size() as usize + 1;
        let compacted = Compactor::new(&graph, kept_values.len(), self.max_capacity)
            .compact(self.initial_capacity, slack)?;
        debug!(
            "arranged {} trie nodes into {} slots (allocated {}, {} vacant)",
            graph.len(),
            compacted.size,
            compacted.capacity,
            compacted.da.num_vacants()
        );

        let links = build_failure_links(
            &graph,
            &compacted.da,
            &compacted.state_ids,
            compacted.size,
        );
        drop(graph);
        debug!(
            "resolved failure links with {} output states",
            links.output.iter().filter(|o| o.is_some()).count()
        );

        Ok(DoubleArrayAhoCorasick::from_parts(
            mapper,
            compacted.da,
            links.fail,
            links.output,
            key_lens,
            kept_values,
            compacted.size,
        ))
    }

    /// Builds an automaton from keys, associating `true` with each of them.
    ///
    /// # Errors
    ///
    /// See [`Builder::build`].
    pub fn build_keys<U, I, K>(self, keys: I) -> Result<DoubleArrayAhoCorasick<U, bool>>
    where
        U: KeyUnit,
        I: IntoIterator<Item = K>,
        K: UnitSequence<U>,
    {
        self.build(keys.into_iter().map(|k| (k, true)))
    }
}

fn make_freqs(keys: &[(Vec<u32>, u32)]) -> Vec<u32> {
    let mut freqs = vec![];
    for (codes, _) in keys {
        for &c in codes {
            let c = c as usize;
            if freqs.len() <= c {
                freqs.resize(c + 1, 0);
            }
            freqs[c] += 1;
        }
    }
    freqs
}
