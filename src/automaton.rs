//! Aho-Corasick automaton on a double-array trie.
mod iter;

use std::marker::PhantomData;
use std::ops::ControlFlow;

pub use iter::FindOverlappingIterator;

use crate::builder::Builder;
use crate::errors::Result;
use crate::mapper::CodeMapper;
use crate::unit::{KeyUnit, UnitSequence};
use crate::{DoubleArray, Hit, Statistics, ROOT_STATE};

/// Automaton whose keys are sequences of characters.
pub type CharwiseAutomaton<V> = DoubleArrayAhoCorasick<char, V>;

/// Automaton whose keys are sequences of bytes.
pub type BytewiseAutomaton<V> = DoubleArrayAhoCorasick<u8, V>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct KeyLength {
    pub(crate) units: u32,
    pub(crate) bytes: u32,
}

/// Multi-pattern matching automaton implemented with the Aho-Corasick algorithm
/// and a double-array trie.
///
/// The automaton is immutable once built, so it can be shared across threads and
/// scanned concurrently.
///
/// # Build instructions
///
/// - [`DoubleArrayAhoCorasick::new`] builds an automaton from keys associated with `true`.
/// - [`DoubleArrayAhoCorasick::with_values`] builds an automaton from key-value pairs.
/// - [`Builder`] configures the arrangement.
#[derive(Clone)]
pub struct DoubleArrayAhoCorasick<U, V> {
    pub(crate) mapper: CodeMapper,
    pub(crate) da: DoubleArray,
    pub(crate) fail: Vec<u32>,
    pub(crate) output: Vec<Option<Box<[u32]>>>,
    pub(crate) key_lens: Vec<KeyLength>,
    pub(crate) values: Vec<V>,
    pub(crate) size: usize,
    pub(crate) max_key_len: usize,
    pub(crate) _unit: PhantomData<fn(U) -> U>,
}

impl<U: KeyUnit> DoubleArrayAhoCorasick<U, bool> {
    /// Creates a new automaton from input keys, associating `true` with each key.
    ///
    /// # Errors
    ///
    /// [`AcdatError`](crate::errors::AcdatError) will be returned when
    ///
    /// - `keys` contains an empty key, or
    /// - the scale of the resulting automaton exceeds the expected one.
    ///
    /// # Examples
    ///
    /// ```
    /// use acdat::CharwiseAutomaton;
    ///
    /// let pma = CharwiseAutomaton::new(["space", "keyword", "ch"]).unwrap();
    ///
    /// assert!(pma.matches("chkeyword"));
    /// assert!(!pma.matches("spac"));
    /// ```
    pub fn new<I, K>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: UnitSequence<U>,
    {
        Builder::new().build_keys(keys)
    }
}

impl<U: KeyUnit, V> DoubleArrayAhoCorasick<U, V> {
    /// Creates a new automaton from key-value pairs.
    ///
    /// A key given more than once keeps the last value.
    ///
    /// # Errors
    ///
    /// [`AcdatError`](crate::errors::AcdatError) will be returned when
    ///
    /// - `records` contains an empty key, or
    /// - the scale of the resulting automaton exceeds the expected one.
    ///
    /// # Examples
    ///
    /// ```
    /// use acdat::BytewiseAutomaton;
    ///
    /// let keys = ["hers", "his", "she", "he"];
    /// let pma = BytewiseAutomaton::with_values(keys.map(|k| (k.as_bytes(), k))).unwrap();
    ///
    /// assert_eq!(pma.num_keys(), 4);
    /// assert_eq!(pma.exact_match(b"she"), Some(&"she"));
    /// ```
    pub fn with_values<I, K>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: UnitSequence<U>,
    {
        Builder::new().build(records)
    }

    pub(crate) fn from_parts(
        mapper: CodeMapper,
        da: DoubleArray,
        fail: Vec<u32>,
        output: Vec<Option<Box<[u32]>>>,
        key_lens: Vec<KeyLength>,
        values: Vec<V>,
        size: usize,
    ) -> Self {
        let max_key_len = key_lens.iter().map(|l| l.units as usize).max().unwrap_or(0);
        Self {
            mapper,
            da,
            fail,
            output,
            key_lens,
            values,
            size,
            max_key_len,
            _unit: PhantomData,
        }
    }

    /// Returns the number of states in use, i.e., one past the largest occupied index.
    ///
    /// An automaton without keys has size zero.
    #[inline(always)]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of distinct keys.
    #[inline(always)]
    pub fn num_keys(&self) -> usize {
        self.values.len()
    }

    /// Returns the value of the key with the given id.
    ///
    /// Ids are assigned to distinct keys in order of first appearance.
    #[inline(always)]
    pub fn value(&self, id: usize) -> Option<&V> {
        self.values.get(id)
    }

    /// Returns the value associated with an input key if exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use acdat::CharwiseAutomaton;
    ///
    /// let pma = CharwiseAutomaton::with_values([("世界", 0), ("世界中", 1), ("国民", 2)]).unwrap();
    ///
    /// assert_eq!(pma.exact_match("世界中"), Some(&1));
    /// assert_eq!(pma.exact_match("日本中"), None);
    /// assert_eq!(pma.exact_match("世"), None);
    /// ```
    pub fn exact_match<S>(&self, key: &S) -> Option<&V>
    where
        S: UnitSequence<U> + ?Sized,
    {
        let mut state = ROOT_STATE;
        for unit in key.units() {
            let code = self.mapper.get(unit.code())?;
            state = self.da.child(state, code + 1)?;
        }
        let id = self.da.accepted_id(state)?;
        self.values.get(id as usize)
    }

    /// Returns an iterator of all occurrences of keys in a haystack.
    ///
    /// Hits are reported in increasing order of their ending positions, and hits
    /// sharing an ending position in decreasing order of their lengths.
    ///
    /// # Examples
    ///
    /// ```
    /// use acdat::CharwiseAutomaton;
    ///
    /// let pma = CharwiseAutomaton::with_values([("世界", 0), ("世界中", 1), ("界", 2)]).unwrap();
    ///
    /// let mut it = pma.find_overlapping_iter("全世界中");
    ///
    /// let h = it.next().unwrap();
    /// assert_eq!((1, 3, 3, 9, 0), (h.begin(), h.end(), h.begin_bytes(), h.end_bytes(), *h.value()));
    ///
    /// let h = it.next().unwrap();
    /// assert_eq!((2, 3, 2), (h.begin(), h.end(), *h.value()));
    ///
    /// let h = it.next().unwrap();
    /// assert_eq!((1, 4, 1), (h.begin(), h.end(), *h.value()));
    ///
    /// assert!(it.next().is_none());
    /// ```
    pub fn find_overlapping_iter<'a, S>(
        &'a self,
        haystack: &'a S,
    ) -> FindOverlappingIterator<'a, U, V, S::Units<'a>>
    where
        S: UnitSequence<U> + ?Sized,
    {
        FindOverlappingIterator::new(self, haystack.units())
    }

    /// Visits all occurrences of keys in a haystack.
    ///
    /// Hits are visited in the order of [`Self::find_overlapping_iter`].
    /// The scan stops as soon as the visitor returns [`ControlFlow::Break`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::ops::ControlFlow;
    ///
    /// use acdat::CharwiseAutomaton;
    ///
    /// let pma = CharwiseAutomaton::with_values([("foo", "foo"), ("bar", "bar")]).unwrap();
    ///
    /// let mut values = vec![];
    /// pma.scan("sfwtfoowercwbarqwrcq", |hit| {
    ///     values.push(*hit.value());
    ///     ControlFlow::Continue(())
    /// });
    ///
    /// assert_eq!(values, vec!["foo", "bar"]);
    /// ```
    pub fn scan<S, F>(&self, haystack: &S, mut visitor: F)
    where
        S: UnitSequence<U> + ?Sized,
        F: FnMut(Hit<'_, V>) -> ControlFlow<()>,
    {
        for hit in self.find_overlapping_iter(haystack) {
            if visitor(hit).is_break() {
                return;
            }
        }
    }

    /// Collects all occurrences of keys in a haystack.
    ///
    /// Hits are ordered as in [`Self::find_overlapping_iter`].
    pub fn scan_all<'a, S>(&'a self, haystack: &'a S) -> Vec<Hit<'a, V>>
    where
        S: UnitSequence<U> + ?Sized,
    {
        self.find_overlapping_iter(haystack).collect()
    }

    /// Checks if a haystack contains any key.
    ///
    /// # Examples
    ///
    /// ```
    /// use acdat::CharwiseAutomaton;
    ///
    /// let pma = CharwiseAutomaton::new(["space", "keyword", "ch"]).unwrap();
    ///
    /// assert!(pma.matches("oooospace2"));
    /// assert!(!pma.matches("c"));
    /// assert!(!pma.matches(""));
    /// ```
    pub fn matches<S>(&self, haystack: &S) -> bool
    where
        S: UnitSequence<U> + ?Sized,
    {
        self.find_overlapping_iter(haystack).next().is_some()
    }

    /// Finds the occurrence starting earliest, preferring the shorter one on ties.
    ///
    /// This is not always the first hit of [`Self::find_overlapping_iter`], which
    /// orders hits by their ending positions. With keys `abcd` and `bc`, scanning
    /// `abcd` reports `bc` first, while this method returns `abcd`.
    ///
    /// # Examples
    ///
    /// ```
    /// use acdat::CharwiseAutomaton;
    ///
    /// let pma = CharwiseAutomaton::with_values([("space", 1), ("keyword", 2), ("ch", 3)]).unwrap();
    ///
    /// let h = pma.find_first("a lot of garbage in the space ch").unwrap();
    /// assert_eq!((24, 29, 1), (h.begin(), h.end(), *h.value()));
    ///
    /// assert!(pma.find_first(" no pace").is_none());
    /// ```
    pub fn find_first<'a, S>(&'a self, haystack: &'a S) -> Option<Hit<'a, V>>
    where
        S: UnitSequence<U> + ?Sized,
    {
        let mut it = self.find_overlapping_iter(haystack);
        let mut first = it.next()?;
        while let Some(hit) = it.next_within(first.begin() + self.max_key_len) {
            if (hit.begin(), hit.end()) < (first.begin(), first.end()) {
                first = hit;
            }
        }
        Some(first)
    }

    /// Returns the state reached from `state` by a unit with the mapped code.
    #[inline(always)]
    pub(crate) fn next_state(&self, mut state: u32, code: Option<u32>) -> u32 {
        let Some(code) = code else {
            return ROOT_STATE;
        };
        let label = code + 1;
        loop {
            if let Some(next) = self.da.child(state, label) {
                return next;
            }
            if state == ROOT_STATE {
                return ROOT_STATE;
            }
            state = self.fail[state as usize];
        }
    }

    #[inline(always)]
    pub(crate) fn outputs(&self, state: u32) -> &[u32] {
        self.output[state as usize].as_deref().unwrap_or(&[])
    }
}

impl<U, V> Statistics for DoubleArrayAhoCorasick<U, V> {
    fn heap_bytes(&self) -> usize {
        self.mapper.heap_bytes()
            + self.da.heap_bytes()
            + self.fail.len() * std::mem::size_of::<u32>()
            + self.output.len() * std::mem::size_of::<Option<Box<[u32]>>>()
            + self
                .output
                .iter()
                .flatten()
                .map(|ids| ids.len() * std::mem::size_of::<u32>())
                .sum::<usize>()
            + self.key_lens.len() * std::mem::size_of::<KeyLength>()
            + self.values.len() * std::mem::size_of::<V>()
    }

    fn num_elems(&self) -> usize {
        self.da.len()
    }

    fn num_vacants(&self) -> usize {
        self.da.num_vacants()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::ops::Range;

    use proptest::collection::vec;
    use proptest::prelude::*;
    use proptest::sample::select;

    fn triples<V: Copy>(hits: &[Hit<'_, V>]) -> Vec<(usize, usize, V)> {
        hits.iter().map(|h| (h.begin(), h.end(), *h.value())).collect()
    }

    fn hers_his_she_he() -> CharwiseAutomaton<&'static str> {
        let keys = ["hers", "his", "she", "he"];
        CharwiseAutomaton::with_values(keys.iter().map(|&k| (k, k))).unwrap()
    }

    #[test]
    fn test_uhers() {
        let pma = hers_his_she_he();
        let text = "uhers";
        let hits = pma.scan_all(text);
        assert_eq!(triples(&hits), vec![(1, 3, "he"), (1, 5, "hers")]);
        for hit in &hits {
            assert_eq!(&&text[hit.range()], hit.value());
        }
    }

    #[test]
    fn test_nested_longest_first() {
        let pma = hers_his_she_he();
        let hits = pma.scan_all("ushers");
        assert_eq!(
            triples(&hits),
            vec![(1, 4, "she"), (2, 4, "he"), (2, 6, "hers")]
        );
    }

    #[test]
    fn test_matches() {
        let pma = CharwiseAutomaton::with_values([("space", 1), ("keyword", 2), ("ch", 3)])
            .unwrap();
        assert!(pma.matches("space"));
        assert!(pma.matches("keyword"));
        assert!(pma.matches("ch"));
        assert!(pma.matches("  ch"));
        assert!(pma.matches("chkeyword"));
        assert!(pma.matches("oooospace2"));
        assert!(!pma.matches("c"));
        assert!(!pma.matches(""));
        assert!(!pma.matches("spac"));
        assert!(!pma.matches("nothing"));
    }

    #[test]
    fn test_find_first() {
        let pma = CharwiseAutomaton::with_values([("space", 1), ("keyword", 2), ("ch", 3)])
            .unwrap();

        let hit = pma.find_first("space").unwrap();
        assert_eq!((hit.begin(), hit.end(), *hit.value()), (0, 5, 1));

        let hit = pma.find_first("a lot of garbage in the space ch").unwrap();
        assert_eq!((hit.begin(), hit.end(), *hit.value()), (24, 29, 1));

        assert!(pma.find_first("").is_none());
        assert!(pma.find_first("value").is_none());
        assert!(pma.find_first("keywork").is_none());
        assert!(pma.find_first(" no pace").is_none());
    }

    #[test]
    fn test_find_first_prefers_earliest_begin() {
        let pma = CharwiseAutomaton::with_values([("abcd", 0), ("c", 1), ("bc", 2)]).unwrap();
        let hit = pma.find_first("xabcd").unwrap();
        assert_eq!((hit.begin(), hit.end(), *hit.value()), (1, 5, 0));

        let pma = CharwiseAutomaton::with_values([("abcd", 0), ("bc", 1)]).unwrap();
        assert_eq!(*pma.scan_all("abcd")[0].value(), 1);
        let hit = pma.find_first("abcd").unwrap();
        assert_eq!((hit.begin(), hit.end(), *hit.value()), (0, 4, 0));

        let pma = CharwiseAutomaton::with_values([("ab", 0), ("abc", 1)]).unwrap();
        let hit = pma.find_first("abc").unwrap();
        assert_eq!((hit.begin(), hit.end(), *hit.value()), (0, 2, 0));
    }

    #[test]
    fn test_cancellation() {
        let pma = CharwiseAutomaton::with_values([("foo", "foo"), ("bar", "bar")]).unwrap();
        let haystack = "sfwtfoowercwbarqwrcq";

        let mut cancelled = 0;
        pma.scan(haystack, |_| {
            cancelled += 1;
            ControlFlow::Break(())
        });
        let mut counted = 0;
        pma.scan(haystack, |_| {
            counted += 1;
            ControlFlow::Continue(())
        });

        assert_eq!(cancelled, 1);
        assert_eq!(counted, 2);
    }

    #[test]
    fn test_cancellation_within_position() {
        let pma = hers_his_she_he();
        let mut visited = vec![];
        pma.scan("ushers", |hit| {
            visited.push(*hit.value());
            if *hit.value() == "she" {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(visited, vec!["she"]);
    }

    #[test]
    fn test_empty_keys() {
        let pma = CharwiseAutomaton::<u32>::with_values(Vec::<(&str, u32)>::new()).unwrap();
        assert_eq!(pma.size(), 0);
        assert_eq!(pma.num_keys(), 0);
        assert!(pma.scan_all("uhers").is_empty());
        assert!(pma.scan_all("").is_empty());
        assert!(!pma.matches("uhers"));
        assert!(pma.find_first("uhers").is_none());
        assert_eq!(pma.exact_match(""), None);
    }

    #[test]
    fn test_multibyte_offsets() {
        let pma = CharwiseAutomaton::new(["世界", "界中", "国民"]).unwrap();
        let text = "国民が世界中にて";
        let hits = pma.scan_all(text);
        let ranges: Vec<_> = hits
            .iter()
            .map(|h| (h.begin(), h.end(), h.begin_bytes(), h.end_bytes()))
            .collect();
        assert_eq!(ranges, vec![(0, 2, 0, 6), (3, 5, 9, 15), (4, 6, 12, 18)]);
        for hit in &hits {
            assert!(pma
                .exact_match(&text[hit.begin_bytes()..hit.end_bytes()])
                .is_some());
        }
    }

    #[test]
    fn test_unknown_units_reset() {
        let pma = CharwiseAutomaton::new(["abc"]).unwrap();
        assert!(!pma.matches("abxabzc"));
        assert_eq!(triples(&pma.scan_all("ab!abcabc")), vec![(3, 6, true), (6, 9, true)]);
    }

    #[test]
    fn test_bytewise() {
        let records = ["hers", "his", "she", "he"].map(|k| (k.as_bytes(), k));
        let pma = BytewiseAutomaton::with_values(records).unwrap();
        let bytes = b"uhers";
        let hits = pma.scan_all(bytes);
        assert_eq!(triples(&hits), vec![(1, 3, "he"), (1, 5, "hers")]);
        for hit in &hits {
            assert_eq!(&bytes[hit.range()], hit.value().as_bytes());
        }
        assert_eq!(pma.scan_all("uhers"), hits);
    }

    #[test]
    fn test_bytewise_multibyte() {
        let pma = BytewiseAutomaton::new(["界".as_bytes(), &[0xe7u8][..]]).unwrap();
        let hits = pma.scan_all("世界".as_bytes());
        let ranges: Vec<_> = hits.iter().map(|h| h.range()).collect();
        assert_eq!(ranges, vec![3..4, 3..6]);
    }

    #[test]
    fn test_idempotent() {
        let pma = hers_his_she_he();
        let text = "ushershishe";
        assert_eq!(pma.scan_all(text), pma.scan_all(text));
    }

    #[test]
    fn test_concurrent_scans() {
        let pma = hers_his_she_he();
        let expected = triples(&pma.scan_all("ushers his"));
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    assert_eq!(triples(&pma.scan_all("ushers his")), expected);
                });
            }
        });
    }

    #[test]
    fn test_statistics() {
        let pma = hers_his_she_he();
        assert!(pma.num_elems() >= pma.size());
        assert!(pma.num_vacants() < pma.num_elems());
        assert!(pma.heap_bytes() > 0);
    }

    fn naive_scan(keys: &[Vec<u8>], text: &[u8]) -> Vec<(usize, usize, Vec<u8>)> {
        let mut hits = vec![];
        for end in 1..=text.len() {
            for begin in 0..end {
                let sub = &text[begin..end];
                if keys.iter().any(|k| k == sub) {
                    hits.push((begin, end, sub.to_vec()));
                }
            }
        }
        hits
    }

    type CharHit = (usize, usize, usize, usize, String);

    fn naive_char_scan(keys: &[String], text: &str) -> Vec<CharHit> {
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain([text.len()])
            .collect();
        let mut hits = vec![];
        for end in 1..offsets.len() {
            for begin in 0..end {
                let sub = &text[offsets[begin]..offsets[end]];
                if keys.iter().any(|k| k == sub) {
                    hits.push((begin, end, offsets[begin], offsets[end], sub.to_string()));
                }
            }
        }
        hits
    }

    fn multibyte_string(len: Range<usize>) -> impl Strategy<Value = String> {
        vec(select(vec!['a', 'é', '世']), len)
            .prop_map(|cs| cs.into_iter().collect::<String>())
    }

    proptest! {
        #[test]
        fn prop_scan_all_equals_naive(
            keys in vec(vec(0u8..3, 1..5), 0..12),
            text in vec(0u8..4, 0..40),
        ) {
            let pma = BytewiseAutomaton::with_values(keys.iter().map(|k| (k, k.clone()))).unwrap();
            let hits: Vec<_> = pma
                .scan_all(&text)
                .iter()
                .map(|h| (h.begin(), h.end(), h.value().clone()))
                .collect();
            let expected = naive_scan(&keys, &text);
            prop_assert_eq!(&hits, &expected);

            prop_assert_eq!(pma.matches(&text), !expected.is_empty());

            let first = pma.find_first(&text).map(|h| (h.begin(), h.end(), h.value().clone()));
            let expected_first = expected.iter().min_by_key(|(b, e, _)| (*b, *e)).cloned();
            prop_assert_eq!(first, expected_first);

            for key in &keys {
                prop_assert_eq!(pma.exact_match(key), Some(key));
            }
        }

        #[test]
        fn prop_charwise_offsets(
            keys in vec(multibyte_string(1..4), 0..10),
            text in multibyte_string(0..30),
        ) {
            let pma = CharwiseAutomaton::with_values(keys.iter().map(|k| (k, k.clone()))).unwrap();
            let hits = pma.scan_all(&text);
            let found: Vec<CharHit> = hits
                .iter()
                .map(|h| (h.begin(), h.end(), h.begin_bytes(), h.end_bytes(), h.value().clone()))
                .collect();
            prop_assert_eq!(found, naive_char_scan(&keys, &text));
            for h in &hits {
                prop_assert_eq!(&text[h.begin_bytes()..h.end_bytes()], h.value().as_str());
            }
        }

        #[test]
        fn prop_serialize_round_trip(
            keys in vec(vec(0u8..5, 1..6), 1..10),
            text in vec(0u8..6, 0..40),
        ) {
            let pma = BytewiseAutomaton::with_values(keys.iter().map(|k| (k, k.clone()))).unwrap();
            let bytes = pma.serialize_to_vec();
            let (other, rest) = BytewiseAutomaton::<Vec<u8>>::deserialize_from_slice(&bytes)
                .unwrap();
            prop_assert!(rest.is_empty());
            prop_assert_eq!(pma.scan_all(&text), other.scan_all(&text));
        }
    }
}
