//! Persistence of automata into byte sequences.
//!
//! The layout is little endian and carries no version information, so a byte
//! sequence should be read by the same version of the crate that wrote it.
use std::collections::VecDeque;

use log::debug;

use crate::automaton::{DoubleArrayAhoCorasick, KeyLength};
use crate::errors::{AcdatError, Result};
use crate::mapper::CodeMapper;
use crate::unit::KeyUnit;
use crate::{utils, DoubleArray, ROOT_STATE};

const MAGIC: &[u8; 4] = b"ACDT";

/// Values that can be written into and restored from byte sequences.
pub trait Serializable: Sized {
    /// Appends the serialized value to `dest`.
    fn serialize_to_vec(&self, dest: &mut Vec<u8>);

    /// Restores a value from the head of `source`, returning the remaining bytes.
    ///
    /// # Errors
    ///
    /// [`AcdatError`] will be returned when `source` does not start with a valid value.
    fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])>;
}

macro_rules! impl_serializable_int {
    ($($t:ty),*) => {
        $(
            impl Serializable for $t {
                #[inline]
                fn serialize_to_vec(&self, dest: &mut Vec<u8>) {
                    dest.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])> {
                    let (head, rest) = utils::split(source, std::mem::size_of::<$t>())?;
                    let mut bytes = [0; std::mem::size_of::<$t>()];
                    bytes.copy_from_slice(head);
                    Ok((<$t>::from_le_bytes(bytes), rest))
                }
            }
        )*
    };
}

impl_serializable_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl Serializable for bool {
    fn serialize_to_vec(&self, dest: &mut Vec<u8>) {
        dest.push(u8::from(*self));
    }

    fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])> {
        match utils::read_u8(source)? {
            (0, rest) => Ok((false, rest)),
            (1, rest) => Ok((true, rest)),
            _ => Err(AcdatError::deserialize("invalid boolean value.")),
        }
    }
}

impl Serializable for char {
    fn serialize_to_vec(&self, dest: &mut Vec<u8>) {
        u32::from(*self).serialize_to_vec(dest);
    }

    fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])> {
        let (code, rest) = u32::deserialize_from_slice(source)?;
        let c = char::from_u32(code)
            .ok_or_else(|| AcdatError::deserialize("invalid character value."))?;
        Ok((c, rest))
    }
}

impl Serializable for () {
    fn serialize_to_vec(&self, _dest: &mut Vec<u8>) {}

    fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])> {
        Ok(((), source))
    }
}

impl Serializable for Vec<u8> {
    fn serialize_to_vec(&self, dest: &mut Vec<u8>) {
        utils::write_u32(dest, self.len() as u32);
        dest.extend_from_slice(self);
    }

    fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])> {
        let (len, rest) = utils::read_u32(source)?;
        let (bytes, rest) = utils::split(rest, len as usize)?;
        Ok((bytes.to_vec(), rest))
    }
}

impl Serializable for String {
    fn serialize_to_vec(&self, dest: &mut Vec<u8>) {
        utils::write_u32(dest, self.len() as u32);
        dest.extend_from_slice(self.as_bytes());
    }

    fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])> {
        let (bytes, rest) = Vec::<u8>::deserialize_from_slice(source)?;
        let s = String::from_utf8(bytes)
            .map_err(|_| AcdatError::deserialize("invalid UTF-8 string value."))?;
        Ok((s, rest))
    }
}

impl<T: Serializable> Serializable for Option<T> {
    fn serialize_to_vec(&self, dest: &mut Vec<u8>) {
        match self {
            Some(x) => {
                dest.push(1);
                x.serialize_to_vec(dest);
            }
            None => dest.push(0),
        }
    }

    fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])> {
        match utils::read_u8(source)? {
            (0, rest) => Ok((None, rest)),
            (1, rest) => {
                let (x, rest) = T::deserialize_from_slice(rest)?;
                Ok((Some(x), rest))
            }
            _ => Err(AcdatError::deserialize("invalid option tag.")),
        }
    }
}

impl<U, V> DoubleArrayAhoCorasick<U, V>
where
    U: KeyUnit,
    V: Serializable,
{
    /// Serializes the automaton into a [`Vec`].
    ///
    /// # Examples
    ///
    /// ```
    /// use acdat::CharwiseAutomaton;
    ///
    /// let pma = CharwiseAutomaton::with_values([("世界", 0u32), ("国民", 1)]).unwrap();
    ///
    /// let bytes = pma.serialize_to_vec();
    /// let (other, _) = CharwiseAutomaton::<u32>::deserialize_from_slice(&bytes).unwrap();
    ///
    /// assert_eq!(other.exact_match("国民"), Some(&1));
    /// ```
    pub fn serialize_to_vec(&self) -> Vec<u8> {
        let mut dest = vec![];
        dest.extend_from_slice(MAGIC);
        dest.push(U::TAG);
        self.mapper.serialize_into(&mut dest);
        utils::write_u32(&mut dest, self.size as u32);
        utils::write_i32s(&mut dest, &self.da.base);
        utils::write_i32s(&mut dest, &self.da.check);
        utils::write_u32s(&mut dest, &self.fail);

        let id_size = utils::pack_size(self.values.len() as u32);
        dest.push(id_size);
        for ids in &self.output {
            let ids = ids.as_deref().unwrap_or(&[]);
            utils::write_u32(&mut dest, ids.len() as u32);
            for &id in ids {
                utils::pack_u32(&mut dest, id, id_size);
            }
        }

        utils::write_u32(&mut dest, self.values.len() as u32);
        for (len, value) in self.key_lens.iter().zip(&self.values) {
            utils::write_u32(&mut dest, len.units);
            utils::write_u32(&mut dest, len.bytes);
            value.serialize_to_vec(&mut dest);
        }
        dest
    }

    /// Deserializes an automaton from a byte sequence written by
    /// [`Self::serialize_to_vec`], returning the remaining bytes.
    ///
    /// # Errors
    ///
    /// [`AcdatError`] will be returned when `source` is truncated, was written for
    /// another unit type, or is inconsistent.
    pub fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])> {
        let (magic, source) = utils::split(source, MAGIC.len())?;
        if magic != MAGIC {
            return Err(AcdatError::deserialize("missing magic number."));
        }
        let (tag, source) = utils::read_u8(source)?;
        if tag != U::TAG {
            return Err(AcdatError::deserialize("unit type mismatch."));
        }
        let (mapper, source) = CodeMapper::deserialize_from_slice(source)?;
        let (size, source) = utils::read_u32(source)?;
        let (base, source) = utils::read_i32s(source)?;
        let (check, source) = utils::read_i32s(source)?;
        let (fail, source) = utils::read_u32s(source)?;

        let (id_size, mut source) = utils::read_u8(source)?;
        if !(1..=4).contains(&id_size) {
            return Err(AcdatError::deserialize("invalid id size."));
        }
        let mut output = Vec::with_capacity(fail.len());
        for _ in 0..fail.len() {
            let (len, rest) = utils::read_u32(source)?;
            source = rest;
            if len == 0 {
                output.push(None);
                continue;
            }
            let mut ids = Vec::with_capacity((len as usize).min(source.len()));
            for _ in 0..len {
                let (id, rest) = utils::unpack_u32(source, id_size)?;
                ids.push(id);
                source = rest;
            }
            output.push(Some(ids.into_boxed_slice()));
        }

        let (num_keys, mut source) = utils::read_u32(source)?;
        let mut key_lens = vec![];
        let mut values = vec![];
        for _ in 0..num_keys {
            let (units, rest) = utils::read_u32(source)?;
            let (bytes, rest) = utils::read_u32(rest)?;
            let (value, rest) = V::deserialize_from_slice(rest)?;
            key_lens.push(KeyLength { units, bytes });
            values.push(value);
            source = rest;
        }

        let da = DoubleArray { base, check };
        verify::<U>(&da, &mapper, &fail, &output, &key_lens, size as usize)?;
        debug!(
            "deserialized automaton with {} keys and {} states",
            values.len(),
            size
        );

        let pma = Self::from_parts(mapper, da, fail, output, key_lens, values, size as usize);
        Ok((pma, source))
    }
}

/// Checks the bounds that scanning relies on.
fn verify<U: KeyUnit>(
    da: &DoubleArray,
    mapper: &CodeMapper,
    fail: &[u32],
    output: &[Option<Box<[u32]>>],
    key_lens: &[KeyLength],
    size: usize,
) -> Result<()> {
    let num_states = fail.len();
    let num_keys = key_lens.len();
    if da.base.len() != da.check.len()
        || num_states == 0
        || da.base.len() < num_states
        || output.len() != num_states
    {
        return Err(AcdatError::deserialize("inconsistent array lengths."));
    }
    if num_states < size {
        return Err(AcdatError::deserialize("size exceeds the arrays."));
    }
    for (idx, (&base, &check)) in da.base.iter().zip(&da.check).enumerate() {
        if check != 0 && num_states <= idx {
            return Err(AcdatError::deserialize("state is out of range."));
        }
        if base < 0 && num_keys <= (-(base + 1)) as usize {
            return Err(AcdatError::deserialize("key id is out of range."));
        }
    }
    if fail.iter().any(|&f| num_states <= f as usize) {
        return Err(AcdatError::deserialize("failure state is out of range."));
    }
    if output
        .iter()
        .flatten()
        .flat_map(|ids| ids.iter())
        .any(|&id| num_keys <= id as usize)
    {
        return Err(AcdatError::deserialize("key id is out of range."));
    }

    let lens = walk_trie::<U>(da, mapper, num_states)?;
    for (state, len) in lens.iter().enumerate() {
        let Some(len) = len else {
            continue;
        };
        if let Some(id) = da.accepted_id(state as u32) {
            if key_lens[id as usize] != *len {
                return Err(AcdatError::deserialize("key length disagrees with the trie."));
            }
        }
        for &id in output[state].as_deref().unwrap_or(&[]) {
            let key_len = key_lens[id as usize];
            if len.units < key_len.units || len.bytes < key_len.bytes {
                return Err(AcdatError::deserialize("output is longer than its state."));
            }
        }
        if state == ROOT_STATE as usize {
            continue;
        }
        match lens[fail[state] as usize] {
            Some(f) if f.units < len.units && f.bytes <= len.bytes => {}
            _ => return Err(AcdatError::deserialize("failure link is inconsistent.")),
        }
    }
    Ok(())
}

/// Computes the length of the path to every state reachable from the root.
///
/// A state reached twice means the arrays do not encode a tree.
fn walk_trie<U: KeyUnit>(
    da: &DoubleArray,
    mapper: &CodeMapper,
    num_states: usize,
) -> Result<Vec<Option<KeyLength>>> {
    let unit_bytes = mapper
        .raw_codes()
        .into_iter()
        .map(|raw| U::from_code(raw).map(|u| u.len_bytes() as u32))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| AcdatError::deserialize("invalid unit code."))?;

    let mut lens = vec![None; num_states];
    lens[ROOT_STATE as usize] = Some(KeyLength::default());
    let mut queue = VecDeque::from([(ROOT_STATE, KeyLength::default())]);
    while let Some((state, len)) = queue.pop_front() {
        for (code, &nbytes) in unit_bytes.iter().enumerate() {
            let Some(child) = da.child(state, code as u32 + 1) else {
                continue;
            };
            let slot = &mut lens[child as usize];
            if slot.is_some() {
                return Err(AcdatError::deserialize("state has more than one parent."));
            }
            let child_len = KeyLength {
                units: len.units + 1,
                bytes: len
                    .bytes
                    .checked_add(nbytes)
                    .ok_or_else(|| AcdatError::deserialize("key is too long."))?,
            };
            *slot = Some(child_len);
            queue.push_back((child, child_len));
        }
    }
    Ok(lens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BytewiseAutomaton, CharwiseAutomaton};

    fn triples<V: Clone>(pma: &CharwiseAutomaton<V>, text: &str) -> Vec<(usize, usize, V)> {
        pma.scan_all(text)
            .iter()
            .map(|h| (h.begin(), h.end(), h.value().clone()))
            .collect()
    }

    #[test]
    fn test_round_trip() {
        let keys = ["hers", "his", "she", "he"];
        let records = keys.iter().map(|&k| (k, k.to_string()));
        let pma = CharwiseAutomaton::with_values(records).unwrap();

        let mut bytes = pma.serialize_to_vec();
        bytes.extend_from_slice(b"tail");
        let (other, rest) = CharwiseAutomaton::<String>::deserialize_from_slice(&bytes)
            .unwrap();

        assert_eq!(rest, b"tail");
        assert_eq!(other.size(), pma.size());
        for text in ["uhers", "ushers", "his hershe", ""] {
            assert_eq!(triples(&pma, text), triples(&other, text));
        }
        for (i, text) in ["uhers", "ushers"].iter().enumerate() {
            let a = pma.scan_all(*text);
            let b = other.scan_all(*text);
            assert_eq!(a, b, "case {i}");
        }
    }

    #[test]
    fn test_round_trip_empty() {
        let pma = BytewiseAutomaton::<u32>::with_values(Vec::<(&[u8], u32)>::new()).unwrap();
        let bytes = pma.serialize_to_vec();
        let (other, rest) = BytewiseAutomaton::<u32>::deserialize_from_slice(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(other.size(), 0);
        assert!(other.scan_all(b"uhers").is_empty());
    }

    #[test]
    fn test_unit_mismatch() {
        let pma = CharwiseAutomaton::new(["a"]).unwrap();
        let bytes = pma.serialize_to_vec();
        assert!(matches!(
            BytewiseAutomaton::<bool>::deserialize_from_slice(&bytes),
            Err(AcdatError::Deserialize(_))
        ));
    }

    #[test]
    fn test_tampered_key_length() {
        let pma = CharwiseAutomaton::<()>::with_values([("ab", ())]).unwrap();
        let bytes = pma.serialize_to_vec();
        assert!(CharwiseAutomaton::<()>::deserialize_from_slice(&bytes).is_ok());

        // The last key is followed by its units and bytes, and `()` takes no bytes.
        let n = bytes.len();
        for (offset, len) in [(n - 8, 1000u32), (n - 8, 1), (n - 4, 1000), (n - 4, 1)] {
            let mut tampered = bytes.clone();
            tampered[offset..offset + 4].copy_from_slice(&len.to_le_bytes());
            assert!(matches!(
                CharwiseAutomaton::<()>::deserialize_from_slice(&tampered),
                Err(AcdatError::Deserialize(_))
            ));
        }
    }

    #[test]
    fn test_verify_states() {
        let pma = CharwiseAutomaton::new(["he", "she"]).unwrap();
        let verify_with = |fail: &[u32]| {
            let mut output = pma.output.clone();
            output.resize(fail.len(), None);
            verify::<char>(&pma.da, &pma.mapper, fail, &output, &pma.key_lens, pma.size)
        };
        assert!(verify_with(&pma.fail).is_ok());

        let mut longer = pma.fail.clone();
        longer.resize(pma.da.len() + 1, ROOT_STATE);
        assert!(verify_with(&longer).is_err());

        let mut she = ROOT_STATE;
        for c in "she".chars() {
            let code = pma.mapper.get(u32::from(c)).unwrap();
            she = pma.da.child(she, code + 1).unwrap();
        }
        let mut looped = pma.fail.clone();
        looped[she as usize] = she;
        assert!(verify_with(&looped).is_err());

        let mut output = pma.output.clone();
        output[pma.fail[she as usize] as usize] = Some(vec![1].into_boxed_slice());
        assert!(verify::<char>(
            &pma.da,
            &pma.mapper,
            &pma.fail,
            &output,
            &pma.key_lens,
            pma.size
        )
        .is_err());
    }

    #[test]
    fn test_truncated() {
        let pma = CharwiseAutomaton::with_values([("ab", 1u64), ("bc", 2)]).unwrap();
        let bytes = pma.serialize_to_vec();
        for len in 0..bytes.len() {
            assert!(CharwiseAutomaton::<u64>::deserialize_from_slice(&bytes[..len]).is_err());
        }
    }

    #[test]
    fn test_values() {
        let mut bytes = vec![];
        (-5i32).serialize_to_vec(&mut bytes);
        true.serialize_to_vec(&mut bytes);
        'あ'.serialize_to_vec(&mut bytes);
        Some("x".to_string()).serialize_to_vec(&mut bytes);
        None::<u8>.serialize_to_vec(&mut bytes);

        let (a, rest) = i32::deserialize_from_slice(&bytes).unwrap();
        let (b, rest) = bool::deserialize_from_slice(rest).unwrap();
        let (c, rest) = char::deserialize_from_slice(rest).unwrap();
        let (d, rest) = Option::<String>::deserialize_from_slice(rest).unwrap();
        let (e, rest) = Option::<u8>::deserialize_from_slice(rest).unwrap();
        assert_eq!((a, b, c, d, e), (-5, true, 'あ', Some("x".to_string()), None));
        assert!(rest.is_empty());

        assert!(bool::deserialize_from_slice(&[2]).is_err());
    }
}
