use crate::errors::{AcdatError, Result};
use crate::utils;

/// Marks a raw code that appears in no key.
pub const INVALID_CODE: u32 = u32::MAX;

/// Maps raw unit codes to dense codes, assigning smaller codes to more frequent units.
///
/// Mapped codes are a permutation of `0..alphabet_size`.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct CodeMapper {
    /// Mapped code indexed by raw code.
    table: Vec<u32>,
    alphabet_size: u32,
}

impl CodeMapper {
    pub fn new(freqs: &[u32]) -> Self {
        let sorted = {
            let mut sorted = vec![];
            for (c, &f) in freqs.iter().enumerate().filter(|&(_, &f)| f != 0) {
                sorted.push((c, f));
            }
            // Stable sort keeps ties in code order.
            sorted.sort_by(|(_, f1), (_, f2)| f2.cmp(f1));
            sorted
        };
        let mut table = vec![INVALID_CODE; freqs.len()];
        for (i, &(c, _)) in sorted.iter().enumerate() {
            table[c] = i as u32;
        }
        Self {
            table,
            alphabet_size: sorted.len() as u32,
        }
    }

    #[inline]
    pub const fn alphabet_size(&self) -> u32 {
        self.alphabet_size
    }

    #[inline(always)]
    pub fn get(&self, c: u32) -> Option<u32> {
        self.table
            .get(c as usize)
            .copied()
            .filter(|&code| code != INVALID_CODE)
    }

    /// Returns the raw code of each mapped code.
    pub fn raw_codes(&self) -> Vec<u32> {
        let mut raw_codes = vec![0; self.alphabet_size as usize];
        for (c, &code) in self.table.iter().enumerate() {
            if let Some(raw) = raw_codes.get_mut(code as usize) {
                *raw = c as u32;
            }
        }
        raw_codes
    }

    #[inline]
    pub fn heap_bytes(&self) -> usize {
        self.table.len() * std::mem::size_of::<u32>()
    }

    pub fn serialize_into(&self, dest: &mut Vec<u8>) {
        utils::write_u32s(dest, &self.table);
    }

    pub fn deserialize_from_slice(source: &[u8]) -> Result<(Self, &[u8])> {
        let (table, rest) = utils::read_u32s(source)?;
        let alphabet_size = table.iter().filter(|&&code| code != INVALID_CODE).count();
        let mut assigned = vec![false; alphabet_size];
        for &code in table.iter().filter(|&&code| code != INVALID_CODE) {
            match assigned.get_mut(code as usize) {
                Some(seen) if !*seen => *seen = true,
                _ => return Err(AcdatError::deserialize("mapped codes are not dense.")),
            }
        }
        let alphabet_size = alphabet_size as u32;
        Ok((
            Self {
                table,
                alphabet_size,
            },
            rest,
        ))
    }
}
