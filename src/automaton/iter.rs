use super::DoubleArrayAhoCorasick;
use crate::unit::KeyUnit;
use crate::{Hit, ROOT_STATE};

/// Iterator created by [`DoubleArrayAhoCorasick::find_overlapping_iter()`].
pub struct FindOverlappingIterator<'a, U, V, I> {
    pma: &'a DoubleArrayAhoCorasick<U, V>,
    units: I,
    state: u32,
    end: usize,
    end_bytes: usize,
    pending: &'a [u32],
}

impl<'a, U, V, I> FindOverlappingIterator<'a, U, V, I>
where
    U: KeyUnit,
    I: Iterator<Item = U>,
{
    pub(crate) fn new(pma: &'a DoubleArrayAhoCorasick<U, V>, units: I) -> Self {
        Self {
            pma,
            units,
            state: ROOT_STATE,
            end: 0,
            end_bytes: 0,
            pending: &[],
        }
    }

    /// Returns the next hit ending before `limit` units.
    ///
    /// Returns `None` without consuming units at or beyond `limit`.
    #[inline(always)]
    pub(crate) fn next_within(&mut self, limit: usize) -> Option<Hit<'a, V>> {
        loop {
            if let Some((&id, rest)) = self.pending.split_first() {
                if limit <= self.end {
                    return None;
                }
                let pma = self.pma;
                self.pending = rest;
                let len = pma.key_lens[id as usize];
                return Some(Hit {
                    begin: self.end - len.units as usize,
                    end: self.end,
                    begin_bytes: self.end_bytes - len.bytes as usize,
                    end_bytes: self.end_bytes,
                    value: &pma.values[id as usize],
                });
            }
            if limit <= self.end + 1 {
                return None;
            }
            let unit = self.units.next()?;
            self.end += 1;
            self.end_bytes += unit.len_bytes();
            self.state = self
                .pma
                .next_state(self.state, self.pma.mapper.get(unit.code()));
            self.pending = self.pma.outputs(self.state);
        }
    }
}

impl<'a, U, V, I> Iterator for FindOverlappingIterator<'a, U, V, I>
where
    U: KeyUnit,
    I: Iterator<Item = U>,
{
    type Item = Hit<'a, V>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.next_within(usize::MAX)
    }
}
