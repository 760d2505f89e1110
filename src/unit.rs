//! Units that keys and haystacks are made of.
use std::iter::Copied;
use std::slice;
use std::str::{Bytes, Chars};

/// A unit of keys and haystacks, i.e., a character or a byte.
pub trait KeyUnit: Copy {
    /// Tag identifying the unit type in serialized automata.
    const TAG: u8;

    /// Returns the raw code of the unit.
    fn code(self) -> u32;

    /// Restores a unit from its raw code, or `None` if the code is invalid.
    fn from_code(code: u32) -> Option<Self>;

    /// Returns the number of bytes the unit occupies in UTF-8 text.
    fn len_bytes(self) -> usize;
}

impl KeyUnit for char {
    const TAG: u8 = b'c';

    #[inline(always)]
    fn code(self) -> u32 {
        u32::from(self)
    }

    #[inline(always)]
    fn from_code(code: u32) -> Option<Self> {
        char::from_u32(code)
    }

    #[inline(always)]
    fn len_bytes(self) -> usize {
        self.len_utf8()
    }
}

impl KeyUnit for u8 {
    const TAG: u8 = b'b';

    #[inline(always)]
    fn code(self) -> u32 {
        u32::from(self)
    }

    #[inline(always)]
    fn from_code(code: u32) -> Option<Self> {
        u8::try_from(code).ok()
    }

    #[inline(always)]
    fn len_bytes(self) -> usize {
        1
    }
}

/// A sequence of units, used both for keys and haystacks.
///
/// Strings provide their characters to charwise automata and their UTF-8 bytes to
/// bytewise automata.
pub trait UnitSequence<U: KeyUnit> {
    /// Iterator over the units.
    type Units<'a>: Iterator<Item = U>
    where
        Self: 'a;

    /// Returns an iterator over the units in order.
    fn units(&self) -> Self::Units<'_>;
}

impl UnitSequence<char> for str {
    type Units<'a> = Chars<'a>;

    #[inline(always)]
    fn units(&self) -> Chars<'_> {
        self.chars()
    }
}

impl UnitSequence<char> for String {
    type Units<'a> = Chars<'a>;

    #[inline(always)]
    fn units(&self) -> Chars<'_> {
        self.chars()
    }
}

impl UnitSequence<char> for [char] {
    type Units<'a> = Copied<slice::Iter<'a, char>>;

    #[inline(always)]
    fn units(&self) -> Self::Units<'_> {
        self.iter().copied()
    }
}

impl UnitSequence<char> for Vec<char> {
    type Units<'a> = Copied<slice::Iter<'a, char>>;

    #[inline(always)]
    fn units(&self) -> Self::Units<'_> {
        self.iter().copied()
    }
}

impl UnitSequence<u8> for str {
    type Units<'a> = Bytes<'a>;

    #[inline(always)]
    fn units(&self) -> Bytes<'_> {
        self.bytes()
    }
}

impl UnitSequence<u8> for String {
    type Units<'a> = Bytes<'a>;

    #[inline(always)]
    fn units(&self) -> Bytes<'_> {
        self.bytes()
    }
}

impl UnitSequence<u8> for [u8] {
    type Units<'a> = Copied<slice::Iter<'a, u8>>;

    #[inline(always)]
    fn units(&self) -> Self::Units<'_> {
        self.iter().copied()
    }
}

impl<const N: usize> UnitSequence<u8> for [u8; N] {
    type Units<'a> = Copied<slice::Iter<'a, u8>>;

    #[inline(always)]
    fn units(&self) -> Self::Units<'_> {
        self.iter().copied()
    }
}

impl UnitSequence<u8> for Vec<u8> {
    type Units<'a> = Copied<slice::Iter<'a, u8>>;

    #[inline(always)]
    fn units(&self) -> Self::Units<'_> {
        self.iter().copied()
    }
}

impl<U, T> UnitSequence<U> for &T
where
    U: KeyUnit,
    T: UnitSequence<U> + ?Sized,
{
    type Units<'a> = T::Units<'a> where Self: 'a;

    #[inline(always)]
    fn units(&self) -> Self::Units<'_> {
        (**self).units()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<U: KeyUnit, S: UnitSequence<U> + ?Sized>(s: &S) -> Vec<U> {
        s.units().collect()
    }

    #[test]
    fn test_str_units() {
        let chars: Vec<char> = collect("世界a");
        assert_eq!(chars, vec!['世', '界', 'a']);
        let bytes: Vec<u8> = collect("世界a");
        assert_eq!(bytes.len(), 7);
    }

    #[test]
    fn test_len_bytes() {
        assert_eq!('a'.len_bytes(), 1);
        assert_eq!('世'.len_bytes(), 3);
        assert_eq!(0xffu8.len_bytes(), 1);
        assert_eq!('世'.code(), 0x4e16);
        assert_eq!(char::from_code(0x4e16), Some('世'));
        assert_eq!(char::from_code(0xd800), None);
        assert_eq!(u8::from_code(0xff), Some(0xff));
        assert_eq!(u8::from_code(0x100), None);
    }

    #[test]
    fn test_reference_units() {
        let key = &&b"ab"[..];
        let bytes: Vec<u8> = collect(key);
        assert_eq!(bytes, vec![b'a', b'b']);
    }
}
