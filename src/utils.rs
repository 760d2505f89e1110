use crate::errors::{AcdatError, Result};

/// pack_size returns the smallest number of bytes that can encode `n`.
#[inline]
pub const fn pack_size(n: u32) -> u8 {
    if n < 1 << 8 {
        1
    } else if n < 1 << 16 {
        2
    } else if n < 1 << 24 {
        3
    } else {
        4
    }
}

/// Appends the lowest `nbytes` bytes of `n` in little endian.
///
/// `nbytes` must be >= pack_size(n) and <= 4.
#[inline]
pub fn pack_u32(dest: &mut Vec<u8>, mut n: u32, nbytes: u8) {
    debug_assert!((1..=4).contains(&nbytes));
    for _ in 0..nbytes {
        dest.push(n as u8);
        n >>= 8;
    }
}

/// unpack_u32 is the dual of pack_u32. It unpacks the integer at the head of `slice`
/// after reading `nbytes` bytes.
#[inline]
pub fn unpack_u32(slice: &[u8], nbytes: u8) -> Result<(u32, &[u8])> {
    debug_assert!((1..=4).contains(&nbytes));
    let (head, rest) = split(slice, usize::from(nbytes))?;
    let mut n = 0;
    for (i, &b) in head.iter().enumerate() {
        n |= u32::from(b) << (8 * i);
    }
    Ok((n, rest))
}

#[inline]
pub fn split(slice: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    if slice.len() < len {
        return Err(AcdatError::deserialize("unexpected end of input."));
    }
    Ok(slice.split_at(len))
}

#[inline]
pub fn read_u8(slice: &[u8]) -> Result<(u8, &[u8])> {
    let (head, rest) = split(slice, 1)?;
    Ok((head[0], rest))
}

#[inline]
pub fn read_u32(slice: &[u8]) -> Result<(u32, &[u8])> {
    unpack_u32(slice, 4)
}

#[inline]
pub fn write_u32(dest: &mut Vec<u8>, n: u32) {
    dest.extend_from_slice(&n.to_le_bytes());
}

/// Writes the length followed by the elements.
pub fn write_u32s(dest: &mut Vec<u8>, xs: &[u32]) {
    write_u32(dest, xs.len() as u32);
    for &x in xs {
        write_u32(dest, x);
    }
}

pub fn read_u32s(slice: &[u8]) -> Result<(Vec<u32>, &[u8])> {
    let (len, mut slice) = read_u32(slice)?;
    let len = len as usize;
    if slice.len() / 4 < len {
        return Err(AcdatError::deserialize("unexpected end of input."));
    }
    let mut xs = Vec::with_capacity(len);
    for _ in 0..len {
        let (x, rest) = read_u32(slice)?;
        xs.push(x);
        slice = rest;
    }
    Ok((xs, slice))
}

pub fn write_i32s(dest: &mut Vec<u8>, xs: &[i32]) {
    write_u32(dest, xs.len() as u32);
    for &x in xs {
        dest.extend_from_slice(&x.to_le_bytes());
    }
}

pub fn read_i32s(slice: &[u8]) -> Result<(Vec<i32>, &[u8])> {
    let (xs, rest) = read_u32s(slice)?;
    Ok((xs.into_iter().map(|x| x as i32).collect(), rest))
}
