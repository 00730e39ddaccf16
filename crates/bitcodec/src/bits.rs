//! Bit-offset read and write primitives over raw byte regions.
//!
//! Bit `o` is bit `o % 8` of byte `o / 8`, counted from the least significant bit.
//! Multi-bit fields are stored least significant bit first and native multi-byte
//! values are little-endian, so a value written at an unaligned offset has the same
//! bit image as the same value written on a byte boundary, only shifted.
//!
//! Fixed-width native values take a fast path when the offset is byte-aligned and
//! otherwise go through a small aligned scratch array that is filled (or drained)
//! eight bits at a time with [read_bits_at] / [write_bits_at].
//!
//! Every function checks the requested range against the length of the region.

use crate::errors::{ReadError, WriteError};

/// Largest width accepted by [read_bits_at] and [write_bits_at].
pub const MAX_BITS: u32 = 32;

fn check_read(data: &[u8], offset: usize, width: usize) -> Result<(), ReadError> {
    let capacity = data.len() * 8;
    if offset.checked_add(width).map_or(true, |end| end > capacity) {
        return Err(ReadError::OutOfBounds {
            offset,
            width,
            capacity,
        });
    }

    Ok(())
}

fn check_write(data: &[u8], offset: usize, width: usize) -> Result<(), WriteError> {
    let capacity = data.len() * 8;
    if offset.checked_add(width).map_or(true, |end| end > capacity) {
        return Err(WriteError::CapacityExceeded {
            offset,
            width,
            capacity,
        });
    }

    Ok(())
}

/// Reads the single bit at `offset`.
pub fn read_bit_at(data: &[u8], offset: usize) -> Result<bool, ReadError> {
    check_read(data, offset, 1)?;

    Ok((data[offset / 8] >> (offset % 8)) & 1 == 1)
}

/// Sets or clears the single bit at `offset`.
pub fn write_bit_at(data: &mut [u8], offset: usize, bit: bool) -> Result<(), WriteError> {
    check_write(data, offset, 1)?;

    let mask = 1u8 << (offset % 8);
    if bit {
        data[offset / 8] |= mask;
    } else {
        data[offset / 8] &= !mask;
    }

    Ok(())
}

/// Reads `width` bits (1..=32) starting at `offset` as an unsigned value.
pub fn read_bits_at(data: &[u8], offset: usize, width: u32) -> Result<u32, ReadError> {
    if width == 0 || width > MAX_BITS {
        return Err(ReadError::InvalidWidth(width));
    }
    check_read(data, offset, width as usize)?;

    let mut value = 0u32;
    let mut pos = offset;
    let mut filled = 0u32;

    while filled < width {
        let shift = (pos % 8) as u32;
        let take = (8 - shift).min(width - filled);
        let chunk = (data[pos / 8] >> shift) as u32 & ((1u32 << take) - 1);

        value |= chunk << filled;
        filled += take;
        pos += take as usize;
    }

    Ok(value)
}

/// Writes the low `width` bits (1..=32) of `value` starting at `offset`.
///
/// Bits of the region outside the written range are left untouched. A `value`
/// with bits set at or above `width` is rejected rather than truncated.
pub fn write_bits_at(
    data: &mut [u8],
    offset: usize,
    width: u32,
    value: u32,
) -> Result<(), WriteError> {
    if width == 0 || width > MAX_BITS {
        return Err(WriteError::InvalidWidth(width));
    }
    if width < MAX_BITS && value >> width != 0 {
        return Err(WriteError::ValueTooWide { value, width });
    }
    check_write(data, offset, width as usize)?;

    let mut rest = value;
    let mut pos = offset;
    let mut written = 0u32;

    while written < width {
        let shift = (pos % 8) as u32;
        let take = (8 - shift).min(width - written);
        let mask = (((1u32 << take) - 1) << shift) as u8;

        let byte = &mut data[pos / 8];
        *byte = (*byte & !mask) | ((rest << shift) as u8 & mask);

        rest >>= take;
        written += take;
        pos += take as usize;
    }

    Ok(())
}

/// Copies `N` bytes' worth of bits at `offset` into an aligned scratch array.
fn read_staged<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], ReadError> {
    check_read(data, offset, N * 8)?;

    let mut scratch = [0u8; N];
    if offset % 8 == 0 {
        let start = offset / 8;
        scratch.copy_from_slice(&data[start..start + N]);
    } else {
        for (i, byte) in scratch.iter_mut().enumerate() {
            *byte = read_bits_at(data, offset + i * 8, 8)? as u8;
        }
    }

    Ok(scratch)
}

/// Copies an aligned scratch array into the region at `offset`.
fn write_staged<const N: usize>(
    data: &mut [u8],
    offset: usize,
    scratch: [u8; N],
) -> Result<(), WriteError> {
    check_write(data, offset, N * 8)?;

    if offset % 8 == 0 {
        let start = offset / 8;
        data[start..start + N].copy_from_slice(&scratch);
    } else {
        for (i, &byte) in scratch.iter().enumerate() {
            write_bits_at(data, offset + i * 8, 8, byte as u32)?;
        }
    }

    Ok(())
}

pub fn read_u8_at(data: &[u8], offset: usize) -> Result<u8, ReadError> {
    Ok(u8::from_le_bytes(read_staged(data, offset)?))
}

pub fn write_u8_at(data: &mut [u8], offset: usize, value: u8) -> Result<(), WriteError> {
    write_staged(data, offset, value.to_le_bytes())
}

pub fn read_u16_at(data: &[u8], offset: usize) -> Result<u16, ReadError> {
    Ok(u16::from_le_bytes(read_staged(data, offset)?))
}

pub fn write_u16_at(data: &mut [u8], offset: usize, value: u16) -> Result<(), WriteError> {
    write_staged(data, offset, value.to_le_bytes())
}

pub fn read_u32_at(data: &[u8], offset: usize) -> Result<u32, ReadError> {
    Ok(u32::from_le_bytes(read_staged(data, offset)?))
}

pub fn write_u32_at(data: &mut [u8], offset: usize, value: u32) -> Result<(), WriteError> {
    write_staged(data, offset, value.to_le_bytes())
}

/// Reads a two's complement `i8`. Sign is applied only once the byte is staged.
pub fn read_i8_at(data: &[u8], offset: usize) -> Result<i8, ReadError> {
    Ok(i8::from_le_bytes(read_staged(data, offset)?))
}

pub fn write_i8_at(data: &mut [u8], offset: usize, value: i8) -> Result<(), WriteError> {
    write_staged(data, offset, value.to_le_bytes())
}

pub fn read_i16_at(data: &[u8], offset: usize) -> Result<i16, ReadError> {
    Ok(i16::from_le_bytes(read_staged(data, offset)?))
}

pub fn write_i16_at(data: &mut [u8], offset: usize, value: i16) -> Result<(), WriteError> {
    write_staged(data, offset, value.to_le_bytes())
}

pub fn read_i32_at(data: &[u8], offset: usize) -> Result<i32, ReadError> {
    Ok(i32::from_le_bytes(read_staged(data, offset)?))
}

pub fn write_i32_at(data: &mut [u8], offset: usize, value: i32) -> Result<(), WriteError> {
    write_staged(data, offset, value.to_le_bytes())
}

/// Reads an IEEE 754 single. NaN payloads are preserved bit for bit.
pub fn read_f32_at(data: &[u8], offset: usize) -> Result<f32, ReadError> {
    Ok(f32::from_le_bytes(read_staged(data, offset)?))
}

pub fn write_f32_at(data: &mut [u8], offset: usize, value: f32) -> Result<(), WriteError> {
    write_staged(data, offset, value.to_le_bytes())
}

/// Reads an IEEE 754 double. NaN payloads are preserved bit for bit.
pub fn read_f64_at(data: &[u8], offset: usize) -> Result<f64, ReadError> {
    Ok(f64::from_le_bytes(read_staged(data, offset)?))
}

pub fn write_f64_at(data: &mut [u8], offset: usize, value: f64) -> Result<(), WriteError> {
    write_staged(data, offset, value.to_le_bytes())
}

/// Reads `len` raw bytes starting at bit `offset`. Consumes `len * 8` bits.
pub fn read_bytes_at(data: &[u8], offset: usize, len: usize) -> Result<Vec<u8>, ReadError> {
    check_read(data, offset, len * 8)?;

    if offset % 8 == 0 {
        let start = offset / 8;
        return Ok(data[start..start + len].to_vec());
    }

    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push(read_bits_at(data, offset + i * 8, 8)? as u8);
    }

    Ok(out)
}

/// Writes `bytes` starting at bit `offset`, one 8-bit write per byte when unaligned.
pub fn write_bytes_at(data: &mut [u8], offset: usize, bytes: &[u8]) -> Result<(), WriteError> {
    check_write(data, offset, bytes.len() * 8)?;

    if offset % 8 == 0 {
        let start = offset / 8;
        data[start..start + bytes.len()].copy_from_slice(bytes);
        return Ok(());
    }

    for (i, &byte) in bytes.iter().enumerate() {
        write_bits_at(data, offset + i * 8, 8, byte as u32)?;
    }

    Ok(())
}

/// Reads `len` bytes of UTF-8 text starting at bit `offset`.
///
/// The length is not stored in the region; the caller has to know it.
pub fn read_str_at(data: &[u8], offset: usize, len: usize) -> Result<String, ReadError> {
    let bytes = read_bytes_at(data, offset, len)?;

    String::from_utf8(bytes).map_err(|_| ReadError::InvalidUtf8 { offset })
}

pub fn write_str_at(data: &mut [u8], offset: usize, value: &str) -> Result<(), WriteError> {
    write_bytes_at(data, offset, value.as_bytes())
}
