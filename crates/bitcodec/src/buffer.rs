//! BitBuffer: a fixed-capacity byte region with a committed-size cursor and typed,
//! optionally tagged, reads and writes for the built-in kinds.
//!
//! Writes always append at [BitBuffer::bit_len] and advance it by exactly the number
//! of bits they encode (tag included). Every write returns the bit position of its
//! *payload*, which is the position the matching read takes. Reads never look past
//! the committed size.

use std::{fmt, sync::Arc};

use crate::{
    bits,
    catalog,
    errors::{EncodeError, ReadError, WriteError},
    registry::TypeRegistry,
};

/// Width of a record tag in bits.
pub const TAG_BITS: usize = 8;

/// Width of the length prefix of variable-width payloads in bits.
pub const LENGTH_BITS: usize = 32;

/// Whether a write emits its kind's tag before the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMode {
    #[default]
    Tagged,
    /// Payload only, for sub-values of a compound kind.
    Bare,
}

/// A bit-addressable buffer owning its byte region.
///
/// The region never grows. Writes that would run past it fail with
/// [WriteError::CapacityExceeded] and leave the buffer unchanged.
///
/// A buffer is not synchronized; share it across threads behind a lock or move it.
pub struct BitBuffer {
    data: Vec<u8>,
    size: usize,
    registry: Arc<TypeRegistry>,
}

impl BitBuffer {
    /// Creates an empty buffer with room for `capacity_bytes` bytes.
    pub fn new(registry: Arc<TypeRegistry>, capacity_bytes: usize) -> Self {
        Self {
            data: vec![0; capacity_bytes],
            size: 0,
            registry,
        }
    }

    /// Wraps an existing byte region. With no `bit_len` the whole region counts as committed.
    pub fn from_bytes(
        registry: Arc<TypeRegistry>,
        bytes: Vec<u8>,
        bit_len: Option<usize>,
    ) -> Result<Self, WriteError> {
        let capacity = bytes.len() * 8;
        let size = bit_len.unwrap_or(capacity);
        if size > capacity {
            return Err(WriteError::CapacityExceeded {
                offset: 0,
                width: size,
                capacity,
            });
        }

        Ok(Self {
            data: bytes,
            size,
            registry,
        })
    }

    /// Wraps the bytes of `text`, all of them committed.
    pub fn from_text(registry: Arc<TypeRegistry>, text: &str) -> Self {
        let data = text.as_bytes().to_vec();

        Self {
            size: data.len() * 8,
            data,
            registry,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Number of committed bits.
    pub fn bit_len(&self) -> usize {
        self.size
    }

    /// Committed bits rounded up to whole bytes.
    pub fn byte_len(&self) -> usize {
        self.size.div_ceil(8)
    }

    pub fn capacity_bits(&self) -> usize {
        self.data.len() * 8
    }

    pub fn remaining_bits(&self) -> usize {
        self.capacity_bits() - self.size
    }

    /// The whole underlying region, including bytes past the committed size.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy of the region truncated to [BitBuffer::byte_len].
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data[..self.byte_len()].to_vec()
    }

    /// The truncated region as UTF-8 text.
    pub fn to_text(&self) -> Result<String, ReadError> {
        String::from_utf8(self.to_bytes()).map_err(|_| ReadError::InvalidUtf8 { offset: 0 })
    }

    /// Zeroes the region and resets the committed size to 0.
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.size = 0;
    }

    /// Zeroes the region and releases it.
    pub fn destroy(mut self) {
        self.clear();
    }

    /// Rolls the committed size back to `size` after a failed multi-part write and
    /// zeroes the bits it drops, so exported trailing bytes stay padding.
    pub(crate) fn truncate(&mut self, size: usize) {
        if size >= self.size {
            return;
        }

        let end = self.size;
        let mut pos = size;
        while pos < end && pos % 8 != 0 {
            self.data[pos / 8] &= !(1u8 << (pos % 8));
            pos += 1;
        }

        let whole = (end - pos) / 8;
        self.data[pos / 8..pos / 8 + whole].fill(0);
        pos += whole * 8;

        while pos < end {
            self.data[pos / 8] &= !(1u8 << (pos % 8));
            pos += 1;
        }

        self.size = size;
    }

    pub(crate) fn check_capacity(&self, width: usize) -> Result<(), WriteError> {
        let capacity = self.capacity_bits();
        if self.size + width > capacity {
            return Err(WriteError::CapacityExceeded {
                offset: self.size,
                width,
                capacity,
            });
        }

        Ok(())
    }

    /// Fails unless `[pos, pos + width)` lies within the committed size.
    pub fn ensure_committed(&self, pos: usize, width: usize) -> Result<(), ReadError> {
        if pos.checked_add(width).map_or(true, |end| end > self.size) {
            return Err(ReadError::OutOfRange {
                offset: pos,
                width,
                size: self.size,
            });
        }

        Ok(())
    }

    /// Appends a raw tag byte.
    pub fn write_tag(&mut self, tag: u8) -> Result<usize, WriteError> {
        let start = self.size;
        bits::write_u8_at(&mut self.data, start, tag)?;
        self.size += TAG_BITS;

        Ok(start)
    }

    pub fn read_tag(&self, pos: usize) -> Result<u8, ReadError> {
        self.ensure_committed(pos, TAG_BITS)?;

        bits::read_u8_at(&self.data, pos)
    }

    /// Checks room for the whole record, then writes the tag when asked.
    fn begin(&mut self, kind: &str, mode: TagMode, payload_bits: usize) -> Result<usize, EncodeError> {
        match mode {
            TagMode::Tagged => {
                let tag = self
                    .registry
                    .tag_for(kind)
                    .ok_or_else(|| EncodeError::UnknownKind(kind.to_string()))?;
                self.check_capacity(TAG_BITS + payload_bits)?;
                self.write_tag(tag)?;
            }
            TagMode::Bare => self.check_capacity(payload_bits)?,
        }

        Ok(self.size)
    }

    fn write_fixed(
        &mut self,
        kind: &str,
        width: usize,
        mode: TagMode,
        put: impl FnOnce(&mut [u8], usize) -> Result<(), WriteError>,
    ) -> Result<usize, EncodeError> {
        let start = self.begin(kind, mode, width)?;
        put(&mut self.data[..], start)?;
        self.size += width;

        Ok(start)
    }

    fn read_fixed<T>(
        &self,
        pos: usize,
        width: usize,
        get: impl FnOnce(&[u8], usize) -> Result<T, ReadError>,
    ) -> Result<(T, usize), ReadError> {
        self.ensure_committed(pos, width)?;

        Ok((get(&self.data[..], pos)?, width))
    }

    /// Appends the low `width` bits of `value` with no tag.
    pub fn write_bits(&mut self, value: u32, width: u32) -> Result<usize, WriteError> {
        let start = self.size;
        bits::write_bits_at(&mut self.data, start, width, value)?;
        self.size += width as usize;

        Ok(start)
    }

    pub fn read_bits(&self, pos: usize, width: u32) -> Result<(u32, usize), ReadError> {
        self.read_fixed(pos, width as usize, |data, at| {
            bits::read_bits_at(data, at, width)
        })
    }

    pub fn write_boolean(&mut self, value: bool, mode: TagMode) -> Result<usize, EncodeError> {
        self.write_fixed(catalog::BOOLEAN, 1, mode, |data, at| {
            bits::write_bit_at(data, at, value)
        })
    }

    pub fn read_boolean(&self, pos: usize) -> Result<(bool, usize), ReadError> {
        self.read_fixed(pos, 1, bits::read_bit_at)
    }

    pub fn write_number(&mut self, value: f64, mode: TagMode) -> Result<usize, EncodeError> {
        self.write_fixed(catalog::NUMBER, 64, mode, |data, at| {
            bits::write_f64_at(data, at, value)
        })
    }

    pub fn read_number(&self, pos: usize) -> Result<(f64, usize), ReadError> {
        self.read_fixed(pos, 64, bits::read_f64_at)
    }

    pub fn write_float32(&mut self, value: f32, mode: TagMode) -> Result<usize, EncodeError> {
        self.write_fixed(catalog::FLOAT32, 32, mode, |data, at| {
            bits::write_f32_at(data, at, value)
        })
    }

    pub fn read_float32(&self, pos: usize) -> Result<(f32, usize), ReadError> {
        self.read_fixed(pos, 32, bits::read_f32_at)
    }

    pub fn write_int8(&mut self, value: i8, mode: TagMode) -> Result<usize, EncodeError> {
        self.write_fixed(catalog::INT8, 8, mode, |data, at| {
            bits::write_i8_at(data, at, value)
        })
    }

    pub fn read_int8(&self, pos: usize) -> Result<(i8, usize), ReadError> {
        self.read_fixed(pos, 8, bits::read_i8_at)
    }

    pub fn write_int16(&mut self, value: i16, mode: TagMode) -> Result<usize, EncodeError> {
        self.write_fixed(catalog::INT16, 16, mode, |data, at| {
            bits::write_i16_at(data, at, value)
        })
    }

    pub fn read_int16(&self, pos: usize) -> Result<(i16, usize), ReadError> {
        self.read_fixed(pos, 16, bits::read_i16_at)
    }

    pub fn write_int32(&mut self, value: i32, mode: TagMode) -> Result<usize, EncodeError> {
        self.write_fixed(catalog::INT32, 32, mode, |data, at| {
            bits::write_i32_at(data, at, value)
        })
    }

    pub fn read_int32(&self, pos: usize) -> Result<(i32, usize), ReadError> {
        self.read_fixed(pos, 32, bits::read_i32_at)
    }

    pub fn write_uint8(&mut self, value: u8, mode: TagMode) -> Result<usize, EncodeError> {
        self.write_fixed(catalog::UINT8, 8, mode, |data, at| {
            bits::write_u8_at(data, at, value)
        })
    }

    pub fn read_uint8(&self, pos: usize) -> Result<(u8, usize), ReadError> {
        self.read_fixed(pos, 8, bits::read_u8_at)
    }

    pub fn write_uint16(&mut self, value: u16, mode: TagMode) -> Result<usize, EncodeError> {
        self.write_fixed(catalog::UINT16, 16, mode, |data, at| {
            bits::write_u16_at(data, at, value)
        })
    }

    pub fn read_uint16(&self, pos: usize) -> Result<(u16, usize), ReadError> {
        self.read_fixed(pos, 16, bits::read_u16_at)
    }

    pub fn write_uint32(&mut self, value: u32, mode: TagMode) -> Result<usize, EncodeError> {
        self.write_fixed(catalog::UINT32, 32, mode, |data, at| {
            bits::write_u32_at(data, at, value)
        })
    }

    pub fn read_uint32(&self, pos: usize) -> Result<(u32, usize), ReadError> {
        self.read_fixed(pos, 32, bits::read_u32_at)
    }

    /// Writes a 32-bit length followed by the raw bytes.
    pub fn write_bytes(&mut self, value: &[u8], mode: TagMode) -> Result<usize, EncodeError> {
        self.write_prefixed(catalog::BYTES, value, mode)
    }

    pub fn read_bytes(&self, pos: usize) -> Result<(Vec<u8>, usize), ReadError> {
        let (len, payload) = self.read_prefix(pos)?;
        let bytes = bits::read_bytes_at(&self.data, pos + LENGTH_BITS, len)?;

        Ok((bytes, payload))
    }

    /// Writes a 32-bit byte length followed by the UTF-8 bytes of `value`.
    pub fn write_string(&mut self, value: &str, mode: TagMode) -> Result<usize, EncodeError> {
        self.write_prefixed(catalog::STRING, value.as_bytes(), mode)
    }

    pub fn read_string(&self, pos: usize) -> Result<(String, usize), ReadError> {
        let (len, payload) = self.read_prefix(pos)?;
        let text = bits::read_str_at(&self.data, pos + LENGTH_BITS, len)?;

        Ok((text, payload))
    }

    fn write_prefixed(
        &mut self,
        kind: &str,
        bytes: &[u8],
        mode: TagMode,
    ) -> Result<usize, EncodeError> {
        let len = u32::try_from(bytes.len()).map_err(|_| WriteError::LengthTooLarge(bytes.len()))?;
        let payload = LENGTH_BITS + bytes.len() * 8;

        let start = self.begin(kind, mode, payload)?;
        bits::write_u32_at(&mut self.data, start, len)?;
        bits::write_bytes_at(&mut self.data, start + LENGTH_BITS, bytes)?;
        self.size += payload;

        Ok(start)
    }

    /// Reads a length prefix and checks that its content is committed.
    /// Returns the byte length and the payload width in bits.
    fn read_prefix(&self, pos: usize) -> Result<(usize, usize), ReadError> {
        let (len, _) = self.read_fixed(pos, LENGTH_BITS, bits::read_u32_at)?;
        let len = len as usize;
        let payload = len
            .checked_mul(8)
            .and_then(|width| width.checked_add(LENGTH_BITS))
            .ok_or(ReadError::OutOfRange {
                offset: pos,
                width: usize::MAX,
                size: self.size,
            })?;
        self.ensure_committed(pos, payload)?;

        Ok((len, payload))
    }
}

/// Deep copy of the committed bytes with the same size and an independent cursor.
impl Clone for BitBuffer {
    fn clone(&self) -> Self {
        Self {
            data: self.to_bytes(),
            size: self.size,
            registry: Arc::clone(&self.registry),
        }
    }
}

impl fmt::Debug for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitBuffer")
            .field("size", &self.size)
            .field("capacity_bits", &self.capacity_bits())
            .field("kinds", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(capacity_bytes: usize) -> BitBuffer {
        BitBuffer::new(Arc::new(TypeRegistry::standard()), capacity_bytes)
    }

    #[test]
    fn test_new_is_empty() {
        let buf = buffer(4);
        assert_eq!(buf.bit_len(), 0);
        assert_eq!(buf.byte_len(), 0);
        assert_eq!(buf.capacity_bits(), 32);
        assert_eq!(buf.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_tagged_write_accounts_tag_and_payload() {
        let mut buf = buffer(8);
        let pos = buf.write_int16(-2, TagMode::Tagged).unwrap();
        assert_eq!(pos, 8);
        assert_eq!(buf.bit_len(), 8 + 16);
        assert_eq!(buf.read_tag(0).unwrap(), buf.registry().tag_for("int16").unwrap());
        assert_eq!(buf.read_int16(pos).unwrap(), (-2, 16));
    }

    #[test]
    fn test_bare_write_returns_pre_write_size() {
        let mut buf = buffer(9);
        buf.write_bits(0b101, 3).unwrap();
        let pos = buf.write_number(0.25, TagMode::Bare).unwrap();
        assert_eq!(pos, 3);
        assert_eq!(buf.bit_len(), 3 + 64);
        assert_eq!(buf.read_number(3).unwrap(), (0.25, 64));
    }

    #[test]
    fn test_byte_len_rounds_up() {
        let mut buf = buffer(2);
        buf.write_boolean(true, TagMode::Bare).unwrap();
        assert_eq!(buf.bit_len(), 1);
        assert_eq!(buf.byte_len(), 1);
        assert_eq!(buf.to_bytes(), vec![1]);

        buf.write_uint8(0xFF, TagMode::Bare).unwrap();
        assert_eq!(buf.byte_len(), 2);
        assert_eq!(buf.remaining_bits(), 7);
    }

    #[test]
    fn test_capacity_exceeded_leaves_buffer_unchanged() {
        let mut buf = buffer(4);
        buf.write_uint8(7, TagMode::Bare).unwrap();

        let err = buf.write_number(1.0, TagMode::Tagged).unwrap_err();
        assert_eq!(
            err,
            EncodeError::Write(WriteError::CapacityExceeded {
                offset: 8,
                width: 72,
                capacity: 32
            })
        );
        assert_eq!(buf.bit_len(), 8);
        assert_eq!(buf.as_bytes(), &[7, 0, 0, 0]);
    }

    #[test]
    fn test_read_past_committed_size() {
        let mut buf = buffer(8);
        buf.write_uint16(1, TagMode::Bare).unwrap();
        assert_eq!(
            buf.read_uint32(0).unwrap_err(),
            ReadError::OutOfRange {
                offset: 0,
                width: 32,
                size: 16
            }
        );
    }

    #[test]
    fn test_tagged_write_of_unregistered_kind() {
        let registry = TypeRegistry::compile(&[]).unwrap();
        let mut buf = BitBuffer::new(Arc::new(registry), 4);
        assert_eq!(
            buf.write_boolean(true, TagMode::Tagged).unwrap_err(),
            EncodeError::UnknownKind("boolean".to_string())
        );
        assert_eq!(buf.write_boolean(true, TagMode::Bare).unwrap(), 0);
    }

    #[test]
    fn test_string_unaligned() {
        let mut buf = buffer(16);
        buf.write_boolean(true, TagMode::Bare).unwrap();
        let pos = buf.write_string("hi", TagMode::Tagged).unwrap();
        assert_eq!(pos, 9);
        assert_eq!(buf.bit_len(), 1 + 8 + 32 + 16);
        assert_eq!(buf.read_string(pos).unwrap(), ("hi".to_string(), 48));
    }

    #[test]
    fn test_empty_string_and_bytes() {
        let mut buf = buffer(16);
        let s = buf.write_string("", TagMode::Bare).unwrap();
        let b = buf.write_bytes(&[], TagMode::Bare).unwrap();
        assert_eq!(buf.read_string(s).unwrap(), (String::new(), 32));
        assert_eq!(buf.read_bytes(b).unwrap(), (vec![], 32));
    }

    #[test]
    fn test_truncated_length_prefix() {
        let mut bytes = vec![0u8; 8];
        bytes[0] = 200;
        let buf = BitBuffer::from_bytes(Arc::new(TypeRegistry::standard()), bytes, None).unwrap();
        assert_eq!(
            buf.read_bytes(0).unwrap_err(),
            ReadError::OutOfRange {
                offset: 0,
                width: 32 + 1600,
                size: 64
            }
        );
    }

    #[test]
    fn test_maximum_length_prefix() {
        let mut buf = buffer(8);
        buf.write_uint32(u32::MAX, TagMode::Bare).unwrap();
        assert!(matches!(
            buf.read_string(0).unwrap_err(),
            ReadError::OutOfRange {
                offset: 0,
                size: 32,
                ..
            }
        ));
    }

    #[test]
    fn test_truncate_zeroes_dropped_bits() {
        let mut buf = buffer(4);
        buf.write_bits(0b111, 3).unwrap();
        buf.write_uint16(0xFFFF, TagMode::Bare).unwrap();
        buf.write_bits(0b11, 2).unwrap();

        buf.truncate(3);
        assert_eq!(buf.bit_len(), 3);
        assert_eq!(buf.as_bytes(), &[0b111, 0, 0, 0]);

        buf.truncate(8);
        assert_eq!(buf.bit_len(), 3);
    }

    #[test]
    fn test_from_bytes_infers_or_checks_length() {
        let registry = Arc::new(TypeRegistry::standard());

        let buf = BitBuffer::from_bytes(registry.clone(), vec![1, 2, 3], None).unwrap();
        assert_eq!(buf.bit_len(), 24);

        let buf = BitBuffer::from_bytes(registry.clone(), vec![1, 2, 3], Some(17)).unwrap();
        assert_eq!(buf.bit_len(), 17);
        assert_eq!(buf.byte_len(), 3);

        assert_eq!(
            BitBuffer::from_bytes(registry, vec![1], Some(9)).unwrap_err(),
            WriteError::CapacityExceeded {
                offset: 0,
                width: 9,
                capacity: 8
            }
        );
    }

    #[test]
    fn test_text_round_trip() {
        let buf = BitBuffer::from_text(Arc::new(TypeRegistry::standard()), "payload");
        assert_eq!(buf.bit_len(), 56);
        assert_eq!(buf.to_text().unwrap(), "payload");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = buffer(8);
        original.write_uint8(1, TagMode::Bare).unwrap();
        original.write_boolean(true, TagMode::Bare).unwrap();

        let copy = original.clone();
        assert_eq!(copy.bit_len(), 9);
        assert_eq!(copy.as_bytes(), &[1, 1]);

        original.write_uint16(0xFFFF, TagMode::Bare).unwrap();
        original.clear();
        assert_eq!(copy.bit_len(), 9);
        assert_eq!(copy.to_bytes(), vec![1, 1]);
    }

    #[test]
    fn test_clear_zeroes_region() {
        let mut buf = buffer(2);
        buf.write_uint16(0xABCD, TagMode::Bare).unwrap();
        buf.clear();
        assert_eq!(buf.bit_len(), 0);
        assert_eq!(buf.as_bytes(), &[0, 0]);
    }
}
