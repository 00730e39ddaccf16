//! Tagged stream engine.
//!
//! A stream is a flat run of records, `[tag: 8 bits][payload]`, where the payload
//! layout is defined by the registry entry for the tag. Serializing looks up each
//! value's kind and writes its tag then its payload; deserializing reads a tag, looks
//! up the decoder and replays it, until the committed size is reached or an
//! [END_TAG] is found.

use std::sync::Arc;

use crate::{
    buffer::{BitBuffer, TAG_BITS, TagMode},
    errors::{DecodeError, EncodeError, ReadError},
    kind::{EncodeFn, Width},
    registry::{END_TAG, TypeRegistry},
    value::Value,
};

impl BitBuffer {
    /// Creates a buffer of `capacity_bytes` bytes holding the serialized `values`.
    pub fn from_values(
        registry: Arc<TypeRegistry>,
        values: &[Value],
        capacity_bytes: usize,
    ) -> Result<Self, EncodeError> {
        let mut buffer = Self::new(registry, capacity_bytes);
        buffer.serialize(values)?;

        Ok(buffer)
    }

    /// Writes one value through its registry entry and returns its payload position.
    ///
    /// With [TagMode::Bare] only the payload is written, which is how compound kinds
    /// write their parts. A failed write leaves the buffer as it was.
    pub fn write_value(&mut self, value: &Value, mode: TagMode) -> Result<usize, EncodeError> {
        let (tag, width, encode) = self
            .registry()
            .lookup(value.kind_name())
            .map(|kind| (kind.tag, kind.width, kind.encode))
            .ok_or_else(|| EncodeError::UnknownKind(value.kind_name().to_string()))?;

        self.write_record(tag, width, encode, value, mode)
    }

    fn write_record(
        &mut self,
        tag: u8,
        width: Width,
        encode: EncodeFn,
        value: &Value,
        mode: TagMode,
    ) -> Result<usize, EncodeError> {
        let start = self.bit_len();

        let result = self.encode_record(tag, width, encode, value, mode);
        if result.is_err() {
            self.truncate(start);
        }

        result
    }

    fn encode_record(
        &mut self,
        tag: u8,
        width: Width,
        encode: EncodeFn,
        value: &Value,
        mode: TagMode,
    ) -> Result<usize, EncodeError> {
        let tag_bits = match mode {
            TagMode::Tagged => TAG_BITS,
            TagMode::Bare => 0,
        };
        if let Some(bits) = width.bits() {
            self.check_capacity(tag_bits + bits as usize)?;
        }

        if mode == TagMode::Tagged {
            self.write_tag(tag)?;
        }

        let payload = self.bit_len();
        encode(self, value)?;

        let written = self.bit_len().saturating_sub(payload);
        if let Some(bits) = width.bits().filter(|&bits| written != bits as usize) {
            return Err(EncodeError::WidthMismatch {
                kind: value.kind_name().to_string(),
                declared: bits as usize,
                written,
            });
        }

        Ok(payload)
    }

    /// Appends each value as a tagged record, in order. Returns the number of bits written.
    ///
    /// Stops at the first value that cannot be written; the records before it stay committed.
    pub fn serialize(&mut self, values: &[Value]) -> Result<usize, EncodeError> {
        let start = self.bit_len();

        for value in values {
            self.write_value(value, TagMode::Tagged)?;
        }

        Ok(self.bit_len() - start)
    }

    /// Same output as [BitBuffer::serialize] for values that are all of kind `kind`,
    /// with a single registry lookup.
    pub fn serialize_kind(&mut self, kind: &str, values: &[Value]) -> Result<usize, EncodeError> {
        let (tag, width, encode) = self
            .registry()
            .lookup(kind)
            .map(|entry| (entry.tag, entry.width, entry.encode))
            .ok_or_else(|| EncodeError::UnknownKind(kind.to_string()))?;

        let start = self.bit_len();

        for value in values {
            if !value.kind_name().eq_ignore_ascii_case(kind) {
                return Err(EncodeError::mismatch(kind, value));
            }
            self.write_record(tag, width, encode, value, TagMode::Tagged)?;
        }

        Ok(self.bit_len() - start)
    }

    /// Decodes every record from bit 0 up to the committed size or the first end tag.
    pub fn deserialize(&self) -> Result<Vec<Value>, DecodeError> {
        self.deserialize_while(|_| true)
    }

    /// Decodes at most the first `count` records.
    pub fn deserialize_first(&self, count: usize) -> Result<Vec<Value>, DecodeError> {
        let mut seen = 0;

        self.deserialize_while(|_| {
            seen += 1;
            seen <= count
        })
    }

    /// Decodes records while `keep_going` returns true for the bit position of the
    /// next record's tag.
    ///
    /// Fewer than 8 trailing bits that are all zero are byte padding and end the
    /// stream like an end tag. Any other short tail is a truncated record.
    pub fn deserialize_while(
        &self,
        mut keep_going: impl FnMut(usize) -> bool,
    ) -> Result<Vec<Value>, DecodeError> {
        let size = self.bit_len();
        let mut values = Vec::new();
        let mut pos = 0;

        while pos < size {
            if !keep_going(pos) {
                break;
            }

            let tail = size - pos;
            if tail < TAG_BITS {
                let (rest, _) = self.read_bits(pos, tail as u32)?;
                if rest == 0 {
                    break;
                }

                return Err(ReadError::OutOfRange {
                    offset: pos,
                    width: TAG_BITS,
                    size,
                }
                .into());
            }

            let tag = self.read_tag(pos)?;
            if tag == END_TAG {
                break;
            }

            let Some(kind) = self.registry().get(tag) else {
                return Err(DecodeError::UnknownTag {
                    tag,
                    offset: pos,
                    decoded: values,
                });
            };

            let (value, bits) = (kind.decode)(self, pos + TAG_BITS)?;
            if let Some(declared) = kind.width.bits().filter(|&declared| bits != declared as usize) {
                return Err(DecodeError::WidthMismatch {
                    tag,
                    offset: pos,
                    declared: declared as usize,
                    consumed: bits,
                });
            }
            values.push(value);
            pos += TAG_BITS + bits;
        }

        Ok(values)
    }
}
