//! Built-in primitive kinds and their codec functions.
//!
//! The order of [standard_kinds] fixes the tags of a standard registry and is part
//! of the wire format. Append new kinds at the end.

use crate::{
    buffer::{BitBuffer, TagMode},
    errors::{EncodeError, ReadError},
    kind::{KindDef, Width},
    value::Value,
};

pub const BOOLEAN: &str = "boolean";
pub const NUMBER: &str = "number";
pub const STRING: &str = "string";
pub const INT8: &str = "int8";
pub const INT16: &str = "int16";
pub const INT32: &str = "int32";
pub const UINT8: &str = "uint8";
pub const UINT16: &str = "uint16";
pub const UINT32: &str = "uint32";
pub const FLOAT32: &str = "float32";
pub const BYTES: &str = "bytes";

/// The built-in kinds in tag order (tag 1 first).
pub fn standard_kinds() -> Vec<KindDef> {
    vec![
        KindDef::new(BOOLEAN, Width::Fixed(1), encode_boolean, decode_boolean),
        KindDef::new(NUMBER, Width::Fixed(64), encode_number, decode_number),
        KindDef::new(STRING, Width::Variable, encode_string, decode_string),
        KindDef::new(INT8, Width::Fixed(8), encode_int8, decode_int8),
        KindDef::new(INT16, Width::Fixed(16), encode_int16, decode_int16),
        KindDef::new(INT32, Width::Fixed(32), encode_int32, decode_int32),
        KindDef::new(UINT8, Width::Fixed(8), encode_uint8, decode_uint8),
        KindDef::new(UINT16, Width::Fixed(16), encode_uint16, decode_uint16),
        KindDef::new(UINT32, Width::Fixed(32), encode_uint32, decode_uint32),
        KindDef::new(FLOAT32, Width::Fixed(32), encode_float32, decode_float32),
        KindDef::new(BYTES, Width::Variable, encode_bytes, decode_bytes),
    ]
}

/// Built-in kind named `name`, matched case-insensitively.
pub fn standard_kind(name: &str) -> Option<KindDef> {
    standard_kinds()
        .into_iter()
        .find(|kind| kind.name.eq_ignore_ascii_case(name))
}

fn encode_boolean(buffer: &mut BitBuffer, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Boolean(v) => buffer.write_boolean(*v, TagMode::Bare).map(drop),
        other => Err(EncodeError::mismatch(BOOLEAN, other)),
    }
}

fn decode_boolean(buffer: &BitBuffer, pos: usize) -> Result<(Value, usize), ReadError> {
    let (v, bits) = buffer.read_boolean(pos)?;
    Ok((Value::Boolean(v), bits))
}

fn encode_number(buffer: &mut BitBuffer, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Number(v) => buffer.write_number(*v, TagMode::Bare).map(drop),
        other => Err(EncodeError::mismatch(NUMBER, other)),
    }
}

fn decode_number(buffer: &BitBuffer, pos: usize) -> Result<(Value, usize), ReadError> {
    let (v, bits) = buffer.read_number(pos)?;
    Ok((Value::Number(v), bits))
}

fn encode_string(buffer: &mut BitBuffer, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::String(v) => buffer.write_string(v, TagMode::Bare).map(drop),
        other => Err(EncodeError::mismatch(STRING, other)),
    }
}

fn decode_string(buffer: &BitBuffer, pos: usize) -> Result<(Value, usize), ReadError> {
    let (v, bits) = buffer.read_string(pos)?;
    Ok((Value::String(v), bits))
}

fn encode_int8(buffer: &mut BitBuffer, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Int8(v) => buffer.write_int8(*v, TagMode::Bare).map(drop),
        other => Err(EncodeError::mismatch(INT8, other)),
    }
}

fn decode_int8(buffer: &BitBuffer, pos: usize) -> Result<(Value, usize), ReadError> {
    let (v, bits) = buffer.read_int8(pos)?;
    Ok((Value::Int8(v), bits))
}

fn encode_int16(buffer: &mut BitBuffer, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Int16(v) => buffer.write_int16(*v, TagMode::Bare).map(drop),
        other => Err(EncodeError::mismatch(INT16, other)),
    }
}

fn decode_int16(buffer: &BitBuffer, pos: usize) -> Result<(Value, usize), ReadError> {
    let (v, bits) = buffer.read_int16(pos)?;
    Ok((Value::Int16(v), bits))
}

fn encode_int32(buffer: &mut BitBuffer, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Int32(v) => buffer.write_int32(*v, TagMode::Bare).map(drop),
        other => Err(EncodeError::mismatch(INT32, other)),
    }
}

fn decode_int32(buffer: &BitBuffer, pos: usize) -> Result<(Value, usize), ReadError> {
    let (v, bits) = buffer.read_int32(pos)?;
    Ok((Value::Int32(v), bits))
}

fn encode_uint8(buffer: &mut BitBuffer, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::UInt8(v) => buffer.write_uint8(*v, TagMode::Bare).map(drop),
        other => Err(EncodeError::mismatch(UINT8, other)),
    }
}

fn decode_uint8(buffer: &BitBuffer, pos: usize) -> Result<(Value, usize), ReadError> {
    let (v, bits) = buffer.read_uint8(pos)?;
    Ok((Value::UInt8(v), bits))
}

fn encode_uint16(buffer: &mut BitBuffer, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::UInt16(v) => buffer.write_uint16(*v, TagMode::Bare).map(drop),
        other => Err(EncodeError::mismatch(UINT16, other)),
    }
}

fn decode_uint16(buffer: &BitBuffer, pos: usize) -> Result<(Value, usize), ReadError> {
    let (v, bits) = buffer.read_uint16(pos)?;
    Ok((Value::UInt16(v), bits))
}

fn encode_uint32(buffer: &mut BitBuffer, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::UInt32(v) => buffer.write_uint32(*v, TagMode::Bare).map(drop),
        other => Err(EncodeError::mismatch(UINT32, other)),
    }
}

fn decode_uint32(buffer: &BitBuffer, pos: usize) -> Result<(Value, usize), ReadError> {
    let (v, bits) = buffer.read_uint32(pos)?;
    Ok((Value::UInt32(v), bits))
}

fn encode_float32(buffer: &mut BitBuffer, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Float32(v) => buffer.write_float32(*v, TagMode::Bare).map(drop),
        other => Err(EncodeError::mismatch(FLOAT32, other)),
    }
}

fn decode_float32(buffer: &BitBuffer, pos: usize) -> Result<(Value, usize), ReadError> {
    let (v, bits) = buffer.read_float32(pos)?;
    Ok((Value::Float32(v), bits))
}

fn encode_bytes(buffer: &mut BitBuffer, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Bytes(v) => buffer.write_bytes(v, TagMode::Bare).map(drop),
        other => Err(EncodeError::mismatch(BYTES, other)),
    }
}

fn decode_bytes(buffer: &BitBuffer, pos: usize) -> Result<(Value, usize), ReadError> {
    let (v, bits) = buffer.read_bytes(pos)?;
    Ok((Value::Bytes(v), bits))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::registry::TypeRegistry;

    use super::*;

    #[test]
    fn test_standard_tags_are_stable() {
        let registry = TypeRegistry::standard();
        let names: Vec<&str> = registry.iter().map(|kind| kind.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                BOOLEAN, NUMBER, STRING, INT8, INT16, INT32, UINT8, UINT16, UINT32, FLOAT32, BYTES
            ]
        );
        assert_eq!(registry.tag_for(BOOLEAN), Some(1));
        assert_eq!(registry.tag_for(BYTES), Some(11));
    }

    #[test]
    fn test_value_kind_names_resolve() {
        let registry = TypeRegistry::standard();
        let values = [
            Value::Boolean(true),
            Value::Number(0.0),
            Value::String(String::new()),
            Value::Int8(0),
            Value::Int16(0),
            Value::Int32(0),
            Value::UInt8(0),
            Value::UInt16(0),
            Value::UInt32(0),
            Value::Float32(0.0),
            Value::Bytes(vec![]),
        ];

        for value in &values {
            assert!(registry.lookup(value.kind_name()).is_some(), "{:?}", value);
        }
    }

    #[test]
    fn test_fixed_widths_match_encoders() {
        let registry = Arc::new(TypeRegistry::standard());
        let samples = [
            Value::Boolean(true),
            Value::Number(-0.5),
            Value::Int8(i8::MIN),
            Value::Int16(i16::MAX),
            Value::Int32(i32::MIN),
            Value::UInt8(u8::MAX),
            Value::UInt16(u16::MAX),
            Value::UInt32(u32::MAX),
            Value::Float32(f32::NEG_INFINITY),
        ];

        for value in &samples {
            let kind = registry.lookup(value.kind_name()).unwrap();
            let mut buf = BitBuffer::new(registry.clone(), 16);
            (kind.encode)(&mut buf, value).unwrap();

            assert_eq!(Some(buf.bit_len() as u32), kind.width.bits());
            assert_eq!((kind.decode)(&buf, 0).unwrap(), (value.clone(), buf.bit_len()));
        }
    }

    #[test]
    fn test_encoder_rejects_other_kinds() {
        let mut buf = BitBuffer::new(Arc::new(TypeRegistry::standard()), 8);
        assert_eq!(
            encode_boolean(&mut buf, &Value::Int8(1)).unwrap_err(),
            EncodeError::KindMismatch {
                expected: "boolean".to_string(),
                found: "int8".to_string()
            }
        );
        assert_eq!(buf.bit_len(), 0);
    }

    #[test]
    fn test_standard_kind_lookup() {
        assert_eq!(standard_kind("Float32").unwrap().width, Width::Fixed(32));
        assert!(standard_kind("vector3").is_none());
    }
}
