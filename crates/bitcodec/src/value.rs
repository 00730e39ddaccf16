//! Values carried by the tagged stream.

use crate::catalog;

/// A value that can be written to or read from the tagged stream.
///
/// Each variant maps to one built-in kind of [crate::catalog]. Kinds defined
/// outside this crate travel as [Value::Composite], named by their kind and
/// holding the sub-values their encoder writes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Boolean(bool),
    /// 64-bit IEEE double, the general numeric kind.
    Number(f64),
    String(String),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    Float32(f32),
    Bytes(Vec<u8>),
    /// Value of an externally registered compound kind.
    Composite { kind: String, parts: Vec<Value> },
}

impl Value {
    /// Name of the registry kind this value is written as.
    pub fn kind_name(&self) -> &str {
        match self {
            Value::Boolean(_) => catalog::BOOLEAN,
            Value::Number(_) => catalog::NUMBER,
            Value::String(_) => catalog::STRING,
            Value::Int8(_) => catalog::INT8,
            Value::Int16(_) => catalog::INT16,
            Value::Int32(_) => catalog::INT32,
            Value::UInt8(_) => catalog::UINT8,
            Value::UInt16(_) => catalog::UINT16,
            Value::UInt32(_) => catalog::UINT32,
            Value::Float32(_) => catalog::FLOAT32,
            Value::Bytes(_) => catalog::BYTES,
            Value::Composite { kind, .. } => kind,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}
