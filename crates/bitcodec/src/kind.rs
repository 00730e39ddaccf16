//! Definition of value kinds used to build a [crate::registry::TypeRegistry].

use std::fmt;

use crate::{
    buffer::BitBuffer,
    errors::{EncodeError, ReadError},
    value::Value,
};

/// Writes the payload of a value (no tag) at the buffer's current size.
pub type EncodeFn = fn(&mut BitBuffer, &Value) -> Result<(), EncodeError>;

/// Reads a payload at a bit position and returns the value and the bits it took (no tag).
pub type DecodeFn = fn(&BitBuffer, usize) -> Result<(Value, usize), ReadError>;

/// Encoded payload width of a kind, not counting its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// Every value takes exactly this many bits.
    Fixed(u32),
    /// Width depends on the value (e.g. text with a length prefix).
    Variable,
}

impl Width {
    /// The fixed width in bits, or `None` for variable-width kinds.
    pub fn bits(self) -> Option<u32> {
        match self {
            Width::Fixed(bits) => Some(bits),
            Width::Variable => None,
        }
    }
}

/// A single kind in a registry: its name, payload width and codec functions.
#[derive(Clone)]
pub struct KindDef {
    /// Lookup name. Matched case-insensitively.
    pub name: String,
    pub width: Width,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
}

impl KindDef {
    pub fn new(name: impl Into<String>, width: Width, encode: EncodeFn, decode: DecodeFn) -> Self {
        KindDef {
            name: name.into(),
            width,
            encode,
            decode,
        }
    }
}

impl fmt::Debug for KindDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindDef")
            .field("name", &self.name)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}
