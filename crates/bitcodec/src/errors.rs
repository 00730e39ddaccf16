//! Error types for bit access, registry compilation and stream coding.

use thiserror::Error;

use crate::value::Value;

/// Errors produced when reading bits, either from a raw region or from a [crate::buffer::BitBuffer].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// Requested bit range is beyond the end of the byte region.
    #[error("read of {width} bits at offset {offset} exceeds region of {capacity} bits")]
    OutOfBounds {
        offset: usize,
        width: usize,
        capacity: usize,
    },
    /// Requested bit range is beyond the committed size of the buffer.
    #[error("read of {width} bits at offset {offset} exceeds committed size of {size} bits")]
    OutOfRange {
        offset: usize,
        width: usize,
        size: usize,
    },
    /// Width is 0 or greater than 32 bits.
    #[error("invalid bit width {0}")]
    InvalidWidth(u32),
    /// Text payload is not valid UTF-8.
    #[error("text at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },
}

/// Errors produced when writing bits into a byte region.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// The write would run past the end of the byte region.
    #[error("write of {width} bits at offset {offset} exceeds capacity of {capacity} bits")]
    CapacityExceeded {
        offset: usize,
        width: usize,
        capacity: usize,
    },
    /// Width is 0 or greater than 32 bits.
    #[error("invalid bit width {0}")]
    InvalidWidth(u32),
    /// Value has bits set above `width`.
    #[error("value {value:#x} does not fit in {width} bits")]
    ValueTooWide { value: u32, width: u32 },
    /// Variable-width payload longer than a u32 length prefix can describe.
    #[error("payload of {0} bytes is too long for a 32-bit length prefix")]
    LengthTooLarge(usize),
}

/// Errors produced when compiling [crate::kind::KindDef]s into a [crate::registry::TypeRegistry].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// More kinds than a one-byte tag can address (tag 0 is reserved).
    #[error("{0} kinds registered, at most 255 fit in a one-byte tag")]
    TooManyKinds(usize),
    /// Two kinds share the same (case-normalized) name.
    #[error("kind `{0}` is registered twice")]
    DuplicateKind(String),
    /// Kind name is empty.
    #[error("kind name is empty")]
    EmptyName,
    /// Fixed-width kind declared with a width of 0.
    #[error("kind `{name}` has a fixed width of 0 bits")]
    InvalidWidth { name: String },
    /// Configuration names a kind that has no built-in definition.
    #[error("no built-in definition for kind `{0}`")]
    UnknownKind(String),
    /// Configuration could not be parsed.
    #[error("invalid registry configuration: {0}")]
    InvalidConfig(String),
}

/// Errors produced when writing values into the tagged stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Value's kind has no registry entry.
    #[error("kind `{0}` is not registered")]
    UnknownKind(String),
    /// Value handed to an encoder of a different kind.
    #[error("expected a `{expected}` value, found `{found}`")]
    KindMismatch { expected: String, found: String },
    /// Encoder of a fixed-width kind wrote a different number of bits than declared.
    #[error("kind `{kind}` declares {declared} bits but its encoder wrote {written}")]
    WidthMismatch {
        kind: String,
        declared: usize,
        written: usize,
    },
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl EncodeError {
    /// Mismatch between the kind an encoder handles and the value it was given.
    pub fn mismatch(expected: &str, found: &Value) -> Self {
        EncodeError::KindMismatch {
            expected: expected.to_string(),
            found: found.kind_name().to_string(),
        }
    }
}

/// Errors produced when replaying a tagged stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Tag byte with no registry entry. `decoded` holds the values read before it.
    #[error("unknown tag {tag} at bit offset {offset}")]
    UnknownTag {
        tag: u8,
        offset: usize,
        decoded: Vec<Value>,
    },
    /// Decoder of a fixed-width kind consumed a different number of bits than declared.
    #[error("tag {tag} at bit offset {offset} declares {declared} bits but its decoder read {consumed}")]
    WidthMismatch {
        tag: u8,
        offset: usize,
        declared: usize,
        consumed: usize,
    },
    #[error(transparent)]
    Read(#[from] ReadError),
}
