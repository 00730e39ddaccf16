//! # bitcodec
//!
//! A bit-addressable buffer and a self-describing tagged value stream.
//!
//! [bits] reads and writes fixed-width primitives at arbitrary *bit* offsets of a
//! byte region, including values that straddle byte boundaries. On top of it,
//! [buffer::BitBuffer] owns a fixed-capacity region and a committed-size cursor, and
//! writes each value as a one-byte kind tag followed by its payload. A
//! [registry::TypeRegistry] maps tags to kind names, widths and codec functions, so
//! a stream can be replayed without an external schema.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use bitcodec::buffer::BitBuffer;
//! use bitcodec::registry::TypeRegistry;
//! use bitcodec::value::Value;
//!
//! let registry = Arc::new(TypeRegistry::standard());
//! let values = vec![Value::Boolean(true), Value::Number(42.5), Value::from("hi")];
//!
//! let buffer = BitBuffer::from_values(registry, &values, 32).unwrap();
//! assert_eq!(buffer.bit_len(), 137);
//! assert_eq!(buffer.deserialize().unwrap(), values);
//! ```

pub mod bits;
pub mod buffer;
pub mod catalog;
pub mod errors;
pub mod kind;
pub mod registry;
#[cfg(feature = "serde")]
pub mod serde;
mod stream;
pub mod value;
