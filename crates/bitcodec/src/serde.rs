//! JSON‑deserializable registry description.
//!
//! A registry is described by the ordered list of built-in kinds it enables. The
//! position of a kind in the list fixes its tag, so producer and consumer must load
//! the same description:
//!
//! ```json
//! { "kinds": ["boolean", "number", "string"] }
//! ```
//!
//! Compound kinds carry codec functions and cannot be described this way; register
//! them in code with [crate::registry::TypeRegistry::compile].

use serde::{Deserialize, Serialize};

/// Top‑level registry definition.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RegistryDef {
    /// Built-in kind names in tag order. Matched case-insensitively.
    pub kinds: Vec<String>,
}
