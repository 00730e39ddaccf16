//! Registry: compiled set of kinds mapping names to one-byte tags, widths and codecs.

use std::collections::{HashMap, HashSet};

use crate::{
    catalog,
    errors::RegistryError,
    kind::{DecodeFn, EncodeFn, KindDef, Width},
};

/// Tag that ends a stream. Never assigned to a kind.
pub const END_TAG: u8 = 0;

/// Most kinds a registry can hold with a one-byte tag.
pub const MAX_KINDS: usize = u8::MAX as usize;

/// A kind after compilation, with its assigned tag.
#[derive(Debug, Clone)]
pub struct RegisteredKind {
    pub tag: u8,
    /// Name as it was declared.
    pub name: String,
    pub width: Width,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
}

/// A compiled registry. Tags follow declaration order starting at 1, and that order
/// is part of the wire format: producer and consumer must compile the same list.
///
/// Use [TypeRegistry::compile] to build from [KindDef]s or [TypeRegistry::standard]
/// for the built-in catalog.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    /// Indexed by `tag - 1`.
    kinds: Vec<RegisteredKind>,
    by_name: HashMap<String, u8>,
}

fn normalize(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl TypeRegistry {
    /// Compiles kinds in order, assigning tag `i + 1` to the `i`th. Fails if any kind is invalid.
    pub fn compile(kinds: &[KindDef]) -> Result<Self, RegistryError> {
        if kinds.len() > MAX_KINDS {
            return Err(RegistryError::TooManyKinds(kinds.len()));
        }

        let mut seen = HashSet::with_capacity(kinds.len());
        for kind in kinds {
            if kind.name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if kind.width == Width::Fixed(0) {
                return Err(RegistryError::InvalidWidth {
                    name: kind.name.clone(),
                });
            }
            if !seen.insert(normalize(&kind.name)) {
                return Err(RegistryError::DuplicateKind(kind.name.clone()));
            }
        }

        Ok(Self::assemble(kinds))
    }

    /// The built-in catalog of primitive kinds.
    pub fn standard() -> Self {
        Self::assemble(&catalog::standard_kinds())
    }

    /// The built-in catalog followed by `extra`, which get tags after the built-ins.
    pub fn standard_with(extra: &[KindDef]) -> Result<Self, RegistryError> {
        let mut kinds = catalog::standard_kinds();
        kinds.extend_from_slice(extra);

        Self::compile(&kinds)
    }

    fn assemble(kinds: &[KindDef]) -> Self {
        let mut compiled = Vec::with_capacity(kinds.len());
        let mut by_name = HashMap::with_capacity(kinds.len());

        for (tag, kind) in (1..=u8::MAX).zip(kinds) {
            by_name.insert(normalize(&kind.name), tag);
            compiled.push(RegisteredKind {
                tag,
                name: kind.name.clone(),
                width: kind.width,
                encode: kind.encode,
                decode: kind.decode,
            });
        }

        Self {
            kinds: compiled,
            by_name,
        }
    }

    pub fn tag_for(&self, name: &str) -> Option<u8> {
        self.by_name.get(&normalize(name)).copied()
    }

    pub fn name_for(&self, tag: u8) -> Option<&str> {
        self.get(tag).map(|kind| kind.name.as_str())
    }

    pub fn width_for(&self, tag: u8) -> Option<Width> {
        self.get(tag).map(|kind| kind.width)
    }

    /// Entry for `tag`. [END_TAG] has none.
    pub fn get(&self, tag: u8) -> Option<&RegisteredKind> {
        if tag == END_TAG {
            return None;
        }

        self.kinds.get(tag as usize - 1)
    }

    /// Entry for `name`, matched case-insensitively.
    pub fn lookup(&self, name: &str) -> Option<&RegisteredKind> {
        self.tag_for(name).and_then(|tag| self.get(tag))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Kinds in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredKind> {
        self.kinds.iter()
    }
}

#[cfg(feature = "serde")]
impl TryFrom<crate::serde::RegistryDef> for TypeRegistry {
    type Error = RegistryError;

    fn try_from(value: crate::serde::RegistryDef) -> Result<Self, Self::Error> {
        let kinds = value
            .kinds
            .iter()
            .map(|name| {
                catalog::standard_kind(name).ok_or_else(|| RegistryError::UnknownKind(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::compile(&kinds)
    }
}

#[cfg(feature = "serde")]
impl TypeRegistry {
    /// Compiles a registry from a JSON [crate::serde::RegistryDef].
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let def: crate::serde::RegistryDef =
            serde_json::from_str(json).map_err(|e| RegistryError::InvalidConfig(e.to_string()))?;

        def.try_into()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        buffer::BitBuffer,
        errors::{EncodeError, ReadError},
        value::Value,
    };

    use super::*;

    fn encode_nothing(_: &mut BitBuffer, _: &Value) -> Result<(), EncodeError> {
        Ok(())
    }

    fn decode_nothing(_: &BitBuffer, _: usize) -> Result<(Value, usize), ReadError> {
        Ok((Value::Boolean(false), 0))
    }

    fn def(name: &str, width: Width) -> KindDef {
        KindDef::new(name, width, encode_nothing, decode_nothing)
    }

    #[test]
    fn test_compile_assigns_tags_in_order() {
        let registry =
            TypeRegistry::compile(&[def("first", Width::Fixed(3)), def("second", Width::Variable)])
                .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tag_for("first"), Some(1));
        assert_eq!(registry.tag_for("second"), Some(2));
        assert_eq!(registry.name_for(2), Some("second"));
        assert_eq!(registry.width_for(1), Some(Width::Fixed(3)));
        assert_eq!(registry.width_for(2), Some(Width::Variable));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = TypeRegistry::compile(&[def("Vector3", Width::Fixed(96))]).unwrap();
        assert_eq!(registry.tag_for("vector3"), Some(1));
        assert_eq!(registry.tag_for("VECTOR3"), Some(1));
        assert_eq!(registry.lookup("vector3").unwrap().name, "Vector3");
    }

    #[test]
    fn test_end_tag_and_unknown_tags_have_no_entry() {
        let registry = TypeRegistry::compile(&[def("only", Width::Fixed(1))]).unwrap();
        assert!(registry.get(END_TAG).is_none());
        assert!(registry.get(2).is_none());
        assert_eq!(registry.name_for(0), None);
        assert_eq!(registry.tag_for("missing"), None);
    }

    #[test]
    fn test_duplicate_kind() {
        let result = TypeRegistry::compile(&[def("a", Width::Fixed(1)), def("A", Width::Fixed(2))]);
        assert_eq!(result.unwrap_err(), RegistryError::DuplicateKind("A".to_string()));
    }

    #[test]
    fn test_empty_name_and_zero_width() {
        assert_eq!(
            TypeRegistry::compile(&[def(" ", Width::Fixed(1))]).unwrap_err(),
            RegistryError::EmptyName
        );
        assert_eq!(
            TypeRegistry::compile(&[def("z", Width::Fixed(0))]).unwrap_err(),
            RegistryError::InvalidWidth {
                name: "z".to_string()
            }
        );
    }

    #[test]
    fn test_tag_capacity() {
        let full: Vec<KindDef> = (0..MAX_KINDS)
            .map(|i| def(&format!("k{}", i), Width::Fixed(1)))
            .collect();
        let registry = TypeRegistry::compile(&full).unwrap();
        assert_eq!(registry.tag_for("k254"), Some(255));

        let mut over = full;
        over.push(def("k255", Width::Fixed(1)));
        assert_eq!(
            TypeRegistry::compile(&over).unwrap_err(),
            RegistryError::TooManyKinds(256)
        );
    }

    #[test]
    fn test_standard_with_appends_after_builtins() {
        let builtins = TypeRegistry::standard().len();
        let registry = TypeRegistry::standard_with(&[def("vector3", Width::Fixed(96))]).unwrap();
        assert_eq!(registry.tag_for("vector3"), Some(builtins as u8 + 1));
    }

    #[test]
    fn test_standard_with_rejects_shadowing() {
        assert_eq!(
            TypeRegistry::standard_with(&[def("Boolean", Width::Fixed(1))]).unwrap_err(),
            RegistryError::DuplicateKind("Boolean".to_string())
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json() {
        let registry =
            TypeRegistry::from_json(r#"{ "kinds": ["String", "boolean", "uint8"] }"#).unwrap();
        assert_eq!(registry.tag_for("string"), Some(1));
        assert_eq!(registry.tag_for("boolean"), Some(2));
        assert_eq!(registry.width_for(3), Some(Width::Fixed(8)));
        assert_eq!(registry.tag_for("number"), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_errors() {
        assert_eq!(
            TypeRegistry::from_json(r#"{ "kinds": ["boolean", "vector3"] }"#).unwrap_err(),
            RegistryError::UnknownKind("vector3".to_string())
        );
        assert_eq!(
            TypeRegistry::from_json(r#"{ "kinds": ["int8", "INT8"] }"#).unwrap_err(),
            RegistryError::DuplicateKind("int8".to_string())
        );
        assert!(matches!(
            TypeRegistry::from_json("{ \"kinds\": 3 }").unwrap_err(),
            RegistryError::InvalidConfig(_)
        ));
    }
}
