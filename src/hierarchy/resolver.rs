//! Type hierarchy resolution
//!
//! Resolution turns registry metadata into the per-type facts the type-filter
//! translator needs:
//!
//! - the discriminator path, root to type inclusive
//! - whether the type is a flat root (the root, with no subtypes)
//! - the discriminator value stored on documents of the type
//!
//! The root always has a path of length 1 and its documents store the bare
//! type name. Every other type has a path of length 2 or more and stores the
//! full path as an array. A scalar equality on the discriminator therefore
//! matches a type and all of its subtypes, while an exact match needs either
//! an array-shape test or, for the root, a "not an array" test.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::registry::TypeRegistry;
use crate::translator::{TranslationError, TranslationResult};

/// Ordered type names from hierarchy root to a type, inclusive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscriminatorPath(Vec<String>);

impl DiscriminatorPath {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns true if `self` starts with every element of `prefix`
    pub fn starts_with(&self, prefix: &DiscriminatorPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for DiscriminatorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" > "))
    }
}

/// Resolution result for one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub name: String,
    pub discriminator_path: DiscriminatorPath,
    /// The type is the root and nothing derives from it
    pub is_flat_root: bool,
}

/// A resolved, single-rooted type tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHierarchy {
    root: String,
    types: BTreeMap<String, ResolvedType>,
    children: BTreeMap<String, Vec<String>>,
}

impl TypeHierarchy {
    /// Resolves the hierarchy containing `document_type`.
    ///
    /// Every registered type is validated, so a dangling supertype or cycle
    /// anywhere in the registry fails with `InvalidHierarchy`.
    pub fn resolve_for(registry: &TypeRegistry, document_type: &str) -> TranslationResult<Self> {
        let root = registry.root_of(document_type)?.to_string();

        let mut paths = BTreeMap::new();
        for descriptor in registry.iter() {
            if let Some(path) = registry.path_from(&root, &descriptor.name)? {
                paths.insert(descriptor.name.clone(), path);
            }
        }

        let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for name in paths.keys() {
            if let Some(parent) = registry.get(name).and_then(|d| d.supertype.as_ref()) {
                if paths.contains_key(parent) && *name != root {
                    children.entry(parent.clone()).or_default().push(name.clone());
                }
            }
        }

        let root_has_subtypes = children.get(&root).is_some_and(|c| !c.is_empty());
        let types = paths
            .into_iter()
            .map(|(name, path)| {
                let resolved = ResolvedType {
                    is_flat_root: name == root && !root_has_subtypes,
                    discriminator_path: DiscriminatorPath::new(path),
                    name: name.clone(),
                };
                (name, resolved)
            })
            .collect();

        Ok(Self {
            root,
            types,
            children,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn resolve(&self, name: &str) -> Option<&ResolvedType> {
        self.types.get(name)
    }

    /// Like [`resolve`](Self::resolve), but a type outside the hierarchy is
    /// an `AmbiguousTypeFilter` error
    pub fn require(&self, name: &str) -> TranslationResult<&ResolvedType> {
        self.types
            .get(name)
            .ok_or_else(|| TranslationError::ambiguous_type_filter(name, &self.root))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns true if some type derives from `name`
    pub fn has_subtypes(&self, name: &str) -> bool {
        self.children.get(name).is_some_and(|c| !c.is_empty())
    }

    /// All strict descendants of `name`, depth first
    pub fn subtypes_of(&self, name: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = self.children_of(name).rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children_of(current).rev());
        }
        out
    }

    fn children_of<'h>(&'h self, name: &str) -> impl DoubleEndedIterator<Item = &'h str> + 'h {
        self.children
            .get(name)
            .into_iter()
            .flat_map(|children| children.iter().map(String::as_str))
    }

    /// Returns true if a `sub` value may be used where `sup` is expected
    pub fn is_assignable(&self, sub: &str, sup: &str) -> bool {
        match (self.types.get(sub), self.types.get(sup)) {
            (Some(sub), Some(sup)) => sub.discriminator_path.starts_with(&sup.discriminator_path),
            _ => false,
        }
    }

    /// Discriminator value stored on a document of type `name`
    pub fn discriminator_value(&self, name: &str) -> Option<Value> {
        let resolved = self.types.get(name)?;
        if resolved.name == self.root {
            return Some(Value::String(resolved.name.clone()));
        }
        Some(Value::Array(
            resolved
                .discriminator_path
                .iter()
                .map(|n| Value::String(n.to_string()))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::registry::TypeDescriptor;
    use crate::translator::TranslationErrorCode;
    use serde_json::json;

    fn hierarchy(document_type: &str) -> TypeHierarchy {
        let registry = TypeRegistry::from_descriptors([
            TypeDescriptor::root("B"),
            TypeDescriptor::derived("C", "B"),
            TypeDescriptor::derived("D", "C"),
            TypeDescriptor::derived("E", "B"),
            TypeDescriptor::root("Flat"),
        ])
        .unwrap();
        TypeHierarchy::resolve_for(&registry, document_type).unwrap()
    }

    #[test]
    fn test_paths_from_root() {
        let h = hierarchy("C");
        assert_eq!(h.root(), "B");
        assert_eq!(h.len(), 4);
        assert_eq!(h.resolve("B").unwrap().discriminator_path.len(), 1);
        assert_eq!(
            h.resolve("D").unwrap().discriminator_path.as_slice(),
            &["B".to_string(), "C".to_string(), "D".to_string()]
        );
        assert!(!h.contains("Flat"));
    }

    #[test]
    fn test_flat_root_classification() {
        assert!(!hierarchy("B").resolve("B").unwrap().is_flat_root);
        assert!(hierarchy("Flat").resolve("Flat").unwrap().is_flat_root);
    }

    #[test]
    fn test_subtypes_and_assignability() {
        let h = hierarchy("B");
        assert_eq!(h.subtypes_of("B"), vec!["C", "D", "E"]);
        assert_eq!(h.subtypes_of("C"), vec!["D"]);
        assert!(h.subtypes_of("D").is_empty());
        assert!(h.is_assignable("D", "B"));
        assert!(h.is_assignable("C", "C"));
        assert!(!h.is_assignable("E", "C"));
        assert!(!h.is_assignable("B", "C"));
    }

    #[test]
    fn test_discriminator_values() {
        let h = hierarchy("B");
        assert_eq!(h.discriminator_value("B"), Some(json!("B")));
        assert_eq!(h.discriminator_value("D"), Some(json!(["B", "C", "D"])));
        assert_eq!(h.discriminator_value("Nope"), None);
    }

    #[test]
    fn test_require_outside_hierarchy() {
        let err = hierarchy("B").require("Flat").unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::AmbiguousTypeFilter);
        assert_eq!(err.subject(), Some("Flat"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        assert_eq!(hierarchy("D"), hierarchy("B"));
    }
}
