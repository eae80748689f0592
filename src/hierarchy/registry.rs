//! Document type metadata
//!
//! The registry records, per document type, its direct supertype and whether
//! it was declared as a discriminator root.

use std::collections::BTreeMap;

use crate::translator::{TranslationError, TranslationResult};

/// Inheritance metadata for one document type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Type name, also its discriminator value
    pub name: String,
    /// Direct supertype, `None` for a topmost type
    pub supertype: Option<String>,
    /// Declared as the root of a discriminator hierarchy
    pub is_root: bool,
}

impl TypeDescriptor {
    /// A type declared as hierarchy root
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertype: None,
            is_root: true,
        }
    }

    /// A type derived from `supertype`
    pub fn derived(name: impl Into<String>, supertype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertype: Some(supertype.into()),
            is_root: false,
        }
    }

    /// A type with no supertype and no root declaration
    pub fn standalone(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertype: None,
            is_root: false,
        }
    }

    /// Marks this type as a hierarchy root
    pub fn as_root(mut self) -> Self {
        self.is_root = true;
        self
    }
}

/// Registry of known document types
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type. A name may only be registered once.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> TranslationResult<()> {
        if self.types.contains_key(&descriptor.name) {
            return Err(TranslationError::invalid_hierarchy(format!(
                "Type '{}' is registered more than once",
                descriptor.name
            )));
        }
        self.types.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Builds a registry from descriptors
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = TypeDescriptor>,
    ) -> TranslationResult<Self> {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    /// Direct supertype of `name`, validated to be registered
    fn supertype_of(&self, descriptor: &TypeDescriptor) -> TranslationResult<Option<&TypeDescriptor>> {
        match &descriptor.supertype {
            None => Ok(None),
            Some(parent) => self.types.get(parent).map(Some).ok_or_else(|| {
                TranslationError::invalid_hierarchy(format!(
                    "Type '{}' derives from unregistered type '{}'",
                    descriptor.name, parent
                ))
            }),
        }
    }

    /// Root of the hierarchy `name` belongs to: the nearest ancestor
    /// (inclusive) declared as root, otherwise the topmost ancestor.
    pub fn root_of(&self, name: &str) -> TranslationResult<&str> {
        let mut current = self.types.get(name).ok_or_else(|| {
            TranslationError::invalid_hierarchy(format!("Type '{}' is not registered", name))
        })?;

        // A chain longer than the registry must revisit a type
        for _ in 0..=self.types.len() {
            if current.is_root {
                return Ok(&current.name);
            }
            match self.supertype_of(current)? {
                Some(parent) => current = parent,
                None => return Ok(&current.name),
            }
        }

        Err(TranslationError::invalid_hierarchy(format!(
            "Inheritance cycle through type '{}'",
            name
        )))
    }

    /// Chain of type names from `root` down to `name`, inclusive, or `None`
    /// when `name` does not belong to the hierarchy rooted at `root`.
    pub(crate) fn path_from(&self, root: &str, name: &str) -> TranslationResult<Option<Vec<String>>> {
        if self.root_of(name)? != root {
            return Ok(None);
        }

        let mut path = Vec::new();
        let mut current = self.types.get(name);
        while let Some(descriptor) = current {
            path.push(descriptor.name.clone());
            if descriptor.name == root {
                path.reverse();
                return Ok(Some(path));
            }
            current = self.supertype_of(descriptor)?;
        }

        // root_of succeeded, so the walk always reaches the root
        Err(TranslationError::invalid_hierarchy(format!(
            "Type '{}' does not reach root '{}'",
            name, root
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::TranslationErrorCode;

    fn registry() -> TypeRegistry {
        TypeRegistry::from_descriptors([
            TypeDescriptor::root("B"),
            TypeDescriptor::derived("C", "B"),
            TypeDescriptor::derived("D", "C"),
            TypeDescriptor::standalone("Plain"),
        ])
        .unwrap()
    }

    #[test]
    fn test_root_of_walks_to_declared_root() {
        let registry = registry();
        assert_eq!(registry.root_of("D").unwrap(), "B");
        assert_eq!(registry.root_of("B").unwrap(), "B");
        assert_eq!(registry.root_of("Plain").unwrap(), "Plain");
    }

    #[test]
    fn test_root_declaration_cuts_chain() {
        let registry = TypeRegistry::from_descriptors([
            TypeDescriptor::standalone("Entity"),
            TypeDescriptor::derived("Animal", "Entity").as_root(),
            TypeDescriptor::derived("Cat", "Animal"),
        ])
        .unwrap();
        assert_eq!(registry.root_of("Cat").unwrap(), "Animal");
        assert_eq!(registry.root_of("Entity").unwrap(), "Entity");
    }

    #[test]
    fn test_path_from_root() {
        let registry = registry();
        assert_eq!(
            registry.path_from("B", "D").unwrap(),
            Some(vec!["B".to_string(), "C".to_string(), "D".to_string()])
        );
        assert_eq!(registry.path_from("B", "Plain").unwrap(), None);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = registry();
        let err = registry.register(TypeDescriptor::root("B")).unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::InvalidHierarchy);
    }

    #[test]
    fn test_unregistered_supertype_rejected() {
        let registry = TypeRegistry::from_descriptors([TypeDescriptor::derived("C", "Missing")]).unwrap();
        let err = registry.root_of("C").unwrap_err();
        assert_eq!(err.code(), TranslationErrorCode::InvalidHierarchy);
        assert!(err.message().contains("Missing"));
    }

    #[test]
    fn test_cycle_rejected() {
        let registry = TypeRegistry::from_descriptors([
            TypeDescriptor::derived("X", "Y"),
            TypeDescriptor::derived("Y", "X"),
        ])
        .unwrap();
        let err = registry.root_of("X").unwrap_err();
        assert!(err.message().contains("cycle"));
    }
}
