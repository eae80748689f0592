//! Document type hierarchies
//!
//! A [`TypeRegistry`] holds the inheritance metadata of every document type.
//! [`TypeHierarchy`] resolves the tree a query target belongs to, and
//! [`HierarchyCache`] keeps one resolved tree per root for the lifetime of a
//! query context.

mod cache;
mod registry;
mod resolver;

pub use cache::HierarchyCache;
pub use registry::{TypeDescriptor, TypeRegistry};
pub use resolver::{DiscriminatorPath, ResolvedType, TypeHierarchy};
