//! Discriminator clauses for type-narrowing predicates
//!
//! | Shape                    | Clauses                                                  |
//! |--------------------------|----------------------------------------------------------|
//! | narrow to subtree of T   | `{ "_t" : "T" }`                                         |
//! | exact T, path length > 1 | `{ "_t" : { "$size" : n }, "_t.0" : .., "_t.(n-1)" : .. }` |
//! | exact T, path length 1   | `{ "_t.0" : { "$exists" : false }, "_t" : "T" }`         |
//!
//! The last form needs server support for indexed element existence. Without
//! it a flat root, which has no subtypes to exclude, falls back to the plain
//! `{ "_t" : "T" }` equality. For any other root the exact narrowing is left
//! out and a warning is logged.

use serde_json::{json, Value};

use super::document::{ClauseFragment, DISCRIMINATOR_FIELD};
use super::errors::TranslationResult;
use crate::config::ServerCapabilities;
use crate::expression::TypeRef;
use crate::hierarchy::TypeHierarchy;
use crate::observability::{Event, Logger, TranslationMetrics};

/// Builds discriminator clauses against one resolved hierarchy
#[derive(Debug, Clone, Copy)]
pub struct TypeFilterTranslator<'a> {
    hierarchy: &'a TypeHierarchy,
    capabilities: ServerCapabilities,
    metrics: &'a TranslationMetrics,
}

impl<'a> TypeFilterTranslator<'a> {
    pub fn new(
        hierarchy: &'a TypeHierarchy,
        capabilities: ServerCapabilities,
        metrics: &'a TranslationMetrics,
    ) -> Self {
        Self {
            hierarchy,
            capabilities,
            metrics,
        }
    }

    pub fn hierarchy(&self) -> &'a TypeHierarchy {
        self.hierarchy
    }

    /// Matches `ty` and every subtype of it
    pub fn narrow_to_subtree(&self, ty: &TypeRef) -> TranslationResult<Vec<ClauseFragment>> {
        let resolved = self.hierarchy.require(ty.name())?;
        Ok(vec![ClauseFragment::equals(
            DISCRIMINATOR_FIELD,
            Value::String(resolved.name.clone()),
        )])
    }

    /// Matches `ty` only, never a subtype or supertype
    pub fn exact_type(&self, ty: &TypeRef) -> TranslationResult<Vec<ClauseFragment>> {
        let resolved = self.hierarchy.require(ty.name())?;
        let path = &resolved.discriminator_path;

        if path.len() > 1 {
            let mut fragments = Vec::with_capacity(path.len() + 1);
            fragments.push(ClauseFragment::operator(
                DISCRIMINATOR_FIELD,
                "$size",
                json!(path.len()),
            ));
            for (index, name) in path.iter().enumerate() {
                fragments.push(ClauseFragment::equals(
                    element_field(index),
                    Value::String(name.to_string()),
                ));
            }
            return Ok(fragments);
        }

        if !self.capabilities.supports_indexed_element_exists {
            if resolved.is_flat_root {
                return self.narrow_to_subtree(ty);
            }
            self.metrics.increment_degraded_type_filters();
            Logger::warn(
                Event::TypeFilterDegraded,
                &[
                    ("reason", "server lacks indexed element existence test"),
                    ("type", ty.name()),
                ],
            );
            return Ok(Vec::new());
        }

        Ok(vec![
            ClauseFragment::operator(element_field(0), "$exists", Value::Bool(false)),
            ClauseFragment::equals(DISCRIMINATOR_FIELD, Value::String(resolved.name.clone())),
        ])
    }
}

/// `_t.<index>`
fn element_field(index: usize) -> String {
    format!("{}.{}", DISCRIMINATOR_FIELD, index)
}
