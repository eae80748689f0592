//! Query context
//!
//! Owns the type registry, the resolved hierarchy cache, the translator
//! configuration, the serializer and the translation counters. Pipelines
//! created from a context share all of these.

use std::sync::Arc;

use crate::config::TranslatorConfig;
use crate::expression::TypeRef;
use crate::hierarchy::{HierarchyCache, TypeDescriptor, TypeHierarchy, TypeRegistry};
use crate::observability::TranslationMetrics;
use crate::pipeline::{Pipeline, PipelineEnv};
use crate::translator::{JsonSerializer, Serializer, TranslationResult};

/// Entry point for building pipelines
pub struct QueryContext {
    registry: TypeRegistry,
    cache: HierarchyCache,
    config: TranslatorConfig,
    serializer: Arc<dyn Serializer>,
    metrics: Arc<TranslationMetrics>,
}

impl QueryContext {
    /// Context with the default configuration and JSON serializer
    pub fn new(registry: TypeRegistry) -> Self {
        Self::with_config(registry, TranslatorConfig::default())
    }

    /// Context with `config`. The process log level is left alone; apply it
    /// once at setup with [`TranslatorConfig::init_logging`].
    pub fn with_config(registry: TypeRegistry, config: TranslatorConfig) -> Self {
        Self {
            registry,
            cache: HierarchyCache::new(),
            config,
            serializer: Arc::new(JsonSerializer),
            metrics: Arc::new(TranslationMetrics::new()),
        }
    }

    /// Replaces the literal serializer for pipelines created afterwards
    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Resolved hierarchies cached so far
    pub fn cached_hierarchies(&self) -> usize {
        self.cache.len()
    }

    /// Empty pipeline over `collection`, whose documents are `document_type`.
    ///
    /// A type missing from the registry is treated as a hierarchy of its own
    /// with no subtypes.
    pub fn query(&self, collection: impl Into<String>, document_type: impl Into<TypeRef>) -> TranslationResult<Pipeline> {
        let document_type = document_type.into();
        let hierarchy = if self.registry.contains(document_type.name()) {
            self.cache
                .get_or_resolve(&self.registry, document_type.name(), &self.metrics)?
        } else {
            let registry = TypeRegistry::from_descriptors([TypeDescriptor::standalone(document_type.name())])?;
            Arc::new(TypeHierarchy::resolve_for(&registry, document_type.name())?)
        };

        Ok(Pipeline::new(PipelineEnv {
            collection: collection.into(),
            document_type,
            hierarchy,
            capabilities: self.config.capabilities(),
            serializer: Arc::clone(&self.serializer),
            metrics: Arc::clone(&self.metrics),
        }))
    }
}
