//! Translation events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events of the translation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A stage was refused when appended to a pipeline
    PipelineStageRejected,
    /// A pipeline produced a query document
    TranslationComplete,
    /// A pipeline failed to translate
    TranslationFailed,
    /// An exact-type filter was dropped for lack of server support
    TypeFilterDegraded,
    /// A type hierarchy was resolved and cached
    HierarchyResolved,
    /// A translated query was handed to an executor
    QueryExecuted,
    /// Configuration loaded from disk
    ConfigLoaded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::PipelineStageRejected => "PIPELINE_STAGE_REJECTED",
            Event::TranslationComplete => "TRANSLATION_COMPLETE",
            Event::TranslationFailed => "TRANSLATION_FAILED",
            Event::TypeFilterDegraded => "TYPE_FILTER_DEGRADED",
            Event::HierarchyResolved => "HIERARCHY_RESOLVED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::PipelineStageRejected,
            Event::TranslationComplete,
            Event::TranslationFailed,
            Event::TypeFilterDegraded,
            Event::HierarchyResolved,
            Event::QueryExecuted,
            Event::ConfigLoaded,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::TypeFilterDegraded), "TYPE_FILTER_DEGRADED");
    }
}
