//! Clause composition
//!
//! Fragments are merged front to back into one query document:
//!
//! 1. A field seen for the first time is appended.
//! 2. A repeated field whose most recent entry is an operator object, paired
//!    with a new operator object that shares no operator with it, merges into
//!    that entry.
//! 3. Any other repeat is appended as a second entry under the same key.
//!
//! Merging never overwrites an operand, so no constraint is lost. Rule 3 keeps duplicate keys in encounter order, so "outer filter, type
//! filter, inner filter" reads left to right in the rendered document.

use super::document::{ClauseFragment, ClauseValue, QueryDocument};

/// Accumulates fragments into a query document
#[derive(Debug, Default)]
pub struct ClauseComposer {
    document: QueryDocument,
}

impl ClauseComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composes an ordered list of fragments
    pub fn compose(fragments: impl IntoIterator<Item = ClauseFragment>) -> QueryDocument {
        let mut composer = Self::new();
        composer.extend(fragments);
        composer.finish()
    }

    /// Adds one fragment
    pub fn push(&mut self, fragment: ClauseFragment) {
        let ClauseFragment { field, clause } = fragment;

        if let ClauseValue::Operators(incoming) = clause {
            match self.document.last_mut(&field) {
                Some(ClauseValue::Operators(existing)) if !existing.overlaps(&incoming) => {
                    existing.merge(incoming)
                }
                _ => self.document.push(field, ClauseValue::Operators(incoming)),
            }
            return;
        }

        self.document.push(field, clause);
    }

    pub fn extend(&mut self, fragments: impl IntoIterator<Item = ClauseFragment>) {
        for fragment in fragments {
            self.push(fragment);
        }
    }

    pub fn finish(self) -> QueryDocument {
        self.document
    }
}
