//! The trace a run produces.

use ecow::EcoString;
use serde::Serialize;

use crate::foundations::Object;

/// Where and what: the source text of the operation and its location as
/// `script-url:line:column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Info {
    pub code: EcoString,
    pub loc: EcoString,
}

/// One recorded manipulation of one element.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The affected element.
    pub element: Object,
    /// The checker's classification of the operation.
    pub kind: EcoString,
    /// The call site that performed it.
    pub info: Info,
}

/// The append-only store of recorded manipulations.
///
/// Entries are only ever appended, never rewritten; the order is the order
/// the interpreter encountered the operations.
#[derive(Debug, Default)]
pub struct Collection {
    entries: Vec<Entry>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&mut self, element: Object, kind: EcoString, info: Info) {
        self.entries.push(Entry { element, kind, info });
    }

    /// All entries, in recording order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The entries recorded against one element.
    pub fn entries_for<'a>(
        &'a self,
        element: &'a Object,
    ) -> impl Iterator<Item = &'a Entry> {
        self.entries.iter().filter(move |entry| &entry.element == element)
    }

    /// The number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
