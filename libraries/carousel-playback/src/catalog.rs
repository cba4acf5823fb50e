//! Catalog access
//!
//! The catalog supplies the ordered queue contents and per-item metadata.
//! Storage and scanning live outside this crate.

use std::collections::HashMap;

use crate::types::{Metadata, QueueItem};

/// Source of queue contents and item metadata
pub trait Catalog: Send {
    /// Ordered queue contents
    fn queue(&self) -> Vec<QueueItem>;

    /// Metadata for a single item, if the catalog has any
    fn metadata(&self, item_id: &str) -> Option<Metadata>;
}

/// Catalog held entirely in memory
///
/// Metadata defaults to what each item's description carries and can be
/// overridden per item.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: Vec<QueueItem>,
    metadata: HashMap<String, Metadata>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<QueueItem>) -> Self {
        let metadata = items
            .iter()
            .map(|item| (item.id.clone(), Metadata::from(item)))
            .collect();
        Self { items, metadata }
    }

    /// Replace the metadata stored for `metadata.id`
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.insert(metadata.id.clone(), metadata);
        self
    }

    /// Drop the metadata for an item so lookups return `None`
    pub fn without_metadata(mut self, item_id: &str) -> Self {
        self.metadata.remove(item_id);
        self
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Catalog for InMemoryCatalog {
    fn queue(&self) -> Vec<QueueItem> {
        self.items.clone()
    }

    fn metadata(&self, item_id: &str) -> Option<Metadata> {
        self.metadata.get(item_id).cloned()
    }
}
