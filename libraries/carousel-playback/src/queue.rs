//! Circular play queue
//!
//! The last item's successor is the first item and vice versa, so
//! navigation never fails on a boundary.

use crate::error::{PlaybackError, Result};
use crate::types::QueueItem;

/// Non-empty circular queue with a cursor
///
/// Structure:
/// ```text
///   [0] Item A
///   [1] Item B   <- current
///   [2] Item C
///   next of [2] is [0], previous of [0] is [2]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Queue {
    items: Vec<QueueItem>,
    current: usize,
}

impl Queue {
    /// Build a queue positioned at `index`
    ///
    /// Fails with `InvalidIndex` when `index` is outside `items`
    /// (which includes every index of an empty list).
    pub fn starting_at(items: Vec<QueueItem>, index: usize) -> Result<Self> {
        if index >= items.len() {
            return Err(PlaybackError::InvalidIndex {
                index,
                len: items.len(),
            });
        }
        Ok(Self {
            items,
            current: index,
        })
    }

    /// Position of the first item whose id equals `item_id`
    pub fn position_of(items: &[QueueItem], item_id: &str) -> Option<usize> {
        items.iter().position(|item| item.id == item_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &QueueItem {
        &self.items[self.current]
    }

    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    /// Index after the current one, wrapping to 0
    pub fn next_index(&self) -> usize {
        (self.current + 1) % self.items.len()
    }

    /// Index before the current one, wrapping to the last item
    pub fn previous_index(&self) -> usize {
        if self.current == 0 {
            self.items.len() - 1
        } else {
            self.current - 1
        }
    }

    /// Move the cursor forward and return the new index
    pub fn advance(&mut self) -> usize {
        self.current = self.next_index();
        self.current
    }

    /// Move the cursor backward and return the new index
    pub fn retreat(&mut self) -> usize {
        self.current = self.previous_index();
        self.current
    }

    /// Move the cursor to `index`
    pub fn set_current(&mut self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(PlaybackError::InvalidIndex {
                index,
                len: self.items.len(),
            });
        }
        self.current = index;
        Ok(())
    }
}
