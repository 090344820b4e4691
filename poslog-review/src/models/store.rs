//! Ordered collection of review items

use super::ReviewItem;
use crate::error::{ReviewError, ReviewResult};

/// All items of a review session, ordered by index
///
/// Item `i` always sits at position `i`; [`ReviewStore::new`] renumbers the
/// items it is given.
#[derive(Debug, Clone, Default)]
pub struct ReviewStore {
    items: Vec<ReviewItem>,
}

impl ReviewStore {
    pub fn new(items: Vec<ReviewItem>) -> Self {
        let items = items
            .into_iter()
            .enumerate()
            .map(|(index, mut item)| {
                item.index = index;
                item
            })
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> ReviewResult<&ReviewItem> {
        self.items.get(index).ok_or(ReviewError::ItemOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> ReviewResult<&mut ReviewItem> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(ReviewError::ItemOutOfRange { index, len })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReviewItem> {
        self.items.iter()
    }

    /// Indices of items with at least one absent manual tag
    pub fn unsolved_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .filter(|item| !item.is_solved())
            .map(|item| item.index)
            .collect()
    }

    pub fn solved_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_solved()).count()
    }
}
