//! Navigation targets over the review store

use crate::models::{ReviewItem, ReviewStore};
use poslog_common::events::Direction;
use serde::{Deserialize, Serialize};

/// Which items a navigation request may land on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    /// The adjacent item
    Sequential,
    /// The nearest item that is unsolved under the session policy
    Unsolved,
}

/// What "unsolved" means for unsolved navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsolvedPolicy {
    /// Only items with an absent manual tag (strict mode)
    AbsentOnly,
    /// Also items whose manual tags diverge from the majority
    #[default]
    AbsentOrDivergent,
}

impl UnsolvedPolicy {
    pub fn from_strict(strict_unsolved_mode: bool) -> Self {
        if strict_unsolved_mode {
            UnsolvedPolicy::AbsentOnly
        } else {
            UnsolvedPolicy::AbsentOrDivergent
        }
    }

    pub fn is_unsolved(self, item: &ReviewItem) -> bool {
        match self {
            UnsolvedPolicy::AbsentOnly => !item.is_solved(),
            UnsolvedPolicy::AbsentOrDivergent => !item.is_solved() || item.diverges_from_majority(),
        }
    }
}

/// Target of a navigation request, `None` when there is no next item
///
/// `from` is the current index; `None` (no item selected) sits before index
/// 0, so forward starts at 0 and backward finds nothing.
pub fn find_next(
    store: &ReviewStore,
    from: Option<usize>,
    direction: Direction,
    mode: NavigationMode,
    policy: UnsolvedPolicy,
) -> Option<usize> {
    let len = store.len();
    let mut candidates: Box<dyn Iterator<Item = usize>> = match (from, direction) {
        (None, Direction::Forward) => Box::new(0..len),
        (None, Direction::Backward) => return None,
        (Some(i), Direction::Forward) => Box::new(i.saturating_add(1)..len),
        (Some(i), Direction::Backward) => Box::new((0..i.min(len)).rev()),
    };

    match mode {
        NavigationMode::Sequential => candidates.next(),
        NavigationMode::Unsolved => candidates.find(|&index| {
            store
                .get(index)
                .map(|item| policy.is_unsolved(item))
                .unwrap_or(false)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{ConsensusRecord, MinorityTags};

    /// `solved[i]`: item i is solved and matches the majority
    fn store(solved: &[bool]) -> ReviewStore {
        let items = solved
            .iter()
            .enumerate()
            .map(|(row, &done)| {
                let consensus = ConsensusRecord {
                    majority: vec![Some("NOUN".to_string())],
                    confidence: vec![1.0],
                    minority: vec![MinorityTags::new()],
                };
                let item = ReviewItem::new(row, row, vec!["tok".to_string()], consensus).unwrap();
                if done {
                    item.prefill_from_seed()
                } else {
                    item
                }
            })
            .collect();
        ReviewStore::new(items)
    }

    #[test]
    fn test_sequential_bounds() {
        let s = store(&[true, true, true]);
        let policy = UnsolvedPolicy::default();
        let seq = NavigationMode::Sequential;

        assert_eq!(find_next(&s, None, Direction::Forward, seq, policy), Some(0));
        assert_eq!(find_next(&s, None, Direction::Backward, seq, policy), None);
        assert_eq!(find_next(&s, Some(1), Direction::Forward, seq, policy), Some(2));
        assert_eq!(find_next(&s, Some(2), Direction::Forward, seq, policy), None);
        assert_eq!(find_next(&s, Some(0), Direction::Backward, seq, policy), None);
    }

    #[test]
    fn test_unsolved_scan_skips_solved_items() {
        let s = store(&[true, false, true, false]);
        let policy = UnsolvedPolicy::AbsentOnly;
        let mode = NavigationMode::Unsolved;

        assert_eq!(find_next(&s, None, Direction::Forward, mode, policy), Some(1));
        assert_eq!(find_next(&s, Some(1), Direction::Forward, mode, policy), Some(3));
        assert_eq!(find_next(&s, Some(3), Direction::Forward, mode, policy), None);
        assert_eq!(find_next(&s, Some(3), Direction::Backward, mode, policy), Some(1));
        assert_eq!(find_next(&s, Some(1), Direction::Backward, mode, policy), None);
    }

    #[test]
    fn test_empty_store_has_no_target() {
        let s = store(&[]);
        let policy = UnsolvedPolicy::default();
        assert_eq!(
            find_next(&s, None, Direction::Forward, NavigationMode::Sequential, policy),
            None
        );
    }

    #[test]
    fn test_from_strict() {
        assert_eq!(UnsolvedPolicy::from_strict(true), UnsolvedPolicy::AbsentOnly);
        assert_eq!(UnsolvedPolicy::from_strict(false), UnsolvedPolicy::AbsentOrDivergent);
    }
}
