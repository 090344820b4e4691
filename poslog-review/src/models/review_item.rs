//! One log line under review
//!
//! A [`ReviewItem`] pairs the tokens of a line with its consensus record and
//! the operator's working answer (`manual_tags`). Only the session controller
//! mutates `manual_tags`; everything else is fixed when the store is built.

use crate::consensus::ConsensusRecord;
use crate::error::{ReviewError, ReviewResult};
use serde::{Deserialize, Serialize};

/// Menu entry that stands for "no tag"
pub const NO_TAG: &str = "-----";

/// Normalize operator input: blank strings and [`NO_TAG`] become absent
pub fn normalize_tag(tag: Option<&str>) -> Option<String> {
    match tag.map(str::trim) {
        None | Some("") | Some(NO_TAG) => None,
        Some(tag) => Some(tag.to_string()),
    }
}

/// Per-token comparison of the manual tag with the consensus majority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// No manual tag yet
    Unset,
    /// Manual tag set but differs from the majority (or the majority is a tie)
    DivergesFromMajority,
    MatchesMajority,
}

/// One log line under review
///
/// Invariant: `tokens`, `seed_majority`, `manual_tags` and the consensus
/// sequences all have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewItem {
    /// Position in the store
    pub index: usize,
    /// Row of the source table this item was built from
    pub source_row: usize,
    /// Display text; `None` when the table has no log line column
    pub log_line: Option<String>,
    pub tokens: Vec<String>,
    pub consensus: ConsensusRecord,
    /// Majority vote precomputed in the session-start table
    pub seed_majority: Vec<Option<String>>,
    manual_tags: Vec<Option<String>>,
}

impl ReviewItem {
    /// New item with no manual tags and the consensus majority as seed
    pub fn new(
        index: usize,
        source_row: usize,
        tokens: Vec<String>,
        consensus: ConsensusRecord,
    ) -> ReviewResult<Self> {
        consensus.validate()?;
        if tokens.len() != consensus.len() {
            return Err(ReviewError::Input(format!(
                "row {}: {} tokens but consensus covers {}",
                source_row,
                tokens.len(),
                consensus.len()
            )));
        }

        let n = tokens.len();
        Ok(Self {
            index,
            source_row,
            log_line: None,
            seed_majority: consensus.majority.clone(),
            manual_tags: vec![None; n],
            tokens,
            consensus,
        })
    }

    pub fn with_log_line(mut self, log_line: impl Into<String>) -> Self {
        self.log_line = Some(log_line.into());
        self
    }

    /// Replace the seed majority
    pub fn with_seed_majority(mut self, seed: Vec<Option<String>>) -> ReviewResult<Self> {
        self.check_len("seed majority", seed.len())?;
        self.seed_majority = seed.into_iter().map(|t| normalize_tag(t.as_deref())).collect();
        Ok(self)
    }

    /// Resume from previously saved manual tags
    pub fn with_manual_tags(mut self, manual: Vec<Option<String>>) -> ReviewResult<Self> {
        self.check_len("manual tags", manual.len())?;
        self.manual_tags = manual.into_iter().map(|t| normalize_tag(t.as_deref())).collect();
        Ok(self)
    }

    /// Copy the seed majority into every absent manual tag
    pub fn prefill_from_seed(mut self) -> Self {
        for (manual, seed) in self.manual_tags.iter_mut().zip(&self.seed_majority) {
            if manual.is_none() {
                *manual = seed.clone();
            }
        }
        self
    }

    fn check_len(&self, what: &str, len: usize) -> ReviewResult<()> {
        if len != self.tokens.len() {
            return Err(ReviewError::Input(format!(
                "row {}: {} has {} entries for {} tokens",
                self.source_row,
                what,
                len,
                self.tokens.len()
            )));
        }
        Ok(())
    }

    /// Token count
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Log line for display, falling back to the joined tokens
    pub fn display_line(&self) -> String {
        match &self.log_line {
            Some(line) => line.clone(),
            None => self.tokens.join(" "),
        }
    }

    pub fn manual_tags(&self) -> &[Option<String>] {
        &self.manual_tags
    }

    /// Write one manual tag; the caller has normalized `tag`
    pub(crate) fn set_manual(&mut self, token: usize, tag: Option<String>) -> ReviewResult<()> {
        let len = self.manual_tags.len();
        let slot = self
            .manual_tags
            .get_mut(token)
            .ok_or(ReviewError::TokenOutOfRange {
                index: self.index,
                token,
                len,
            })?;
        *slot = tag;
        Ok(())
    }

    /// True when every token has a manual tag
    pub fn is_solved(&self) -> bool {
        self.manual_tags.iter().all(Option::is_some)
    }

    /// Token positions still without a manual tag
    pub fn unsolved_tokens(&self) -> Vec<usize> {
        self.manual_tags
            .iter()
            .enumerate()
            .filter(|(_, tag)| tag.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// True when any manual tag differs from the consensus majority
    ///
    /// Absent entries on both sides compare equal.
    pub fn diverges_from_majority(&self) -> bool {
        self.manual_tags
            .iter()
            .zip(&self.consensus.majority)
            .any(|(manual, majority)| manual != majority)
    }

    pub fn token_status(&self, token: usize) -> ReviewResult<TokenStatus> {
        let manual = self
            .manual_tags
            .get(token)
            .ok_or(ReviewError::TokenOutOfRange {
                index: self.index,
                token,
                len: self.manual_tags.len(),
            })?;

        Ok(match (manual, &self.consensus.majority[token]) {
            (None, _) => TokenStatus::Unset,
            (Some(manual), Some(majority)) if manual == majority => TokenStatus::MatchesMajority,
            (Some(_), _) => TokenStatus::DivergesFromMajority,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::MinorityTags;

    fn item(majority: &[Option<&str>]) -> ReviewItem {
        let consensus = ConsensusRecord {
            majority: majority.iter().map(|m| m.map(str::to_string)).collect(),
            confidence: majority.iter().map(|m| if m.is_some() { 1.0 } else { 0.0 }).collect(),
            minority: vec![MinorityTags::new(); majority.len()],
        };
        let tokens = (0..majority.len()).map(|i| format!("tok{}", i)).collect();
        ReviewItem::new(0, 0, tokens, consensus).unwrap()
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag(None), None);
        assert_eq!(normalize_tag(Some("")), None);
        assert_eq!(normalize_tag(Some("   ")), None);
        assert_eq!(normalize_tag(Some(NO_TAG)), None);
        assert_eq!(normalize_tag(Some(" NOUN ")), Some("NOUN".to_string()));
    }

    #[test]
    fn test_new_item_is_unsolved() {
        let item = item(&[Some("NOUN"), None]);
        assert!(!item.is_solved());
        assert_eq!(item.unsolved_tokens(), vec![0, 1]);
        assert!(item.manual_tags().iter().all(Option::is_none));
    }

    #[test]
    fn test_prefill_copies_seed() {
        let item = item(&[Some("NOUN"), None]).prefill_from_seed();
        assert_eq!(item.manual_tags()[0].as_deref(), Some("NOUN"));
        assert_eq!(item.manual_tags()[1], None);
        assert_eq!(item.unsolved_tokens(), vec![1]);
    }

    #[test]
    fn test_token_length_mismatch_rejected() {
        let consensus = ConsensusRecord {
            majority: vec![Some("NOUN".to_string())],
            confidence: vec![1.0],
            minority: vec![MinorityTags::new()],
        };
        let err = ReviewItem::new(0, 4, vec![], consensus).unwrap_err();
        assert!(matches!(err, ReviewError::Input(_)));
    }

    #[test]
    fn test_seed_length_mismatch_rejected() {
        let err = item(&[Some("NOUN")])
            .with_seed_majority(vec![None, None])
            .unwrap_err();
        assert!(matches!(err, ReviewError::Input(_)));
    }

    #[test]
    fn test_token_status() {
        let mut item = item(&[Some("NOUN"), Some("VERB"), None]);
        item.set_manual(0, Some("NOUN".to_string())).unwrap();
        item.set_manual(1, Some("ADJ".to_string())).unwrap();

        assert_eq!(item.token_status(0).unwrap(), TokenStatus::MatchesMajority);
        assert_eq!(item.token_status(1).unwrap(), TokenStatus::DivergesFromMajority);
        assert_eq!(item.token_status(2).unwrap(), TokenStatus::Unset);
        assert!(item.token_status(3).is_err());
    }

    #[test]
    fn test_divergence_treats_matching_absents_as_equal() {
        let mut item = item(&[Some("NOUN"), None]);
        item.set_manual(0, Some("NOUN".to_string())).unwrap();
        assert!(!item.diverges_from_majority());

        item.set_manual(1, Some("VERB".to_string())).unwrap();
        assert!(item.diverges_from_majority());
        assert!(item.is_solved());
    }

    #[test]
    fn test_set_manual_out_of_range() {
        let mut item = item(&[Some("NOUN")]);
        let err = item.set_manual(1, None).unwrap_err();
        assert!(matches!(err, ReviewError::TokenOutOfRange { token: 1, len: 1, .. }));
    }

    #[test]
    fn test_display_line_falls_back_to_tokens() {
        let plain = item(&[Some("NOUN"), Some("VERB")]);
        assert_eq!(plain.display_line(), "tok0 tok1");
        assert_eq!(plain.with_log_line("Connection refused").display_line(), "Connection refused");
    }
}
