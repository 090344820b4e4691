//! Typed operator intents and view-state snapshots
//!
//! Views never touch the store: they send an [`Intent`] to
//! [`ReviewSession::dispatch`] and render the [`ViewState`] that comes back.

use super::{Navigation, NavigationMode, Progress, ReviewSession, SaveReport};
use crate::error::ReviewResult;
use crate::models::{ReviewItem, TokenStatus};
use poslog_common::events::Direction;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Answer to the end-of-review prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndDecision {
    SaveAndExit,
    /// Start over at the first item
    Restart,
}

/// Operator intent
///
/// `SetTag` and `ApplyMajorityToAll` act on the current item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    SelectIndex { index: usize },
    SetTag { token: usize, value: Option<String> },
    ApplyMajorityToAll,
    Navigate { direction: Direction, mode: NavigationMode },
    Save,
    ConfirmEnd { decision: EndDecision },
    EndSession,
}

/// What an intent did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Selected { index: usize },
    TagSet { solved: bool },
    EndOfReview { direction: Direction },
    Saved { report: SaveReport },
    Restarted,
    Ended,
}

/// Reply to a dispatched intent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub outcome: Outcome,
    pub view: ViewState,
}

/// Which navigation controls are enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NavAvailability {
    pub next: bool,
    pub previous: bool,
    pub next_unsolved: bool,
    pub previous_unsolved: bool,
}

/// One token row of the item view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenView {
    pub token: String,
    pub seed_majority: Option<String>,
    pub majority: Option<String>,
    pub confidence: f64,
    pub manual: Option<String>,
    pub status: TokenStatus,
    /// Consensus majority first, then the dissenting tags sorted
    pub choices: Vec<String>,
}

/// The current item as shown to the operator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub index: usize,
    pub log_line: String,
    pub solved: bool,
    pub diverges_from_majority: bool,
    pub tokens: Vec<TokenView>,
}

impl ItemView {
    pub fn from_item(item: &ReviewItem) -> ReviewResult<Self> {
        let consensus = &item.consensus;
        let tokens = (0..item.len())
            .map(|i| -> ReviewResult<TokenView> {
                let majority = consensus.majority[i].clone();
                let mut choices: Vec<String> = majority.iter().cloned().collect();
                choices.extend(
                    consensus.minority[i]
                        .tag_counts()
                        .into_iter()
                        .map(|(tag, _)| tag.to_string())
                        .filter(|tag| majority.as_ref() != Some(tag)),
                );

                Ok(TokenView {
                    token: item.tokens[i].clone(),
                    seed_majority: item.seed_majority[i].clone(),
                    majority,
                    confidence: consensus.confidence[i],
                    manual: item.manual_tags()[i].clone(),
                    status: item.token_status(i)?,
                    choices,
                })
            })
            .collect::<ReviewResult<Vec<_>>>()?;

        Ok(Self {
            index: item.index,
            log_line: item.display_line(),
            solved: item.is_solved(),
            diverges_from_majority: item.diverges_from_majority(),
            tokens,
        })
    }
}

/// Snapshot of everything the view renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub session_id: Uuid,
    pub current: Option<ItemView>,
    pub finished: bool,
    pub navigation: NavAvailability,
    /// Set while an end-of-review prompt awaits an answer
    pub pending_end: Option<Direction>,
    pub last_save: Option<SaveReport>,
    pub progress: Progress,
    pub unsaved_changes: bool,
}

impl ReviewSession {
    /// Snapshot of the session for rendering
    pub fn view_state(&self) -> ReviewResult<ViewState> {
        let current = self.current_item().map(ItemView::from_item).transpose()?;
        let navigation = NavAvailability {
            next: self.has_next(Direction::Forward, NavigationMode::Sequential),
            previous: self.has_next(Direction::Backward, NavigationMode::Sequential),
            next_unsolved: self.has_next(Direction::Forward, NavigationMode::Unsolved),
            previous_unsolved: self.has_next(Direction::Backward, NavigationMode::Unsolved),
        };

        Ok(ViewState {
            session_id: self.session_id(),
            current,
            finished: self.is_finished(),
            navigation,
            pending_end: self.pending_end(),
            last_save: self.last_save().cloned(),
            progress: self.progress(),
            unsaved_changes: self.has_unsaved_changes(),
        })
    }

    /// Run one intent to completion and return the resulting view
    pub fn dispatch(&mut self, intent: Intent) -> ReviewResult<Response> {
        let outcome = match intent {
            Intent::SelectIndex { index } => {
                self.go_to_index(index)?;
                Outcome::Selected { index }
            }
            Intent::SetTag { token, value } => {
                let index = self.require_current()?;
                let solved = self.set_tag(index, token, value.as_deref())?;
                Outcome::TagSet { solved }
            }
            Intent::ApplyMajorityToAll => {
                let index = self.require_current()?;
                let solved = self.apply_majority_to_all(index)?;
                Outcome::TagSet { solved }
            }
            Intent::Navigate { direction, mode } => match self.navigate(direction, mode)? {
                Navigation::Moved(index) => Outcome::Selected { index },
                Navigation::NoNext => Outcome::EndOfReview { direction },
            },
            Intent::Save => Outcome::Saved {
                report: self.save()?,
            },
            Intent::ConfirmEnd { decision } => match self.confirm_end(decision)? {
                Some(report) => Outcome::Saved { report },
                None => Outcome::Restarted,
            },
            Intent::EndSession => {
                self.end_session();
                Outcome::Ended
            }
        };

        Ok(Response {
            outcome,
            view: self.view_state()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::ConsensusRecord;

    #[test]
    fn test_choices_put_majority_first() {
        let consensus = ConsensusRecord {
            majority: vec![Some("VERB".to_string()), None],
            confidence: vec![0.5, 0.0],
            minority: vec![
                [("t3", "NOUN"), ("t4", "ADJ")].into_iter().collect(),
                [("t1", "PROPN"), ("t2", "NOUN")].into_iter().collect(),
            ],
        };
        let item = ReviewItem::new(
            0,
            0,
            vec!["restart".to_string(), "Apache".to_string()],
            consensus,
        )
        .unwrap();

        let view = ItemView::from_item(&item).unwrap();

        assert_eq!(view.tokens[0].choices, vec!["VERB", "ADJ", "NOUN"]);
        assert_eq!(view.tokens[1].choices, vec!["NOUN", "PROPN"]);
        assert_eq!(view.tokens[1].status, TokenStatus::Unset);
        assert_eq!(view.log_line, "restart Apache");
        assert!(!view.solved);
    }

    #[test]
    fn test_intent_json_shape() {
        let intent: Intent = serde_json::from_str(
            r#"{"intent": "navigate", "direction": "forward", "mode": "unsolved"}"#,
        )
        .unwrap();
        assert_eq!(
            intent,
            Intent::Navigate {
                direction: Direction::Forward,
                mode: NavigationMode::Unsolved
            }
        );

        let empty = ItemView::from_item(
            &ReviewItem::new(0, 0, vec![], ConsensusRecord::default()).unwrap(),
        )
        .unwrap();
        assert!(empty.solved);
        assert!(empty.tokens.is_empty());
    }
}
