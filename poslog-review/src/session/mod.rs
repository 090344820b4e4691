//! Correction session controller
//!
//! [`ReviewSession`] owns the review store and the cursor, applies operator
//! actions and reports every change on the [`EventBus`].
//!
//! States: no item selected (initial) → item selected ⇄ item selected →
//! finished (terminal). Reaching the end of the list never advances or saves on
//! its own: the controller records a pending end-of-review prompt and waits for
//! [`ReviewSession::confirm_end`].

pub mod intent;
pub mod navigation;

pub use intent::{
    EndDecision, Intent, ItemView, NavAvailability, Outcome, Response, TokenView, ViewState,
};
pub use navigation::{find_next, NavigationMode, UnsolvedPolicy};

use crate::error::{ReviewError, ReviewResult};
use crate::models::{normalize_tag, ReviewItem, ReviewStore, Vocabulary};
use crate::persistence::{build_store, PersistenceGateway, ReviewTable, StoreOptions};
use crate::tagset::TagsetId;
use chrono::{DateTime, Utc};
use poslog_common::events::{Direction, EventBus, ReviewEvent};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "index")]
pub enum Cursor {
    NoItemSelected,
    Selected(usize),
    Finished,
}

/// Result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    Moved(usize),
    /// Nothing further in that direction; an end-of-review prompt is pending
    NoNext,
}

/// Outcome of a save
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveReport {
    pub output: PathBuf,
    /// Items still holding at least one absent tag
    pub unsolved: Vec<usize>,
    pub saved_at: DateTime<Utc>,
}

/// Review progress for the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub position: Option<usize>,
    pub total: usize,
    pub solved: usize,
}

/// Session settings
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub store: StoreOptions,
    pub tagset: TagsetId,
    pub policy: UnsolvedPolicy,
}

/// One interactive review session
pub struct ReviewSession {
    session_id: Uuid,
    store: ReviewStore,
    table: ReviewTable,
    gateway: Box<dyn PersistenceGateway>,
    vocabulary: Vocabulary,
    policy: UnsolvedPolicy,
    manual_column: String,
    skipped_rows: Vec<usize>,
    cursor: Cursor,
    pending_end: Option<Direction>,
    last_save: Option<SaveReport>,
    dirty: bool,
    events: EventBus,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl ReviewSession {
    /// Load the table through `gateway` and start a session over it
    pub fn open(
        gateway: Box<dyn PersistenceGateway>,
        config: SessionConfig,
        events: EventBus,
    ) -> ReviewResult<Self> {
        let table = gateway.load()?;
        let (store, failures) = build_store(&table, &config.store);
        let vocabulary = Vocabulary::build(
            config.tagset.canonical_tags(),
            store.iter().flat_map(|item| item.seed_majority.iter()),
        );

        let mut session = Self::new(store, table, gateway, vocabulary, config, events);
        session.skipped_rows = failures.into_iter().map(|f| f.row).collect();
        Ok(session)
    }

    /// Start a session over an already built store
    pub fn new(
        store: ReviewStore,
        table: ReviewTable,
        gateway: Box<dyn PersistenceGateway>,
        vocabulary: Vocabulary,
        config: SessionConfig,
        events: EventBus,
    ) -> Self {
        let session = Self {
            session_id: Uuid::new_v4(),
            store,
            table,
            gateway,
            vocabulary,
            policy: config.policy,
            manual_column: config.store.columns.manual,
            skipped_rows: Vec::new(),
            cursor: Cursor::NoItemSelected,
            pending_end: None,
            last_save: None,
            dirty: false,
            events,
            started_at: Utc::now(),
            ended_at: None,
        };

        info!(
            session_id = %session.session_id,
            items = session.store.len(),
            policy = ?session.policy,
            "Review session started"
        );
        session.events.emit_lossy(ReviewEvent::SessionStarted {
            session_id: session.session_id,
            item_count: session.store.len(),
            timestamp: session.started_at,
        });
        session
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn store(&self) -> &ReviewStore {
        &self.store
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn policy(&self) -> UnsolvedPolicy {
        self.policy
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Table rows that could not become review items
    pub fn skipped_rows(&self) -> &[usize] {
        &self.skipped_rows
    }

    pub fn pending_end(&self) -> Option<Direction> {
        self.pending_end
    }

    pub fn last_save(&self) -> Option<&SaveReport> {
        self.last_save.as_ref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub fn is_finished(&self) -> bool {
        self.cursor == Cursor::Finished
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.cursor {
            Cursor::Selected(index) => Some(index),
            _ => None,
        }
    }

    pub fn current_item(&self) -> Option<&ReviewItem> {
        self.current_index().and_then(|index| self.store.get(index).ok())
    }

    /// Index of the current item, or `NoItemSelected`
    pub fn require_current(&self) -> ReviewResult<usize> {
        self.ensure_active()?;
        self.current_index().ok_or(ReviewError::NoItemSelected)
    }

    fn ensure_active(&self) -> ReviewResult<()> {
        if self.is_finished() {
            return Err(ReviewError::SessionFinished);
        }
        Ok(())
    }

    pub fn is_solved(&self, index: usize) -> ReviewResult<bool> {
        Ok(self.store.get(index)?.is_solved())
    }

    pub fn diverges_from_majority(&self, index: usize) -> ReviewResult<bool> {
        Ok(self.store.get(index)?.diverges_from_majority())
    }

    /// Write one manual tag; returns whether the item is now solved
    ///
    /// Blank input and the "no tag" marker clear the tag.
    pub fn set_tag(&mut self, index: usize, token: usize, tag: Option<&str>) -> ReviewResult<bool> {
        self.ensure_active()?;
        let tag = normalize_tag(tag);

        let item = self.store.get_mut(index)?;
        item.set_manual(token, tag.clone())?;
        let solved = item.is_solved();
        self.dirty = true;

        debug!(index, token, tag = ?tag, solved, "Manual tag set");
        self.events.emit_lossy(ReviewEvent::TagChanged {
            session_id: self.session_id,
            index,
            token,
            tag,
            solved,
        });
        Ok(solved)
    }

    /// Copy the consensus majority into every manual tag of an item
    ///
    /// Ties stay absent, so the item may remain unsolved.
    pub fn apply_majority_to_all(&mut self, index: usize) -> ReviewResult<bool> {
        self.ensure_active()?;
        let majority = self.store.get(index)?.consensus.majority.clone();

        let mut solved = self.is_solved(index)?;
        for (token, tag) in majority.iter().enumerate() {
            solved = self.set_tag(index, token, tag.as_deref())?;
        }
        Ok(solved)
    }

    /// Whether [`navigate`](Self::navigate) would move
    pub fn has_next(&self, direction: Direction, mode: NavigationMode) -> bool {
        !self.is_finished()
            && find_next(&self.store, self.current_index(), direction, mode, self.policy).is_some()
    }

    /// Move to the next target, or raise end-of-review when there is none
    pub fn navigate(
        &mut self,
        direction: Direction,
        mode: NavigationMode,
    ) -> ReviewResult<Navigation> {
        self.ensure_active()?;

        match find_next(&self.store, self.current_index(), direction, mode, self.policy) {
            Some(index) => {
                self.select(index);
                Ok(Navigation::Moved(index))
            }
            None => {
                info!(?direction, ?mode, "End of review reached");
                self.pending_end = Some(direction);
                self.events.emit_lossy(ReviewEvent::EndOfReview {
                    session_id: self.session_id,
                    direction,
                });
                Ok(Navigation::NoNext)
            }
        }
    }

    pub fn go_to_index(&mut self, index: usize) -> ReviewResult<()> {
        self.ensure_active()?;
        self.store.get(index)?;
        self.select(index);
        Ok(())
    }

    fn select(&mut self, index: usize) {
        self.cursor = Cursor::Selected(index);
        self.pending_end = None;

        let solved = self.store.get(index).map(|item| item.is_solved()).unwrap_or(false);
        debug!(index, solved, "Item selected");
        self.events.emit_lossy(ReviewEvent::ItemSelected {
            session_id: self.session_id,
            index,
            solved,
        });
    }

    /// Write the manual tag column through the gateway
    ///
    /// Unsolved items are reported, not refused.
    pub fn save(&mut self) -> ReviewResult<SaveReport> {
        self.ensure_active()?;
        self.table.write_manual_column(&self.manual_column, &self.store);
        let output = self.gateway.write_table(&self.table)?;

        let report = SaveReport {
            output,
            unsolved: self.store.unsolved_indices(),
            saved_at: Utc::now(),
        };
        self.dirty = false;

        if report.unsolved.is_empty() {
            info!("Saved manual tags to {}", report.output.display());
        } else {
            warn!(
                "Saved manual tags to {} with {} unsolved items: {:?}",
                report.output.display(),
                report.unsolved.len(),
                report.unsolved
            );
        }
        self.events.emit_lossy(ReviewEvent::SessionSaved {
            session_id: self.session_id,
            output: report.output.clone(),
            unsolved: report.unsolved.clone(),
            timestamp: report.saved_at,
        });

        self.last_save = Some(report.clone());
        Ok(report)
    }

    /// Answer the end-of-review prompt
    ///
    /// Save-and-exit returns the save report and finishes the session.
    pub fn confirm_end(&mut self, decision: EndDecision) -> ReviewResult<Option<SaveReport>> {
        self.ensure_active()?;
        if self.pending_end.is_none() {
            debug!(?decision, "End confirmed without a pending prompt");
        }

        match decision {
            EndDecision::SaveAndExit => {
                let report = self.save()?;
                self.finish();
                Ok(Some(report))
            }
            EndDecision::Restart => {
                if self.store.is_empty() {
                    self.cursor = Cursor::NoItemSelected;
                    self.pending_end = None;
                } else {
                    self.select(0);
                }
                Ok(None)
            }
        }
    }

    /// End the session without saving; ending twice is a no-op
    pub fn end_session(&mut self) {
        if self.is_finished() {
            return;
        }
        if self.dirty {
            warn!("Session ended with unsaved changes");
        }
        self.finish();
    }

    fn finish(&mut self) {
        let ended_at = Utc::now();
        self.cursor = Cursor::Finished;
        self.pending_end = None;
        self.ended_at = Some(ended_at);

        info!(
            session_id = %self.session_id,
            solved = self.store.solved_count(),
            total = self.store.len(),
            "Review session finished"
        );
        self.events.emit_lossy(ReviewEvent::SessionEnded {
            session_id: self.session_id,
            timestamp: ended_at,
        });
    }

    pub fn progress(&self) -> Progress {
        Progress {
            position: self.current_index(),
            total: self.store.len(),
            solved: self.store.solved_count(),
        }
    }
}

impl std::fmt::Debug for ReviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewSession")
            .field("session_id", &self.session_id)
            .field("items", &self.store.len())
            .field("cursor", &self.cursor)
            .field("output", &self.gateway.output_path())
            .finish()
    }
}
