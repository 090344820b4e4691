//! poslog-review: POS tagger consensus and manual correction sessions
//!
//! - [`consensus`]: majority vote with tagset repairs, corpus statistics
//! - [`models`]: review items and the review store
//! - [`session`]: the correction session controller and its intents
//! - [`persistence`]: JSON Lines review tables
//! - [`tagger`]: seam for external POS taggers
//! - [`console`]: terminal view used by the binary

pub mod consensus;
pub mod console;
pub mod error;
pub mod models;
pub mod persistence;
pub mod session;
pub mod tagger;
pub mod tagset;

pub use crate::consensus::{build_consensus, build_consensus_with, ConsensusRecord, TaggerOutputs};
pub use crate::error::{ReviewError, ReviewResult};
pub use crate::session::{ReviewSession, SessionConfig};
pub use crate::tagset::TagsetId;
