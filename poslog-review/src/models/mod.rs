//! Data models for the review session
//!
//! - [`ReviewItem`]: one log line, its consensus and the operator's tags
//! - [`ReviewStore`]: the ordered items of a session
//! - [`Vocabulary`]: tags offered in the choice menu

pub mod review_item;
pub mod store;
pub mod vocabulary;

pub use review_item::{normalize_tag, ReviewItem, TokenStatus, NO_TAG};
pub use store::ReviewStore;
pub use vocabulary::Vocabulary;
