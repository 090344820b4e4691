//! # poslog Common Library
//!
//! Shared code for the poslog review tooling including:
//! - Error and result types
//! - Layered configuration loading (CLI → ENV → TOML → defaults)
//! - Review event types and the broadcast EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{EventBus, ReviewEvent};
