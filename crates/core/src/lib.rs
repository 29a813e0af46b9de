//! `stockroom-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no threading, no
//! presentation concerns): the inventory [`Record`] and the identity trait
//! the rest of the workspace keys on.

pub mod entity;
pub mod record;

pub use entity::Entity;
pub use record::{Record, RecordId};
