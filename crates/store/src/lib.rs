//! `stockroom-store` — the concurrent inventory registry.
//!
//! A single [`InventoryStore`] is created per session and shared (behind
//! `Arc`) between the presentation thread and the bulk-I/O workers. All
//! synchronization is internal; see the type docs for the exact atomicity
//! contract.

pub mod inventory;

pub use inventory::InventoryStore;
