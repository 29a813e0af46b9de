//! `stockroom-codec` — the CSV snapshot contract.
//!
//! Stateless conversion between a sequence of [`Record`]s and the
//! line-oriented text format used by bulk import/export. See [`csv`] for the
//! format rules and their known limitations.
//!
//! [`Record`]: stockroom_core::Record

pub mod csv;

pub use csv::{CodecError, HEADER, Records, decode, encode, records};
