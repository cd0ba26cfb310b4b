//! Shared data model for the lineup sync workspace.
//!
//! Everything in this crate is plain data: the [`Player`] record and its
//! wire-field mapping, the ordered [`Roster`] projection, the [`Session`]
//! authentication state, and the raw [`Document`]/[`ChangeBatch`] payloads
//! pushed by the remote store.
//!
//! # Design Principles
//!
//! - **Remote wins**: every [`ChangeBatch`] carries the collection's full
//!   current document set, and the [`Roster`] is re-derived from it in full.
//!   Nothing here patches a projection in place.
//! - **Tolerant reads**: mapping a document onto a [`Player`] never fails.
//!   Missing or malformed fields fall back to zero values individually, so
//!   one bad document cannot poison a whole batch.
//! - **Immutable views**: a [`Roster`] is a cheap-to-clone snapshot that
//!   observers cannot mutate.

pub mod document;
pub mod player;
pub mod roster;
pub mod session;

pub use document::{ChangeBatch, Document};
pub use player::{parse_jersey_number, Player};
pub use roster::Roster;
pub use session::Session;
