//! # lineup-engine
//!
//! Live sync engine for the roster collection: subscribe to the remote
//! store, project every pushed change batch into an ordered [`Roster`],
//! and forward creates and deletes back upstream.
//!
//! ## Design Principles
//!
//! - **Remote wins**: the engine never edits the roster locally. Creates
//!   and deletes go to the store and take effect when the store echoes
//!   them back through the live feed.
//! - **Single writer**: one actor task applies batches and bookkeeping,
//!   so observers can never see a half-applied update.
//! - **Stale beats empty**: when the feed drops, the last roster stays
//!   available and the loss is announced as an event.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lineup_core::Player;
//! use lineup_engine::SyncEngine;
//! use lineup_store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let engine = SyncEngine::new(store);
//!
//!     engine.start().await.expect("subscribe");
//!
//!     let draft = Player::draft("A. Diaz", "7", "Argentina", "Forward", "");
//!     engine.create(&draft).await.expect("create");
//!
//!     let roster = engine.current_roster();
//!     println!("{} players", roster.len());
//!
//!     engine.shutdown().await;
//! }
//! ```
//!
//! [`Roster`]: lineup_core::Roster

mod engine;
mod error;
mod events;

pub use engine::SyncEngine;
pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, SyncPhase};
