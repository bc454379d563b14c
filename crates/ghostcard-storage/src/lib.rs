//! Storage layer for the ghostcard emulation engine.
//!
//! This crate provides SQLite-backed persistence for scanned card records and
//! for the single-slot emulation selection state, along with the repository
//! contracts the protocol engine consumes.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`CardRepository`] - Card lookup, creation, deletion, usage accounting
//! - [`SelectionRepository`] - Durable "which card is live" slot
//!
//! All data access goes through repository traits, so the engine and its
//! tests can substitute implementations freely. Nothing in this crate is
//! called on the command-dispatch path directly: the engine fronts card
//! lookups with an in-memory cache and performs usage writes on a separate
//! task, because the terminal-facing reply budget leaves no room for disk
//! I/O.
//!
//! # Examples
//!
//! ```no_run
//! use ghostcard_core::CardUid;
//! use ghostcard_storage::{CardRepository, Database, DatabaseConfig, SqliteCardRepository};
//! use ghostcard_storage::models::CardRecord;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("ghostcard.db")).await?;
//! let cards = SqliteCardRepository::new(db.pool().clone());
//!
//! // Persist a card captured by the (out-of-scope) scan flow
//! let record = CardRecord::scanned(CardUid::from_hex("04A1B2C3")?)
//!     .with_ats(vec![0x75, 0x77])
//!     .with_name("office badge");
//! let id = cards.create(&record).await?;
//!
//! if let Some(card) = cards.get_by_id(id).await? {
//!     println!("stored {} ({})", card.name, card.uid);
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{CardRecord, SelectionSnapshot};
pub use repositories::{
    CardRepository, SelectionRepository, SqliteCardRepository, SqliteSelectionRepository,
};
