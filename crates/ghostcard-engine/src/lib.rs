//! The card-emulation protocol engine.
//!
//! While the phone is held near a reader terminal, the host platform
//! delivers raw APDU command frames to this engine, which synthesizes
//! byte-exact responses from a previously scanned card record, making the
//! terminal believe it is talking to the original physical card.
//!
//! # Architecture
//!
//! ```text
//! Host Bridge ──> ApduDispatcher ──> response bytes ──> Host Bridge
//!                   │        │
//!                   │        └── CardCache (sync lookup, refreshed async)
//!                   └── SelectionHandle (durable single-slot state)
//!
//! deactivation ──> UsageEvent ──> UsageWorker ──> CardRepository
//! ```
//!
//! The command path is synchronous and bounded: the dispatcher reads the
//! selection handle and the in-memory card cache, never disk or network.
//! Usage accounting runs on its own task and can never delay a response.
//!
//! # Examples
//!
//! ```no_run
//! use ghostcard_engine::{
//!     ApduDispatcher, CardCache, HostCardService, SelectionHandle, UsageWorker, usage_channel,
//! };
//! use ghostcard_storage::{
//!     Database, SqliteCardRepository, SqliteSelectionRepository,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory().await?;
//! let cards = SqliteCardRepository::new(db.pool().clone());
//! let selection_repo = SqliteSelectionRepository::new(db.pool().clone());
//!
//! // Restore the armed card after a process restart
//! let selection = SelectionHandle::restore(&selection_repo).await?;
//!
//! let cache = CardCache::new();
//! cache.refresh(&cards).await?;
//!
//! let (usage_tx, usage_rx) = usage_channel();
//! tokio::spawn(UsageWorker::new(cards, usage_rx).run());
//!
//! let engine = ApduDispatcher::new(selection, cache, usage_tx);
//!
//! // The platform adapter forwards its callbacks here
//! let response = engine.handle_command(&[0x00, 0xCA, 0x00, 0x00]);
//! assert!(response.len() >= 2);
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod cache;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod selection;
pub mod usage;

pub use bridge::HostCardService;
pub use cache::{CardCache, CardLookup};
pub use dispatcher::ApduDispatcher;
pub use error::{EngineError, EngineResult};
pub use mock::{Exchange, MockTerminal};
pub use selection::SelectionHandle;
pub use usage::{UsageEvent, UsageWorker, usage_channel};
