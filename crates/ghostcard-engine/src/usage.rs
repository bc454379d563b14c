//! Usage accounting, decoupled from the response path.
//!
//! When the radio link ends, the dispatcher emits a [`UsageEvent`] for the
//! card that served the session. Events travel over an unbounded channel to
//! a [`UsageWorker`] that applies them against the card store, so the write
//! may overlap the next emulation session and can never delay a response.
//!
//! Accounting is best-effort by design: one increment per deactivation, but
//! a deactivation signal delivered twice for one physical tap may count
//! twice. Failures are logged and never affect future dispatch.

use chrono::{DateTime, Utc};
use ghostcard_core::CardId;
use ghostcard_storage::CardRepository;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, warn};

/// One completed emulation session to account for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageEvent {
    /// The card that served the session
    pub card_id: CardId,

    /// When the session ended
    pub occurred_at: DateTime<Utc>,
}

/// Create the channel connecting the dispatcher to a [`UsageWorker`].
#[must_use]
pub fn usage_channel() -> (UnboundedSender<UsageEvent>, UnboundedReceiver<UsageEvent>) {
    unbounded_channel()
}

/// Drains usage events and applies them to the card store.
///
/// Run it as an independent task:
///
/// ```no_run
/// use ghostcard_engine::{UsageWorker, usage_channel};
/// use ghostcard_storage::{Database, SqliteCardRepository};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::in_memory().await?;
/// let (usage_tx, usage_rx) = usage_channel();
/// let worker = UsageWorker::new(SqliteCardRepository::new(db.pool().clone()), usage_rx);
/// tokio::spawn(worker.run());
/// # Ok(())
/// # }
/// ```
pub struct UsageWorker<R> {
    repo: R,
    rx: UnboundedReceiver<UsageEvent>,
}

impl<R: CardRepository> UsageWorker<R> {
    /// Create a worker over a card repository and the event receiver.
    pub fn new(repo: R, rx: UnboundedReceiver<UsageEvent>) -> Self {
        Self { repo, rx }
    }

    /// Drain events until every sender is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.apply(event).await;
        }
        debug!("usage worker finished");
    }

    async fn apply(&self, event: UsageEvent) {
        match self.repo.update_usage(event.card_id, event.occurred_at).await {
            Ok(()) => debug!(card_id = %event.card_id, "usage recorded"),
            // Accounting failures must never affect dispatch; log and move on
            Err(e) => warn!(card_id = %event.card_id, "usage accounting failed: {e}"),
        }
    }
}
