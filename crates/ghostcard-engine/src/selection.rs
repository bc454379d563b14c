//! The injected emulation selection handle.
//!
//! Selection state is a single durable slot: which card id is selected for
//! emulation, and whether emulation is armed. This module wraps that slot in
//! an explicit, cloneable handle with synchronized access, so the dispatcher
//! reads it without blocking and tests construct independent instances
//! instead of sharing ambient process state.
//!
//! Writers persist through a [`SelectionRepository`] before updating the
//! in-memory snapshot; readers on the command path therefore observe either
//! the value before or after a concurrent change, never a partial write.
//!
//! Backgrounding of the hosting application never touches this state; the
//! primary use case is phone-as-access-card with the app closed. Only an
//! explicit user deselection clears it.

use crate::error::EngineResult;
use ghostcard_core::CardId;
use ghostcard_storage::{SelectionRepository, SelectionSnapshot};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Cloneable handle over the single-slot selection state.
///
/// # Examples
///
/// ```
/// use ghostcard_engine::SelectionHandle;
/// use ghostcard_storage::SelectionSnapshot;
/// use ghostcard_core::CardId;
///
/// let handle = SelectionHandle::with_snapshot(SelectionSnapshot::armed(
///     CardId::new(3).unwrap(),
/// ));
/// assert!(handle.is_active());
/// assert_eq!(handle.selected_card_id(), Some(CardId::new(3).unwrap()));
/// ```
#[derive(Debug, Clone)]
pub struct SelectionHandle {
    inner: Arc<RwLock<SelectionSnapshot>>,
}

impl SelectionHandle {
    /// Create a handle in the first-run state: nothing selected, inactive.
    #[must_use]
    pub fn new() -> Self {
        Self::with_snapshot(SelectionSnapshot::inactive())
    }

    /// Create a handle from a known snapshot (tests, embedding without
    /// durability). The snapshot is sanitized on the way in.
    #[must_use]
    pub fn with_snapshot(snapshot: SelectionSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot.sanitized())),
        }
    }

    /// Rehydrate the handle from durable storage after a process restart.
    pub async fn restore<R: SelectionRepository>(repo: &R) -> EngineResult<Self> {
        let snapshot = repo.load().await?;
        debug!(?snapshot, "restored emulation selection");
        Ok(Self::with_snapshot(snapshot))
    }

    /// Record `card_id` as selected and arm emulation.
    ///
    /// The durable write happens first; the in-memory state only changes on
    /// success. A failure here means the process cannot guarantee the armed
    /// card survives a restart, and callers treat it as the selection flow
    /// being unavailable.
    pub async fn activate<R: SelectionRepository>(
        &self,
        card_id: CardId,
        repo: &R,
    ) -> EngineResult<()> {
        let snapshot = SelectionSnapshot::armed(card_id);
        repo.save(&snapshot).await?;
        self.store(snapshot);
        info!(%card_id, "emulation armed");
        Ok(())
    }

    /// Disarm emulation and clear the selection to the none sentinel.
    ///
    /// Called only on an explicit user deselection, never on ordinary app
    /// backgrounding.
    pub async fn deactivate<R: SelectionRepository>(&self, repo: &R) -> EngineResult<()> {
        let snapshot = SelectionSnapshot::inactive();
        repo.save(&snapshot).await?;
        self.store(snapshot);
        info!("emulation deselected");
        Ok(())
    }

    /// Pause emulation while keeping the selected id, so the card can be
    /// re-armed without re-selecting.
    pub async fn disarm<R: SelectionRepository>(&self, repo: &R) -> EngineResult<()> {
        let snapshot = match self.read().selected_card_id {
            Some(id) => SelectionSnapshot::remembered(id),
            None => SelectionSnapshot::inactive(),
        };
        repo.save(&snapshot).await?;
        self.store(snapshot);
        info!("emulation disarmed");
        Ok(())
    }

    /// Clear the selection if `card_id` is the selected one.
    ///
    /// Deletion coordination: the component deleting a card record calls
    /// this afterwards so a dangling id never stays armed. Returns whether
    /// the selection was cleared.
    pub async fn clear_if_selected<R: SelectionRepository>(
        &self,
        card_id: CardId,
        repo: &R,
    ) -> EngineResult<bool> {
        if self.read().selected_card_id != Some(card_id) {
            return Ok(false);
        }
        let snapshot = SelectionSnapshot::inactive();
        repo.save(&snapshot).await?;
        self.store(snapshot);
        info!(%card_id, "selection cleared for deleted card");
        Ok(true)
    }

    /// The remembered card id, regardless of whether emulation is armed.
    ///
    /// Lets a caller distinguish "nothing ever selected" from "selected but
    /// paused".
    #[must_use]
    pub fn selected_card_id(&self) -> Option<CardId> {
        self.read().selected_card_id
    }

    /// Whether emulation is currently armed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.read().is_active
    }

    /// Copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SelectionSnapshot {
        self.read()
    }

    // Writers replace the snapshot as a whole value, so a poisoned lock
    // still holds a complete snapshot and can be recovered from.
    fn read(&self) -> SelectionSnapshot {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, snapshot: SelectionSnapshot) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

impl Default for SelectionHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostcard_storage::{Database, SqliteSelectionRepository};

    fn card(id: i64) -> CardId {
        CardId::new(id).unwrap()
    }

    async fn setup() -> (SelectionHandle, SqliteSelectionRepository) {
        use ghostcard_core::CardUid;
        use ghostcard_storage::{CardRecord, CardRepository, SqliteCardRepository};

        let db = Database::in_memory().await.unwrap();
        // Selection rows are FK-checked against cards; create them up front
        let cards = SqliteCardRepository::new(db.pool().clone());
        for hex in ["04A1B2C3", "04D4E5F6"] {
            cards
                .create(&CardRecord::scanned(CardUid::from_hex(hex).unwrap()))
                .await
                .unwrap();
        }
        let repo = SqliteSelectionRepository::new(db.pool().clone());
        (SelectionHandle::new(), repo)
    }

    #[test]
    fn test_first_run_state() {
        let handle = SelectionHandle::new();
        assert_eq!(handle.selected_card_id(), None);
        assert!(!handle.is_active());
    }

    #[tokio::test]
    async fn test_activate_then_reselect() {
        let (handle, repo) = setup().await;

        handle.activate(card(1), &repo).await.unwrap();
        handle.activate(card(2), &repo).await.unwrap();

        // The latest selection wins
        assert_eq!(handle.selected_card_id(), Some(card(2)));
        assert!(handle.is_active());
    }

    #[tokio::test]
    async fn test_deactivate_clears_to_sentinel() {
        let (handle, repo) = setup().await;

        handle.activate(card(1), &repo).await.unwrap();
        handle.deactivate(&repo).await.unwrap();

        assert_eq!(handle.selected_card_id(), None);
        assert!(!handle.is_active());
    }

    #[tokio::test]
    async fn test_disarm_remembers_id() {
        let (handle, repo) = setup().await;

        handle.activate(card(1), &repo).await.unwrap();
        handle.disarm(&repo).await.unwrap();

        assert_eq!(handle.selected_card_id(), Some(card(1)));
        assert!(!handle.is_active());

        // Re-arm without re-selecting
        handle.activate(card(1), &repo).await.unwrap();
        assert!(handle.is_active());
    }

    #[tokio::test]
    async fn test_clear_if_selected() {
        let (handle, repo) = setup().await;
        handle.activate(card(1), &repo).await.unwrap();

        // Unrelated id leaves the selection alone
        assert!(!handle.clear_if_selected(card(2), &repo).await.unwrap());
        assert_eq!(handle.selected_card_id(), Some(card(1)));

        // The selected id clears it
        assert!(handle.clear_if_selected(card(1), &repo).await.unwrap());
        assert_eq!(handle.selected_card_id(), None);
        assert!(!handle.is_active());
    }

    #[tokio::test]
    async fn test_restore_roundtrip() {
        let (handle, repo) = setup().await;
        handle.activate(card(2), &repo).await.unwrap();

        let restored = SelectionHandle::restore(&repo).await.unwrap();
        assert_eq!(restored.selected_card_id(), Some(card(2)));
        assert!(restored.is_active());
    }

    #[test]
    fn test_clones_share_state() {
        let handle = SelectionHandle::with_snapshot(SelectionSnapshot::armed(card(5)));
        let clone = handle.clone();
        assert_eq!(clone.selected_card_id(), Some(card(5)));
    }
}
