use ghostcard_core::CardId;
use serde::{Deserialize, Serialize};

/// The single-slot emulation selection state.
///
/// Which card is remembered as selected, and whether emulation is currently
/// armed. The two are deliberately independent: a card can stay remembered
/// while emulation is paused, so it can be re-armed without re-selecting.
///
/// # Invariant
///
/// `is_active` implies `selected_card_id` is present. The constructors make
/// violating states unrepresentable; rows loaded from storage are sanitized
/// through [`SelectionSnapshot::sanitized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    /// The remembered card id; `None` is the "nothing selected" sentinel
    pub selected_card_id: Option<CardId>,

    /// Whether emulation is armed
    pub is_active: bool,
}

impl SelectionSnapshot {
    /// Nothing selected, emulation inactive. The first-run state.
    #[must_use]
    pub fn inactive() -> Self {
        Self::default()
    }

    /// A card selected and emulation armed.
    #[must_use]
    pub fn armed(card_id: CardId) -> Self {
        Self {
            selected_card_id: Some(card_id),
            is_active: true,
        }
    }

    /// A card remembered but emulation paused.
    #[must_use]
    pub fn remembered(card_id: CardId) -> Self {
        Self {
            selected_card_id: Some(card_id),
            is_active: false,
        }
    }

    /// Re-establish the invariant on externally sourced state.
    ///
    /// An active flag with no card id (e.g. after the store nulled a deleted
    /// card's reference) degrades to inactive.
    #[must_use]
    pub fn sanitized(self) -> Self {
        if self.is_active && self.selected_card_id.is_none() {
            Self::inactive()
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: i64) -> CardId {
        CardId::new(id).unwrap()
    }

    #[test]
    fn test_first_run_state() {
        let snapshot = SelectionSnapshot::inactive();
        assert!(snapshot.selected_card_id.is_none());
        assert!(!snapshot.is_active);
    }

    #[test]
    fn test_armed() {
        let snapshot = SelectionSnapshot::armed(card(3));
        assert_eq!(snapshot.selected_card_id, Some(card(3)));
        assert!(snapshot.is_active);
    }

    #[test]
    fn test_remembered_keeps_id_while_paused() {
        let snapshot = SelectionSnapshot::remembered(card(3));
        assert_eq!(snapshot.selected_card_id, Some(card(3)));
        assert!(!snapshot.is_active);
    }

    #[test]
    fn test_sanitize_degrades_active_without_id() {
        let bad = SelectionSnapshot {
            selected_card_id: None,
            is_active: true,
        };
        assert_eq!(bad.sanitized(), SelectionSnapshot::inactive());
    }

    #[test]
    fn test_sanitize_preserves_valid_states() {
        assert_eq!(
            SelectionSnapshot::armed(card(1)).sanitized(),
            SelectionSnapshot::armed(card(1))
        );
        assert_eq!(
            SelectionSnapshot::remembered(card(1)).sanitized(),
            SelectionSnapshot::remembered(card(1))
        );
    }
}
