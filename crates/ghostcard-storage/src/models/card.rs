use chrono::{DateTime, Utc};
use ghostcard_core::{Aid, CardUid};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// One scanned contactless card, as persisted by the store.
///
/// Created once at scan time (outside the engine), read many times by the
/// dispatcher, and mutated only through usage accounting. The identifying
/// byte fields are immutable once captured.
///
/// # Invariants
///
/// - `uid` is never empty (enforced by [`CardUid`])
/// - `ats` and `historical_bytes`, when present, are never zero-length;
///   empty captures are normalized to `None`
/// - an empty `aids` list means "accept any requested application"
///
/// # Examples
///
/// ```
/// use ghostcard_storage::models::CardRecord;
/// use ghostcard_core::{Aid, CardUid};
///
/// let card = CardRecord::scanned(CardUid::from_hex("04A1B2C3").unwrap())
///     .with_ats(vec![0x75, 0x77])
///     .with_name("office badge");
///
/// // Cards that advertise no AIDs match every request
/// let requested: Aid = "F0010203040506".parse().unwrap();
/// assert!(card.matches_aid(&requested));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRecord {
    /// Auto-increment primary key, assigned by the store (0 before creation)
    pub id: i64,

    /// Hardware identifier captured at scan time
    pub uid: CardUid,

    /// Answer-To-Select payload; present only for protocol-aware cards
    pub ats: Option<Vec<u8>>,

    /// Bytes returned verbatim on read requests; present only if captured
    pub historical_bytes: Option<Vec<u8>>,

    /// Application identifiers the card advertises; may be empty
    pub aids: Vec<Aid>,

    /// Display name (presentation only)
    pub name: String,

    /// Display color (presentation only)
    pub color: String,

    /// Number of completed emulation sessions served with this card
    pub usage_count: i64,

    /// When the card last served a session
    pub last_used_at: Option<DateTime<Utc>>,

    /// Record creation timestamp
    pub created_at: DateTime<Utc>,

    /// Record last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl CardRecord {
    /// Build a freshly scanned record, not yet persisted (`id == 0`).
    #[must_use]
    pub fn scanned(uid: CardUid) -> Self {
        Self {
            id: 0,
            uid,
            ats: None,
            historical_bytes: None,
            aids: Vec::new(),
            name: String::new(),
            color: String::new(),
            usage_count: 0,
            last_used_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Attach an ATS payload; an empty capture is normalized to absent.
    #[must_use]
    pub fn with_ats(mut self, ats: Vec<u8>) -> Self {
        self.ats = normalize_capture(Some(ats));
        self
    }

    /// Attach historical bytes; an empty capture is normalized to absent.
    #[must_use]
    pub fn with_historical_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.historical_bytes = normalize_capture(Some(bytes));
        self
    }

    /// Set the advertised AID list.
    #[must_use]
    pub fn with_aids(mut self, aids: Vec<Aid>) -> Self {
        self.aids = aids;
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check whether a requested AID is acceptable for this card.
    ///
    /// An empty `aids` set accepts any request. A non-empty set is checked
    /// for containment, but callers treat a mismatch as log-worthy rather
    /// than fatal: access-control readers routinely request AIDs the
    /// original card never declared.
    #[must_use]
    pub fn matches_aid(&self, requested: &Aid) -> bool {
        self.aids.is_empty() || self.aids.contains(requested)
    }
}

/// Normalize an optional byte capture: empty becomes absent.
pub(crate) fn normalize_capture(bytes: Option<Vec<u8>>) -> Option<Vec<u8>> {
    bytes.filter(|b| !b.is_empty())
}

/// Raw database row for a card, before invariants are re-established.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CardRow {
    pub id: i64,
    pub uid: Vec<u8>,
    pub ats: Option<Vec<u8>>,
    pub historical_bytes: Option<Vec<u8>>,
    pub aids: String,
    pub name: String,
    pub color: String,
    pub usage_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CardRow> for CardRecord {
    type Error = StorageError;

    fn try_from(row: CardRow) -> StorageResult<Self> {
        let uid = CardUid::new(row.uid)
            .map_err(|e| StorageError::CorruptRecord(format!("card {}: {}", row.id, e)))?;
        let aids: Vec<Aid> = serde_json::from_str(&row.aids)?;

        Ok(CardRecord {
            id: row.id,
            uid,
            ats: normalize_capture(row.ats),
            historical_bytes: normalize_capture(row.historical_bytes),
            aids,
            name: row.name,
            color: row.color,
            usage_count: row.usage_count,
            last_used_at: row.last_used_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
