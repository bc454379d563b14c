#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::card::{CardRecord, CardRow, normalize_capture};
use chrono::{DateTime, Utc};
use ghostcard_core::CardId;
use sqlx::SqlitePool;

/// Repository trait for card record operations.
///
/// This is the store contract the engine consumes: lookup by id for the
/// command path (via the engine's cache), usage accounting on deactivation,
/// and the creation/deletion operations the scan and management flows need.
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024 feature),
/// eliminating the need for the async-trait crate while maintaining
/// full async/await support in trait methods.
pub trait CardRepository: Send + Sync {
    /// Find a card by its id
    async fn get_by_id(&self, id: CardId) -> StorageResult<Option<CardRecord>>;

    /// Get all cards, newest first
    async fn find_all(&self) -> StorageResult<Vec<CardRecord>>;

    /// Create a new card, returning the store-assigned id
    async fn create(&self, card: &CardRecord) -> StorageResult<CardId>;

    /// Record one completed emulation session: increment the usage counter
    /// and stamp the last-used time
    async fn update_usage(&self, id: CardId, used_at: DateTime<Utc>) -> StorageResult<()>;

    /// Delete a card by id
    ///
    /// The caller owns the coordination with selection state: deleting the
    /// currently selected card must be followed by clearing the selection.
    async fn delete(&self, id: CardId) -> StorageResult<()>;
}

/// SQLite implementation of CardRepository
pub struct SqliteCardRepository {
    pool: SqlitePool,
}

impl SqliteCardRepository {
    /// Create a new SQLite card repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl CardRepository for SqliteCardRepository {
    async fn get_by_id(&self, id: CardId) -> StorageResult<Option<CardRecord>> {
        let row = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT id, uid, ats, historical_bytes, aids, name, color,
                   usage_count, last_used_at, created_at, updated_at
            FROM cards
            WHERE id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CardRecord::try_from).transpose()
    }

    async fn find_all(&self) -> StorageResult<Vec<CardRecord>> {
        let rows = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT id, uid, ats, historical_bytes, aids, name, color,
                   usage_count, last_used_at, created_at, updated_at
            FROM cards
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CardRecord::try_from).collect()
    }

    async fn create(&self, card: &CardRecord) -> StorageResult<CardId> {
        let aids = serde_json::to_string(&card.aids)?;
        let result = sqlx::query(
            r#"
            INSERT INTO cards (uid, ats, historical_bytes, aids, name, color)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(card.uid.as_bytes())
        .bind(normalize_capture(card.ats.clone()))
        .bind(normalize_capture(card.historical_bytes.clone()))
        .bind(aids)
        .bind(&card.name)
        .bind(&card.color)
        .execute(&self.pool)
        .await?;

        CardId::new(result.last_insert_rowid()).map_err(|e| {
            StorageError::CorruptRecord(format!("store assigned invalid id: {}", e))
        })
    }

    async fn update_usage(&self, id: CardId, used_at: DateTime<Utc>) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE cards
            SET usage_count = usage_count + 1,
                last_used_at = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(used_at)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                entity_type: "Card".to_string(),
                field: "id".to_string(),
                value: id.to_string(),
            });
        }

        Ok(())
    }

    async fn delete(&self, id: CardId) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM cards WHERE id = ?")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                entity_type: "Card".to_string(),
                field: "id".to_string(),
                value: id.to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use ghostcard_core::{Aid, CardUid};

    async fn setup_test_db() -> Database {
        Database::in_memory().await.unwrap()
    }

    fn scanned_card(uid_hex: &str) -> CardRecord {
        CardRecord::scanned(CardUid::from_hex(uid_hex).unwrap())
            .with_ats(vec![0x75, 0x77])
            .with_name("test card")
    }

    #[tokio::test]
    async fn test_create_and_get_card() {
        let db = setup_test_db().await;
        let repo = SqliteCardRepository::new(db.pool().clone());

        let id = repo.create(&scanned_card("04A1B2C3")).await.unwrap();
        assert!(id.as_i64() > 0);

        let found = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.uid.to_hex(), "04A1B2C3");
        assert_eq!(found.ats, Some(vec![0x75, 0x77]));
        assert_eq!(found.usage_count, 0);
        assert!(found.last_used_at.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_card() {
        let db = setup_test_db().await;
        let repo = SqliteCardRepository::new(db.pool().clone());

        let missing = repo.get_by_id(CardId::new(999).unwrap()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_empty_captures_stored_as_null() {
        let db = setup_test_db().await;
        let repo = SqliteCardRepository::new(db.pool().clone());

        let mut card = scanned_card("04A1B2C3");
        card.ats = Some(vec![]);
        card.historical_bytes = Some(vec![]);

        let id = repo.create(&card).await.unwrap();
        let found = repo.get_by_id(id).await.unwrap().unwrap();
        assert!(found.ats.is_none());
        assert!(found.historical_bytes.is_none());
    }

    #[tokio::test]
    async fn test_aids_roundtrip() {
        let db = setup_test_db().await;
        let repo = SqliteCardRepository::new(db.pool().clone());

        let aid: Aid = "A000000003".parse().unwrap();
        let card = scanned_card("04A1B2C3").with_aids(vec![aid.clone()]);

        let id = repo.create(&card).await.unwrap();
        let found = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.aids, vec![aid]);
    }

    #[tokio::test]
    async fn test_find_all_newest_first() {
        let db = setup_test_db().await;
        let repo = SqliteCardRepository::new(db.pool().clone());

        repo.create(&scanned_card("04A1B2C3")).await.unwrap();
        repo.create(&scanned_card("04D4E5F607")).await.unwrap();

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_update_usage() {
        let db = setup_test_db().await;
        let repo = SqliteCardRepository::new(db.pool().clone());

        let id = repo.create(&scanned_card("04A1B2C3")).await.unwrap();
        let used_at = Utc::now();

        repo.update_usage(id, used_at).await.unwrap();
        repo.update_usage(id, used_at).await.unwrap();

        let found = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.usage_count, 2);
        assert!(found.last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_update_usage_missing_card() {
        let db = setup_test_db().await;
        let repo = SqliteCardRepository::new(db.pool().clone());

        let result = repo
            .update_usage(CardId::new(999).unwrap(), Utc::now())
            .await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_card() {
        let db = setup_test_db().await;
        let repo = SqliteCardRepository::new(db.pool().clone());

        let id = repo.create(&scanned_card("04A1B2C3")).await.unwrap();
        repo.delete(id).await.unwrap();

        assert!(repo.get_by_id(id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(id).await,
            Err(StorageError::NotFound { .. })
        ));
    }
}
