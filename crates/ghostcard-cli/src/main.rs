//! Developer harness for the card-emulation engine.
//!
//! Opens (or creates) a ghostcard database, seeds a demo card on first run,
//! arms it, and replays a scripted terminal session through the mock host
//! bridge, printing each command/response exchange in hex. This is the
//! composition root the platform adapter would otherwise provide: restore
//! selection, refresh the cache, spawn the usage worker, wire the
//! dispatcher.
//!
//! Usage:
//! ```sh
//! ghostcard-cli [DATABASE_PATH]
//! ```

use anyhow::Context;
use ghostcard_core::{Aid, CardUid, DeactivationReason, encode_hex};
use ghostcard_engine::{
    ApduDispatcher, CardCache, MockTerminal, SelectionHandle, UsageWorker, usage_channel,
};
use ghostcard_storage::{
    CardRecord, CardRepository, Database, DatabaseConfig, SqliteCardRepository,
    SqliteSelectionRepository,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ghostcard.db".to_string());

    let db = Database::new(DatabaseConfig::new(&database_path))
        .await
        .with_context(|| format!("failed to open database at {database_path}"))?;
    let cards = SqliteCardRepository::new(db.pool().clone());
    let selection_repo = SqliteSelectionRepository::new(db.pool().clone());

    let card_id = match cards.find_all().await?.first() {
        Some(card) => {
            info!(name = %card.name, uid = %card.uid, "using existing card");
            ghostcard_core::CardId::new(card.id)?
        }
        None => {
            let record = CardRecord::scanned(CardUid::from_hex("04A1B2C3")?)
                .with_ats(vec![0x75, 0x77])
                .with_historical_bytes(vec![0x80, 0x4F, 0x0C])
                .with_aids(vec!["A000000003".parse::<Aid>()?])
                .with_name("demo badge");
            let id = cards.create(&record).await?;
            info!(%id, "seeded demo card");
            id
        }
    };

    // Restore the durable selection; arm the card if nothing is armed yet
    let selection = SelectionHandle::restore(&selection_repo).await?;
    if selection.selected_card_id().is_none() {
        selection.activate(card_id, &selection_repo).await?;
    }

    let cache = CardCache::new();
    cache.refresh(&cards).await?;

    let (usage_tx, usage_rx) = usage_channel();
    let worker = tokio::spawn(
        UsageWorker::new(SqliteCardRepository::new(db.pool().clone()), usage_rx).run(),
    );

    let engine = ApduDispatcher::new(selection.clone(), cache, usage_tx);

    // A typical access-control reader probe sequence
    let session = MockTerminal::new()
        .command([
            0x00, 0xA4, 0x04, 0x00, 0x07, 0xF0, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06,
        ])
        .command([0x00, 0xCA, 0x00, 0x00])
        .command([0x00, 0xB0, 0x00, 0x00, 0x00])
        .command([0x00, 0x20, 0x00, 0x80, 0x04, 0x31, 0x32, 0x33, 0x34])
        .command([0x80, 0x60, 0x00, 0x00])
        .with_reason(DeactivationReason::LinkLoss)
        .present_to(&engine);

    println!("terminal session against card {card_id}:");
    for exchange in &session {
        println!(
            "  >> {:<28} << {}",
            encode_hex(&exchange.command),
            encode_hex(&exchange.response)
        );
    }

    // Close the usage channel and let the worker flush the session event
    drop(engine);
    worker.await?;

    if let Some(card) = cards.get_by_id(card_id).await? {
        println!(
            "card {card_id} served {} session(s), last used {}",
            card.usage_count,
            card.last_used_at
                .map_or_else(|| "never".to_string(), |t| t.to_rfc3339()),
        );
    }

    Ok(())
}
