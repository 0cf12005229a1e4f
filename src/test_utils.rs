//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and stores and for building entries and flows with sensible defaults.

use crate::{
    core::valuation::ValuationEngine,
    errors::Result,
    models::{BucketId, Cents, DailyEntry, Endpoint, Flow, FlowId, NewFlow},
    store::{database::DatabaseStore, memory::MemoryStore},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Wraps a fresh in-memory database in a [`DatabaseStore`].
pub async fn setup_test_store() -> Result<DatabaseStore> {
    Ok(DatabaseStore::new(setup_test_db().await?))
}

/// Creates an engine over an empty [`MemoryStore`].
/// Returns (engine, store) so tests can seed data through the store.
#[must_use]
pub fn setup_memory_engine() -> (ValuationEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = ValuationEngine::from_store(Arc::clone(&store));
    (engine, store)
}

/// Day `n` of February 2024 (a leap month, 29 days).
#[must_use]
pub fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, n).unwrap_or_else(|| panic!("invalid test day {n}"))
}

/// Builds an entry from cash and `(bucket, value)` pairs.
#[must_use]
pub fn entry(date: NaiveDate, cash_cents: Cents, values: &[(BucketId, Cents)]) -> DailyEntry {
    DailyEntry {
        date,
        cash_cents,
        values_by_bucket: values.iter().copied().collect(),
    }
}

/// Builds an unrecorded flow without a note.
#[must_use]
pub fn new_flow(date: NaiveDate, from: Endpoint, to: Endpoint, amount_cents: Cents) -> NewFlow {
    NewFlow {
        date,
        from,
        to,
        amount_cents,
        note: None,
    }
}

/// Builds an already-recorded flow, for pure computations that skip the stores.
#[must_use]
pub fn flow(
    id: FlowId,
    date: NaiveDate,
    from: Endpoint,
    to: Endpoint,
    amount_cents: Cents,
) -> Flow {
    Flow::from_new(id, new_flow(date, from, to, amount_cents))
}
