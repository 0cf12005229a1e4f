//! Snapshot business logic - Daily absolute totals for cash and buckets.
//!
//! Values are end-of-day totals, never deltas. Every write is an upsert keyed by
//! date (cash) or `(date, bucket)` (buckets), so saving the same day twice
//! overwrites. Reads default missing rows to zero at the caller.

use crate::{
    entities::{self, bucket_snapshot, cash_snapshot},
    errors::{Error, Result},
    models::{BucketId, Cents, DailyEntry},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::OnConflict};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

/// Free cash recorded on `date`, zero when nothing was saved.
pub async fn get_cash<C>(db: &C, date: NaiveDate) -> Result<Cents>
where
    C: ConnectionTrait,
{
    Ok(entities::CashSnapshot::find_by_id(date)
        .one(db)
        .await?
        .map_or(0, |row| row.value_cents))
}

/// Every bucket value recorded on `date`. Buckets without a row are absent.
pub async fn get_all_for_date<C>(db: &C, date: NaiveDate) -> Result<HashMap<BucketId, Cents>>
where
    C: ConnectionTrait,
{
    let rows = entities::BucketSnapshot::find()
        .filter(bucket_snapshot::Column::Date.eq(date))
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.bucket_id, row.value_cents))
        .collect())
}

/// Inserts or overwrites the cash total of `date`.
pub async fn upsert_cash<C>(db: &C, date: NaiveDate, cents: Cents) -> Result<()>
where
    C: ConnectionTrait,
{
    let model = cash_snapshot::ActiveModel {
        date: Set(date),
        value_cents: Set(cents),
    };
    entities::CashSnapshot::insert(model)
        .on_conflict(
            OnConflict::column(cash_snapshot::Column::Date)
                .update_column(cash_snapshot::Column::ValueCents)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    debug!("Saved cash {} for {}", cents, date);
    Ok(())
}

/// Inserts or overwrites the value of one bucket on `date`.
///
/// The note is trimmed; a blank note is stored as NULL.
pub async fn upsert_bucket<C>(
    db: &C,
    date: NaiveDate,
    bucket_id: BucketId,
    cents: Cents,
    note: Option<&str>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let model = bucket_snapshot::ActiveModel {
        date: Set(date),
        bucket_id: Set(bucket_id),
        value_cents: Set(cents),
        note: Set(crate::core::flow::normalize_note(note)),
    };
    entities::BucketSnapshot::insert(model)
        .on_conflict(
            OnConflict::columns([
                bucket_snapshot::Column::Date,
                bucket_snapshot::Column::BucketId,
            ])
            .update_columns([
                bucket_snapshot::Column::ValueCents,
                bucket_snapshot::Column::Note,
            ])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    debug!("Saved bucket {} = {} for {}", bucket_id, cents, date);
    Ok(())
}

/// Every recorded value of a bucket, ascending by date.
pub async fn series_for_bucket<C>(db: &C, bucket_id: BucketId) -> Result<BTreeMap<NaiveDate, Cents>>
where
    C: ConnectionTrait,
{
    let rows = entities::BucketSnapshot::find()
        .filter(bucket_snapshot::Column::BucketId.eq(bucket_id))
        .order_by_asc(bucket_snapshot::Column::Date)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.date, row.value_cents))
        .collect())
}

/// Rejects entries carrying negative values before anything is written.
pub fn validate_entry(entry: &DailyEntry) -> Result<()> {
    if entry.cash_cents < 0 {
        return Err(Error::InvalidAmount {
            amount: entry.cash_cents,
        });
    }
    if let Some(&negative) = entry.values_by_bucket.values().find(|v| **v < 0) {
        return Err(Error::InvalidAmount { amount: negative });
    }
    Ok(())
}

/// Saves cash and every bucket value of a day as one transaction.
///
/// Either all rows for the date are written or none are, so a half-written day
/// can never feed the next day's profit.
#[instrument(skip(db, entry), fields(date = %entry.date))]
pub async fn save_entry<C>(db: &C, entry: &DailyEntry) -> Result<()>
where
    C: TransactionTrait,
{
    validate_entry(entry)?;

    let txn = db.begin().await?;
    upsert_cash(&txn, entry.date, entry.cash_cents).await?;
    for (&bucket_id, &cents) in &entry.values_by_bucket {
        upsert_bucket(&txn, entry.date, bucket_id, cents, None).await?;
    }
    txn.commit().await?;

    info!(
        "Saved entry for {}: cash {} and {} bucket values",
        entry.date,
        entry.cash_cents,
        entry.values_by_bucket.len()
    );
    Ok(())
}
