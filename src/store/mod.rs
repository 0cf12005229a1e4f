//! Collaborator contracts consumed by the valuation engine.
//!
//! The engine never talks to a database directly. It receives one implementation
//! of each trait at construction: [`database::DatabaseStore`] backs all three with
//! `SeaORM`, [`memory::MemoryStore`] keeps everything in process.

pub mod database;
pub mod memory;

use crate::errors::Result;
use crate::models::{Bucket, BucketId, Category, Cents, DailyEntry, Flow, FlowId, NewFlow};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Registry of named buckets.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Every bucket ordered by name.
    async fn list_buckets(&self) -> Result<Vec<Bucket>>;
    /// Creates a bucket; blank or duplicate names fail with `Error::Validation`.
    async fn create_bucket(&self, name: &str) -> Result<BucketId>;
    /// Renames a bucket under the same name rules.
    async fn rename_bucket(&self, bucket_id: BucketId, new_name: &str) -> Result<()>;
    /// Sets or clears the asset class of a bucket.
    async fn set_bucket_category(
        &self,
        bucket_id: BucketId,
        category: Option<Category>,
    ) -> Result<()>;
    /// Deletes a bucket with its snapshots and flows.
    async fn delete_bucket(&self, bucket_id: BucketId) -> Result<()>;
}

/// Daily absolute totals for cash and buckets.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Cash on `date`, zero when absent.
    async fn get_cash(&self, date: NaiveDate) -> Result<Cents>;
    /// Bucket values on `date`; buckets without a value are absent.
    async fn get_all_for_date(&self, date: NaiveDate) -> Result<HashMap<BucketId, Cents>>;
    /// Inserts or overwrites the cash of `date`.
    async fn upsert_cash(&self, date: NaiveDate, cents: Cents) -> Result<()>;
    /// Inserts or overwrites one bucket value of `date`; unknown buckets fail.
    async fn upsert_bucket(
        &self,
        date: NaiveDate,
        bucket_id: BucketId,
        cents: Cents,
        note: Option<&str>,
    ) -> Result<()>;
    /// All values of a bucket, ascending by date.
    async fn series_for_bucket(&self, bucket_id: BucketId) -> Result<BTreeMap<NaiveDate, Cents>>;
    /// Writes a whole day atomically: all values or none.
    async fn save_entry(&self, entry: &DailyEntry) -> Result<()>;
}

/// Append-only ledger of non-profit movements.
#[async_trait]
pub trait FlowStore: Send + Sync {
    /// Flows recorded on `date`, in insertion order.
    async fn flows_for_date(&self, date: NaiveDate) -> Result<Vec<Flow>>;
    /// Validates and records a flow.
    async fn create_flow(&self, flow: &NewFlow) -> Result<FlowId>;
    /// Deletes a flow; unknown ids fail with `Error::NotFound`.
    async fn delete_flow(&self, flow_id: FlowId) -> Result<()>;
}
