//! `SeaORM`-backed implementation of the three store traits.

use super::{BucketStore, FlowStore, SnapshotStore};
use crate::core::{bucket, flow, snapshot};
use crate::errors::Result;
use crate::models::{Bucket, BucketId, Category, Cents, DailyEntry, Flow, FlowId, NewFlow};
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::collections::{BTreeMap, HashMap};

/// Stores backed by one database connection.
#[derive(Debug)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    /// Wraps an open connection. The tables must already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl BucketStore for DatabaseStore {
    async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        bucket::list_buckets(&self.db).await
    }

    async fn create_bucket(&self, name: &str) -> Result<BucketId> {
        bucket::create_bucket(&self.db, name).await
    }

    async fn rename_bucket(&self, bucket_id: BucketId, new_name: &str) -> Result<()> {
        bucket::rename_bucket(&self.db, bucket_id, new_name).await
    }

    async fn set_bucket_category(
        &self,
        bucket_id: BucketId,
        category: Option<Category>,
    ) -> Result<()> {
        bucket::set_bucket_category(&self.db, bucket_id, category).await
    }

    async fn delete_bucket(&self, bucket_id: BucketId) -> Result<()> {
        bucket::delete_bucket(&self.db, bucket_id).await
    }
}

#[async_trait]
impl SnapshotStore for DatabaseStore {
    async fn get_cash(&self, date: NaiveDate) -> Result<Cents> {
        snapshot::get_cash(&self.db, date).await
    }

    async fn get_all_for_date(&self, date: NaiveDate) -> Result<HashMap<BucketId, Cents>> {
        snapshot::get_all_for_date(&self.db, date).await
    }

    async fn upsert_cash(&self, date: NaiveDate, cents: Cents) -> Result<()> {
        snapshot::upsert_cash(&self.db, date, cents).await
    }

    async fn upsert_bucket(
        &self,
        date: NaiveDate,
        bucket_id: BucketId,
        cents: Cents,
        note: Option<&str>,
    ) -> Result<()> {
        snapshot::upsert_bucket(&self.db, date, bucket_id, cents, note).await
    }

    async fn series_for_bucket(&self, bucket_id: BucketId) -> Result<BTreeMap<NaiveDate, Cents>> {
        snapshot::series_for_bucket(&self.db, bucket_id).await
    }

    async fn save_entry(&self, entry: &DailyEntry) -> Result<()> {
        snapshot::save_entry(&self.db, entry).await
    }
}

#[async_trait]
impl FlowStore for DatabaseStore {
    async fn flows_for_date(&self, date: NaiveDate) -> Result<Vec<Flow>> {
        flow::flows_for_date(&self.db, date).await
    }

    async fn create_flow(&self, new_flow: &NewFlow) -> Result<FlowId> {
        flow::create_flow(&self.db, new_flow).await
    }

    async fn delete_flow(&self, flow_id: FlowId) -> Result<()> {
        flow::delete_flow(&self.db, flow_id).await
    }
}
