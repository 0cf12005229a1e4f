//! In-process implementation of the store traits.
//!
//! Follows the same rules as the database store (name uniqueness, upserts,
//! validation before mutation, cascading bucket deletion) without any I/O.

use super::{BucketStore, FlowStore, SnapshotStore};
use crate::core::{bucket::validate_bucket_name, flow, snapshot::validate_entry};
use crate::errors::{Error, Result};
use crate::models::{
    Bucket, BucketId, Category, Cents, DailyEntry, Endpoint, Flow, FlowId, NewFlow,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<BucketId, Bucket>,
    next_bucket_id: BucketId,
    cash: BTreeMap<NaiveDate, Cents>,
    bucket_values: BTreeMap<(NaiveDate, BucketId), (Cents, Option<String>)>,
    flows: Vec<Flow>,
    next_flow_id: FlowId,
}

impl State {
    fn name_taken(&self, name: &str, except: Option<BucketId>) -> bool {
        self.buckets
            .iter()
            .any(|(id, existing)| existing.name == name && Some(*id) != except)
    }

    fn require_bucket(&self, bucket_id: BucketId) -> Result<()> {
        if self.buckets.contains_key(&bucket_id) {
            Ok(())
        } else {
            Err(Error::NotFound {
                entity: "bucket",
                id: bucket_id,
            })
        }
    }
}

/// Thread-safe in-memory stores.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.inner.read().map_err(|_| Error::Storage {
            message: "memory store lock poisoned".to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.inner.write().map_err(|_| Error::Storage {
            message: "memory store lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let state = self.read()?;
        let mut buckets: Vec<Bucket> = state.buckets.values().cloned().collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }

    async fn create_bucket(&self, name: &str) -> Result<BucketId> {
        let name = validate_bucket_name(name)?;
        let mut state = self.write()?;
        if state.name_taken(name, None) {
            return Err(Error::Validation {
                message: format!("A bucket named '{name}' already exists"),
            });
        }
        state.next_bucket_id += 1;
        let id = state.next_bucket_id;
        state.buckets.insert(
            id,
            Bucket {
                id,
                name: name.to_string(),
                category: None,
            },
        );
        info!("Created bucket {} '{}'", id, name);
        Ok(id)
    }

    async fn rename_bucket(&self, bucket_id: BucketId, new_name: &str) -> Result<()> {
        let name = validate_bucket_name(new_name)?;
        let mut state = self.write()?;
        state.require_bucket(bucket_id)?;
        if state.name_taken(name, Some(bucket_id)) {
            return Err(Error::Validation {
                message: format!("A bucket named '{name}' already exists"),
            });
        }
        if let Some(bucket) = state.buckets.get_mut(&bucket_id) {
            bucket.name = name.to_string();
        }
        Ok(())
    }

    async fn set_bucket_category(
        &self,
        bucket_id: BucketId,
        category: Option<Category>,
    ) -> Result<()> {
        let mut state = self.write()?;
        let bucket = state.buckets.get_mut(&bucket_id).ok_or(Error::NotFound {
            entity: "bucket",
            id: bucket_id,
        })?;
        bucket.category = category;
        Ok(())
    }

    async fn delete_bucket(&self, bucket_id: BucketId) -> Result<()> {
        let mut state = self.write()?;
        if state.buckets.remove(&bucket_id).is_none() {
            return Err(Error::NotFound {
                entity: "bucket",
                id: bucket_id,
            });
        }
        state.bucket_values.retain(|(_, id), _| *id != bucket_id);
        let touches = |endpoint: Endpoint| endpoint == Endpoint::Bucket(bucket_id);
        state.flows.retain(|f| !touches(f.from) && !touches(f.to));
        info!("Deleted bucket {}", bucket_id);
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get_cash(&self, date: NaiveDate) -> Result<Cents> {
        Ok(self.read()?.cash.get(&date).copied().unwrap_or(0))
    }

    async fn get_all_for_date(&self, date: NaiveDate) -> Result<HashMap<BucketId, Cents>> {
        let state = self.read()?;
        Ok(state
            .bucket_values
            .range((date, BucketId::MIN)..=(date, BucketId::MAX))
            .map(|((_, id), (cents, _))| (*id, *cents))
            .collect())
    }

    async fn upsert_cash(&self, date: NaiveDate, cents: Cents) -> Result<()> {
        self.write()?.cash.insert(date, cents);
        debug!("Saved cash {} for {}", cents, date);
        Ok(())
    }

    async fn upsert_bucket(
        &self,
        date: NaiveDate,
        bucket_id: BucketId,
        cents: Cents,
        note: Option<&str>,
    ) -> Result<()> {
        let mut state = self.write()?;
        state.require_bucket(bucket_id)?;
        state
            .bucket_values
            .insert((date, bucket_id), (cents, flow::normalize_note(note)));
        Ok(())
    }

    async fn series_for_bucket(&self, bucket_id: BucketId) -> Result<BTreeMap<NaiveDate, Cents>> {
        let state = self.read()?;
        Ok(state
            .bucket_values
            .iter()
            .filter(|((_, id), _)| *id == bucket_id)
            .map(|((date, _), (cents, _))| (*date, *cents))
            .collect())
    }

    async fn save_entry(&self, entry: &DailyEntry) -> Result<()> {
        validate_entry(entry)?;
        let mut state = self.write()?;
        for &bucket_id in entry.values_by_bucket.keys() {
            state.require_bucket(bucket_id)?;
        }
        state.cash.insert(entry.date, entry.cash_cents);
        for (&bucket_id, &cents) in &entry.values_by_bucket {
            state
                .bucket_values
                .insert((entry.date, bucket_id), (cents, None));
        }
        Ok(())
    }
}

#[async_trait]
impl FlowStore for MemoryStore {
    async fn flows_for_date(&self, date: NaiveDate) -> Result<Vec<Flow>> {
        let state = self.read()?;
        Ok(state
            .flows
            .iter()
            .filter(|f| f.date == date)
            .cloned()
            .collect())
    }

    async fn create_flow(&self, new_flow: &NewFlow) -> Result<FlowId> {
        flow::validate_flow(new_flow)?;
        let mut state = self.write()?;
        state.next_flow_id += 1;
        let id = state.next_flow_id;
        let mut recorded = new_flow.clone();
        recorded.note = flow::normalize_note(new_flow.note.as_deref());
        state.flows.push(Flow::from_new(id, recorded));
        Ok(id)
    }

    async fn delete_flow(&self, flow_id: FlowId) -> Result<()> {
        let mut state = self.write()?;
        let before = state.flows.len();
        state.flows.retain(|f| f.id != flow_id);
        if state.flows.len() == before {
            return Err(Error::NotFound {
                entity: "flow",
                id: flow_id,
            });
        }
        Ok(())
    }
}
