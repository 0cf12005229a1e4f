//! Daily valuation and profit reconciliation.
//!
//! The market profit of a bucket on a day is its day-over-day change minus the
//! net amount the user moved into it that day:
//!
//! ```text
//! profit = (today - yesterday) - (flows in - flows out)
//! ```
//!
//! Money deposited into a bucket therefore never shows up as profit. When the
//! previous day has no data at all there is no baseline and every profit is zero.
//! Cash is reported as an informational delta and never counts as market profit.

use crate::{
    errors::Result,
    models::{Bucket, BucketId, Cents, DailyEntry, DailySummary, Endpoint, Flow},
    store::{BucketStore, FlowStore, SnapshotStore},
};
use chrono::{Days, NaiveDate};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, instrument};

/// Net amount moved into each bucket by `flows`: inflows minus outflows.
///
/// Several flows touching the same bucket are netted together. Cash endpoints
/// are ignored.
#[must_use]
pub fn net_flow_by_bucket(flows: &[Flow]) -> HashMap<BucketId, Cents> {
    let mut net = HashMap::new();
    for flow in flows {
        if let Endpoint::Bucket(id) = flow.to {
            *net.entry(id).or_insert(0) += flow.amount_cents;
        }
        if let Endpoint::Bucket(id) = flow.from {
            *net.entry(id).or_insert(0) -= flow.amount_cents;
        }
    }
    net
}

/// Builds the summary of `today` against an optional baseline.
///
/// `previous` is `None` when the previous day has no data; every profit figure
/// and the cash delta are then zero. Only buckets listed in `buckets` appear in
/// the result, each with a value and a profit even when nothing was recorded.
#[must_use]
pub fn compute_summary(
    buckets: &[Bucket],
    today: &DailyEntry,
    previous: Option<&DailyEntry>,
    flows_today: &[Flow],
) -> DailySummary {
    let flow_net = net_flow_by_bucket(flows_today);

    let mut per_bucket_today = HashMap::with_capacity(buckets.len());
    let mut per_bucket_profit = HashMap::with_capacity(buckets.len());
    let mut total_today = today.cash_cents;

    for bucket in buckets {
        let value = today.value_of(bucket.id);
        let profit = previous.map_or(0, |prev| {
            let delta = value - prev.value_of(bucket.id);
            delta - flow_net.get(&bucket.id).copied().unwrap_or(0)
        });

        per_bucket_today.insert(bucket.id, value);
        per_bucket_profit.insert(bucket.id, profit);
        total_today += value;
    }

    let total_profit: Cents = per_bucket_profit.values().sum();
    let cash_delta = previous.map_or(0, |prev| today.cash_cents - prev.cash_cents);

    DailySummary {
        date: today.date,
        total_today_cents: total_today,
        total_profit_today_cents: total_profit,
        cash_today_cents: today.cash_cents,
        cash_delta_cents: cash_delta,
        per_bucket_today,
        per_bucket_profit,
    }
}

/// The day before `date`, `None` at the start of the calendar.
#[must_use]
pub fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(1))
}

/// Computes daily summaries from the three injected stores.
///
/// Holds no state of its own; every call reads the stores afresh.
#[derive(Clone)]
pub struct ValuationEngine {
    buckets: Arc<dyn BucketStore>,
    snapshots: Arc<dyn SnapshotStore>,
    flows: Arc<dyn FlowStore>,
}

impl ValuationEngine {
    /// Creates an engine over three independent collaborators.
    #[must_use]
    pub fn new(
        buckets: Arc<dyn BucketStore>,
        snapshots: Arc<dyn SnapshotStore>,
        flows: Arc<dyn FlowStore>,
    ) -> Self {
        Self {
            buckets,
            snapshots,
            flows,
        }
    }

    /// Creates an engine over a single store implementing all three contracts.
    #[must_use]
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: BucketStore + SnapshotStore + FlowStore + 'static,
    {
        let buckets: Arc<dyn BucketStore> = Arc::clone(&store) as _;
        let snapshots: Arc<dyn SnapshotStore> = Arc::clone(&store) as _;
        let flows: Arc<dyn FlowStore> = store;
        Self::new(buckets, snapshots, flows)
    }

    /// The bucket registry.
    #[must_use]
    pub fn bucket_store(&self) -> &dyn BucketStore {
        self.buckets.as_ref()
    }

    /// The snapshot store.
    #[must_use]
    pub fn snapshot_store(&self) -> &dyn SnapshotStore {
        self.snapshots.as_ref()
    }

    /// The flow ledger.
    #[must_use]
    pub fn flow_store(&self) -> &dyn FlowStore {
        self.flows.as_ref()
    }

    /// Recorded totals of `date`; anything missing is zero.
    pub async fn load_entry(&self, date: NaiveDate) -> Result<DailyEntry> {
        Ok(DailyEntry {
            date,
            cash_cents: self.snapshots.get_cash(date).await?,
            values_by_bucket: self.snapshots.get_all_for_date(date).await?,
        })
    }

    /// Whether anything was recorded on `date`: non-zero cash, a bucket value or a flow.
    pub async fn has_any_data(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.baseline(date).await?.is_some())
    }

    /// The entry of `date` if anything was recorded on it.
    async fn baseline(&self, date: NaiveDate) -> Result<Option<DailyEntry>> {
        let entry = self.load_entry(date).await?;
        if entry.cash_cents != 0 || !entry.values_by_bucket.is_empty() {
            return Ok(Some(entry));
        }
        let has_flows = !self.flows.flows_for_date(date).await?.is_empty();
        Ok(has_flows.then_some(entry))
    }

    /// Summary of `date` from the recorded values.
    pub async fn summary_for(&self, date: NaiveDate) -> Result<DailySummary> {
        let today = self.load_entry(date).await?;
        self.summarize(today).await
    }

    /// Summary of `date` computed from unsaved candidate values.
    ///
    /// Nothing is written. Buckets absent from `bucket_overrides` count as zero,
    /// exactly as an unsaved form field would.
    pub async fn preview_summary(
        &self,
        date: NaiveDate,
        cash_override: Cents,
        bucket_overrides: &HashMap<BucketId, Cents>,
    ) -> Result<DailySummary> {
        let today = DailyEntry {
            date,
            cash_cents: cash_override,
            values_by_bucket: bucket_overrides.clone(),
        };
        self.summarize(today).await
    }

    #[instrument(skip(self, today), fields(date = %today.date))]
    async fn summarize(&self, today: DailyEntry) -> Result<DailySummary> {
        let buckets = self.buckets.list_buckets().await?;
        let flows_today = self.flows.flows_for_date(today.date).await?;

        let previous = match previous_day(today.date) {
            Some(prev) => self.baseline(prev).await?,
            None => None,
        };
        debug!(has_prev = previous.is_some(), "Computing summary");

        Ok(compute_summary(
            &buckets,
            &today,
            previous.as_ref(),
            &flows_today,
        ))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn buckets(ids: &[BucketId]) -> Vec<Bucket> {
        ids.iter()
            .map(|id| Bucket {
                id: *id,
                name: format!("bucket {id}"),
                category: None,
            })
            .collect()
    }

    #[test]
    fn test_net_flow_nets_multiple_flows() {
        let flows = vec![
            flow(1, day(2), Endpoint::Cash, Endpoint::Bucket(1), 300),
            flow(2, day(2), Endpoint::Bucket(1), Endpoint::Bucket(2), 100),
            flow(3, day(2), Endpoint::Bucket(2), Endpoint::Cash, 40),
        ];
        let net = net_flow_by_bucket(&flows);
        assert_eq!(net.get(&1), Some(&200));
        assert_eq!(net.get(&2), Some(&60));
        assert_eq!(net.len(), 2);
    }

    #[test]
    fn test_deposit_is_not_profit() {
        // 1000 -> 1500 with a 300 deposit: 200 of market profit
        let prev = entry(day(1), 0, &[(1, 1_000)]);
        let today = entry(day(2), 0, &[(1, 1_500)]);
        let flows = vec![flow(1, day(2), Endpoint::Cash, Endpoint::Bucket(1), 300)];

        let summary = compute_summary(&buckets(&[1]), &today, Some(&prev), &flows);
        assert_eq!(summary.per_bucket_profit.get(&1), Some(&200));
        assert_eq!(summary.total_profit_today_cents, 200);
    }

    #[test]
    fn test_no_baseline_means_zero_profit() {
        let today = entry(day(2), 700, &[(1, 1_500), (2, 90)]);
        let flows = vec![flow(1, day(2), Endpoint::Cash, Endpoint::Bucket(1), 300)];

        let summary = compute_summary(&buckets(&[1, 2]), &today, None, &flows);
        assert_eq!(summary.total_profit_today_cents, 0);
        assert!(summary.per_bucket_profit.values().all(|p| *p == 0));
        assert_eq!(summary.cash_delta_cents, 0);
        assert_eq!(summary.total_today_cents, 700 + 1_500 + 90);
    }

    #[test]
    fn test_pure_transfer_is_flow_neutral() {
        // 400 moved from bucket 1 to bucket 2 with no market movement
        let prev = entry(day(1), 100, &[(1, 1_000), (2, 500)]);
        let today = entry(day(2), 100, &[(1, 600), (2, 900)]);
        let flows = vec![flow(1, day(2), Endpoint::Bucket(1), Endpoint::Bucket(2), 400)];

        let summary = compute_summary(&buckets(&[1, 2]), &today, Some(&prev), &flows);
        assert_eq!(summary.per_bucket_profit.get(&1), Some(&0));
        assert_eq!(summary.per_bucket_profit.get(&2), Some(&0));
        assert_eq!(summary.total_profit_today_cents, 0);
    }

    #[test]
    fn test_total_profit_is_sum_of_buckets() {
        let prev = entry(day(1), 0, &[(1, 1_000), (2, 2_000), (3, 50)]);
        let today = entry(day(2), 0, &[(1, 1_100), (2, 1_700), (3, 80)]);
        let flows = vec![flow(1, day(2), Endpoint::Cash, Endpoint::Bucket(3), 10)];

        let summary = compute_summary(&buckets(&[1, 2, 3]), &today, Some(&prev), &flows);
        let sum: Cents = summary.per_bucket_profit.values().sum();
        assert_eq!(summary.total_profit_today_cents, sum);
        assert_eq!(sum, 100 - 300 + 20);
    }

    #[test]
    fn test_cash_is_excluded_from_profit() {
        let prev = entry(day(1), 1_000, &[(1, 500)]);
        let today = entry(day(2), 4_000, &[(1, 500)]);

        let summary = compute_summary(&buckets(&[1]), &today, Some(&prev), &[]);
        assert_eq!(summary.cash_delta_cents, 3_000);
        assert_eq!(summary.total_profit_today_cents, 0);
        assert_eq!(summary.cash_today_cents, 4_000);
    }

    #[test]
    fn test_unregistered_buckets_are_ignored() {
        let prev = entry(day(1), 0, &[(1, 100), (9, 100)]);
        let today = entry(day(2), 0, &[(1, 150), (9, 900)]);

        let summary = compute_summary(&buckets(&[1, 2]), &today, Some(&prev), &[]);
        assert_eq!(summary.per_bucket_today.len(), 2);
        assert_eq!(summary.per_bucket_today.get(&2), Some(&0));
        assert_eq!(summary.per_bucket_profit.get(&2), Some(&0));
        assert!(!summary.per_bucket_profit.contains_key(&9));
        assert_eq!(summary.total_today_cents, 150);
        assert_eq!(summary.total_profit_today_cents, 50);
    }

    #[test]
    fn test_previous_day_at_calendar_start() {
        assert_eq!(previous_day(NaiveDate::MIN), None);
        assert_eq!(previous_day(day(2)), Some(day(1)));
    }

    #[tokio::test]
    async fn test_summary_for_scenario() -> Result<()> {
        let (engine, store) = setup_memory_engine();
        let a = store.create_bucket("A").await?;

        store.upsert_bucket(day(1), a, 1_000, None).await?;
        store.upsert_bucket(day(2), a, 1_500, None).await?;
        store
            .create_flow(&new_flow(day(2), Endpoint::Cash, Endpoint::Bucket(a), 300))
            .await?;

        let summary = engine.summary_for(day(2)).await?;
        assert_eq!(summary.per_bucket_profit.get(&a), Some(&200));
        assert_eq!(summary.total_profit_today_cents, 200);
        assert_eq!(summary.total_today_cents, 1_500);
        Ok(())
    }

    #[tokio::test]
    async fn test_fresh_bucket_funded_by_flow() -> Result<()> {
        let (engine, store) = setup_memory_engine();
        let existing = store.create_bucket("Existing").await?;
        store.upsert_bucket(day(4), existing, 2_000, None).await?;
        store.upsert_bucket(day(5), existing, 2_000, None).await?;

        let fresh = store.create_bucket("Fresh").await?;
        store.upsert_bucket(day(5), fresh, 5_000, None).await?;
        store
            .create_flow(&new_flow(day(5), Endpoint::Cash, Endpoint::Bucket(fresh), 5_000))
            .await?;

        let summary = engine.summary_for(day(5)).await?;
        assert_eq!(summary.per_bucket_profit.get(&fresh), Some(&0));
        assert_eq!(summary.total_profit_today_cents, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_without_previous_data_is_zero() -> Result<()> {
        let (engine, store) = setup_memory_engine();
        let a = store.create_bucket("A").await?;
        store.upsert_bucket(day(2), a, 1_500, None).await?;
        store
            .create_flow(&new_flow(day(2), Endpoint::Cash, Endpoint::Bucket(a), 300))
            .await?;

        let summary = engine.summary_for(day(2)).await?;
        assert_eq!(summary.total_profit_today_cents, 0);
        assert_eq!(summary.per_bucket_profit.get(&a), Some(&0));
        Ok(())
    }

    #[tokio::test]
    async fn test_flow_alone_makes_a_baseline() -> Result<()> {
        let (engine, store) = setup_memory_engine();
        let a = store.create_bucket("A").await?;
        // Day 1 only has a flow (zero cash, no snapshots)
        store
            .create_flow(&new_flow(day(1), Endpoint::Bucket(a), Endpoint::Cash, 10))
            .await?;
        store.upsert_bucket(day(2), a, 50, None).await?;

        assert!(engine.has_any_data(day(1)).await?);
        let summary = engine.summary_for(day(2)).await?;
        assert_eq!(summary.per_bucket_profit.get(&a), Some(&50));
        Ok(())
    }

    #[tokio::test]
    async fn test_cash_alone_makes_a_baseline() -> Result<()> {
        let (engine, store) = setup_memory_engine();
        store.upsert_cash(day(1), 500).await?;
        let a = store.create_bucket("A").await?;
        store.upsert_cash(day(2), 700).await?;
        store.upsert_bucket(day(2), a, 800, None).await?;

        assert!(engine.has_any_data(day(1)).await?);
        let summary = engine.summary_for(day(2)).await?;
        assert_eq!(summary.per_bucket_profit.get(&a), Some(&800));
        assert_eq!(summary.total_profit_today_cents, 800);
        assert_eq!(summary.cash_delta_cents, 200);
        Ok(())
    }

    #[tokio::test]
    async fn test_saved_zero_cash_is_not_a_baseline() -> Result<()> {
        let store = Arc::new(setup_test_store().await?);
        let engine = ValuationEngine::from_store(Arc::clone(&store));
        let a = store.create_bucket("A").await?;
        store.upsert_cash(day(1), 0).await?;
        store.save_entry(&entry(day(2), 700, &[(a, 800)])).await?;

        assert!(!engine.has_any_data(day(1)).await?);
        let summary = engine.summary_for(day(2)).await?;
        assert_eq!(summary.per_bucket_profit.get(&a), Some(&0));
        assert_eq!(summary.total_profit_today_cents, 0);
        assert_eq!(summary.cash_delta_cents, 0);
        assert_eq!(summary.total_today_cents, 1_500);
        Ok(())
    }

    #[tokio::test]
    async fn test_preview_has_no_side_effects() -> Result<()> {
        let (engine, store) = setup_memory_engine();
        let a = store.create_bucket("A").await?;
        let b = store.create_bucket("B").await?;
        store.upsert_cash(day(1), 100).await?;
        store.upsert_bucket(day(1), a, 1_000, None).await?;
        store.upsert_bucket(day(1), b, 500, None).await?;

        let overrides = HashMap::from([(a, 1_250)]);
        let preview = engine.preview_summary(day(2), 300, &overrides).await?;

        assert_eq!(preview.per_bucket_profit.get(&a), Some(&250));
        assert_eq!(preview.per_bucket_profit.get(&b), Some(&-500));
        assert_eq!(preview.cash_delta_cents, 200);
        assert_eq!(preview.total_today_cents, 300 + 1_250);

        assert!(!engine.has_any_data(day(2)).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_over_database_store() -> Result<()> {
        let store = Arc::new(setup_test_store().await?);
        let engine = ValuationEngine::from_store(Arc::clone(&store));
        let a = store.create_bucket("A").await?;

        store.save_entry(&entry(day(1), 200, &[(a, 1_000)])).await?;
        store.save_entry(&entry(day(2), 100, &[(a, 1_500)])).await?;
        store
            .create_flow(&new_flow(day(2), Endpoint::Cash, Endpoint::Bucket(a), 300))
            .await?;

        let summary = engine.summary_for(day(2)).await?;
        assert_eq!(summary.per_bucket_profit.get(&a), Some(&200));
        assert_eq!(summary.cash_delta_cents, -100);
        assert_eq!(summary.total_today_cents, 1_600);
        Ok(())
    }
}
