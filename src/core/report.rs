//! Aggregations built on top of the valuation engine.
//!
//! This module provides history series, multi-day profit summaries with best/worst
//! days, a month agenda, and the two entry prefills (copy yesterday, suggest today).
//! All functions are stateless: calling them twice re-reads the stores and returns
//! the same data.

use crate::{
    core::valuation::{ValuationEngine, net_flow_by_bucket, previous_day},
    errors::{Error, Result},
    models::{
        AgendaDay, BucketId, Cents, DailyEntry, DayExtremes, DayProfit, Endpoint, RangeSummary,
        SeriesPoint,
    },
};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::HashMap;
use tracing::{debug, instrument};

fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Every recorded value of a bucket, ascending by date.
///
/// Unknown buckets yield an empty series.
pub async fn series_for_bucket(
    engine: &ValuationEngine,
    bucket_id: BucketId,
) -> Result<Vec<SeriesPoint>> {
    let raw = engine.snapshot_store().series_for_bucket(bucket_id).await?;
    let mut points: Vec<SeriesPoint> = raw
        .into_iter()
        .map(|(date, value_cents)| SeriesPoint { date, value_cents })
        .collect();
    points.sort_by_key(|p| p.date);
    Ok(points)
}

/// Total net worth (cash plus every registered bucket) for each day of
/// `[today - days_back, today]`.
pub async fn series_total_last_n_days(
    engine: &ValuationEngine,
    days_back: u32,
    today: NaiveDate,
) -> Result<Vec<SeriesPoint>> {
    let start = today
        .checked_sub_days(Days::new(u64::from(days_back)))
        .unwrap_or(NaiveDate::MIN);
    let buckets = engine.bucket_store().list_buckets().await?;

    let mut points = Vec::new();
    for date in days_between(start, today) {
        let entry = engine.load_entry(date).await?;
        let total = entry.cash_cents
            + buckets
                .iter()
                .map(|b| entry.value_of(b.id))
                .sum::<Cents>();
        points.push(SeriesPoint {
            date,
            value_cents: total,
        });
    }
    Ok(points)
}

/// Accumulates daily market profit over the inclusive range `[start, end]`.
///
/// Days without any recorded data are skipped. For each registered bucket the
/// first day with the largest profit is its best day and the first day with the
/// smallest profit its worst day; both stay `None` when no day qualified.
#[instrument(skip(engine))]
pub async fn range_summary(
    engine: &ValuationEngine,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RangeSummary> {
    let buckets = engine.bucket_store().list_buckets().await?;

    let mut total_profit = 0;
    let mut profit_by_bucket: HashMap<BucketId, Cents> =
        buckets.iter().map(|b| (b.id, 0)).collect();
    let mut extremes_by_bucket: HashMap<BucketId, DayExtremes> =
        buckets.iter().map(|b| (b.id, DayExtremes::default())).collect();

    let mut days_with_data = 0;
    for date in days_between(start, end) {
        if !engine.has_any_data(date).await? {
            continue;
        }
        days_with_data += 1;

        let summary = engine.summary_for(date).await?;
        total_profit += summary.total_profit_today_cents;

        for bucket in &buckets {
            let profit = summary
                .per_bucket_profit
                .get(&bucket.id)
                .copied()
                .unwrap_or(0);
            *profit_by_bucket.entry(bucket.id).or_insert(0) += profit;

            let day = DayProfit {
                date,
                profit_cents: profit,
            };
            let extremes = extremes_by_bucket.entry(bucket.id).or_default();
            if extremes.best.is_none_or(|best| profit > best.profit_cents) {
                extremes.best = Some(day);
            }
            if extremes.worst.is_none_or(|worst| profit < worst.profit_cents) {
                extremes.worst = Some(day);
            }
        }
    }

    debug!(days_with_data, total_profit, "Range summary computed");
    Ok(RangeSummary {
        start,
        end,
        total_profit_cents: total_profit,
        profit_by_bucket,
        extremes_by_bucket,
    })
}

/// Prefill for `date`: yesterday's values moved by today's flows, assuming no
/// market movement.
///
/// Cash loses what left to buckets and gains what came back; each bucket moves
/// by its net flow. Values are clamped at zero and only existing buckets appear.
pub async fn suggest_today(engine: &ValuationEngine, date: NaiveDate) -> Result<DailyEntry> {
    let buckets = engine.bucket_store().list_buckets().await?;
    let yesterday = match previous_day(date) {
        Some(prev) => engine.load_entry(prev).await?,
        None => DailyEntry::empty(date),
    };
    let flows = engine.flow_store().flows_for_date(date).await?;

    let mut cash = yesterday.cash_cents;
    for flow in &flows {
        if flow.from == Endpoint::Cash {
            cash -= flow.amount_cents;
        }
        if flow.to == Endpoint::Cash {
            cash += flow.amount_cents;
        }
    }

    let net = net_flow_by_bucket(&flows);
    let values_by_bucket = buckets
        .iter()
        .map(|b| {
            let moved = net.get(&b.id).copied().unwrap_or(0);
            (b.id, (yesterday.value_of(b.id) + moved).max(0))
        })
        .collect();

    Ok(DailyEntry {
        date,
        cash_cents: cash.max(0),
        values_by_bucket,
    })
}

/// Prefill for `date`: yesterday's values unchanged, limited to existing buckets.
pub async fn copy_previous_entry(engine: &ValuationEngine, date: NaiveDate) -> Result<DailyEntry> {
    let Some(prev) = previous_day(date) else {
        return Ok(DailyEntry::empty(date));
    };
    let buckets = engine.bucket_store().list_buckets().await?;
    let yesterday = engine.load_entry(prev).await?;

    Ok(DailyEntry {
        date,
        cash_cents: yesterday.cash_cents,
        values_by_bucket: buckets
            .iter()
            .map(|b| (b.id, yesterday.value_of(b.id)))
            .collect(),
    })
}

/// One row per calendar day of the month with its total and market profit.
///
/// # Errors
/// Returns `Error::Validation` for an impossible year/month.
pub async fn month_agenda(
    engine: &ValuationEngine,
    year: i32,
    month: u32,
) -> Result<Vec<AgendaDay>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| Error::Validation {
        message: format!("Invalid month {year}-{month:02}"),
    })?;

    let mut days = Vec::with_capacity(31);
    for date in first.iter_days().take_while(|d| d.month() == month) {
        let has_data = engine.has_any_data(date).await?;
        let (total_cents, profit_cents) = if has_data {
            let summary = engine.summary_for(date).await?;
            (summary.total_today_cents, summary.total_profit_today_cents)
        } else {
            (0, 0)
        };
        days.push(AgendaDay {
            date,
            has_data,
            total_cents,
            profit_cents,
        });
    }
    Ok(days)
}
