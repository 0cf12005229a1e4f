//! Domain types shared by the stores, the valuation engine and the reports.
//!
//! All money is carried as integer cents. Per-bucket figures are keyed by
//! [`BucketId`]; any bucket missing from a map counts as zero.

use crate::errors::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};

/// Stable identifier of an investment bucket
pub type BucketId = i64;
/// Identifier of a recorded flow
pub type FlowId = i64;
/// Money in integer cents
pub type Cents = i64;

/// A user-named investment category tracked as a running total per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Stable identifier, never reused
    pub id: BucketId,
    /// Display name, non-empty and unique
    pub name: String,
    /// Asset class used by allocation reports; uncategorized buckets are left out
    pub category: Option<Category>,
}

/// Asset class a bucket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Bonds, deposits, treasury
    FixedIncome,
    /// Stocks and equity ETFs
    Equities,
    /// Managed investment funds
    Funds,
    /// Retirement plans
    Pension,
    /// Cryptocurrencies
    Crypto,
    /// Real assets and everything else
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 6] = [
        Self::FixedIncome,
        Self::Equities,
        Self::Funds,
        Self::Pension,
        Self::Crypto,
        Self::Other,
    ];

    /// The string stored in the `buckets` table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FixedIncome => "FIXED_INCOME",
            Self::Equities => "EQUITIES",
            Self::Funds => "FUNDS",
            Self::Pension => "PENSION",
            Self::Crypto => "CRYPTO",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::Validation {
                message: format!("unknown category '{s}'"),
            })
    }
}

/// Persisted tag of a flow endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowKind {
    /// Free cash
    Cash,
    /// A specific bucket
    Bucket,
}

impl FlowKind {
    /// The string stored in the `flows` table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Bucket => "BUCKET",
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CASH" => Ok(Self::Cash),
            "BUCKET" => Ok(Self::Bucket),
            other => Err(Error::InvalidEndpoint {
                message: format!("unknown endpoint kind '{other}'"),
            }),
        }
    }
}

/// One side of a flow: free cash or a specific bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// Free cash
    Cash,
    /// The bucket with this id
    Bucket(BucketId),
}

impl Endpoint {
    /// Builds an endpoint from its persisted `(kind, bucket id)` pair.
    ///
    /// A `CASH` endpoint must not carry a bucket id and a `BUCKET` endpoint must.
    pub fn from_parts(kind: FlowKind, bucket_id: Option<BucketId>) -> Result<Self> {
        match (kind, bucket_id) {
            (FlowKind::Cash, None) => Ok(Self::Cash),
            (FlowKind::Bucket, Some(id)) => Ok(Self::Bucket(id)),
            (FlowKind::Cash, Some(id)) => Err(Error::InvalidEndpoint {
                message: format!("a CASH endpoint cannot reference bucket {id}"),
            }),
            (FlowKind::Bucket, None) => Err(Error::InvalidEndpoint {
                message: "a BUCKET endpoint needs a bucket id".to_string(),
            }),
        }
    }

    /// The persisted kind tag.
    #[must_use]
    pub const fn kind(self) -> FlowKind {
        match self {
            Self::Cash => FlowKind::Cash,
            Self::Bucket(_) => FlowKind::Bucket,
        }
    }

    /// The referenced bucket, `None` for cash.
    #[must_use]
    pub const fn bucket_id(self) -> Option<BucketId> {
        match self {
            Self::Cash => None,
            Self::Bucket(id) => Some(id),
        }
    }
}

/// A movement of money that has not been recorded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFlow {
    /// Day the movement happened
    pub date: NaiveDate,
    /// Where the money came from
    pub from: Endpoint,
    /// Where the money went
    pub to: Endpoint,
    /// Moved amount, strictly positive
    pub amount_cents: Cents,
    /// Optional free-form note
    pub note: Option<String>,
}

/// A recorded movement between cash and buckets. Never counts as profit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    /// Ledger identifier
    pub id: FlowId,
    /// Day the movement happened
    pub date: NaiveDate,
    /// Where the money came from
    pub from: Endpoint,
    /// Where the money went
    pub to: Endpoint,
    /// Moved amount, strictly positive
    pub amount_cents: Cents,
    /// Optional free-form note
    pub note: Option<String>,
}

impl Flow {
    /// Attaches a ledger id to a validated candidate.
    #[must_use]
    pub fn from_new(id: FlowId, new_flow: NewFlow) -> Self {
        Self {
            id,
            date: new_flow.date,
            from: new_flow.from,
            to: new_flow.to,
            amount_cents: new_flow.amount_cents,
            note: new_flow.note,
        }
    }
}

/// End-of-day absolute totals for cash and every bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// The day these totals belong to
    pub date: NaiveDate,
    /// Free cash at the end of the day
    pub cash_cents: Cents,
    /// Bucket totals at the end of the day; absent buckets are zero
    pub values_by_bucket: HashMap<BucketId, Cents>,
}

impl DailyEntry {
    /// An all-zero entry for `date`.
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            cash_cents: 0,
            values_by_bucket: HashMap::new(),
        }
    }

    /// Value of a bucket on this day, zero when not recorded.
    #[must_use]
    pub fn value_of(&self, bucket_id: BucketId) -> Cents {
        self.values_by_bucket.get(&bucket_id).copied().unwrap_or(0)
    }
}

/// Derived view of one day. Recomputed on every query and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    /// The summarised day
    pub date: NaiveDate,
    /// Cash plus every bucket value
    pub total_today_cents: Cents,
    /// Sum of the per-bucket market profit (cash excluded)
    pub total_profit_today_cents: Cents,
    /// Free cash on the day
    pub cash_today_cents: Cents,
    /// Informational day-over-day cash change
    pub cash_delta_cents: Cents,
    /// Value of every registry bucket
    pub per_bucket_today: HashMap<BucketId, Cents>,
    /// Market profit of every registry bucket
    pub per_bucket_profit: HashMap<BucketId, Cents>,
}

/// One point of a date series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Day of the point
    pub date: NaiveDate,
    /// Value in cents
    pub value_cents: Cents,
}

/// Profit of a bucket on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayProfit {
    /// The day
    pub date: NaiveDate,
    /// Market profit on that day
    pub profit_cents: Cents,
}

/// Best and worst day of a bucket within a range. `None` when no day qualified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayExtremes {
    /// Day with the largest profit
    pub best: Option<DayProfit>,
    /// Day with the smallest profit
    pub worst: Option<DayProfit>,
}

/// Profit accumulated over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSummary {
    /// First day of the range
    pub start: NaiveDate,
    /// Last day of the range
    pub end: NaiveDate,
    /// Sum of the daily total profit over days with data
    pub total_profit_cents: Cents,
    /// Accumulated profit of every registry bucket
    pub profit_by_bucket: HashMap<BucketId, Cents>,
    /// Best/worst day of every registry bucket
    pub extremes_by_bucket: HashMap<BucketId, DayExtremes>,
}

/// One row of a month agenda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaDay {
    /// Calendar day
    pub date: NaiveDate,
    /// Whether anything was recorded on the day
    pub has_data: bool,
    /// Total net worth, zero without data
    pub total_cents: Cents,
    /// Total market profit, zero without data
    pub profit_cents: Cents,
}
