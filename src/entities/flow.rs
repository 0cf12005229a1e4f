//! Flow entity - A movement of money between cash and buckets.
//!
//! Endpoints are stored as a `(kind, bucket id)` pair per side: `from_kind` /
//! `to_kind` hold `"CASH"` or `"BUCKET"`, and the matching bucket id column is
//! NULL exactly when the kind is `"CASH"`. Flows are never counted as profit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Flow database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flows")]
pub struct Model {
    /// Unique identifier, also the insertion order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Day the movement happened
    #[sea_orm(indexed)]
    pub date: Date,
    /// Source kind: `"CASH"` or `"BUCKET"`
    pub from_kind: String,
    /// Source bucket when `from_kind` is `"BUCKET"`
    pub from_bucket_id: Option<i64>,
    /// Destination kind: `"CASH"` or `"BUCKET"`
    pub to_kind: String,
    /// Destination bucket when `to_kind` is `"BUCKET"`
    pub to_bucket_id: Option<i64>,
    /// Moved amount in cents, always positive
    pub amount_cents: i64,
    /// Optional free-form note
    pub note: Option<String>,
}

/// Flows are cleaned up explicitly when a bucket is deleted
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
