//! Bucket snapshot entity - Absolute value of one bucket at the end of a day.
//!
//! Keyed by `(date, bucket_id)` so re-saving a day overwrites instead of duplicating.
//! Rows are removed together with their bucket.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bucket snapshot database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bucket_snapshots")]
pub struct Model {
    /// Day of the snapshot
    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,
    /// Bucket the value belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub bucket_id: i64,
    /// Absolute bucket total in cents
    pub value_cents: i64,
    /// Optional note typed alongside the value
    pub note: Option<String>,
}

/// Defines relationships between `BucketSnapshot` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each snapshot belongs to one bucket
    #[sea_orm(
        belongs_to = "super::bucket::Entity",
        from = "Column::BucketId",
        to = "super::bucket::Column::Id",
        on_delete = "Cascade"
    )]
    Bucket,
}

impl Related<super::bucket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bucket.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
