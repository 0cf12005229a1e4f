//! Bucket entity - A user-named investment category.
//!
//! Each bucket has a stable integer id and a unique display name. Daily values
//! live in `bucket_snapshots`; movements referencing a bucket live in `flows`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bucket database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "buckets")]
pub struct Model {
    /// Unique identifier for the bucket
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable name (e.g., "Index funds", "Savings account")
    #[sea_orm(unique)]
    pub name: String,
    /// Asset class tag (e.g., `"FIXED_INCOME"`), NULL when uncategorized
    pub category: Option<String>,
}

/// Defines relationships between Bucket and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One bucket has many daily snapshots
    #[sea_orm(has_many = "super::bucket_snapshot::Entity")]
    Snapshots,
}

impl Related<super::bucket_snapshot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Snapshots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
