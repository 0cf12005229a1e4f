//! Cash snapshot entity - Free cash at the end of a day, one row per date.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cash snapshot database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_snapshots")]
pub struct Model {
    /// Day of the snapshot
    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,
    /// Absolute cash total in cents
    pub value_cents: i64,
}

/// `CashSnapshot` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
