//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod bucket;
pub mod bucket_snapshot;
pub mod cash_snapshot;
pub mod flow;

// Re-export specific types to avoid conflicts
pub use bucket::{Column as BucketColumn, Entity as Bucket, Model as BucketModel};
pub use bucket_snapshot::{
    Column as BucketSnapshotColumn, Entity as BucketSnapshot, Model as BucketSnapshotModel,
};
pub use cash_snapshot::{
    Column as CashSnapshotColumn, Entity as CashSnapshot, Model as CashSnapshotModel,
};
pub use flow::{Column as FlowColumn, Entity as Flow, Model as FlowModel};
