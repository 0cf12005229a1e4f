//! Bucket registry business logic - Creating, renaming, listing and deleting buckets.
//!
//! The only rule enforced here is that names are non-blank and unique. Deleting a
//! bucket also removes its snapshots and every flow that references it, inside one
//! database transaction.

use crate::{
    entities::{self, bucket, bucket_snapshot},
    errors::{Error, Result},
    models::{Bucket, BucketId, Category},
};
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use tracing::{info, warn};

impl From<bucket::Model> for Bucket {
    fn from(model: bucket::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            // Unknown tags read as uncategorized
            category: model.category.and_then(|c| c.parse().ok()),
        }
    }
}

/// Trims a candidate name and rejects blank ones.
pub fn validate_bucket_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        warn!("Rejected blank bucket name");
        return Err(Error::Validation {
            message: "Bucket name cannot be empty".to_string(),
        });
    }
    Ok(trimmed)
}

fn duplicate_name(name: &str) -> Error {
    Error::Validation {
        message: format!("A bucket named '{name}' already exists"),
    }
}

fn map_unique_violation(err: DbErr, name: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_name(name),
        _ => err.into(),
    }
}

/// Lists every bucket ordered by name.
pub async fn list_buckets<C>(db: &C) -> Result<Vec<Bucket>>
where
    C: ConnectionTrait,
{
    let rows = entities::Bucket::find()
        .order_by_asc(bucket::Column::Name)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(Bucket::from).collect())
}

/// Finds a bucket by id, `None` when it does not exist.
pub async fn get_bucket_by_id<C>(db: &C, bucket_id: BucketId) -> Result<Option<Bucket>>
where
    C: ConnectionTrait,
{
    Ok(entities::Bucket::find_by_id(bucket_id)
        .one(db)
        .await?
        .map(Bucket::from))
}

async fn name_taken<C>(db: &C, name: &str, except: Option<BucketId>) -> Result<bool>
where
    C: ConnectionTrait,
{
    let mut query = entities::Bucket::find().filter(bucket::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(bucket::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

/// Creates a bucket and returns its id.
///
/// # Errors
/// Returns `Error::Validation` when the name is blank or already used.
pub async fn create_bucket<C>(db: &C, name: &str) -> Result<BucketId>
where
    C: ConnectionTrait,
{
    let name = validate_bucket_name(name)?;
    if name_taken(db, name, None).await? {
        return Err(duplicate_name(name));
    }

    let model = bucket::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };
    let inserted = model
        .insert(db)
        .await
        .map_err(|e| map_unique_violation(e, name))?;

    info!("Created bucket {} '{}'", inserted.id, inserted.name);
    Ok(inserted.id)
}

/// Renames a bucket.
///
/// # Errors
/// Returns `Error::Validation` for a blank or duplicate name and `Error::NotFound`
/// for an unknown id.
pub async fn rename_bucket<C>(db: &C, bucket_id: BucketId, new_name: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let name = validate_bucket_name(new_name)?;

    let existing = entities::Bucket::find_by_id(bucket_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "bucket",
            id: bucket_id,
        })?;

    if name_taken(db, name, Some(bucket_id)).await? {
        return Err(duplicate_name(name));
    }

    let mut active: bucket::ActiveModel = existing.into();
    active.name = Set(name.to_string());
    active
        .update(db)
        .await
        .map_err(|e| map_unique_violation(e, name))?;

    info!("Renamed bucket {} to '{}'", bucket_id, name);
    Ok(())
}

/// Sets or clears the asset class of a bucket.
///
/// # Errors
/// Returns `Error::NotFound` for an unknown id.
pub async fn set_bucket_category<C>(
    db: &C,
    bucket_id: BucketId,
    category: Option<Category>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = entities::Bucket::find_by_id(bucket_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "bucket",
            id: bucket_id,
        })?;

    let mut active: bucket::ActiveModel = existing.into();
    active.category = Set(category.map(|c| c.as_str().to_string()));
    active.update(db).await?;

    info!("Bucket {} category set to {:?}", bucket_id, category);
    Ok(())
}

/// Deletes a bucket together with its snapshots and flows.
///
/// # Errors
/// Returns `Error::NotFound` for an unknown id.
pub async fn delete_bucket<C>(db: &C, bucket_id: BucketId) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    get_bucket_by_id(&txn, bucket_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "bucket",
            id: bucket_id,
        })?;

    let snapshots = entities::BucketSnapshot::delete_many()
        .filter(bucket_snapshot::Column::BucketId.eq(bucket_id))
        .exec(&txn)
        .await?
        .rows_affected;
    let flows = crate::core::flow::delete_flows_for_bucket(&txn, bucket_id).await?;
    entities::Bucket::delete_by_id(bucket_id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        "Deleted bucket {} ({} snapshots, {} flows removed)",
        bucket_id, snapshots, flows
    );
    Ok(())
}
