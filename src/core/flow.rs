//! Flow ledger business logic - Records movements that must not count as profit.
//!
//! A flow moves money between free cash and a bucket, or between two buckets.
//! Every candidate is validated with [`validate_flow`] before anything is written,
//! so a rejected flow never leaves a partial row behind. Rows are returned in
//! insertion order.

use crate::{
    entities::{self, flow},
    errors::{Error, Result},
    models::{BucketId, Endpoint, Flow, FlowId, NewFlow},
};
use chrono::NaiveDate;
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use tracing::{debug, info, warn};

/// Checks a candidate flow against the ledger rules.
///
/// * the amount must be strictly positive (`InvalidAmount`)
/// * cash cannot move to cash (`InvalidEndpoint`)
/// * a bucket cannot transfer into itself (`SelfTransfer`)
///
/// Kind/bucket-id mismatches are caught earlier by [`Endpoint::from_parts`].
pub fn validate_flow(candidate: &NewFlow) -> Result<()> {
    if candidate.amount_cents <= 0 {
        warn!("Rejected flow with amount {}", candidate.amount_cents);
        return Err(Error::InvalidAmount {
            amount: candidate.amount_cents,
        });
    }

    match (candidate.from, candidate.to) {
        (Endpoint::Cash, Endpoint::Cash) => {
            warn!("Rejected cash-to-cash flow");
            Err(Error::InvalidEndpoint {
                message: "a flow from cash to cash carries no information".to_string(),
            })
        }
        (Endpoint::Bucket(from), Endpoint::Bucket(to)) if from == to => {
            warn!("Rejected self-transfer on bucket {}", from);
            Err(Error::SelfTransfer { bucket_id: from })
        }
        _ => Ok(()),
    }
}

/// Trims a note and drops it when blank.
#[must_use]
pub fn normalize_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(ToString::to_string)
}

impl TryFrom<flow::Model> for Flow {
    type Error = Error;

    fn try_from(model: flow::Model) -> Result<Self> {
        let from = Endpoint::from_parts(model.from_kind.parse()?, model.from_bucket_id)?;
        let to = Endpoint::from_parts(model.to_kind.parse()?, model.to_bucket_id)?;
        Ok(Self {
            id: model.id,
            date: model.date,
            from,
            to,
            amount_cents: model.amount_cents,
            note: model.note,
        })
    }
}

/// Validates and records a flow, returning its ledger id.
pub async fn create_flow<C>(db: &C, candidate: &NewFlow) -> Result<FlowId>
where
    C: ConnectionTrait,
{
    validate_flow(candidate)?;

    let model = flow::ActiveModel {
        date: Set(candidate.date),
        from_kind: Set(candidate.from.kind().as_str().to_string()),
        from_bucket_id: Set(candidate.from.bucket_id()),
        to_kind: Set(candidate.to.kind().as_str().to_string()),
        to_bucket_id: Set(candidate.to.bucket_id()),
        amount_cents: Set(candidate.amount_cents),
        note: Set(normalize_note(candidate.note.as_deref())),
        ..Default::default()
    };

    let inserted = model.insert(db).await?;
    info!(
        "Recorded flow {} on {}: {:?} -> {:?}, {} cents",
        inserted.id, candidate.date, candidate.from, candidate.to, candidate.amount_cents
    );
    Ok(inserted.id)
}

/// Lists the flows recorded on `date` in insertion order.
pub async fn flows_for_date<C>(db: &C, date: NaiveDate) -> Result<Vec<Flow>>
where
    C: ConnectionTrait,
{
    let rows = entities::Flow::find()
        .filter(flow::Column::Date.eq(date))
        .order_by_asc(flow::Column::Id)
        .all(db)
        .await?;
    debug!("Loaded {} flows for {}", rows.len(), date);
    rows.into_iter().map(Flow::try_from).collect()
}

/// Deletes a flow by id.
///
/// # Errors
/// Returns `Error::NotFound` when no flow has this id.
pub async fn delete_flow<C>(db: &C, flow_id: FlowId) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = entities::Flow::delete_by_id(flow_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "flow",
            id: flow_id,
        });
    }
    info!("Deleted flow {}", flow_id);
    Ok(())
}

/// Removes every flow touching a bucket on either side. Used by bucket deletion.
pub async fn delete_flows_for_bucket<C>(db: &C, bucket_id: BucketId) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = entities::Flow::delete_many()
        .filter(
            Condition::any()
                .add(flow::Column::FromBucketId.eq(bucket_id))
                .add(flow::Column::ToBucketId.eq(bucket_id)),
        )
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_validate_flow_rejects_non_positive_amounts() {
        for amount in [0, -1, -500] {
            let candidate = new_flow(day(1), Endpoint::Cash, Endpoint::Bucket(1), amount);
            assert!(matches!(
                validate_flow(&candidate),
                Err(Error::InvalidAmount { amount: a }) if a == amount
            ));
        }
    }

    #[test]
    fn test_validate_flow_rejects_self_transfer() {
        let candidate = new_flow(day(1), Endpoint::Bucket(3), Endpoint::Bucket(3), 100);
        assert!(matches!(
            validate_flow(&candidate),
            Err(Error::SelfTransfer { bucket_id: 3 })
        ));
    }

    #[test]
    fn test_validate_flow_rejects_cash_to_cash() {
        let candidate = new_flow(day(1), Endpoint::Cash, Endpoint::Cash, 100);
        assert!(matches!(
            validate_flow(&candidate),
            Err(Error::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_validate_flow_accepts_transfers() {
        let cases = [
            (Endpoint::Cash, Endpoint::Bucket(1)),
            (Endpoint::Bucket(1), Endpoint::Cash),
            (Endpoint::Bucket(1), Endpoint::Bucket(2)),
        ];
        for (from, to) in cases {
            assert!(validate_flow(&new_flow(day(1), from, to, 1)).is_ok());
        }
    }

    #[test]
    fn test_normalize_note() {
        assert_eq!(normalize_note(None), None);
        assert_eq!(normalize_note(Some("   ")), None);
        assert_eq!(normalize_note(Some(" monthly deposit ")), Some("monthly deposit".to_string()));
    }

    #[test]
    fn test_model_with_mismatched_endpoint_is_rejected() {
        let model = flow::Model {
            id: 1,
            date: day(1),
            from_kind: "CASH".to_string(),
            from_bucket_id: Some(2),
            to_kind: "BUCKET".to_string(),
            to_bucket_id: Some(3),
            amount_cents: 100,
            note: None,
        };
        assert!(matches!(
            Flow::try_from(model),
            Err(Error::InvalidEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_flow_validation_happens_before_any_query() -> Result<()> {
        // No query results configured: any database access would fail the test
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let self_transfer = new_flow(day(2), Endpoint::Bucket(3), Endpoint::Bucket(3), 100);
        let result = create_flow(&db, &self_transfer).await;
        assert!(matches!(result, Err(Error::SelfTransfer { bucket_id: 3 })));

        let zero = new_flow(day(2), Endpoint::Cash, Endpoint::Bucket(3), 0);
        let result = create_flow(&db, &zero).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 0 })));

        assert!(db.into_transaction_log().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_flows_for_date_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let stocks = crate::core::bucket::create_bucket(&db, "Stocks").await?;
        let bonds = crate::core::bucket::create_bucket(&db, "Bonds").await?;

        let mut deposit = new_flow(day(2), Endpoint::Cash, Endpoint::Bucket(stocks), 300);
        deposit.note = Some("  salary  ".to_string());
        let first = create_flow(&db, &deposit).await?;
        let second = create_flow(
            &db,
            &new_flow(day(2), Endpoint::Bucket(stocks), Endpoint::Bucket(bonds), 50),
        )
        .await?;
        create_flow(&db, &new_flow(day(3), Endpoint::Bucket(bonds), Endpoint::Cash, 10)).await?;

        let flows = flows_for_date(&db, day(2)).await?;
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].id, first);
        assert_eq!(flows[0].from, Endpoint::Cash);
        assert_eq!(flows[0].to, Endpoint::Bucket(stocks));
        assert_eq!(flows[0].note, Some("salary".to_string()));
        assert_eq!(flows[1].id, second);
        assert_eq!(flows[1].to, Endpoint::Bucket(bonds));

        assert!(flows_for_date(&db, day(4)).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_flow_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let stocks = crate::core::bucket::create_bucket(&db, "Stocks").await?;
        let deposit = new_flow(day(1), Endpoint::Cash, Endpoint::Bucket(stocks), 10);
        let id = create_flow(&db, &deposit).await?;

        delete_flow(&db, id).await?;
        assert!(flows_for_date(&db, day(1)).await?.is_empty());

        let again = delete_flow(&db, id).await;
        assert!(matches!(again, Err(Error::NotFound { entity: "flow", .. })));
        Ok(())
    }
}
