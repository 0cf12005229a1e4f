//! Asset allocation by category, rebalancing suggestions against a target profile
//! and a comparison of portfolio return with a CDI projection.
//!
//! Only categorized buckets take part in the allocation. Percentages are plain
//! `f64` values in the 0-100 range; money stays in integer cents.

use crate::{
    core::valuation::ValuationEngine,
    errors::{Error, Result},
    models::{Bucket, BucketId, Category, Cents},
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const PROFILE_TOLERANCE: f64 = 0.001;

/// Value held in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAllocation {
    /// The asset class
    pub category: Category,
    /// Sum of the category's bucket values
    pub value_cents: Cents,
    /// Share of the categorized total, 0-100
    pub percentage: f64,
}

/// Current split of the categorized buckets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Allocation {
    /// Sum over every categorized bucket
    pub total_cents: Cents,
    /// One row per category holding a bucket, largest value first
    pub categories: Vec<CategoryAllocation>,
}

impl Allocation {
    /// Value held in `category`, zero when absent.
    #[must_use]
    pub fn value_of(&self, category: Category) -> Cents {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map_or(0, |c| c.value_cents)
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent_of(part: Cents, whole: Cents) -> f64 {
    if whole > 0 {
        part as f64 * 100.0 / whole as f64
    } else {
        0.0
    }
}

/// Groups bucket values by category.
///
/// Uncategorized buckets are skipped; missing values count as zero.
#[must_use]
pub fn current_allocation(buckets: &[Bucket], values: &HashMap<BucketId, Cents>) -> Allocation {
    let mut by_category: BTreeMap<Category, Cents> = BTreeMap::new();
    for bucket in buckets {
        let Some(category) = bucket.category else {
            continue;
        };
        let value = values.get(&bucket.id).copied().unwrap_or(0);
        *by_category.entry(category).or_insert(0) += value;
    }

    let total_cents = by_category.values().sum();
    let mut categories: Vec<CategoryAllocation> = by_category
        .into_iter()
        .map(|(category, value_cents)| CategoryAllocation {
            category,
            value_cents,
            percentage: percent_of(value_cents, total_cents),
        })
        .collect();
    categories.sort_by(|a, b| b.value_cents.cmp(&a.value_cents));

    Allocation {
        total_cents,
        categories,
    }
}

/// Allocation of the values recorded on `date`.
pub async fn allocation_for(engine: &ValuationEngine, date: NaiveDate) -> Result<Allocation> {
    let buckets = engine.bucket_store().list_buckets().await?;
    let entry = engine.load_entry(date).await?;
    let allocation = current_allocation(&buckets, &entry.values_by_bucket);
    debug!(
        %date,
        total = allocation.total_cents,
        categories = allocation.categories.len(),
        "Allocation computed"
    );
    Ok(allocation)
}

/// Target weight per category, summing to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetProfile {
    weights: BTreeMap<Category, f64>,
}

impl TargetProfile {
    /// Builds a custom profile.
    ///
    /// # Errors
    /// Returns `Error::Validation` when a weight is negative or the weights do
    /// not add up to 1 (within 0.1%).
    pub fn new(weights: BTreeMap<Category, f64>) -> Result<Self> {
        let bad_weight = weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0);
        if let Some((category, weight)) = bad_weight {
            return Err(Error::Validation {
                message: format!("Weight {weight} for {category} must be a non-negative number"),
            });
        }
        let sum: f64 = weights.values().sum();
        if (sum - 1.0).abs() >= PROFILE_TOLERANCE {
            return Err(Error::Validation {
                message: format!("Target weights add up to {:.1}%, not 100%", sum * 100.0),
            });
        }
        Ok(Self { weights })
    }

    /// The ARCA profile: 40% fixed income, 30% equities, 25% real assets, 5% crypto.
    #[must_use]
    pub fn arca() -> Self {
        Self {
            weights: BTreeMap::from([
                (Category::FixedIncome, 0.40),
                (Category::Equities, 0.30),
                (Category::Other, 0.25),
                (Category::Crypto, 0.05),
            ]),
        }
    }

    /// Target weight of `category`, zero when the profile leaves it out.
    #[must_use]
    pub fn weight(&self, category: Category) -> f64 {
        self.weights.get(&category).copied().unwrap_or(0.0)
    }
}

/// How far one category is from its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    /// The asset class
    pub category: Category,
    /// Value held now
    pub current_cents: Cents,
    /// Value the profile asks for
    pub ideal_cents: Cents,
    /// Positive: invest this much more; negative: reduce by this much
    pub difference_cents: Cents,
}

/// One suggestion per category, largest absolute difference first.
///
/// `total_cents` is the amount the profile is applied to (typically the whole
/// net worth, cash included). Ties keep the category order.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn suggest_rebalance(
    total_cents: Cents,
    allocation: &Allocation,
    profile: &TargetProfile,
) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = Category::ALL
        .into_iter()
        .map(|category| {
            let current_cents = allocation.value_of(category);
            let ideal_cents = (total_cents as f64 * profile.weight(category)).round() as Cents;
            Suggestion {
                category,
                current_cents,
                ideal_cents,
                difference_cents: ideal_cents - current_cents,
            }
        })
        .collect();
    suggestions.sort_by_key(|s| std::cmp::Reverse(s.difference_cents.unsigned_abs()));
    suggestions
}

/// Portfolio return next to what the same initial value would earn at the CDI rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CdiComparison {
    /// Value at the start of the period
    pub initial_cents: Cents,
    /// Value at the end of the period
    pub current_cents: Cents,
    /// `current - initial`
    pub portfolio_profit_cents: Cents,
    /// Portfolio return in percent
    pub portfolio_rate: f64,
    /// Initial value compounded at the CDI rate
    pub cdi_projected_cents: Cents,
    /// `projected - initial`
    pub cdi_profit_cents: Cents,
    /// CDI return over the period in percent
    pub cdi_rate: f64,
    /// Portfolio rate minus CDI rate, in percentage points
    pub difference: f64,
    /// Whether the portfolio beat the CDI
    pub outperforms: bool,
}

/// Compares the portfolio with the CDI over `months` months.
///
/// `cdi_annual_rate` is a fraction (`0.135` for 13.5% a year), compounded monthly.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn compare_with_cdi(
    initial_cents: Cents,
    current_cents: Cents,
    months: u32,
    cdi_annual_rate: f64,
) -> CdiComparison {
    let portfolio_profit_cents = current_cents - initial_cents;
    let portfolio_rate = percent_of(portfolio_profit_cents, initial_cents);

    let multiplier = (1.0 + cdi_annual_rate).powf(f64::from(months) / 12.0);
    let cdi_projected_cents = (initial_cents as f64 * multiplier).round() as Cents;
    let cdi_profit_cents = cdi_projected_cents - initial_cents;
    let cdi_rate = percent_of(cdi_profit_cents, initial_cents);

    let difference = portfolio_rate - cdi_rate;
    CdiComparison {
        initial_cents,
        current_cents,
        portfolio_profit_cents,
        portfolio_rate,
        cdi_projected_cents,
        cdi_profit_cents,
        cdi_rate,
        difference,
        outperforms: difference > 0.0,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::store::{BucketStore, SnapshotStore};
    use crate::test_utils::*;

    fn bucket(id: BucketId, category: Option<Category>) -> Bucket {
        Bucket {
            id,
            name: format!("bucket {id}"),
            category,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_current_allocation_groups_by_category() {
        let buckets = vec![
            bucket(1, Some(Category::FixedIncome)),
            bucket(2, Some(Category::Equities)),
            bucket(3, Some(Category::FixedIncome)),
            bucket(4, None),
        ];
        let values = HashMap::from([(1, 300), (2, 100), (3, 100), (4, 500)]);

        let allocation = current_allocation(&buckets, &values);
        assert_eq!(allocation.total_cents, 500);
        assert_eq!(allocation.categories.len(), 2);
        assert_eq!(allocation.categories[0].category, Category::FixedIncome);
        assert_eq!(allocation.categories[0].value_cents, 400);
        assert!(close(allocation.categories[0].percentage, 80.0));
        assert!(close(allocation.categories[1].percentage, 20.0));
        assert_eq!(allocation.value_of(Category::Crypto), 0);
    }

    #[test]
    fn test_current_allocation_of_nothing() {
        let buckets = vec![bucket(1, Some(Category::Funds))];
        let allocation = current_allocation(&buckets, &HashMap::new());
        assert_eq!(allocation.total_cents, 0);
        assert!(close(allocation.categories[0].percentage, 0.0));
    }

    #[test]
    fn test_target_profile_must_sum_to_one() {
        let custom = BTreeMap::from([(Category::FixedIncome, 0.5), (Category::Equities, 0.5)]);
        let profile = TargetProfile::new(custom).unwrap();
        assert!(close(profile.weight(Category::Equities), 0.5));
        assert!(close(profile.weight(Category::Crypto), 0.0));

        let short = BTreeMap::from([(Category::FixedIncome, 0.5), (Category::Equities, 0.4)]);
        assert!(matches!(
            TargetProfile::new(short),
            Err(Error::Validation { .. })
        ));

        let negative = BTreeMap::from([(Category::FixedIncome, 1.2), (Category::Crypto, -0.2)]);
        assert!(matches!(
            TargetProfile::new(negative),
            Err(Error::Validation { .. })
        ));

        let arca = TargetProfile::arca();
        assert_eq!(TargetProfile::new(arca.weights.clone()).ok(), Some(arca));
    }

    #[test]
    fn test_suggest_rebalance_against_arca() {
        let buckets = vec![
            bucket(1, Some(Category::FixedIncome)),
            bucket(2, Some(Category::Equities)),
        ];
        let values = HashMap::from([(1, 6_000), (2, 4_000)]);
        let allocation = current_allocation(&buckets, &values);

        let suggestions = suggest_rebalance(10_000, &allocation, &TargetProfile::arca());
        let summary: Vec<(Category, Cents, Cents)> = suggestions
            .iter()
            .map(|s| (s.category, s.ideal_cents, s.difference_cents))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Category::Other, 2_500, 2_500),
                (Category::FixedIncome, 4_000, -2_000),
                (Category::Equities, 3_000, -1_000),
                (Category::Crypto, 500, 500),
                (Category::Funds, 0, 0),
                (Category::Pension, 0, 0),
            ]
        );
    }

    #[test]
    fn test_compare_with_cdi() {
        let comparison = compare_with_cdi(100_000, 115_000, 12, 0.10);
        assert_eq!(comparison.portfolio_profit_cents, 15_000);
        assert_eq!(comparison.cdi_projected_cents, 110_000);
        assert_eq!(comparison.cdi_profit_cents, 10_000);
        assert!(close(comparison.portfolio_rate, 15.0));
        assert!((comparison.cdi_rate - 10.0).abs() < 1e-6);
        assert!((comparison.difference - 5.0).abs() < 1e-6);
        assert!(comparison.outperforms);

        let behind = compare_with_cdi(100_000, 100_500, 6, 0.10);
        assert!(behind.cdi_projected_cents > 104_000);
        assert!(!behind.outperforms);
    }

    #[test]
    fn test_compare_with_cdi_from_zero() {
        let comparison = compare_with_cdi(0, 5_000, 12, 0.10);
        assert_eq!(comparison.cdi_projected_cents, 0);
        assert!(close(comparison.portfolio_rate, 0.0));
        assert!(close(comparison.cdi_rate, 0.0));
        assert!(!comparison.outperforms);
    }

    #[tokio::test]
    async fn test_allocation_for_date() -> Result<()> {
        let (engine, store) = setup_memory_engine();
        let bonds = store.create_bucket("Bonds").await?;
        let coins = store.create_bucket("Coins").await?;
        store.create_bucket("Loose").await?;
        store.set_bucket_category(bonds, Some(Category::FixedIncome)).await?;
        store.set_bucket_category(coins, Some(Category::Crypto)).await?;
        store.upsert_bucket(day(3), bonds, 900, None).await?;
        store.upsert_bucket(day(3), coins, 100, None).await?;

        let allocation = allocation_for(&engine, day(3)).await?;
        assert_eq!(allocation.total_cents, 1_000);
        assert_eq!(allocation.value_of(Category::FixedIncome), 900);
        assert!(close(allocation.categories[1].percentage, 10.0));

        assert_eq!(allocation_for(&engine, day(4)).await?.total_cents, 0);
        Ok(())
    }
}
