use chrono::{Days, Local};
use dotenvy::dotenv;
use networth_tracker::{
    config::{buckets, database},
    core::{allocation, money, report, valuation::ValuationEngine},
    errors::Result,
    store::database::DatabaseStore,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Load bucket, report and allocation configuration
    let config = buckets::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let profile = config
        .target_profile()
        .inspect_err(|e| error!("Invalid target profile: {}", e))?;

    // 4. Open the database and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Seed configured buckets
    let store = Arc::new(DatabaseStore::new(db));
    let created = buckets::seed_buckets(store.as_ref(), &config).await?;
    if created > 0 {
        info!("Seeded {} bucket(s) from configuration", created);
    }

    // 6. Report on today and the configured history window
    let engine = ValuationEngine::from_store(store);
    let today = Local::now().date_naive();
    let bucket_list = engine.bucket_store().list_buckets().await?;

    let summary = engine.summary_for(today).await?;
    info!(
        "{}: net worth {} (profit {}, cash {} / {})",
        today,
        money::format_cents(summary.total_today_cents),
        money::format_signed_cents(summary.total_profit_today_cents),
        money::format_cents(summary.cash_today_cents),
        money::format_signed_cents(summary.cash_delta_cents),
    );
    for bucket in &bucket_list {
        info!(
            "  {}: {} ({})",
            bucket.name,
            money::format_cents(summary.per_bucket_today.get(&bucket.id).copied().unwrap_or(0)),
            money::format_signed_cents(
                summary.per_bucket_profit.get(&bucket.id).copied().unwrap_or(0)
            ),
        );
    }

    let start = today
        .checked_sub_days(Days::new(u64::from(config.report.history_days)))
        .unwrap_or(today);
    let range = report::range_summary(&engine, start, today).await?;
    info!(
        "Profit {} to {}: {}",
        range.start,
        range.end,
        money::format_signed_cents(range.total_profit_cents)
    );
    for bucket in &bucket_list {
        let Some(extremes) = range.extremes_by_bucket.get(&bucket.id) else {
            continue;
        };
        if let (Some(best), Some(worst)) = (&extremes.best, &extremes.worst) {
            info!(
                "  {}: best {} on {}, worst {} on {}",
                bucket.name,
                money::format_signed_cents(best.profit_cents),
                best.date,
                money::format_signed_cents(worst.profit_cents),
                worst.date,
            );
        }
    }

    // 7. Allocation against the target profile
    let current = allocation::allocation_for(&engine, today).await?;
    info!(
        "Allocation of {} categorized",
        money::format_cents(current.total_cents)
    );
    for row in &current.categories {
        info!(
            "  {}: {} ({:.1}%)",
            row.category,
            money::format_cents(row.value_cents),
            row.percentage
        );
    }
    let suggestions = allocation::suggest_rebalance(summary.total_today_cents, &current, &profile);
    for suggestion in suggestions.iter().filter(|s| s.difference_cents != 0) {
        info!(
            "  Rebalance {}: {}",
            suggestion.category,
            money::format_signed_cents(suggestion.difference_cents)
        );
    }

    if let Some(rate) = config.report.cdi_annual_rate {
        let initial = report::series_total_last_n_days(&engine, 0, start)
            .await?
            .first()
            .map_or(0, |p| p.value_cents);
        let months = (config.report.history_days / 30).max(1);
        let cdi = allocation::compare_with_cdi(initial, summary.total_today_cents, months, rate);
        info!(
            "Return over {} month(s): {:.2}% vs CDI {:.2}% ({:+.2} pp)",
            months, cdi.portfolio_rate, cdi.cdi_rate, cdi.difference
        );
    }

    Ok(())
}
