//! Core business logic - framework-agnostic registry, snapshot, ledger, valuation
//! and reporting operations.

/// Category allocation, rebalancing suggestions and CDI comparison
pub mod allocation;
/// Bucket registry operations
pub mod bucket;
/// Flow ledger validation and persistence
pub mod flow;
/// Money text formatting and parsing
pub mod money;
/// History series, range summaries, agenda and entry prefills
pub mod report;
/// Cash and bucket snapshot persistence
pub mod snapshot;
/// Daily profit reconciliation engine
pub mod valuation;
