/// Bucket seeding and reporting settings from config.toml
pub mod buckets;

/// Database connection and schema creation
pub mod database;
