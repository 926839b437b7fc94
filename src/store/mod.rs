//! Alert persistence: store, query filtering, daily rollups, retention

pub mod alerts;
pub mod query;
pub mod retention;
pub mod summary;

pub use alerts::{AlertStats, AlertStore, ServiceEvent, StoreConfig, StoreError, TrendPoint};
pub use query::{AlertQuery, QueryPage, SortField, SortOrder};
pub use retention::{run_retention_sweep, RetentionWorker};
pub use summary::{AlertSummary, SummaryAggregator, SummaryKey};
