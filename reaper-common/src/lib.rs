//! Common types and the retention engine shared by the index-reaper tools

pub mod catalog;
pub mod engine;
pub mod error;
pub mod policy;

pub use catalog::{parse_cat_indices, ElasticClient, ElasticConfig, IndexCatalog};
pub use engine::{IndexOutcome, IndexReport, RetentionEngine, RunReport, RunSummary};
pub use error::{ReaperError, Result};
pub use policy::{
    classify, compute_threshold, Classification, IndexPattern, MalformedReason, RetentionWindow, ThresholdDate,
    DEFAULT_INDEX_PREFIX, DEFAULT_RETENTION_DAYS, MIN_RETENTION_DAYS,
};
