//! Retention engine: lists indices, classifies them against a single
//! threshold, and deletes the expired ones.
//!
//! Only the listing call is fatal. Each index is classified and applied on
//! its own, so a malformed name or a failed delete is recorded for that index
//! and the batch moves on.

use crate::catalog::IndexCatalog;
use crate::error::{ReaperError, Result};
use crate::policy::{
    classify, compute_threshold, Classification, IndexPattern, MalformedReason, RetentionWindow,
    ThresholdDate,
};
use chrono::NaiveDate;
use serde::Serialize;

/// What happened to one index during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexOutcome {
    Deleted,
    DeleteFailed { error: String },
    Kept,
    Skipped { reason: MalformedReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub index: String,
    #[serde(flatten)]
    pub outcome: IndexOutcome,
}

/// Counts per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub deleted: usize,
    pub failed: usize,
    pub kept: usize,
    pub skipped: usize,
}

/// Result of a full retention pass
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub threshold: ThresholdDate,
    pub prefix: String,
    pub indices: Vec<IndexReport>,
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total: self.indices.len(),
            ..Default::default()
        };

        for report in &self.indices {
            match report.outcome {
                IndexOutcome::Deleted => summary.deleted += 1,
                IndexOutcome::DeleteFailed { .. } => summary.failed += 1,
                IndexOutcome::Kept => summary.kept += 1,
                IndexOutcome::Skipped { .. } => summary.skipped += 1,
            }
        }

        summary
    }

    pub fn has_failures(&self) -> bool {
        self.indices
            .iter()
            .any(|r| matches!(r.outcome, IndexOutcome::DeleteFailed { .. }))
    }
}

pub struct RetentionEngine<C> {
    catalog: C,
    pattern: IndexPattern,
}

impl<C: IndexCatalog> RetentionEngine<C> {
    pub fn new(catalog: C, pattern: IndexPattern) -> Self {
        Self { catalog, pattern }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Run a retention pass without observing individual outcomes
    pub async fn run(&self, window: RetentionWindow, today: NaiveDate) -> Result<RunReport> {
        self.run_with(window, today, |_, _| {}).await
    }

    /// Run a retention pass, calling `on_outcome` as each index is handled
    pub async fn run_with<F>(
        &self,
        window: RetentionWindow,
        today: NaiveDate,
        mut on_outcome: F,
    ) -> Result<RunReport>
    where
        F: FnMut(&ThresholdDate, &IndexReport),
    {
        // Computed once; every index is judged against the same cutoff
        let threshold = compute_threshold(window, today);
        tracing::info!(
            threshold = %threshold,
            retention_days = window.days(),
            prefix = self.pattern.prefix(),
            "starting retention pass"
        );

        let candidates: Vec<String> = self
            .catalog
            .list_indices()
            .await
            .map_err(|e| ReaperError::Retrieval(Box::new(e)))?
            .into_iter()
            .filter(|name| self.pattern.has_prefix(name))
            .collect();

        let mut report = RunReport {
            threshold: threshold.clone(),
            prefix: self.pattern.prefix().to_string(),
            indices: Vec::with_capacity(candidates.len()),
        };

        for index in candidates {
            let classification = classify(&index, &threshold, &self.pattern);
            tracing::debug!(index = %index, ?classification, "classified index");

            let outcome = self.apply(&index, classification).await;
            let entry = IndexReport { index, outcome };
            on_outcome(&threshold, &entry);
            report.indices.push(entry);
        }

        let summary = report.summary();
        tracing::info!(
            total = summary.total,
            deleted = summary.deleted,
            failed = summary.failed,
            kept = summary.kept,
            skipped = summary.skipped,
            "retention pass finished"
        );

        Ok(report)
    }

    /// Act on a classification; only `Delete` touches the cluster
    pub async fn apply(&self, index: &str, classification: Classification) -> IndexOutcome {
        match classification {
            Classification::Delete => match self.catalog.delete_index(index).await {
                Ok(()) => {
                    tracing::info!(index, "deleted index");
                    IndexOutcome::Deleted
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "failed to delete index");
                    IndexOutcome::DeleteFailed {
                        error: e.to_string(),
                    }
                }
            },
            Classification::Keep => IndexOutcome::Kept,
            Classification::SkipMalformed(reason) => {
                tracing::warn!(index, %reason, "skipping malformed index name");
                IndexOutcome::Skipped { reason }
            }
        }
    }
}
