//! Per-segment dispatch outcomes.

use serde::{Deserialize, Serialize};

/// What the dispatcher did with one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentDisposition {
    /// Engine invoked and the invocation was accepted.
    Enhanced,
    /// Enhanced counterpart already staged; engine not invoked.
    Skipped,
    /// Engine invocation failed; the cause is recorded.
    Failed(String),
}

/// Dispatch outcome for a single segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOutcome {
    pub index: u64,
    pub file_name: String,
    pub disposition: SegmentDisposition,
}

/// Collected results of dispatching one job's segments.
///
/// The dispatcher never aborts a batch on a single failure; it records
/// every outcome and leaves the go/no-go decision to the coordinator.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    outcomes: Vec<SegmentOutcome>,
}

impl DispatchReport {
    pub fn record(&mut self, index: u64, file_name: impl Into<String>, disposition: SegmentDisposition) {
        self.outcomes.push(SegmentOutcome {
            index,
            file_name: file_name.into(),
            disposition,
        });
    }

    pub fn outcomes(&self) -> &[SegmentOutcome] {
        &self.outcomes
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn enhanced(&self) -> usize {
        self.count(|d| matches!(d, SegmentDisposition::Enhanced))
    }

    pub fn skipped(&self) -> usize {
        self.count(|d| matches!(d, SegmentDisposition::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|d| matches!(d, SegmentDisposition::Failed(_)))
    }

    /// True when no segment failed to dispatch.
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    /// Outcomes that recorded a failure.
    pub fn failures(&self) -> impl Iterator<Item = &SegmentOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.disposition, SegmentDisposition::Failed(_)))
    }

    /// Collapse to the counts carried on the job record.
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            total: self.total(),
            enhanced: self.enhanced(),
            skipped: self.skipped(),
            failed: self.failed(),
        }
    }

    fn count(&self, pred: impl Fn(&SegmentDisposition) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.disposition)).count()
    }
}

/// Dispatch counts carried on a job record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub total: usize,
    pub enhanced: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DispatchSummary {
    /// Fold counts from another leg of the same job into this one.
    pub fn merged(self, other: DispatchSummary) -> DispatchSummary {
        DispatchSummary {
            total: self.total + other.total,
            enhanced: self.enhanced + other.enhanced,
            skipped: self.skipped + other.skipped,
            failed: self.failed + other.failed,
        }
    }
}
