//! Priority distribution analysis
//!
//! Checks from the outside that the priority label does not bias processing
//! order. Successful outcomes are ordered by the time they were first observed
//! processed, then each priority's positions in that order are summarized.
//! A priority that is handled round-robin with the others spreads across
//! the whole sequence; one that is favoured or starved clusters at one end.
//!
//! The verdict is a heuristic tolerant of network jitter. It is reported
//! alongside the raw positions and never used as a gate.

use crate::request::Priority;
use crate::workflow::WorkflowOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default fraction of the successful count a priority's spread must reach
pub const DEFAULT_MIN_SPREAD_FRACTION: f64 = 0.5;

/// Priorities with at most this many occurrences are not judged
const SMALL_SAMPLE: usize = 2;

/// Fairness judgement for one priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadVerdict {
    /// Spread reaches the required fraction of the sequence
    WellDistributed,
    /// Spread falls short; the priority may be clustered
    PossiblyClustered,
    /// Too few occurrences to judge (passes)
    SmallSample,
}

impl SpreadVerdict {
    /// Whether the verdict counts as a pass
    pub fn passes(self) -> bool {
        !matches!(self, SpreadVerdict::PossiblyClustered)
    }
}

/// Positions of one priority within the processing order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityPlacement {
    /// Priority
    pub priority: Priority,
    /// Zero-based positions, ascending
    pub positions: Vec<usize>,
    /// Number of occurrences
    pub count: usize,
    /// Mean position
    pub average_position: f64,
    /// Last position minus first position
    pub spread: usize,
    /// Fairness judgement
    pub verdict: SpreadVerdict,
}

/// Result of the distribution analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionReport {
    /// Successful outcomes considered
    pub total: usize,
    /// Spread each sufficiently frequent priority must reach
    pub required_spread: f64,
    /// Priorities in processing order
    pub order: Vec<Priority>,
    /// Per-priority placement, ascending by priority
    pub placements: Vec<PriorityPlacement>,
}

impl DistributionReport {
    /// Whether every priority passed
    pub fn is_interleaved(&self) -> bool {
        self.placements.iter().all(|p| p.verdict.passes())
    }

    /// Placement of one priority
    pub fn placement(&self, priority: Priority) -> Option<&PriorityPlacement> {
        self.placements.iter().find(|p| p.priority == priority)
    }
}

/// Builds a [`DistributionReport`] from outcomes
#[derive(Debug, Clone, Copy)]
pub struct DistributionAnalyzer {
    min_spread_fraction: f64,
}

impl Default for DistributionAnalyzer {
    fn default() -> Self {
        Self {
            min_spread_fraction: DEFAULT_MIN_SPREAD_FRACTION,
        }
    }
}

impl DistributionAnalyzer {
    /// Analyzer with the default spread fraction
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the spread fraction
    pub fn with_min_spread_fraction(mut self, fraction: f64) -> Self {
        self.min_spread_fraction = fraction;
        self
    }

    /// Analyze outcomes in any order; failures and outcomes never processed are skipped
    pub fn analyze(&self, outcomes: &[WorkflowOutcome]) -> DistributionReport {
        let mut processed: Vec<(&WorkflowOutcome, chrono::DateTime<chrono::Utc>)> = outcomes
            .iter()
            .filter(|o| o.is_success())
            .filter_map(|o| o.processed_at.map(|at| (o, at)))
            .collect();
        // Stable: ties keep their join order
        processed.sort_by_key(|(_, at)| *at);

        let order: Vec<Priority> = processed.iter().map(|(o, _)| o.priority).collect();
        self.analyze_order(&order)
    }

    /// Analyze a sequence of priorities already in processing order
    pub fn analyze_order(&self, order: &[Priority]) -> DistributionReport {
        let total = order.len();
        let required_spread = self.min_spread_fraction * total as f64;

        let mut positions: BTreeMap<Priority, Vec<usize>> = BTreeMap::new();
        for (idx, priority) in order.iter().enumerate() {
            positions.entry(*priority).or_default().push(idx);
        }

        let placements = positions
            .into_iter()
            .map(|(priority, positions)| {
                let count = positions.len();
                let average_position = positions.iter().sum::<usize>() as f64 / count as f64;
                let spread = match (positions.first(), positions.last()) {
                    (Some(first), Some(last)) => last - first,
                    _ => 0,
                };
                let verdict = if count <= SMALL_SAMPLE {
                    SpreadVerdict::SmallSample
                } else if spread as f64 >= required_spread {
                    SpreadVerdict::WellDistributed
                } else {
                    SpreadVerdict::PossiblyClustered
                };

                PriorityPlacement {
                    priority,
                    positions,
                    count,
                    average_position,
                    spread,
                    verdict,
                }
            })
            .collect();

        DistributionReport {
            total,
            required_spread,
            order: order.to_vec(),
            placements,
        }
    }
}
