//! Breach counting: per-rule population totals for dashboards.
//!
//! The counter issues one count query per configured rule
//! (`status == X AND anchor <= now - breach`), summed. It never
//! materializes and evaluates the whole population; cardinality is all
//! the dashboard needs and a time-range count is what backends index.

use crate::{SlaPolicy, SnapshotStore};
use careflow_types::StatusKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counts currently-breaching entities per SLA rule
#[derive(Clone, Debug, Default)]
pub struct BreachCounter;

impl BreachCounter {
    pub fn new() -> Self {
        Self
    }

    /// Total breaching entities across all rules at the instant `now`.
    pub fn count_breaches<S: SnapshotStore>(
        &self,
        store: &S,
        policy: &SlaPolicy,
        now: DateTime<Utc>,
    ) -> usize {
        policy
            .iter()
            .map(|(status, rule)| {
                store.count_anchored_at_or_before(*status, rule.anchor, rule.breach_cutoff(now))
            })
            .sum()
    }

    /// Per-rule counts plus the total, in stable rule order.
    pub fn breach_summary<S: SnapshotStore>(
        &self,
        store: &S,
        policy: &SlaPolicy,
        now: DateTime<Utc>,
    ) -> BreachSummary {
        let per_rule: Vec<RuleBreachCount> = policy
            .iter()
            .map(|(status, rule)| RuleBreachCount {
                status: *status,
                count: store.count_anchored_at_or_before(
                    *status,
                    rule.anchor,
                    rule.breach_cutoff(now),
                ),
            })
            .collect();

        BreachSummary {
            total: per_rule.iter().map(|r| r.count).sum(),
            per_rule,
            counted_at: now,
        }
    }
}

/// Breach count for a single rule
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBreachCount {
    /// The status the rule applies to
    pub status: StatusKey,
    /// Entities currently breaching this rule
    pub count: usize,
}

/// Population-wide breach totals at one instant
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BreachSummary {
    /// Sum of all per-rule counts
    pub total: usize,
    /// Counts per rule, in stable rule order
    pub per_rule: Vec<RuleBreachCount>,
    /// The instant the counts were taken at
    pub counted_at: DateTime<Utc>,
}
