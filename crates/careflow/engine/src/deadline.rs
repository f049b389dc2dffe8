//! Deadline classification: one generic evaluator over a rule table.
//!
//! Each status with a deadline obligation maps to an [`SlaRule`]: an
//! anchor stage timestamp and two millisecond thresholds. The evaluator
//! never branches per status; adding a deadline means adding a table
//! row. Statuses without a rule evaluate to on-time through an explicit,
//! logged branch so a missing configuration is visible rather than
//! indistinguishable from genuine compliance.

use careflow_types::{
    days, hours, LabOrderStatus, SlaInfo, SlaRule, SlaStatus, SlaSubject, StageField, StatusKey,
    MS_PER_HOUR,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

// ── SLA Policy ───────────────────────────────────────────────────────

/// The immutable status → rule table, built once and injected
#[derive(Clone, Debug, Default)]
pub struct SlaPolicy {
    rules: BTreeMap<StatusKey, SlaRule>,
}

impl SlaPolicy {
    /// An empty policy; useful as a base for per-test overrides.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add or replace the rule for one status.
    pub fn with_rule(mut self, status: impl Into<StatusKey>, rule: SlaRule) -> Self {
        self.rules.insert(status.into(), rule);
        self
    }

    /// The rule for a status, if one is configured.
    pub fn rule_for(&self, status: &StatusKey) -> Option<&SlaRule> {
        self.rules.get(status)
    }

    /// All configured rules, in stable status order.
    pub fn iter(&self) -> impl Iterator<Item = (&StatusKey, &SlaRule)> {
        self.rules.iter()
    }

    /// Number of configured rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// The production rule table.
    ///
    /// `SampleReceived` and `Processing` share one obligation anchored
    /// at lab receipt, entered as two rows so lookup stays a pure
    /// status → rule mapping. Consultations carry no rules in current
    /// scope; their transitions are validated but not deadline-tracked.
    pub fn standard() -> Self {
        use LabOrderStatus::*;
        let processing_rule = SlaRule::new(
            StageField::SampleReceivedAt,
            hours(48),
            hours(72),
            "Results approaching deadline",
            "Results overdue (72+ hours)",
        );
        Self::empty()
            .with_rule(
                Ordered,
                SlaRule::new(
                    StageField::OrderedAt,
                    days(7),
                    days(14),
                    "Booking overdue (7+ days)",
                    "Patient has not booked slot (14+ days)",
                ),
            )
            .with_rule(
                SlotBooked,
                SlaRule::new(
                    StageField::SlotBookedAt,
                    hours(1),
                    hours(2),
                    "Phlebotomist assignment due soon",
                    "Phlebotomist not assigned (2+ hours)",
                ),
            )
            .with_rule(
                DeliveredToLab,
                SlaRule::new(
                    StageField::DeliveredToLabAt,
                    hours(2),
                    hours(4),
                    "Sample receipt confirmation due soon",
                    "Sample receipt not confirmed (4+ hours)",
                ),
            )
            .with_rule(SampleReceived, processing_rule.clone())
            .with_rule(Processing, processing_rule)
            .with_rule(
                ResultsUploaded,
                SlaRule::new(
                    StageField::ResultsUploadedAt,
                    hours(24),
                    hours(48),
                    "Doctor review due soon",
                    "Doctor review overdue (48+ hours)",
                ),
            )
    }
}

// ── Deadline Calculator ──────────────────────────────────────────────

/// Classifies entities against the rule table. Pure: the caller
/// supplies `now`, sampled once per evaluation pass.
#[derive(Clone, Debug)]
pub struct DeadlineCalculator {
    policy: SlaPolicy,
}

impl DeadlineCalculator {
    pub fn new(policy: SlaPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SlaPolicy {
        &self.policy
    }

    /// Classify one entity at the instant `now`.
    pub fn evaluate<S>(&self, subject: &S, now: DateTime<Utc>) -> SlaInfo
    where
        S: SlaSubject + ?Sized,
    {
        let key = subject.status_key();
        let Some(rule) = self.policy.rule_for(&key) else {
            // Explicitly no deadline obligation for this status.
            tracing::debug!(status = %key, "No SLA rule configured; treating as on time");
            return SlaInfo::on_time();
        };

        // A missing anchor means the clock has not started.
        let Some(anchor) = subject.stage_timestamp(rule.anchor) else {
            return SlaInfo::on_time();
        };

        let elapsed_ms = (now - anchor).num_milliseconds();
        let deadline_at = rule.deadline_from(anchor);

        if elapsed_ms >= rule.breach_ms {
            SlaInfo {
                status: SlaStatus::Breached,
                reason: Some(rule.breach_reason.clone()),
                hours_overdue: Some((elapsed_ms - rule.breach_ms) / MS_PER_HOUR),
                deadline_at: Some(deadline_at),
            }
        } else if elapsed_ms >= rule.approaching_ms {
            SlaInfo {
                status: SlaStatus::Approaching,
                reason: Some(rule.approaching_reason.clone()),
                hours_overdue: None,
                deadline_at: Some(deadline_at),
            }
        } else {
            SlaInfo::on_time()
        }
    }
}

impl Default for DeadlineCalculator {
    fn default() -> Self {
        Self::new(SlaPolicy::standard())
    }
}
