//! SLA classification types.
//!
//! An [`SlaRule`] ties a status to an anchor timestamp and two
//! millisecond thresholds. [`SlaInfo`] is the derived, time-dependent
//! projection the calculator produces — it is recomputed on every read
//! and never stored.

use crate::StageField;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ── SLA Status ───────────────────────────────────────────────────────

/// Compliance classification of an entity against its deadline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaStatus {
    /// Within the approaching threshold, or no clock running
    OnTime,
    /// Past the approaching threshold, deadline not yet reached
    Approaching,
    /// Deadline reached or passed
    Breached,
}

impl SlaStatus {
    /// Severity rank for escalation ordering; higher is worse.
    pub fn severity(&self) -> u8 {
        match self {
            SlaStatus::OnTime => 0,
            SlaStatus::Approaching => 1,
            SlaStatus::Breached => 2,
        }
    }
}

impl std::fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlaStatus::OnTime => write!(f, "ON_TIME"),
            SlaStatus::Approaching => write!(f, "APPROACHING"),
            SlaStatus::Breached => write!(f, "BREACHED"),
        }
    }
}

// ── SLA Info ─────────────────────────────────────────────────────────

/// Derived compliance projection for one entity at one instant.
///
/// Never persisted; must not be cached beyond a single request without
/// an explicit TTL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaInfo {
    /// The classification
    pub status: SlaStatus,
    /// Fixed reason string from the matching rule, when not on time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Whole hours past the deadline, truncated toward zero; breached only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_overdue: Option<i64>,
    /// The breach deadline (anchor + breach threshold), when a clock runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_at: Option<DateTime<Utc>>,
}

impl SlaInfo {
    /// The on-time projection: no reason, no overdue hours, no deadline.
    pub fn on_time() -> Self {
        Self {
            status: SlaStatus::OnTime,
            reason: None,
            hours_overdue: None,
            deadline_at: None,
        }
    }

    pub fn is_on_time(&self) -> bool {
        self.status == SlaStatus::OnTime
    }

    pub fn is_breached(&self) -> bool {
        self.status == SlaStatus::Breached
    }
}

// ── SLA Rule ─────────────────────────────────────────────────────────

/// Milliseconds per hour, the unit all thresholds are expressed in.
pub const MS_PER_HOUR: i64 = 3_600_000;

/// A named maximum-allowed-duration constraint for one status.
///
/// The approaching threshold is a fixed absolute value, not a fraction
/// of the breach threshold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaRule {
    /// The stage timestamp this deadline is measured from
    pub anchor: StageField,
    /// Elapsed milliseconds at which the entity is approaching breach
    pub approaching_ms: i64,
    /// Elapsed milliseconds at which the entity has breached
    pub breach_ms: i64,
    /// Reason reported while approaching
    pub approaching_reason: String,
    /// Reason reported once breached
    pub breach_reason: String,
}

impl SlaRule {
    pub fn new(
        anchor: StageField,
        approaching_ms: i64,
        breach_ms: i64,
        approaching_reason: impl Into<String>,
        breach_reason: impl Into<String>,
    ) -> Self {
        Self {
            anchor,
            approaching_ms,
            breach_ms,
            approaching_reason: approaching_reason.into(),
            breach_reason: breach_reason.into(),
        }
    }

    /// The breach deadline for a given anchor instant.
    pub fn deadline_from(&self, anchor: DateTime<Utc>) -> DateTime<Utc> {
        anchor + Duration::milliseconds(self.breach_ms)
    }

    /// The latest anchor instant that is already breaching at `now`.
    ///
    /// An anchor at or before this cutoff satisfies `elapsed >= breach`.
    pub fn breach_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::milliseconds(self.breach_ms)
    }
}

/// Threshold helper: whole hours as milliseconds.
pub const fn hours(n: i64) -> i64 {
    n * MS_PER_HOUR
}

/// Threshold helper: whole days as milliseconds.
pub const fn days(n: i64) -> i64 {
    n * 24 * MS_PER_HOUR
}
