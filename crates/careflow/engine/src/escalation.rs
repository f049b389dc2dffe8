//! Escalation ranking: the severity-ordered queue for the ops dashboard.
//!
//! The ranker evaluates every in-flight entity, drops the on-time ones,
//! attaches responsible-party attribution, and sorts breached before
//! approaching, most-overdue first. It decides nothing and notifies
//! no one; the caller acts on the list.

use crate::{DeadlineCalculator, SnapshotStore};
use careflow_types::{Escalation, LabOrderSnapshot, LabOrderStatus, WorkflowSnapshot};
use chrono::{DateTime, Utc};

/// Builds the ranked escalation queue from the live population
#[derive(Clone, Debug, Default)]
pub struct EscalationRanker;

impl EscalationRanker {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the escalation queue at the instant `now`.
    ///
    /// Every entity in the result classified against the same `now`, so
    /// one response never mixes instants. Ordering is total: severity
    /// tier, then descending hours overdue (null as zero), then
    /// resource id for determinism.
    pub fn list_escalations<S: SnapshotStore>(
        &self,
        store: &S,
        calculator: &DeadlineCalculator,
        now: DateTime<Utc>,
    ) -> Vec<Escalation> {
        let mut escalations: Vec<Escalation> = store
            .in_flight()
            .into_iter()
            .filter_map(|snapshot| {
                let sla = calculator.evaluate(&snapshot, now);
                if sla.is_on_time() {
                    return None;
                }
                let (party, contact) = responsible_party(&snapshot);
                Some(Escalation::new(
                    snapshot.kind(),
                    snapshot.id().clone(),
                    sla,
                    party,
                    contact,
                    now,
                ))
            })
            .collect();

        escalations.sort_by(|a, b| {
            b.sla
                .status
                .severity()
                .cmp(&a.sla.status.severity())
                .then_with(|| {
                    b.sla
                        .hours_overdue
                        .unwrap_or(0)
                        .cmp(&a.sla.hours_overdue.unwrap_or(0))
                })
                .then_with(|| a.resource_id.cmp(&b.resource_id))
        });

        escalations
    }
}

/// Who should act on a stalled entity, and how to reach them.
///
/// The patient while awaiting booking, the coordinator while awaiting
/// assignment, the lab partner while the sample is on their side, and
/// the doctor once results await review.
fn responsible_party(snapshot: &WorkflowSnapshot) -> (String, Option<String>) {
    match snapshot {
        WorkflowSnapshot::Consultation(_) => ("Doctor".to_string(), None),
        WorkflowSnapshot::LabOrder(order) => lab_order_party(order),
    }
}

fn lab_order_party(order: &LabOrderSnapshot) -> (String, Option<String>) {
    use LabOrderStatus::*;
    match order.status {
        Ordered => (
            order
                .patient_name
                .clone()
                .unwrap_or_else(|| "Patient".to_string()),
            order.patient_phone.clone(),
        ),
        SlotBooked | PhlebotomistAssigned => ("Coordinator".to_string(), None),
        SampleCollected | DeliveredToLab | SampleReceived | Processing => (
            order.lab_name.clone().unwrap_or_else(|| "Lab".to_string()),
            order.lab_phone.clone(),
        ),
        ResultsUploaded | ResultsReviewed | Cancelled => ("Doctor".to_string(), None),
    }
}
