//! Transition tables: the single source of truth for legal moves.
//!
//! Each workflow has one immutable adjacency table, built at
//! initialization and injected into the orchestrator. Any new stage is
//! added to the table, never special-cased in business code. Statuses
//! registered without outgoing edges are terminal; statuses absent from
//! the table entirely are a configuration error and fail loudly.

use careflow_types::{ConsultationStatus, LabOrderStatus, WorkflowError, WorkflowResult};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

/// An immutable status adjacency table for one workflow
#[derive(Clone, Debug)]
pub struct TransitionTable<S> {
    workflow: &'static str,
    edges: HashMap<S, HashSet<S>>,
}

impl<S> TransitionTable<S>
where
    S: Copy + Eq + Hash + Display,
{
    /// Start building a table for the named workflow.
    pub fn builder(workflow: &'static str) -> TransitionTableBuilder<S> {
        TransitionTableBuilder {
            workflow,
            edges: HashMap::new(),
        }
    }

    /// The workflow this table belongs to.
    pub fn workflow(&self) -> &'static str {
        self.workflow
    }

    /// Whether the table knows this status at all.
    pub fn is_known(&self, status: S) -> bool {
        self.edges.contains_key(&status)
    }

    /// Whether `proposed` is reachable from `current` in one step.
    ///
    /// Unknown statuses map to the empty set here; [`Self::validate`]
    /// surfaces them as configuration errors instead.
    pub fn is_valid(&self, current: S, proposed: S) -> bool {
        self.edges
            .get(&current)
            .map(|targets| targets.contains(&proposed))
            .unwrap_or(false)
    }

    /// The statuses reachable from `current` in one step.
    pub fn targets(&self, current: S) -> impl Iterator<Item = S> + '_ {
        self.edges
            .get(&current)
            .into_iter()
            .flat_map(|targets| targets.iter().copied())
    }

    /// Check a proposed transition, returning a typed error on rejection.
    pub fn validate(&self, current: S, proposed: S) -> WorkflowResult<()> {
        let Some(targets) = self.edges.get(&current) else {
            return Err(WorkflowError::UnknownStatus(format!(
                "{}:{}",
                self.workflow, current
            )));
        };
        if targets.contains(&proposed) {
            Ok(())
        } else {
            tracing::warn!(
                workflow = self.workflow,
                from = %current,
                to = %proposed,
                "Rejected illegal transition"
            );
            Err(WorkflowError::InvalidTransition {
                workflow: self.workflow.to_string(),
                from: current.to_string(),
                to: proposed.to_string(),
            })
        }
    }
}

/// Builder for [`TransitionTable`]; the table is immutable once built
#[derive(Clone, Debug)]
pub struct TransitionTableBuilder<S> {
    workflow: &'static str,
    edges: HashMap<S, HashSet<S>>,
}

impl<S> TransitionTableBuilder<S>
where
    S: Copy + Eq + Hash + Display,
{
    /// Allow one-step transitions from `from` to each of `to`.
    pub fn allow(mut self, from: S, to: impl IntoIterator<Item = S>) -> Self {
        self.edges.entry(from).or_default().extend(to);
        self
    }

    /// Register a terminal status: known, with no outgoing transitions.
    pub fn terminal(mut self, status: S) -> Self {
        self.edges.entry(status).or_default();
        self
    }

    pub fn build(self) -> TransitionTable<S> {
        TransitionTable {
            workflow: self.workflow,
            edges: self.edges,
        }
    }
}

/// The consultation adjacency table.
///
/// The only revert edge is `VideoScheduled -> DoctorReviewing`, where
/// the business explicitly allows human correction of a scheduled video.
pub fn consultation_transitions() -> TransitionTable<ConsultationStatus> {
    use ConsultationStatus::*;
    TransitionTable::builder("consultation")
        .allow(PendingAssessment, [AiTriaged, Closed, Cancelled])
        .allow(AiTriaged, [DoctorReviewing, Closed, Cancelled])
        .allow(
            DoctorReviewing,
            [VideoScheduled, Approved, Rejected, Closed, Cancelled],
        )
        .allow(VideoScheduled, [DoctorReviewing, Approved, Rejected, Cancelled])
        .terminal(Approved)
        .terminal(Rejected)
        .terminal(Closed)
        .terminal(Cancelled)
        .build()
}

/// The lab order adjacency table, ordering through reviewed results.
pub fn lab_order_transitions() -> TransitionTable<LabOrderStatus> {
    use LabOrderStatus::*;
    TransitionTable::builder("lab_order")
        .allow(Ordered, [SlotBooked, Cancelled])
        .allow(SlotBooked, [PhlebotomistAssigned, Cancelled])
        .allow(PhlebotomistAssigned, [SampleCollected, Cancelled])
        .allow(SampleCollected, [DeliveredToLab, Cancelled])
        .allow(DeliveredToLab, [SampleReceived, Cancelled])
        .allow(SampleReceived, [Processing, ResultsUploaded, Cancelled])
        .allow(Processing, [ResultsUploaded, Cancelled])
        .allow(ResultsUploaded, [ResultsReviewed, Cancelled])
        .terminal(ResultsReviewed)
        .terminal(Cancelled)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_consultation_happy_path() {
        use ConsultationStatus::*;
        let table = consultation_transitions();

        assert!(table.is_valid(PendingAssessment, AiTriaged));
        assert!(table.is_valid(AiTriaged, DoctorReviewing));
        assert!(table.is_valid(DoctorReviewing, Approved));
        assert!(table.is_valid(DoctorReviewing, VideoScheduled));
        assert!(table.is_valid(VideoScheduled, Approved));
    }

    #[test]
    fn test_no_stage_skipping() {
        use ConsultationStatus::*;
        let table = consultation_transitions();

        // Must pass through AI triage and doctor review first.
        assert!(!table.is_valid(PendingAssessment, Approved));
        assert!(!table.is_valid(PendingAssessment, DoctorReviewing));
        assert!(!table.is_valid(AiTriaged, Approved));

        let err = table.validate(PendingAssessment, Approved).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_reentrant_transitions_are_illegal() {
        let consultations = consultation_transitions();
        for status in ConsultationStatus::all() {
            assert!(
                !consultations.is_valid(*status, *status),
                "consultation {} must not transition to itself",
                status
            );
        }

        let lab_orders = lab_order_transitions();
        for status in LabOrderStatus::all() {
            assert!(
                !lab_orders.is_valid(*status, *status),
                "lab order {} must not transition to itself",
                status
            );
        }
    }

    #[test]
    fn test_terminal_statuses_have_empty_sets() {
        let consultations = consultation_transitions();
        for status in ConsultationStatus::all() {
            if status.is_terminal() {
                assert_eq!(
                    consultations.targets(*status).count(),
                    0,
                    "consultation {} is terminal",
                    status
                );
            }
        }

        let lab_orders = lab_order_transitions();
        for status in LabOrderStatus::all() {
            if status.is_terminal() {
                assert_eq!(
                    lab_orders.targets(*status).count(),
                    0,
                    "lab order {} is terminal",
                    status
                );
            }
        }
    }

    #[test]
    fn test_antisymmetric_except_listed_reverts() {
        use ConsultationStatus::*;
        let table = consultation_transitions();

        let mut bidirectional = Vec::new();
        for a in ConsultationStatus::all() {
            for b in ConsultationStatus::all() {
                if a < b && table.is_valid(*a, *b) && table.is_valid(*b, *a) {
                    bidirectional.push((*a, *b));
                }
            }
        }
        // The scheduled-video revert is the only pair listed both ways.
        assert_eq!(bidirectional, vec![(DoctorReviewing, VideoScheduled)]);
    }

    #[test]
    fn test_lab_order_is_fully_antisymmetric() {
        let table = lab_order_transitions();
        for a in LabOrderStatus::all() {
            for b in LabOrderStatus::all() {
                if a != b && table.is_valid(*a, *b) {
                    assert!(
                        !table.is_valid(*b, *a),
                        "lab order {} <-> {} must not be bidirectional",
                        a,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn test_every_status_is_known() {
        let consultations = consultation_transitions();
        for status in ConsultationStatus::all() {
            assert!(consultations.is_known(*status), "{}", status);
        }

        let lab_orders = lab_order_transitions();
        for status in LabOrderStatus::all() {
            assert!(lab_orders.is_known(*status), "{}", status);
        }
    }

    #[test]
    fn test_unknown_status_fails_loudly() {
        use ConsultationStatus::*;
        // A table missing a non-terminal status entirely.
        let table = TransitionTable::builder("consultation")
            .allow(PendingAssessment, [AiTriaged])
            .terminal(Cancelled)
            .build();

        let err = table.validate(DoctorReviewing, Approved).unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownStatus(_)));
        assert!(err.to_string().contains("DOCTOR_REVIEWING"));
    }

    #[test]
    fn test_cancellation_from_every_in_flight_lab_status() {
        use LabOrderStatus::*;
        let table = lab_order_transitions();
        for status in LabOrderStatus::all() {
            if !status.is_terminal() {
                assert!(table.is_valid(*status, Cancelled), "{}", status);
            }
        }
    }

    fn consultation_status_strategy() -> impl Strategy<Value = ConsultationStatus> {
        proptest::sample::select(ConsultationStatus::all().to_vec())
    }

    proptest! {
        #[test]
        fn property_terminal_absorbs_all_proposals(
            proposals in proptest::collection::vec(consultation_status_strategy(), 0..16)
        ) {
            let table = consultation_transitions();
            let mut current = ConsultationStatus::PendingAssessment;
            let mut terminal_since: Option<usize> = None;

            for (i, proposed) in proposals.into_iter().enumerate() {
                if table.validate(current, proposed).is_ok() {
                    // No transition may ever be accepted out of a terminal status.
                    prop_assert!(terminal_since.is_none());
                    current = proposed;
                }
                if current.is_terminal() && terminal_since.is_none() {
                    terminal_since = Some(i);
                }
            }
        }
    }
}
