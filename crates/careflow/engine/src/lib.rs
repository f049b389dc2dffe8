//! Careflow workflow engine
//!
//! The engine enforces legal state transitions for the consultation and
//! lab order lifecycles and classifies every in-flight entity against
//! its service-level deadline. It is a pure computation library: it
//! receives entity snapshots, returns classifications and transition
//! decisions, and performs no I/O of its own.
//!
//! # Architecture
//!
//! The [`WorkflowOrchestrator`] composes specialized components over a
//! [`SnapshotStore`]:
//!
//! - [`TransitionTable`] — the per-workflow adjacency tables, the
//!   single source of truth for legal moves
//! - [`DeadlineCalculator`] — classifies entities against the
//!   [`SlaPolicy`] rule table (on time, approaching, breached)
//! - [`BreachCounter`] — per-rule population breach counts
//! - [`EscalationRanker`] — the severity-ordered escalation queue
//!
//! # Example
//!
//! ```rust
//! use careflow_engine::{InMemoryStore, TransitionContext, WorkflowOrchestrator};
//! use careflow_types::{ConsultationSnapshot, ConsultationStatus, EntityId};
//! use chrono::Utc;
//!
//! let mut orchestrator = WorkflowOrchestrator::new(InMemoryStore::new());
//!
//! let now = Utc::now();
//! let id = orchestrator.admit(ConsultationSnapshot::new(EntityId::new("consult-1"), now));
//!
//! // Legal moves pass through the transition table before persisting.
//! orchestrator
//!     .transition_consultation(&id, ConsultationStatus::AiTriaged, TransitionContext::at(now))
//!     .unwrap();
//!
//! // Skipping doctor review is rejected.
//! assert!(orchestrator
//!     .transition_consultation(&id, ConsultationStatus::Approved, TransitionContext::at(now))
//!     .is_err());
//!
//! assert!(orchestrator.evaluate_at(&id, now).unwrap().is_on_time());
//! ```

#![deny(unsafe_code)]

pub mod breach;
pub mod deadline;
pub mod escalation;
pub mod orchestrator;
pub mod store;
pub mod transitions;

// Re-export main types
pub use breach::{BreachCounter, BreachSummary, RuleBreachCount};
pub use deadline::{DeadlineCalculator, SlaPolicy};
pub use escalation::EscalationRanker;
pub use orchestrator::{TransitionContext, WorkflowOrchestrator};
pub use store::{InMemoryStore, SnapshotStore};
pub use transitions::{
    consultation_transitions, lab_order_transitions, TransitionTable, TransitionTableBuilder,
};
