//! Status vocabulary for the two clinical lifecycles.
//!
//! A consultation moves from intake through AI triage and doctor review
//! to a decision; a lab order moves from ordering through collection to
//! uploaded results. Exactly one status is active per entity at any time,
//! and the transition tables in `careflow-engine` are the single source
//! of truth for which moves are legal.

use serde::{Deserialize, Serialize};

// ── Workflow Kind ────────────────────────────────────────────────────

/// Which of the two parallel workflows an entity belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Consultation,
    LabOrder,
}

impl std::fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowKind::Consultation => write!(f, "consultation"),
            WorkflowKind::LabOrder => write!(f, "lab_order"),
        }
    }
}

// ── Consultation Status ──────────────────────────────────────────────

/// Lifecycle status of a medical consultation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsultationStatus {
    /// Intake submitted, awaiting AI triage
    PendingAssessment,
    /// AI triage complete, awaiting doctor pickup
    AiTriaged,
    /// A doctor is reviewing the case
    DoctorReviewing,
    /// A video consultation has been scheduled
    VideoScheduled,
    /// Doctor approved the treatment request
    Approved,
    /// Doctor rejected the treatment request
    Rejected,
    /// Closed administratively without a decision
    Closed,
    /// Cancelled by the patient
    Cancelled,
}

impl ConsultationStatus {
    /// Terminal statuses have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Approved | Self::Rejected | Self::Closed | Self::Cancelled
        )
    }

    /// Every consultation status, for table-driven checks.
    pub const fn all() -> &'static [ConsultationStatus] {
        &[
            Self::PendingAssessment,
            Self::AiTriaged,
            Self::DoctorReviewing,
            Self::VideoScheduled,
            Self::Approved,
            Self::Rejected,
            Self::Closed,
            Self::Cancelled,
        ]
    }
}

impl std::fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PendingAssessment => "PENDING_ASSESSMENT",
            Self::AiTriaged => "AI_TRIAGED",
            Self::DoctorReviewing => "DOCTOR_REVIEWING",
            Self::VideoScheduled => "VIDEO_SCHEDULED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Closed => "CLOSED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

// ── Lab Order Status ─────────────────────────────────────────────────

/// Lifecycle status of a lab order, from ordering to reviewed results
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabOrderStatus {
    /// Ordered, awaiting the patient to book a collection slot
    Ordered,
    /// Slot booked, awaiting coordinator to assign a phlebotomist
    SlotBooked,
    /// Phlebotomist assigned, awaiting sample collection
    PhlebotomistAssigned,
    /// Sample collected, awaiting courier delivery to the lab
    SampleCollected,
    /// Delivered to the lab, awaiting receipt confirmation
    DeliveredToLab,
    /// Lab confirmed receipt of the sample
    SampleReceived,
    /// Lab is processing the sample
    Processing,
    /// Results uploaded, awaiting doctor review
    ResultsUploaded,
    /// Doctor reviewed the results
    ResultsReviewed,
    /// Cancelled before completion
    Cancelled,
}

impl LabOrderStatus {
    /// Terminal statuses have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ResultsReviewed | Self::Cancelled)
    }

    /// Every lab order status, for table-driven checks.
    pub const fn all() -> &'static [LabOrderStatus] {
        &[
            Self::Ordered,
            Self::SlotBooked,
            Self::PhlebotomistAssigned,
            Self::SampleCollected,
            Self::DeliveredToLab,
            Self::SampleReceived,
            Self::Processing,
            Self::ResultsUploaded,
            Self::ResultsReviewed,
            Self::Cancelled,
        ]
    }
}

impl std::fmt::Display for LabOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ordered => "ORDERED",
            Self::SlotBooked => "SLOT_BOOKED",
            Self::PhlebotomistAssigned => "PHLEBOTOMIST_ASSIGNED",
            Self::SampleCollected => "SAMPLE_COLLECTED",
            Self::DeliveredToLab => "DELIVERED_TO_LAB",
            Self::SampleReceived => "SAMPLE_RECEIVED",
            Self::Processing => "PROCESSING",
            Self::ResultsUploaded => "RESULTS_UPLOADED",
            Self::ResultsReviewed => "RESULTS_REVIEWED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

// ── Status Key ───────────────────────────────────────────────────────

/// A workflow-qualified status, the lookup key for SLA rule tables.
///
/// Both lifecycles share one deadline calculator; the key keeps a
/// consultation status from ever colliding with a lab order status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKey {
    Consultation(ConsultationStatus),
    LabOrder(LabOrderStatus),
}

impl StatusKey {
    pub fn kind(&self) -> WorkflowKind {
        match self {
            StatusKey::Consultation(_) => WorkflowKind::Consultation,
            StatusKey::LabOrder(_) => WorkflowKind::LabOrder,
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            StatusKey::Consultation(s) => s.is_terminal(),
            StatusKey::LabOrder(s) => s.is_terminal(),
        }
    }
}

impl std::fmt::Display for StatusKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusKey::Consultation(s) => write!(f, "consultation:{}", s),
            StatusKey::LabOrder(s) => write!(f, "lab_order:{}", s),
        }
    }
}

impl From<ConsultationStatus> for StatusKey {
    fn from(status: ConsultationStatus) -> Self {
        StatusKey::Consultation(status)
    }
}

impl From<LabOrderStatus> for StatusKey {
    fn from(status: LabOrderStatus) -> Self {
        StatusKey::LabOrder(status)
    }
}

// ── Stage Field ──────────────────────────────────────────────────────

/// Named stage timestamps a deadline can be anchored to.
///
/// Each SLA rule measures from the entry time of a specific stage, never
/// from entity creation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageField {
    OrderedAt,
    SlotBookedAt,
    PhlebotomistAssignedAt,
    SampleCollectedAt,
    DeliveredToLabAt,
    SampleReceivedAt,
    ResultsUploadedAt,
    ResultsReviewedAt,
}

impl std::fmt::Display for StageField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OrderedAt => "orderedAt",
            Self::SlotBookedAt => "slotBookedAt",
            Self::PhlebotomistAssignedAt => "phlebotomistAssignedAt",
            Self::SampleCollectedAt => "sampleCollectedAt",
            Self::DeliveredToLabAt => "deliveredToLabAt",
            Self::SampleReceivedAt => "sampleReceivedAt",
            Self::ResultsUploadedAt => "resultsUploadedAt",
            Self::ResultsReviewedAt => "resultsReviewedAt",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consultation_terminal_statuses() {
        assert!(!ConsultationStatus::PendingAssessment.is_terminal());
        assert!(!ConsultationStatus::AiTriaged.is_terminal());
        assert!(!ConsultationStatus::DoctorReviewing.is_terminal());
        assert!(!ConsultationStatus::VideoScheduled.is_terminal());
        assert!(ConsultationStatus::Approved.is_terminal());
        assert!(ConsultationStatus::Rejected.is_terminal());
        assert!(ConsultationStatus::Closed.is_terminal());
        assert!(ConsultationStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_lab_order_terminal_statuses() {
        for status in LabOrderStatus::all() {
            let expected = matches!(
                status,
                LabOrderStatus::ResultsReviewed | LabOrderStatus::Cancelled
            );
            assert_eq!(status.is_terminal(), expected, "{}", status);
        }
    }

    #[test]
    fn test_status_serde_vocabulary() {
        let json = serde_json::to_string(&LabOrderStatus::SlotBooked).unwrap();
        assert_eq!(json, "\"SLOT_BOOKED\"");

        let parsed: ConsultationStatus = serde_json::from_str("\"DOCTOR_REVIEWING\"").unwrap();
        assert_eq!(parsed, ConsultationStatus::DoctorReviewing);
    }

    #[test]
    fn test_status_display_matches_vocabulary() {
        assert_eq!(
            ConsultationStatus::PendingAssessment.to_string(),
            "PENDING_ASSESSMENT"
        );
        assert_eq!(
            LabOrderStatus::DeliveredToLab.to_string(),
            "DELIVERED_TO_LAB"
        );
    }

    #[test]
    fn test_status_key_kind() {
        let key = StatusKey::from(ConsultationStatus::DoctorReviewing);
        assert_eq!(key.kind(), WorkflowKind::Consultation);
        assert!(!key.is_terminal());

        let key = StatusKey::from(LabOrderStatus::Cancelled);
        assert_eq!(key.kind(), WorkflowKind::LabOrder);
        assert!(key.is_terminal());
        assert_eq!(key.to_string(), "lab_order:CANCELLED");
    }

    #[test]
    fn test_stage_field_names() {
        assert_eq!(StageField::OrderedAt.to_string(), "orderedAt");
        assert_eq!(StageField::SampleReceivedAt.to_string(), "sampleReceivedAt");
    }
}
