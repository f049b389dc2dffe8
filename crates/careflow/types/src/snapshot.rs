//! Entity snapshots: the plain state the engine computes against.
//!
//! The engine never touches persistence. Callers hand it snapshots —
//! an identifier, a status, and the stage timestamps set so far — and
//! get classifications and transition decisions back. The two concrete
//! shapes share the [`SlaSubject`] capability so the deadline calculator
//! is written once against the capability, not per workflow.

use crate::{ConsultationStatus, LabOrderStatus, StageField, StatusKey, WorkflowKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Entity Identifier ────────────────────────────────────────────────

/// Unique identifier for a workflow entity
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── SLA Subject Capability ───────────────────────────────────────────

/// Anything the deadline calculator can classify.
///
/// Exposes the workflow-qualified status and a lookup-by-field accessor
/// for anchor timestamps. A `None` anchor means that stage's clock has
/// not started, not that it is late.
pub trait SlaSubject {
    /// The workflow-qualified current status
    fn status_key(&self) -> StatusKey;

    /// The stage timestamp for a named anchor field, if set
    fn stage_timestamp(&self, field: StageField) -> Option<DateTime<Utc>>;
}

// ── Consultation Snapshot ────────────────────────────────────────────

/// A point-in-time view of a consultation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsultationSnapshot {
    /// Unique entity identifier
    pub id: EntityId,
    /// Current lifecycle status
    pub status: ConsultationStatus,
    /// Patient display name, where known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    /// Patient phone, where known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_phone: Option<String>,
    /// When the intake was submitted
    pub created_at: DateTime<Utc>,
    /// When the record last changed
    pub updated_at: DateTime<Utc>,
    /// When the doctor decided (approved or rejected)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// Reason given on rejection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl ConsultationSnapshot {
    /// Create a consultation at intake, in its initial status.
    pub fn new(id: EntityId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: ConsultationStatus::PendingAssessment,
            patient_name: None,
            patient_phone: None,
            created_at,
            updated_at: created_at,
            decided_at: None,
            rejection_reason: None,
        }
    }

    pub fn with_patient(
        mut self,
        name: impl Into<String>,
        phone: Option<impl Into<String>>,
    ) -> Self {
        self.patient_name = Some(name.into());
        self.patient_phone = phone.map(Into::into);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl SlaSubject for ConsultationSnapshot {
    fn status_key(&self) -> StatusKey {
        StatusKey::Consultation(self.status)
    }

    // Consultations carry no deadline anchors in current scope.
    fn stage_timestamp(&self, _field: StageField) -> Option<DateTime<Utc>> {
        None
    }
}

// ── Lab Order Snapshot ───────────────────────────────────────────────

/// A point-in-time view of a lab order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabOrderSnapshot {
    /// Unique entity identifier
    pub id: EntityId,
    /// Current lifecycle status
    pub status: LabOrderStatus,
    /// Patient display name, where known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    /// Patient phone, where known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_phone: Option<String>,
    /// Lab partner name, where known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_name: Option<String>,
    /// Lab partner phone, where known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_phone: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record last changed
    pub updated_at: DateTime<Utc>,
    /// When the order was placed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordered_at: Option<DateTime<Utc>>,
    /// When the patient booked a collection slot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_booked_at: Option<DateTime<Utc>>,
    /// When a phlebotomist was assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phlebotomist_assigned_at: Option<DateTime<Utc>>,
    /// When the sample was collected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_collected_at: Option<DateTime<Utc>>,
    /// When the sample was delivered to the lab
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_to_lab_at: Option<DateTime<Utc>>,
    /// When the lab confirmed receipt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_received_at: Option<DateTime<Utc>>,
    /// When results were uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_uploaded_at: Option<DateTime<Utc>>,
    /// When the doctor reviewed the results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_reviewed_at: Option<DateTime<Utc>>,
}

impl LabOrderSnapshot {
    /// Create a lab order in `Ordered`, stamping `ordered_at`.
    pub fn new(id: EntityId, ordered_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: LabOrderStatus::Ordered,
            patient_name: None,
            patient_phone: None,
            lab_name: None,
            lab_phone: None,
            created_at: ordered_at,
            updated_at: ordered_at,
            ordered_at: Some(ordered_at),
            slot_booked_at: None,
            phlebotomist_assigned_at: None,
            sample_collected_at: None,
            delivered_to_lab_at: None,
            sample_received_at: None,
            results_uploaded_at: None,
            results_reviewed_at: None,
        }
    }

    pub fn with_patient(
        mut self,
        name: impl Into<String>,
        phone: Option<impl Into<String>>,
    ) -> Self {
        self.patient_name = Some(name.into());
        self.patient_phone = phone.map(Into::into);
        self
    }

    pub fn with_lab(mut self, name: impl Into<String>, phone: Option<impl Into<String>>) -> Self {
        self.lab_name = Some(name.into());
        self.lab_phone = phone.map(Into::into);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Stamp a stage timestamp if it is not already set.
    ///
    /// Once set, a stage timestamp is never overwritten through normal
    /// transitions; only an admin override clears one.
    pub fn stamp_stage(&mut self, field: StageField, at: DateTime<Utc>) {
        let slot = self.stage_slot_mut(field);
        if slot.is_none() {
            *slot = Some(at);
        }
    }

    /// Clear a stage timestamp. Admin override escape hatch only.
    pub fn clear_stage(&mut self, field: StageField) {
        *self.stage_slot_mut(field) = None;
    }

    fn stage_slot_mut(&mut self, field: StageField) -> &mut Option<DateTime<Utc>> {
        match field {
            StageField::OrderedAt => &mut self.ordered_at,
            StageField::SlotBookedAt => &mut self.slot_booked_at,
            StageField::PhlebotomistAssignedAt => &mut self.phlebotomist_assigned_at,
            StageField::SampleCollectedAt => &mut self.sample_collected_at,
            StageField::DeliveredToLabAt => &mut self.delivered_to_lab_at,
            StageField::SampleReceivedAt => &mut self.sample_received_at,
            StageField::ResultsUploadedAt => &mut self.results_uploaded_at,
            StageField::ResultsReviewedAt => &mut self.results_reviewed_at,
        }
    }

    /// The stage stamped on entry to a status, if that status has one.
    pub fn entry_stage(status: LabOrderStatus) -> Option<StageField> {
        match status {
            LabOrderStatus::Ordered => Some(StageField::OrderedAt),
            LabOrderStatus::SlotBooked => Some(StageField::SlotBookedAt),
            LabOrderStatus::PhlebotomistAssigned => Some(StageField::PhlebotomistAssignedAt),
            LabOrderStatus::SampleCollected => Some(StageField::SampleCollectedAt),
            LabOrderStatus::DeliveredToLab => Some(StageField::DeliveredToLabAt),
            LabOrderStatus::SampleReceived => Some(StageField::SampleReceivedAt),
            LabOrderStatus::Processing => None,
            LabOrderStatus::ResultsUploaded => Some(StageField::ResultsUploadedAt),
            LabOrderStatus::ResultsReviewed => Some(StageField::ResultsReviewedAt),
            LabOrderStatus::Cancelled => None,
        }
    }
}

impl SlaSubject for LabOrderSnapshot {
    fn status_key(&self) -> StatusKey {
        StatusKey::LabOrder(self.status)
    }

    fn stage_timestamp(&self, field: StageField) -> Option<DateTime<Utc>> {
        match field {
            StageField::OrderedAt => self.ordered_at,
            StageField::SlotBookedAt => self.slot_booked_at,
            StageField::PhlebotomistAssignedAt => self.phlebotomist_assigned_at,
            StageField::SampleCollectedAt => self.sample_collected_at,
            StageField::DeliveredToLabAt => self.delivered_to_lab_at,
            StageField::SampleReceivedAt => self.sample_received_at,
            StageField::ResultsUploadedAt => self.results_uploaded_at,
            StageField::ResultsReviewedAt => self.results_reviewed_at,
        }
    }
}

// ── Workflow Snapshot ────────────────────────────────────────────────

/// A snapshot of either workflow, tagged by kind
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowSnapshot {
    Consultation(ConsultationSnapshot),
    LabOrder(LabOrderSnapshot),
}

impl WorkflowSnapshot {
    pub fn id(&self) -> &EntityId {
        match self {
            WorkflowSnapshot::Consultation(c) => &c.id,
            WorkflowSnapshot::LabOrder(o) => &o.id,
        }
    }

    pub fn kind(&self) -> WorkflowKind {
        match self {
            WorkflowSnapshot::Consultation(_) => WorkflowKind::Consultation,
            WorkflowSnapshot::LabOrder(_) => WorkflowKind::LabOrder,
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            WorkflowSnapshot::Consultation(c) => c.is_terminal(),
            WorkflowSnapshot::LabOrder(o) => o.is_terminal(),
        }
    }

    pub fn as_consultation(&self) -> Option<&ConsultationSnapshot> {
        match self {
            WorkflowSnapshot::Consultation(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_lab_order(&self) -> Option<&LabOrderSnapshot> {
        match self {
            WorkflowSnapshot::LabOrder(o) => Some(o),
            _ => None,
        }
    }
}

impl SlaSubject for WorkflowSnapshot {
    fn status_key(&self) -> StatusKey {
        match self {
            WorkflowSnapshot::Consultation(c) => c.status_key(),
            WorkflowSnapshot::LabOrder(o) => o.status_key(),
        }
    }

    fn stage_timestamp(&self, field: StageField) -> Option<DateTime<Utc>> {
        match self {
            WorkflowSnapshot::Consultation(c) => c.stage_timestamp(field),
            WorkflowSnapshot::LabOrder(o) => o.stage_timestamp(field),
        }
    }
}

impl From<ConsultationSnapshot> for WorkflowSnapshot {
    fn from(snapshot: ConsultationSnapshot) -> Self {
        WorkflowSnapshot::Consultation(snapshot)
    }
}

impl From<LabOrderSnapshot> for WorkflowSnapshot {
    fn from(snapshot: LabOrderSnapshot) -> Self {
        WorkflowSnapshot::LabOrder(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_entity_id() {
        let id = EntityId::generate();
        assert!(!id.0.is_empty());
        assert!(id.short().len() <= 8);

        let named = EntityId::new("lab-1");
        assert_eq!(format!("{}", named), "lab-1");
    }

    #[test]
    fn test_new_lab_order_stamps_ordered_at() {
        let order = LabOrderSnapshot::new(EntityId::new("lab-1"), at(9));
        assert_eq!(order.status, LabOrderStatus::Ordered);
        assert_eq!(order.stage_timestamp(StageField::OrderedAt), Some(at(9)));
        assert_eq!(order.stage_timestamp(StageField::SlotBookedAt), None);
    }

    #[test]
    fn test_stamp_stage_never_overwrites() {
        let mut order = LabOrderSnapshot::new(EntityId::new("lab-1"), at(9));
        order.stamp_stage(StageField::SlotBookedAt, at(10));
        order.stamp_stage(StageField::SlotBookedAt, at(12));
        assert_eq!(order.slot_booked_at, Some(at(10)));
    }

    #[test]
    fn test_clear_stage_is_the_escape_hatch() {
        let mut order = LabOrderSnapshot::new(EntityId::new("lab-1"), at(9));
        order.stamp_stage(StageField::SlotBookedAt, at(10));
        order.clear_stage(StageField::SlotBookedAt);
        assert_eq!(order.slot_booked_at, None);

        // After an override cleared it, the stage can be stamped again.
        order.stamp_stage(StageField::SlotBookedAt, at(11));
        assert_eq!(order.slot_booked_at, Some(at(11)));
    }

    #[test]
    fn test_consultation_has_no_anchors() {
        let consult = ConsultationSnapshot::new(EntityId::new("c-1"), at(9));
        assert_eq!(consult.stage_timestamp(StageField::OrderedAt), None);
        assert_eq!(
            consult.status_key(),
            StatusKey::Consultation(ConsultationStatus::PendingAssessment)
        );
    }

    #[test]
    fn test_workflow_snapshot_delegation() {
        let order = LabOrderSnapshot::new(EntityId::new("lab-1"), at(9))
            .with_patient("Ada", Some("+4912345"))
            .with_lab("Central Lab", None::<&str>);
        let snapshot = WorkflowSnapshot::from(order);

        assert_eq!(snapshot.kind(), WorkflowKind::LabOrder);
        assert_eq!(snapshot.id(), &EntityId::new("lab-1"));
        assert!(!snapshot.is_terminal());
        assert_eq!(snapshot.stage_timestamp(StageField::OrderedAt), Some(at(9)));
        assert!(snapshot.as_lab_order().is_some());
        assert!(snapshot.as_consultation().is_none());
    }

    #[test]
    fn test_snapshot_serde_round_trip() {
        let consult = ConsultationSnapshot::new(EntityId::new("c-1"), at(9))
            .with_patient("Grace", None::<&str>);
        let snapshot = WorkflowSnapshot::from(consult);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"kind\":\"consultation\""));
        assert!(json.contains("\"PENDING_ASSESSMENT\""));

        let back: WorkflowSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), &EntityId::new("c-1"));
    }

    #[test]
    fn test_entry_stage_mapping() {
        assert_eq!(
            LabOrderSnapshot::entry_stage(LabOrderStatus::SlotBooked),
            Some(StageField::SlotBookedAt)
        );
        assert_eq!(LabOrderSnapshot::entry_stage(LabOrderStatus::Processing), None);
        assert_eq!(LabOrderSnapshot::entry_stage(LabOrderStatus::Cancelled), None);
    }
}
