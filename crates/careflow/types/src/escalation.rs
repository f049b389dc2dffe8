//! Escalations: ranked records of entities failing or nearly failing
//! their SLA, assembled per dashboard request from the live population.

use crate::{EntityId, SlaInfo, WorkflowKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A surfaced, ranked SLA failure. Ephemeral — never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Escalation {
    /// Unique id for this escalation record
    pub id: String,
    /// Which workflow the entity belongs to
    pub kind: WorkflowKind,
    /// The entity this escalation is about
    pub resource_id: EntityId,
    /// The classification that put it on the queue
    pub sla: SlaInfo,
    /// Who should act: the patient's name, "Coordinator", the lab
    /// partner's name, or "Doctor", depending on the waiting stage
    pub responsible_party: String,
    /// Phone for the responsible party, where known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_contact: Option<String>,
    /// When this escalation record was assembled
    pub created_at: DateTime<Utc>,
}

impl Escalation {
    pub fn new(
        kind: WorkflowKind,
        resource_id: EntityId,
        sla: SlaInfo,
        responsible_party: impl Into<String>,
        responsible_contact: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            resource_id,
            sla,
            responsible_party: responsible_party.into(),
            responsible_contact,
            created_at,
        }
    }
}
