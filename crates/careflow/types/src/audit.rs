//! Audit trail for accepted transitions and admin overrides.

use crate::{EntityId, WorkflowKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in the orchestrator's transition audit log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Monotonically increasing sequence number
    pub sequence: u64,
    /// The entity that changed
    pub entity_id: EntityId,
    /// Which workflow it belongs to
    pub kind: WorkflowKind,
    /// Status before the change
    pub from: String,
    /// Status after the change
    pub to: String,
    /// Who caused the change, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Reason supplied with the change, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Whether this was an admin override rather than a normal transition
    pub admin_override: bool,
    /// When the change occurred
    pub occurred_at: DateTime<Utc>,
}
