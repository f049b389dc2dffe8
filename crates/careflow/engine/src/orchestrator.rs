//! Workflow orchestrator: the integration point for both lifecycles.
//!
//! The orchestrator composes the transition tables, deadline
//! calculator, breach counter, and escalation ranker over a snapshot
//! store. Every status change passes the legality check before anything
//! is persisted; ancillary-data validation and side effects (stage
//! stamping, decision timestamps) are applied as a second step after
//! legality passes, so the tables stay pure and independently testable.
//!
//! All read-side projections sample `now` once per call: every
//! threshold in one response is compared against the same instant.

use crate::{
    consultation_transitions, lab_order_transitions, BreachCounter, BreachSummary,
    DeadlineCalculator, EscalationRanker, SlaPolicy, SnapshotStore, TransitionTable,
};
use careflow_types::{
    ConsultationSnapshot, ConsultationStatus, EntityId, Escalation, LabOrderSnapshot,
    LabOrderStatus, SlaInfo, StageField, TransitionRecord, WorkflowError, WorkflowKind,
    WorkflowResult, WorkflowSnapshot,
};
use chrono::{DateTime, Utc};

// ── Transition Context ───────────────────────────────────────────────

/// Ancillary data accompanying a transition request
#[derive(Clone, Debug)]
pub struct TransitionContext {
    /// The instant the transition takes effect
    pub now: DateTime<Utc>,
    /// Who requested the change, if known
    pub actor: Option<String>,
    /// Reason supplied with the change; required for rejections
    pub reason: Option<String>,
}

impl TransitionContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            actor: None,
            reason: None,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────

/// Coordinates validated transitions and SLA projections over a store
#[derive(Clone, Debug)]
pub struct WorkflowOrchestrator<S: SnapshotStore> {
    store: S,
    consultations: TransitionTable<ConsultationStatus>,
    lab_orders: TransitionTable<LabOrderStatus>,
    calculator: DeadlineCalculator,
    counter: BreachCounter,
    ranker: EscalationRanker,
    audit: Vec<TransitionRecord>,
}

impl<S: SnapshotStore> WorkflowOrchestrator<S> {
    /// Create an orchestrator with the production tables and policy.
    pub fn new(store: S) -> Self {
        Self::with_config(
            store,
            consultation_transitions(),
            lab_order_transitions(),
            SlaPolicy::standard(),
        )
    }

    /// Create an orchestrator with injected tables and policy.
    pub fn with_config(
        store: S,
        consultations: TransitionTable<ConsultationStatus>,
        lab_orders: TransitionTable<LabOrderStatus>,
        policy: SlaPolicy,
    ) -> Self {
        Self {
            store,
            consultations,
            lab_orders,
            calculator: DeadlineCalculator::new(policy),
            counter: BreachCounter::new(),
            ranker: EscalationRanker::new(),
            audit: Vec::new(),
        }
    }

    // ── Entity admission ─────────────────────────────────────────────

    /// Insert a newly created entity (intake submission, lab ordering).
    pub fn admit(&mut self, snapshot: impl Into<WorkflowSnapshot>) -> EntityId {
        let snapshot = snapshot.into();
        let id = snapshot.id().clone();
        tracing::info!(entity_id = %id, kind = %snapshot.kind(), "Entity admitted");
        self.store.put(snapshot);
        id
    }

    /// Fetch one entity.
    pub fn get(&self, id: &EntityId) -> WorkflowResult<WorkflowSnapshot> {
        self.store
            .get(id)
            .ok_or_else(|| WorkflowError::EntityNotFound(id.clone()))
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Apply a validated consultation transition.
    ///
    /// Legality first; then ancillary validation (rejection requires a
    /// reason) and side effects (`decided_at` on a decision).
    pub fn transition_consultation(
        &mut self,
        id: &EntityId,
        proposed: ConsultationStatus,
        ctx: TransitionContext,
    ) -> WorkflowResult<ConsultationSnapshot> {
        let mut consult = self.fetch_consultation(id)?;
        self.consultations.validate(consult.status, proposed)?;

        if proposed == ConsultationStatus::Rejected && ctx.reason.is_none() {
            return Err(WorkflowError::MissingRequiredField {
                to: proposed.to_string(),
                field: "rejection_reason",
            });
        }

        let from = consult.status;
        consult.status = proposed;
        consult.updated_at = ctx.now;
        match proposed {
            ConsultationStatus::Approved => consult.decided_at = Some(ctx.now),
            ConsultationStatus::Rejected => {
                consult.decided_at = Some(ctx.now);
                consult.rejection_reason = ctx.reason.clone();
            }
            _ => {}
        }

        self.record(
            id.clone(),
            WorkflowKind::Consultation,
            from.to_string(),
            proposed.to_string(),
            &ctx,
            false,
        );
        tracing::info!(
            entity_id = %id,
            from = %from,
            to = %proposed,
            "Consultation transition applied"
        );
        self.store.put(consult.clone().into());
        Ok(consult)
    }

    /// Apply a validated lab order transition, stamping the entered
    /// stage's timestamp if it is vacant.
    pub fn transition_lab_order(
        &mut self,
        id: &EntityId,
        proposed: LabOrderStatus,
        ctx: TransitionContext,
    ) -> WorkflowResult<LabOrderSnapshot> {
        let mut order = self.fetch_lab_order(id)?;
        self.lab_orders.validate(order.status, proposed)?;

        let from = order.status;
        order.status = proposed;
        order.updated_at = ctx.now;
        if let Some(stage) = LabOrderSnapshot::entry_stage(proposed) {
            order.stamp_stage(stage, ctx.now);
        }

        self.record(
            id.clone(),
            WorkflowKind::LabOrder,
            from.to_string(),
            proposed.to_string(),
            &ctx,
            false,
        );
        tracing::info!(
            entity_id = %id,
            from = %from,
            to = %proposed,
            "Lab order transition applied"
        );
        self.store.put(order.clone().into());
        Ok(order)
    }

    // ── Admin overrides ──────────────────────────────────────────────

    /// Force a consultation status outside the transition table.
    ///
    /// The explicit escape hatch for human correction; bypasses the
    /// legality check and is audited as an override.
    pub fn admin_override_consultation(
        &mut self,
        id: &EntityId,
        status: ConsultationStatus,
        ctx: TransitionContext,
    ) -> WorkflowResult<ConsultationSnapshot> {
        let mut consult = self.fetch_consultation(id)?;
        let from = consult.status;
        consult.status = status;
        consult.updated_at = ctx.now;

        self.record(
            id.clone(),
            WorkflowKind::Consultation,
            from.to_string(),
            status.to_string(),
            &ctx,
            true,
        );
        tracing::warn!(
            entity_id = %id,
            from = %from,
            to = %status,
            "Consultation status overridden"
        );
        self.store.put(consult.clone().into());
        Ok(consult)
    }

    /// Force a lab order status and clear the named stage timestamps.
    ///
    /// The only path that ever clears a stamped stage.
    pub fn admin_override_lab_order(
        &mut self,
        id: &EntityId,
        status: LabOrderStatus,
        clear: &[StageField],
        ctx: TransitionContext,
    ) -> WorkflowResult<LabOrderSnapshot> {
        let mut order = self.fetch_lab_order(id)?;
        let from = order.status;
        order.status = status;
        order.updated_at = ctx.now;
        for field in clear {
            order.clear_stage(*field);
        }

        self.record(
            id.clone(),
            WorkflowKind::LabOrder,
            from.to_string(),
            status.to_string(),
            &ctx,
            true,
        );
        tracing::warn!(
            entity_id = %id,
            from = %from,
            to = %status,
            cleared = clear.len(),
            "Lab order status overridden"
        );
        self.store.put(order.clone().into());
        Ok(order)
    }

    // ── Read-side projections ────────────────────────────────────────

    /// SLA classification for one entity at the instant `now`.
    pub fn evaluate_at(&self, id: &EntityId, now: DateTime<Utc>) -> WorkflowResult<SlaInfo> {
        let snapshot = self.get(id)?;
        Ok(self.calculator.evaluate(&snapshot, now))
    }

    /// SLA classification for one entity, `now` sampled once.
    pub fn evaluate(&self, id: &EntityId) -> WorkflowResult<SlaInfo> {
        self.evaluate_at(id, Utc::now())
    }

    /// The ranked escalation queue at the instant `now`.
    pub fn list_escalations_at(&self, now: DateTime<Utc>) -> Vec<Escalation> {
        self.ranker.list_escalations(&self.store, &self.calculator, now)
    }

    /// The ranked escalation queue, `now` sampled once.
    pub fn list_escalations(&self) -> Vec<Escalation> {
        self.list_escalations_at(Utc::now())
    }

    /// Population-wide breach total at the instant `now`.
    pub fn count_breaches_at(&self, now: DateTime<Utc>) -> usize {
        self.counter
            .count_breaches(&self.store, self.calculator.policy(), now)
    }

    /// Population-wide breach total, `now` sampled once.
    pub fn count_breaches(&self) -> usize {
        self.count_breaches_at(Utc::now())
    }

    /// Per-rule breach counts at the instant `now`.
    pub fn breach_summary_at(&self, now: DateTime<Utc>) -> BreachSummary {
        self.counter
            .breach_summary(&self.store, self.calculator.policy(), now)
    }

    /// Per-rule breach counts, `now` sampled once.
    pub fn breach_summary(&self) -> BreachSummary {
        self.breach_summary_at(Utc::now())
    }

    /// The audit trail of accepted transitions and overrides.
    pub fn audit_log(&self) -> &[TransitionRecord] {
        &self.audit
    }

    /// Direct access to the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn fetch_consultation(&self, id: &EntityId) -> WorkflowResult<ConsultationSnapshot> {
        match self.get(id)? {
            WorkflowSnapshot::Consultation(c) => Ok(c),
            other => Err(WorkflowError::WrongWorkflow {
                id: id.clone(),
                expected: WorkflowKind::Consultation.to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }

    fn fetch_lab_order(&self, id: &EntityId) -> WorkflowResult<LabOrderSnapshot> {
        match self.get(id)? {
            WorkflowSnapshot::LabOrder(o) => Ok(o),
            other => Err(WorkflowError::WrongWorkflow {
                id: id.clone(),
                expected: WorkflowKind::LabOrder.to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }

    fn record(
        &mut self,
        entity_id: EntityId,
        kind: WorkflowKind,
        from: String,
        to: String,
        ctx: &TransitionContext,
        admin_override: bool,
    ) {
        self.audit.push(TransitionRecord {
            sequence: self.audit.len() as u64,
            entity_id,
            kind,
            from,
            to,
            actor: ctx.actor.clone(),
            reason: ctx.reason.clone(),
            admin_override,
            occurred_at: ctx.now,
        });
    }
}
