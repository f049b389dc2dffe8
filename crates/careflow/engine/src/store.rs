//! The persistence seam.
//!
//! The engine computes; the store reads and writes. [`SnapshotStore`]
//! exposes exactly the query shapes the engine needs: fetch one entity,
//! list the in-flight population, and the per-rule breach count filter
//! (`status == X AND anchor <= cutoff`), which a real backend answers
//! with an indexed count instead of materializing records.
//!
//! [`InMemoryStore`] backs tests and reference usage.

use careflow_types::{EntityId, SlaSubject, StageField, StatusKey, WorkflowSnapshot};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Storage operations the engine is written against
pub trait SnapshotStore {
    /// Fetch one entity by id.
    fn get(&self, id: &EntityId) -> Option<WorkflowSnapshot>;

    /// Insert or replace an entity.
    fn put(&mut self, snapshot: WorkflowSnapshot);

    /// Every non-terminal entity across both workflows.
    fn in_flight(&self) -> Vec<WorkflowSnapshot>;

    /// Count entities in `status` whose `anchor` stage timestamp is set
    /// and at or before `cutoff`.
    fn count_anchored_at_or_before(
        &self,
        status: StatusKey,
        anchor: StageField,
        cutoff: DateTime<Utc>,
    ) -> usize;
}

/// Map-backed store for tests and in-process reference use
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    entities: BTreeMap<EntityId, WorkflowSnapshot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl SnapshotStore for InMemoryStore {
    fn get(&self, id: &EntityId) -> Option<WorkflowSnapshot> {
        self.entities.get(id).cloned()
    }

    fn put(&mut self, snapshot: WorkflowSnapshot) {
        self.entities.insert(snapshot.id().clone(), snapshot);
    }

    fn in_flight(&self) -> Vec<WorkflowSnapshot> {
        self.entities
            .values()
            .filter(|e| !e.is_terminal())
            .cloned()
            .collect()
    }

    fn count_anchored_at_or_before(
        &self,
        status: StatusKey,
        anchor: StageField,
        cutoff: DateTime<Utc>,
    ) -> usize {
        self.entities
            .values()
            .filter(|e| e.status_key() == status)
            .filter_map(|e| e.stage_timestamp(anchor))
            .filter(|at| *at <= cutoff)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careflow_types::{ConsultationSnapshot, ConsultationStatus, LabOrderSnapshot, LabOrderStatus};
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_put_get_replace() {
        let mut store = InMemoryStore::new();
        let now = base_time();

        let order = LabOrderSnapshot::new(EntityId::new("lab-1"), now);
        store.put(order.into());
        assert_eq!(store.len(), 1);

        let mut updated = store
            .get(&EntityId::new("lab-1"))
            .unwrap()
            .as_lab_order()
            .unwrap()
            .clone();
        updated.status = LabOrderStatus::SlotBooked;
        store.put(updated.into());

        assert_eq!(store.len(), 1);
        let fetched = store.get(&EntityId::new("lab-1")).unwrap();
        assert_eq!(
            fetched.as_lab_order().unwrap().status,
            LabOrderStatus::SlotBooked
        );
    }

    #[test]
    fn test_in_flight_excludes_terminal() {
        let mut store = InMemoryStore::new();
        let now = base_time();

        store.put(LabOrderSnapshot::new(EntityId::new("lab-1"), now).into());

        let mut cancelled = LabOrderSnapshot::new(EntityId::new("lab-2"), now);
        cancelled.status = LabOrderStatus::Cancelled;
        store.put(cancelled.into());

        let mut approved = ConsultationSnapshot::new(EntityId::new("c-1"), now);
        approved.status = ConsultationStatus::Approved;
        store.put(approved.into());

        store.put(ConsultationSnapshot::new(EntityId::new("c-2"), now).into());

        let in_flight = store.in_flight();
        assert_eq!(in_flight.len(), 2);
        assert!(in_flight
            .iter()
            .all(|e| !e.is_terminal()));
    }

    #[test]
    fn test_count_filter_is_inclusive_at_cutoff() {
        let mut store = InMemoryStore::new();
        let cutoff = base_time();

        // Exactly at the cutoff: counted.
        store.put(LabOrderSnapshot::new(EntityId::new("lab-1"), cutoff).into());
        // Before the cutoff: counted.
        store.put(
            LabOrderSnapshot::new(EntityId::new("lab-2"), cutoff - Duration::hours(1)).into(),
        );
        // After the cutoff: not counted.
        store.put(
            LabOrderSnapshot::new(EntityId::new("lab-3"), cutoff + Duration::milliseconds(1))
                .into(),
        );
        // Wrong status: not counted.
        let mut booked = LabOrderSnapshot::new(EntityId::new("lab-4"), cutoff);
        booked.status = LabOrderStatus::SlotBooked;
        store.put(booked.into());

        let count = store.count_anchored_at_or_before(
            LabOrderStatus::Ordered.into(),
            StageField::OrderedAt,
            cutoff,
        );
        assert_eq!(count, 2);
    }

    #[test]
    fn test_count_ignores_null_anchors() {
        let mut store = InMemoryStore::new();
        let now = base_time();

        let mut order = LabOrderSnapshot::new(EntityId::new("lab-1"), now - Duration::days(10));
        order.status = LabOrderStatus::SlotBooked;
        // slot_booked_at never stamped.
        store.put(order.into());

        let count = store.count_anchored_at_or_before(
            LabOrderStatus::SlotBooked.into(),
            StageField::SlotBookedAt,
            now,
        );
        assert_eq!(count, 0);
    }
}
