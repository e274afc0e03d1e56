use bevy::prelude::*;
use constants::editor_settings::{BASE_FOOTPRINT_SIZE, MARKER_LIE_FLAT_OFFSET};

/// Stable identifier for a roof marker, unique for the marker's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoofType {
    #[default]
    Flat,
    DualPitch,
}

/// Snapshot of a marker's committed transform state. This is the unit of
/// synchronised state between the plan-view controllers and any observer
/// (the 3D volume builder, the dimensions readout).
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerTransform {
    pub id: MarkerId,
    pub roof_type: RoofType,
    pub position: Vec3,
    pub rotation_y: f32,
    pub scale_x: f32,
    pub scale_z: f32,
    pub width_meters: f32,
    pub height_meters: f32,
    pub is_resizing: bool,
    pub is_selected: bool,
}

impl MarkerTransform {
    pub fn new(id: MarkerId, roof_type: RoofType, ground_point: Vec3) -> Self {
        Self {
            id,
            roof_type,
            position: Vec3::new(
                ground_point.x,
                ground_point.y + MARKER_LIE_FLAT_OFFSET,
                ground_point.z,
            ),
            rotation_y: 0.0,
            scale_x: 1.0,
            scale_z: 1.0,
            width_meters: BASE_FOOTPRINT_SIZE,
            height_meters: BASE_FOOTPRINT_SIZE,
            is_resizing: false,
            is_selected: false,
        }
    }

    /// Set both scale factors, keeping the derived metre dimensions consistent.
    pub fn set_scale(&mut self, scale_x: f32, scale_z: f32) {
        self.scale_x = scale_x;
        self.scale_z = scale_z;
        self.width_meters = scale_x * BASE_FOOTPRINT_SIZE;
        self.height_meters = scale_z * BASE_FOOTPRINT_SIZE;
    }
}

pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(Vec<MarkerTransform>) + Send + Sync>;

/// Central store mapping marker id to transform snapshot, with coarse-grained
/// publish/subscribe. Constructed explicitly per editor session so independent
/// instances (in tests, or multiple editors) never interfere.
///
/// Every mutation broadcasts an independently-owned copy of the full marker
/// list to each listener in registration order. `upsert` has full-replacement
/// semantics; field-level merging is deliberately not supported.
#[derive(Default)]
pub struct TransformStore {
    markers: Vec<MarkerTransform>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl TransformStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It immediately receives the current snapshot and
    /// then one per mutation until unsubscribed.
    pub fn subscribe(&mut self, mut listener: Listener) -> SubscriptionId {
        listener(self.markers.clone());
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.listeners.retain(|(id, _)| *id != subscription);
    }

    /// Replace the entry with matching id, or append if absent.
    pub fn upsert(&mut self, transform: MarkerTransform) {
        match self.markers.iter_mut().find(|m| m.id == transform.id) {
            Some(existing) => *existing = transform,
            None => self.markers.push(transform),
        }
        self.broadcast();
    }

    pub fn remove(&mut self, id: MarkerId) {
        self.markers.retain(|m| m.id != id);
        self.broadcast();
    }

    pub fn clear(&mut self) {
        self.markers.clear();
        self.broadcast();
    }

    /// Set `is_selected` on exactly the matching entry, clearing it elsewhere.
    pub fn select(&mut self, id: Option<MarkerId>) {
        for marker in &mut self.markers {
            marker.is_selected = Some(marker.id) == id;
        }
        self.broadcast();
    }

    pub fn get(&self, id: MarkerId) -> Option<&MarkerTransform> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn selected(&self) -> Option<&MarkerTransform> {
        self.markers.iter().find(|m| m.is_selected)
    }

    pub fn snapshot(&self) -> Vec<MarkerTransform> {
        self.markers.clone()
    }

    fn broadcast(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(self.markers.clone());
        }
    }
}

/// The per-session store, owned by the ECS.
#[derive(Resource, Default)]
pub struct MarkerStore(pub TransformStore);

impl std::ops::Deref for MarkerStore {
    type Target = TransformStore;
    fn deref(&self) -> &TransformStore {
        &self.0
    }
}

impl std::ops::DerefMut for MarkerStore {
    fn deref_mut(&mut self) -> &mut TransformStore {
        &mut self.0
    }
}

/// Monotonic id allocation for newly placed markers.
#[derive(Resource, Default)]
pub struct MarkerIdAllocator {
    next: u32,
}

impl MarkerIdAllocator {
    pub fn allocate(&mut self) -> MarkerId {
        let id = MarkerId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn marker(id: u32) -> MarkerTransform {
        MarkerTransform::new(MarkerId(id), RoofType::Flat, Vec3::ZERO)
    }

    #[test]
    fn subscribe_delivers_current_snapshot_immediately() {
        let mut store = TransformStore::new();
        store.upsert(marker(1));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(Box::new(move |snapshot| {
            sink.lock().unwrap().push(snapshot);
        }));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[0][0].id, MarkerId(1));
    }

    #[test]
    fn upsert_is_full_replacement_not_a_merge() {
        let mut store = TransformStore::new();
        let mut first = marker(1);
        first.is_selected = true;
        first.set_scale(2.0, 3.0);
        store.upsert(first);

        // A later snapshot with default fields must fully replace the entry;
        // nothing from the earlier revision may survive.
        store.upsert(marker(1));

        let current = store.get(MarkerId(1)).unwrap();
        assert!(!current.is_selected);
        assert_eq!(current.scale_x, 1.0);
        assert_eq!(current.scale_z, 1.0);
        assert_eq!(current.width_meters, BASE_FOOTPRINT_SIZE);
    }

    #[test]
    fn select_keeps_at_most_one_entry_selected() {
        let mut store = TransformStore::new();
        store.upsert(marker(1));
        store.upsert(marker(2));
        store.upsert(marker(3));

        for sequence in [
            vec![Some(1), Some(2), Some(2), Some(3)],
            vec![Some(3), None, Some(1)],
            vec![None, None],
        ] {
            let mut last = None;
            for step in sequence {
                last = step.map(MarkerId);
                store.select(last);
                let selected: Vec<_> =
                    store.snapshot().into_iter().filter(|m| m.is_selected).collect();
                assert!(selected.len() <= 1);
                assert_eq!(selected.first().map(|m| m.id), last);
            }
        }
    }

    #[test]
    fn broadcast_snapshots_are_isolated_from_listener_mutation() {
        let mut store = TransformStore::new();
        store.upsert(marker(1));

        store.subscribe(Box::new(|mut snapshot| {
            for m in &mut snapshot {
                m.set_scale(99.0, 99.0);
                m.is_selected = true;
            }
        }));
        store.select(None); // trigger a broadcast through the mutating listener

        // A fresh subscription must still observe the original values.
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(Box::new(move |snapshot| {
            sink.lock().unwrap().push(snapshot);
        }));
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0][0].scale_x, 1.0);
        assert!(!seen[0][0].is_selected);
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let mut store = TransformStore::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let sink = order.clone();
            store.subscribe(Box::new(move |_| {
                sink.lock().unwrap().push(tag);
            }));
        }
        order.lock().unwrap().clear();
        store.upsert(marker(1));

        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut store = TransformStore::new();
        let count = Arc::new(Mutex::new(0usize));
        let sink = count.clone();
        let sub = store.subscribe(Box::new(move |_| {
            *sink.lock().unwrap() += 1;
        }));
        store.unsubscribe(sub);
        store.upsert(marker(1));
        assert_eq!(*count.lock().unwrap(), 1); // only the immediate delivery
    }

    #[test]
    fn remove_and_clear_drop_entries_and_broadcast() {
        let mut store = TransformStore::new();
        store.upsert(marker(1));
        store.upsert(marker(2));

        store.remove(MarkerId(1));
        assert!(store.get(MarkerId(1)).is_none());
        assert!(store.get(MarkerId(2)).is_some());

        store.clear();
        assert!(store.snapshot().is_empty());
    }
}
