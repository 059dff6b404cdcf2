//! In-memory surface provider
//!
//! Serves a caller-supplied list of descriptors. Used for tests, for replaying
//! captured layouts, and for embedding the engine where surfaces come from
//! somewhere other than the native window system.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::surface::{assign_z_order, SurfaceDescriptor};
use crate::platform::{ProviderError, SurfaceProvider};

#[derive(Debug, Default)]
struct SnapshotState {
    surfaces: Vec<SurfaceDescriptor>,
    failure: Option<ProviderError>,
    reads: usize,
}

/// Provider returning a replaceable snapshot
///
/// Clones share the same snapshot, so a test can hold one clone while a
/// calculator or watcher owns another and observe updates between calls.
#[derive(Debug, Clone, Default)]
pub struct SnapshotProvider {
    state: Arc<Mutex<SnapshotState>>,
}

impl SnapshotProvider {
    /// Creates a provider serving `surfaces`, front to back
    pub fn new(surfaces: Vec<SurfaceDescriptor>) -> Self {
        let provider = Self::default();
        provider.replace(surfaces);
        provider
    }

    /// Replaces the snapshot; `z_index` is renumbered from position
    pub fn replace(&self, mut surfaces: Vec<SurfaceDescriptor>) {
        assign_z_order(&mut surfaces);
        self.lock().surfaces = surfaces;
    }

    /// Applies `update` to the current snapshot in place
    pub fn update<F>(&self, update: F)
    where
        F: FnOnce(&mut Vec<SurfaceDescriptor>),
    {
        let mut state = self.lock();
        update(&mut state.surfaces);
        assign_z_order(&mut state.surfaces);
    }

    /// Makes every following read fail with `error` until cleared
    pub fn fail_with(&self, error: ProviderError) {
        self.lock().failure = Some(error);
    }

    /// Clears a failure set by [`SnapshotProvider::fail_with`]
    pub fn clear_failure(&self) {
        self.lock().failure = None;
    }

    /// Number of times the snapshot has been read
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    fn lock(&self) -> MutexGuard<'_, SnapshotState> {
        // State stays consistent even if a holder panicked
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SurfaceProvider for SnapshotProvider {
    fn all_surfaces(&self) -> Result<Vec<SurfaceDescriptor>, ProviderError> {
        let mut state = self.lock();
        state.reads += 1;
        if let Some(error) = &state.failure {
            return Err(error.clone());
        }
        Ok(state.surfaces.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::core::Rect;

    fn surface(id: u64) -> SurfaceDescriptor {
        SurfaceDescriptor::new(id, Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn serves_surfaces_in_order_with_z_index() {
        let provider = SnapshotProvider::new(vec![surface(3), surface(1), surface(2)]);
        let surfaces = provider.all_surfaces().unwrap();

        let ids: Vec<u64> = surfaces.iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        for (index, surface) in surfaces.iter().enumerate() {
            assert_eq!(surface.z_index, index);
        }
    }

    #[test]
    fn clones_share_snapshot() {
        let provider = SnapshotProvider::new(vec![surface(1)]);
        let observer = provider.clone();

        provider.update(|surfaces| surfaces.insert(0, surface(2)));

        let surfaces = observer.all_surfaces().unwrap();
        assert_eq!(surfaces.len(), 2);
        assert_eq!(surfaces[0].id.0, 2);
        assert_eq!(surfaces[1].z_index, 1);
        assert_eq!(provider.read_count(), 1);
    }

    #[test]
    fn failure_can_be_injected_and_cleared() {
        let provider = SnapshotProvider::new(vec![surface(1)]);
        provider.fail_with(ProviderError::Unavailable {
            reason: "display asleep".to_string(),
        });
        assert!(matches!(
            provider.all_surfaces(),
            Err(ProviderError::Unavailable { .. })
        ));

        provider.clear_failure();
        assert_eq!(provider.all_surfaces().unwrap().len(), 1);
    }
}
