//! Component lifecycle tracking: mount, update, unmount.
//!
//! The `LifecycleTracker` records which components are mounted and queues
//! lifecycle events (`Mount`, `Update`, `Unmount`) that can be drained for
//! inspection.

use std::collections::HashSet;

use super::ComponentId;

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// Events that occur during a component's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// First successful render.
    Mount(ComponentId),
    /// A later successful render.
    Update(ComponentId),
    /// The component was torn down.
    Unmount(ComponentId),
}

// ---------------------------------------------------------------------------
// LifecycleTracker
// ---------------------------------------------------------------------------

/// Tracks mounted components and accumulates lifecycle events.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    mounted: HashSet<ComponentId>,
    pending: Vec<LifecycleEvent>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mount. Returns `false` (and records nothing) if already mounted.
    pub fn on_mount(&mut self, id: ComponentId) -> bool {
        let first = self.mounted.insert(id);
        if first {
            self.pending.push(LifecycleEvent::Mount(id));
        }
        first
    }

    /// Record an update of a mounted component.
    pub fn on_update(&mut self, id: ComponentId) {
        if self.mounted.contains(&id) {
            self.pending.push(LifecycleEvent::Update(id));
        }
    }

    /// Record an unmount. Components that never mounted produce no event.
    pub fn on_unmount(&mut self, id: ComponentId) {
        if self.mounted.remove(&id) {
            self.pending.push(LifecycleEvent::Unmount(id));
        }
    }

    pub fn is_mounted(&self, id: ComponentId) -> bool {
        self.mounted.contains(&id)
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    /// Drain pending events, oldest first.
    pub fn drain(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
