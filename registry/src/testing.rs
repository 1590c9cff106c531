//! In-memory [`VisualFactory`] that records every spawn and disposal.
//!
//! Enabled through the `test_factory` feature so system crates can assert on
//! visual lifecycles without a rendering backend.

use std::collections::BTreeSet;

use crate::{VisualClass, VisualFactory, VisualTarget};

/// Handle issued by the [`RecordingFactory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordedHandle(u32);

impl RecordedHandle {
    /// Sequence number of the spawn that produced the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Factory that hands out sequential handles and keeps a lifecycle log.
#[derive(Clone, Debug, Default)]
pub struct RecordingFactory {
    next: u32,
    unsupported: BTreeSet<VisualClass>,
    spawned: Vec<(VisualClass, RecordedHandle, VisualTarget)>,
    disposed: Vec<RecordedHandle>,
    live: BTreeSet<RecordedHandle>,
}

impl RecordingFactory {
    /// Creates a factory that supports every class.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes support for the provided class.
    #[must_use]
    pub fn without(mut self, class: VisualClass) -> Self {
        let _ = self.unsupported.insert(class);
        self
    }

    /// Every spawn observed so far, in order.
    #[must_use]
    pub fn spawned(&self) -> &[(VisualClass, RecordedHandle, VisualTarget)] {
        &self.spawned
    }

    /// Number of spawns observed for the provided class.
    #[must_use]
    pub fn spawn_count(&self, class: VisualClass) -> usize {
        self.spawned
            .iter()
            .filter(|(spawned_class, _, _)| *spawned_class == class)
            .count()
    }

    /// Every disposal observed so far, in order.
    #[must_use]
    pub fn disposed(&self) -> &[RecordedHandle] {
        &self.disposed
    }

    /// Number of visuals spawned and not yet disposed.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Reports whether the handle was spawned and not yet disposed.
    #[must_use]
    pub fn is_live(&self, handle: RecordedHandle) -> bool {
        self.live.contains(&handle)
    }
}

impl VisualFactory for RecordingFactory {
    type Handle = RecordedHandle;

    fn supports(&self, class: VisualClass) -> bool {
        !self.unsupported.contains(&class)
    }

    fn spawn(&mut self, class: VisualClass, target: &VisualTarget) -> Self::Handle {
        let handle = RecordedHandle(self.next);
        self.next = self.next.wrapping_add(1);
        self.spawned.push((class, handle, *target));
        let _ = self.live.insert(handle);
        handle
    }

    fn dispose(&mut self, handle: Self::Handle) {
        let _ = self.live.remove(&handle);
        self.disposed.push(handle);
    }
}
