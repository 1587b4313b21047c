//! Host callbacks invoked around a generation pass.

use crate::geometry::Aabb;

/// Lifecycle signal emitted by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSignal {
    Started { floor: u32 },
    Completed { floor: u32, success: bool },
}

/// Callbacks the host game implements. Every method defaults to a no-op.
pub trait GenerationHooks {
    fn on_signal(&mut self, _signal: GenerationSignal) {}

    /// Rebuild navigation over `bounds` grown by `padding`. Called once after
    /// a successful pass.
    fn rebuild_navigation(&mut self, _bounds: &Aabb, _padding: f32) {}
}

/// Hooks that ignore everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl GenerationHooks for NoopHooks {}

/// Hooks that record what they receive, for tests and the harness
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
    pub signals: Vec<GenerationSignal>,
    pub navigation_rebuilds: Vec<(Aabb, f32)>,
}

impl GenerationHooks for RecordingHooks {
    fn on_signal(&mut self, signal: GenerationSignal) {
        self.signals.push(signal);
    }

    fn rebuild_navigation(&mut self, bounds: &Aabb, padding: f32) {
        self.navigation_rebuilds.push((*bounds, padding));
    }
}
