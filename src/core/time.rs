//=========================================================================
// Frame Time
//=========================================================================
//
// Shared frame vocabulary for every subsystem driven by the frame loop.
//
// A frame is split into three ordered phases:
//
//   PreStep ──> Step (0..n fixed steps) ──> PostStep
//
// Callbacks receive a `FrameTime` instead of reaching for a global clock.
//
//=========================================================================

//=== Phase ===============================================================

/// One of the three ordered per-frame execution points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Variable-rate update, runs before physics.
    PreStep,

    /// Fixed-rate physics update.
    Step,

    /// Variable-rate update, runs after physics.
    PostStep,
}

impl Phase {
    /// All phases in frame order.
    pub const ALL: [Phase; 3] = [Phase::PreStep, Phase::Step, Phase::PostStep];

    /// Position of the phase inside a frame (0, 1, 2).
    pub const fn index(self) -> usize {
        match self {
            Phase::PreStep => 0,
            Phase::Step => 1,
            Phase::PostStep => 2,
        }
    }
}

//=== FrameTime ===========================================================

/// Timing snapshot handed to every phase callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Monotonic frame counter, starting at 0 for the first frame.
    pub frame: u64,

    /// Seconds since the previous frame (variable-rate phases).
    pub delta: f64,

    /// Seconds per fixed step (physics phase).
    pub fixed_delta: f64,

    /// Seconds accumulated since the loop started.
    pub elapsed: f64,
}

impl FrameTime {
    /// Frame time for hosts driving phases by hand with a constant delta.
    pub fn fixed(frame: u64, delta: f64) -> Self {
        Self {
            frame,
            delta,
            fixed_delta: delta,
            elapsed: frame as f64 * delta,
        }
    }

    /// Delta relevant to the given phase.
    pub fn delta_for(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Step => self.fixed_delta,
            Phase::PreStep | Phase::PostStep => self.delta,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
