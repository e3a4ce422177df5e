//=========================================================================
// Frame Loop
//
// Host-side clock that drives an `UpdateDispatcher` through its phases.
//
// Architecture:
// ```text
//     FrameLoopBuilder  ──build()──>  FrameLoop  ──run()──>  [paced ticks]
//         │                               │
//         ├─ with_tps()                   ├─ advance(): one frame by hand
//         ├─ with_fixed_step()            └─ run(): blocks until Shutdown
//         └─ with_max_fixed_steps()
// ```
//
// Each frame: PreStep once, Step once per whole fixed step accumulated
// (capped), PostStep once.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use log::{info, warn};

//=== Internal Dependencies ===============================================

use crate::core::dispatch::UpdateDispatcher;
use crate::core::time::{FrameTime, Phase};
use signal::{SignalCollector, TickControl};

//=== Module Declarations =================================================

mod signal;

//=== Public API ==========================================================

pub use signal::HostSignal;

//=== FrameLoopBuilder ====================================================

/// Builder for configuring a [`FrameLoop`].
///
/// # Default Values
///
/// - **TPS**: 60.0 (frames per second targeted by `run`)
/// - **Fixed step**: 1/50 s
/// - **Max fixed steps**: 8 per frame
///
/// # Examples
///
/// ```rust
/// use tickwork::prelude::*;
///
/// let frame_loop = FrameLoopBuilder::new()
///     .with_tps(120.0)
///     .with_fixed_step(1.0 / 100.0)
///     .build();
///
/// assert_eq!(frame_loop.frame(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct FrameLoopBuilder {
    tps: f64,
    fixed_step: f64,
    max_fixed_steps: u32,
}

impl FrameLoopBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            tps: 60.0,
            fixed_step: 1.0 / 50.0,
            max_fixed_steps: 8,
        }
    }

    /// Sets the target frames per second for [`FrameLoop::run`].
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.tps = tps;
        self
    }

    /// Sets the physics step length in seconds.
    ///
    /// # Panics
    ///
    /// Panics if `seconds <= 0.0`.
    pub fn with_fixed_step(mut self, seconds: f64) -> Self {
        assert!(seconds > 0.0, "Fixed step must be positive, got {}", seconds);
        self.fixed_step = seconds;
        self
    }

    /// Caps the physics steps run in one frame. Time beyond the cap is
    /// dropped rather than carried over.
    ///
    /// # Panics
    ///
    /// Panics if `steps == 0`.
    pub fn with_max_fixed_steps(mut self, steps: u32) -> Self {
        assert!(steps > 0, "Max fixed steps must be positive");
        self.max_fixed_steps = steps;
        self
    }

    pub fn build(self) -> FrameLoop {
        info!(
            "Building frame loop (TPS: {}, fixed step: {}s, max steps: {})",
            self.tps, self.fixed_step, self.max_fixed_steps
        );

        FrameLoop {
            tps: self.tps,
            fixed_step: self.fixed_step,
            max_fixed_steps: self.max_fixed_steps,
            frame: 0,
            elapsed: 0.0,
            accumulator: 0.0,
        }
    }
}

impl Default for FrameLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== FrameLoop ===========================================================

/// Frame clock for an [`UpdateDispatcher`].
#[derive(Debug)]
pub struct FrameLoop {
    tps: f64,
    fixed_step: f64,
    max_fixed_steps: u32,
    frame: u64,
    elapsed: f64,
    accumulator: f64,
}

impl FrameLoop {
    //--- Execution --------------------------------------------------------

    /// Runs one frame with the given variable delta in seconds.
    ///
    /// Negative deltas are treated as zero.
    pub fn advance(&mut self, dispatcher: &UpdateDispatcher, delta: f64) -> FrameTime {
        let delta = delta.max(0.0);
        self.elapsed += delta;
        self.accumulator += delta;

        let time = FrameTime {
            frame: self.frame,
            delta,
            fixed_delta: self.fixed_step,
            elapsed: self.elapsed,
        };

        dispatcher.run_phase(Phase::PreStep, &time);

        let mut steps = 0;
        while self.accumulator >= self.fixed_step && steps < self.max_fixed_steps {
            dispatcher.run_phase(Phase::Step, &time);
            self.accumulator -= self.fixed_step;
            steps += 1;
        }

        if self.accumulator >= self.fixed_step {
            warn!(
                "Frame {}: physics capped at {} steps, dropping {:.3}s",
                self.frame,
                self.max_fixed_steps,
                self.accumulator - self.accumulator % self.fixed_step
            );
            self.accumulator %= self.fixed_step;
        }

        dispatcher.run_phase(Phase::PostStep, &time);

        self.frame += 1;
        time
    }

    /// Drives `dispatcher` at the configured TPS until a
    /// [`HostSignal::Shutdown`] arrives or every sender is dropped.
    ///
    /// Paused frames still drain signals but skip dispatch, and paused time
    /// is not fed to the physics accumulator.
    pub fn run(&mut self, dispatcher: &UpdateDispatcher, signals: Receiver<HostSignal>) {
        info!("Starting frame loop (TPS: {})", self.tps);

        let frame_duration = Duration::from_secs_f64(1.0 / self.tps);
        let mut collector = SignalCollector::new(signals);
        let mut last_tick = Instant::now();

        loop {
            let frame_start = Instant::now();

            //--- Step 1: Apply host signals -------------------------------
            if collector.collect_frame() == TickControl::Exit {
                info!("Frame loop exiting after {} frames", self.frame);
                break;
            }

            //--- Step 2: Dispatch phases ----------------------------------
            let delta = frame_start.duration_since(last_tick).as_secs_f64();
            last_tick = frame_start;

            if !collector.is_paused() {
                self.advance(dispatcher, delta);
            }

            //--- Step 3: Maintain pacing ----------------------------------
            let spent = frame_start.elapsed();
            if spent < frame_duration {
                thread::sleep(frame_duration - spent);
            }
        }
    }

    //--- Query API --------------------------------------------------------

    /// Frames advanced so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Seconds of frame time fed to the loop so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn tps(&self) -> f64 {
        self.tps
    }

    pub fn fixed_step(&self) -> f64 {
        self.fixed_step
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
