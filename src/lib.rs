//=========================================================================
// Tickwork Library Root
//
// Frame-driven gameplay toolkit: managed update dispatch, object pooling
// and flat state machines, plus a frame loop to drive them.
//
// Typical usage:
// ```no_run
// use tickwork::prelude::*;
//
// fn main() {
//     let dispatcher = UpdateDispatcher::new();
//     let (_signals, receiver) = crossbeam_channel::unbounded();
//     FrameLoopBuilder::new().build().run(&dispatcher, receiver);
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the subsystems themselves. They are single-threaded and
// know nothing about how frames are produced.
//
pub mod core;

// `runtime` is the host clock: it turns wall time into ordered phases
// and listens for control signals from other threads.
//
pub mod runtime;

pub mod prelude;

//--- Public Exports ------------------------------------------------------

pub use runtime::{FrameLoop, FrameLoopBuilder, HostSignal};
