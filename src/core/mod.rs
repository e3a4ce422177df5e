//=========================================================================
// Core Systems
//=========================================================================
//
// Single-threaded gameplay subsystems.
//
//   time      shared Phase / FrameTime vocabulary
//   dispatch  per-phase managed updates
//   pool      template-keyed object reuse
//   fsm       flat state machines, dispatchable as subscribers
//
// Subsystems take `&self` where callbacks may re-enter them and never hold
// a borrow across a host callback.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod dispatch;
pub mod fsm;
pub mod pool;
pub mod time;

//=== Public API ==========================================================

pub use dispatch::{PhaseReport, UpdateDispatcher};
pub use fsm::{State, StateId, StateMachine};
pub use pool::{ObjectPool, PoolHandle, PoolTemplate};
pub use time::{FrameTime, Phase};
