//=========================================================================
// Object Pool
//=========================================================================
//
// Reusable instances keyed by template, with spawn/despawn notification.
//
// Architecture:
//   ObjectPool<K, O>
//     └─ pools: HashMap<K, Pool>
//          ├─ template: PoolTemplate (factory, initial amount, growth)
//          └─ queue: VecDeque<PoolHandle>   (Available instances)
//
// Lifecycle of an instance:
//
//   create ──> Available ──try_acquire()──> Active ──release()──┐
//                 ↑                                            │
//                 └────────────────────────────────────────────┘
//
// Every instance is owned by exactly one pool and never leaves these two
// states once created.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

//=== Module Declarations =================================================

mod error;
mod instance;
mod object_pool;
mod template;

//=== Public API ==========================================================

pub use error::PoolError;
pub use instance::{InstanceState, PoolHandle, PoolInstance};
pub use object_pool::ObjectPool;
pub use template::{Growth, PoolTemplate};

//=== Pool Key Trait ======================================================

/// Identity of a pool template.
///
/// Automatically implemented for every hashable, debuggable key type, so
/// game enums and plain strings both work.
pub trait PoolKey: Clone + Eq + Hash + Debug + 'static {}

impl<T: Clone + Eq + Hash + Debug + 'static> PoolKey for T {}

//=== Poolable Trait ======================================================

/// Host object that can live inside an [`ObjectPool`].
pub trait Poolable: 'static {
    /// Activates or deactivates the object in the host.
    fn set_active(&mut self, active: bool);

    /// Listeners attached to this object and its sub-objects.
    ///
    /// Queried when the instance is created and again on
    /// [`PoolInstance::refresh_listeners`]. Order is notification order.
    fn listeners(&self) -> Vec<Rc<RefCell<dyn PoolListener>>> {
        Vec::new()
    }
}

//=== Pool Listener Trait =================================================

/// Receives spawn/despawn notifications for a pooled instance.
pub trait PoolListener {
    /// Called after the instance has been taken from the pool and activated.
    fn on_spawned(&mut self) {}

    /// Called after the instance has been deactivated, before it is queued.
    fn on_despawned(&mut self) {}
}
