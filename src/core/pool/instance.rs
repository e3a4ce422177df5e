//=========================================================================
// Pool Instance
//=========================================================================
//
// Handle around a pooled object.
//
// Carries the set-once identity of the template it came from, of the
// registration of that template, and of the pool that owns it, the cached listener list, and the Available/Active
// state flag. Handles are shared as `Rc<PoolInstance>`; identity is
// pointer identity.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::{Cell, OnceCell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use log::warn;

//=== Internal Dependencies ===============================================

use super::{ObjectPool, PoolError, PoolKey, PoolListener, Poolable};

//=== InstanceState =======================================================

/// Where an instance currently is in its pool lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Queued inside the pool, ready to be acquired.
    Available,

    /// Checked out by the host.
    Active,
}

//=== PoolInstance ========================================================

/// Shared handle to a pooled instance.
pub type PoolHandle<K, O> = Rc<PoolInstance<K, O>>;

type Listeners = Vec<Rc<RefCell<dyn PoolListener>>>;

/// A pooled object plus its pool bookkeeping.
pub struct PoolInstance<K: PoolKey, O: Poolable> {
    object: RefCell<O>,
    template: OnceCell<K>,
    registration: OnceCell<u64>,
    pool: OnceCell<Weak<ObjectPool<K, O>>>,
    listeners: RefCell<Listeners>,
    state: Cell<InstanceState>,
    return_on_deactivate: Cell<bool>,
}

impl<K: PoolKey, O: Poolable> PoolInstance<K, O> {
    //--- Construction -----------------------------------------------------

    pub(super) fn new(object: O) -> Self {
        let listeners = object.listeners();

        Self {
            object: RefCell::new(object),
            template: OnceCell::new(),
            registration: OnceCell::new(),
            pool: OnceCell::new(),
            listeners: RefCell::new(listeners),
            state: Cell::new(InstanceState::Available),
            return_on_deactivate: Cell::new(true),
        }
    }

    /// Tags the instance with its template key. Ignored once set.
    pub(super) fn set_template(&self, key: K) -> bool {
        self.template.set(key).is_ok()
    }

    /// Records which registration of the template created this instance.
    pub(super) fn set_registration(&self, id: u64) -> bool {
        self.registration.set(id).is_ok()
    }

    /// Binds the instance to its owning pool. Ignored once set.
    pub(super) fn set_pool(&self, pool: Weak<ObjectPool<K, O>>) -> bool {
        self.pool.set(pool).is_ok()
    }

    //--- Accessors --------------------------------------------------------

    /// Key of the template this instance was created from.
    pub fn template(&self) -> Option<&K> {
        self.template.get()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> InstanceState {
        self.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.state.get() == InstanceState::Active
    }

    /// Borrows the wrapped object.
    pub fn object(&self) -> Ref<'_, O> {
        self.object.borrow()
    }

    /// Mutably borrows the wrapped object.
    ///
    /// While this borrow is held, acquiring or releasing the instance fails
    /// with [`PoolError::Busy`].
    pub fn object_mut(&self) -> RefMut<'_, O> {
        self.object.borrow_mut()
    }

    /// Whether host-level deactivation returns the instance to its pool.
    pub fn return_on_deactivate(&self) -> bool {
        self.return_on_deactivate.get()
    }

    pub fn set_return_on_deactivate(&self, enabled: bool) {
        self.return_on_deactivate.set(enabled);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    //--- Listeners --------------------------------------------------------

    /// Re-queries the object for its listeners.
    ///
    /// Call this after attaching or removing listeners post-creation; the
    /// list is cached otherwise.
    pub fn refresh_listeners(&self) {
        let listeners = self.object.borrow().listeners();
        *self.listeners.borrow_mut() = listeners;
    }

    //--- Host Hooks -------------------------------------------------------

    /// Returns this instance to the pool it came from.
    pub fn despawn(self: &Rc<Self>) -> Result<(), PoolError> {
        match self.pool.get().and_then(Weak::upgrade) {
            Some(pool) => pool.release(self),
            None => Err(PoolError::Detached),
        }
    }

    /// Host-level deactivation.
    ///
    /// Deactivates the object and, when [`return_on_deactivate`] is set and
    /// the instance is checked out, returns it to its pool. Does nothing but
    /// warn while the object is borrowed.
    ///
    /// [`return_on_deactivate`]: Self::return_on_deactivate
    pub fn deactivate(self: &Rc<Self>) {
        if self.set_object_active(false).is_err() {
            warn!("Pooled object is borrowed, skipping deactivation");
            return;
        }

        if self.return_on_deactivate.get() && self.is_active() {
            if let Err(e) = self.despawn() {
                warn!("Deactivated instance could not return to its pool: {}", e);
            }
        }
    }

    //--- Pool Internals ---------------------------------------------------

    pub(super) fn belongs_to(&self, pool: &Weak<ObjectPool<K, O>>) -> bool {
        self.pool.get().is_some_and(|own| Weak::ptr_eq(own, pool))
    }

    pub(super) fn registration(&self) -> Option<u64> {
        self.registration.get().copied()
    }

    pub(super) fn set_state(&self, state: InstanceState) {
        self.state.set(state);
    }

    pub(super) fn set_object_active(&self, active: bool) -> Result<(), PoolError> {
        let mut object = self.object.try_borrow_mut().map_err(|_| PoolError::Busy)?;
        object.set_active(active);
        Ok(())
    }

    pub(super) fn notify_spawned(&self) {
        self.notify(|listener| listener.on_spawned());
    }

    pub(super) fn notify_despawned(&self) {
        self.notify(|listener| listener.on_despawned());
    }

    fn notify<F>(&self, mut f: F)
    where
        F: FnMut(&mut dyn PoolListener),
    {
        // Clone the list so listeners may refresh it while being notified
        let listeners: Listeners = self.listeners.borrow().clone();

        for listener in &listeners {
            match listener.try_borrow_mut() {
                Ok(mut guard) => f(&mut *guard),
                Err(_) => warn!("Pool listener is already running, skipping notification"),
            }
        }
    }
}

impl<K: PoolKey, O: Poolable> fmt::Debug for PoolInstance<K, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolInstance")
            .field("template", &self.template.get())
            .field("state", &self.state.get())
            .field("listeners", &self.listener_count())
            .field("return_on_deactivate", &self.return_on_deactivate.get())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Named {
        name: &'static str,
        log: Log,
    }

    impl PoolListener for Named {
        fn on_spawned(&mut self) {
            self.log.borrow_mut().push(format!("{}:spawned", self.name));
        }

        fn on_despawned(&mut self) {
            self.log.borrow_mut().push(format!("{}:despawned", self.name));
        }
    }

    struct Widget {
        listeners: Listeners,
    }

    impl Poolable for Widget {
        fn set_active(&mut self, _active: bool) {}

        fn listeners(&self) -> Vec<Rc<RefCell<dyn PoolListener>>> {
            self.listeners.clone()
        }
    }

    fn listener(name: &'static str, log: &Log) -> Rc<RefCell<dyn PoolListener>> {
        Rc::new(RefCell::new(Named {
            name,
            log: Rc::clone(log),
        }))
    }

    #[test]
    fn new_instance_is_available_and_returns_on_deactivate() {
        let instance = PoolInstance::<&str, Widget>::new(Widget { listeners: vec![] });
        assert_eq!(instance.state(), InstanceState::Available);
        assert!(instance.return_on_deactivate());
        assert!(instance.template().is_none());
    }

    #[test]
    fn template_is_set_once() {
        let instance = PoolInstance::<&str, Widget>::new(Widget { listeners: vec![] });
        assert!(instance.set_template("first"));
        assert!(!instance.set_template("second"));
        assert_eq!(instance.template(), Some(&"first"));
    }

    #[test]
    fn notifications_follow_discovery_order() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let instance = PoolInstance::<&str, Widget>::new(Widget {
            listeners: vec![listener("a", &log), listener("b", &log)],
        });

        instance.notify_spawned();
        instance.notify_despawned();

        assert_eq!(
            *log.borrow(),
            vec!["a:spawned", "b:spawned", "a:despawned", "b:despawned"]
        );
    }

    #[test]
    fn listener_cache_needs_refresh() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let instance = PoolInstance::<&str, Widget>::new(Widget { listeners: vec![] });

        instance.object_mut().listeners.push(listener("late", &log));
        instance.notify_spawned();
        assert!(log.borrow().is_empty());

        instance.refresh_listeners();
        instance.notify_spawned();
        assert_eq!(*log.borrow(), vec!["late:spawned"]);
        assert_eq!(instance.listener_count(), 1);
    }

    #[test]
    fn borrowed_object_cannot_change_activation() {
        let instance = Rc::new(PoolInstance::<&str, Widget>::new(Widget { listeners: vec![] }));
        instance.set_state(InstanceState::Active);

        let guard = instance.object();
        assert_eq!(instance.set_object_active(false), Err(PoolError::Busy));
        instance.deactivate();
        drop(guard);

        assert_eq!(instance.state(), InstanceState::Active);
        assert_eq!(instance.set_object_active(false), Ok(()));
    }

    #[test]
    fn detached_instance_cannot_despawn() {
        let instance = Rc::new(PoolInstance::<&str, Widget>::new(Widget { listeners: vec![] }));
        instance.set_state(InstanceState::Active);

        assert_eq!(instance.despawn(), Err(PoolError::Detached));
    }
}
