//=========================================================================
// Object Pool Registry
//=========================================================================
//
// Owns one queue of available instances per registered template.
//
// Flow:
//   register(template) ──> instantiate × initial_amount ──> queue
//   try_acquire(key)   ──> pop (or grow once) ──> activate ──> on_spawned
//   release(handle)    ──> deactivate ──> on_despawned ──> queue
//
// All methods take `&self` and never hold the registry borrow while host
// code (factories, listeners) runs, so listeners may call back into the
// pool.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::{
    InstanceState, PoolError, PoolHandle, PoolInstance, PoolKey, PoolTemplate, Poolable,
};

//=== Pool ================================================================

struct Pool<K: PoolKey, O: Poolable> {
    registration: u64,
    template: PoolTemplate<K, O>,
    queue: VecDeque<PoolHandle<K, O>>,
    total: usize,
}

//=== ObjectPool ==========================================================

/// Template-keyed registry of reusable instances.
///
/// Created behind an `Rc` so instances can keep a weak back-reference for
/// [`PoolInstance::despawn`].
///
/// # Example
///
/// ```rust
/// # use tickwork::prelude::*;
/// #[derive(Clone)]
/// struct Coin { active: bool }
///
/// impl Poolable for Coin {
///     fn set_active(&mut self, active: bool) { self.active = active; }
/// }
///
/// let pool = ObjectPool::new();
/// pool.register(PoolTemplate::from_prototype("coin", Coin { active: false })
///     .with_initial_amount(1))
///     .unwrap();
///
/// let coin = pool.try_acquire(&"coin").unwrap().expect("one coin available");
/// assert!(coin.object().active);
/// assert!(pool.try_acquire(&"coin").unwrap().is_none());
///
/// pool.release(&coin).unwrap();
/// assert_eq!(pool.available_count(&"coin"), Some(1));
/// ```
pub struct ObjectPool<K: PoolKey, O: Poolable> {
    this: Weak<ObjectPool<K, O>>,
    pools: RefCell<HashMap<K, Pool<K, O>>>,
    registrations: Cell<u64>,
}

impl<K: PoolKey, O: Poolable> ObjectPool<K, O> {
    //--- Construction -----------------------------------------------------

    /// Creates an empty pool registry.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            pools: RefCell::new(HashMap::new()),
            registrations: Cell::new(0),
        })
    }

    //--- Registration -----------------------------------------------------

    /// Registers every template, skipping duplicates.
    ///
    /// Returns the number of templates that were registered.
    pub fn initialize<I>(&self, templates: I) -> usize
    where
        I: IntoIterator<Item = PoolTemplate<K, O>>,
    {
        templates
            .into_iter()
            .map(|template| self.register(template))
            .filter(Result::is_ok)
            .count()
    }

    /// Registers a template and creates its initial instances.
    ///
    /// A key that is already registered keeps its first template.
    pub fn register(&self, template: PoolTemplate<K, O>) -> Result<(), PoolError> {
        if self.pools.borrow().contains_key(template.key()) {
            warn!("{:?} has already been pooled, skipping template", template.key());
            return Err(PoolError::DuplicateTemplate(format!("{:?}", template.key())));
        }

        let registration = self.registrations.get() + 1;
        self.registrations.set(registration);

        let queue: VecDeque<_> = (0..template.initial_amount())
            .map(|_| self.instantiate(&template, registration))
            .collect();

        debug!(
            "Registered pool {:?} with {} instance(s), growth {:?}",
            template.key(),
            queue.len(),
            template.growth()
        );

        let key = template.key().clone();
        let total = queue.len();
        self.pools.borrow_mut().insert(
            key,
            Pool {
                registration,
                template,
                queue,
                total,
            },
        );

        Ok(())
    }

    /// Unregisters a template and drops its available instances.
    ///
    /// Instances still checked out stay alive with their holders, but can
    /// no longer be released, not even after the key is registered again.
    pub fn remove_template(&self, key: &K) -> bool {
        let removed = self.pools.borrow_mut().remove(key);

        match removed {
            Some(pool) => {
                debug!(
                    "Removed pool {:?} ({} of {} instance(s) were available)",
                    key,
                    pool.queue.len(),
                    pool.total
                );
                true
            }
            None => false,
        }
    }

    //--- Acquire / Release ------------------------------------------------

    /// Takes an available instance for `key`, activating it.
    ///
    /// Returns `Ok(None)` when the pool is exhausted and its growth policy
    /// forbids another instance. Growth creates exactly one instance per
    /// call.
    pub fn try_acquire(&self, key: &K) -> Result<Option<PoolHandle<K, O>>, PoolError> {
        let mut grown = 0usize;

        loop {
            let next = {
                let mut pools = self.pools.borrow_mut();
                let Some(pool) = pools.get_mut(key) else {
                    warn!("Tried to acquire from unregistered pool {:?}", key);
                    return Err(PoolError::PoolNotFound(format!("{:?}", key)));
                };

                match pool.queue.pop_front() {
                    Some(instance) => Some(instance),
                    None if grown == 0 && pool.template.growth().allows(pool.total) => None,
                    None => {
                        if grown > 0 {
                            warn!("Pool {:?} lost a freshly created instance", key);
                        }
                        return Ok(None);
                    }
                }
            };

            match next {
                Some(instance) => {
                    if let Err(e) = self.activate(&instance) {
                        warn!("Could not activate instance of {:?}: {}", key, e);
                        if let Some(pool) = self.pools.borrow_mut().get_mut(key) {
                            pool.queue.push_front(instance);
                        }
                        return Err(e);
                    }
                    return Ok(Some(instance));
                }
                None => {
                    self.grow(key);
                    grown += 1;
                }
            }
        }
    }

    /// Returns an instance to its pool, deactivating it.
    ///
    /// Releasing an instance that is already available is a no-op. An
    /// instance created by an earlier registration of its key is refused
    /// with [`PoolError::PoolNotFound`], and one whose object is borrowed
    /// with [`PoolError::Busy`].
    pub fn release(&self, instance: &PoolHandle<K, O>) -> Result<(), PoolError> {
        if !instance.belongs_to(&self.this) {
            return Err(PoolError::ForeignInstance);
        }

        let Some(key) = instance.template().cloned() else {
            return Err(PoolError::Detached);
        };

        let registered = self.pools.borrow().get(&key).map(|pool| pool.registration);
        if registered.is_none() || registered != instance.registration() {
            debug!("Ignoring release to unregistered pool {:?}", key);
            return Err(PoolError::PoolNotFound(format!("{:?}", key)));
        }

        if instance.state() == InstanceState::Available {
            return Ok(());
        }

        instance.set_object_active(false)?;
        instance.set_state(InstanceState::Available);
        instance.notify_despawned();

        // A listener may have removed or replaced the template in the meantime
        if let Some(pool) = self.pools.borrow_mut().get_mut(&key) {
            if registered == Some(pool.registration) {
                pool.queue.push_back(Rc::clone(instance));
            }
        }

        Ok(())
    }

    //--- Query API --------------------------------------------------------

    /// Returns true if a template is registered under `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.pools.borrow().contains_key(key)
    }

    /// Instances currently queued for `key`.
    pub fn available_count(&self, key: &K) -> Option<usize> {
        self.pools.borrow().get(key).map(|p| p.queue.len())
    }

    /// Instances ever created for `key`, queued or checked out.
    pub fn total_count(&self, key: &K) -> Option<usize> {
        self.pools.borrow().get(key).map(|p| p.total)
    }

    /// Instances currently checked out for `key`.
    pub fn active_count(&self, key: &K) -> Option<usize> {
        self.pools.borrow().get(key).map(|p| p.total.saturating_sub(p.queue.len()))
    }

    /// Registered template keys, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.pools.borrow().keys().cloned().collect()
    }

    //--- Internal Helpers -------------------------------------------------

    fn instantiate(&self, template: &PoolTemplate<K, O>, registration: u64) -> PoolHandle<K, O> {
        self.create_instance(template.key(), registration, &*template.factory())
    }

    fn grow(&self, key: &K) {
        // Factory runs outside the registry borrow
        let (registration, factory) = match self.pools.borrow().get(key) {
            Some(pool) => (pool.registration, pool.template.factory()),
            None => return,
        };

        let instance = self.create_instance(key, registration, &*factory);

        if let Some(pool) = self
            .pools
            .borrow_mut()
            .get_mut(key)
            .filter(|pool| pool.registration == registration)
        {
            pool.total += 1;
            pool.queue.push_back(instance);
            debug!("Pool {:?} grew to {} instance(s)", key, pool.total);
        }
    }

    fn create_instance(
        &self,
        key: &K,
        registration: u64,
        factory: &dyn Fn() -> O,
    ) -> PoolHandle<K, O> {
        let mut object = factory();
        object.set_active(false);

        let instance = Rc::new(PoolInstance::new(object));
        instance.set_template(key.clone());
        instance.set_registration(registration);
        instance.set_pool(self.this.clone());
        instance
    }

    fn activate(&self, instance: &PoolHandle<K, O>) -> Result<(), PoolError> {
        instance.set_object_active(true)?;
        instance.set_state(InstanceState::Active);
        instance.notify_spawned();
        Ok(())
    }
}

impl<K: PoolKey, O: Poolable> fmt::Debug for ObjectPool<K, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pools = self.pools.borrow();
        let summary: Vec<_> = pools
            .iter()
            .map(|(key, pool)| format!("{:?}: {}/{}", key, pool.queue.len(), pool.total))
            .collect();

        f.debug_struct("ObjectPool").field("pools", &summary).finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
