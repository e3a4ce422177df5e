//=========================================================================
// Pool Template
//=========================================================================
//
// Describes how a pool is populated: which key it answers to, how new
// instances are made, how many exist up front, and whether it may grow.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use super::{PoolKey, Poolable};

//=== Growth ==============================================================

/// Capacity policy applied when a pool runs out of available instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Growth {
    /// Never create instances past the initial amount.
    #[default]
    Fixed,

    /// Create one instance per over-capacity acquire, without limit.
    Unbounded,

    /// Grow while the total instance count is below the given maximum.
    Bounded(usize),
}

impl Growth {
    /// Whether a pool currently holding `total` instances may create one more.
    pub fn allows(self, total: usize) -> bool {
        match self {
            Growth::Fixed => false,
            Growth::Unbounded => true,
            Growth::Bounded(max) => total < max,
        }
    }
}

//=== PoolTemplate ========================================================

/// Blueprint for one pool inside an [`super::ObjectPool`].
///
/// # Example
///
/// ```rust
/// # use tickwork::prelude::*;
/// #[derive(Clone)]
/// struct Bullet { active: bool }
///
/// impl Poolable for Bullet {
///     fn set_active(&mut self, active: bool) { self.active = active; }
/// }
///
/// let template = PoolTemplate::from_prototype("bullet", Bullet { active: true })
///     .with_initial_amount(16)
///     .with_growth(Growth::Bounded(64));
///
/// assert_eq!(template.initial_amount(), 16);
/// ```
pub struct PoolTemplate<K: PoolKey, O: Poolable> {
    key: K,
    factory: Rc<dyn Fn() -> O>,
    initial_amount: usize,
    growth: Growth,
}

impl<K: PoolKey, O: Poolable> PoolTemplate<K, O> {
    //--- Construction -----------------------------------------------------

    /// Creates a template whose instances are produced by `factory`.
    ///
    /// Defaults to no initial instances and [`Growth::Fixed`].
    pub fn new<F>(key: K, factory: F) -> Self
    where
        F: Fn() -> O + 'static,
    {
        Self {
            key,
            factory: Rc::new(factory),
            initial_amount: 0,
            growth: Growth::Fixed,
        }
    }

    /// Creates a template whose instances are copies of `prototype`.
    pub fn from_prototype(key: K, prototype: O) -> Self
    where
        O: Clone,
    {
        Self::new(key, move || prototype.clone())
    }

    /// Sets how many instances are created when the template is registered.
    pub fn with_initial_amount(mut self, amount: usize) -> Self {
        self.initial_amount = amount;
        self
    }

    /// Sets the capacity policy.
    pub fn with_growth(mut self, growth: Growth) -> Self {
        self.growth = growth;
        self
    }

    //--- Accessors --------------------------------------------------------

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn initial_amount(&self) -> usize {
        self.initial_amount
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    pub(super) fn factory(&self) -> Rc<dyn Fn() -> O> {
        Rc::clone(&self.factory)
    }
}

impl<K: PoolKey, O: Poolable> fmt::Debug for PoolTemplate<K, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolTemplate")
            .field("key", &self.key)
            .field("initial_amount", &self.initial_amount)
            .field("growth", &self.growth)
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Dummy;

    impl Poolable for Dummy {
        fn set_active(&mut self, _active: bool) {}
    }

    #[test]
    fn growth_policies() {
        assert!(!Growth::Fixed.allows(0));
        assert!(Growth::Unbounded.allows(usize::MAX - 1));
        assert!(Growth::Bounded(3).allows(2));
        assert!(!Growth::Bounded(3).allows(3));
    }

    #[test]
    fn template_defaults() {
        let template = PoolTemplate::new("dummy", || Dummy);
        assert_eq!(template.initial_amount(), 0);
        assert_eq!(template.growth(), Growth::Fixed);
        assert_eq!(*template.key(), "dummy");
    }

    #[test]
    fn template_debug_omits_factory() {
        let template = PoolTemplate::from_prototype(7u32, Dummy).with_initial_amount(2);
        let debug_str = format!("{:?}", template);
        assert!(debug_str.contains("initial_amount: 2"));
        assert!(debug_str.contains("key: 7"));
    }
}
