//=========================================================================
// Update Dispatcher
//=========================================================================
//
// Central per-frame dispatch for objects that opt into managed updates.
//
// Architecture:
//   UpdateDispatcher
//     ├─ pre_step:  PhaseList<dyn PreStep>
//     ├─ step:      PhaseList<dyn Step>
//     └─ post_step: PhaseList<dyn PostStep>
//
// Flow:
//   register_*() ──> live list (stale) ──> run_phase() ──> snapshot ──> callbacks
//
// Subscribers are held weakly. Dropping a subscriber without unregistering
// it is allowed: the dead entry is skipped and purged after the pass.
//
// All methods take `&self`, so a subscriber holding an `Rc<UpdateDispatcher>`
// may register or unregister from inside its own callback.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use crate::core::time::{FrameTime, Phase};
use phase_list::PhaseList;

//=== Module Declarations =================================================

mod phase_list;

//=== Phase Traits ========================================================

/// Called once per frame before physics.
pub trait PreStep {
    fn pre_step(&mut self, time: &FrameTime);
}

/// Called once per fixed physics step.
pub trait Step {
    fn step(&mut self, time: &FrameTime);
}

/// Called once per frame after physics.
pub trait PostStep {
    fn post_step(&mut self, time: &FrameTime);
}

//=== PhaseReport =========================================================

/// Outcome of a single `run_phase` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseReport {
    /// Callbacks invoked during the pass.
    pub invoked: usize,

    /// Dead subscribers removed from the live list after the pass.
    pub purged: usize,

    /// Subscribers skipped because they were already running.
    pub skipped: usize,
}

//=== UpdateDispatcher ====================================================

/// Registry of managed-update subscribers for the three frame phases.
///
/// Within a phase, callbacks run in registration order as of the moment
/// the pass snapshot was built. There is no ordering across phases beyond
/// the order in which the host runs them.
///
/// # Example
///
/// ```rust
/// # use std::cell::RefCell;
/// # use std::rc::Rc;
/// # use tickwork::prelude::*;
/// struct Spinner { angle: f64 }
///
/// impl Step for Spinner {
///     fn step(&mut self, time: &FrameTime) {
///         self.angle += 90.0 * time.fixed_delta;
///     }
/// }
///
/// let dispatcher = UpdateDispatcher::new();
/// let spinner = Rc::new(RefCell::new(Spinner { angle: 0.0 }));
/// dispatcher.register_step(&spinner);
///
/// dispatcher.run_phase(Phase::Step, &FrameTime::fixed(0, 0.5));
/// assert_eq!(spinner.borrow().angle, 45.0);
/// ```
pub struct UpdateDispatcher {
    pre_step: PhaseList<dyn PreStep>,
    step: PhaseList<dyn Step>,
    post_step: PhaseList<dyn PostStep>,
}

impl UpdateDispatcher {
    //--- Construction -----------------------------------------------------

    /// Creates a dispatcher with no subscribers.
    pub fn new() -> Self {
        Self {
            pre_step: PhaseList::new(Phase::PreStep),
            step: PhaseList::new(Phase::Step),
            post_step: PhaseList::new(Phase::PostStep),
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers a subscriber for the pre-physics phase.
    pub fn register_pre_step<T: PreStep + 'static>(&self, subscriber: &Rc<RefCell<T>>) {
        let subscriber: Rc<RefCell<dyn PreStep>> = subscriber.clone();
        self.pre_step.register(Rc::downgrade(&subscriber));
    }

    /// Registers a subscriber for the physics phase.
    pub fn register_step<T: Step + 'static>(&self, subscriber: &Rc<RefCell<T>>) {
        let subscriber: Rc<RefCell<dyn Step>> = subscriber.clone();
        self.step.register(Rc::downgrade(&subscriber));
    }

    /// Registers a subscriber for the post-physics phase.
    pub fn register_post_step<T: PostStep + 'static>(&self, subscriber: &Rc<RefCell<T>>) {
        let subscriber: Rc<RefCell<dyn PostStep>> = subscriber.clone();
        self.post_step.register(Rc::downgrade(&subscriber));
    }

    /// Registers a subscriber for all three phases.
    pub fn register_all<T>(&self, subscriber: &Rc<RefCell<T>>)
    where
        T: PreStep + Step + PostStep + 'static,
    {
        self.register_pre_step(subscriber);
        self.register_step(subscriber);
        self.register_post_step(subscriber);
    }

    /// Removes the first pre-physics registration of `subscriber`.
    ///
    /// Returns `true` if an entry was removed.
    pub fn unregister_pre_step<T: PreStep + 'static>(&self, subscriber: &Rc<RefCell<T>>) -> bool {
        let subscriber: Rc<RefCell<dyn PreStep>> = subscriber.clone();
        self.pre_step.unregister(&Rc::downgrade(&subscriber))
    }

    /// Removes the first physics registration of `subscriber`.
    pub fn unregister_step<T: Step + 'static>(&self, subscriber: &Rc<RefCell<T>>) -> bool {
        let subscriber: Rc<RefCell<dyn Step>> = subscriber.clone();
        self.step.unregister(&Rc::downgrade(&subscriber))
    }

    /// Removes the first post-physics registration of `subscriber`.
    pub fn unregister_post_step<T: PostStep + 'static>(&self, subscriber: &Rc<RefCell<T>>) -> bool {
        let subscriber: Rc<RefCell<dyn PostStep>> = subscriber.clone();
        self.post_step.unregister(&Rc::downgrade(&subscriber))
    }

    /// Removes one registration of `subscriber` from every phase.
    pub fn unregister_all<T>(&self, subscriber: &Rc<RefCell<T>>)
    where
        T: PreStep + Step + PostStep + 'static,
    {
        self.unregister_pre_step(subscriber);
        self.unregister_step(subscriber);
        self.unregister_post_step(subscriber);
    }

    //--- Dispatch ---------------------------------------------------------

    /// Invokes every live subscriber of `phase` once.
    ///
    /// Registrations and removals made by callbacks during the pass take
    /// effect on the next call.
    pub fn run_phase(&self, phase: Phase, time: &FrameTime) -> PhaseReport {
        match phase {
            Phase::PreStep => self.pre_step.run(|s| s.pre_step(time)),
            Phase::Step => self.step.run(|s| s.step(time)),
            Phase::PostStep => self.post_step.run(|s| s.post_step(time)),
        }
    }

    //--- Query API --------------------------------------------------------

    /// Number of entries in the live list of `phase`.
    ///
    /// Dead entries count until the next pass purges them.
    pub fn subscriber_count(&self, phase: Phase) -> usize {
        match phase {
            Phase::PreStep => self.pre_step.len(),
            Phase::Step => self.step.len(),
            Phase::PostStep => self.post_step.len(),
        }
    }

    /// Drops every registration of `phase`.
    pub fn clear(&self, phase: Phase) {
        match phase {
            Phase::PreStep => self.pre_step.clear(),
            Phase::Step => self.step.clear(),
            Phase::PostStep => self.post_step.clear(),
        }
    }

    /// Drops every registration of every phase.
    pub fn clear_all(&self) {
        for phase in Phase::ALL {
            self.clear(phase);
        }
    }
}

impl Default for UpdateDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    //--- Test Doubles -----------------------------------------------------

    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl Recorder {
        fn shared(name: &'static str, log: &Log) -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(Self {
                name,
                log: Rc::clone(log),
            }))
        }
    }

    impl PreStep for Recorder {
        fn pre_step(&mut self, _time: &FrameTime) {
            self.log.borrow_mut().push(format!("{}:pre", self.name));
        }
    }

    impl Step for Recorder {
        fn step(&mut self, _time: &FrameTime) {
            self.log.borrow_mut().push(format!("{}:step", self.name));
        }
    }

    impl PostStep for Recorder {
        fn post_step(&mut self, _time: &FrameTime) {
            self.log.borrow_mut().push(format!("{}:post", self.name));
        }
    }

    /// Registers `target` on its first step.
    struct Registrar {
        dispatcher: Rc<UpdateDispatcher>,
        target: Option<Rc<RefCell<Recorder>>>,
    }

    impl Step for Registrar {
        fn step(&mut self, _time: &FrameTime) {
            if let Some(target) = self.target.take() {
                self.dispatcher.register_step(&target);
            }
        }
    }

    /// Unregisters `target` on its first step.
    struct Remover {
        dispatcher: Rc<UpdateDispatcher>,
        target: Rc<RefCell<Recorder>>,
        done: bool,
    }

    impl Step for Remover {
        fn step(&mut self, _time: &FrameTime) {
            if !self.done {
                self.done = self.dispatcher.unregister_step(&self.target);
            }
        }
    }

    /// Runs a nested pass of its own phase.
    struct Reentrant {
        dispatcher: Rc<UpdateDispatcher>,
        nested: Option<PhaseReport>,
    }

    impl Step for Reentrant {
        fn step(&mut self, time: &FrameTime) {
            if self.nested.is_none() {
                self.nested = Some(self.dispatcher.run_phase(Phase::Step, time));
            }
        }
    }

    fn new_log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn time() -> FrameTime {
        FrameTime::fixed(0, 1.0 / 60.0)
    }

    //=====================================================================
    // Ordering
    //=====================================================================

    #[test]
    fn invokes_in_registration_order() {
        let log = new_log();
        let dispatcher = UpdateDispatcher::new();
        let a = Recorder::shared("a", &log);
        let b = Recorder::shared("b", &log);
        let c = Recorder::shared("c", &log);

        dispatcher.register_step(&b);
        dispatcher.register_step(&a);
        dispatcher.register_step(&c);

        let report = dispatcher.run_phase(Phase::Step, &time());

        assert_eq!(report.invoked, 3);
        assert_eq!(*log.borrow(), vec!["b:step", "a:step", "c:step"]);
    }

    #[test]
    fn phases_are_independent() {
        let log = new_log();
        let dispatcher = UpdateDispatcher::new();
        let a = Recorder::shared("a", &log);
        let b = Recorder::shared("b", &log);

        dispatcher.register_pre_step(&a);
        dispatcher.register_post_step(&b);

        dispatcher.run_phase(Phase::PreStep, &time());
        dispatcher.run_phase(Phase::Step, &time());
        dispatcher.run_phase(Phase::PostStep, &time());

        assert_eq!(*log.borrow(), vec!["a:pre", "b:post"]);
        assert_eq!(dispatcher.subscriber_count(Phase::Step), 0);
    }

    #[test]
    fn register_all_covers_every_phase() {
        let log = new_log();
        let dispatcher = UpdateDispatcher::new();
        let a = Recorder::shared("a", &log);

        dispatcher.register_all(&a);
        for phase in Phase::ALL {
            dispatcher.run_phase(phase, &time());
        }
        assert_eq!(*log.borrow(), vec!["a:pre", "a:step", "a:post"]);

        dispatcher.unregister_all(&a);
        for phase in Phase::ALL {
            assert_eq!(dispatcher.subscriber_count(phase), 0);
        }
    }

    //=====================================================================
    // Registration
    //=====================================================================

    #[test]
    fn duplicate_registration_runs_twice_and_unregister_removes_first() {
        let log = new_log();
        let dispatcher = UpdateDispatcher::new();
        let a = Recorder::shared("a", &log);

        dispatcher.register_step(&a);
        dispatcher.register_step(&a);
        dispatcher.run_phase(Phase::Step, &time());
        assert_eq!(log.borrow().len(), 2);

        assert!(dispatcher.unregister_step(&a));
        assert_eq!(dispatcher.subscriber_count(Phase::Step), 1);
    }

    #[test]
    fn unregister_unknown_subscriber_returns_false() {
        let log = new_log();
        let dispatcher = UpdateDispatcher::new();
        let a = Recorder::shared("a", &log);

        assert!(!dispatcher.unregister_step(&a));
    }

    #[test]
    fn unregister_is_matched_by_identity() {
        let log = new_log();
        let dispatcher = UpdateDispatcher::new();
        let a = Recorder::shared("same", &log);
        let b = Recorder::shared("same", &log);

        dispatcher.register_step(&a);
        dispatcher.register_step(&b);
        assert!(dispatcher.unregister_step(&b));

        dispatcher.run_phase(Phase::Step, &time());
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(dispatcher.subscriber_count(Phase::Step), 1);
    }

    #[test]
    fn clear_all_drops_registrations() {
        let log = new_log();
        let dispatcher = UpdateDispatcher::new();
        let a = Recorder::shared("a", &log);

        dispatcher.register_all(&a);
        dispatcher.clear_all();

        for phase in Phase::ALL {
            assert_eq!(dispatcher.run_phase(phase, &time()).invoked, 0);
        }
        assert!(log.borrow().is_empty());
    }

    //=====================================================================
    // Mutation During Dispatch
    //=====================================================================

    #[test]
    fn registration_during_pass_is_deferred_to_next_pass() {
        let log = new_log();
        let dispatcher = Rc::new(UpdateDispatcher::new());
        let late = Recorder::shared("late", &log);
        let registrar = Rc::new(RefCell::new(Registrar {
            dispatcher: Rc::clone(&dispatcher),
            target: Some(Rc::clone(&late)),
        }));

        dispatcher.register_step(&registrar);

        let first = dispatcher.run_phase(Phase::Step, &time());
        assert_eq!(first.invoked, 1);
        assert!(log.borrow().is_empty());

        let second = dispatcher.run_phase(Phase::Step, &time());
        assert_eq!(second.invoked, 2);
        assert_eq!(*log.borrow(), vec!["late:step"]);
    }

    #[test]
    fn unregistered_during_pass_runs_once_more_then_never() {
        let log = new_log();
        let dispatcher = Rc::new(UpdateDispatcher::new());
        let victim = Recorder::shared("victim", &log);
        let remover = Rc::new(RefCell::new(Remover {
            dispatcher: Rc::clone(&dispatcher),
            target: Rc::clone(&victim),
            done: false,
        }));

        dispatcher.register_step(&remover);
        dispatcher.register_step(&victim);

        dispatcher.run_phase(Phase::Step, &time());
        assert_eq!(*log.borrow(), vec!["victim:step"]);
        assert!(remover.borrow().done);

        dispatcher.run_phase(Phase::Step, &time());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn nested_pass_skips_running_subscriber() {
        let dispatcher = Rc::new(UpdateDispatcher::new());
        let reentrant = Rc::new(RefCell::new(Reentrant {
            dispatcher: Rc::clone(&dispatcher),
            nested: None,
        }));

        dispatcher.register_step(&reentrant);
        let outer = dispatcher.run_phase(Phase::Step, &time());

        assert_eq!(outer.invoked, 1);
        let nested = reentrant.borrow().nested.expect("nested pass should have run");
        assert_eq!(nested.skipped, 1);
        assert_eq!(nested.invoked, 0);
    }

    //=====================================================================
    // Stale Subscribers
    //=====================================================================

    #[test]
    fn dropped_subscriber_is_skipped_and_purged() {
        let log = new_log();
        let dispatcher = UpdateDispatcher::new();
        let a = Recorder::shared("a", &log);
        let b = Recorder::shared("b", &log);

        dispatcher.register_step(&a);
        dispatcher.register_step(&b);
        drop(a);

        let first = dispatcher.run_phase(Phase::Step, &time());
        assert_eq!(first.invoked, 1);
        assert_eq!(first.purged, 1);
        assert_eq!(dispatcher.subscriber_count(Phase::Step), 1);

        let second = dispatcher.run_phase(Phase::Step, &time());
        assert_eq!(second.invoked, 1);
        assert_eq!(second.purged, 0);
        assert_eq!(*log.borrow(), vec!["b:step", "b:step"]);
    }

    #[test]
    fn dead_entries_count_until_purged() {
        let log = new_log();
        let dispatcher = UpdateDispatcher::new();
        let a = Recorder::shared("a", &log);

        dispatcher.register_post_step(&a);
        drop(a);

        assert_eq!(dispatcher.subscriber_count(Phase::PostStep), 1);
        dispatcher.run_phase(Phase::PostStep, &time());
        assert_eq!(dispatcher.subscriber_count(Phase::PostStep), 0);
    }
}
