//=========================================================================
// Phase List
//=========================================================================
//
// Subscriber list for a single phase with snapshot-based iteration.
//
// Architecture:
//   register()/unregister() ──> live: Vec<Weak<_>> ──(stale)──┐
//                                                             ↓
//   run() ──> snapshot: Rc<[Weak<_>]> ──> invoke each live entry
//                                     └─> purge dead entries after pass
//
// The snapshot is immutable while a pass is in progress, so callbacks can
// register and unregister freely. Their changes show up on the next
// rebuild, never in the pass that is running.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::PhaseReport;
use crate::core::time::Phase;

//=== PhaseList ===========================================================

type Entry<T> = Weak<RefCell<T>>;

pub(super) struct PhaseList<T: ?Sized> {
    phase: Phase,
    live: RefCell<Vec<Entry<T>>>,
    snapshot: RefCell<Option<Rc<[Entry<T>]>>>,
    stale: Cell<bool>,
}

impl<T: ?Sized> PhaseList<T> {
    pub(super) fn new(phase: Phase) -> Self {
        Self {
            phase,
            live: RefCell::new(Vec::new()),
            snapshot: RefCell::new(None),
            stale: Cell::new(false),
        }
    }

    //--- Registration -----------------------------------------------------

    /// Appends a subscriber. Dead handles are ignored.
    pub(super) fn register(&self, entry: Entry<T>) {
        if entry.strong_count() == 0 {
            return;
        }

        self.live.borrow_mut().push(entry);
        self.stale.set(true);
    }

    /// Removes the first entry pointing at the same subscriber.
    pub(super) fn unregister(&self, entry: &Entry<T>) -> bool {
        let mut live = self.live.borrow_mut();

        match live.iter().position(|e| Weak::ptr_eq(e, entry)) {
            Some(pos) => {
                live.remove(pos);
                self.stale.set(true);
                true
            }
            None => false,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.live.borrow().len()
    }

    pub(super) fn clear(&self) {
        let mut live = self.live.borrow_mut();
        if !live.is_empty() {
            live.clear();
            self.stale.set(true);
        }
    }

    //--- Dispatch ---------------------------------------------------------

    /// Runs one pass over the current snapshot.
    pub(super) fn run<F>(&self, mut invoke: F) -> PhaseReport
    where
        F: FnMut(&mut T),
    {
        let snapshot = self.current_snapshot();
        let mut report = PhaseReport::default();
        let mut found_stale = false;

        for entry in snapshot.iter() {
            let Some(subscriber) = entry.upgrade() else {
                found_stale = true;
                continue;
            };

            // Busy only when a subscriber re-enters a pass of its own phase
            let Ok(mut guard) = subscriber.try_borrow_mut() else {
                warn!("{:?} subscriber is already running, skipping nested call", self.phase);
                report.skipped += 1;
                continue;
            };

            invoke(&mut *guard);
            report.invoked += 1;
        }

        if found_stale {
            report.purged = self.purge_dead();
        }

        report
    }

    //--- Internal Helpers -------------------------------------------------

    fn current_snapshot(&self) -> Rc<[Entry<T>]> {
        if !self.stale.get() {
            if let Some(snapshot) = self.snapshot.borrow().as_ref() {
                return Rc::clone(snapshot);
            }
        }

        let rebuilt: Rc<[Entry<T>]> = self.live.borrow().iter().cloned().collect();
        *self.snapshot.borrow_mut() = Some(Rc::clone(&rebuilt));
        self.stale.set(false);
        rebuilt
    }

    fn purge_dead(&self) -> usize {
        let mut live = self.live.borrow_mut();
        let before = live.len();
        live.retain(|e| e.strong_count() > 0);
        let purged = before - live.len();

        self.stale.set(true);
        debug!("Purged {} stale {:?} subscriber(s)", purged, self.phase);
        purged
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    trait Bump {
        fn bump(&mut self);
    }

    struct Counter(u32);

    impl Bump for Counter {
        fn bump(&mut self) {
            self.0 += 1;
        }
    }

    fn entry(rc: &Rc<RefCell<Counter>>) -> Weak<RefCell<dyn Bump>> {
        let rc: Rc<RefCell<dyn Bump>> = rc.clone();
        Rc::downgrade(&rc)
    }

    #[test]
    fn snapshot_is_reused_until_list_changes() {
        let list = PhaseList::<dyn Bump>::new(Phase::Step);
        let a = Rc::new(RefCell::new(Counter(0)));
        list.register(entry(&a));

        let first = list.current_snapshot();
        let second = list.current_snapshot();
        assert!(Rc::ptr_eq(&first, &second));

        let b = Rc::new(RefCell::new(Counter(0)));
        list.register(entry(&b));

        let third = list.current_snapshot();
        assert!(!Rc::ptr_eq(&second, &third));
        assert_eq!(third.len(), 2);
    }

    #[test]
    fn unregister_missing_entry_keeps_snapshot() {
        let list = PhaseList::<dyn Bump>::new(Phase::Step);
        let a = Rc::new(RefCell::new(Counter(0)));
        let b = Rc::new(RefCell::new(Counter(0)));
        list.register(entry(&a));

        let before = list.current_snapshot();
        assert!(!list.unregister(&entry(&b)));
        let after = list.current_snapshot();

        assert!(Rc::ptr_eq(&before, &after));
    }

    #[test]
    fn dead_registration_is_ignored() {
        let list = PhaseList::<dyn Bump>::new(Phase::PreStep);
        let dead = {
            let a = Rc::new(RefCell::new(Counter(0)));
            entry(&a)
        };

        list.register(dead);
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn run_counts_invocations() {
        let list = PhaseList::<dyn Bump>::new(Phase::PostStep);
        let a = Rc::new(RefCell::new(Counter(0)));
        list.register(entry(&a));
        list.register(entry(&a));

        let report = list.run(|s| s.bump());

        assert_eq!(report.invoked, 2);
        assert_eq!(a.borrow().0, 2);
    }
}
