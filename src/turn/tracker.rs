//! Round scheduler
//!
//! Drives the round state machine off the shared turn lock: when no hold is
//! outstanding the previous round has passed and the next one starts. The
//! very first transition emits no round-passed occurrence since there is no
//! prior round to close.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::bus::events::{RoundPassed, RoundStarted};
use crate::bus::EventBus;
use crate::core::types::Round;
use crate::turn::lock::TurnLock;

pub struct TurnTracker {
    bus: Rc<EventBus>,
    lock: RefCell<Rc<TurnLock>>,
    first_round: Cell<bool>,
    round: Cell<Round>,
}

impl TurnTracker {
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self {
            bus,
            lock: RefCell::new(Rc::new(TurnLock::new())),
            first_round: Cell::new(true),
            round: Cell::new(0),
        }
    }

    /// Advances the round state machine; call once per host update. A no-op
    /// while any hold on the current round's lock is outstanding.
    pub fn pump(&self) {
        if self.lock.borrow().is_held() {
            return;
        }
        if !self.first_round.get() {
            let mut passed = RoundPassed;
            self.bus.raise(&mut passed);
        }
        self.first_round.set(false);
        self.round.set(self.round.get() + 1);
        tracing::debug!(round = self.round.get(), "round started");

        // every round gets a fresh lock; stale holds cannot leak across
        let fresh = Rc::new(TurnLock::new());
        *self.lock.borrow_mut() = Rc::clone(&fresh);
        let mut started = RoundStarted { turn_lock: fresh };
        self.bus.raise(&mut started);
    }

    pub fn current_round(&self) -> Round {
        self.round.get()
    }

    pub fn lock(&self) -> Rc<TurnLock> {
        Rc::clone(&self.lock.borrow())
    }
}
