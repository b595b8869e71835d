//! Counting turn gate
//!
//! A round is in progress while any hold is outstanding and concludes the
//! instant the count returns to zero. Holds release by value, so a hold
//! cannot be released twice.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Default)]
pub struct TurnLock {
    holds: Cell<usize>,
}

impl TurnLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.holds.get() > 0
    }

    pub fn outstanding(&self) -> usize {
        self.holds.get()
    }

    /// Acquires one hold. Dropping the returned hold without releasing it
    /// stalls the round forever.
    pub fn hold(self: &Rc<Self>) -> TurnHold {
        self.holds.set(self.holds.get() + 1);
        TurnHold { lock: Rc::clone(self) }
    }
}

pub struct TurnHold {
    lock: Rc<TurnLock>,
}

impl TurnHold {
    /// Releases this hold, consuming it.
    pub fn release(self) {
        let count = self.lock.holds.get();
        assert!(count > 0, "turn hold released with no outstanding holds");
        self.lock.holds.set(count - 1);
    }
}
