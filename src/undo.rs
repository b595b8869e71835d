//! Invertible commands and per-round undo history
//!
//! Every state mutation in the simulation travels through an `Invertible`
//! command. The history applies commands as they arrive, buffers them for
//! the round in progress, and composes one entry per completed round so the
//! world can be rewound a round at a time.

pub trait Invertible {
    fn apply(&mut self);
    fn undo(&mut self);
}

/// Composes commands into a single unit: `apply` runs children in order,
/// `undo` in reverse order, so composites nest as valid commands themselves.
pub fn compose(children: Vec<Box<dyn Invertible>>) -> Box<dyn Invertible> {
    Box::new(Composite { children })
}

struct Composite {
    children: Vec<Box<dyn Invertible>>,
}

impl Invertible for Composite {
    fn apply(&mut self) {
        for child in self.children.iter_mut() {
            child.apply();
        }
    }

    fn undo(&mut self) {
        for child in self.children.iter_mut().rev() {
            child.undo();
        }
    }
}

/// Applies and buffers the current round's commands, and archives one
/// composite per completed round.
#[derive(Default)]
pub struct RoundHistory {
    buffer: Vec<Box<dyn Invertible>>,
    rounds: Vec<Box<dyn Invertible>>,
}

impl RoundHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `command` immediately and buffers it as material for the
    /// round in progress.
    pub fn archive(&mut self, mut command: Box<dyn Invertible>) {
        command.apply();
        self.buffer.push(command);
    }

    /// Composes the buffered commands into one history entry. A round in
    /// which nothing happened leaves no entry.
    pub fn advance_round(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let material = std::mem::take(&mut self.buffer);
        self.rounds.push(compose(material));
        tracing::debug!(completed = self.rounds.len(), "round archived");
    }

    /// Undoes the last `count` rounds, `count >= 1`. The current buffer is
    /// flushed into history first so everything executed this round is
    /// undone too. Rewinding past the start of history undoes what exists
    /// and stops.
    pub fn rewind(&mut self, count: usize) {
        assert!(count >= 1, "rewind count must be at least 1");
        self.advance_round();
        let undone = count.min(self.rounds.len());
        for _ in 0..undone {
            if let Some(mut round) = self.rounds.pop() {
                round.undo();
            }
        }
        tracing::debug!(requested = count, undone, "history rewound");
    }

    pub fn completed_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn pending_commands(&self) -> usize {
        self.buffer.len()
    }
}
