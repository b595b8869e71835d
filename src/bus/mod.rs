//! Typed broadcast/query bus with deferred, priority-ordered reactions
//!
//! Every discrete occurrence is raised exactly once. Raw handlers observe it
//! in registration order and may mutate its accumulator fields; they may
//! also defer reactions that run only after every handler has seen the
//! occurrence, ordered by a float priority (`f32::INFINITY` runs last, ties
//! in registration order). Any commands produced anywhere in a dispatch are
//! composed into one invertible unit and handed to the round history, which
//! applies it on the spot.

pub mod events;

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use ordered_float::OrderedFloat;

use crate::undo::{compose, Invertible, RoundHistory};

/// Marker for payload types that can be raised on the bus.
pub trait Occurrence: 'static {}

/// Commands accumulated over one dispatch.
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Box<dyn Invertible>>,
}

impl CommandBuffer {
    pub fn record<C: Invertible + 'static>(&mut self, command: C) {
        self.commands.push(Box::new(command));
    }

    pub fn push(&mut self, command: Box<dyn Invertible>) {
        self.commands.push(command);
    }

    fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn into_inner(self) -> Vec<Box<dyn Invertible>> {
        self.commands
    }
}

/// Reactions deferred by handlers during the broadcast phase.
pub struct Reactions<E: Occurrence> {
    queued: Vec<Reaction<E>>,
}

struct Reaction<E> {
    priority: f32,
    run: Box<dyn FnOnce(&mut E, &mut CommandBuffer)>,
}

impl<E: Occurrence> Reactions<E> {
    fn new() -> Self {
        Self { queued: Vec::new() }
    }

    /// Defers `react` to run at `priority` once every handler has seen the
    /// occurrence. `f32::INFINITY` observes the fully settled result of all
    /// finite-priority reactions.
    pub fn defer(&mut self, priority: f32, react: impl FnOnce(&mut E, &mut CommandBuffer) + 'static) {
        self.queued.push(Reaction { priority, run: Box::new(react) });
    }

    fn run_all(mut self, event: &mut E, commands: &mut CommandBuffer) {
        // stable sort keeps registration order among equal priorities
        self.queued.sort_by_key(|reaction| OrderedFloat(reaction.priority));
        for reaction in self.queued {
            (reaction.run)(event, commands);
        }
    }
}

type Handler<E> = dyn FnMut(&mut E, &mut CommandBuffer, &mut Reactions<E>);

struct Slot<E: Occurrence> {
    handlers: Vec<Rc<RefCell<Handler<E>>>>,
}

/// The bus itself. Single-threaded; subscribers share it through `Rc`.
pub struct EventBus {
    slots: RefCell<AHashMap<TypeId, Box<dyn Any>>>,
    history: Rc<RefCell<RoundHistory>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(AHashMap::new()),
            history: Rc::new(RefCell::new(RoundHistory::new())),
        }
    }

    /// Shared handle to the undo history this bus feeds.
    pub fn history(&self) -> Rc<RefCell<RoundHistory>> {
        Rc::clone(&self.history)
    }

    /// Registers a raw handler, invoked in registration order during the
    /// broadcast phase of every raise of `E`.
    pub fn subscribe<E, F>(&self, handler: F)
    where
        E: Occurrence,
        F: FnMut(&mut E, &mut CommandBuffer, &mut Reactions<E>) + 'static,
    {
        let mut slots = self.slots.borrow_mut();
        let slot = slots
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Slot::<E> { handlers: Vec::new() }));
        let slot = slot
            .downcast_mut::<Slot<E>>()
            .expect("occurrence slot type mismatch");
        slot.handlers.push(Rc::new(RefCell::new(handler)));
    }

    /// Registers a response that runs in the deferred phase at `priority`.
    ///
    /// A response never observes the occurrence before lower-priority
    /// responses have settled it.
    pub fn subscribe_at<E, F>(&self, priority: f32, response: F)
    where
        E: Occurrence,
        F: FnMut(&mut E, &mut CommandBuffer) + 'static,
    {
        let response = Rc::new(RefCell::new(response));
        self.subscribe::<E, _>(move |_event, _commands, reactions| {
            let response = Rc::clone(&response);
            reactions.defer(priority, move |event, commands| {
                let mut response = response
                    .try_borrow_mut()
                    .expect("reentrant raise of an occurrence type within its own dispatch");
                (&mut *response)(event, commands);
            });
        });
    }

    /// `subscribe_at` with the default priority of zero.
    pub fn respond<E, F>(&self, response: F)
    where
        E: Occurrence,
        F: FnMut(&mut E, &mut CommandBuffer) + 'static,
    {
        self.subscribe_at(0.0, response);
    }

    /// Raises `event`: handlers see it in registration order, deferred
    /// reactions in priority order, and any commands produced are composed,
    /// applied, and buffered as one unit of round material.
    ///
    /// Nested raises of *other* occurrence types complete before the outer
    /// dispatch resumes. A nested raise of the same type panics.
    pub fn raise<E: Occurrence>(&self, event: &mut E) {
        let handlers: Vec<Rc<RefCell<Handler<E>>>> = {
            let slots = self.slots.borrow();
            match slots.get(&TypeId::of::<E>()) {
                Some(slot) => slot
                    .downcast_ref::<Slot<E>>()
                    .expect("occurrence slot type mismatch")
                    .handlers
                    .clone(),
                None => return,
            }
        };

        let mut commands = CommandBuffer::default();
        let mut reactions = Reactions::new();
        for handler in &handlers {
            let mut handler = handler
                .try_borrow_mut()
                .expect("reentrant raise of an occurrence type within its own dispatch");
            (&mut *handler)(event, &mut commands, &mut reactions);
        }
        reactions.run_all(event, &mut commands);

        if !commands.is_empty() {
            self.history
                .borrow_mut()
                .archive(compose(commands.into_inner()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Ping {
        log: Rc<RefCell<Vec<&'static str>>>,
    }
    impl Occurrence for Ping {}

    struct Tally {
        total: i32,
    }
    impl Occurrence for Tally {}

    struct Echo;
    impl Occurrence for Echo {}

    #[test]
    fn test_raise_with_no_subscribers() {
        let bus = EventBus::new();
        bus.raise(&mut Tally { total: 0 });
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe::<Ping, _>(|event, _, _| event.log.borrow_mut().push("first"));
        bus.subscribe::<Ping, _>(|event, _, _| event.log.borrow_mut().push("second"));
        bus.raise(&mut Ping { log: Rc::clone(&log) });
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_deferred_reactions_sort_by_priority() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe_at::<Ping, _>(5.0, |event, _| event.log.borrow_mut().push("five"));
        bus.subscribe_at::<Ping, _>(1.0, |event, _| event.log.borrow_mut().push("one"));
        bus.subscribe_at::<Ping, _>(f32::INFINITY, |event, _| event.log.borrow_mut().push("last"));
        bus.subscribe_at::<Ping, _>(0.0, |event, _| event.log.borrow_mut().push("zero"));
        bus.raise(&mut Ping { log: Rc::clone(&log) });
        assert_eq!(*log.borrow(), vec!["zero", "one", "five", "last"]);
    }

    #[test]
    fn test_equal_priorities_keep_registration_order() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.respond::<Ping, _>(|event, _| event.log.borrow_mut().push("a"));
        bus.respond::<Ping, _>(|event, _| event.log.borrow_mut().push("b"));
        bus.respond::<Ping, _>(|event, _| event.log.borrow_mut().push("c"));
        bus.raise(&mut Ping { log: Rc::clone(&log) });
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reactions_run_after_all_handlers() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe::<Ping, _>(|event, _, reactions| {
            let log = Rc::clone(&event.log);
            reactions.defer(0.0, move |_, _| log.borrow_mut().push("deferred"));
            event.log.borrow_mut().push("handler one");
        });
        bus.subscribe::<Ping, _>(|event, _, _| event.log.borrow_mut().push("handler two"));
        bus.raise(&mut Ping { log: Rc::clone(&log) });
        assert_eq!(*log.borrow(), vec!["handler one", "handler two", "deferred"]);
    }

    #[test]
    fn test_query_accumulation() {
        let bus = EventBus::new();
        bus.respond::<Tally, _>(|query, _| query.total += 3);
        bus.respond::<Tally, _>(|query, _| query.total += 4);
        let mut query = Tally { total: 0 };
        bus.raise(&mut query);
        assert_eq!(query.total, 7);
    }

    #[test]
    fn test_commands_compose_into_one_history_entry() {
        struct SetFlag {
            flag: Rc<Cell<bool>>,
        }
        impl Invertible for SetFlag {
            fn apply(&mut self) {
                self.flag.set(true);
            }
            fn undo(&mut self) {
                self.flag.set(false);
            }
        }

        let bus = EventBus::new();
        let flag = Rc::new(Cell::new(false));
        let shared = Rc::clone(&flag);
        bus.respond::<Echo, _>(move |_, commands| {
            commands.record(SetFlag { flag: Rc::clone(&shared) });
        });
        bus.raise(&mut Echo);
        assert!(flag.get());

        let history = bus.history();
        assert_eq!(history.borrow().pending_commands(), 1);
        history.borrow_mut().rewind(1);
        assert!(!flag.get());
    }

    #[test]
    fn test_nested_raise_of_other_type() {
        let bus = Rc::new(EventBus::new());
        let inner_total = Rc::new(Cell::new(0));

        bus.respond::<Tally, _>(|query, _| query.total += 10);

        let bus_handle = Rc::clone(&bus);
        let observed = Rc::clone(&inner_total);
        bus.respond::<Echo, _>(move |_, _| {
            let mut query = Tally { total: 0 };
            bus_handle.raise(&mut query);
            observed.set(query.total);
        });

        bus.raise(&mut Echo);
        assert_eq!(inner_total.get(), 10);
    }

    #[test]
    #[should_panic(expected = "reentrant raise")]
    fn test_reentrant_raise_of_same_type_panics() {
        let bus = Rc::new(EventBus::new());
        let bus_handle = Rc::clone(&bus);
        bus.respond::<Echo, _>(move |_, _| {
            bus_handle.raise(&mut Echo);
        });
        bus.raise(&mut Echo);
    }
}
