//
// signal.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::cell::RefCell;
use std::rc::Rc;

type Slot<T> = Rc<dyn Fn(&T)>;

struct Slots<T> {
    next_id: u64,
    entries: Vec<(u64, Slot<T>)>,
}

/// A single-threaded observer list. Receivers are invoked synchronously, in
/// connection order, every time the signal is emitted.
///
/// Emission works on a snapshot of the receivers, so a receiver may connect or
/// disconnect receivers (including itself) while the signal is being emitted.
/// A receiver disconnected by an earlier receiver during the same emission is
/// not invoked.
pub struct Signal<T> {
    slots: Rc<RefCell<Slots<T>>>,
}

/// Disposer token returned by [`Signal::connect()`]. The receiver stays
/// connected for as long as the token is alive.
#[must_use = "dropping a `Connection` disconnects its receiver"]
pub struct Connection {
    disconnect: Option<Box<dyn FnOnce()>>,
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slots {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn connect<F>(&self, slot: F) -> Connection
    where
        F: Fn(&T) + 'static,
    {
        let id = {
            let mut slots = self.slots.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.push((id, Rc::new(slot)));
            id
        };

        let slots = Rc::downgrade(&self.slots);
        Connection {
            disconnect: Some(Box::new(move || {
                if let Some(slots) = slots.upgrade() {
                    slots.borrow_mut().entries.retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    pub fn emit(&self, args: &T) {
        let snapshot: Vec<(u64, Slot<T>)> = self.slots.borrow().entries.clone();

        for (id, slot) in snapshot {
            if self.is_connected(id) {
                slot(args);
            }
        }
    }

    /// Disconnects every receiver. Outstanding `Connection` tokens become
    /// inert.
    pub fn disconnect_all(&self) {
        self.slots.borrow_mut().entries.clear();
    }

    pub fn receiver_count(&self) -> usize {
        self.slots.borrow().entries.len()
    }

    fn is_connected(&self, id: u64) -> bool {
        self.slots
            .borrow()
            .entries
            .iter()
            .any(|(other, _)| *other == id)
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection {
    pub fn disconnect(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.run();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_emit_in_connection_order() {
        let signal = Signal::<i32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = signal.connect({
            let seen = seen.clone();
            move |value| seen.borrow_mut().push(("first", *value))
        });
        let _second = signal.connect({
            let seen = seen.clone();
            move |value| seen.borrow_mut().push(("second", *value))
        });

        signal.emit(&1);
        first.disconnect();
        signal.emit(&2);

        assert_eq!(*seen.borrow(), vec![("first", 1), ("second", 1), ("second", 2)]);
        assert_eq!(signal.receiver_count(), 1);
    }

    #[test]
    fn test_dropping_connection_disconnects() {
        let signal = Signal::<()>::new();
        let count = Rc::new(Cell::new(0));

        {
            let count = count.clone();
            let _connection = signal.connect(move |_| count.set(count.get() + 1));
            signal.emit(&());
        }
        signal.emit(&());

        assert_eq!(count.get(), 1);
        assert_eq!(signal.receiver_count(), 0);
    }

    #[test]
    fn test_receiver_disconnected_during_emit_is_skipped() {
        let signal = Rc::new(Signal::<()>::new());
        let later: Rc<RefCell<Option<Connection>>> = Rc::new(RefCell::new(None));
        let later_called = Rc::new(Cell::new(false));

        let _first = signal.connect({
            let later = later.clone();
            move |_| {
                later.borrow_mut().take();
            }
        });
        *later.borrow_mut() = Some(signal.connect({
            let later_called = later_called.clone();
            move |_| later_called.set(true)
        }));

        signal.emit(&());
        assert!(!later_called.get());
        assert_eq!(signal.receiver_count(), 1);
    }

    #[test]
    fn test_connect_during_emit_waits_for_next_emit() {
        let signal = Rc::new(Signal::<()>::new());
        let count = Rc::new(Cell::new(0));
        let added: Rc<RefCell<Vec<Connection>>> = Rc::new(RefCell::new(Vec::new()));

        let _adder = signal.connect({
            let signal = Rc::downgrade(&signal);
            let count = count.clone();
            let added = added.clone();
            move |_| {
                let Some(signal) = signal.upgrade() else {
                    return;
                };
                let count = count.clone();
                added
                    .borrow_mut()
                    .push(signal.connect(move |_| count.set(count.get() + 1)));
            }
        });

        signal.emit(&());
        assert_eq!(count.get(), 0);

        signal.emit(&());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_disconnect_all_makes_tokens_inert() {
        let signal = Signal::<()>::new();
        let connection = signal.connect(|_| {});
        signal.disconnect_all();
        assert_eq!(signal.receiver_count(), 0);
        connection.disconnect();
    }
}
