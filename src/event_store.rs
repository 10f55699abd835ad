//! Interrupt-safe event counters.
//!
//! An [`EventStore`] is the only state shared between a producer interrupt
//! and the request handler. Every operation runs inside its own critical
//! section (interrupts masked on the single-core target), scoped to the
//! read-modify-write of the counter and nothing else:
//!
//! - the producer never loses an increment that races with a drain;
//! - the consumer never sees a half-applied update.
//!
//! Counters saturate instead of wrapping, so a controller that stops polling
//! sees a large count rather than a small, wrong one.

use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};

use crate::encoder::Detent;

/// A counter with one producer context and one consumer context.
pub struct EventStore<T> {
    count: Mutex<CriticalSectionRawMutex, Cell<T>>,
}

/// Debounced button presses since the last drain.
pub type PressCount = EventStore<u8>;

/// Signed encoder detents since the last drain.
pub type DetentCount = EventStore<i8>;

impl<T: Copy + Default> EventStore<T> {
    pub const fn new(initial: T) -> Self {
        Self {
            count: Mutex::new(Cell::new(initial)),
        }
    }

    /// Reads the counter and resets it to zero in one step.
    ///
    /// Called only from the consumer context, once per status request.
    pub fn drain(&self) -> T {
        self.count.lock(|count| count.replace(T::default()))
    }

    /// Value accumulated since the last drain, without resetting it.
    pub fn pending(&self) -> T {
        self.count.lock(|count| count.get())
    }

    fn update(&self, f: impl FnOnce(T) -> T) {
        self.count.lock(|count| count.set(f(count.get())));
    }
}

impl EventStore<u8> {
    pub fn increment(&self) {
        self.update(|n| n.saturating_add(1));
    }
}

impl EventStore<i8> {
    pub fn increment(&self) {
        self.update(|n| n.saturating_add(1));
    }

    pub fn decrement(&self) {
        self.update(|n| n.saturating_sub(1));
    }

    /// Counts a detent in its direction of rotation.
    pub fn record(&self, detent: Detent) {
        match detent {
            Detent::Clockwise => self.increment(),
            Detent::CounterClockwise => self.decrement(),
        }
    }
}
