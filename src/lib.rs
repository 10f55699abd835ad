//! Portable core of the hopper panel firmware.
//!
//! # Overview
//!
//! The hopper panel is a small peripheral board that reports rotary-encoder
//! motion, encoder button presses and an optical hopper-level sensor to a
//! bus controller. Everything in this crate is free of hardware access so it
//! can be unit tested on the development host; the firmware binary wires it
//! to the STM32L031 pins and interrupt vectors.
//!
//! # Contexts
//!
//! - The encoder and button pin-change interrupts own a
//!   [`QuadratureDecoder`] and a [`DebouncedEdgeDetector`] respectively and
//!   are the only producers of events.
//! - The request handler owns a [`CommandDispatcher`] and is the only
//!   consumer: it drains the counters once per status request.
//! - [`EventStore`] is the single synchronisation point between the two.
//!
//! # Module Organization
//!
//! - [`encoder`] - Quadrature decoding and detent emission
//! - [`button`] - Debounced falling-edge detection
//! - [`event_store`] - Interrupt-safe counters with read-and-reset
//! - [`hopper`] - Hopper sensor measurement and classification
//! - [`dispatcher`] - Command set and status payload packing
//! - [`config`] - Board configuration
//! - [`error`] - Error types

#![cfg_attr(not(test), no_std)]

pub mod button;
pub mod config;
pub mod dispatcher;
pub mod encoder;
pub mod error;
pub mod event_store;
pub mod hopper;

pub use button::{DebouncedEdgeDetector, Press};
pub use config::PanelConfig;
pub use dispatcher::{Command, CommandDispatcher, Status, StatusReport};
pub use encoder::{Detent, EncoderSample, QuadratureDecoder};
pub use error::{CommandError, ConfigError};
pub use event_store::{DetentCount, EventStore, PressCount};
pub use hopper::{HopperState, Measurement};

/// Edge-triggered "new data available" output towards the bus controller.
///
/// Implementations must be callable from interrupt context.
pub trait Attention {
    /// Signals that new encoder, button or sensor data is available.
    fn assert(&self);
    /// Clears the signal once a request has collected the data.
    fn clear(&self);
}

/// State shared between the producer interrupts and the request handler.
pub struct PanelState {
    /// Debounced button presses since the last status request
    pub presses: PressCount,
    /// Encoder detents since the last status request
    pub detents: DetentCount,
    /// Latest hopper sensor reading
    pub hopper: HopperState,
}

impl PanelState {
    pub const fn new() -> Self {
        Self {
            presses: EventStore::new(0),
            detents: EventStore::new(0),
            hopper: HopperState::new(),
        }
    }
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new()
    }
}
