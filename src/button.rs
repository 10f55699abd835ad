//! Debounced falling-edge detection for the encoder push button.
//!
//! The button line idles high (external pull-up) and is pulled low while
//! pressed. The hardware filter leaves some bounce, mostly while the filter
//! sits at an indeterminate voltage, so edges are also filtered in time.

use crate::config::{DEBOUNCE_WINDOW_US, PanelConfig};

/// A debounced press of the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Press;

/// Turns raw pin-change interrupts into counted presses.
///
/// Owned by the button interrupt handler and persistent across invocations.
pub struct DebouncedEdgeDetector {
    /// Level after the last observed change, `true` = released
    previous_level: bool,
    /// Time of the last observed change; `None` until the first one
    last_transition_us: Option<u32>,
    /// Minimum spacing between two edges for the second to be genuine
    window_us: u32,
}

impl DebouncedEdgeDetector {
    /// Creates a detector for a released button.
    ///
    /// # Arguments
    ///
    /// * `window_us` - Debounce window in microseconds
    pub const fn new(window_us: u32) -> Self {
        Self {
            previous_level: true,
            last_transition_us: None,
            window_us,
        }
    }

    /// Creates a detector with the configured debounce window.
    pub const fn from_config(config: &PanelConfig) -> Self {
        Self::new(config.debounce_window_us)
    }

    /// Processes one pin-change interrupt.
    ///
    /// Returns a [`Press`] when a falling edge arrives more than the debounce
    /// window after the previous observed change. Every observed change
    /// restarts the window and flips the tracked level, even inside the
    /// window, so a burst of bounce can neither add presses nor block the
    /// next genuine edge.
    ///
    /// # Arguments
    ///
    /// * `level` - Sampled level of the button line, `true` = high
    /// * `now_us` - Free-running microsecond timestamp (may wrap)
    pub fn update(&mut self, level: bool, now_us: u32) -> Option<Press> {
        if level == self.previous_level {
            return None;
        }

        let settled = match self.last_transition_us {
            Some(last) => now_us.wrapping_sub(last) > self.window_us,
            None => true,
        };
        let press = (settled && self.previous_level).then_some(Press);

        self.last_transition_us = Some(now_us);
        self.previous_level = level;

        press
    }

    /// Level the detector believes the line is at.
    pub fn level(&self) -> bool {
        self.previous_level
    }
}

impl Default for DebouncedEdgeDetector {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW_US)
    }
}
