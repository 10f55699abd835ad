//! Hopper level sensor state.
//!
//! The sensor is an IR LED facing a photo-transistor read by the ADC. The
//! firmware samples it once with the LED on and once with it off; a lower
//! reading means more light. Sampling lives in the firmware, the latest
//! result is published here for the request handler.

use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use portable_atomic::{AtomicBool, Ordering};

/// Raw ADC readings of one measurement cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Measurement {
    /// Reading with the LED on
    pub on: u16,
    /// Reading with the LED off
    pub off: u16,
}

impl Measurement {
    /// Whether the LED light reaches the sensor.
    pub fn light_detected(&self, threshold: u16) -> bool {
        self.on < self.off && self.off - self.on > threshold
    }

    /// Big-endian `on` followed by big-endian `off`.
    pub fn to_be_bytes(&self) -> [u8; 4] {
        let [on_hi, on_lo] = self.on.to_be_bytes();
        let [off_hi, off_lo] = self.off.to_be_bytes();
        [on_hi, on_lo, off_hi, off_lo]
    }
}

/// Latest measurement and the derived status flag.
pub struct HopperState {
    /// Both readings are published together so a reader never sees a mix
    /// of two cycles.
    latest: Mutex<CriticalSectionRawMutex, Cell<Measurement>>,
    empty: AtomicBool,
}

impl HopperState {
    pub const fn new() -> Self {
        Self {
            latest: Mutex::new(Cell::new(Measurement { on: 0, off: 0 })),
            empty: AtomicBool::new(false),
        }
    }

    /// Stores a new measurement and updates the status flag.
    ///
    /// Returns `true` when the flag changed, in which case the caller
    /// raises the attention signal.
    pub fn publish(&self, measurement: Measurement, threshold: u16) -> bool {
        self.latest.lock(|latest| latest.set(measurement));

        let empty = measurement.light_detected(threshold);
        self.empty.swap(empty, Ordering::AcqRel) != empty
    }

    pub fn measurement(&self) -> Measurement {
        self.latest.lock(|latest| latest.get())
    }

    /// Flag reported in bit 7 of the status byte.
    pub fn is_empty(&self) -> bool {
        self.empty.load(Ordering::Acquire)
    }
}

impl Default for HopperState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_needs_difference_above_threshold() {
        assert!(Measurement { on: 100, off: 200 }.light_detected(20));
        assert!(!Measurement { on: 180, off: 200 }.light_detected(20));
        assert!(!Measurement { on: 179, off: 200 }.light_detected(21));
        assert!(!Measurement { on: 300, off: 200 }.light_detected(20));
    }

    #[test]
    fn publish_reports_flag_changes_only() {
        let hopper = HopperState::new();
        let dark = Measurement { on: 500, off: 510 };
        let lit = Measurement { on: 100, off: 510 };

        assert!(!hopper.publish(dark, 20));
        assert!(hopper.publish(lit, 20));
        assert!(hopper.is_empty());
        assert!(!hopper.publish(lit, 20));
        assert!(hopper.publish(dark, 20));
        assert!(!hopper.is_empty());
        assert_eq!(hopper.measurement(), dark);
    }

    #[test]
    fn measurement_bytes_are_big_endian() {
        let m = Measurement { on: 0x0123, off: 0x03ff };
        assert_eq!(m.to_be_bytes(), [0x01, 0x23, 0x03, 0xff]);
    }
}
