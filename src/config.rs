//! Board configuration.
//!
//! Replaces per-board compile-time constants with a single struct that is
//! handed to each component at construction. [`PanelConfig::DEFAULT`] is a
//! `const` so it can be used in static initializers.
//!
//! The pin-change lines are limited to what the interrupt vectors serve:
//! both encoder lines share the line 0–1 vector and the button sits on the
//! line 2–3 vector.

use core::ops::RangeInclusive;

use crate::error::ConfigError;

/// Debounce window for the encoder button.
///
/// The Schmitt trigger on the button line does not filter enough on its
/// own, so edges closer together than this are treated as bounce.
pub const DEBOUNCE_WINDOW_US: u32 = 5_000;

/// Quadrature sub-steps between two mechanical detents.
pub const DETENT_STEPS: u8 = 4;

/// Smallest detent size; a sample moves the decoder by up to 2 steps.
pub const MIN_DETENT_STEPS: u8 = 2;

/// Largest detent size.
pub const MAX_DETENT_STEPS: u8 = 64;

/// Lines served by the encoder interrupt.
pub const ENCODER_LINES: RangeInclusive<u8> = 0..=1;

/// Lines served by the button interrupt.
pub const BUTTON_LINES: RangeInclusive<u8> = 2..=3;

/// Minimum ADC difference between LED-off and LED-on readings.
pub const HOPPER_THRESHOLD: u16 = 20;

/// Default 7-bit bus address.
pub const BUS_ADDRESS: u8 = 0x08;

/// Runtime-independent parameters of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct PanelConfig {
    /// Pin-change line of encoder output A (0 or 1)
    pub encoder_a_line: u8,
    /// Pin-change line of encoder output B (0 or 1)
    pub encoder_b_line: u8,
    /// Pin-change line of the encoder push button (2 or 3)
    pub button_line: u8,
    /// Button debounce window in microseconds
    pub debounce_window_us: u32,
    /// Quadrature sub-steps per detent
    pub detent_steps: u8,
    /// Hopper sensor light threshold in ADC counts
    pub hopper_threshold: u16,
    /// 7-bit bus address the panel answers on
    pub bus_address: u8,
}

impl PanelConfig {
    /// Wiring of the production board.
    pub const DEFAULT: Self = Self {
        encoder_a_line: 0,
        encoder_b_line: 1,
        button_line: 2,
        debounce_window_us: DEBOUNCE_WINDOW_US,
        detent_steps: DETENT_STEPS,
        hopper_threshold: HOPPER_THRESHOLD,
        bus_address: BUS_ADDRESS,
    };

    /// Checks that the configuration can drive the decoder and the
    /// pin-change handlers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_detent_steps(self.detent_steps)?;

        for line in [self.encoder_a_line, self.encoder_b_line] {
            if !ENCODER_LINES.contains(&line) {
                return Err(ConfigError::InvalidLine(line));
            }
        }
        if self.encoder_a_line == self.encoder_b_line {
            return Err(ConfigError::LineConflict(self.encoder_a_line));
        }
        if !BUTTON_LINES.contains(&self.button_line) {
            return Err(ConfigError::InvalidLine(self.button_line));
        }

        Ok(())
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Range check shared by [`PanelConfig::validate`] and the decoder
/// constructor.
pub(crate) const fn check_detent_steps(steps: u8) -> Result<(), ConfigError> {
    if steps < MIN_DETENT_STEPS || steps > MAX_DETENT_STEPS {
        Err(ConfigError::InvalidDetentSteps)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(PanelConfig::default().validate(), Ok(()));
        assert_eq!(PanelConfig::DEFAULT.debounce_window_us, 5_000);
        assert_eq!(PanelConfig::DEFAULT.detent_steps, 4);
    }

    #[test]
    fn rejects_detent_steps_out_of_range() {
        for steps in [0, 1, 65, 200, 255] {
            let config = PanelConfig {
                detent_steps: steps,
                ..PanelConfig::DEFAULT
            };
            assert_eq!(config.validate(), Err(ConfigError::InvalidDetentSteps));
        }
    }

    #[test]
    fn accepts_swapped_encoder_lines_and_alternate_button_line() {
        let config = PanelConfig {
            encoder_a_line: 1,
            encoder_b_line: 0,
            button_line: 3,
            ..PanelConfig::DEFAULT
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_lines_without_a_handler() {
        let config = PanelConfig {
            button_line: 5,
            ..PanelConfig::DEFAULT
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidLine(5)));

        let config = PanelConfig {
            button_line: 1,
            ..PanelConfig::DEFAULT
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidLine(1)));

        let config = PanelConfig {
            encoder_b_line: 2,
            ..PanelConfig::DEFAULT
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidLine(2)));

        let config = PanelConfig {
            encoder_a_line: 16,
            ..PanelConfig::DEFAULT
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidLine(16)));
    }

    #[test]
    fn rejects_shared_encoder_lines() {
        let config = PanelConfig {
            encoder_b_line: 0,
            ..PanelConfig::DEFAULT
        };
        assert_eq!(config.validate(), Err(ConfigError::LineConflict(0)));
    }
}
