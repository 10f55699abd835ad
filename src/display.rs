//! Display power sequencing.
//!
//! The display needs its logic supply up and its reset released before the
//! LED boost converter is enabled. RES_DISPLAY has an external pull-up to
//! the 3V3 rail, so the display would leave reset as soon as 3V3 comes up;
//! the pin is held low first and later released by floating it rather than
//! driving it high, which would put 5V on a 3V3 input.

use embassy_stm32::gpio::{Flex, Output, Pull, Speed};
use embassy_time::Timer;

/// Delay between enabling 3V3 and releasing reset.
const SUPPLY_SETTLE_MS: u64 = 1;

/// Delay between releasing reset and enabling the boost converter.
const RESET_RELEASE_MS: u64 = 1;

/// Time for the boost converter to come up.
const BOOST_SETTLE_MS: u64 = 5;

/// Display supply and reset control.
pub struct DisplayPower {
    /// Active-low display reset, open-drain by switching direction
    reset_n: Flex<'static>,
    /// Enable for the display logic supply
    en_3v3: Output<'static>,
    /// Enable for the LED boost converter
    en_boost: Output<'static>,
}

impl DisplayPower {
    pub fn new(reset_n: Flex<'static>, en_3v3: Output<'static>, en_boost: Output<'static>) -> Self {
        Self {
            reset_n,
            en_3v3,
            en_boost,
        }
    }

    /// Runs the power-up sequence once at start-up.
    ///
    /// The delays are slower than the datasheet minimum.
    pub async fn power_up(&mut self) {
        self.reset_n.set_low();
        self.reset_n.set_as_output(Speed::Low);

        self.en_3v3.set_high();
        Timer::after_millis(SUPPLY_SETTLE_MS).await;

        self.reset_n.set_as_input(Pull::None);
        Timer::after_millis(RESET_RELEASE_MS).await;

        self.en_boost.set_high();
        Timer::after_millis(BOOST_SETTLE_MS).await;
    }
}
