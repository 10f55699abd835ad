//! Hopper sensor sampling.
//!
//! One measurement takes two ADC readings of the photo-transistor: with the
//! IR LED on and with it off. The difference tells ambient light apart from
//! the LED's own light.

use embassy_stm32::{
    adc::{Adc, AnyAdcChannel},
    gpio::Output,
    peripherals::ADC1,
};
use embassy_time::Timer;
use hopper_panel::Measurement;

/// Photo-transistor settle time after switching the LED.
const LED_SETTLE_MS: u64 = 10;

/// IR LED and ADC channel of the hopper sensor.
pub struct HopperSensor {
    /// IR LED enable (active high)
    led: Output<'static>,
    adc: Adc<'static, ADC1>,
    sense: AnyAdcChannel<ADC1>,
}

impl HopperSensor {
    pub fn new(led: Output<'static>, adc: Adc<'static, ADC1>, sense: AnyAdcChannel<ADC1>) -> Self {
        Self { led, adc, sense }
    }

    /// Takes one LED-on/LED-off reading pair.
    ///
    /// Leaves the LED off.
    pub async fn measure(&mut self) -> Measurement {
        self.led.set_high();
        Timer::after_millis(LED_SETTLE_MS).await;
        let on = self.adc.read(&mut self.sense).await;

        self.led.set_low();
        Timer::after_millis(LED_SETTLE_MS).await;
        let off = self.adc.read(&mut self.sense).await;

        Measurement { on, off }
    }
}
