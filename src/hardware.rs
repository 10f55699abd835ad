//! Hardware abstraction and peripheral initialization.
//!
//! This module defines the pin mappings and peripheral initialization
//! for the hopper panel board.
//!
//! # Pin Assignments
//!
//! ## Rotary Encoder (external pull-ups)
//! - **PA0**: ENC_A - Encoder output A (EXTI line 0)
//! - **PA1**: ENC_B - Encoder output B (EXTI line 1)
//! - **PA2**: ENC_SW - Encoder push button, low when pressed (EXTI line 2;
//!   PA3/line 3 on boards configured with `button_line = 3`)
//!
//! ## Bus
//! - **PB6**: SCL - I2C1 clock
//! - **PB7**: SDA - I2C1 data
//! - **PA4**: STATUS - Attention output to the bus controller (active high)
//!
//! ## Hopper Sensor
//! - **PA5**: H_LED - IR LED enable
//! - **PA6**: H_SENS - Photo-transistor (ADC_IN6)
//!
//! ## Display Power
//! - **PA7**: EN_3V3 - Display logic supply enable
//! - **PA8**: EN_BOOST - Display LED boost converter enable
//! - **PB1**: RES_DISPLAY - Display reset, external pull-up to 3V3
//!
//! ## Debug (SWD)
//! - **PA13**: SWDIO
//! - **PA14**: SWCLK

use embassy_stm32::{
    adc::{self, Adc, AdcChannel},
    bind_interrupts,
    gpio::{Flex, Input, Level, Output, Pull, Speed},
    i2c::{self, I2c},
    mode::Async,
    pac, peripherals,
    time::Hertz,
};
use hopper_panel::{Attention, PanelConfig};

use crate::display::DisplayPower;
use crate::input::PanelInputs;
use crate::sensor::HopperSensor;

bind_interrupts!(struct Irqs {
    ADC1_COMP => adc::InterruptHandler<peripherals::ADC1>;
    I2C1 => i2c::EventInterruptHandler<peripherals::I2C1>, i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

/// Pin number of the STATUS line on port A.
const STATUS_PIN: usize = 4;

/// Attention output, driven through the port's set/reset register.
///
/// BSRR writes are single stores, so the line can be set from the encoder
/// and button interrupts and cleared from the bus task without sharing the
/// `Output` handle.
pub struct StatusLine;

impl Attention for StatusLine {
    fn assert(&self) {
        pac::GPIOA.bsrr().write(|w| w.set_bs(STATUS_PIN, true));
    }

    fn clear(&self) {
        pac::GPIOA.bsrr().write(|w| w.set_br(STATUS_PIN, true));
    }
}

/// Shared handle used by every context that touches the attention line.
pub static STATUS_LINE: StatusLine = StatusLine;

/// Top-level peripheral container for the hopper panel.
///
/// Owns all hardware controllers and provides initialization
/// from STM32 peripheral singleton.
pub struct Peripherals {
    /// Encoder and button pin-change inputs
    pub inputs: PanelInputs,
    /// Display power sequencing outputs
    pub display: DisplayPower,
    /// Hopper sensor LED and ADC
    pub hopper: HopperSensor,
    /// Bus peripheral, still in controller mode
    pub i2c: I2c<'static, Async, i2c::Master>,
    /// Keeps PA4 configured as a push-pull output for [`StatusLine`]
    _status: Output<'static>,
}

impl Peripherals {
    /// Initializes all peripherals from STM32 peripheral singleton.
    ///
    /// # Initial GPIO States
    ///
    /// - PA0, PA1, PA2/PA3 (encoder, button): Inputs, no internal pull
    /// - PA4 (STATUS): Low (no data pending)
    /// - PA5 (H_LED): Low (LED off)
    /// - PA7 (EN_3V3): Low (display logic off)
    /// - PA8 (EN_BOOST): Low (display LEDs off)
    /// - PB1 (RES_DISPLAY): Untouched until [`DisplayPower::power_up`]
    ///
    /// The encoder lines are always PA0/PA1 (which one is A is up to
    /// `config`); the button is PA2 or PA3 following `config.button_line`.
    ///
    /// # Arguments
    ///
    /// * `p` - STM32 peripheral singleton from embassy_stm32::init()
    /// * `config` - Validated panel configuration
    pub fn new(p: embassy_stm32::Peripherals, config: &PanelConfig) -> Self {
        let mut i2c_config = i2c::Config::default();
        i2c_config.frequency = Hertz::khz(100);

        let button = match config.button_line {
            3 => Input::new(p.PA3, Pull::None),
            _ => Input::new(p.PA2, Pull::None),
        };

        Self {
            inputs: PanelInputs::new(
                *config,
                Input::new(p.PA0, Pull::None),
                Input::new(p.PA1, Pull::None),
                button,
            ),
            display: DisplayPower::new(
                Flex::new(p.PB1),
                Output::new(p.PA7, Level::Low, Speed::Low),
                Output::new(p.PA8, Level::Low, Speed::Low),
            ),
            hopper: HopperSensor::new(
                Output::new(p.PA5, Level::Low, Speed::Low),
                Adc::new(p.ADC1, Irqs),
                p.PA6.degrade_adc(),
            ),
            i2c: I2c::new(
                p.I2C1, p.PB6, p.PB7, Irqs, p.DMA1_CH2, p.DMA1_CH3, i2c_config,
            ),
            _status: Output::new(p.PA4, Level::Low, Speed::Low),
        }
    }
}
