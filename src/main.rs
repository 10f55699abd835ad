//! Firmware for the hopper panel: rotary encoder, push button and hopper
//! level sensor behind an I2C target interface.
//!
//! # Overview
//!
//! The panel reports to a bus controller:
//! - Encoder detents turned since the last status request (signed)
//! - Button presses since the last status request
//! - Whether the optical hopper sensor sees its LED
//!
//! A STATUS output is raised whenever any of these change, so the
//! controller only has to poll when there is something to collect.
//!
//! # Hardware
//!
//! - **MCU**: STM32L031G6U6 (Cortex-M0+)
//! - **Encoder**: Mechanical quadrature encoder with push button, external pull-ups
//! - **Hopper sensor**: IR LED + photo-transistor on ADC_IN6
//! - **Display**: Powered up by this firmware, driven by the controller
//!
//! # Execution Contexts
//!
//! - `EXTI0_1` / `EXTI2_3` interrupts decode the encoder and debounce the
//!   button, counting into the shared event stores
//! - **bus_task** answers bus requests and drains the event stores
//! - The main loop samples the hopper sensor continuously
//!
//! # Module Organization
//!
//! - [`input`] - Pin-change interrupt setup and handlers
//! - [`bus`] - I2C target transport
//! - [`sensor`] - Hopper sensor sampling
//! - [`display`] - Display power-up sequence
//! - [`hardware`] - Pin mappings and peripheral initialization

#![no_std]
#![no_main]

mod bus;
mod display;
mod hardware;
mod input;
mod sensor;

use embassy_executor::Spawner;
use embassy_stm32::{Config, rcc::LsConfig};
use hopper_panel::{Attention, PanelConfig};
use {defmt_rtt as _, panic_probe as _};

use bus::bus_task;
use hardware::{Peripherals, STATUS_LINE};
use input::PANEL;

/// Creates the clock configuration for STM32L031.
///
/// # Clock Settings
///
/// - **HSI16**: 16 MHz internal oscillator as system clock (no PLL)
/// - **LSI**: RTC/watchdog clock, no external crystal fitted
/// - **Voltage scale**: Range 1
///
/// 16 MHz keeps the I2C target timing comfortable while the board runs
/// from the bus supply.
///
/// # Returns
///
/// Configured RCC settings for embassy-stm32 initialization
fn create_clock_config() -> embassy_stm32::rcc::Config {
    embassy_stm32::rcc::Config {
        msi: None,
        hsi: true,
        hse: None,
        pll: None,
        sys: embassy_stm32::rcc::Sysclk::HSI,
        ahb_pre: embassy_stm32::rcc::AHBPrescaler::DIV1,
        apb1_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        apb2_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        ls: LsConfig::default(),
        voltage_scale: embassy_stm32::rcc::VoltageScale::RANGE1,
        mux: embassy_stm32::rcc::mux::ClockMux::default(),
    }
}

/// Main entry point for hopper panel firmware.
///
/// # Initialization Sequence
///
/// 1. Configure clocks
/// 2. Initialize STM32 peripherals and GPIO
/// 3. Switch I2C to target mode and spawn the bus task
/// 4. Enable encoder/button interrupts, discarding start-up edges
/// 5. Run the display power-up sequence
/// 6. Enter the hopper measurement loop
///
/// # Spawned Tasks
///
/// - **bus_task**: Serves bus requests
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let config = PanelConfig::DEFAULT;
    config.validate().unwrap();

    let mut stm32_config = Config::default();
    stm32_config.rcc = create_clock_config();

    let p = embassy_stm32::init(stm32_config);

    #[cfg(feature = "debug-mode")]
    {
        defmt::info!("Hopper panel firmware starting...");
        defmt::info!("Waiting 3 seconds for debugger connection...");
        embassy_time::Timer::after_secs(3).await;
    }

    #[cfg(feature = "debug-mode")]
    defmt::info!("Initializing peripherals...");

    let mut peripherals = Peripherals::new(p, &config);

    #[cfg(feature = "debug-mode")]
    defmt::info!("Listening on bus address {=u8:#x}...", config.bus_address);

    spawner
        .spawn(bus_task(bus::into_target(peripherals.i2c, &config)))
        .unwrap();

    #[cfg(feature = "debug-mode")]
    defmt::info!("Enabling encoder and button interrupts...");

    peripherals.inputs.setup().unwrap();

    #[cfg(feature = "debug-mode")]
    defmt::info!("Powering up display...");

    peripherals.display.power_up().await;

    #[cfg(feature = "debug-mode")]
    defmt::info!("Entering hopper measurement loop...");

    loop {
        let measurement = peripherals.hopper.measure().await;

        if PANEL.hopper.publish(measurement, config.hopper_threshold) {
            #[cfg(feature = "debug-mode")]
            defmt::info!("Hopper flag changed: {}", measurement);

            STATUS_LINE.assert();
        }
    }
}
