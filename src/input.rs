//! Pin-change interrupts for the rotary encoder and its push button.
//!
//! Both encoder lines share the `EXTI0_1` vector and the button uses
//! `EXTI2_3`; [`PanelConfig::validate`] only accepts lines those vectors
//! serve. Every edge of every line is delivered.
//!
//! [`PanelInputs::setup`] builds the decoder and debouncer from the
//! validated config and installs them before any line is unmasked. After
//! that, each is borrowed only by its own handler; the handlers touch shared
//! state only through [`PANEL`]'s event stores.
//!
//! # Interrupt Flow
//!
//! ```text
//! edge on ENC_A/ENC_B -> EXTI0_1 -> QuadratureDecoder -> PANEL.detents
//! edge on ENC_SW      -> EXTI2_3 -> DebouncedEdgeDetector -> PANEL.presses
//!                                      \-> STATUS_LINE.assert()
//! ```

use core::cell::RefCell;

use cortex_m::peripheral::NVIC;
use embassy_stm32::{
    gpio::Input,
    interrupt as irq,
    pac::{self, gpio::vals::Idr, interrupt},
};
use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use embassy_time::Instant;
use hopper_panel::{
    Attention, ConfigError, DebouncedEdgeDetector, EncoderSample, PanelConfig, PanelState,
    QuadratureDecoder,
};

use crate::hardware::STATUS_LINE;

/// Counters and sensor state shared with the bus task.
pub static PANEL: PanelState = PanelState::new();

/// Encoder handler state, installed by [`PanelInputs::setup`].
static ENCODER: Mutex<CriticalSectionRawMutex, RefCell<Option<EncoderHandler>>> =
    Mutex::new(RefCell::new(None));

/// Button handler state, installed by [`PanelInputs::setup`].
static BUTTON: Mutex<CriticalSectionRawMutex, RefCell<Option<ButtonHandler>>> =
    Mutex::new(RefCell::new(None));

/// EXTICR port selector for GPIOA.
const PORT_A: u8 = 0;

/// EXTI registers for lines 0-31 live at index 0.
const EXTI_REG_IDX: usize = 0;

struct EncoderHandler {
    decoder: QuadratureDecoder,
    a_line: u8,
    b_line: u8,
}

struct ButtonHandler {
    detector: DebouncedEdgeDetector,
    line: u8,
}

/// Encoder and button inputs held in input mode for the lifetime of the
/// firmware.
pub struct PanelInputs {
    config: PanelConfig,
    _encoder_a: Input<'static>,
    _encoder_b: Input<'static>,
    _button: Input<'static>,
}

impl PanelInputs {
    /// Takes ownership of the three input pins.
    ///
    /// The inputs rely on the board's external pull-ups. `config` names the
    /// EXTI lines these pins sit on.
    pub fn new(
        config: PanelConfig,
        encoder_a: Input<'static>,
        encoder_b: Input<'static>,
        button: Input<'static>,
    ) -> Self {
        Self {
            config,
            _encoder_a: encoder_a,
            _encoder_b: encoder_b,
            _button: button,
        }
    }

    /// Enables pin-change interrupts on both edges of every line.
    ///
    /// Any edge latched while the pins were being configured (power-on
    /// noise, earlier trigger settings) is discarded before the NVIC vectors
    /// are unmasked, so the first interrupt seen is a real one.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] of an invalid config without touching
    /// the EXTI or NVIC.
    pub fn setup(&self) -> Result<(), ConfigError> {
        let config = &self.config;
        config.validate()?;

        let encoder = EncoderHandler {
            decoder: QuadratureDecoder::from_config(config)?,
            a_line: config.encoder_a_line,
            b_line: config.encoder_b_line,
        };
        let button = ButtonHandler {
            detector: DebouncedEdgeDetector::from_config(config),
            line: config.button_line,
        };
        ENCODER.lock(|handler| handler.replace(Some(encoder)));
        BUTTON.lock(|handler| handler.replace(Some(button)));

        let exti = pac::EXTI;
        let lines = [config.encoder_a_line, config.encoder_b_line, config.button_line];

        pac::RCC.apb2enr().modify(|w| w.set_syscfgen(true));

        for line in lines.map(usize::from) {
            pac::SYSCFG
                .exticr(line / 4)
                .modify(|w| w.set_exti(line % 4, PORT_A));
            exti.rtsr(EXTI_REG_IDX).modify(|w| w.set_line(line, true));
            exti.ftsr(EXTI_REG_IDX).modify(|w| w.set_line(line, true));
            exti.imr(EXTI_REG_IDX).modify(|w| w.set_line(line, true));
        }

        critical_section::with(|_| {
            for line in lines {
                clear_pending(line);
            }
            NVIC::unpend(irq::EXTI0_1);
            NVIC::unpend(irq::EXTI2_3);
        });

        unsafe {
            NVIC::unmask(irq::EXTI0_1);
            NVIC::unmask(irq::EXTI2_3);
        }

        Ok(())
    }
}

/// Acknowledges a pending edge on `line`.
///
/// The pending register is write-one-to-clear, so it is written, not
/// modified, to leave other lines' flags alone.
fn clear_pending(line: u8) {
    pac::EXTI
        .pr(EXTI_REG_IDX)
        .write(|w| w.set_line(usize::from(line), true));
}

fn is_high(line: u8) -> bool {
    pac::GPIOA.idr().read().idr(usize::from(line)) == Idr::HIGH
}

/// Encoder interrupt (EXTI lines 0 and 1).
#[interrupt]
fn EXTI0_1() {
    ENCODER.lock(|handler| {
        if let Some(encoder) = handler.borrow_mut().as_mut() {
            clear_pending(encoder.a_line);
            clear_pending(encoder.b_line);

            let sample = EncoderSample::from_lines(is_high(encoder.a_line), is_high(encoder.b_line));
            if let Some(detent) = encoder.decoder.update(sample) {
                PANEL.detents.record(detent);
                STATUS_LINE.assert();
            }
        }
    });
}

/// Button interrupt (EXTI lines 2 and 3).
#[interrupt]
fn EXTI2_3() {
    BUTTON.lock(|handler| {
        if let Some(button) = handler.borrow_mut().as_mut() {
            clear_pending(button.line);

            let now_us = Instant::now().as_micros() as u32;
            if button.detector.update(is_high(button.line), now_us).is_some() {
                PANEL.presses.increment();
                STATUS_LINE.assert();
            }
        }
    });
}
