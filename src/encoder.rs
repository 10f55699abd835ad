//! Quadrature decoder for the panel's rotary encoder.
//!
//! The encoder has both outputs high while resting at a detent and runs
//! through one full quadrature cycle per detent. Turning clockwise, output A
//! goes low before B and returns high before B; counter-clockwise the order
//! is reversed. The click is felt when both outputs are high again, which is
//! where a detent is reported.
//!
//! ```text
//!   Clockwise:            Counter-clockwise:
//!   __.   ._____          ____.   ._____
//! A   |___|             A     |___|
//!   ____.   .___          __.   .___
//! B     |___|           B   |___|
//!           ^                     ^
//!           detent                detent
//! ```
//!
//! Both edges of both lines are decoded, so a knob nudged just past a detent
//! and back produces no event. Every edge adds or subtracts one from an
//! accumulator through [`TRANSITION_TABLE`]; the encoder rests at a detent
//! whenever the accumulator is a multiple of the detent size.
//!
//! # Invalid transitions
//!
//! True quadrature motion never changes both lines at once, but bounce and
//! noise occasionally make it look that way. Such a transition means the
//! shaft moved two steps in an unknown direction. The table accounts for it
//! as ±2 rather than 0: the absolute position may end up off by a whole
//! detent, but the accumulator keeps tracking the phase within the cycle,
//! so detent boundaries are still found at the right edge. A single bad
//! reading on one line is corrected by the next good one.

use crate::config::{DETENT_STEPS, PanelConfig, check_detent_steps};
use crate::error::ConfigError;

/// Accumulator change for `previous << 2 | current`, clockwise positive.
pub const TRANSITION_TABLE: [i8; 16] = [0, -1, 1, 2, 1, 0, 2, -1, -1, -2, 0, 1, -2, 1, -1, 0];

/// Two-bit reading of the encoder lines (bit 1 = A, bit 0 = B).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct EncoderSample(u8);

impl EncoderSample {
    /// Both lines high: the encoder rests at a detent.
    pub const IDLE: Self = Self(0b11);

    pub const fn from_lines(a: bool, b: bool) -> Self {
        Self((a as u8) << 1 | b as u8)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Direction of a completed detent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Detent {
    Clockwise,
    CounterClockwise,
}

/// Converts pin-change samples into detent events.
///
/// Owned by the encoder interrupt handler; the accumulator is never read
/// from any other context.
pub struct QuadratureDecoder {
    /// Sample seen on the previous interrupt
    previous: EncoderSample,
    /// Sub-detent position, corrected after every sample
    accumulator: i16,
    /// Sub-steps that make up one detent
    detent_steps: i16,
}

impl QuadratureDecoder {
    /// Decoder for the production encoder (4 sub-steps per detent).
    pub const DEFAULT: Self = match Self::new(DETENT_STEPS) {
        Ok(decoder) => decoder,
        Err(_) => panic!("default detent size out of range"),
    };

    /// Creates a decoder resting at a detent.
    ///
    /// Starting from [`EncoderSample::IDLE`] with an empty accumulator keeps
    /// the two consistent, so a spurious first interrupt resynchronises on
    /// the next one.
    ///
    /// # Arguments
    ///
    /// * `detent_steps` - Sub-steps per detent, 2–64
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDetentSteps`] outside that range
    pub const fn new(detent_steps: u8) -> Result<Self, ConfigError> {
        match check_detent_steps(detent_steps) {
            Ok(()) => Ok(Self {
                previous: EncoderSample::IDLE,
                accumulator: 0,
                detent_steps: detent_steps as i16,
            }),
            Err(e) => Err(e),
        }
    }

    /// Creates a decoder with the configured detent size.
    pub const fn from_config(config: &PanelConfig) -> Result<Self, ConfigError> {
        Self::new(config.detent_steps)
    }

    /// Processes one pin-change sample.
    ///
    /// Returns the detent completed by this sample, if any. At most one
    /// detent can complete per sample since a single transition moves the
    /// accumulator by two steps at most.
    pub fn update(&mut self, sample: EncoderSample) -> Option<Detent> {
        let key = usize::from(self.previous.bits() << 2 | sample.bits());
        self.accumulator += i16::from(TRANSITION_TABLE[key]);
        self.previous = sample;

        if self.accumulator >= self.detent_steps {
            self.accumulator -= self.detent_steps;
            Some(Detent::Clockwise)
        } else if self.accumulator <= -self.detent_steps {
            self.accumulator += self.detent_steps;
            Some(Detent::CounterClockwise)
        } else {
            None
        }
    }

    /// Current sub-detent position.
    pub fn accumulator(&self) -> i16 {
        self.accumulator
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_store::DetentCount;

    // (A, B) levels for one clockwise detent starting from rest.
    const CW_CYCLE: [(bool, bool); 4] = [(false, true), (false, false), (true, false), (true, true)];
    const CCW_CYCLE: [(bool, bool); 4] = [(true, false), (false, false), (false, true), (true, true)];

    fn feed(decoder: &mut QuadratureDecoder, store: &DetentCount, steps: &[(bool, bool)]) {
        for &(a, b) in steps {
            if let Some(detent) = decoder.update(EncoderSample::from_lines(a, b)) {
                store.record(detent);
            }
        }
    }

    #[test]
    fn table_matches_quadrature_order() {
        // Legal single-line transitions are ±1, repeats are 0.
        for key in [0b1101, 0b0100, 0b0010, 0b1011] {
            assert_eq!(TRANSITION_TABLE[key], 1);
        }
        for key in [0b1110, 0b1000, 0b0001, 0b0111] {
            assert_eq!(TRANSITION_TABLE[key], -1);
        }
        for key in [0b0000, 0b0101, 0b1010, 0b1111] {
            assert_eq!(TRANSITION_TABLE[key], 0);
        }
        // Both lines changing counts as two steps.
        for key in [0b0011, 0b0110, 0b1001, 0b1100] {
            assert_eq!(TRANSITION_TABLE[key].abs(), 2);
        }
    }

    #[test]
    fn one_clockwise_detent_from_rest() {
        let mut decoder = QuadratureDecoder::default();
        let store = DetentCount::new(0);

        let results: Vec<_> = CW_CYCLE
            .iter()
            .map(|&(a, b)| decoder.update(EncoderSample::from_lines(a, b)))
            .collect();

        assert_eq!(results, [None, None, None, Some(Detent::Clockwise)]);
        store.record(Detent::Clockwise);
        assert_eq!(store.drain(), 1);
        assert_eq!(decoder.accumulator(), 0);
    }

    #[test]
    fn full_cycles_count_regardless_of_drain_points() {
        let mut decoder = QuadratureDecoder::default();
        let store = DetentCount::new(0);
        let steps: Vec<_> = CW_CYCLE.iter().copied().cycle().take(4 * 7).collect();

        let mut total = 0i32;
        for chunk in steps.chunks(3) {
            feed(&mut decoder, &store, chunk);
            total += store.drain() as i32;
        }

        assert_eq!(total, 7);
        assert_eq!(decoder.accumulator(), 0);
    }

    #[test]
    fn counter_clockwise_cycles_count_negative() {
        let mut decoder = QuadratureDecoder::default();
        let store = DetentCount::new(0);
        for _ in 0..5 {
            feed(&mut decoder, &store, &CCW_CYCLE);
        }

        assert_eq!(store.drain(), -5);
        assert_eq!(decoder.accumulator(), 0);
    }

    #[test]
    fn partial_turn_and_back_reports_nothing() {
        let mut decoder = QuadratureDecoder::default();
        let store = DetentCount::new(0);
        feed(&mut decoder, &store, &[(false, true), (false, false), (false, true), (true, true)]);

        assert_eq!(store.drain(), 0);
        assert_eq!(decoder.accumulator(), 0);
    }

    #[test]
    fn contact_bounce_on_one_line_is_absorbed() {
        let mut decoder = QuadratureDecoder::default();
        let store = DetentCount::new(0);
        // A chatters while falling, then the cycle completes.
        feed(
            &mut decoder,
            &store,
            &[(false, true), (true, true), (false, true), (true, true), (false, true)],
        );
        feed(&mut decoder, &store, &CW_CYCLE[1..]);

        assert_eq!(store.drain(), 1);
        assert_eq!(decoder.accumulator(), 0);
    }

    #[test]
    fn accumulator_resynchronises_at_rest() {
        let mut decoder = QuadratureDecoder::default();
        let store = DetentCount::new(0);
        let noise = [(false, false), (true, false), (false, true), (true, false), (false, false), (true, true)];
        feed(&mut decoder, &store, &noise);
        assert_eq!(decoder.accumulator() % 4, 0);

        feed(&mut decoder, &store, &[(true, false), (true, true), (false, false), (true, true)]);
        assert_eq!(decoder.accumulator(), 0);
    }

    #[test]
    fn glitch_between_motions_keeps_detent_count() {
        let mut decoder = QuadratureDecoder::default();
        let store = DetentCount::new(0);
        feed(&mut decoder, &store, &CW_CYCLE);
        // Both lines appear to drop and recover together.
        feed(&mut decoder, &store, &[(false, false), (true, true)]);
        feed(&mut decoder, &store, &CW_CYCLE);

        assert_eq!(store.drain(), 2);
        assert_eq!(decoder.accumulator(), 0);
    }

    #[test]
    fn missed_sample_mid_cycle_still_finds_detent() {
        let mut decoder = QuadratureDecoder::default();
        let store = DetentCount::new(0);
        // The (false, false) sample is lost, so 01 -> 10 looks like a double step.
        feed(&mut decoder, &store, &[(false, true), (true, false), (true, true)]);

        assert_eq!(store.drain(), 1);
        assert_eq!(decoder.accumulator(), 0);
    }

    #[test]
    fn constructor_rejects_unusable_detent_sizes() {
        for steps in [0, 1, 65, 200] {
            assert!(matches!(
                QuadratureDecoder::new(steps),
                Err(ConfigError::InvalidDetentSteps)
            ));
        }
        let config = PanelConfig {
            detent_steps: 0,
            ..PanelConfig::DEFAULT
        };
        assert!(QuadratureDecoder::from_config(&config).is_err());
    }

    #[test]
    fn two_step_detents() {
        let mut decoder = QuadratureDecoder::new(2).unwrap();
        let store = DetentCount::new(0);

        // Half a cycle per detent.
        feed(&mut decoder, &store, &CW_CYCLE[..2]);
        assert_eq!(store.drain(), 1);
        feed(&mut decoder, &store, &CW_CYCLE[2..]);
        assert_eq!(store.drain(), 1);
        feed(&mut decoder, &store, &CCW_CYCLE);
        assert_eq!(store.drain(), -2);

        // A double step lands exactly on a detent in either direction.
        assert_eq!(
            decoder.update(EncoderSample::from_lines(false, false)),
            Some(Detent::CounterClockwise)
        );
        assert_eq!(decoder.update(EncoderSample::IDLE), Some(Detent::Clockwise));
        assert_eq!(decoder.accumulator(), 0);
    }

    #[test]
    fn eight_step_detents() {
        let config = PanelConfig {
            detent_steps: 8,
            ..PanelConfig::DEFAULT
        };
        let mut decoder = QuadratureDecoder::from_config(&config).unwrap();
        let store = DetentCount::new(0);

        feed(&mut decoder, &store, &CW_CYCLE);
        assert_eq!(store.pending(), 0);
        assert_eq!(decoder.accumulator(), 4);

        // Glitch to both-low and back, then the second half of the detent.
        feed(&mut decoder, &store, &[(false, false), (true, true)]);
        assert_eq!(decoder.accumulator(), 4);
        feed(&mut decoder, &store, &CW_CYCLE);
        assert_eq!(store.drain(), 1);
        assert_eq!(decoder.accumulator(), 0);

        // Missed sample inside a counter-clockwise detent.
        feed(&mut decoder, &store, &CCW_CYCLE);
        feed(&mut decoder, &store, &[(true, false), (false, true), (true, true)]);
        assert_eq!(store.drain(), -1);
        assert_eq!(decoder.accumulator(), 0);
    }

    #[test]
    fn spurious_first_interrupt_resynchronises() {
        let mut decoder = QuadratureDecoder::default();
        assert_eq!(decoder.update(EncoderSample::IDLE), None);
        assert_eq!(decoder.accumulator(), 0);
    }
}
