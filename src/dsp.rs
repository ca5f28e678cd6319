//! Small control-rate helpers shared by the node variants.

use core::f32::consts::FRAC_PI_4;

/// Rising-edge detector with hysteresis.
///
/// Fires once when the input crosses `1.0` upward, and re-arms only after the
/// input falls back to `0.0` or below.
#[derive(Clone, Copy, Debug, Default)]
pub struct SchmittTrigger {
    high: bool,
}

impl SchmittTrigger {
    pub const LOW: f32 = 0.0;
    pub const HIGH: f32 = 1.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true on the frame the input goes high.
    #[inline]
    pub fn process(&mut self, input: f32) -> bool {
        if self.high {
            if input <= Self::LOW {
                self.high = false;
            }
            false
        } else if input >= Self::HIGH {
            self.high = true;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn is_high(&self) -> bool {
        self.high
    }
}

/// Counts frames and fires every `division` calls.
#[derive(Clone, Copy, Debug)]
pub struct ClockDivider {
    clock: u32,
    division: u32,
}

impl ClockDivider {
    pub fn new(division: u32) -> Self {
        Self {
            clock: 0,
            division: division.max(1),
        }
    }

    pub fn set_division(&mut self, division: u32) {
        self.division = division.max(1);
        self.clock = self.clock.min(self.division - 1);
    }

    #[inline]
    pub fn division(&self) -> u32 {
        self.division
    }

    #[inline]
    pub fn process(&mut self) -> bool {
        self.clock += 1;
        if self.clock >= self.division {
            self.clock = 0;
            true
        } else {
            false
        }
    }
}

/// Convert a linear amplitude to decibels.
#[inline]
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    20.0 * amplitude.log10()
}

/// Peak follower with exponential release, read out in dB.
#[derive(Clone, Copy, Debug)]
pub struct LevelFollower {
    value: f32,
    /// Release rate in 1/s.
    lambda: f32,
}

impl Default for LevelFollower {
    fn default() -> Self {
        Self {
            value: 0.0,
            lambda: 30.0,
        }
    }
}

impl LevelFollower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda.max(0.0);
        self
    }

    /// Jump up to a new peak instantly, decay toward it otherwise.
    #[inline]
    pub fn process(&mut self, sample_time: f32, input: f32) {
        let input = input.abs();
        if input >= self.value {
            self.value = input;
        } else {
            self.value += (input - self.value) * (self.lambda * sample_time).min(1.0);
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Current level in dB. Negative infinity when silent.
    #[inline]
    pub fn db(&self) -> f32 {
        amplitude_to_db(self.value)
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

/// Left/right coefficients for a pan position in `[-1, 1]`.
///
/// The angle runs over a quarter turn, so `cos² + sin² = 1` at every
/// position and the centre sits at -3 dB on both sides.
#[inline]
pub fn equal_power_pan(pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (angle.cos(), angle.sin())
}

/// Level CV in volts mapped to a `[0, 1]` gain (10 V = unity).
#[inline]
pub fn cv_gain(volts: f32) -> f32 {
    (volts / 10.0).clamp(0.0, 1.0)
}
