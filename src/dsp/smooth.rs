//! One-pole parameter smoothing.

/*
Parameter Smoothing
===================

Knob movements arrive as steps. Feeding a step straight into a filter
coefficient or an oscillator frequency produces "zipper" noise and clicks.
A smoother follows the target with an exponential curve instead:

    current += (target − current) × coeff

    coeff = 1 − exp(−1 / (τ × sample_rate))

With τ = ramp_time / 5 the remaining distance after `ramp_time` seconds is
e⁻⁵ ≈ 0.7 %, so the ramp is perceptually finished by then. Once the distance
drops below a small tolerance the value snaps onto the target and
`is_smoothing()` reports false, so callers can skip per-sample work.

The curve never overshoots: every step moves a fixed fraction of the
remaining distance, so the value approaches the target monotonically.
*/

/// Time constants per ramp time.
const TIME_CONSTANTS_PER_RAMP: f64 = 5.0;
/// Relative distance at which the value snaps onto the target.
const SNAP_TOLERANCE: f64 = 1e-5;

/// Exponentially smoothed value.
#[derive(Debug, Clone)]
pub struct SmoothedValue {
    current: f64,
    target: f64,
    coeff: f64,
}

impl SmoothedValue {
    pub fn new(initial: f64) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
        }
    }

    /// Configure how long a ramp takes. A ramp time of zero makes every change instant.
    pub fn reset(&mut self, sample_rate: f64, ramp_seconds: f64) {
        let samples = ramp_seconds * sample_rate / TIME_CONSTANTS_PER_RAMP;
        self.coeff = if samples > 0.0 {
            1.0 - (-1.0 / samples).exp()
        } else {
            1.0
        };
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Jump straight to `value` with no ramp.
    pub fn set_current_and_target(&mut self, value: f64) {
        self.current = value;
        self.target = value;
    }

    /// Advance one sample and return the smoothed value.
    #[inline]
    pub fn next_value(&mut self) -> f64 {
        if !self.is_smoothing() {
            return self.current;
        }

        self.current += (self.target - self.current) * self.coeff;

        let tolerance = SNAP_TOLERANCE * self.target.abs().max(1e-3);
        if (self.target - self.current).abs() <= tolerance {
            self.current = self.target;
        }
        self.current
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.current != self.target
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_target_within_ramp_time() {
        let mut value = SmoothedValue::new(0.0);
        value.reset(1_000.0, 0.01);
        value.set_target(1.0);

        for _ in 0..10 {
            value.next_value();
        }
        assert!((value.current() - 1.0).abs() < 0.01);

        for _ in 0..100 {
            value.next_value();
        }
        assert_eq!(value.current(), 1.0);
        assert!(!value.is_smoothing());
    }

    #[test]
    fn approach_is_monotonic() {
        let mut value = SmoothedValue::new(440.0);
        value.reset(48_000.0, 0.2);
        value.set_target(220.0);

        let mut previous = value.current();
        while value.is_smoothing() {
            let next = value.next_value();
            assert!(next <= previous && next >= 220.0);
            previous = next;
        }
    }

    #[test]
    fn zero_ramp_is_instant() {
        let mut value = SmoothedValue::new(100.0);
        value.reset(48_000.0, 0.0);
        value.set_target(300.0);
        assert_eq!(value.next_value(), 300.0);
    }
}
