//! Duty-cycle quantizer for PWM generators.
//!
//! A generator configured with a load value of `period_ticks` runs for
//! `period_ticks + 1` ticks per period. [`pulse_width`] turns a percentage
//! into the compare value for that period:
//!
//! ```
//! use bringup_diag::duty::{load_value, pwm_clock, pulse_width};
//!
//! // 16 MHz system clock, /64 divider, 1 kHz output.
//! let load = load_value(pwm_clock(16_000_000, 64), 1_000);
//! assert_eq!(load, 249);
//! assert_eq!(pulse_width(load, 25), 62);
//! assert_eq!(pulse_width(load, 100), 249);
//! ```

/// A requested duty cycle against a known generator period.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyCycle {
    /// Generator load value, one less than the ticks in a period.
    pub period_ticks: u32,
    /// Requested duty, 0..=100. Larger values saturate at full duty.
    pub percent: u8,
}

impl DutyCycle {
    /// Pair a load value with a requested percentage.
    pub const fn new(period_ticks: u32, percent: u8) -> Self {
        DutyCycle {
            period_ticks,
            percent,
        }
    }

    /// Compare value for this duty cycle, see [`pulse_width`].
    #[inline]
    pub fn pulse_width(&self) -> u32 {
        pulse_width(self.period_ticks, self.percent)
    }
}

/// Pulse width in ticks for `percent` of a `period_ticks + 1` tick period.
///
/// Fractional ticks are truncated. The result never exceeds `period_ticks`:
/// 100% (or anything above it) yields `period_ticks`. Total over all inputs.
pub fn pulse_width(period_ticks: u32, percent: u8) -> u32 {
    let raw = (u64::from(period_ticks) + 1) * u64::from(percent) / 100;
    if raw > u64::from(period_ticks) {
        period_ticks
    } else {
        // raw <= period_ticks, fits
        raw as u32
    }
}

/// Generator input clock after the PWM divider. A zero divider is taken as 1.
pub const fn pwm_clock(sys_clock_hz: u32, divider: u32) -> u32 {
    if divider == 0 {
        sys_clock_hz
    } else {
        sys_clock_hz / divider
    }
}

/// Load value for a down-counting generator: `pwm_clock / freq - 1`.
///
/// Saturates at 0 when the frequency is zero or above the generator clock.
pub const fn load_value(pwm_clock_hz: u32, pwm_freq_hz: u32) -> u32 {
    if pwm_freq_hz == 0 {
        return 0;
    }
    (pwm_clock_hz / pwm_freq_hz).saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_points() {
        assert_eq!(pulse_width(249, 25), 62);
        assert_eq!(pulse_width(249, 40), 100);
        assert_eq!(pulse_width(249, 100), 249);
        assert_eq!(pulse_width(249, 0), 0);
    }

    #[test]
    fn zero_percent_is_zero() {
        for &period in &[0, 1, 249, 65_535, u32::MAX] {
            assert_eq!(pulse_width(period, 0), 0);
        }
    }

    #[test]
    fn never_exceeds_period() {
        for &period in &[0u32, 1, 2, 3, 99, 100, 249, 999, 65_535, u32::MAX - 1, u32::MAX] {
            for percent in 0..=u8::MAX {
                let pulse = pulse_width(period, percent);
                assert!(pulse <= period, "period {} percent {}", period, percent);
            }
        }
    }

    #[test]
    fn above_hundred_clamps() {
        assert_eq!(pulse_width(249, 101), 249);
        assert_eq!(pulse_width(249, 255), 249);
        assert_eq!(pulse_width(0, 200), 0);
    }

    #[test]
    fn full_range_period_does_not_overflow() {
        assert_eq!(pulse_width(u32::MAX, 100), u32::MAX);
        assert_eq!(pulse_width(u32::MAX, 50), 1 << 31);
    }

    #[test]
    fn truncates_instead_of_rounding() {
        // 10 ticks * 99% = 9.9
        assert_eq!(pulse_width(9, 99), 9);
        // 10 ticks * 15% = 1.5
        assert_eq!(pulse_width(9, 15), 1);
    }

    #[test]
    fn duty_cycle_matches_free_function() {
        let duty = DutyCycle::new(249, 40);
        assert_eq!(duty.pulse_width(), pulse_width(249, 40));
        assert_eq!(duty.pulse_width(), duty.pulse_width());
    }

    #[test]
    fn generator_helpers() {
        assert_eq!(pwm_clock(16_000_000, 64), 250_000);
        assert_eq!(pwm_clock(16_000_000, 0), 16_000_000);
        assert_eq!(load_value(250_000, 1_000), 249);
        assert_eq!(load_value(250_000, 0), 0);
        assert_eq!(load_value(1_000, 2_000), 0);
    }
}
