//! Tick-based delays calibrated against a reference clock.
//!
//! The diagnostics express their hold and pacing delays in clock ticks, the
//! way a busy-wait loop on the board counts them, and hand them to any
//! [`DelayUs<u32>`] after conversion.
//!
//! [`DelayUs<u32>`]: embedded_hal::blocking::delay::DelayUs

use embedded_hal::blocking::delay::DelayUs;

/// Clock of the boards these diagnostics were first brought up on.
pub const REFERENCE_CLOCK_HZ: u32 = 16_000_000;

/// Hold and pacing delays of a diagnostic loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Clock the tick counts are measured against.
    pub clock_hz: u32,
    /// How long the indicator stays on for a pulse.
    pub hold_ticks: u32,
    /// Pause at the end of every cycle.
    pub pace_ticks: u32,
}

impl Timing {
    /// Half a second of hold and half a second of pacing at `clock_hz`.
    pub const fn from_clock_hz(clock_hz: u32) -> Self {
        Timing {
            clock_hz,
            hold_ticks: clock_hz / 2,
            pace_ticks: clock_hz / 2,
        }
    }

    /// Replace the hold time.
    pub const fn with_hold_ticks(mut self, ticks: u32) -> Self {
        self.hold_ticks = ticks;
        self
    }

    /// Replace the pacing time.
    pub const fn with_pace_ticks(mut self, ticks: u32) -> Self {
        self.pace_ticks = ticks;
        self
    }

    /// Hold time in microseconds.
    #[inline]
    pub fn hold_us(&self) -> u32 {
        ticks_to_us(self.hold_ticks, self.clock_hz)
    }

    /// Pacing time in microseconds.
    #[inline]
    pub fn pace_us(&self) -> u32 {
        ticks_to_us(self.pace_ticks, self.clock_hz)
    }

    /// Busy-wait for the hold time.
    pub fn hold<D: DelayUs<u32>>(&self, delay: &mut D) {
        delay.delay_us(self.hold_us());
    }

    /// Busy-wait for the pacing time.
    pub fn pace<D: DelayUs<u32>>(&self, delay: &mut D) {
        delay.delay_us(self.pace_us());
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing::from_clock_hz(REFERENCE_CLOCK_HZ)
    }
}

/// Convert a tick count at `clock_hz` into microseconds.
///
/// Saturates at `u32::MAX`; a zero clock yields no delay.
pub fn ticks_to_us(ticks: u32, clock_hz: u32) -> u32 {
    if clock_hz == 0 {
        return 0;
    }
    let us = u64::from(ticks) * 1_000_000 / u64::from(clock_hz);
    if us > u64::from(u32::MAX) {
        u32::MAX
    } else {
        us as u32
    }
}
