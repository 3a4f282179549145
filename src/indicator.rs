//! Status LED handling.
//!
//! - `Indicator` wraps an output pin, knows whether the LED is wired
//!   active-high or active-low and remembers its logical state between loop
//!   iterations.
//! - `Heartbeat` blinks an indicator forever so a board shows it is running.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;

use crate::timing::Timing;

/// Whether the LED lights up with the pin driven high or low.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveLevel {
    /// Pin high means LED on
    High,
    /// Pin low means LED on
    Low,
}

/// Status LED that remembers its active level and last driven state.
pub struct Indicator<PIN> {
    pin: PIN,
    active: ActiveLevel,
    is_on: bool,
}

impl<PIN, E> Indicator<PIN>
where
    PIN: OutputPin<Error = E>,
{
    /// Wrap `pin` and drive it to OFF.
    pub fn new(pin: PIN, active: ActiveLevel) -> Result<Self, E> {
        let mut indicator = Indicator {
            pin,
            active,
            is_on: false,
        };
        indicator.set(false)?;
        Ok(indicator)
    }

    /// LED that lights with the pin high.
    pub fn active_high(pin: PIN) -> Result<Self, E> {
        Self::new(pin, ActiveLevel::High)
    }

    /// LED that lights with the pin low.
    pub fn active_low(pin: PIN) -> Result<Self, E> {
        Self::new(pin, ActiveLevel::Low)
    }

    /// Drive the LED logically on (`true`) or off (`false`).
    pub fn set(&mut self, on: bool) -> Result<(), E> {
        match (self.active, on) {
            (ActiveLevel::High, true) | (ActiveLevel::Low, false) => self.pin.set_high()?,
            (ActiveLevel::High, false) | (ActiveLevel::Low, true) => self.pin.set_low()?,
        }
        self.is_on = on;
        Ok(())
    }

    #[inline]
    pub fn on(&mut self) -> Result<(), E> {
        self.set(true)
    }

    #[inline]
    pub fn off(&mut self) -> Result<(), E> {
        self.set(false)
    }

    /// Flip the remembered state.
    pub fn toggle(&mut self) -> Result<(), E> {
        self.set(!self.is_on)
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Active level chosen at construction.
    pub fn active_level(&self) -> ActiveLevel {
        self.active
    }

    pub fn free(self) -> PIN {
        self.pin
    }
}

/// Endless "code is running" blink: on, half a period, off, half a period.
pub struct Heartbeat<PIN, DELAY> {
    indicator: Indicator<PIN>,
    delay: DELAY,
    timing: Timing,
}

impl<PIN, DELAY, E> Heartbeat<PIN, DELAY>
where
    PIN: OutputPin<Error = E>,
    DELAY: DelayUs<u32>,
{
    /// Both halves of the blink last `timing.pace_ticks`.
    pub fn new(indicator: Indicator<PIN>, delay: DELAY, timing: Timing) -> Self {
        Heartbeat {
            indicator,
            delay,
            timing,
        }
    }

    /// One full blink.
    pub fn beat(&mut self) -> Result<(), E> {
        self.indicator.on()?;
        self.timing.pace(&mut self.delay);
        self.indicator.off()?;
        self.timing.pace(&mut self.delay);
        Ok(())
    }

    /// Blink forever. A pin error skips the rest of that blink and waits
    /// out one half period before the next.
    pub fn run(mut self) -> ! {
        loop {
            if self.beat().is_err() {
                warn!("heartbeat pin error");
                self.timing.pace(&mut self.delay);
            }
        }
    }

    pub fn indicator(&self) -> &Indicator<PIN> {
        &self.indicator
    }

    pub fn free(self) -> (Indicator<PIN>, DELAY) {
        (self.indicator, self.delay)
    }
}
