//! PWM motor bring-up through an H-bridge driver.
//!
//! Two wirings are supported:
//!
//! - [`Wiring::PhaseEnable`]: one PWM channel sets the speed, a GPIO picks
//!   the direction (driver IN/PH style).
//! - [`Wiring::SignMagnitude`]: one PWM channel per bridge leg; the leg that is
//!   not driving is held at zero duty.
//!
//! In both cases a separate enable pin switches the bridge on. Duty cycles are
//! given in percent and quantized against the generator's maximum duty with
//! [`pulse_width`].

use core::convert::TryFrom;
use core::fmt;
use core::marker::PhantomData;

use embedded_hal::digital::v2::OutputPin;
use embedded_hal::Pwm;

use crate::duty::pulse_width;

/// Motor error
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// GPIO error on the enable or phase pin
    Pin(E),
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Pin(e) => write!(f, "motor pin error: {:?}", e),
        }
    }
}

/// Rotation direction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Phase pin low, or forward leg driven
    Forward,
    /// Phase pin high, or reverse leg driven
    Reverse,
}

/// How the bridge inputs are connected to the MCU.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Wiring<C, PH> {
    /// Speed on `channel`, direction on `phase`.
    PhaseEnable {
        /// PWM channel feeding the bridge
        channel: C,
        /// Direction pin
        phase: PH,
    },
    /// One PWM channel per leg.
    SignMagnitude {
        /// Channel driven for [`Direction::Forward`]
        forward: C,
        /// Channel driven for [`Direction::Reverse`]
        reverse: C,
    },
}

/// Placeholder phase pin for [`Wiring::SignMagnitude`] motors.
///
/// Never touched by the driver; it only fixes the pin error type.
pub struct NoPhase<E>(PhantomData<E>);

impl<E> NoPhase<E> {
    /// A phase pin that does nothing.
    pub fn new() -> Self {
        NoPhase(PhantomData)
    }
}

impl<E> Default for NoPhase<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> OutputPin for NoPhase<E> {
    type Error = E;

    fn set_low(&mut self) -> Result<(), E> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), E> {
        Ok(())
    }
}

/// H-bridge motor under test.
pub struct Motor<PWM, EN, PH>
where
    PWM: Pwm,
{
    pwm: PWM,
    enable: EN,
    wiring: Wiring<PWM::Channel, PH>,
}

impl<PWM, EN, PH, E> Motor<PWM, EN, PH>
where
    PWM: Pwm,
    PWM::Channel: Copy,
    PWM::Duty: Copy + From<u8> + Into<u32> + TryFrom<u32>,
    EN: OutputPin<Error = E>,
    PH: OutputPin<Error = E>,
{
    /// Take the generator and pins, set the PWM period and leave the bridge
    /// disabled with all outputs off.
    pub fn new<P>(
        pwm: PWM,
        enable: EN,
        wiring: Wiring<PWM::Channel, PH>,
        period: P,
    ) -> Result<Self, Error<E>>
    where
        P: Into<PWM::Time>,
    {
        let mut motor = Motor {
            pwm,
            enable,
            wiring,
        };
        motor.pwm.set_period(period);
        motor.stop()?;
        Ok(motor)
    }

    /// Enable the bridge and drive `direction` at `percent` duty.
    ///
    /// `get_max_duty` is the duty for a fully-on output, i.e. the ticks in a
    /// period, so the load value handed to the quantizer is one less. 100%
    /// and above drive the maximum duty.
    ///
    /// Returns the pulse width written to the generator, in duty units.
    pub fn drive(&mut self, direction: Direction, percent: u8) -> Result<u32, Error<E>> {
        let max = self.pwm.get_max_duty();
        let max_ticks: u32 = max.into();
        let pulse = if percent >= 100 {
            max_ticks
        } else {
            pulse_width(max_ticks.saturating_sub(1), percent)
        };
        // pulse <= max, so the conversion back cannot fail
        let duty = <PWM::Duty as TryFrom<u32>>::try_from(pulse).unwrap_or(max);
        let zero = <PWM::Duty as From<u8>>::from(0);

        self.enable.set_high().map_err(Error::Pin)?;

        match &mut self.wiring {
            Wiring::PhaseEnable { channel, phase } => {
                match direction {
                    Direction::Forward => phase.set_low().map_err(Error::Pin)?,
                    Direction::Reverse => phase.set_high().map_err(Error::Pin)?,
                }
                self.pwm.set_duty(*channel, duty);
                self.pwm.enable(*channel);
            }
            Wiring::SignMagnitude { forward, reverse } => {
                let (active, idle) = match direction {
                    Direction::Forward => (*forward, *reverse),
                    Direction::Reverse => (*reverse, *forward),
                };
                self.pwm.set_duty(idle, zero);
                self.pwm.set_duty(active, duty);
                self.pwm.enable(idle);
                self.pwm.enable(active);
            }
        }

        debug!("motor driving at {} of {}", pulse, max_ticks);
        Ok(pulse)
    }

    /// Zero every channel, disable the outputs and the bridge.
    pub fn stop(&mut self) -> Result<(), Error<E>> {
        let zero = <PWM::Duty as From<u8>>::from(0);
        match &self.wiring {
            Wiring::PhaseEnable { channel, .. } => {
                self.pwm.set_duty(*channel, zero);
                self.pwm.disable(*channel);
            }
            Wiring::SignMagnitude { forward, reverse } => {
                for &ch in &[*forward, *reverse] {
                    self.pwm.set_duty(ch, zero);
                    self.pwm.disable(ch);
                }
            }
        }
        self.enable.set_low().map_err(Error::Pin)
    }

    pub fn wiring(&self) -> &Wiring<PWM::Channel, PH> {
        &self.wiring
    }

    pub fn free(self) -> (PWM, EN, Wiring<PWM::Channel, PH>) {
        (self.pwm, self.enable, self.wiring)
    }
}
