//! Board bring-up diagnostics built on the [`embedded-hal`] traits.
//!
//! Two self-tests that run forever and report only through a status LED:
//!
//! - [`loopback`]: full-duplex SPI loopback. Sends a fixed word, waits for the
//!   echo, compares it and blinks (or toggles) the indicator.
//! - [`motor`]: PWM motor bring-up. Quantizes a duty-cycle percentage with
//!   [`duty::pulse_width`], drives an H-bridge and keeps a [`Heartbeat`]
//!   blinking.
//!
//! Clock setup, pin muxing and peripheral enabling stay in the HAL crate of
//! the board; this crate only consumes the configured peripherals.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
//!
//! ## Usage examples
//!
//! See the board programs in the `demos` folder in the crate sources

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod duty;
pub mod indicator;
pub mod loopback;
pub mod motor;
pub mod poll;
pub mod timing;

pub use indicator::{ActiveLevel, Heartbeat, Indicator};
pub use loopback::{LoopbackTest, TransferResult};
pub use motor::{Direction, Motor, Wiring};
pub use timing::Timing;
