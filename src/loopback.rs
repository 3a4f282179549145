/*!
  # Synchronous SPI loopback self-test

  Repeatedly sends one fixed word over a full-duplex peripheral, waits for the
  transfer to finish, compares the word that came back with the one that went
  out and reports the outcome on a status LED. The test never ends; the blink
  pattern is its only output.

  ## Hardware requirements

  1. Configure the SPI peripheral as master with the frame size you test
     (8 bits on every board this was brought up on).
  2. Wire MOSI to MISO, or attach a device that echoes every word.
  3. Give the test an output pin for the LED and a microsecond delay.

  ## Example

  ```ignore
    use bringup_diag::loopback::{Config, LoopbackTest};
    use bringup_diag::Indicator;

    // ...

    let led = Indicator::active_high(led_pin).unwrap();
    let test = LoopbackTest::new(spi, led, delay, Config::pulse_on_match(0x55u8));
    test.run()
  ```
*/

use core::fmt;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::spi::FullDuplex;

use crate::indicator::Indicator;
use crate::poll::{self, Poll, Spin};
use crate::timing::Timing;

/// Loopback error
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<B, P> {
    /// SPI error
    Bus(B),
    /// Indicator pin error
    Pin(P),
    /// The peripheral stayed busy past the poll budget
    Timeout,
}

impl<B, P> From<poll::Error<B>> for Error<B, P> {
    fn from(e: poll::Error<B>) -> Self {
        match e {
            poll::Error::Bus(e) => Error::Bus(e),
            poll::Error::Timeout => Error::Timeout,
        }
    }
}

impl<B: fmt::Debug, P: fmt::Debug> fmt::Display for Error<B, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "spi error: {:?}", e),
            Error::Pin(e) => write!(f, "indicator pin error: {:?}", e),
            Error::Timeout => write!(f, "peripheral still busy after poll budget"),
        }
    }
}

/// What the indicator does after each exchange.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    /// On for the hold time when the echo matched, otherwise stay dark.
    PulseOnMatch,
    /// Flip the LED every cycle, match or not.
    Toggle,
}

/// When to discard a stale word sitting in the receive buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Drain {
    /// Never
    None,
    /// One non-blocking read before sending
    Before,
    /// One non-blocking read after collecting the echo
    After,
}

/// Loopback test settings
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config<W> {
    /// Word sent every cycle
    pub tx_word: W,
    /// Bits compared between sent and received word
    pub frame_bits: u8,
    /// Indicator behaviour
    pub signal: Signal,
    /// Receive buffer housekeeping
    pub drain: Drain,
    /// Hold and pacing delays
    pub timing: Timing,
}

impl<W> Config<W> {
    /// Blink for half a second on every good echo, pause half a second.
    pub fn pulse_on_match(tx_word: W) -> Self {
        Config {
            tx_word,
            frame_bits: 8,
            signal: Signal::PulseOnMatch,
            drain: Drain::None,
            timing: Timing::default(),
        }
    }

    /// Blink for a quarter second on every good echo, pause half a second.
    pub fn short_pulse(tx_word: W) -> Self {
        let timing = Timing::default();
        Config {
            timing: timing.with_hold_ticks(timing.clock_hz / 4),
            ..Config::pulse_on_match(tx_word)
        }
    }

    /// Toggle the LED every cycle and drain the receive buffer afterwards.
    ///
    /// Useful when MISO is not wired and only the clock and data output are
    /// being checked with a scope or an external device.
    pub fn toggle(tx_word: W) -> Self {
        Config {
            signal: Signal::Toggle,
            drain: Drain::After,
            ..Config::pulse_on_match(tx_word)
        }
    }

    /// Compare `bits` low bits of each word.
    pub fn frame_bits(mut self, bits: u8) -> Self {
        self.frame_bits = bits;
        self
    }

    /// Replace the delays.
    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Replace the receive buffer housekeeping.
    pub fn drain(mut self, drain: Drain) -> Self {
        self.drain = drain;
        self
    }

    /// Mask selecting the compared bits.
    pub fn mask(&self) -> u32 {
        frame_mask(self.frame_bits)
    }
}

impl<W: Default> Default for Config<W> {
    fn default() -> Self {
        Config::pulse_on_match(W::default())
    }
}

/// Mask for a frame of `bits` bits. 0 means the default 8, above 32 means 32.
pub fn frame_mask(bits: u8) -> u32 {
    match bits {
        0 => 0xFF,
        1..=31 => (1u32 << bits) - 1,
        _ => u32::MAX,
    }
}

/// Outcome of one exchange.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferResult<W> {
    /// Word handed to the peripheral
    pub sent: W,
    /// Word read back, before masking
    pub received: W,
    /// Sent and received agree on the compared bits
    pub matched: bool,
}

impl<W> TransferResult<W>
where
    W: Copy + Into<u32>,
{
    /// Compare `received` against `sent` under `mask`.
    pub fn evaluate(sent: W, received: W, mask: u32) -> Self {
        TransferResult {
            sent,
            received,
            matched: (sent.into() & mask) == (received.into() & mask),
        }
    }
}

/// A running loopback self-test session.
///
/// Owns the peripheral, the indicator and the delay for as long as it runs.
pub struct LoopbackTest<SPI, LED, DELAY, W, POLL = Spin> {
    spi: SPI,
    indicator: Indicator<LED>,
    delay: DELAY,
    poll: POLL,
    config: Config<W>,
    cycles: u32,
}

impl<SPI, LED, DELAY, W> LoopbackTest<SPI, LED, DELAY, W, Spin>
where
    SPI: FullDuplex<W>,
    LED: OutputPin,
    DELAY: DelayUs<u32>,
    W: Copy + Into<u32>,
{
    /// Session that spins on the busy flag without a limit.
    pub fn new(spi: SPI, indicator: Indicator<LED>, delay: DELAY, config: Config<W>) -> Self {
        Self::with_poll(spi, indicator, delay, config, Spin)
    }
}

impl<SPI, LED, DELAY, W, POLL> LoopbackTest<SPI, LED, DELAY, W, POLL>
where
    SPI: FullDuplex<W>,
    LED: OutputPin,
    DELAY: DelayUs<u32>,
    W: Copy + Into<u32>,
    POLL: Poll,
{
    /// Session with a custom polling strategy for the busy waits.
    pub fn with_poll(
        spi: SPI,
        indicator: Indicator<LED>,
        delay: DELAY,
        config: Config<W>,
        poll: POLL,
    ) -> Self {
        LoopbackTest {
            spi,
            indicator,
            delay,
            poll,
            config,
            cycles: 0,
        }
    }

    /// Run one exchange, signal the result and wait out the pacing delay.
    ///
    /// A mismatch is a normal outcome, not an error. Errors abort the cycle
    /// before the pacing delay.
    pub fn cycle(&mut self) -> Result<TransferResult<W>, Error<SPI::Error, LED::Error>> {
        self.cycles = self.cycles.wrapping_add(1);

        if self.config.drain == Drain::Before {
            self.drain()?;
        }

        let result = self.exchange()?;

        if self.config.drain == Drain::After {
            self.drain()?;
        }

        self.signal(result.matched).map_err(Error::Pin)?;
        self.config.timing.pace(&mut self.delay);

        trace!("cycle {}: matched {}", self.cycles, result.matched);
        Ok(result)
    }

    /// Cycle forever. Failed cycles are treated like a mismatch.
    pub fn run(mut self) -> ! {
        debug!("loopback test started");
        loop {
            if self.cycle().is_err() {
                warn!("cycle {} failed", self.cycles);
                self.config.timing.pace(&mut self.delay);
            }
        }
    }

    fn exchange(&mut self) -> Result<TransferResult<W>, Error<SPI::Error, LED::Error>> {
        let tx = self.config.tx_word;
        let spi = &mut self.spi;

        self.poll.poll(|| spi.send(tx))?;
        let rx = self.poll.poll(|| spi.read())?;

        Ok(TransferResult::evaluate(tx, rx, self.config.mask()))
    }

    fn drain(&mut self) -> Result<(), Error<SPI::Error, LED::Error>> {
        match self.spi.read() {
            Ok(_) | Err(nb::Error::WouldBlock) => Ok(()),
            Err(nb::Error::Other(e)) => Err(Error::Bus(e)),
        }
    }

    fn signal(&mut self, matched: bool) -> Result<(), LED::Error> {
        match self.config.signal {
            Signal::PulseOnMatch => {
                if matched {
                    self.indicator.on()?;
                    self.config.timing.hold(&mut self.delay);
                    self.indicator.off()?;
                }
            }
            Signal::Toggle => self.indicator.toggle()?,
        }
        Ok(())
    }

    /// Number of cycles started so far (wraps).
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn config(&self) -> &Config<W> {
        &self.config
    }

    pub fn indicator(&self) -> &Indicator<LED> {
        &self.indicator
    }

    pub fn free(self) -> (SPI, Indicator<LED>, DELAY) {
        (self.spi, self.indicator, self.delay)
    }
}
