//! SPI loopback self-test on a Blue Pill.
//!
//! Wire PA6 (MISO) to PA7 (MOSI). The PC13 LED blinks once per cycle while
//! the echo comes back intact and stays dark otherwise.

#![no_std]
#![no_main]

use panic_halt as _;

use cortex_m_rt::entry;
use stm32f1xx_hal::{
    pac,
    prelude::*,
    spi::{Mode, Phase, Polarity, Spi},
};

use bringup_diag::loopback::{Config, LoopbackTest};
use bringup_diag::{Indicator, Timing};

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    let mut flash = dp.FLASH.constrain();
    let rcc = dp.RCC.constrain();

    let clocks = rcc
        .cfgr
        .use_hse(8.MHz())
        .sysclk(16.MHz())
        .pclk1(8.MHz())
        .freeze(&mut flash.acr);

    let mut afio = dp.AFIO.constrain();
    let mut gpioa = dp.GPIOA.split();
    let mut gpioc = dp.GPIOC.split();

    let sck = gpioa.pa5.into_alternate_push_pull(&mut gpioa.crl);
    let miso = gpioa.pa6;
    let mosi = gpioa.pa7.into_alternate_push_pull(&mut gpioa.crl);

    let mode = Mode {
        polarity: Polarity::IdleLow,
        phase: Phase::CaptureOnFirstTransition,
    };
    let spi = Spi::spi1(
        dp.SPI1,
        (sck, miso, mosi),
        &mut afio.mapr,
        mode,
        1.MHz(),
        clocks,
    );

    let led = Indicator::active_low(gpioc.pc13.into_push_pull_output(&mut gpioc.crh)).unwrap();
    let delay = cp.SYST.delay(&clocks);

    let config = Config::pulse_on_match(0x55u8).timing(Timing::from_clock_hz(clocks.sysclk().raw()));

    LoopbackTest::new(spi, led, delay, config).run()
}
