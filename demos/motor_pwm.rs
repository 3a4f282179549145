//! H-bridge PWM bring-up on a Blue Pill.
//!
//! TIM2 CH1 (PA0) and CH2 (PA1) feed the two bridge legs at 1 kHz, PA3 is the
//! bridge enable. The motor runs forward at 40% while PC13 blinks to show
//! the firmware is alive.

#![no_std]
#![no_main]

use core::convert::Infallible;

use panic_halt as _;

use cortex_m_rt::entry;
use stm32f1xx_hal::{
    pac,
    prelude::*,
    timer::{Channel, Tim2NoRemap},
};

use bringup_diag::motor::NoPhase;
use bringup_diag::{Direction, Heartbeat, Indicator, Motor, Timing, Wiring};

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    let mut flash = dp.FLASH.constrain();
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.use_hse(8.MHz()).sysclk(16.MHz()).freeze(&mut flash.acr);

    let mut afio = dp.AFIO.constrain();
    let mut gpioa = dp.GPIOA.split();
    let mut gpioc = dp.GPIOC.split();

    let c1 = gpioa.pa0.into_alternate_push_pull(&mut gpioa.crl);
    let c2 = gpioa.pa1.into_alternate_push_pull(&mut gpioa.crl);
    let pwm = dp
        .TIM2
        .pwm_hz::<Tim2NoRemap, _, _>((c1, c2), &mut afio.mapr, 1.kHz(), &clocks);

    let enable = gpioa.pa3.into_push_pull_output(&mut gpioa.crl);
    let wiring = Wiring::<Channel, NoPhase<Infallible>>::SignMagnitude {
        forward: Channel::C2,
        reverse: Channel::C1,
    };

    let mut motor = Motor::new(pwm, enable, wiring, 1.kHz()).unwrap();
    motor.drive(Direction::Forward, 40).unwrap();

    let led = Indicator::active_low(gpioc.pc13.into_push_pull_output(&mut gpioc.crh)).unwrap();
    let delay = cp.SYST.delay(&clocks);

    Heartbeat::new(led, delay, Timing::from_clock_hz(clocks.sysclk().raw())).run()
}
