//! Recording stand-ins for the HAL peripherals.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::spi::FullDuplex;
use embedded_hal::Pwm;

#[derive(Debug, Eq, PartialEq)]
pub struct BusFault;

/// What the far end sends back for every word.
#[derive(Clone, Copy, Debug)]
pub enum Reply<W> {
    Echo,
    Fixed(W),
}

pub struct SpiState<W> {
    pub reply: Reply<W>,
    pub rx: VecDeque<W>,
    pub sent: Vec<W>,
    /// Calls to `send`, including refused ones
    pub issued: usize,
    pub reads: u32,
    /// `WouldBlock` answers given after each send before the word is ready
    pub busy_per_transfer: u32,
    pub busy_left: u32,
    /// Never finishes a transfer
    pub wedged: bool,
    pub fail_send: bool,
    pub fail_read: bool,
    /// Panic on the call to `send` after this many
    pub send_limit: Option<usize>,
}

#[derive(Clone)]
pub struct MockSpi<W>(pub Rc<RefCell<SpiState<W>>>);

impl<W: Copy> MockSpi<W> {
    pub fn new(reply: Reply<W>) -> Self {
        MockSpi(Rc::new(RefCell::new(SpiState {
            reply,
            rx: VecDeque::new(),
            sent: Vec::new(),
            issued: 0,
            reads: 0,
            busy_per_transfer: 0,
            busy_left: 0,
            wedged: false,
            fail_send: false,
            fail_read: false,
            send_limit: None,
        })))
    }

    pub fn echo() -> Self {
        Self::new(Reply::Echo)
    }

    pub fn state(&self) -> std::cell::Ref<'_, SpiState<W>> {
        self.0.borrow()
    }

    pub fn state_mut(&self) -> std::cell::RefMut<'_, SpiState<W>> {
        self.0.borrow_mut()
    }
}

impl<W: Copy> FullDuplex<W> for MockSpi<W> {
    type Error = BusFault;

    fn read(&mut self) -> nb::Result<W, BusFault> {
        let mut st = self.0.borrow_mut();
        st.reads += 1;
        if st.fail_read {
            return Err(nb::Error::Other(BusFault));
        }
        if st.wedged {
            return Err(nb::Error::WouldBlock);
        }
        if st.busy_left > 0 {
            st.busy_left -= 1;
            return Err(nb::Error::WouldBlock);
        }
        st.rx.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn send(&mut self, word: W) -> nb::Result<(), BusFault> {
        let mut st = self.0.borrow_mut();
        st.issued += 1;
        if let Some(limit) = st.send_limit {
            if st.issued > limit {
                drop(st);
                panic!("send limit reached");
            }
        }
        if st.fail_send {
            return Err(nb::Error::Other(BusFault));
        }
        st.sent.push(word);
        let back = match st.reply {
            Reply::Echo => word,
            Reply::Fixed(w) => w,
        };
        st.rx.push_back(back);
        st.busy_left = st.busy_per_transfer;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockPin(pub Rc<RefCell<Vec<bool>>>);

impl MockPin {
    pub fn levels(&self) -> Vec<bool> {
        self.0.borrow().clone()
    }

    /// Low to high transitions.
    pub fn rising_edges(&self) -> usize {
        self.0
            .borrow()
            .windows(2)
            .filter(|w| !w[0] && w[1])
            .count()
    }

    pub fn last(&self) -> Option<bool> {
        self.0.borrow().last().copied()
    }
}

impl OutputPin for MockPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(true);
        Ok(())
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct PinFault;

/// Pin whose driver refuses to go high. Only the levels it reached are kept.
#[derive(Clone, Default)]
pub struct FaultyPin(pub Rc<RefCell<Vec<bool>>>);

impl FaultyPin {
    pub fn levels(&self) -> Vec<bool> {
        self.0.borrow().clone()
    }
}

impl OutputPin for FaultyPin {
    type Error = PinFault;

    fn set_low(&mut self) -> Result<(), PinFault> {
        self.0.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        Err(PinFault)
    }
}

#[derive(Clone, Default)]
pub struct MockDelay(pub Rc<RefCell<Vec<u32>>>);

impl MockDelay {
    pub fn waits(&self) -> Vec<u32> {
        self.0.borrow().clone()
    }
}

impl DelayUs<u32> for MockDelay {
    fn delay_us(&mut self, us: u32) {
        self.0.borrow_mut().push(us);
    }
}

pub struct PwmState {
    pub max_duty: u16,
    pub period: Option<u32>,
    pub duty: [u16; 4],
    pub enabled: [bool; 4],
}

#[derive(Clone)]
pub struct MockPwm(pub Rc<RefCell<PwmState>>);

impl MockPwm {
    pub fn new(max_duty: u16) -> Self {
        MockPwm(Rc::new(RefCell::new(PwmState {
            max_duty,
            period: None,
            duty: [0xFFFF; 4],
            enabled: [false; 4],
        })))
    }

    pub fn state(&self) -> std::cell::Ref<'_, PwmState> {
        self.0.borrow()
    }
}

impl Pwm for MockPwm {
    type Channel = usize;
    type Time = u32;
    type Duty = u16;

    fn disable(&mut self, channel: usize) {
        self.0.borrow_mut().enabled[channel] = false;
    }

    fn enable(&mut self, channel: usize) {
        self.0.borrow_mut().enabled[channel] = true;
    }

    fn get_period(&self) -> u32 {
        self.0.borrow().period.unwrap_or(0)
    }

    fn get_duty(&self, channel: usize) -> u16 {
        self.0.borrow().duty[channel]
    }

    fn get_max_duty(&self) -> u16 {
        self.0.borrow().max_duty
    }

    fn set_duty(&mut self, channel: usize, duty: u16) {
        self.0.borrow_mut().duty[channel] = duty;
    }

    fn set_period<P>(&mut self, period: P)
    where
        P: Into<u32>,
    {
        self.0.borrow_mut().period = Some(period.into());
    }
}
