//! Polling strategies for peripheral status waits.
//!
//! A diagnostic never sleeps on an interrupt: it asks the peripheral again
//! until the answer is no longer [`nb::Error::WouldBlock`]. [`Spin`] does this
//! forever, exactly like a `while (busy) {}` loop, and [`Bounded`] gives up
//! after a fixed number of attempts.

use nb::block;

/// Poll error
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The peripheral reported an error
    Bus(E),
    /// The peripheral was still busy when the poll budget ran out
    Timeout,
}

/// How to wait on an `nb` operation.
pub trait Poll {
    /// Call `op` until it stops returning `WouldBlock`.
    fn poll<T, E, F>(&mut self, op: F) -> Result<T, Error<E>>
    where
        F: FnMut() -> nb::Result<T, E>;
}

/// Unbounded busy-wait. A wedged peripheral hangs the caller.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Spin;

impl Poll for Spin {
    #[inline]
    fn poll<T, E, F>(&mut self, mut op: F) -> Result<T, Error<E>>
    where
        F: FnMut() -> nb::Result<T, E>,
    {
        block!(op()).map_err(Error::Bus)
    }
}

/// Busy-wait with an attempt budget.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bounded {
    max_polls: u32,
}

impl Bounded {
    /// Give up after `max_polls` calls. Zero is treated as one.
    pub const fn new(max_polls: u32) -> Self {
        Bounded {
            max_polls: if max_polls == 0 { 1 } else { max_polls },
        }
    }

    /// Attempt budget per wait.
    pub fn max_polls(&self) -> u32 {
        self.max_polls
    }
}

impl Poll for Bounded {
    fn poll<T, E, F>(&mut self, mut op: F) -> Result<T, Error<E>>
    where
        F: FnMut() -> nb::Result<T, E>,
    {
        let mut ctr = 0u32;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(nb::Error::Other(e)) => return Err(Error::Bus(e)),
                Err(nb::Error::WouldBlock) => {
                    ctr += 1;
                    if ctr >= self.max_polls {
                        warn!("gave up after {} polls", ctr);
                        return Err(Error::Timeout);
                    }
                }
            }
        }
    }
}

/// Spin until `ready` returns true.
///
/// This is the "wait for the peripheral to come up" stall of board setup: it
/// never fails and never returns while the peripheral stays not ready.
pub fn wait_until<F>(mut ready: F)
where
    F: FnMut() -> bool,
{
    while !ready() {}
}
