// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Single GPIO lines: reservation, values and edge events.
//!
//! A [`Line`] starts out free.  Requesting it as an input, an output or an
//! edge subscription reserves it with the kernel under a consumer label; the
//! reservation lasts until [`Line::release`] or until the line is dropped.

use std::{io, time::Duration};

use log::{debug, trace};

use crate::{
    backend::{Backend, Cdev, LineRequest},
    chip::Chip,
    errors::{Error, Resource, Result},
    fixed_str::Name,
};

mod event;
mod info;
mod option_builder;
pub mod options;
pub mod values;

pub use event::{EventKind, LineEvent, WaitResult};
pub use info::LineInfo;
pub use options::{Direction, EdgeDetect, LineOptions, Reservation};
pub use values::LineValue;

use options::AsLineOptions;

#[derive(Debug)]
enum LineState<H> {
    Free,
    Reserved {
        handle: H,
        mode: Reservation,
        consumer: Name,
    },
}

/// One line of a [`Chip`], obtained through [`Chip::line`].
///
/// ```
/// use gpio_cdev_lines::{line::LineValue, Chip, Sim};
///
/// # fn main() -> Result<(), gpio_cdev_lines::Error> {
/// let sim = Sim::new();
/// let index = sim.add_chip("sim", 8);
/// let chip = Chip::open_with(sim.clone(), index)?;
///
/// let mut led = chip.line(3)?;
/// led.request_output("blinky")?;
/// led.set_value(LineValue::Active)?;
/// assert_eq!(sim.level(index, 3)?, LineValue::Active);
///
/// led.release()?;
/// assert!(led.is_free());
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Line<'c, B: Backend = Cdev> {
    chip: &'c Chip<B>,
    offset: u32,
    state: LineState<B::RequestHandle>,
}

impl<'c, B: Backend> Line<'c, B> {
    pub(crate) fn new(chip: &'c Chip<B>, offset: u32) -> Self {
        Self {
            chip,
            offset,
            state: LineState::Free,
        }
    }

    pub fn chip(&self) -> &'c Chip<B> {
        self.chip
    }

    /// Offset of this line within its chip
    pub fn offset(&self) -> u32 {
        self.offset
    }

    fn resource(&self) -> Resource {
        Resource::Line {
            chip: self.chip.index(),
            offset: self.offset,
        }
    }

    /// Kernel view of the line, including reservations held elsewhere
    pub fn info(&self) -> Result<LineInfo> {
        self.chip.line_info(self.offset)
    }

    /// The reserved direction, or what the kernel reports for a free line
    pub fn direction(&self) -> Result<Direction> {
        match &self.state {
            LineState::Reserved { mode, .. } => Ok(mode.direction()),
            LineState::Free => Ok(self.info()?.direction()),
        }
    }

    /// True unless the line is reserved or subscribed to edge events.
    ///
    /// [`Chip::line`] hands out one handle per line, so the reservation
    /// state of this handle is that of the line.
    pub fn is_free(&self) -> bool {
        matches!(self.state, LineState::Free)
    }

    pub fn reservation(&self) -> Option<Reservation> {
        match &self.state {
            LineState::Reserved { mode, .. } => Some(*mode),
            LineState::Free => None,
        }
    }

    /// Label this handle reserved the line under
    pub fn consumer(&self) -> Option<&str> {
        match &self.state {
            LineState::Reserved { consumer, .. } => Some(consumer.as_str()),
            LineState::Free => None,
        }
    }

    pub fn request_input(&mut self, consumer: &str) -> Result<()> {
        self.request_with(consumer, LineOptions::input(), LineValue::Inactive)
    }

    /// Reserve the line as an output driven inactive.
    pub fn request_output(&mut self, consumer: &str) -> Result<()> {
        self.request_output_value(consumer, LineValue::Inactive)
    }

    pub fn request_output_value(&mut self, consumer: &str, value: LineValue) -> Result<()> {
        self.request_with(consumer, LineOptions::output(), value)
    }

    /// Subscribe to rising and falling edges.
    pub fn request_both_edge_events(&mut self, consumer: &str) -> Result<()> {
        self.request_events(consumer, EdgeDetect::Both)
    }

    pub fn request_events(&mut self, consumer: &str, edge: EdgeDetect) -> Result<()> {
        self.request_with(
            consumer,
            LineOptions::input().with_edge_detect(edge),
            LineValue::Inactive,
        )
    }

    /// Reserve the line with explicit options.
    ///
    /// `consumer` is truncated to what the kernel stores (31 bytes).
    /// `initial` is only used by output requests.  Fails with
    /// [`Error::PermissionOrBusy`] if this handle is already reserved or the
    /// line is held by another consumer.
    ///
    /// ```
    /// use gpio_cdev_lines::line::options::{Active, Bias, LineOptions};
    /// use gpio_cdev_lines::line::LineValue;
    /// use gpio_cdev_lines::{Chip, Sim};
    ///
    /// # fn main() -> Result<(), gpio_cdev_lines::Error> {
    /// let sim = Sim::new();
    /// let index = sim.add_chip("sim", 1);
    /// let chip = Chip::open_with(sim.clone(), index)?;
    ///
    /// let mut button = chip.line(0)?;
    /// button.request_with(
    ///     "button",
    ///     LineOptions::input().with_active(Active::Low).with_bias(Bias::PullUp),
    ///     LineValue::Inactive,
    /// )?;
    /// assert_eq!(button.get_value()?, LineValue::Active);
    /// # Ok(()) }
    /// ```
    pub fn request_with(
        &mut self,
        consumer: &str,
        options: impl AsLineOptions,
        initial: LineValue,
    ) -> Result<()> {
        if !self.is_free() {
            return Err(Error::busy(
                self.resource(),
                io::Error::from_raw_os_error(libc::EBUSY),
            ));
        }

        let consumer = Name::truncating(consumer);
        let request = LineRequest::new(options, initial);
        let handle =
            self.chip
                .backend()
                .request_line(self.chip.handle(), self.offset, &consumer, request)?;

        self.state = LineState::Reserved {
            handle,
            mode: Reservation::from_flags(request.flags()),
            consumer,
        };
        Ok(())
    }

    /// Give the reservation back to the kernel.
    pub fn release(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, LineState::Free) {
            LineState::Free => Err(Error::InvalidState("line is not reserved")),
            LineState::Reserved { handle, .. } => {
                self.chip.backend().release_line(handle);
                debug!("released {}", self.resource());
                Ok(())
            }
        }
    }

    fn request_handle(&self) -> Result<(&B::RequestHandle, Reservation)> {
        match &self.state {
            LineState::Reserved { handle, mode, .. } => Ok((handle, *mode)),
            LineState::Free => Err(Error::InvalidState("line is not reserved")),
        }
    }

    /// Logical value of a reserved line
    pub fn get_value(&self) -> Result<LineValue> {
        let (handle, _) = self.request_handle()?;
        self.chip.backend().get_value(handle)
    }

    /// Drive an output line to a logical value
    pub fn set_value(&self, value: LineValue) -> Result<()> {
        match self.request_handle()? {
            (handle, Reservation::Output) => self.chip.backend().set_value(handle, value),
            _ => Err(Error::InvalidState("line is not reserved as an output")),
        }
    }

    /// [`Line::wait_for_event_timeout`] with the configured poll timeout
    pub fn wait_for_event(&self) -> Result<WaitResult> {
        self.wait_for_event_timeout(self.chip.config().poll_timeout())
    }

    /// Wait for an edge event to be queued.
    ///
    /// A line without an edge subscription never gets events: the wait runs
    /// out and reports [`WaitResult::TimedOut`].
    pub fn wait_for_event_timeout(&self, timeout: Duration) -> Result<WaitResult> {
        match &self.state {
            LineState::Reserved {
                handle,
                mode: Reservation::Events(_),
                ..
            } => {
                let ready = self.chip.backend().wait_event(handle, timeout)?;
                trace!("wait on {}: ready = {}", self.resource(), ready);
                Ok(if ready {
                    WaitResult::EventReady
                } else {
                    WaitResult::TimedOut
                })
            }
            _ => {
                std::thread::sleep(timeout);
                Ok(WaitResult::TimedOut)
            }
        }
    }

    /// Take the oldest queued edge event, blocking until one arrives.
    ///
    /// There is no way to interrupt this call; loop on
    /// [`Line::wait_for_event`] to stay responsive.
    pub fn read_event(&self) -> Result<LineEvent> {
        match self.request_handle()? {
            (handle, Reservation::Events(_)) => self.chip.backend().read_event(handle),
            _ => Err(Error::InvalidState("line has no edge subscription")),
        }
    }
}

impl<B: Backend> Drop for Line<'_, B> {
    fn drop(&mut self) {
        if let LineState::Reserved { handle, .. } = std::mem::replace(&mut self.state, LineState::Free)
        {
            self.chip.backend().release_line(handle);
        }
        self.chip.return_line(self.offset);
    }
}
