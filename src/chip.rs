// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::{
    collections::BTreeSet,
    io,
    marker::PhantomData,
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use log::debug;

use crate::{
    backend::{Backend, Cdev, ChipInfo},
    config::Config,
    errors::{Error, Resource, Result},
    line::{Line, LineInfo},
};

/// A GPIO Chip maps to the actual device driver instance in hardware that
/// one interacts with to interact with individual GPIOs.  Often these chips
/// map to IP chunks on an SoC but could also be enumerated within the kernel
/// via something like a PCI or USB bus.
///
/// Lines obtained through [`Chip::line`] borrow the chip, so the chip stays
/// open for as long as any of its lines is alive.  Dropping the chip closes
/// it, as does [`Chip::close`].
#[derive(Debug)]
pub struct Chip<B: Backend = Cdev> {
    backend: B,
    handle: B::ChipHandle,
    index: u32,
    info: ChipInfo,
    /// Offsets with a live [`Line`]
    lines_out: Mutex<BTreeSet<u32>>,
}

impl Chip<Cdev> {
    /// Open `/dev/gpiochip<index>`
    pub fn open(index: u32) -> Result<Self> {
        Self::open_with(Cdev::new(), index)
    }

    /// Open the GPIO Chip at the provided path (e.g. `/dev/gpiochip<N>`, or a
    /// udev symlink to one)
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let backend = Cdev::new();
        let handle = backend.open_path(path.as_ref())?;
        let index = handle.index();
        Self::from_handle(backend, index, handle)
    }
}

impl<B: Backend> Chip<B> {
    pub fn open_with(backend: B, index: u32) -> Result<Self> {
        let handle = backend.open_chip(index)?;
        Self::from_handle(backend, index, handle)
    }

    fn from_handle(backend: B, index: u32, handle: B::ChipHandle) -> Result<Self> {
        let info = backend.chip_info(&handle)?;
        debug!(
            "gpiochip{} \"{}\" [{}] with {} lines",
            index,
            info.name(),
            info.label(),
            info.num_lines()
        );

        Ok(Self {
            backend,
            handle,
            index,
            info,
            lines_out: Mutex::new(BTreeSet::new()),
        })
    }

    /// Close the chip.
    ///
    /// Lines borrow their chip, so a chip cannot be closed while one of its
    /// lines is still in use:
    ///
    /// ```compile_fail
    /// use gpio_cdev_lines::{Chip, Sim};
    ///
    /// let sim = Sim::new();
    /// let index = sim.add_chip("sim", 4);
    /// let chip = Chip::open_with(sim, index).unwrap();
    /// let line = chip.line(0).unwrap();
    /// chip.close();
    /// line.is_free();
    /// ```
    pub fn close(self) {
        let Self {
            backend,
            handle,
            index,
            ..
        } = self;
        backend.close_chip(handle);
        debug!("closed gpiochip{}", index);
    }

    /// The `N` of `gpiochipN`
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The name of the device driving this GPIO chip in the kernel
    pub fn name(&self) -> &str {
        self.info.name()
    }

    /// A functional name for this GPIO chip, such as a product number.  Might
    /// be an empty string.
    pub fn label(&self) -> &str {
        self.info.label()
    }

    /// The number of lines/pins indexable through this chip
    ///
    /// Not all of these may be usable depending on how the hardware is
    /// configured/muxed.
    pub fn num_lines(&self) -> u32 {
        self.info.num_lines()
    }

    pub fn info(&self) -> &ChipInfo {
        &self.info
    }

    pub fn config(&self) -> &Config {
        self.backend.config()
    }

    fn check_offset(&self, offset: u32) -> Result<()> {
        if offset < self.num_lines() {
            Ok(())
        } else {
            Err(Error::NotFound(Resource::Line {
                chip: self.index,
                offset,
            }))
        }
    }

    /// Get a handle to the GPIO line at a given offset
    ///
    /// The actual physical line corresponding to a given offset
    /// is completely dependent on how the driver/hardware for
    /// the chip works as well as the associated board layout.
    ///
    /// For a device like the NXP i.mx6 SoC GPIO controller there
    /// are several banks of GPIOs with each bank containing 32
    /// GPIOs.  For this hardware and driver something like
    /// `GPIO2_5` would map to offset 37.
    ///
    /// The returned line is free; nothing is requested from the kernel yet.
    /// There is one handle per line: asking again for an offset whose
    /// [`Line`] is still alive fails with [`Error::PermissionOrBusy`].
    pub fn line(&self, offset: u32) -> Result<Line<'_, B>> {
        self.check_offset(offset)?;
        if !self.lines_out().insert(offset) {
            return Err(Error::busy(
                Resource::Line {
                    chip: self.index,
                    offset,
                },
                io::Error::from_raw_os_error(libc::EBUSY),
            ));
        }
        Ok(Line::new(self, offset))
    }

    pub(crate) fn return_line(&self, offset: u32) {
        self.lines_out().remove(&offset);
    }

    fn lines_out(&self) -> MutexGuard<'_, BTreeSet<u32>> {
        self.lines_out
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the information of a line at a given offset.
    pub fn line_info(&self, offset: u32) -> Result<LineInfo> {
        self.check_offset(offset)?;
        self.backend.line_info(&self.handle, offset)
    }

    /// Information on every line of the chip, in offset order
    pub fn line_infos(&self) -> impl Iterator<Item = Result<LineInfo>> + '_ {
        (0..self.num_lines()).map(move |offset| self.backend.line_info(&self.handle, offset))
    }

    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn handle(&self) -> &B::ChipHandle {
        &self.handle
    }
}

/// The iterator closes each chip when moving on to the next one.
#[derive(Debug, Clone, Copy)]
pub struct AutoClose;

/// Chips are handed over to the caller, who closes them.
#[derive(Debug, Clone, Copy)]
pub struct KeepOpen;

/// Iterate over all GPIO chips currently present on this system
///
/// Each chip is closed as soon as the iteration moves on.
pub fn chips() -> Result<ChipIter<Cdev, AutoClose>> {
    ChipIter::new(Cdev::new())
}

/// Iterate over all GPIO chips currently present on this system, keeping
/// every chip open
pub fn chips_no_close() -> Result<ChipIter<Cdev, KeepOpen>> {
    ChipIter::new_no_close(Cdev::new())
}

/// Iterator over chips
///
/// The set of chip indices is taken when the iterator is created; chips
/// that disappear before they are reached are skipped.  What happens to a
/// yielded chip depends on `D`:
///
/// * [`AutoClose`]: [`ChipIter::next`] lends the chip until the following
///   call, which closes it.
/// * [`KeepOpen`]: a plain [`Iterator`] of owned chips.
///
/// ```
/// use gpio_cdev_lines::{ChipIter, Sim};
///
/// # fn main() -> Result<(), gpio_cdev_lines::Error> {
/// let sim = Sim::new();
/// sim.add_chip("pinctrl", 54);
/// sim.add_chip("expander", 16);
///
/// let mut chips = ChipIter::new(sim.clone())?;
/// while let Some(chip) = chips.next() {
///     let chip = chip?;
///     println!("{} [{}] {} lines", chip.name(), chip.label(), chip.num_lines());
///     assert_eq!(sim.open_chip_count(), 1);
/// }
/// assert_eq!(sim.open_chip_count(), 0);
/// # Ok(()) }
/// ```
///
/// A chip lent by an auto-closing iterator cannot be kept across `next`:
///
/// ```compile_fail
/// use gpio_cdev_lines::{ChipIter, Sim};
///
/// let sim = Sim::new();
/// sim.add_chip("a", 1);
/// sim.add_chip("b", 1);
///
/// let mut chips = ChipIter::new(sim).unwrap();
/// let first = chips.next().unwrap().unwrap();
/// let _second = chips.next();
/// println!("{}", first.label());
/// ```
#[derive(Debug)]
pub struct ChipIter<B: Backend = Cdev, D = AutoClose> {
    backend: B,
    pending: std::vec::IntoIter<u32>,
    current: Option<Chip<B>>,
    policy: PhantomData<D>,
}

impl<B: Backend, D> ChipIter<B, D> {
    fn with_policy(backend: B) -> Result<Self> {
        let pending = backend.chip_indices()?.into_iter();
        Ok(Self {
            backend,
            pending,
            current: None,
            policy: PhantomData,
        })
    }

    fn open_next(&mut self) -> Option<Result<Chip<B>>> {
        for index in self.pending.by_ref() {
            match Chip::open_with(self.backend.clone(), index) {
                Err(Error::NotFound(_)) => {
                    debug!("gpiochip{} disappeared, skipping", index);
                }
                res => return Some(res),
            }
        }
        None
    }
}

impl<B: Backend> ChipIter<B, AutoClose> {
    pub fn new(backend: B) -> Result<Self> {
        Self::with_policy(backend)
    }

    /// Close the previously returned chip and open the next one.
    ///
    /// `None` marks the end; by then every chip has been closed.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Result<&Chip<B>>> {
        if let Some(chip) = self.current.take() {
            chip.close();
        }

        match self.open_next()? {
            Ok(chip) => Some(Ok(&*self.current.insert(chip))),
            Err(e) => Some(Err(e)),
        }
    }

    /// The chip returned by the last call to [`ChipIter::next`], if still open
    pub fn current(&self) -> Option<&Chip<B>> {
        self.current.as_ref()
    }

    /// Dispose of the iterator, closing the current chip.  Dropping the
    /// iterator does the same.
    pub fn free(self) {
        if let Some(chip) = self.current {
            chip.close();
        }
    }

    /// Dispose of the iterator and take the current chip out of it, open.
    pub fn free_no_close(self) -> Option<Chip<B>> {
        self.current
    }
}

impl<B: Backend> ChipIter<B, KeepOpen> {
    pub fn new_no_close(backend: B) -> Result<Self> {
        Self::with_policy(backend)
    }
}

impl<B: Backend> Iterator for ChipIter<B, KeepOpen> {
    type Item = Result<Chip<B>>;

    fn next(&mut self) -> Option<Result<Chip<B>>> {
        self.open_next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.pending.len()))
    }
}
