// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The kernel-facing layer that [`Chip`](crate::Chip) and
//! [`Line`](crate::line::Line) are built on.
//!
//! [`Cdev`] talks to `/dev/gpiochipN`; [`Sim`] is an in-process chip set
//! for tests and for running code on machines without GPIO hardware.
//!
//! Handles are owned resources: dropping a chip handle closes the chip and
//! dropping a request handle releases the line.

use std::time::Duration;

use crate::config::Config;
use crate::errors::Result;
use crate::fixed_str::Name;
use crate::line::{options::AsLineOptions, LineEvent, LineInfo, LineValue};
use crate::uapi::v2::LineFlags;

mod cdev;
mod sim;

pub use cdev::{Cdev, CdevChip, CdevRequest};
pub use sim::{Sim, SimChipHandle, SimRequest, SIM_EVENT_CAPACITY};

/// Name, label and size of an open chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipInfo {
    name: Name,
    label: Name,
    lines: u32,
}

impl ChipInfo {
    pub fn new(name: &str, label: &str, lines: u32) -> Self {
        Self {
            name: Name::truncating(name),
            label: Name::truncating(label),
            lines,
        }
    }

    /// The name of the device driving this GPIO chip in the kernel
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// A functional name for this GPIO chip, such as a product number.  Might
    /// be an empty string.
    ///
    /// As an example, the SoC GPIO chip on a Raspberry Pi is "pinctrl-bcm2835"
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// The number of lines/pins indexable through this chip
    pub const fn num_lines(&self) -> u32 {
        self.lines
    }
}

/// A single-line request as handed to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRequest {
    flags: LineFlags,
    initial: LineValue,
}

impl LineRequest {
    pub fn new(options: impl AsLineOptions, initial: LineValue) -> Self {
        Self {
            flags: options.build_v2(),
            initial,
        }
    }

    pub fn flags(&self) -> LineFlags {
        self.flags
    }

    /// Logical level driven right away; only meaningful for outputs
    pub fn initial_value(&self) -> LineValue {
        self.initial
    }
}

/// Everything the chip and line layers need from the system.
///
/// Errors must already be classified (see [`crate::Error`]): a caller never
/// has to inspect a sentinel value.
pub trait Backend: Clone + std::fmt::Debug {
    type ChipHandle: std::fmt::Debug;
    type RequestHandle: std::fmt::Debug;

    fn config(&self) -> &Config;

    /// Indices of the chips currently present, in ascending order.
    fn chip_indices(&self) -> Result<Vec<u32>>;

    fn open_chip(&self, index: u32) -> Result<Self::ChipHandle>;

    /// Close a chip. Request handles obtained through it become stale.
    fn close_chip(&self, chip: Self::ChipHandle) {
        drop(chip);
    }

    fn chip_info(&self, chip: &Self::ChipHandle) -> Result<ChipInfo>;

    fn line_info(&self, chip: &Self::ChipHandle, offset: u32) -> Result<LineInfo>;

    fn request_line(
        &self,
        chip: &Self::ChipHandle,
        offset: u32,
        consumer: &Name,
        request: LineRequest,
    ) -> Result<Self::RequestHandle>;

    fn release_line(&self, request: Self::RequestHandle) {
        drop(request);
    }

    fn get_value(&self, request: &Self::RequestHandle) -> Result<LineValue>;

    fn set_value(&self, request: &Self::RequestHandle, value: LineValue) -> Result<()>;

    /// Wait up to `timeout` for an edge event; `Ok(true)` if one is queued.
    fn wait_event(&self, request: &Self::RequestHandle, timeout: Duration) -> Result<bool>;

    /// Take the oldest queued event, blocking until there is one.
    fn read_event(&self, request: &Self::RequestHandle) -> Result<LineEvent>;
}
