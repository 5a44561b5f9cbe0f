// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::uapi::v2::LineFlags;

pub mod builder {
    pub use super::super::option_builder::*;
}

/// Anything that can be turned into the kernel flags of a line request.
pub trait AsLineOptions {
    fn build_v2(self) -> LineFlags;
}

impl AsLineOptions for LineFlags {
    #[inline(always)]
    fn build_v2(self) -> LineFlags {
        self
    }
}

/// Entry points of the request option builder.
///
/// ```
/// use gpio_cdev_lines::line::options::{Bias, EdgeDetect, LineOptions};
///
/// let button = LineOptions::input()
///     .with_bias(Bias::PullUp)
///     .with_edge_detect(EdgeDetect::Falling);
/// # let _ = button;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LineOptions;

impl LineOptions {
    pub const fn input() -> builder::LineOptionBuilder<builder::HasInput> {
        builder::LineOptionBuilder::new().input()
    }

    pub const fn output() -> builder::LineOptionBuilder<builder::HasDrivenOutput> {
        builder::LineOptionBuilder::new().output()
    }

    pub const fn both_edges() -> builder::LineOptionBuilder<builder::HasEvent> {
        Self::input().with_edge_detect(EdgeDetect::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Active {
    #[default]
    High,
    Low,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EdgeDetect {
    Rising,
    Falling,
    #[default]
    Both,
}

impl EdgeDetect {
    pub(crate) const fn from_flags(flags: LineFlags) -> Option<Self> {
        match (
            flags.contains(LineFlags::EDGE_RISING),
            flags.contains(LineFlags::EDGE_FALLING),
        ) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::Rising),
            (false, true) => Some(Self::Falling),
            (false, false) => None,
        }
    }

    pub(crate) const fn flags(self) -> LineFlags {
        match self {
            EdgeDetect::Rising => LineFlags::EDGE_RISING,
            EdgeDetect::Falling => LineFlags::EDGE_FALLING,
            EdgeDetect::Both => LineFlags::EDGES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    PushPull,
    OpenDrain,
    OpenSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Bias {
    #[default]
    Disabled,
    PullUp,
    PullDown,
}

impl Bias {
    pub(crate) const fn from_flags(flags: LineFlags) -> Option<Self> {
        if flags.contains(LineFlags::BIAS_PULL_UP) {
            Some(Self::PullUp)
        } else if flags.contains(LineFlags::BIAS_PULL_DOWN) {
            Some(Self::PullDown)
        } else if flags.contains(LineFlags::BIAS_DISABLED) {
            Some(Self::Disabled)
        } else {
            None
        }
    }
}

/// What a line handle currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Input,
    Output,
    /// Edge monitoring; the kernel treats this as an input request
    Events(EdgeDetect),
}

impl Reservation {
    pub(crate) const fn from_flags(flags: LineFlags) -> Self {
        if flags.contains(LineFlags::OUTPUT) {
            return Self::Output;
        }
        match EdgeDetect::from_flags(flags) {
            Some(edge) => Self::Events(edge),
            None => Self::Input,
        }
    }

    pub const fn direction(&self) -> Direction {
        match self {
            Reservation::Output => Direction::Output,
            Reservation::Input | Reservation::Events(_) => Direction::Input,
        }
    }
}
