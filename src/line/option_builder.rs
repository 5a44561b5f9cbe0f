// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::marker::PhantomData;

use crate::uapi::v2::LineFlags;

use super::options::*;

#[derive(Debug, Clone, Copy)]
pub struct HasInput;

#[derive(Debug, Clone, Copy)]
pub struct HasEvent;

#[derive(Debug, Clone, Copy)]
pub struct HasDrivenOutput;

#[derive(Debug, Clone, Copy)]
pub struct HasOpenOutput;

/// Typed builder for line request flags; the type parameter tracks which
/// settings are meaningful.
#[derive(Debug, Clone, Copy)]
pub struct LineOptionBuilder<Dir> {
    d: PhantomData<Dir>,
    active: Option<Active>,
    edge: Option<EdgeDetect>,
    bias: Option<Bias>,
    drive: Option<Drive>,
}

impl<D> LineOptionBuilder<D> {
    const fn conv<O>(self) -> LineOptionBuilder<O> {
        let Self {
            d: _,
            active,
            edge,
            bias,
            drive,
        } = self;
        LineOptionBuilder {
            d: PhantomData,
            active,
            edge,
            bias,
            drive,
        }
    }

    pub const fn with_active(self, active: Active) -> Self {
        Self {
            active: Some(active),
            ..self
        }
    }

    const fn active_flags(&self, flags: LineFlags) -> LineFlags {
        match self.active {
            Some(Active::Low) => flags.union(LineFlags::ACTIVE_LOW),
            Some(Active::High) | None => flags,
        }
    }

    const fn bias_flags(&self, flags: LineFlags) -> LineFlags {
        match self.bias {
            Some(Bias::PullDown) => flags.union(LineFlags::BIAS_PULL_DOWN),
            Some(Bias::PullUp) => flags.union(LineFlags::BIAS_PULL_UP),
            Some(Bias::Disabled) => flags.union(LineFlags::BIAS_DISABLED),
            // Leave the bias as configured by firmware/device tree.
            None => flags,
        }
    }
}

impl LineOptionBuilder<()> {
    pub const fn new() -> Self {
        Self {
            d: PhantomData,
            active: None,
            edge: None,
            bias: None,
            drive: None,
        }
    }

    pub const fn input(self) -> LineOptionBuilder<HasInput> {
        self.conv()
    }

    pub const fn output(self) -> LineOptionBuilder<HasDrivenOutput> {
        self.conv()
    }
}

impl LineOptionBuilder<HasInput> {
    pub const fn with_bias(self, bias: Bias) -> Self {
        Self {
            bias: Some(bias),
            ..self
        }
    }

    pub const fn with_edge_detect(self, edge_detect: EdgeDetect) -> LineOptionBuilder<HasEvent> {
        Self {
            edge: Some(edge_detect),
            ..self
        }
        .conv()
    }

    pub(crate) const fn build_v2(self) -> LineFlags {
        self.bias_flags(self.active_flags(LineFlags::INPUT))
    }
}

impl LineOptionBuilder<HasEvent> {
    pub const fn with_bias(self, bias: Bias) -> Self {
        Self {
            bias: Some(bias),
            ..self
        }
    }

    pub(crate) const fn build_v2(self) -> LineFlags {
        let flags = self.bias_flags(self.active_flags(LineFlags::INPUT));

        match self.edge {
            Some(edge) => flags.union(edge.flags()),
            None => flags.union(LineFlags::EDGES),
        }
    }
}

impl LineOptionBuilder<HasDrivenOutput> {
    pub const fn with_drive_open(self, drive: Drive) -> LineOptionBuilder<HasOpenOutput> {
        Self {
            drive: Some(drive),
            ..self
        }
        .conv()
    }

    pub(crate) const fn build_v2(self) -> LineFlags {
        self.active_flags(LineFlags::OUTPUT)
    }
}

impl LineOptionBuilder<HasOpenOutput> {
    pub const fn with_drive(self, drive: Drive) -> Self {
        Self {
            drive: Some(drive),
            ..self
        }
    }

    pub const fn with_bias(self, bias: Bias) -> Self {
        Self {
            bias: Some(bias),
            ..self
        }
    }

    pub(crate) const fn build_v2(self) -> LineFlags {
        let flags = self.bias_flags(self.active_flags(LineFlags::OUTPUT));

        match self.drive {
            Some(Drive::OpenDrain) => flags.union(LineFlags::OPEN_DRAIN),
            Some(Drive::OpenSource) => flags.union(LineFlags::OPEN_SOURCE),
            Some(Drive::PushPull) | None => flags,
        }
    }
}

impl Default for LineOptionBuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl AsLineOptions for LineOptionBuilder<HasInput> {
    #[inline(always)]
    fn build_v2(self) -> LineFlags {
        Self::build_v2(self)
    }
}

impl AsLineOptions for LineOptionBuilder<HasEvent> {
    #[inline(always)]
    fn build_v2(self) -> LineFlags {
        Self::build_v2(self)
    }
}

impl AsLineOptions for LineOptionBuilder<HasDrivenOutput> {
    #[inline(always)]
    fn build_v2(self) -> LineFlags {
        Self::build_v2(self)
    }
}

impl AsLineOptions for LineOptionBuilder<HasOpenOutput> {
    #[inline(always)]
    fn build_v2(self) -> LineFlags {
        Self::build_v2(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    pub fn build_input() {
        const FLAGS: LineFlags = LineOptionBuilder::new()
            .input()
            .with_active(Active::Low)
            .with_bias(Bias::PullUp)
            .build_v2();

        assert_eq!(
            FLAGS,
            LineFlags::INPUT | LineFlags::ACTIVE_LOW | LineFlags::BIAS_PULL_UP
        );
    }

    #[test]
    pub fn build_events() {
        const FLAGS: LineFlags = LineOptionBuilder::new()
            .input()
            .with_bias(Bias::PullDown)
            .with_edge_detect(EdgeDetect::Rising)
            .build_v2();

        assert_eq!(
            FLAGS,
            LineFlags::INPUT | LineFlags::BIAS_PULL_DOWN | LineFlags::EDGE_RISING
        );
        assert_eq!(
            LineOptions::both_edges().build_v2(),
            LineFlags::INPUT | LineFlags::EDGE_RISING | LineFlags::EDGE_FALLING
        );
    }

    #[test]
    pub fn build_driven_output() {
        assert_eq!(LineOptions::output().build_v2(), LineFlags::OUTPUT);
        assert_eq!(
            LineOptions::output().with_active(Active::Low).build_v2(),
            LineFlags::OUTPUT | LineFlags::ACTIVE_LOW
        );
    }

    #[test]
    pub fn build_open_collector_output() {
        const FLAGS: LineFlags = LineOptionBuilder::new()
            .output()
            .with_drive_open(Drive::OpenSource)
            .with_active(Active::Low)
            .with_bias(Bias::PullUp)
            .build_v2();

        assert_eq!(
            FLAGS,
            LineFlags::OUTPUT
                | LineFlags::ACTIVE_LOW
                | LineFlags::OPEN_SOURCE
                | LineFlags::BIAS_PULL_UP
        );
    }
}
