// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::fixed_str::Name;
use crate::uapi::{self, v2::LineFlags};

use super::options::{Bias, Direction, EdgeDetect};

/// What the kernel reports about a line, whoever holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInfo {
    name: Name,
    consumer: Name,
    offset: u32,
    flags: LineFlags,
}

impl LineInfo {
    pub(crate) fn new(name: &str, consumer: &str, offset: u32, flags: LineFlags) -> Self {
        Self {
            name: Name::truncating(name),
            consumer: Name::truncating(consumer),
            offset,
            flags,
        }
    }

    pub(crate) fn from_v2(info: &uapi::v2::gpio_line_info) -> Self {
        Self {
            name: Name::from_kernel(&info.name),
            consumer: Name::from_kernel(&info.consumer),
            offset: info.offset,
            flags: LineFlags::from_bits_truncate(info.flags),
        }
    }

    /// Name given to the line by the driver or device tree, if any
    pub fn name(&self) -> Option<&str> {
        if self.name.is_empty() {
            None
        } else {
            Some(self.name.as_str())
        }
    }

    /// Label of whoever holds the line, if anyone
    pub fn consumer(&self) -> Option<&str> {
        if self.consumer.is_empty() {
            None
        } else {
            Some(self.consumer.as_str())
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn flags(&self) -> LineFlags {
        self.flags
    }

    /// Lines are considered to be inputs unless the kernel marks them as
    /// outputs.
    pub fn direction(&self) -> Direction {
        if self.flags.contains(LineFlags::OUTPUT) {
            Direction::Output
        } else {
            Direction::Input
        }
    }

    /// True if the line is requested by a process or claimed by the kernel
    pub fn is_used(&self) -> bool {
        self.flags.contains(LineFlags::USED)
    }

    pub fn is_active_low(&self) -> bool {
        self.flags.contains(LineFlags::ACTIVE_LOW)
    }

    pub fn is_open_drain(&self) -> bool {
        self.flags.contains(LineFlags::OPEN_DRAIN)
    }

    pub fn is_open_source(&self) -> bool {
        self.flags.contains(LineFlags::OPEN_SOURCE)
    }

    pub fn bias(&self) -> Option<Bias> {
        Bias::from_flags(self.flags)
    }

    pub fn edge_detect(&self) -> Option<EdgeDetect> {
        EdgeDetect::from_flags(self.flags)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_kernel_record() {
        let mut raw = uapi::v2::gpio_line_info::zeroed();
        raw.name[..6].copy_from_slice(b"GPIO17");
        raw.consumer[..7].copy_from_slice(b"monitor");
        raw.offset = 17;
        raw.flags = (LineFlags::USED | LineFlags::INPUT | LineFlags::EDGE_RISING).bits();

        let info = LineInfo::from_v2(&raw);
        assert_eq!(info.name(), Some("GPIO17"));
        assert_eq!(info.consumer(), Some("monitor"));
        assert_eq!(info.offset(), 17);
        assert!(info.is_used());
        assert_eq!(info.direction(), Direction::Input);
        assert_eq!(info.edge_detect(), Some(EdgeDetect::Rising));
    }

    #[test]
    fn unused_line_has_no_consumer() {
        let info = LineInfo::new("", "", 2, LineFlags::OUTPUT);
        assert_eq!(info.name(), None);
        assert_eq!(info.consumer(), None);
        assert!(!info.is_used());
        assert_eq!(info.direction(), Direction::Output);
    }
}
