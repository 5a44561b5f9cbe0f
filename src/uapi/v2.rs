// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use bitflags::bitflags;
use nix::ioctl_readwrite;

pub const GPIO_LINES_MAX: usize = 64;
pub const GPIO_MAX_NAME_SIZE: usize = 32;
pub const GPIO_LINE_NUM_ATTRS_MAX: usize = 10;

bitflags! {
    /// Line configuration and informational flags
    ///
    /// Maps to kernel [`GPIO_V2_LINE_FLAG_*`] flags.
    ///
    /// [`GPIO_V2_LINE_FLAG_*`]: https://github.com/torvalds/linux/blob/v5.19/include/uapi/linux/gpio.h
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LineFlags: u64 {
        const USED = (1 << 0);
        const ACTIVE_LOW = (1 << 1);
        const INPUT = (1 << 2);
        const OUTPUT = (1 << 3);
        const EDGE_RISING = (1 << 4);
        const EDGE_FALLING = (1 << 5);
        const OPEN_DRAIN = (1 << 6);
        const OPEN_SOURCE = (1 << 7);
        const BIAS_PULL_UP = (1 << 8);
        const BIAS_PULL_DOWN = (1 << 9);
        const BIAS_DISABLED = (1 << 10);
        const EVENT_CLOCK_REALTIME = (1 << 11);
        const EVENT_CLOCK_HTE = (1 << 12);
    }
}

impl LineFlags {
    pub const EDGES: Self = Self::EDGE_RISING.union(Self::EDGE_FALLING);
}

/// GPIO_V2_LINE_ATTR_ID_OUTPUT_VALUES
pub const LINE_ATTR_ID_OUTPUT_VALUES: u32 = 2;

/// GPIO_V2_LINE_EVENT_RISING_EDGE
pub const LINE_EVENT_RISING_EDGE: u32 = 1;
/// GPIO_V2_LINE_EVENT_FALLING_EDGE
pub const LINE_EVENT_FALLING_EDGE: u32 = 2;

#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct gpio_line_values {
    pub bits: u64,
    pub mask: u64,
}

#[allow(dead_code)]
#[derive(Clone, Copy)]
#[repr(C)]
pub union gpio_line_attribute_union {
    pub flags: u64,
    pub values: u64,
    pub debounce_period_us: u32,
}

/// A configurable attribute of a line; `id` tags the union
#[derive(Clone, Copy)]
#[repr(C)]
pub struct gpio_line_attribute {
    pub id: u32,
    pub _padding: u32,
    pub attribute: gpio_line_attribute_union,
}

impl gpio_line_attribute {
    pub const fn zeroed() -> Self {
        Self {
            id: 0,
            _padding: 0,
            attribute: gpio_line_attribute_union { values: 0 },
        }
    }
}

#[derive(Clone, Copy)]
#[repr(C)]
pub struct gpio_line_config_attribute {
    pub attr: gpio_line_attribute,
    pub mask: u64,
}

#[derive(Clone, Copy)]
#[repr(C)]
pub struct gpio_line_config {
    pub flags: u64,
    pub num_attrs: u32,
    pub _padding: [u32; 5],
    pub attrs: [gpio_line_config_attribute; GPIO_LINE_NUM_ATTRS_MAX],
}

impl gpio_line_config {
    pub const fn zeroed() -> Self {
        Self {
            flags: 0,
            num_attrs: 0,
            _padding: [0; 5],
            attrs: [gpio_line_config_attribute {
                attr: gpio_line_attribute::zeroed(),
                mask: 0,
            }; GPIO_LINE_NUM_ATTRS_MAX],
        }
    }
}

#[derive(Clone, Copy)]
#[repr(C)]
pub struct gpio_line_request {
    pub offsets: [u32; GPIO_LINES_MAX],
    pub consumer: [u8; GPIO_MAX_NAME_SIZE],
    pub config: gpio_line_config,
    pub num_lines: u32,
    pub event_buffer_size: u32,
    pub _padding: [u32; 5],
    pub fd: libc::c_int,
}

impl gpio_line_request {
    pub const fn zeroed() -> Self {
        Self {
            offsets: [0; GPIO_LINES_MAX],
            consumer: [0; GPIO_MAX_NAME_SIZE],
            config: gpio_line_config::zeroed(),
            num_lines: 0,
            event_buffer_size: 0,
            _padding: [0; 5],
            fd: -1,
        }
    }
}

#[derive(Clone, Copy)]
#[repr(C)]
pub struct gpio_line_info {
    pub name: [u8; GPIO_MAX_NAME_SIZE],
    pub consumer: [u8; GPIO_MAX_NAME_SIZE],
    pub offset: u32,
    pub num_attrs: u32,
    pub flags: u64,
    pub attrs: [gpio_line_attribute; GPIO_LINE_NUM_ATTRS_MAX],
    pub _padding: [u32; 4],
}

impl gpio_line_info {
    pub const fn zeroed() -> Self {
        Self {
            name: [0; GPIO_MAX_NAME_SIZE],
            consumer: [0; GPIO_MAX_NAME_SIZE],
            offset: 0,
            num_attrs: 0,
            flags: 0,
            attrs: [gpio_line_attribute::zeroed(); GPIO_LINE_NUM_ATTRS_MAX],
            _padding: [0; 4],
        }
    }
}

/// struct gpio_v2_line_event, as read from a line request fd
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct gpio_line_event {
    pub timestamp_ns: u64,
    pub id: u32,
    pub offset: u32,
    pub seqno: u32,
    pub line_seqno: u32,
}

impl gpio_line_event {
    /// Size of the kernel record, including its reserved tail.
    pub const SIZE: usize = 48;

    pub fn from_bytes(buf: &[u8; Self::SIZE]) -> Self {
        let u32_at = |at: usize| {
            let mut b = [0; 4];
            b.copy_from_slice(&buf[at..at + 4]);
            u32::from_ne_bytes(b)
        };
        let mut ts = [0; 8];
        ts.copy_from_slice(&buf[..8]);

        Self {
            timestamp_ns: u64::from_ne_bytes(ts),
            id: u32_at(8),
            offset: u32_at(12),
            seqno: u32_at(16),
            line_seqno: u32_at(20),
        }
    }
}

ioctl_readwrite!(gpio_get_line_info, 0xB4, 0x05, gpio_line_info);
ioctl_readwrite!(gpio_get_line, 0xB4, 0x07, gpio_line_request);

ioctl_readwrite!(gpio_line_get_values, 0xB4, 0x0E, gpio_line_values);
ioctl_readwrite!(gpio_line_set_values, 0xB4, 0x0F, gpio_line_values);

#[cfg(test)]
mod test {
    use std::mem::size_of;

    use super::*;

    #[test]
    fn abi_sizes() {
        assert_eq!(size_of::<crate::uapi::gpio_chip_info>(), 68);
        assert_eq!(size_of::<gpio_line_values>(), 16);
        assert_eq!(size_of::<gpio_line_attribute>(), 16);
        assert_eq!(size_of::<gpio_line_config>(), 272);
        assert_eq!(size_of::<gpio_line_request>(), 592);
        assert_eq!(size_of::<gpio_line_info>(), 256);
    }

    #[test]
    fn parse_event_record() {
        let mut buf = [0u8; gpio_line_event::SIZE];
        buf[..8].copy_from_slice(&1_500_000_000u64.to_ne_bytes());
        buf[8..12].copy_from_slice(&LINE_EVENT_FALLING_EDGE.to_ne_bytes());
        buf[12..16].copy_from_slice(&17u32.to_ne_bytes());
        buf[16..20].copy_from_slice(&4u32.to_ne_bytes());
        buf[20..24].copy_from_slice(&2u32.to_ne_bytes());

        let event = gpio_line_event::from_bytes(&buf);
        assert_eq!(
            event,
            gpio_line_event {
                timestamp_ns: 1_500_000_000,
                id: LINE_EVENT_FALLING_EDGE,
                offset: 17,
                seqno: 4,
                line_seqno: 2,
            }
        );
    }
}
