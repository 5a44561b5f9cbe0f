// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::time::Duration;

use crate::errors::{Error, Operation, Result};
use crate::uapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RisingEdge,
    FallingEdge,
}

/// Outcome of a timed wait for an edge event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WaitResult {
    /// Nothing was queued before the timeout elapsed
    TimedOut,
    /// At least one event can be read without blocking
    EventReady,
}

impl WaitResult {
    pub const fn is_ready(&self) -> bool {
        matches!(self, WaitResult::EventReady)
    }
}

/// An edge detected on a monitored line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEvent {
    kind: EventKind,
    timestamp: Duration,
    offset: u32,
    sequence: u32,
    line_sequence: u32,
}

impl LineEvent {
    pub(crate) const fn new(
        kind: EventKind,
        timestamp: Duration,
        offset: u32,
        sequence: u32,
        line_sequence: u32,
    ) -> Self {
        Self {
            kind,
            timestamp,
            offset,
            sequence,
            line_sequence,
        }
    }

    pub(crate) fn from_v2(event: uapi::v2::gpio_line_event) -> Result<Self> {
        let kind = match event.id {
            uapi::v2::LINE_EVENT_RISING_EDGE => EventKind::RisingEdge,
            uapi::v2::LINE_EVENT_FALLING_EDGE => EventKind::FallingEdge,
            id => {
                return Err(Error::io(
                    Operation::ReadEvent,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("unknown line event id {id}"),
                    ),
                ))
            }
        };

        Ok(Self::new(
            kind,
            Duration::from_nanos(event.timestamp_ns),
            event.offset,
            event.seqno,
            event.line_seqno,
        ))
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Best estimate of when the edge happened, on the monotonic clock
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Sequence number across all lines of the request
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn line_sequence(&self) -> u32 {
        self.line_sequence
    }
}
