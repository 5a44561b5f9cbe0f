// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory scanned for `gpiochipN` character devices
pub const DEFAULT_DEVICE_DIR: &str = "/dev";

/// Timeout used by [`Line::wait_for_event`](crate::line::Line::wait_for_event)
///
/// Short enough for tight polling loops without spinning the caller's thread.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Settings shared by every chip and line opened through a backend.
///
/// ```
/// use std::time::Duration;
/// use gpio_cdev_lines::Config;
///
/// let config = Config::new()
///     .with_poll_timeout(Duration::from_micros(500))
///     .with_event_buffer_size(64);
/// assert_eq!(config.poll_timeout(), Duration::from_micros(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    device_dir: PathBuf,
    poll_timeout: Duration,
    event_buffer_size: u32,
}

impl Config {
    pub fn new() -> Self {
        Self {
            device_dir: PathBuf::from(DEFAULT_DEVICE_DIR),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            event_buffer_size: 0,
        }
    }

    pub fn with_device_dir(self, dir: impl Into<PathBuf>) -> Self {
        Self {
            device_dir: dir.into(),
            ..self
        }
    }

    pub fn with_poll_timeout(self, poll_timeout: Duration) -> Self {
        Self {
            poll_timeout,
            ..self
        }
    }

    /// Number of edge events the kernel buffers per request; 0 picks the
    /// kernel default.
    pub fn with_event_buffer_size(self, event_buffer_size: u32) -> Self {
        Self {
            event_buffer_size,
            ..self
        }
    }

    pub fn device_dir(&self) -> &Path {
        &self.device_dir
    }

    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    pub fn event_buffer_size(&self) -> u32 {
        self.event_buffer_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
