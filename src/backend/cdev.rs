// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::{
    fs::{File, OpenOptions},
    io::Read,
    os::{
        fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd},
        unix::ffi::OsStrExt,
    },
    path::{Path, PathBuf},
    time::Duration,
};

use bstr::ByteSlice;
use itertools::Itertools;
use log::{debug, trace};
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout};

use super::{Backend, ChipInfo, LineRequest};
use crate::{
    config::Config,
    errors::{Error, Operation, Resource, Result},
    fixed_str::Name,
    line::{LineEvent, LineInfo, LineValue},
    uapi::{self, v2::LineFlags},
};

/// The Linux GPIO character devices, `/dev/gpiochipN`.
///
/// It is best not to assume that a device will always be enumerated in the
/// same order (especially if it is connected via a bus).  To find a chip
/// reliably, either set up a udev rule that creates a stable symlink and
/// use [`Chip::open_path`](crate::Chip::open_path), or iterate over all
/// chips with [`chips()`](crate::chips) and match on name or label.
#[derive(Debug, Clone, Default)]
pub struct Cdev {
    config: Config,
}

/// An open `/dev/gpiochipN`
#[derive(Debug)]
pub struct CdevChip {
    file: File,
    index: u32,
}

impl CdevChip {
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl AsFd for CdevChip {
    #[inline(always)]
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

/// The file descriptor the kernel returns for a line request
#[derive(Debug)]
pub struct CdevRequest {
    file: File,
    chip: u32,
    offset: u32,
}

impl CdevRequest {
    fn resource(&self) -> Resource {
        Resource::Line {
            chip: self.chip,
            offset: self.offset,
        }
    }
}

impl AsFd for CdevRequest {
    #[inline(always)]
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl Cdev {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    fn chip_path(&self, index: u32) -> PathBuf {
        self.config.device_dir().join(format!("gpiochip{index}"))
    }

    /// Open the chip at `path`, following symlinks to the `gpiochipN` node.
    pub fn open_path(&self, path: &Path) -> Result<CdevChip> {
        let resource = Resource::ChipPath(path.to_path_buf());
        let real = path
            .canonicalize()
            .map_err(|e| Error::from_io(Operation::OpenChip, resource.clone(), e))?;
        let index = real
            .file_name()
            .and_then(|name| parse_chip_index(name.as_bytes()))
            .ok_or_else(|| Error::NotFound(resource.clone()))?;

        self.open_device(&real, index, resource)
    }

    fn open_device(&self, path: &Path, index: u32, resource: Resource) -> Result<CdevChip> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::from_io(Operation::OpenChip, resource.clone(), e))?;
        let chip = CdevChip { file, index };

        // Anything that does not answer the chip info ioctl is not a gpio chip.
        read_chip_info(&chip, resource)?;

        debug!("opened {}", path.display());
        Ok(chip)
    }
}

fn parse_chip_index(file_name: &[u8]) -> Option<u32> {
    let digits = file_name.strip_prefix(b"gpiochip")?;
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    digits.to_str().ok()?.parse().ok()
}

fn read_chip_info(chip: &CdevChip, resource: Resource) -> Result<ChipInfo> {
    let mut info = uapi::gpio_chip_info::zeroed();
    // Error condition: -1, already mapped to Err by nix
    unsafe { uapi::gpio_get_chipinfo(chip.file.as_raw_fd(), &mut info) }
        .map_err(|e| Error::from_errno(Operation::ChipInfo, resource, e))?;

    Ok(ChipInfo::new(
        Name::from_kernel(&info.name).as_str(),
        Name::from_kernel(&info.label).as_str(),
        info.lines,
    ))
}

/// Round up so sub-millisecond timeouts still wait.
fn poll_timeout(timeout: Duration) -> PollTimeout {
    let millis = timeout.as_nanos().div_ceil(1_000_000);
    u16::try_from(millis)
        .map(PollTimeout::from)
        .unwrap_or(PollTimeout::MAX)
}

impl Backend for Cdev {
    type ChipHandle = CdevChip;
    type RequestHandle = CdevRequest;

    fn config(&self) -> &Config {
        &self.config
    }

    fn chip_indices(&self) -> Result<Vec<u32>> {
        let entries = match std::fs::read_dir(self.config.device_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(Operation::ScanChips, e)),
        };

        itertools::process_results(entries, |entries| {
            entries
                .filter_map(|entry| parse_chip_index(entry.file_name().as_bytes()))
                .sorted_unstable()
                .dedup()
                .collect()
        })
        .map_err(|e| Error::io(Operation::ScanChips, e))
    }

    fn open_chip(&self, index: u32) -> Result<CdevChip> {
        self.open_device(&self.chip_path(index), index, Resource::Chip(index))
    }

    fn chip_info(&self, chip: &CdevChip) -> Result<ChipInfo> {
        read_chip_info(chip, Resource::Chip(chip.index))
    }

    fn line_info(&self, chip: &CdevChip, offset: u32) -> Result<LineInfo> {
        let mut info = uapi::v2::gpio_line_info::zeroed();
        info.offset = offset;

        unsafe { uapi::v2::gpio_get_line_info(chip.file.as_raw_fd(), &mut info) }.map_err(|e| {
            Error::from_errno(
                Operation::LineInfo,
                Resource::Line {
                    chip: chip.index,
                    offset,
                },
                e,
            )
        })?;

        Ok(LineInfo::from_v2(&info))
    }

    fn request_line(
        &self,
        chip: &CdevChip,
        offset: u32,
        consumer: &Name,
        request: LineRequest,
    ) -> Result<CdevRequest> {
        let mut req = uapi::v2::gpio_line_request::zeroed();
        req.offsets[0] = offset;
        req.num_lines = 1;
        req.consumer = consumer.to_kernel();
        req.config.flags = request.flags().bits();
        req.event_buffer_size = self.config.event_buffer_size();

        if request.flags().contains(LineFlags::OUTPUT) {
            req.config.num_attrs = 1;
            req.config.attrs[0] = uapi::v2::gpio_line_config_attribute {
                attr: uapi::v2::gpio_line_attribute {
                    id: uapi::v2::LINE_ATTR_ID_OUTPUT_VALUES,
                    _padding: 0,
                    attribute: uapi::v2::gpio_line_attribute_union {
                        values: request.initial_value().as_bit(),
                    },
                },
                mask: 1,
            };
        }

        let resource = Resource::Line {
            chip: chip.index,
            offset,
        };
        unsafe { uapi::v2::gpio_get_line(chip.file.as_raw_fd(), &mut req) }
            .map_err(|e| Error::from_errno(Operation::RequestLine, resource, e))?;

        // SAFETY: on success the kernel hands us a fresh descriptor that
        // nothing else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(req.fd) };

        debug!(
            "requested line {} of gpiochip{} for {:?} ({:?})",
            offset,
            chip.index,
            consumer,
            request.flags()
        );

        Ok(CdevRequest {
            file: File::from(fd),
            chip: chip.index,
            offset,
        })
    }

    fn get_value(&self, request: &CdevRequest) -> Result<LineValue> {
        let mut data = uapi::v2::gpio_line_values { bits: 0, mask: 1 };
        unsafe { uapi::v2::gpio_line_get_values(request.file.as_raw_fd(), &mut data) }
            .map_err(|e| Error::from_errno(Operation::GetValue, request.resource(), e))?;
        Ok(LineValue::from_bit(data.bits))
    }

    fn set_value(&self, request: &CdevRequest, value: LineValue) -> Result<()> {
        let mut data = uapi::v2::gpio_line_values {
            bits: value.as_bit(),
            mask: 1,
        };
        unsafe { uapi::v2::gpio_line_set_values(request.file.as_raw_fd(), &mut data) }
            .map_err(|e| Error::from_errno(Operation::SetValue, request.resource(), e))?;
        Ok(())
    }

    fn wait_event(&self, request: &CdevRequest, timeout: Duration) -> Result<bool> {
        let mut fds = [PollFd::new(request.file.as_fd(), PollFlags::POLLIN)];
        let ready = nix::poll::poll(&mut fds, poll_timeout(timeout))
            .map_err(|e| Error::from_errno(Operation::WaitEvent, request.resource(), e))?;

        trace!("poll on line {} returned {}", request.offset, ready);

        if ready == 0 {
            return Ok(false);
        }

        let revents = fds[0].revents().unwrap_or(PollFlags::empty());
        if revents.contains(PollFlags::POLLIN) {
            Ok(true)
        } else if revents.intersects(PollFlags::POLLERR | PollFlags::POLLHUP | PollFlags::POLLNVAL) {
            Err(Error::io(Operation::WaitEvent, Errno::EIO))
        } else {
            Ok(false)
        }
    }

    fn read_event(&self, request: &CdevRequest) -> Result<LineEvent> {
        let mut buf = [0u8; uapi::v2::gpio_line_event::SIZE];

        loop {
            match (&request.file).read(&mut buf) {
                Ok(read) if read == buf.len() => break,
                Ok(read) => {
                    return Err(Error::io(
                        Operation::ReadEvent,
                        std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            format!("short line event read: {read} bytes"),
                        ),
                    ))
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => (),
                Err(e) => return Err(Error::from_io(Operation::ReadEvent, request.resource(), e)),
            }
        }

        let event = LineEvent::from_v2(uapi::v2::gpio_line_event::from_bytes(&buf))?;
        trace!("line {} event {:?}", request.offset, event);
        Ok(event)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::ErrorKind;

    fn device_dir(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        dir
    }

    #[test]
    fn chip_index_names() {
        assert_eq!(parse_chip_index(b"gpiochip0"), Some(0));
        assert_eq!(parse_chip_index(b"gpiochip12"), Some(12));
        assert_eq!(parse_chip_index(b"gpiochip"), None);
        assert_eq!(parse_chip_index(b"gpiochip+1"), None);
        assert_eq!(parse_chip_index(b"gpiochipX"), None);
        assert_eq!(parse_chip_index(b"ttyS0"), None);
    }

    #[test]
    fn scan_sorts_and_filters() {
        let dir = device_dir(&["gpiochip10", "gpiochip2", "null", "gpiochip0", "gpiochipA"]);
        let cdev = Cdev::with_config(Config::new().with_device_dir(dir.path()));

        assert_eq!(cdev.chip_indices().unwrap(), vec![0, 2, 10]);
    }

    #[test]
    fn scan_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cdev = Cdev::with_config(Config::new().with_device_dir(dir.path().join("absent")));

        assert!(cdev.chip_indices().unwrap().is_empty());
    }

    #[test]
    fn open_absent_chip() {
        let dir = device_dir(&[]);
        let cdev = Cdev::with_config(Config::new().with_device_dir(dir.path()));

        let err = cdev.open_chip(3).unwrap_err();
        assert!(matches!(err, Error::NotFound(Resource::Chip(3))));
    }

    #[test]
    fn regular_file_is_not_a_chip() {
        let dir = device_dir(&["gpiochip1"]);
        let cdev = Cdev::with_config(Config::new().with_device_dir(dir.path()));

        let err = cdev.open_chip(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn open_path_requires_chip_name() {
        let dir = device_dir(&["led"]);
        let err = Cdev::new().open_path(&dir.path().join("led")).unwrap_err();
        assert!(matches!(err, Error::NotFound(Resource::ChipPath(_))));

        let err = Cdev::new()
            .open_path(&dir.path().join("missing"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn poll_timeout_rounds_up() {
        assert_eq!(poll_timeout(Duration::ZERO), PollTimeout::ZERO);
        assert_eq!(poll_timeout(Duration::from_micros(200)), PollTimeout::from(1u16));
        assert_eq!(poll_timeout(Duration::from_nanos(500)), PollTimeout::from(1u16));
        assert_eq!(poll_timeout(Duration::from_nanos(1_000_001)), PollTimeout::from(2u16));
        assert_eq!(poll_timeout(Duration::from_millis(1)), PollTimeout::from(1u16));
        assert_eq!(poll_timeout(Duration::from_secs(3600)), PollTimeout::MAX);
    }
}
