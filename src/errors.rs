// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::io::Error as IOError;
use std::path::PathBuf;

use nix::errno::Errno;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// Something the caller asked for by name or number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// A chip addressed by its index (`gpiochipN`)
    Chip(u32),
    /// A chip addressed by its device path
    ChipPath(PathBuf),
    /// A line addressed by its offset on a chip
    Line { chip: u32, offset: u32 },
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Resource::Chip(index) => write!(f, "gpiochip{}", index),
            Resource::ChipPath(path) => write!(f, "gpio chip at {}", path.display()),
            Resource::Line { chip, offset } => write!(f, "line {} of gpiochip{}", offset, chip),
        }
    }
}

/// The kernel-facing call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ScanChips,
    OpenChip,
    ChipInfo,
    LineInfo,
    RequestLine,
    GetValue,
    SetValue,
    WaitEvent,
    ReadEvent,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Operation::ScanChips => write!(f, "scan for gpio chips"),
            Operation::OpenChip => write!(f, "open gpio chip"),
            Operation::ChipInfo => write!(f, "get chip info"),
            Operation::LineInfo => write!(f, "get line info"),
            Operation::RequestLine => write!(f, "request line"),
            Operation::GetValue => write!(f, "get line value"),
            Operation::SetValue => write!(f, "set line value"),
            Operation::WaitEvent => write!(f, "wait for line event"),
            Operation::ReadEvent => write!(f, "read line event"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("{resource} is busy or access was denied")]
    PermissionOrBusy {
        resource: Resource,
        #[source]
        source: IOError,
    },
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("failed to {op}")]
    Io {
        op: Operation,
        #[source]
        source: IOError,
    },
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionOrBusy,
    InvalidState,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::PermissionOrBusy { .. } => ErrorKind::PermissionOrBusy,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(op: Operation, source: impl Into<IOError>) -> Self {
        Error::Io {
            op,
            source: source.into(),
        }
    }

    pub(crate) fn busy(resource: Resource, source: impl Into<IOError>) -> Self {
        Error::PermissionOrBusy {
            resource,
            source: source.into(),
        }
    }

    /// Sort a failed kernel call into the error taxonomy.
    ///
    /// A rejected line request is always a refusal of the reservation,
    /// unless the device itself is gone.
    pub(crate) fn from_errno(op: Operation, resource: Resource, errno: Errno) -> Self {
        match errno {
            Errno::ENODEV => Error::io(op, errno),
            _ if op == Operation::RequestLine => Error::busy(resource, errno),
            Errno::EBUSY | Errno::EPERM | Errno::EACCES => Error::busy(resource, errno),
            Errno::ENOENT | Errno::ENXIO | Errno::ENOTTY => Error::NotFound(resource),
            _ => Error::io(op, errno),
        }
    }

    /// Same as [`Error::from_errno`] for errors surfaced through `std::io`.
    pub(crate) fn from_io(op: Operation, resource: Resource, err: IOError) -> Self {
        match err.raw_os_error() {
            Some(raw) => Error::from_errno(op, resource, Errno::from_raw(raw)),
            None => match err.kind() {
                std::io::ErrorKind::NotFound => Error::NotFound(resource),
                std::io::ErrorKind::PermissionDenied => Error::busy(resource, err),
                _ => Error::io(op, err),
            },
        }
    }
}
