// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

/// Logical level of a line.
///
/// "Active" is the logical 1; on an active-low line it corresponds to a
/// physical low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LineValue {
    #[default]
    Inactive,
    Active,
}

impl LineValue {
    pub const fn new(is_active: bool) -> Self {
        if is_active {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    pub const fn is_active(&self) -> bool {
        matches!(self, LineValue::Active)
    }

    /// The other level
    pub const fn toggled(self) -> Self {
        Self::new(!self.is_active())
    }

    pub(crate) const fn from_bit(bits: u64) -> Self {
        Self::new(bits & 1 != 0)
    }

    pub(crate) const fn as_bit(self) -> u64 {
        self.is_active() as u64
    }
}

impl From<bool> for LineValue {
    fn from(is_active: bool) -> Self {
        Self::new(is_active)
    }
}

impl From<LineValue> for bool {
    fn from(value: LineValue) -> Self {
        value.is_active()
    }
}

impl From<LineValue> for u8 {
    fn from(value: LineValue) -> Self {
        value.is_active() as u8
    }
}

/// Only 0 and 1 are levels.
impl TryFrom<u8> for LineValue {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0 => Ok(Self::Inactive),
            1 => Ok(Self::Active),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for LineValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}
