// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bounded strings for the fixed-size name fields of the kernel ABI.

use std::ops::Deref;

use bstr::ByteSlice;

use crate::uapi::v2::GPIO_MAX_NAME_SIZE;

/// A string of at most `N` bytes, stored inline.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FixedStr<const N: usize>(heapless::String<N>);

/// Kernel name fields are `GPIO_MAX_NAME_SIZE` bytes including the NUL.
pub type Name = FixedStr<{ GPIO_MAX_NAME_SIZE - 1 }>;

impl<const N: usize> FixedStr<N> {
    #[inline]
    pub const fn empty() -> Self {
        Self(heapless::String::new())
    }

    /// Copy as much of `s` as fits, never splitting a character.
    pub fn truncating(s: &str) -> Self {
        let mut out = heapless::String::new();
        for c in s.chars() {
            if out.push(c).is_err() {
                break;
            }
        }
        Self(out)
    }

    /// Read a NUL-terminated kernel field; invalid UTF-8 is replaced.
    pub fn from_kernel<const M: usize>(bytes: &[u8; M]) -> Self {
        let len = bytes.find_byte(0).unwrap_or(M);
        Self::truncating(&bytes[..len].to_str_lossy())
    }

    /// NUL-padded copy suitable for a kernel field of `M` bytes.
    pub fn to_kernel<const M: usize>(&self) -> [u8; M] {
        let mut out = [0; M];
        let src = self.0.as_bytes();
        // Keep the final byte for the terminator.
        let len = src.len().min(M.saturating_sub(1));
        out[..len].copy_from_slice(&src[..len]);
        out
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<const N: usize> Deref for FixedStr<N> {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl<const N: usize> std::fmt::Debug for FixedStr<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> std::fmt::Display for FixedStr<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
