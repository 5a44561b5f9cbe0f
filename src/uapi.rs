// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bindings for the GPIO character device ABI in
//! [`linux/gpio.h`](https://github.com/torvalds/linux/blob/v6.1/include/uapi/linux/gpio.h).

mod common;

pub use common::*;

pub mod v2;
