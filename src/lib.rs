// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `gpio-cdev-lines` crate provides single-line access to the [GPIO
//! character device ABI](https://www.kernel.org/doc/Documentation/ABI/testing/gpio-cdev):
//! open a chip, reserve one of its lines for input or output, read and write
//! its value, and wait for rising or falling edges.
//!
//! Lines borrow the [`Chip`] they come from, so a line can neither outlive
//! its chip nor be used once the chip is closed.  Reservations are released
//! when a [`Line`](line::Line) is released or dropped.
//!
//! Everything kernel-facing goes through the [`Backend`] trait.  [`Cdev`]
//! talks to `/dev/gpiochipN`; [`Sim`] simulates chips in-process, which is
//! what the tests and doc examples run against.
//!
//! # Examples
//!
//! The following example mirrors the state of one GPIO line/pin onto
//! another one.
//!
//! ```no_run
//! use gpio_cdev_lines::line::{EventKind, LineValue};
//! use gpio_cdev_lines::Chip;
//!
//! // Lines are offset within gpiochip0; see docs for more info on chips/lines
//! fn mirror_gpio(inputline: u32, outputline: u32) -> Result<(), gpio_cdev_lines::Error> {
//!     let chip = Chip::open(0)?;
//!     let mut input = chip.line(inputline)?;
//!     let mut output = chip.line(outputline)?;
//!     input.request_both_edge_events("mirror-gpio")?;
//!     output.request_output("mirror-gpio")?;
//!
//!     loop {
//!         let event = input.read_event()?;
//!         println!("{:?}", event);
//!         match event.kind() {
//!             EventKind::RisingEdge => output.set_value(LineValue::Active)?,
//!             EventKind::FallingEdge => output.set_value(LineValue::Inactive)?,
//!         }
//!     }
//! }
//!
//! # fn main() -> Result<(), gpio_cdev_lines::Error> {
//! #     mirror_gpio(0, 1)
//! # }
//! ```
//!
//! To get the state of a GPIO Line on a given chip:
//!
//! ```no_run
//! use gpio_cdev_lines::Chip;
//!
//! # fn main() -> Result<(), gpio_cdev_lines::Error> {
//! // Read the state of GPIO4 on a raspberry pi.  /dev/gpiochip0
//! // maps to the driver for the SoC (builtin) GPIO controller.
//! let chip = Chip::open(0)?;
//! let mut line = chip.line(4)?;
//! line.request_input("read-input")?;
//! for _ in 1..4 {
//!     println!("Value: {:?}", line.get_value()?);
//! }
//! # Ok(()) }
//! ```
//!
//! The same code runs against simulated chips:
//!
//! ```
//! use std::time::Duration;
//! use gpio_cdev_lines::line::{EventKind, LineValue, WaitResult};
//! use gpio_cdev_lines::{Chip, Sim};
//!
//! # fn main() -> Result<(), gpio_cdev_lines::Error> {
//! let sim = Sim::new();
//! let index = sim.add_chip("sim", 8);
//! let chip = Chip::open_with(sim.clone(), index)?;
//!
//! let mut button = chip.line(2)?;
//! button.request_both_edge_events("button")?;
//! sim.drive(index, 2, LineValue::Active)?;
//!
//! assert_eq!(button.wait_for_event()?, WaitResult::EventReady);
//! assert_eq!(button.read_event()?.kind(), EventKind::RisingEdge);
//! assert_eq!(
//!     button.wait_for_event_timeout(Duration::from_millis(1))?,
//!     WaitResult::TimedOut
//! );
//! # Ok(()) }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod errors;

pub mod fixed_str;

#[allow(non_camel_case_types)]
pub mod uapi;

pub mod backend;

pub mod chip;

pub mod config;

pub mod line;

pub use backend::{Backend, Cdev, Sim};
pub use chip::{chips, chips_no_close, AutoClose, Chip, ChipIter, KeepOpen};
pub use config::Config;
pub use errors::{Error, ErrorKind, Operation, Resource};
