// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use gpio_cdev_lines::line::LineValue;
use gpio_cdev_lines::Chip;
use quicli::prelude::*;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::{Duration, Instant};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct Cli {
    /// The gpiochip device (e.g. /dev/gpiochip0)
    chip: PathBuf,
    /// The offset of the GPIO line for the provided chip
    line: u32,
    /// Period in milliseconds
    period_ms: u64,
    /// Duration over which to blink in milliseconds
    duration_ms: u64,
}

fn do_main(args: Cli) -> anyhow::Result<()> {
    let chip = Chip::open_path(&args.chip)?;
    let mut led = chip.line(args.line)?;

    // NOTE: the line starts out lit, so the first half period is "on"
    led.request_output_value("blinky", LineValue::Active)?;

    let period = Duration::from_millis(args.period_ms);
    let duration = Duration::from_millis(args.duration_ms);
    let start_time = Instant::now();
    let mut value = LineValue::Active;
    while start_time.elapsed() < duration {
        sleep(period);
        value = value.toggled();
        led.set_value(value)?;
    }

    led.release()?;
    Ok(())
}

fn main() -> CliResult {
    env_logger::init();

    let args = Cli::from_args();
    do_main(args).or_else(|e| {
        error!("{:?}", e);
        Ok(())
    })
}
