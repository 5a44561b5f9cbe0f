// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Print edge events seen on one line, in the manner of
//! linux/tools/gpio/gpio-event-mon.c

use gpio_cdev_lines::line::{EdgeDetect, WaitResult};
use gpio_cdev_lines::Chip;
use quicli::prelude::*;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct Cli {
    /// The gpiochip device (e.g. /dev/gpiochip0)
    chip: PathBuf,
    /// The offset of the GPIO line for the provided chip
    line: u32,
    /// Stop after this many events
    #[structopt(short = "c", long = "count")]
    count: Option<usize>,
    /// Only report rising edges
    #[structopt(short = "r", long = "rising", conflicts_with = "falling")]
    rising: bool,
    /// Only report falling edges
    #[structopt(short = "f", long = "falling")]
    falling: bool,
    /// Give up after this many milliseconds without an event
    #[structopt(short = "t", long = "idle-timeout-ms")]
    idle_timeout_ms: Option<u64>,
}

fn do_main(args: Cli) -> anyhow::Result<()> {
    let chip = Chip::open_path(&args.chip)?;
    let mut line = chip.line(args.line)?;

    let edge = match (args.rising, args.falling) {
        (true, _) => EdgeDetect::Rising,
        (_, true) => EdgeDetect::Falling,
        _ => EdgeDetect::Both,
    };
    line.request_events("gpioevents", edge)?;

    println!(
        "Monitoring line {} on {} [{}]",
        line.offset(),
        chip.name(),
        chip.label()
    );

    let idle_timeout = args.idle_timeout_ms.map(Duration::from_millis);
    let mut last_event = Instant::now();
    let mut seen = 0;

    while args.count.map_or(true, |count| seen < count) {
        match line.wait_for_event_timeout(Duration::from_millis(100))? {
            WaitResult::EventReady => {
                let event = line.read_event()?;
                println!(
                    "{:>12}.{:09} {:?} (seq {})",
                    event.timestamp().as_secs(),
                    event.timestamp().subsec_nanos(),
                    event.kind(),
                    event.line_sequence()
                );
                seen += 1;
                last_event = Instant::now();
            }
            WaitResult::TimedOut => {
                if idle_timeout.is_some_and(|idle| last_event.elapsed() >= idle) {
                    info!("no events for {:?}, stopping", last_event.elapsed());
                    break;
                }
            }
        }
    }

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
