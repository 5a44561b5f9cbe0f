// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Clone of functionality of linux/tools/gpio/lsgpio.c

use gpio_cdev_lines::line::{Direction, EdgeDetect, LineInfo};
use gpio_cdev_lines::line::options::Bias;
use gpio_cdev_lines::{chips, Chip};

fn line_flags(info: &LineInfo) -> Vec<&'static str> {
    let mut flags = vec![];

    if info.is_used() {
        flags.push("used");
    }
    if info.direction() == Direction::Output {
        flags.push("output");
    }
    if info.is_active_low() {
        flags.push("active-low");
    }
    if info.is_open_drain() {
        flags.push("open-drain");
    }
    if info.is_open_source() {
        flags.push("open-source");
    }
    match info.bias() {
        Some(Bias::PullUp) => flags.push("pull-up"),
        Some(Bias::PullDown) => flags.push("pull-down"),
        Some(Bias::Disabled) => flags.push("bias-disabled"),
        None => (),
    }
    match info.edge_detect() {
        Some(EdgeDetect::Rising) => flags.push("rising-edge"),
        Some(EdgeDetect::Falling) => flags.push("falling-edge"),
        Some(EdgeDetect::Both) => flags.push("both-edges"),
        None => (),
    }

    flags
}

fn print_chip(chip: &Chip) {
    println!(
        "GPIO chip: \"{}\", \"{}\", {} GPIO Lines",
        chip.name(),
        chip.label(),
        chip.num_lines()
    );

    for (offset, info) in chip.line_infos().enumerate() {
        let info = match info {
            Ok(info) => info,
            Err(e) => {
                eprintln!("\tline {offset:>3}: error {e}");
                continue;
            }
        };

        let flags = line_flags(&info);
        let usage = if !flags.is_empty() {
            format!("[{}]", flags.join(" "))
        } else {
            "".to_owned()
        };

        println!(
            "\tline {lineno:>3}: {name} {consumer} {usage}",
            lineno = info.offset(),
            name = info.name().unwrap_or("unnamed"),
            consumer = info.consumer().unwrap_or("unused"),
            usage = usage,
        );
    }
    println!();
}

fn main() {
    env_logger::init();

    let mut chip_iterator = match chips() {
        Ok(chips) => chips,
        Err(e) => {
            println!("Failed to get chip iterator: {:?}", e);
            return;
        }
    };

    while let Some(chip) = chip_iterator.next() {
        match chip {
            Ok(chip) => print_chip(chip),
            Err(e) => eprintln!("Failed to open chip: {e}"),
        }
    }
}
