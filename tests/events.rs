// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::thread;
use std::time::{Duration, Instant};

use gpio_cdev_lines::backend::SIM_EVENT_CAPACITY;
use gpio_cdev_lines::line::{EdgeDetect, EventKind, LineValue, WaitResult};
use gpio_cdev_lines::{Chip, Config, ErrorKind, Sim};

fn sim_chip(lines: u32) -> (Sim, Chip<Sim>) {
    let sim = Sim::new();
    let index = sim.add_chip("sim", lines);
    let chip = Chip::open_with(sim.clone(), index).unwrap();
    (sim, chip)
}

#[test]
fn unreserved_wait_times_out() {
    let (_sim, chip) = sim_chip(4);
    let line = chip.line(0).unwrap();

    let start = Instant::now();
    assert_eq!(line.wait_for_event().unwrap(), WaitResult::TimedOut);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn rising_edge_is_seen_once() {
    let (sim, chip) = sim_chip(4);
    let mut line = chip.line(2).unwrap();
    line.request_both_edge_events("watcher").unwrap();

    assert_eq!(line.wait_for_event().unwrap(), WaitResult::TimedOut);

    sim.drive(chip.index(), 2, LineValue::Active).unwrap();
    assert_eq!(line.wait_for_event().unwrap(), WaitResult::EventReady);

    let event = line.read_event().unwrap();
    assert_eq!(event.kind(), EventKind::RisingEdge);
    assert_eq!(event.offset(), 2);
    assert_eq!(line.wait_for_event().unwrap(), WaitResult::TimedOut);
}

#[test]
fn both_edges_in_order() {
    let (sim, chip) = sim_chip(1);
    let mut line = chip.line(0).unwrap();
    line.request_both_edge_events("watcher").unwrap();

    sim.drive(0, 0, LineValue::Active).unwrap();
    sim.drive(0, 0, LineValue::Inactive).unwrap();
    // No edge without a level change.
    sim.drive(0, 0, LineValue::Inactive).unwrap();

    let rising = line.read_event().unwrap();
    let falling = line.read_event().unwrap();
    assert_eq!(rising.kind(), EventKind::RisingEdge);
    assert_eq!(falling.kind(), EventKind::FallingEdge);
    assert!(rising.timestamp() <= falling.timestamp());
    assert_eq!(falling.line_sequence(), rising.line_sequence() + 1);
    assert_eq!(
        line.wait_for_event_timeout(Duration::ZERO).unwrap(),
        WaitResult::TimedOut
    );
}

#[test]
fn single_edge_subscription() {
    let (sim, chip) = sim_chip(1);
    let mut line = chip.line(0).unwrap();
    line.request_events("watcher", EdgeDetect::Falling).unwrap();

    sim.drive(0, 0, LineValue::Active).unwrap();
    assert_eq!(
        line.wait_for_event_timeout(Duration::from_millis(2)).unwrap(),
        WaitResult::TimedOut
    );

    sim.drive(0, 0, LineValue::Inactive).unwrap();
    assert_eq!(line.read_event().unwrap().kind(), EventKind::FallingEdge);
}

#[test]
fn read_blocks_until_an_edge_arrives() {
    let (sim, chip) = sim_chip(1);
    let mut line = chip.line(0).unwrap();
    line.request_both_edge_events("watcher").unwrap();

    let driver = {
        let sim = sim.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            sim.drive(0, 0, LineValue::Active).unwrap();
        })
    };

    let event = line.read_event().unwrap();
    assert_eq!(event.kind(), EventKind::RisingEdge);
    driver.join().unwrap();
}

#[test]
fn wait_wakes_up_for_an_edge() {
    let (sim, chip) = sim_chip(1);
    let mut line = chip.line(0).unwrap();
    line.request_both_edge_events("watcher").unwrap();

    let driver = {
        let sim = sim.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            sim.drive(0, 0, LineValue::Active).unwrap();
        })
    };

    let res = line.wait_for_event_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(res, WaitResult::EventReady);
    driver.join().unwrap();
}

#[test]
fn configured_poll_timeout() {
    let sim = Sim::with_config(Config::new().with_poll_timeout(Duration::from_millis(15)));
    let index = sim.add_chip("sim", 1);
    let chip = Chip::open_with(sim, index).unwrap();
    let mut line = chip.line(0).unwrap();
    line.request_both_edge_events("watcher").unwrap();

    let start = Instant::now();
    assert_eq!(line.wait_for_event().unwrap(), WaitResult::TimedOut);
    assert!(start.elapsed() >= Duration::from_millis(15));
}

#[test]
fn overflow_keeps_newest_events() {
    let (sim, chip) = sim_chip(1);
    let mut line = chip.line(0).unwrap();
    line.request_both_edge_events("watcher").unwrap();

    let edges = SIM_EVENT_CAPACITY + 2;
    for n in 0..edges {
        sim.drive(0, 0, LineValue::new(n % 2 == 0)).unwrap();
    }

    let mut sequences = vec![];
    while line.wait_for_event_timeout(Duration::ZERO).unwrap().is_ready() {
        sequences.push(line.read_event().unwrap().line_sequence());
    }
    assert_eq!(sequences.len(), SIM_EVENT_CAPACITY);
    assert_eq!(sequences.first(), Some(&3));
    assert_eq!(sequences.last(), Some(&(edges as u32)));
}

#[test]
fn release_ends_the_subscription() {
    let (sim, chip) = sim_chip(1);
    let mut line = chip.line(0).unwrap();
    line.request_both_edge_events("watcher").unwrap();
    sim.drive(0, 0, LineValue::Active).unwrap();

    line.release().unwrap();
    assert_eq!(line.read_event().unwrap_err().kind(), ErrorKind::InvalidState);
    assert_eq!(
        line.wait_for_event_timeout(Duration::ZERO).unwrap(),
        WaitResult::TimedOut
    );
}

#[test]
fn output_lines_cannot_be_driven_externally() {
    let (sim, chip) = sim_chip(1);
    let mut line = chip.line(0).unwrap();
    line.request_output("led").unwrap();

    let err = sim.drive(0, 0, LineValue::Active).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn removed_chip_fails_waits() {
    let (sim, chip) = sim_chip(1);
    let mut line = chip.line(0).unwrap();
    line.request_both_edge_events("watcher").unwrap();

    sim.remove_chip(0).unwrap();
    assert_eq!(line.wait_for_event().unwrap_err().kind(), ErrorKind::Io);
    assert_eq!(line.read_event().unwrap_err().kind(), ErrorKind::Io);
}
