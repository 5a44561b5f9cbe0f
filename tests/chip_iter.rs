// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use gpio_cdev_lines::{ChipIter, ErrorKind, Sim};

fn sim_with(n: u32) -> Sim {
    let sim = Sim::new();
    for i in 0..n {
        sim.add_chip(&format!("chip-{i}"), 4 + i);
    }
    sim
}

#[test]
fn yields_every_chip_then_ends() {
    let sim = sim_with(3);
    let mut chips = ChipIter::new(sim.clone()).unwrap();

    let mut labels = vec![];
    while let Some(chip) = chips.next() {
        let chip = chip.unwrap();
        labels.push(chip.label().to_owned());
        assert_eq!(sim.open_chip_count(), 1);
    }

    assert_eq!(labels, ["chip-0", "chip-1", "chip-2"]);
    assert_eq!(sim.open_chip_count(), 0);
    assert!(chips.next().is_none());
}

#[test]
fn no_chips() {
    let sim = Sim::new();
    let mut chips = ChipIter::new(sim.clone()).unwrap();
    assert!(chips.next().is_none());

    let mut chips = ChipIter::new_no_close(sim).unwrap();
    assert!(chips.next().is_none());
}

#[test]
fn free_closes_current_chip() {
    let sim = sim_with(2);
    let mut chips = ChipIter::new(sim.clone()).unwrap();
    chips.next().unwrap().unwrap();
    assert_eq!(sim.open_chip_count(), 1);

    chips.free();
    assert_eq!(sim.open_chip_count(), 0);
}

#[test]
fn dropping_the_iterator_closes_current_chip() {
    let sim = sim_with(2);
    {
        let mut chips = ChipIter::new(sim.clone()).unwrap();
        chips.next().unwrap().unwrap();
    }
    assert_eq!(sim.open_chip_count(), 0);
}

#[test]
fn free_no_close_hands_over_the_chip() {
    let sim = sim_with(3);
    let mut chips = ChipIter::new(sim.clone()).unwrap();
    chips.next().unwrap().unwrap();
    chips.next().unwrap().unwrap();

    let chip = chips.free_no_close().unwrap();
    assert_eq!(chip.label(), "chip-1");
    assert_eq!(sim.open_chip_count(), 1);

    let mut line = chip.line(4).unwrap();
    line.request_input("kept").unwrap();
    drop(line);

    chip.close();
    assert_eq!(sim.open_chip_count(), 0);
}

#[test]
fn free_no_close_after_the_end() {
    let sim = sim_with(1);
    let mut chips = ChipIter::new(sim.clone()).unwrap();
    while chips.next().is_some() {}

    assert!(chips.free_no_close().is_none());
    assert_eq!(sim.open_chip_count(), 0);
}

#[test]
fn keep_open_hands_out_every_chip() {
    let sim = sim_with(3);

    let chips: Vec<_> = ChipIter::new_no_close(sim.clone())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(chips.len(), 3);
    assert_eq!(sim.open_chip_count(), 3);

    let lines: Vec<u32> = chips.iter().map(|chip| chip.num_lines()).collect();
    assert_eq!(lines, [4, 5, 6]);

    drop(chips);
    assert_eq!(sim.open_chip_count(), 0);
}

#[test]
fn snapshot_is_taken_at_construction() {
    let sim = sim_with(1);
    let mut chips = ChipIter::new(sim.clone()).unwrap();
    sim.add_chip("late", 1);

    assert_eq!(chips.next().unwrap().unwrap().label(), "chip-0");
    assert!(chips.next().is_none());
}

#[test]
fn open_errors_are_reported_and_iteration_continues() {
    let sim = sim_with(3);
    sim.deny_access(1).unwrap();

    let results: Vec<_> = ChipIter::new_no_close(sim).unwrap().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert_eq!(
        results[1].as_ref().unwrap_err().kind(),
        ErrorKind::PermissionOrBusy
    );
    assert!(results[2].is_ok());
}
