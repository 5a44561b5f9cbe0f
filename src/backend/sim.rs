// Copyright (c) 2018 The rust-gpio-cdev Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! In-process GPIO chips.
//!
//! A [`Sim`] behaves like a set of kernel chips: lines can be reserved by one
//! request at a time, outputs keep their level, and edge subscriptions queue
//! events when a test [drives](Sim::drive) an input.  Clones share the same
//! chips, so one clone can inject edges from another thread while a reader
//! blocks in [`Line::read_event`](crate::line::Line::read_event).

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    io,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use heapless::Deque;
use log::{debug, trace, warn};

use super::{Backend, ChipInfo, LineRequest};
use crate::{
    config::Config,
    errors::{Error, Operation, Resource, Result},
    fixed_str::Name,
    line::{EventKind, LineEvent, LineInfo, LineValue},
    uapi::v2::LineFlags,
};

/// Events a subscription holds before the oldest is discarded
pub const SIM_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct Sim {
    shared: Arc<Shared>,
    config: Config,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<SimState>,
    changed: Condvar,
    epoch: Instant,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_timeout<'a>(
        &self,
        guard: MutexGuard<'a, SimState>,
        timeout: Duration,
    ) -> MutexGuard<'a, SimState> {
        self.changed
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner)
            .0
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, SimState>) -> MutexGuard<'a, SimState> {
        self.changed
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default)]
struct SimState {
    chips: BTreeMap<u32, SimChip>,
    /// chip handle id -> chip index
    open: HashMap<u64, u32>,
    requests: HashMap<u64, ReqState>,
    next_id: u64,
    /// Indices of removed chips are not reused
    next_index: u32,
}

#[derive(Debug)]
struct SimChip {
    label: Name,
    lines: Vec<SimLine>,
    denied: bool,
}

#[derive(Debug, Default)]
struct SimLine {
    name: Name,
    /// Physical level
    level: bool,
    /// Direction of the last request, kept after release
    output: bool,
    owner: Option<u64>,
}

#[derive(Debug)]
struct ReqState {
    chip_handle: u64,
    index: u32,
    offset: u32,
    consumer: Name,
    flags: LineFlags,
    events: Deque<LineEvent, SIM_EVENT_CAPACITY>,
    seqno: u32,
}

impl ReqState {
    fn resource(&self) -> Resource {
        Resource::Line {
            chip: self.index,
            offset: self.offset,
        }
    }

    fn is_active_low(&self) -> bool {
        self.flags.contains(LineFlags::ACTIVE_LOW)
    }

    fn push_edge(&mut self, level: bool, timestamp: Duration) {
        // Edges are reported on the logical value, like the kernel does.
        let (kind, wanted) = if level ^ self.is_active_low() {
            (EventKind::RisingEdge, LineFlags::EDGE_RISING)
        } else {
            (EventKind::FallingEdge, LineFlags::EDGE_FALLING)
        };
        if !self.flags.contains(wanted) {
            return;
        }

        self.seqno = self.seqno.wrapping_add(1);
        let event = LineEvent::new(kind, timestamp, self.offset, self.seqno, self.seqno);

        if self.events.is_full() {
            let _ = self.events.pop_front();
            warn!(
                "event queue of line {} of gpiochip{} overflowed",
                self.offset, self.index
            );
        }
        let _ = self.events.push_back(event);
    }
}

impl SimState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn chip(&self, index: u32, op: Operation) -> Result<&SimChip> {
        self.chips.get(&index).ok_or_else(|| removed(op))
    }

    fn request(&self, id: u64) -> Result<&ReqState> {
        self.requests
            .get(&id)
            .ok_or(Error::InvalidState("line request is no longer valid"))
    }

    fn release(&mut self, id: u64) {
        let Some(req) = self.requests.remove(&id) else {
            return;
        };
        let line = self
            .chips
            .get_mut(&req.index)
            .and_then(|chip| chip.lines.get_mut(req.offset as usize));
        if let Some(line) = line {
            if line.owner == Some(id) {
                line.owner = None;
            }
        }
        debug!("released line {} of gpiochip{}", req.offset, req.index);
    }
}

fn removed(op: Operation) -> Error {
    Error::io(op, io::Error::from_raw_os_error(libc::ENODEV))
}

/// An open simulated chip; dropping it closes the chip and every request
/// made through it.
pub struct SimChipHandle {
    shared: Arc<Shared>,
    id: u64,
    index: u32,
}

impl fmt::Debug for SimChipHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimChipHandle")
            .field("id", &self.id)
            .field("index", &self.index)
            .finish()
    }
}

impl Drop for SimChipHandle {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.open.remove(&self.id);

        let orphans: Vec<u64> = state
            .requests
            .iter()
            .filter(|(_, req)| req.chip_handle == self.id)
            .map(|(id, _)| *id)
            .collect();
        for id in orphans {
            state.release(id);
        }
        drop(state);

        debug!("closed gpiochip{}", self.index);
        self.shared.changed.notify_all();
    }
}

/// A reserved simulated line; dropping it releases the line.
pub struct SimRequest {
    shared: Arc<Shared>,
    id: u64,
}

impl fmt::Debug for SimRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimRequest").field("id", &self.id).finish()
    }
}

impl Drop for SimRequest {
    fn drop(&mut self) {
        self.shared.lock().release(self.id);
        self.shared.changed.notify_all();
    }
}

impl Default for Sim {
    fn default() -> Self {
        Self::new()
    }
}

impl Sim {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SimState::default()),
                changed: Condvar::new(),
                epoch: Instant::now(),
            }),
            config,
        }
    }

    /// Add a chip and return its index.  Indices count up from 0.
    pub fn add_chip(&self, label: &str, num_lines: u32) -> u32 {
        let mut state = self.shared.lock();
        let index = state.next_index;
        state.next_index += 1;

        state.chips.insert(
            index,
            SimChip {
                label: Name::truncating(label),
                lines: (0..num_lines).map(|_| SimLine::default()).collect(),
                denied: false,
            },
        );
        index
    }

    pub fn set_line_name(&self, index: u32, offset: u32, name: &str) -> Result<()> {
        let mut state = self.shared.lock();
        let line = line_mut(&mut state.chips, index, offset)?;
        line.name = Name::truncating(name);
        Ok(())
    }

    /// Drive the physical level of an input line from outside, queueing an
    /// edge event for a matching subscription.
    ///
    /// Lines held by an output request are driven by their owner:
    /// [`Error::InvalidState`].
    pub fn drive(&self, index: u32, offset: u32, value: LineValue) -> Result<()> {
        let mut state = self.shared.lock();
        let timestamp = self.shared.epoch.elapsed();
        let SimState {
            chips, requests, ..
        } = &mut *state;

        let line = line_mut(chips, index, offset)?;
        let mut owner = line.owner.and_then(|id| requests.get_mut(&id));
        if owner
            .as_ref()
            .is_some_and(|req| req.flags.contains(LineFlags::OUTPUT))
        {
            return Err(Error::InvalidState("line is driven by an output request"));
        }

        let level = value.is_active();
        if line.level == level {
            return Ok(());
        }
        line.level = level;
        trace!("gpiochip{} line {} driven {}", index, offset, value);

        if let Some(req) = owner.as_mut() {
            req.push_edge(level, timestamp);
        }
        drop(state);

        self.shared.changed.notify_all();
        Ok(())
    }

    /// Physical level of a line
    pub fn level(&self, index: u32, offset: u32) -> Result<LineValue> {
        let mut state = self.shared.lock();
        line_mut(&mut state.chips, index, offset).map(|line| LineValue::new(line.level))
    }

    /// Number of chip handles currently open
    pub fn open_chip_count(&self) -> usize {
        self.shared.lock().open.len()
    }

    /// Make later opens of a chip fail as if permissions were missing.
    pub fn deny_access(&self, index: u32) -> Result<()> {
        let mut state = self.shared.lock();
        let chip = state
            .chips
            .get_mut(&index)
            .ok_or(Error::NotFound(Resource::Chip(index)))?;
        chip.denied = true;
        Ok(())
    }

    /// Unplug a chip.  Handles that are still open fail with `ENODEV`.
    pub fn remove_chip(&self, index: u32) -> Result<()> {
        let removed = self.shared.lock().chips.remove(&index);
        self.shared.changed.notify_all();
        removed
            .map(|_| ())
            .ok_or(Error::NotFound(Resource::Chip(index)))
    }
}

fn line_mut(chips: &mut BTreeMap<u32, SimChip>, index: u32, offset: u32) -> Result<&mut SimLine> {
    chips
        .get_mut(&index)
        .ok_or(Error::NotFound(Resource::Chip(index)))?
        .lines
        .get_mut(offset as usize)
        .ok_or(Error::NotFound(Resource::Line {
            chip: index,
            offset,
        }))
}

impl Backend for Sim {
    type ChipHandle = SimChipHandle;
    type RequestHandle = SimRequest;

    fn config(&self) -> &Config {
        &self.config
    }

    fn chip_indices(&self) -> Result<Vec<u32>> {
        Ok(self.shared.lock().chips.keys().copied().collect())
    }

    fn open_chip(&self, index: u32) -> Result<SimChipHandle> {
        let mut state = self.shared.lock();
        let chip = state
            .chips
            .get(&index)
            .ok_or(Error::NotFound(Resource::Chip(index)))?;
        if chip.denied {
            return Err(Error::busy(
                Resource::Chip(index),
                io::Error::from_raw_os_error(libc::EACCES),
            ));
        }

        let id = state.next_id();
        state.open.insert(id, index);
        debug!("opened simulated gpiochip{}", index);

        Ok(SimChipHandle {
            shared: Arc::clone(&self.shared),
            id,
            index,
        })
    }

    fn chip_info(&self, chip: &SimChipHandle) -> Result<ChipInfo> {
        let state = self.shared.lock();
        let sim_chip = state.chip(chip.index, Operation::ChipInfo)?;
        Ok(ChipInfo::new(
            &format!("gpiochip{}", chip.index),
            sim_chip.label.as_str(),
            sim_chip.lines.len() as u32,
        ))
    }

    fn line_info(&self, chip: &SimChipHandle, offset: u32) -> Result<LineInfo> {
        let state = self.shared.lock();
        let line = state
            .chip(chip.index, Operation::LineInfo)?
            .lines
            .get(offset as usize)
            .ok_or(Error::NotFound(Resource::Line {
                chip: chip.index,
                offset,
            }))?;

        let owner = line.owner.and_then(|id| state.requests.get(&id));
        Ok(match owner {
            Some(req) => LineInfo::new(
                &line.name,
                &req.consumer,
                offset,
                req.flags | LineFlags::USED,
            ),
            None => {
                let direction = if line.output {
                    LineFlags::OUTPUT
                } else {
                    LineFlags::INPUT
                };
                LineInfo::new(&line.name, "", offset, direction)
            }
        })
    }

    fn request_line(
        &self,
        chip: &SimChipHandle,
        offset: u32,
        consumer: &Name,
        request: LineRequest,
    ) -> Result<SimRequest> {
        let mut state = self.shared.lock();
        if !state.open.contains_key(&chip.id) {
            return Err(Error::InvalidState("chip handle is closed"));
        }
        state.chip(chip.index, Operation::RequestLine)?;

        let resource = Resource::Line {
            chip: chip.index,
            offset,
        };
        let id = state.next_id();
        let line = line_mut(&mut state.chips, chip.index, offset)?;
        if line.owner.is_some() {
            return Err(Error::busy(
                resource,
                io::Error::from_raw_os_error(libc::EBUSY),
            ));
        }

        let flags = request.flags();
        line.owner = Some(id);
        line.output = flags.contains(LineFlags::OUTPUT);
        if line.output {
            line.level = request.initial_value().is_active() ^ flags.contains(LineFlags::ACTIVE_LOW);
        }

        state.requests.insert(
            id,
            ReqState {
                chip_handle: chip.id,
                index: chip.index,
                offset,
                consumer: consumer.clone(),
                flags,
                events: Deque::new(),
                seqno: 0,
            },
        );
        debug!("requested {} for {:?} ({:?})", resource, consumer, flags);

        Ok(SimRequest {
            shared: Arc::clone(&self.shared),
            id,
        })
    }

    fn get_value(&self, request: &SimRequest) -> Result<LineValue> {
        let state = self.shared.lock();
        let req = state.request(request.id)?;
        let line = state
            .chip(req.index, Operation::GetValue)?
            .lines
            .get(req.offset as usize)
            .ok_or_else(|| removed(Operation::GetValue))?;

        Ok(LineValue::new(line.level ^ req.is_active_low()))
    }

    fn set_value(&self, request: &SimRequest, value: LineValue) -> Result<()> {
        let mut state = self.shared.lock();
        let req = state.request(request.id)?;
        if !req.flags.contains(LineFlags::OUTPUT) {
            return Err(Error::busy(
                req.resource(),
                io::Error::from_raw_os_error(libc::EPERM),
            ));
        }
        let (index, offset) = (req.index, req.offset);
        let level = value.is_active() ^ req.is_active_low();

        state.chip(index, Operation::SetValue)?;
        let line = line_mut(&mut state.chips, index, offset)?;
        line.level = level;
        Ok(())
    }

    fn wait_event(&self, request: &SimRequest, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.shared.lock();

        loop {
            let req = state.request(request.id)?;
            state.chip(req.index, Operation::WaitEvent)?;
            if !req.events.is_empty() {
                return Ok(true);
            }

            state = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Ok(false);
                    }
                    self.shared.wait_timeout(state, remaining)
                }
                None => self.shared.wait(state),
            };
        }
    }

    fn read_event(&self, request: &SimRequest) -> Result<LineEvent> {
        let mut state = self.shared.lock();

        loop {
            let req = state.request(request.id)?;
            if !req.flags.intersects(LineFlags::EDGES) {
                return Err(Error::InvalidState("line is not monitoring edges"));
            }
            state.chip(req.index, Operation::ReadEvent)?;

            let event = state
                .requests
                .get_mut(&request.id)
                .and_then(|req| req.events.pop_front());
            if let Some(event) = event {
                trace!("read {:?}", event);
                return Ok(event);
            }

            state = self.shared.wait(state);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::line::Direction;

    fn request(sim: &Sim, chip: &SimChipHandle, offset: u32, flags: LineFlags) -> Result<SimRequest> {
        sim.request_line(
            chip,
            offset,
            &Name::truncating("test"),
            LineRequest::new(flags, LineValue::Inactive),
        )
    }

    #[test]
    fn chips_get_consecutive_indices() {
        let sim = Sim::new();
        assert_eq!(sim.add_chip("first", 4), 0);
        assert_eq!(sim.add_chip("second", 8), 1);
        assert_eq!(sim.chip_indices().unwrap(), vec![0, 1]);

        let chip = sim.open_chip(1).unwrap();
        let info = sim.chip_info(&chip).unwrap();
        assert_eq!(info.name(), "gpiochip1");
        assert_eq!(info.label(), "second");
        assert_eq!(info.num_lines(), 8);
    }

    #[test]
    fn handles_track_open_chips() {
        let sim = Sim::new();
        let index = sim.add_chip("sim", 1);

        let a = sim.open_chip(index).unwrap();
        let b = sim.open_chip(index).unwrap();
        assert_eq!(sim.open_chip_count(), 2);

        sim.close_chip(a);
        drop(b);
        assert_eq!(sim.open_chip_count(), 0);
    }

    #[test]
    fn denied_chip() {
        let sim = Sim::new();
        let index = sim.add_chip("sim", 1);
        sim.deny_access(index).unwrap();

        let err = sim.open_chip(index).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionOrBusy);
    }

    #[test]
    fn one_owner_per_line() {
        let sim = Sim::new();
        let index = sim.add_chip("sim", 2);
        let chip = sim.open_chip(index).unwrap();

        let held = request(&sim, &chip, 0, LineFlags::INPUT).unwrap();
        let err = request(&sim, &chip, 0, LineFlags::OUTPUT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionOrBusy);

        let info = sim.line_info(&chip, 0).unwrap();
        assert!(info.is_used());
        assert_eq!(info.consumer(), Some("test"));

        sim.release_line(held);
        assert!(!sim.line_info(&chip, 0).unwrap().is_used());
        request(&sim, &chip, 0, LineFlags::OUTPUT).unwrap();
    }

    #[test]
    fn released_line_keeps_direction() {
        let sim = Sim::new();
        let index = sim.add_chip("sim", 1);
        let chip = sim.open_chip(index).unwrap();
        assert_eq!(sim.line_info(&chip, 0).unwrap().direction(), Direction::Input);

        sim.release_line(request(&sim, &chip, 0, LineFlags::OUTPUT).unwrap());
        let info = sim.line_info(&chip, 0).unwrap();
        assert!(!info.is_used());
        assert_eq!(info.direction(), Direction::Output);

        sim.release_line(request(&sim, &chip, 0, LineFlags::INPUT).unwrap());
        assert_eq!(sim.line_info(&chip, 0).unwrap().direction(), Direction::Input);
    }

    #[test]
    fn active_low_output() {
        let sim = Sim::new();
        let index = sim.add_chip("sim", 1);
        let chip = sim.open_chip(index).unwrap();

        let req = request(&sim, &chip, 0, LineFlags::OUTPUT | LineFlags::ACTIVE_LOW).unwrap();
        assert_eq!(sim.level(index, 0).unwrap(), LineValue::Active);
        assert_eq!(sim.get_value(&req).unwrap(), LineValue::Inactive);

        sim.set_value(&req, LineValue::Active).unwrap();
        assert_eq!(sim.level(index, 0).unwrap(), LineValue::Inactive);
        assert_eq!(
            sim.drive(index, 0, LineValue::Active).unwrap_err().kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn set_on_input_is_refused() {
        let sim = Sim::new();
        let index = sim.add_chip("sim", 1);
        let chip = sim.open_chip(index).unwrap();

        let req = request(&sim, &chip, 0, LineFlags::INPUT).unwrap();
        let err = sim.set_value(&req, LineValue::Active).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionOrBusy);
    }

    #[test]
    fn edge_filtering() {
        let sim = Sim::new();
        let index = sim.add_chip("sim", 1);
        let chip = sim.open_chip(index).unwrap();
        let req = request(&sim, &chip, 0, LineFlags::INPUT | LineFlags::EDGE_FALLING).unwrap();

        sim.drive(index, 0, LineValue::Active).unwrap();
        assert!(!sim.wait_event(&req, Duration::ZERO).unwrap());

        sim.drive(index, 0, LineValue::Inactive).unwrap();
        assert!(sim.wait_event(&req, Duration::ZERO).unwrap());
        let event = sim.read_event(&req).unwrap();
        assert_eq!(event.kind(), EventKind::FallingEdge);
        assert_eq!(event.line_sequence(), 1);
    }

    #[test]
    fn event_queue_overflow_drops_oldest() {
        let sim = Sim::new();
        let index = sim.add_chip("sim", 1);
        let chip = sim.open_chip(index).unwrap();
        let req = request(&sim, &chip, 0, LineFlags::INPUT | LineFlags::EDGES).unwrap();

        let edges = SIM_EVENT_CAPACITY as u32 + 4;
        for i in 0..edges {
            sim.drive(index, 0, LineValue::new(i % 2 == 0)).unwrap();
        }

        let first = sim.read_event(&req).unwrap();
        assert_eq!(first.sequence(), 5);
        for _ in 1..SIM_EVENT_CAPACITY {
            sim.read_event(&req).unwrap();
        }
        assert!(!sim.wait_event(&req, Duration::ZERO).unwrap());
    }

    #[test]
    fn closing_chip_invalidates_requests() {
        let sim = Sim::new();
        let index = sim.add_chip("sim", 1);
        let chip = sim.open_chip(index).unwrap();
        let req = request(&sim, &chip, 0, LineFlags::OUTPUT).unwrap();

        sim.close_chip(chip);
        let err = sim.get_value(&req).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        // The line went back to the pool.
        let chip = sim.open_chip(index).unwrap();
        request(&sim, &chip, 0, LineFlags::INPUT).unwrap();
    }

    #[test]
    fn removed_chip() {
        let sim = Sim::new();
        let index = sim.add_chip("sim", 1);
        let chip = sim.open_chip(index).unwrap();
        let req = request(&sim, &chip, 0, LineFlags::INPUT | LineFlags::EDGES).unwrap();

        sim.remove_chip(index).unwrap();
        assert_eq!(sim.get_value(&req).unwrap_err().kind(), ErrorKind::Io);
        assert_eq!(
            sim.wait_event(&req, Duration::from_millis(1)).unwrap_err().kind(),
            ErrorKind::Io
        );
        assert_eq!(sim.chip_info(&chip).unwrap_err().kind(), ErrorKind::Io);
        assert_eq!(sim.open_chip(index).unwrap_err().kind(), ErrorKind::NotFound);
    }
}
