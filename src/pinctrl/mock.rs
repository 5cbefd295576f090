/*
 *  pinctrl/mock.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  Recording register bus for testing without hardware
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::display::DisplayPins;
use crate::pinctrl::pins::Pin;
use crate::pinctrl::registers::{Alias, Register, RegisterGroup};
use crate::pinctrl::window::RegisterBus;

/// In-memory stand-in for the PINCTRL window.
///
/// Every write is logged in order and applied to a model of the logical
/// registers honouring SET/CLR/TOG alias semantics, so tests can assert on
/// either the exact transfer sequence or the resulting register contents.
/// Clones share state, letting a test keep a handle after moving the bus
/// into a controller.
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockBusState>>,
}

/// Shared state behind a `MockBus`
#[derive(Debug, Default)]
pub struct MockBusState {
    /// Every write in issue order
    pub writes: Vec<(Register, u32)>,
    /// Number of reads served
    pub reads: usize,
    /// Logical register contents keyed by (group, bank or word index)
    pub values: HashMap<(RegisterGroup, u8), u32>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockBusState> {
        // a poisoned lock only means another test thread panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn writes(&self) -> Vec<(Register, u32)> {
        self.state().writes.clone()
    }

    pub fn clear_log(&self) {
        self.state().writes.clear();
    }

    pub fn value(&self, group: RegisterGroup, index: u8) -> u32 {
        self.state().values.get(&(group, index)).copied().unwrap_or(0)
    }

    /// Set the level the DIN register reports for `pin`.
    pub fn set_input(&self, pin: Pin, level: bool) {
        let mut state = self.state();
        let word = state
            .values
            .entry((RegisterGroup::Din, pin.bank().index()))
            .or_insert(0);
        if level {
            *word |= pin.mask();
        } else {
            *word &= !pin.mask();
        }
    }

    /// Current driven level of an output pin according to the DOUT model
    pub fn output_level(&self, pin: Pin) -> bool {
        self.value(RegisterGroup::Dout, pin.bank().index()) & pin.mask() != 0
    }
}

impl RegisterBus for MockBus {
    fn write(&mut self, reg: Register, value: u32) {
        let mut state = self.state();
        state.writes.push((reg, value));
        let word = state.values.entry((reg.group(), reg.index())).or_insert(0);
        match reg.alias() {
            Alias::Plain => *word = value,
            Alias::Set => *word |= value,
            Alias::Clr => *word &= !value,
            Alias::Tog => *word ^= value,
        }
    }

    fn read(&self, reg: Register) -> u32 {
        let mut state = self.state();
        state.reads += 1;
        state.values.get(&(reg.group(), reg.index())).copied().unwrap_or(0)
    }
}

/// Pin levels recovered from the DOUT write log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Set(Pin),
    Cleared(Pin),
}

/// Expand DOUT SET/CLR writes into per-pin edges, in issue order.
pub fn output_edges(writes: &[(Register, u32)]) -> Vec<Edge> {
    let mut edges = Vec::new();
    for &(reg, value) in writes {
        if reg.group() != RegisterGroup::Dout {
            continue;
        }
        for pin in Pin::ALL {
            if pin.bank().index() != reg.index() || value & pin.mask() == 0 {
                continue;
            }
            match reg.alias() {
                Alias::Set => edges.push(Edge::Set(pin)),
                Alias::Clr => edges.push(Edge::Cleared(pin)),
                _ => {}
            }
        }
    }
    edges
}

/// Lines of a clocked serial bus, as wired to catalog pins
#[derive(Debug, Clone, Copy)]
pub struct SerialLines {
    pub clock: Pin,
    pub data: Pin,
    pub select: Pin,
    pub enable: Pin,
}

impl From<DisplayPins> for SerialLines {
    fn from(pins: DisplayPins) -> Self {
        Self {
            clock: pins.clock,
            data: pins.data,
            select: pins.mode_select,
            enable: pins.enable,
        }
    }
}

/// One enable-low..enable-high transaction seen on the bus
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Level of the select line when the transaction began
    pub select: bool,
    /// Data level sampled at each rising clock edge
    pub bits: Vec<bool>,
    /// Times the data line changed while the clock was high
    pub data_changes_while_clock_high: usize,
}

impl Frame {
    /// Bits packed MSB first
    pub fn byte(&self) -> u8 {
        self.bits.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8)
    }
}

/// Decode transactions from the write log of a bit-banged bus.
///
/// Only writes inside an enable-low window are considered. A rising clock
/// edge is a clock SET following a clock CLR.
pub fn decode_frames(writes: &[(Register, u32)], lines: SerialLines) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut current: Option<Frame> = None;
    let mut clock: Option<bool> = None;
    let mut data = false;
    let mut select = false;

    for edge in output_edges(writes) {
        let (pin, level) = match edge {
            Edge::Set(p) => (p, true),
            Edge::Cleared(p) => (p, false),
        };
        if pin == lines.select {
            select = level;
        }
        if pin == lines.enable {
            if level {
                if let Some(frame) = current.take() {
                    frames.push(frame);
                }
            } else {
                current = Some(Frame { select, ..Frame::default() });
            }
            continue;
        }
        let Some(frame) = current.as_mut() else {
            if pin == lines.clock {
                clock = Some(level);
            }
            if pin == lines.data {
                data = level;
            }
            continue;
        };
        if pin == lines.data {
            if clock == Some(true) && data != level {
                frame.data_changes_while_clock_high += 1;
            }
            data = level;
        }
        if pin == lines.clock {
            if level && clock == Some(false) {
                frame.bits.push(data);
            }
            clock = Some(level);
        }
    }
    frames
}
