/*
 *  pinctrl/controller.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  Pin controller: role ownership, peripheral claims and role-checked I/O
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

use std::fmt;

use log::{debug, warn};

use crate::error::{HalError, Result};
use crate::pinctrl::pins::Pin;
use crate::pinctrl::registers::Register;
use crate::pinctrl::window::RegisterBus;

/// Identity of a peripheral driver holding pin reservations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClaimantId(u32);

impl fmt::Display for ClaimantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "claimant #{}", self.0)
    }
}

/// Whether a reserved pin may be taken back by `configure_output`/`configure_input`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reclaim {
    Allow,
    Deny,
}

/// The single role a pin holds at any instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    Unassigned,
    Input,
    Output,
    ReservedForPeripheral { claimant: ClaimantId, reclaim: Reclaim },
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinRole::Unassigned => f.write_str("unassigned"),
            PinRole::Input => f.write_str("input"),
            PinRole::Output => f.write_str("output"),
            PinRole::ReservedForPeripheral { claimant, .. } => write!(f, "reserved by {claimant}"),
        }
    }
}

/// Diagnostic snapshot of role assignments, never for control decisions
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PinStatus {
    pub inputs: Vec<Pin>,
    pub outputs: Vec<Pin>,
    pub reserved: Vec<Pin>,
}

impl fmt::Display for PinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(pins: &[Pin]) -> String {
            let names: Vec<&str> = pins.iter().map(|p| p.name()).collect();
            format!("[{}]", names.join(", "))
        }
        write!(f, "  inputs: {}\n outputs: {}", list(&self.inputs), list(&self.outputs))?;
        if !self.reserved.is_empty() {
            write!(f, "\n     lcd: {}", list(&self.reserved))?;
        }
        Ok(())
    }
}

/// Owns the role of every catalog pin and the register bus behind them.
///
/// The role table is a software convention only; the hardware does not
/// enforce it, so a controller must be the sole driver of its bus.
#[derive(Debug)]
pub struct PinController<B: RegisterBus> {
    bus: B,
    roles: [PinRole; Pin::COUNT],
    next_claimant: u32,
}

impl<B: RegisterBus> PinController<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            roles: [PinRole::Unassigned; Pin::COUNT],
            next_claimant: 1,
        }
    }

    pub fn role(&self, pin: Pin) -> PinRole {
        self.roles[pin.index()]
    }

    /// Switch `pin` to a GPIO output, taking it from whatever role it held.
    ///
    /// Fails with `PinBusy` if a peripheral reserved the pin with `Reclaim::Deny`.
    pub fn configure_output(&mut self, pin: Pin, pull: bool) -> Result<()> {
        self.check_reclaimable(pin)?;
        self.setup_output(pin, pull)?;
        self.transition(pin, PinRole::Output);
        Ok(())
    }

    /// Switch `pin` to a GPIO input, taking it from whatever role it held.
    pub fn configure_input(&mut self, pin: Pin, pull: bool) -> Result<()> {
        self.check_reclaimable(pin)?;
        let desc = pin.descriptor();
        self.select_gpio(pin)?;
        self.bus.write(Register::doe_clr(desc.bank), desc.mask);
        self.bus.write(Register::din_set(desc.bank), desc.mask);
        self.set_pull(pin, pull);
        self.transition(pin, PinRole::Input);
        Ok(())
    }

    /// Drive an `Output` pin high or low through the DOUT SET/CLR aliases.
    pub fn write(&mut self, pin: Pin, state: bool) -> Result<()> {
        self.require(pin, PinRole::Output, "write")?;
        self.drive_line(pin, state);
        Ok(())
    }

    /// Flip an `Output` pin through the DOUT TOG alias.
    pub fn toggle(&mut self, pin: Pin) -> Result<()> {
        self.require(pin, PinRole::Output, "toggle")?;
        self.bus.write(Register::dout_tog(pin.bank()), pin.mask());
        Ok(())
    }

    /// Sample an `Input` pin.
    pub fn read(&self, pin: Pin) -> Result<bool> {
        self.require(pin, PinRole::Input, "read")?;
        let levels = self.bus.read(Register::din_state(pin.bank()));
        Ok(levels & pin.mask() != 0)
    }

    /// Allocate an identity for a new peripheral driver.
    pub fn new_claimant(&mut self) -> ClaimantId {
        let id = ClaimantId(self.next_claimant);
        self.next_claimant += 1;
        id
    }

    /// Reserve `pin` for `claimant`. Re-reserving by the same claimant is a no-op.
    pub fn reserve(&mut self, pin: Pin, claimant: ClaimantId, reclaim: Reclaim) -> Result<()> {
        match self.role(pin) {
            PinRole::ReservedForPeripheral { claimant: holder, .. } if holder != claimant => {
                Err(HalError::PinBusy { pin, holder })
            }
            _ => {
                self.transition(pin, PinRole::ReservedForPeripheral { claimant, reclaim });
                Ok(())
            }
        }
    }

    /// Reserve every pin in `pins` or none of them.
    ///
    /// On failure the roles held before the call are restored.
    pub fn reserve_all(&mut self, pins: &[Pin], claimant: ClaimantId, reclaim: Reclaim) -> Result<()> {
        let before = self.roles;
        for &pin in pins {
            if let Err(e) = self.reserve(pin, claimant, reclaim) {
                self.roles = before;
                debug!("reservation for {} rolled back: {}", claimant, e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Return one reserved pin to `Unassigned`.
    pub fn release(&mut self, pin: Pin, claimant: ClaimantId) -> Result<()> {
        match self.role(pin) {
            PinRole::ReservedForPeripheral { claimant: holder, .. } if holder == claimant => {
                self.transition(pin, PinRole::Unassigned);
                Ok(())
            }
            PinRole::ReservedForPeripheral { claimant: holder, .. } => {
                Err(HalError::PinBusy { pin, holder })
            }
            role => Err(HalError::RoleViolation { pin, role, operation: "release" }),
        }
    }

    /// Return every pin still held by `claimant` to `Unassigned`.
    pub fn release_claim(&mut self, claimant: ClaimantId) -> Vec<Pin> {
        let held: Vec<Pin> = Pin::ALL
            .into_iter()
            .filter(|&p| self.held_by(p, claimant))
            .collect();
        for &pin in &held {
            self.transition(pin, PinRole::Unassigned);
        }
        held
    }

    /// Configure a reserved pin's hardware as an output without touching its role.
    pub fn setup_claimed_output(&mut self, claimant: ClaimantId, pin: Pin) -> Result<()> {
        self.require_claim(pin, claimant, "configure")?;
        self.setup_output(pin, false)
    }

    /// Drive a pin reserved by `claimant`.
    pub fn drive(&mut self, claimant: ClaimantId, pin: Pin, state: bool) -> Result<()> {
        self.require_claim(pin, claimant, "drive")?;
        self.drive_line(pin, state);
        Ok(())
    }

    pub fn status(&self) -> PinStatus {
        let mut status = PinStatus::default();
        for pin in Pin::ALL {
            match self.role(pin) {
                PinRole::Unassigned => {}
                PinRole::Input => status.inputs.push(pin),
                PinRole::Output => status.outputs.push(pin),
                PinRole::ReservedForPeripheral { .. } => status.reserved.push(pin),
            }
        }
        status
    }

    /// Raw register read, bypassing the role table
    pub fn read_register(&self, reg: Register) -> u32 {
        self.bus.read(reg)
    }

    /// Raw register write, bypassing the role table
    pub fn write_register(&mut self, reg: Register, value: u32) {
        warn!("raw write {} <- {:#010x}", reg, value);
        self.bus.write(reg, value);
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    fn held_by(&self, pin: Pin, claimant: ClaimantId) -> bool {
        matches!(self.role(pin), PinRole::ReservedForPeripheral { claimant: c, .. } if c == claimant)
    }

    fn check_reclaimable(&self, pin: Pin) -> Result<()> {
        match self.role(pin) {
            PinRole::ReservedForPeripheral { claimant, reclaim: Reclaim::Deny } => {
                Err(HalError::PinBusy { pin, holder: claimant })
            }
            _ => Ok(()),
        }
    }

    fn require(&self, pin: Pin, required: PinRole, operation: &'static str) -> Result<()> {
        let role = self.role(pin);
        if role == required {
            Ok(())
        } else {
            Err(HalError::RoleViolation { pin, role, operation })
        }
    }

    fn require_claim(&self, pin: Pin, claimant: ClaimantId, operation: &'static str) -> Result<()> {
        if self.held_by(pin, claimant) {
            Ok(())
        } else {
            Err(HalError::RoleViolation { pin, role: self.role(pin), operation })
        }
    }

    fn select_gpio(&mut self, pin: Pin) -> Result<()> {
        let desc = pin.descriptor();
        let muxsel = Register::muxsel_set(desc.mux_index)?;
        self.bus.write(muxsel, desc.mux_mask);
        Ok(())
    }

    fn setup_output(&mut self, pin: Pin, pull: bool) -> Result<()> {
        self.select_gpio(pin)?;
        self.bus.write(Register::doe_set(pin.bank()), pin.mask());
        self.set_pull(pin, pull);
        Ok(())
    }

    fn set_pull(&mut self, pin: Pin, pull: bool) {
        let reg = if pull {
            Register::pull_set(pin.bank())
        } else {
            Register::pull_clr(pin.bank())
        };
        self.bus.write(reg, pin.mask());
    }

    #[inline]
    fn drive_line(&mut self, pin: Pin, state: bool) {
        let reg = if state {
            Register::dout_set(pin.bank())
        } else {
            Register::dout_clr(pin.bank())
        };
        self.bus.write(reg, pin.mask());
    }

    fn transition(&mut self, pin: Pin, role: PinRole) {
        let slot = &mut self.roles[pin.index()];
        if *slot != role {
            debug!("{}: {} -> {}", pin, slot, role);
            *slot = role;
        }
    }
}
