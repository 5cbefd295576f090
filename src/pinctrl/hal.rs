/*
 *  pinctrl/hal.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  embedded-hal digital pin adapters over the pin controller
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

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::error::{HalError, Result};
use crate::pinctrl::controller::{PinController, PinRole};
use crate::pinctrl::pins::Pin;
use crate::pinctrl::window::RegisterBus;

/// Borrowed output pin usable with `embedded-hal` drivers
pub struct OutputHandle<'a, B: RegisterBus> {
    ctl: &'a mut PinController<B>,
    pin: Pin,
}

/// Borrowed input pin usable with `embedded-hal` drivers
pub struct InputHandle<'a, B: RegisterBus> {
    ctl: &'a PinController<B>,
    pin: Pin,
}

impl<B: RegisterBus> PinController<B> {
    /// Borrow an already configured output pin.
    pub fn output(&mut self, pin: Pin) -> Result<OutputHandle<'_, B>> {
        match self.role(pin) {
            PinRole::Output => Ok(OutputHandle { ctl: self, pin }),
            role => Err(HalError::RoleViolation { pin, role, operation: "borrow as output" }),
        }
    }

    /// Borrow an already configured input pin.
    pub fn input(&self, pin: Pin) -> Result<InputHandle<'_, B>> {
        match self.role(pin) {
            PinRole::Input => Ok(InputHandle { ctl: self, pin }),
            role => Err(HalError::RoleViolation { pin, role, operation: "borrow as input" }),
        }
    }
}

impl<B: RegisterBus> OutputHandle<'_, B> {
    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn toggle(&mut self) -> Result<()> {
        self.ctl.toggle(self.pin)
    }
}

impl<B: RegisterBus> InputHandle<'_, B> {
    pub fn pin(&self) -> Pin {
        self.pin
    }
}

impl<B: RegisterBus> ErrorType for OutputHandle<'_, B> {
    type Error = HalError;
}

impl<B: RegisterBus> OutputPin for OutputHandle<'_, B> {
    fn set_low(&mut self) -> Result<()> {
        self.ctl.write(self.pin, false)
    }

    fn set_high(&mut self) -> Result<()> {
        self.ctl.write(self.pin, true)
    }
}

impl<B: RegisterBus> ErrorType for InputHandle<'_, B> {
    type Error = HalError;
}

impl<B: RegisterBus> InputPin for InputHandle<'_, B> {
    fn is_high(&mut self) -> Result<bool> {
        self.ctl.read(self.pin)
    }

    fn is_low(&mut self) -> Result<bool> {
        self.ctl.read(self.pin).map(|level| !level)
    }
}
