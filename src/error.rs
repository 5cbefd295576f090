/*
 *  error.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error type for pin control and the display driver
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

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::pinctrl::controller::{ClaimantId, PinRole};
use crate::pinctrl::pins::Pin;

/// Errors raised by register access, the pin controller and the display driver.
#[derive(Debug, Error)]
pub enum HalError {
    /// Name not present in the pin catalog
    #[error("unknown pin: {0}")]
    UnknownPin(String),

    /// Name or index not present in the register map
    #[error("unknown register: {0}")]
    UnknownRegister(String),

    /// Operation attempted against a pin in the wrong role
    #[error("cannot {operation} pin {pin}: pin is {role}")]
    RoleViolation {
        pin: Pin,
        role: PinRole,
        operation: &'static str,
    },

    /// Pin is reserved by a peripheral claimant
    #[error("pin {pin} is reserved by {holder}")]
    PinBusy { pin: Pin, holder: ClaimantId },

    /// The register window could not be opened or mapped
    #[error("register window {} unavailable: {source}", .path.display())]
    DeviceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The same pin was wired to more than one display line
    #[error("pin {0} assigned to more than one display line")]
    DuplicatePin(Pin),

    /// Display driver was never started or has been stopped
    #[error("display not initialized")]
    NotInitialized,
}

pub type Result<T> = std::result::Result<T, HalError>;

impl embedded_hal::digital::Error for HalError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}
