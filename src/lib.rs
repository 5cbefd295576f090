/*
 *  lib.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  GPIO pin control and a bit-banged Nokia 5110 driver for the Chumby Hacker Board
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

//! Pins on the board's 2x13 header are claimed by name, given a role
//! (input, output, or reserved for a peripheral) and driven through the
//! PINCTRL SET/CLR/TOG register aliases mapped from `/dev/mem`.
//!
//! ```ignore
//! let mut session = Session::open(&DeviceConfig::default())?;
//! session.controller().configure_output(Pin::D5, false)?;
//! session.controller().write(Pin::D5, true)?;
//!
//! session.start_display(DisplayPins::default(), DisplaySettings::default())?;
//! session.display()?.draw_text("hello")?;
//! ```
//!
//! Everything is single threaded and synchronous; a session must be the
//! only thing driving the PINCTRL block.

pub mod config;
pub mod display;
pub mod error;
pub mod pinctrl;
pub mod session;

pub use display::{DisplayPins, DisplaySettings, Mode, Pcd8544};
pub use error::{HalError, Result};
pub use pinctrl::{Pin, PinController, PinRole, PinStatus, Reclaim, Register, RegisterBus};
pub use session::{DisplayHandle, Session};
