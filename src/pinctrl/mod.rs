/*
 *  pinctrl/mod.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  GPIO pin control over the PINCTRL register block
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

pub mod registers;
pub mod window;
pub mod pins;
pub mod controller;
pub mod hal;

// Recording bus for unit and integration tests
pub mod mock;

pub use controller::{ClaimantId, PinController, PinRole, PinStatus, Reclaim};
pub use hal::{InputHandle, OutputHandle};
pub use pins::{Pin, PinDescriptor};
pub use registers::{Bank, Register, RegisterDescriptor};
pub use window::{MemWindow, RegisterBus, PINCTRL_BASE, PINCTRL_WINDOW_LEN};
