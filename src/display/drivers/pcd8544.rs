/*
 *  display/drivers/pcd8544.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  Bit-banged PCD8544 (Nokia 5110) 84x48 LCD driver
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

use log::{debug, info, trace, warn};

use crate::display::font;
use crate::error::{HalError, Result};
use crate::pinctrl::controller::{ClaimantId, PinController, Reclaim};
use crate::pinctrl::pins::Pin;
use crate::pinctrl::window::RegisterBus;

/// Addressable columns
pub const WIDTH: u8 = 84;

/// 8-pixel-tall banks
pub const ROWS: u8 = 6;

/// Bytes of display RAM
pub const CELLS: usize = WIDTH as usize * ROWS as usize;

const FUNCTION_SET: u8 = 0x20;
const EXTENDED: u8 = 0x01;
const DISPLAY_NORMAL: u8 = 0x0c;
const SET_VOP: u8 = 0x80;
const SET_TEMP_COEFFICIENT: u8 = 0x04;
const SET_BIAS: u8 = 0x10;
const SET_X: u8 = 0x80;
const SET_Y: u8 = 0x40;

/// Meaning of a transferred byte, selected by the D/C line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// D/C low
    Command,
    /// D/C high
    Data,
}

/// The five lines wired to the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPins {
    /// SCLK
    pub clock: Pin,
    /// DN
    pub data: Pin,
    /// D/C
    pub mode_select: Pin,
    /// RST
    pub reset: Pin,
    /// SCE, active low
    pub enable: Pin,
}

impl Default for DisplayPins {
    fn default() -> Self {
        Self {
            clock: Pin::D0,
            data: Pin::D1,
            mode_select: Pin::D2,
            reset: Pin::D3,
            enable: Pin::D4,
        }
    }
}

impl DisplayPins {
    /// Pins in [clock, data, mode-select, reset, enable] order
    pub fn as_array(&self) -> [Pin; 5] {
        [self.clock, self.data, self.mode_select, self.reset, self.enable]
    }

    /// Parse names given in [clock, data, mode-select, reset, enable] order.
    pub fn from_names(names: [&str; 5]) -> Result<Self> {
        let [clock, data, mode_select, reset, enable] = names;
        Ok(Self {
            clock: clock.parse()?,
            data: data.parse()?,
            mode_select: mode_select.parse()?,
            reset: reset.parse()?,
            enable: enable.parse()?,
        })
    }

    /// First pin wired to more than one line, if any
    pub fn duplicate(&self) -> Option<Pin> {
        let pins = self.as_array();
        pins.iter()
            .enumerate()
            .find(|&(i, pin)| pins[..i].contains(pin))
            .map(|(_, &pin)| pin)
    }
}

/// Panel tuning applied during initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySettings {
    /// Operating voltage (Vop), 0..=0x7f
    pub contrast: u8,
    /// Bias system, 0..=7
    pub bias: u8,
    /// 0..=3
    pub temperature_coefficient: u8,
    /// Whether the claimed pins may be reconfigured by other callers
    pub reclaim: Reclaim,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            contrast: 0x3f,
            bias: 4,
            temperature_coefficient: 0,
            reclaim: Reclaim::Deny,
        }
    }
}

impl DisplaySettings {
    /// Commands sent after reset, before the cursor is homed.
    pub fn init_sequence(&self) -> [u8; 6] {
        [
            FUNCTION_SET | EXTENDED,
            SET_VOP | (self.contrast & 0x7f),
            SET_TEMP_COEFFICIENT | (self.temperature_coefficient & 0x03),
            SET_BIAS | (self.bias & 0x07),
            FUNCTION_SET,
            DISPLAY_NORMAL,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Uninitialized,
    Ready,
}

/// PCD8544 driven by software-clocked GPIO.
///
/// The driver owns its pin reservation but not the controller; every
/// operation borrows the controller for its duration. Once `stop` has run
/// the instance is dead and every call fails with `NotInitialized`.
#[derive(Debug)]
pub struct Pcd8544 {
    pins: DisplayPins,
    settings: DisplaySettings,
    claimant: ClaimantId,
    state: DisplayState,
    column: u8,
    row: u8,
    /// Line writes dropped because a pin was reclaimed mid-session
    absorbed: usize,
}

impl Pcd8544 {
    /// Claim `pins`, reset and initialize the panel, then blank it.
    ///
    /// Either all five pins end up reserved and the display is `Ready`, or
    /// an error is returned and no pin changed role.
    pub fn start<B: RegisterBus>(
        ctl: &mut PinController<B>,
        pins: DisplayPins,
        settings: DisplaySettings,
    ) -> Result<Self> {
        if let Some(pin) = pins.duplicate() {
            return Err(HalError::DuplicatePin(pin));
        }
        let claimant = ctl.new_claimant();
        ctl.reserve_all(&pins.as_array(), claimant, settings.reclaim)?;

        let mut lcd = Self {
            pins,
            settings,
            claimant,
            state: DisplayState::Uninitialized,
            column: 0,
            row: 0,
            absorbed: 0,
        };
        if let Err(e) = lcd.bring_up(ctl) {
            ctl.release_claim(claimant);
            return Err(e);
        }

        info!(
            "PCD8544 ready on sclk={} dn={} dc={} rst={} sce={}",
            pins.clock, pins.data, pins.mode_select, pins.reset, pins.enable
        );
        Ok(lcd)
    }

    fn bring_up<B: RegisterBus>(&mut self, ctl: &mut PinController<B>) -> Result<()> {
        for pin in self.pins.as_array() {
            ctl.setup_claimed_output(self.claimant, pin)?;
        }

        // falling then rising edge resets the controller logic
        let reset = self.pins.reset;
        self.line(ctl, reset, false)?;
        self.line(ctl, reset, true)?;

        self.state = DisplayState::Ready;
        for cmd in self.settings.init_sequence() {
            self.write_byte(ctl, cmd, Mode::Command)?;
        }
        self.set_cursor(ctl, 0, 0)?;
        self.clear(ctl)
    }

    /// Shift one byte out MSB first.
    ///
    /// Data is set while the clock is low and latched by the panel on the
    /// rising edge. There is no pacing beyond the cost of each register write.
    pub fn write_byte<B: RegisterBus>(
        &mut self,
        ctl: &mut PinController<B>,
        byte: u8,
        mode: Mode,
    ) -> Result<()> {
        self.ensure_ready()?;
        let pins = self.pins;
        let before = self.absorbed;

        self.line(ctl, pins.mode_select, mode == Mode::Data)?;
        self.line(ctl, pins.enable, false)?;
        for bit in (0..8).rev() {
            self.line(ctl, pins.clock, false)?;
            self.line(ctl, pins.data, (byte >> bit) & 1 != 0)?;
            self.line(ctl, pins.clock, true)?;
        }
        self.line(ctl, pins.enable, true)?;

        if self.absorbed > before {
            warn!(
                "{} line writes of {:?} byte {:#04x} dropped, display pins were reclaimed",
                self.absorbed - before,
                mode,
                byte
            );
        }
        if mode == Mode::Data {
            self.advance();
        } else {
            trace!("command {:#04x}", byte);
        }
        Ok(())
    }

    /// Move the RAM address pointer.
    ///
    /// Values are not range checked; the panel ignores addresses outside
    /// 0..84 x 0..6, so the tracked cursor keeps its previous coordinate
    /// for any out-of-range value.
    pub fn set_cursor<B: RegisterBus>(
        &mut self,
        ctl: &mut PinController<B>,
        column: u8,
        row: u8,
    ) -> Result<()> {
        self.write_byte(ctl, SET_X | column, Mode::Command)?;
        self.write_byte(ctl, SET_Y | row, Mode::Command)?;
        if column < WIDTH {
            self.column = column;
        }
        if row < ROWS {
            self.row = row;
        }
        Ok(())
    }

    /// Zero all display RAM and home the cursor.
    pub fn clear<B: RegisterBus>(&mut self, ctl: &mut PinController<B>) -> Result<()> {
        self.set_cursor(ctl, 0, 0)?;
        for _ in 0..CELLS {
            self.write_byte(ctl, 0x00, Mode::Data)?;
        }
        self.set_cursor(ctl, 0, 0)
    }

    /// Render `text` at the cursor, one blank column after each glyph.
    ///
    /// Characters without a glyph are skipped. Returns how many were drawn.
    pub fn draw_text<B: RegisterBus>(&mut self, ctl: &mut PinController<B>, text: &str) -> Result<usize> {
        let mut drawn = 0;
        for c in text.chars() {
            let Some(columns) = font::glyph(c) else {
                debug!("no glyph for {:?}, skipped", c);
                continue;
            };
            for &col in columns {
                self.write_byte(ctl, col, Mode::Data)?;
            }
            self.write_byte(ctl, 0x00, Mode::Data)?;
            drawn += 1;
        }
        Ok(drawn)
    }

    /// Write raw column bytes at the cursor.
    pub fn write_data<B: RegisterBus>(&mut self, ctl: &mut PinController<B>, bytes: &[u8]) -> Result<()> {
        for &b in bytes {
            self.write_byte(ctl, b, Mode::Data)?;
        }
        Ok(())
    }

    /// Blank the panel and hand the pins back to the controller.
    pub fn stop<B: RegisterBus>(&mut self, ctl: &mut PinController<B>) -> Result<()> {
        self.ensure_ready()?;
        let cleared = self.clear(ctl);
        let released = ctl.release_claim(self.claimant);
        self.state = DisplayState::Uninitialized;
        info!("PCD8544 stopped, released {:?}", released);
        cleared
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == DisplayState::Ready
    }

    pub fn pins(&self) -> DisplayPins {
        self.pins
    }

    pub fn settings(&self) -> DisplaySettings {
        self.settings
    }

    pub fn claimant(&self) -> ClaimantId {
        self.claimant
    }

    /// Tracked (column, row) of the next data byte
    pub fn cursor(&self) -> (u8, u8) {
        (self.column, self.row)
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            DisplayState::Ready => Ok(()),
            DisplayState::Uninitialized => Err(HalError::NotInitialized),
        }
    }

    // The panel auto-increments horizontally, wrapping into the next bank.
    fn advance(&mut self) {
        self.column += 1;
        if self.column >= WIDTH {
            self.column = 0;
            self.row = (self.row + 1) % ROWS;
        }
    }

    fn line<B: RegisterBus>(&mut self, ctl: &mut PinController<B>, pin: Pin, level: bool) -> Result<()> {
        match ctl.drive(self.claimant, pin, level) {
            Err(HalError::RoleViolation { .. }) => {
                self.absorbed += 1;
                Ok(())
            }
            other => other,
        }
    }
}
