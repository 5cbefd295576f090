/*
 *  session.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  Controller session: the mapped window, pin roles and any active display
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

use log::{info, warn};

use crate::config::DeviceConfig;
use crate::display::{DisplayPins, DisplaySettings, Mode, Pcd8544};
use crate::error::{HalError, Result};
use crate::pinctrl::{MemWindow, PinController, PinStatus, RegisterBus};

/// Process-wide owner of the register window and everything built on it.
///
/// Dropping or shutting down a session blanks and releases an active
/// display before the window is unmapped.
pub struct Session<B: RegisterBus = MemWindow> {
    ctl: PinController<B>,
    display: Option<Pcd8544>,
}

impl Session<MemWindow> {
    /// Map the PINCTRL window described by `device`.
    pub fn open(device: &DeviceConfig) -> Result<Self> {
        let window = MemWindow::open(&device.path(), device.base_address(), device.length())?;
        Ok(Self::with_bus(window))
    }
}

impl<B: RegisterBus> Session<B> {
    pub fn with_bus(bus: B) -> Self {
        Self {
            ctl: PinController::new(bus),
            display: None,
        }
    }

    pub fn controller(&mut self) -> &mut PinController<B> {
        &mut self.ctl
    }

    pub fn status(&self) -> PinStatus {
        self.ctl.status()
    }

    /// Start the display on `pins`, replacing any display already running.
    pub fn start_display(&mut self, pins: DisplayPins, settings: DisplaySettings) -> Result<()> {
        if self.display.is_some() {
            info!("replacing running display");
            self.stop_display()?;
        }
        let lcd = Pcd8544::start(&mut self.ctl, pins, settings)?;
        self.display = Some(lcd);
        Ok(())
    }

    /// Borrow the running display together with the controller it drives.
    pub fn display(&mut self) -> Result<DisplayHandle<'_, B>> {
        match self.display.as_mut() {
            Some(lcd) if lcd.is_ready() => Ok(DisplayHandle { lcd, ctl: &mut self.ctl }),
            _ => Err(HalError::NotInitialized),
        }
    }

    /// Blank the display and release its pins.
    pub fn stop_display(&mut self) -> Result<()> {
        let mut lcd = self.display.take().ok_or(HalError::NotInitialized)?;
        lcd.stop(&mut self.ctl)
    }

    /// Stop any display and unmap the window.
    pub fn shutdown(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        match self.display.take() {
            Some(mut lcd) if lcd.is_ready() => lcd.stop(&mut self.ctl),
            _ => Ok(()),
        }
    }
}

impl<B: RegisterBus> Drop for Session<B> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!("display teardown failed: {}", e);
        }
    }
}

impl<B: RegisterBus> fmt::Debug for Session<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.ctl.status())
            .field("display", &self.display)
            .finish()
    }
}

/// A running display paired with the controller it drives
pub struct DisplayHandle<'a, B: RegisterBus> {
    lcd: &'a mut Pcd8544,
    ctl: &'a mut PinController<B>,
}

impl<B: RegisterBus> DisplayHandle<'_, B> {
    pub fn write_byte(&mut self, byte: u8, mode: Mode) -> Result<()> {
        self.lcd.write_byte(self.ctl, byte, mode)
    }

    pub fn set_cursor(&mut self, column: u8, row: u8) -> Result<()> {
        self.lcd.set_cursor(self.ctl, column, row)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.lcd.clear(self.ctl)
    }

    pub fn draw_text(&mut self, text: &str) -> Result<usize> {
        self.lcd.draw_text(self.ctl, text)
    }

    pub fn write_data(&mut self, bytes: &[u8]) -> Result<()> {
        self.lcd.write_data(self.ctl, bytes)
    }

    pub fn cursor(&self) -> (u8, u8) {
        self.lcd.cursor()
    }
}

impl<B: RegisterBus> fmt::Write for DisplayHandle<'_, B> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.draw_text(s).map(|_| ()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pinctrl::mock::{decode_frames, MockBus, SerialLines};
    use crate::pinctrl::{Pin, PinRole};
    use std::fmt::Write as _;

    #[test]
    fn test_display_requires_start() {
        let mut session = Session::with_bus(MockBus::new());
        assert!(matches!(session.display(), Err(HalError::NotInitialized)));
        assert!(matches!(session.stop_display(), Err(HalError::NotInitialized)));
    }

    #[test]
    fn test_fmt_write_renders_text() {
        let bus = MockBus::new();
        let mut session = Session::with_bus(bus.clone());
        session.start_display(DisplayPins::default(), DisplaySettings::default()).unwrap();
        bus.clear_log();

        {
            let mut lcd = session.display().unwrap();
            write!(lcd, "{}", 7).unwrap();
            assert_eq!(lcd.cursor(), (6, 0));
        }
        let data: Vec<u8> = decode_frames(&bus.writes(), SerialLines::from(DisplayPins::default()))
            .iter()
            .filter(|f| f.select)
            .map(|f| f.byte())
            .collect();
        assert_eq!(data, vec![0x01, 0x71, 0x09, 0x05, 0x03, 0x00]);
    }

    #[test]
    fn test_drop_blanks_and_releases() {
        let bus = MockBus::new();
        {
            let mut session = Session::with_bus(bus.clone());
            session.start_display(DisplayPins::default(), DisplaySettings::default()).unwrap();
            session.display().unwrap().draw_text("x").unwrap();
            bus.clear_log();
        }
        let frames = decode_frames(&bus.writes(), SerialLines::from(DisplayPins::default()));
        assert_eq!(frames.iter().filter(|f| f.select && f.byte() == 0).count(), 504);
    }

    #[test]
    fn test_shutdown_then_pins_free() {
        let bus = MockBus::new();
        let mut session = Session::with_bus(bus.clone());
        session.start_display(DisplayPins::default(), DisplaySettings::default()).unwrap();
        assert_eq!(session.status().reserved.len(), 5);
        session.stop_display().unwrap();
        for pin in DisplayPins::default().as_array() {
            assert_eq!(session.controller().role(pin), PinRole::Unassigned);
        }
        session.controller().configure_output(Pin::D0, false).unwrap();
        session.shutdown().unwrap();
    }

    #[test]
    fn test_start_display_replaces_running_one() {
        let mut session = Session::with_bus(MockBus::new());
        session.start_display(DisplayPins::default(), DisplaySettings::default()).unwrap();
        let moved = DisplayPins::from_names(["D5", "D6", "D7", "SCL", "SDA"]).unwrap();
        session.start_display(moved, DisplaySettings::default()).unwrap();

        let status = session.status();
        assert_eq!(status.reserved, vec![Pin::D5, Pin::D6, Pin::D7, Pin::Scl, Pin::Sda]);
    }
}
