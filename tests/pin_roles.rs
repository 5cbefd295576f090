/*
 *  tests/pin_roles.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  Pin role and LCD behaviour through the public API
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

use chbio::pinctrl::mock::{decode_frames, output_edges, Edge, Frame, MockBus, SerialLines};
use chbio::pinctrl::ClaimantId;
use chbio::{
    DisplayPins, DisplaySettings, HalError, Mode, Pcd8544, Pin, PinController, PinRole, Reclaim,
    Session,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn controller() -> (PinController<MockBus>, MockBus) {
    let bus = MockBus::new();
    (PinController::new(bus.clone()), bus)
}

fn lcd_frames(bus: &MockBus) -> Vec<Frame> {
    decode_frames(&bus.writes(), SerialLines::from(DisplayPins::default()))
}

/// The status lists must partition the non-idle pins and agree with `role`.
fn assert_partition(ctl: &PinController<MockBus>) {
    let status = ctl.status();
    for pin in Pin::ALL {
        let hits = [&status.inputs, &status.outputs, &status.reserved]
            .iter()
            .filter(|list| list.contains(&pin))
            .count();
        let expected = match ctl.role(pin) {
            PinRole::Unassigned => 0,
            _ => 1,
        };
        assert_eq!(hits, expected, "{pin} appears {hits} times");
        match ctl.role(pin) {
            PinRole::Input => assert!(status.inputs.contains(&pin)),
            PinRole::Output => assert!(status.outputs.contains(&pin)),
            PinRole::ReservedForPeripheral { .. } => assert!(status.reserved.contains(&pin)),
            PinRole::Unassigned => {}
        }
    }
}

#[test]
fn test_random_operations_keep_roles_partitioned() {
    let (mut ctl, _bus) = controller();
    let claimants: Vec<ClaimantId> = (0..3).map(|_| ctl.new_claimant()).collect();
    let mut model = [PinRole::Unassigned; Pin::COUNT];
    let mut rng = StdRng::seed_from_u64(0x5110);

    for _ in 0..2_000 {
        let pin = Pin::ALL[rng.random_range(0..Pin::COUNT)];
        let claimant = claimants[rng.random_range(0..claimants.len())];
        let reclaim = if rng.random_bool(0.5) { Reclaim::Allow } else { Reclaim::Deny };
        let slot = &mut model[pin.index()];

        match rng.random_range(0..4) {
            0 | 1 => {
                let as_output = rng.random_bool(0.5);
                let result = if as_output {
                    ctl.configure_output(pin, false)
                } else {
                    ctl.configure_input(pin, false)
                };
                match *slot {
                    PinRole::ReservedForPeripheral { claimant: holder, reclaim: Reclaim::Deny } => {
                        assert!(matches!(result, Err(HalError::PinBusy { holder: h, .. }) if h == holder));
                    }
                    _ => {
                        result.unwrap();
                        *slot = if as_output { PinRole::Output } else { PinRole::Input };
                    }
                }
            }
            2 => {
                let result = ctl.reserve(pin, claimant, reclaim);
                match *slot {
                    PinRole::ReservedForPeripheral { claimant: holder, .. } if holder != claimant => {
                        assert!(matches!(result, Err(HalError::PinBusy { .. })));
                    }
                    _ => {
                        result.unwrap();
                        *slot = PinRole::ReservedForPeripheral { claimant, reclaim };
                    }
                }
            }
            _ => {
                let result = ctl.release(pin, claimant);
                match *slot {
                    PinRole::ReservedForPeripheral { claimant: holder, .. } if holder == claimant => {
                        result.unwrap();
                        *slot = PinRole::Unassigned;
                    }
                    PinRole::ReservedForPeripheral { .. } => {
                        assert!(matches!(result, Err(HalError::PinBusy { .. })));
                    }
                    _ => assert!(matches!(result, Err(HalError::RoleViolation { .. }))),
                }
            }
        }

        for pin in Pin::ALL {
            assert_eq!(ctl.role(pin), model[pin.index()], "{pin} diverged");
        }
        assert_partition(&ctl);
    }
}

#[test]
fn test_every_output_rejects_read() {
    let (mut ctl, bus) = controller();
    for pin in Pin::ALL {
        ctl.configure_output(pin, false).unwrap();
        ctl.write(pin, true).unwrap();
        assert!(bus.output_level(pin));
        assert!(matches!(
            ctl.read(pin),
            Err(HalError::RoleViolation { role: PinRole::Output, .. })
        ));
    }
    assert_eq!(ctl.status().outputs.len(), Pin::COUNT);
}

#[test]
fn test_every_input_rejects_write() {
    let (mut ctl, bus) = controller();
    for pin in Pin::ALL {
        ctl.configure_input(pin, false).unwrap();
        bus.set_input(pin, true);
        assert!(ctl.read(pin).unwrap());
        bus.clear_log();
        assert!(matches!(ctl.write(pin, true), Err(HalError::RoleViolation { .. })));
        assert!(matches!(ctl.toggle(pin), Err(HalError::RoleViolation { .. })));
        assert!(bus.writes().is_empty());
    }
}

#[test]
fn test_lcd_pins_busy_until_stopped() {
    let (mut ctl, _bus) = controller();
    let mut lcd = Pcd8544::start(&mut ctl, DisplayPins::default(), DisplaySettings::default()).unwrap();

    for pin in DisplayPins::default().as_array() {
        assert!(matches!(ctl.configure_output(pin, false), Err(HalError::PinBusy { .. })));
        assert!(matches!(ctl.configure_input(pin, true), Err(HalError::PinBusy { .. })));
    }
    // pins outside the panel stay free
    ctl.configure_output(Pin::D5, false).unwrap();

    lcd.stop(&mut ctl).unwrap();
    for pin in DisplayPins::default().as_array() {
        assert_eq!(ctl.role(pin), PinRole::Unassigned);
        ctl.configure_input(pin, false).unwrap();
    }
}

#[test]
fn test_cursor_addresses_whole_panel() {
    let (mut ctl, bus) = controller();
    let mut lcd = Pcd8544::start(&mut ctl, DisplayPins::default(), DisplaySettings::default()).unwrap();

    for y in 0..=5u8 {
        for x in 0..=83u8 {
            bus.clear_log();
            lcd.set_cursor(&mut ctl, x, y).unwrap();
            let frames = lcd_frames(&bus);
            let bytes: Vec<(bool, u8)> = frames.iter().map(|f| (f.select, f.byte())).collect();
            assert_eq!(bytes, vec![(false, 0x80 | x), (false, 0x40 | y)]);
        }
    }
}

#[test]
fn test_write_byte_clock_pulses() {
    let (mut ctl, bus) = controller();
    let mut lcd = Pcd8544::start(&mut ctl, DisplayPins::default(), DisplaySettings::default()).unwrap();

    for (byte, mode) in [(0x00, Mode::Data), (0xff, Mode::Command), (0xa5, Mode::Data)] {
        bus.clear_log();
        lcd.write_byte(&mut ctl, byte, mode).unwrap();
        let edges = output_edges(&bus.writes());
        let rising = edges.iter().filter(|e| **e == Edge::Set(Pin::D0)).count();
        let falling = edges.iter().filter(|e| **e == Edge::Cleared(Pin::D0)).count();
        assert_eq!((rising, falling), (8, 8));

        let frames = lcd_frames(&bus);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].byte(), byte);
        assert_eq!(frames[0].select, mode == Mode::Data);
        assert_eq!(frames[0].data_changes_while_clock_high, 0);
    }
}

#[test]
fn test_clear_blanks_every_cell() {
    let (mut ctl, bus) = controller();
    let mut lcd = Pcd8544::start(&mut ctl, DisplayPins::default(), DisplaySettings::default()).unwrap();
    lcd.draw_text(&mut ctl, "hello").unwrap();
    bus.clear_log();

    lcd.clear(&mut ctl).unwrap();
    let frames = lcd_frames(&bus);
    let data: Vec<u8> = frames.iter().filter(|f| f.select).map(Frame::byte).collect();
    assert_eq!(data.len(), 504);
    assert!(data.iter().all(|&b| b == 0));
    assert_eq!(lcd.cursor(), (0, 0));
}

#[test]
fn test_restart_repeats_start_traffic() {
    let (mut ctl, bus) = controller();
    let mut first = Pcd8544::start(&mut ctl, DisplayPins::default(), DisplaySettings::default()).unwrap();
    let initial = lcd_frames(&bus);
    first.stop(&mut ctl).unwrap();
    assert!(matches!(first.clear(&mut ctl), Err(HalError::NotInitialized)));

    bus.clear_log();
    let second = Pcd8544::start(&mut ctl, DisplayPins::default(), DisplaySettings::default()).unwrap();
    assert_eq!(lcd_frames(&bus), initial);
    assert!(second.is_ready());
    assert_ne!(first.claimant(), second.claimant());
}

#[test]
fn test_session_teardown_releases_panel() {
    let bus = MockBus::new();
    let mut session = Session::with_bus(bus.clone());
    session
        .start_display(DisplayPins::default(), DisplaySettings::default())
        .unwrap();
    session.display().unwrap().draw_text("CHB").unwrap();
    assert_eq!(session.status().reserved.len(), 5);

    bus.clear_log();
    session.shutdown().unwrap();
    let data: Vec<u8> = lcd_frames(&bus).iter().filter(|f| f.select).map(Frame::byte).collect();
    assert_eq!(data.len(), 504);
    assert!(data.iter().all(|&b| b == 0));
}
