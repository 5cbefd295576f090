/*
 *  pinctrl/pins.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  Pin catalog for the 2x13 expansion header
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
use std::str::FromStr;

use crate::error::{HalError, Result};
use crate::pinctrl::registers::Bank;

/// Static description of one physical pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinDescriptor {
    /// Silkscreen name
    pub name: &'static str,
    /// MUXSEL word holding this pin's function selector
    pub mux_index: u8,
    /// Selector bits within that MUXSEL word (both bits set selects GPIO)
    pub mux_mask: u32,
    pub bank: Bank,
    /// Bit within the bank's DOE/DOUT/DIN/PULL registers
    pub mask: u32,
}

/// Pins known to the controller.
///
/// The bank 1 and bank 2 pins are never muxed at startup; they are only
/// switched to GPIO when a caller configures them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pin {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    Scl,
    Sda,
    Pm1,
    Pm2,
    Pm3,
    Pm4,
    A2,
    A3,
    A4,
    A5,
}

const fn pin(name: &'static str, mux_index: u8, mux_mask: u32, bank: Bank, mask: u32) -> PinDescriptor {
    PinDescriptor { name, mux_index, mux_mask, bank, mask }
}

// Indexed by `Pin as usize`.
static CATALOG: [PinDescriptor; Pin::COUNT] = [
    pin("D0", 0, 0x0000_0003, Bank::Bank0, 0x0000_0001),
    pin("D1", 0, 0x0000_000c, Bank::Bank0, 0x0000_0002),
    pin("D2", 0, 0x0000_0030, Bank::Bank0, 0x0000_0004),
    pin("D3", 0, 0x0000_00c0, Bank::Bank0, 0x0000_0008),
    pin("D4", 0, 0x0000_0300, Bank::Bank0, 0x0000_0010),
    pin("D5", 0, 0x0000_0c00, Bank::Bank0, 0x0000_0020),
    pin("D6", 0, 0x0000_3000, Bank::Bank0, 0x0000_0040),
    pin("D7", 0, 0x0000_c000, Bank::Bank0, 0x0000_0080),
    pin("SCL", 1, 0x3000_0000, Bank::Bank0, 0x4000_0000),
    pin("SDA", 1, 0xc000_0000, Bank::Bank0, 0x8000_0000),
    pin("PM1", 3, 0x00c0_0000, Bank::Bank1, 0x0800_0000),
    pin("PM2", 3, 0x0300_0000, Bank::Bank1, 0x1000_0000),
    pin("PM3", 3, 0x0c00_0000, Bank::Bank1, 0x2000_0000),
    pin("PM4", 3, 0x3000_0000, Bank::Bank1, 0x4000_0000),
    pin("A2", 4, 0x00c0_0000, Bank::Bank2, 0x0000_0800),
    pin("A3", 4, 0x0300_0000, Bank::Bank2, 0x0000_1000),
    pin("A4", 4, 0x0c00_0000, Bank::Bank2, 0x0000_2000),
    pin("A5", 4, 0x3000_0000, Bank::Bank2, 0x0000_4000),
];

impl Pin {
    pub const COUNT: usize = 18;

    pub const ALL: [Pin; Pin::COUNT] = [
        Pin::D0,
        Pin::D1,
        Pin::D2,
        Pin::D3,
        Pin::D4,
        Pin::D5,
        Pin::D6,
        Pin::D7,
        Pin::Scl,
        Pin::Sda,
        Pin::Pm1,
        Pin::Pm2,
        Pin::Pm3,
        Pin::Pm4,
        Pin::A2,
        Pin::A3,
        Pin::A4,
        Pin::A5,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn descriptor(self) -> &'static PinDescriptor {
        &CATALOG[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn bank(self) -> Bank {
        self.descriptor().bank
    }

    pub fn mask(self) -> u32 {
        self.descriptor().mask
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pin {
    type Err = HalError;

    /// Case-insensitive; `D00`..`D07` are accepted as in the board documentation.
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        let wanted = match upper.strip_prefix("D0") {
            Some(rest) if rest.len() == 1 => format!("D{rest}"),
            _ => upper,
        };
        Pin::ALL
            .iter()
            .copied()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| HalError::UnknownPin(s.to_string()))
    }
}

impl serde::Serialize for Pin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_order_matches_enum() {
        for (i, pin) in Pin::ALL.iter().enumerate() {
            assert_eq!(pin.index(), i);
            assert_eq!(pin.to_string().parse::<Pin>().unwrap(), *pin);
        }
    }

    #[test]
    fn test_masks_are_single_bits_unique_per_bank() {
        let mut seen = HashSet::new();
        for pin in Pin::ALL {
            assert_eq!(pin.mask().count_ones(), 1, "{pin}");
            assert!(seen.insert((pin.bank(), pin.mask())), "{pin} shares a bank bit");
        }
    }

    #[test]
    fn test_mux_selector_matches_bank_bit() {
        // two selector bits per pin, sixteen pins per MUXSEL word
        for pin in Pin::ALL {
            let desc = pin.descriptor();
            let bit = desc.mask.trailing_zeros();
            let word = desc.bank.index() as u32 * 2 + bit / 16;
            assert_eq!(desc.mux_index as u32, word, "{pin}");
            assert_eq!(desc.mux_mask, 0b11 << ((bit % 16) * 2), "{pin}");
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("d00".parse::<Pin>().unwrap(), Pin::D0);
        assert_eq!("D04".parse::<Pin>().unwrap(), Pin::D4);
        assert_eq!("scl".parse::<Pin>().unwrap(), Pin::Scl);
        assert_eq!(" pm3 ".parse::<Pin>().unwrap(), Pin::Pm3);
        assert!(matches!("D8".parse::<Pin>(), Err(HalError::UnknownPin(name)) if name == "D8"));
        assert!(matches!("A1".parse::<Pin>(), Err(HalError::UnknownPin(_))));
    }
}
