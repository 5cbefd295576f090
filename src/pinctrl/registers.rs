/*
 *  pinctrl/registers.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  PINCTRL register map: symbolic register names and their byte offsets
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

//! The i.MX23 PINCTRL block exposes every logical register at four addresses:
//! the plain register plus SET, CLR and TOG aliases at +0x4, +0x8 and +0xC.
//! Writing a one through an alias only touches the addressed bits, so callers
//! pick the alias and never read-modify-write.

use std::fmt;
use std::str::FromStr;

use crate::error::{HalError, Result};

/// GPIO bank, a group of up to 32 pins sharing direction/data/pull registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bank {
    Bank0,
    Bank1,
    Bank2,
}

impl Bank {
    pub const ALL: [Bank; 3] = [Bank::Bank0, Bank::Bank1, Bank::Bank2];

    pub const fn index(self) -> u8 {
        match self {
            Bank::Bank0 => 0,
            Bank::Bank1 => 1,
            Bank::Bank2 => 2,
        }
    }
}

/// Register family within the PINCTRL block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterGroup {
    MuxSel,
    Doe,
    Dout,
    Din,
    Pull,
}

/// Which address of a logical register is targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alias {
    Plain,
    Set,
    Clr,
    Tog,
}

/// Static (name, offset) pair as published in the reference manual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDescriptor {
    pub name: &'static str,
    pub offset: usize,
}

macro_rules! register_map {
    ($($variant:ident => $name:literal, $group:ident[$index:literal].$alias:ident @ $offset:literal;)+) => {
        /// Every PINCTRL register this crate touches.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Register {
            $($variant,)+
        }

        impl Register {
            pub const ALL: &'static [Register] = &[$(Register::$variant,)+];

            pub const fn descriptor(self) -> RegisterDescriptor {
                match self {
                    $(Register::$variant => RegisterDescriptor { name: $name, offset: $offset },)+
                }
            }

            pub const fn group(self) -> RegisterGroup {
                match self {
                    $(Register::$variant => RegisterGroup::$group,)+
                }
            }

            /// Bank (or MUXSEL word) index the register belongs to
            pub const fn index(self) -> u8 {
                match self {
                    $(Register::$variant => $index,)+
                }
            }

            pub const fn alias(self) -> Alias {
                match self {
                    $(Register::$variant => Alias::$alias,)+
                }
            }
        }
    };
}

register_map! {
    MuxSel0Set => "HW_PINCTRL_MUXSEL0_SET", MuxSel[0].Set @ 0x104;
    MuxSel1Set => "HW_PINCTRL_MUXSEL1_SET", MuxSel[1].Set @ 0x114;
    MuxSel2Set => "HW_PINCTRL_MUXSEL2_SET", MuxSel[2].Set @ 0x124;
    MuxSel3Set => "HW_PINCTRL_MUXSEL3_SET", MuxSel[3].Set @ 0x134;
    MuxSel4Set => "HW_PINCTRL_MUXSEL4_SET", MuxSel[4].Set @ 0x144;
    MuxSel5Set => "HW_PINCTRL_MUXSEL5_SET", MuxSel[5].Set @ 0x154;
    MuxSel6Set => "HW_PINCTRL_MUXSEL6_SET", MuxSel[6].Set @ 0x164;
    MuxSel7Set => "HW_PINCTRL_MUXSEL7_SET", MuxSel[7].Set @ 0x174;

    Pull0Set => "HW_PINCTRL_PULL0_SET", Pull[0].Set @ 0x404;
    Pull0Clr => "HW_PINCTRL_PULL0_CLR", Pull[0].Clr @ 0x408;
    Pull1Set => "HW_PINCTRL_PULL1_SET", Pull[1].Set @ 0x414;
    Pull1Clr => "HW_PINCTRL_PULL1_CLR", Pull[1].Clr @ 0x418;
    Pull2Set => "HW_PINCTRL_PULL2_SET", Pull[2].Set @ 0x424;
    Pull2Clr => "HW_PINCTRL_PULL2_CLR", Pull[2].Clr @ 0x428;

    Dout0Set => "HW_PINCTRL_DOUT0_SET", Dout[0].Set @ 0x504;
    Dout0Clr => "HW_PINCTRL_DOUT0_CLR", Dout[0].Clr @ 0x508;
    Dout0Tog => "HW_PINCTRL_DOUT0_TOG", Dout[0].Tog @ 0x50c;
    Dout1Set => "HW_PINCTRL_DOUT1_SET", Dout[1].Set @ 0x514;
    Dout1Clr => "HW_PINCTRL_DOUT1_CLR", Dout[1].Clr @ 0x518;
    Dout1Tog => "HW_PINCTRL_DOUT1_TOG", Dout[1].Tog @ 0x51c;
    Dout2Set => "HW_PINCTRL_DOUT2_SET", Dout[2].Set @ 0x524;
    Dout2Clr => "HW_PINCTRL_DOUT2_CLR", Dout[2].Clr @ 0x528;
    Dout2Tog => "HW_PINCTRL_DOUT2_TOG", Dout[2].Tog @ 0x52c;

    Din0 => "HW_PINCTRL_DIN0", Din[0].Plain @ 0x600;
    Din0Set => "HW_PINCTRL_DIN0_SET", Din[0].Set @ 0x604;
    Din0Clr => "HW_PINCTRL_DIN0_CLR", Din[0].Clr @ 0x608;
    Din1 => "HW_PINCTRL_DIN1", Din[1].Plain @ 0x610;
    Din1Set => "HW_PINCTRL_DIN1_SET", Din[1].Set @ 0x614;
    Din1Clr => "HW_PINCTRL_DIN1_CLR", Din[1].Clr @ 0x618;
    Din2 => "HW_PINCTRL_DIN2", Din[2].Plain @ 0x620;
    Din2Set => "HW_PINCTRL_DIN2_SET", Din[2].Set @ 0x624;
    Din2Clr => "HW_PINCTRL_DIN2_CLR", Din[2].Clr @ 0x628;

    Doe0Set => "HW_PINCTRL_DOE0_SET", Doe[0].Set @ 0x704;
    Doe0Clr => "HW_PINCTRL_DOE0_CLR", Doe[0].Clr @ 0x708;
    Doe1Set => "HW_PINCTRL_DOE1_SET", Doe[1].Set @ 0x714;
    Doe1Clr => "HW_PINCTRL_DOE1_CLR", Doe[1].Clr @ 0x718;
    Doe2Set => "HW_PINCTRL_DOE2_SET", Doe[2].Set @ 0x724;
    Doe2Clr => "HW_PINCTRL_DOE2_CLR", Doe[2].Clr @ 0x728;
}

impl Register {
    pub const fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Byte offset from the start of the PINCTRL block
    pub const fn offset(self) -> usize {
        self.descriptor().offset
    }

    /// Smallest window length that covers every register in the map
    pub fn window_span() -> usize {
        Register::ALL
            .iter()
            .map(|r| r.offset() + 4)
            .max()
            .unwrap_or(0)
    }

    /// MUXSEL SET alias by word index, as stored in the pin catalog
    pub fn muxsel_set(index: u8) -> Result<Register> {
        match index {
            0 => Ok(Register::MuxSel0Set),
            1 => Ok(Register::MuxSel1Set),
            2 => Ok(Register::MuxSel2Set),
            3 => Ok(Register::MuxSel3Set),
            4 => Ok(Register::MuxSel4Set),
            5 => Ok(Register::MuxSel5Set),
            6 => Ok(Register::MuxSel6Set),
            7 => Ok(Register::MuxSel7Set),
            _ => Err(HalError::UnknownRegister(format!("HW_PINCTRL_MUXSEL{index}_SET"))),
        }
    }

    pub const fn doe_set(bank: Bank) -> Register {
        match bank {
            Bank::Bank0 => Register::Doe0Set,
            Bank::Bank1 => Register::Doe1Set,
            Bank::Bank2 => Register::Doe2Set,
        }
    }

    pub const fn doe_clr(bank: Bank) -> Register {
        match bank {
            Bank::Bank0 => Register::Doe0Clr,
            Bank::Bank1 => Register::Doe1Clr,
            Bank::Bank2 => Register::Doe2Clr,
        }
    }

    pub const fn dout_set(bank: Bank) -> Register {
        match bank {
            Bank::Bank0 => Register::Dout0Set,
            Bank::Bank1 => Register::Dout1Set,
            Bank::Bank2 => Register::Dout2Set,
        }
    }

    pub const fn dout_clr(bank: Bank) -> Register {
        match bank {
            Bank::Bank0 => Register::Dout0Clr,
            Bank::Bank1 => Register::Dout1Clr,
            Bank::Bank2 => Register::Dout2Clr,
        }
    }

    pub const fn dout_tog(bank: Bank) -> Register {
        match bank {
            Bank::Bank0 => Register::Dout0Tog,
            Bank::Bank1 => Register::Dout1Tog,
            Bank::Bank2 => Register::Dout2Tog,
        }
    }

    /// Plain DIN register holding the sampled pin levels
    pub const fn din_state(bank: Bank) -> Register {
        match bank {
            Bank::Bank0 => Register::Din0,
            Bank::Bank1 => Register::Din1,
            Bank::Bank2 => Register::Din2,
        }
    }

    pub const fn din_set(bank: Bank) -> Register {
        match bank {
            Bank::Bank0 => Register::Din0Set,
            Bank::Bank1 => Register::Din1Set,
            Bank::Bank2 => Register::Din2Set,
        }
    }

    pub const fn pull_set(bank: Bank) -> Register {
        match bank {
            Bank::Bank0 => Register::Pull0Set,
            Bank::Bank1 => Register::Pull1Set,
            Bank::Bank2 => Register::Pull2Set,
        }
    }

    pub const fn pull_clr(bank: Bank) -> Register {
        match bank {
            Bank::Bank0 => Register::Pull0Clr,
            Bank::Bank1 => Register::Pull1Clr,
            Bank::Bank2 => Register::Pull2Clr,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Register {
    type Err = HalError;

    /// Accepts the full manual name, or the name without the `HW_PINCTRL_` prefix.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        let wanted = if wanted.starts_with("HW_PINCTRL_") {
            wanted
        } else {
            format!("HW_PINCTRL_{wanted}")
        };
        Register::ALL
            .iter()
            .copied()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| HalError::UnknownRegister(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_offsets_are_unique_and_aligned() {
        let mut seen = HashSet::new();
        for reg in Register::ALL {
            assert_eq!(reg.offset() % 4, 0, "{reg} is not word aligned");
            assert!(seen.insert(reg.offset()), "{reg} shares an offset");
        }
        assert_eq!(Register::ALL.len(), 38);
    }

    #[test]
    fn test_alias_offsets_follow_layout() {
        for reg in Register::ALL {
            let low = reg.offset() & 0xf;
            let expected = match reg.alias() {
                Alias::Plain => 0x0,
                Alias::Set => 0x4,
                Alias::Clr => 0x8,
                Alias::Tog => 0xc,
            };
            assert_eq!(low, expected, "{reg}");
        }
    }

    #[test]
    fn test_bank_helpers_agree_with_group_and_index() {
        for bank in Bank::ALL {
            for (reg, group, alias) in [
                (Register::doe_set(bank), RegisterGroup::Doe, Alias::Set),
                (Register::doe_clr(bank), RegisterGroup::Doe, Alias::Clr),
                (Register::dout_set(bank), RegisterGroup::Dout, Alias::Set),
                (Register::dout_clr(bank), RegisterGroup::Dout, Alias::Clr),
                (Register::dout_tog(bank), RegisterGroup::Dout, Alias::Tog),
                (Register::din_state(bank), RegisterGroup::Din, Alias::Plain),
                (Register::din_set(bank), RegisterGroup::Din, Alias::Set),
                (Register::pull_set(bank), RegisterGroup::Pull, Alias::Set),
                (Register::pull_clr(bank), RegisterGroup::Pull, Alias::Clr),
            ] {
                assert_eq!(reg.group(), group);
                assert_eq!(reg.alias(), alias);
                assert_eq!(reg.index(), bank.index());
            }
        }
    }

    #[test]
    fn test_muxsel_out_of_range_is_unknown_register() {
        assert_eq!(Register::muxsel_set(7).unwrap(), Register::MuxSel7Set);
        assert!(matches!(
            Register::muxsel_set(8),
            Err(HalError::UnknownRegister(name)) if name == "HW_PINCTRL_MUXSEL8_SET"
        ));
    }

    #[test]
    fn test_parse_register_names() {
        assert_eq!("HW_PINCTRL_DOUT0_SET".parse::<Register>().unwrap(), Register::Dout0Set);
        assert_eq!("din2".parse::<Register>().unwrap(), Register::Din2);
        assert!(matches!(
            "HW_PINCTRL_DOUT3_SET".parse::<Register>(),
            Err(HalError::UnknownRegister(_))
        ));
    }

    #[test]
    fn test_window_span_covers_doe2_clr() {
        assert_eq!(Register::window_span(), 0x72c);
    }
}
