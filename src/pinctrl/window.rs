/*
 *  pinctrl/window.rs
 *
 *  chbio - pin control for the Chumby Hacker Board
 *  (c) 2020-26 Stuart Hunter
 *
 *  Raw 32-bit register access through a mapped PINCTRL window
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

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::ptr;

use log::{debug, info, trace};
use memmap2::{MmapMut, MmapOptions};

use crate::error::{HalError, Result};
use crate::pinctrl::registers::Register;

/// Physical address of the i.MX23 PINCTRL block
pub const PINCTRL_BASE: u64 = 0x8001_8000;

/// Default mapping length, one page covers the whole register map
pub const PINCTRL_WINDOW_LEN: usize = 0x1000;

/// Single aligned 32-bit transfers by symbolic register name.
///
/// Implementations never read-modify-write: callers select the SET/CLR/TOG
/// alias that touches only the bits they own.
pub trait RegisterBus {
    fn write(&mut self, reg: Register, value: u32);

    fn read(&self, reg: Register) -> u32;
}

/// PINCTRL registers mapped from the physical memory device.
#[derive(Debug)]
pub struct MemWindow {
    map: MmapMut,
    path: PathBuf,
    base: u64,
}

impl MemWindow {
    /// Map `len` bytes of `path` starting at physical address `base`.
    ///
    /// Fails with `DeviceUnavailable` when the device cannot be opened or
    /// mapped, or when the window is too small for the register map.
    pub fn open(path: &Path, base: u64, len: usize) -> Result<Self> {
        let unavailable = |source: io::Error| HalError::DeviceUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let span = Register::window_span();
        if len < span {
            return Err(unavailable(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("window of {len:#x} bytes does not cover register span {span:#x}"),
            )));
        }

        let file = open_device(path).map_err(unavailable)?;
        // Safety: registers change underneath the mapping; all access
        // goes through the volatile helpers below.
        let map = unsafe { MmapOptions::new().offset(base).len(len).map_mut(&file) }
            .map_err(unavailable)?;

        info!("mapped {} at {:#010x} ({:#x} bytes)", path.display(), base, len);
        Ok(Self {
            map,
            path: path.to_path_buf(),
            base,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base(&self) -> u64 {
        self.base
    }
}

#[cfg(unix)]
fn open_device(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_SYNC)
        .open(path)
}

#[cfg(not(unix))]
fn open_device(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

impl RegisterBus for MemWindow {
    fn write(&mut self, reg: Register, value: u32) {
        trace!("{} <- {:#010x}", reg, value);
        // Safety: open() checked that every register offset plus four lies
        // inside the mapping, offsets are word aligned and the mapping is
        // page aligned.
        unsafe {
            let p = self.map.as_mut_ptr().add(reg.offset()) as *mut u32;
            ptr::write_volatile(p, value.to_le());
        }
    }

    fn read(&self, reg: Register) -> u32 {
        // Safety: see write()
        let raw = unsafe {
            let p = self.map.as_ptr().add(reg.offset()) as *const u32;
            ptr::read_volatile(p)
        };
        let value = u32::from_le(raw);
        trace!("{} -> {:#010x}", reg, value);
        value
    }
}

impl Drop for MemWindow {
    fn drop(&mut self) {
        debug!("unmapping {} at {:#010x}", self.path.display(), self.base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scratch_file(len: usize) -> (PathBuf, File) {
        let path = std::env::temp_dir().join(format!(
            "chbio-window-{}-{}",
            std::process::id(),
            rand::random::<u32>()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(&vec![0u8; len]).unwrap();
        (path, file)
    }

    #[test]
    fn test_missing_device_is_unavailable() {
        let err = MemWindow::open(Path::new("/nonexistent/chbio-mem"), 0, PINCTRL_WINDOW_LEN)
            .unwrap_err();
        assert!(matches!(err, HalError::DeviceUnavailable { .. }));
    }

    #[test]
    fn test_short_window_is_unavailable() {
        let err = MemWindow::open(Path::new("/dev/mem"), PINCTRL_BASE, 0x100).unwrap_err();
        match err {
            HalError::DeviceUnavailable { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidInput)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_little_endian_word_access_on_file_backing() {
        let (path, _file) = scratch_file(PINCTRL_WINDOW_LEN);
        {
            let mut window = MemWindow::open(&path, 0, PINCTRL_WINDOW_LEN).unwrap();
            window.write(Register::Dout0Set, 0x1234_5678);
            assert_eq!(window.read(Register::Dout0Set), 0x1234_5678);
            assert_eq!(window.read(Register::Dout0Clr), 0);
        }
        let bytes = std::fs::read(&path).unwrap();
        let off = Register::Dout0Set.offset();
        assert_eq!(&bytes[off..off + 4], &[0x78, 0x56, 0x34, 0x12]);
        std::fs::remove_file(&path).unwrap();
    }
}
