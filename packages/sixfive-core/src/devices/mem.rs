//! Module for memory devices, such as RAM

use super::bus::{Memory, MemoryError};

/// A flat 64 KiB RAM covering the whole address space.
///
/// Every cell is readable and writable, so this device never faults; it is
/// what test harnesses and the wasm front-end run programs against.
pub struct Ram {
    buf: Vec<u8>,
}

impl Memory for Ram {
    fn read(&mut self, addr: u16) -> Result<u8, MemoryError> {
        Ok(self.buf[addr as usize])
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        Some(self.buf[addr as usize])
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), MemoryError> {
        self.buf[addr as usize] = value;
        Ok(())
    }
}

impl Ram {
    pub fn new() -> Ram {
        Ram {
            buf: vec![0u8; 0x1_0000],
        }
    }

    /// Copy a program image into memory starting at `base`, wrapping at the
    /// top of the address space.
    pub fn load(&mut self, base: u16, bytes: &[u8]) {
        for (i, byte) in bytes.iter().enumerate() {
            let addr = base.wrapping_add(i as u16);
            self.buf[addr as usize] = *byte;
        }
    }
}

impl Default for Ram {
    fn default() -> Ram {
        Ram::new()
    }
}
