use thiserror::Error;

/// Faults a memory device may raise.
///
/// The interpreter never checks addresses itself; these only come from
/// collaborators that model unmapped or read-only regions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// No device responds at the address
    #[error("no device mapped at {0:#06X}")]
    Unmapped(u16),
    /// The address is mapped but rejects writes
    #[error("write to read-only address {0:#06X}")]
    ReadOnly(u16),
}

/// Trait for a device backing the CPU's 16-bit address space
pub trait Memory {
    /// Read the cell at the given address, triggering any side-effects the
    /// device models
    fn read(&mut self, addr: u16) -> Result<u8, MemoryError>;

    /// Attempt to read deterministically and without side-effects
    ///
    /// Returns `None` when such a read is not possible (open-bus cells, I/O
    /// ports that change state when read). Used by trace formatters only;
    /// execution always goes through [`Memory::read`].
    fn peek(&self, addr: u16) -> Option<u8>;

    /// Write to the cell at the given address
    fn write(&mut self, addr: u16, value: u8) -> Result<(), MemoryError>;
}

// A parent harness keeps ownership of the device and lends the interpreter
// a mutable borrow for its lifetime.
impl<M: Memory + ?Sized> Memory for &mut M {
    fn read(&mut self, addr: u16) -> Result<u8, MemoryError> {
        (**self).read(addr)
    }

    fn peek(&self, addr: u16) -> Option<u8> {
        (**self).peek(addr)
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), MemoryError> {
        (**self).write(addr, value)
    }
}
