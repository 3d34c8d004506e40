//! Instruction-level interpreter for the MOS 6502.
//!
//! The crate models the Ricoh 2A03 flavor of the processor: the decimal
//! flag exists as a settable bit but never affects arithmetic, and
//! undocumented opcodes are not implemented. One `step` resolves a whole
//! instruction and reports its cycle cost; there is no sub-instruction
//! timing.

#[macro_use]
extern crate bitflags;

pub mod bindings;
pub mod devices;
