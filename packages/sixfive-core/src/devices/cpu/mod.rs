pub mod cpu;
pub mod opcodes;
pub mod structs;
pub mod utils;

pub use cpu::{Cpu6502, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};
pub use structs::{AddressingMode, CpuError, CpuState, Instruction, Status};
