//! Debug helpers for the interpreter

use super::super::bus::Memory;
use super::cpu::Cpu6502;
use super::opcodes;
use super::structs::AddressingMode;

/// Byte rendered for cells the device cannot read deterministically
const UNREADABLE: u8 = 0xA5;

/// Format a one-line trace of the instruction at the current PC, in the
/// style of the classic emulator comparison logs:
///
/// ```text
/// C000  4C F5 C5  JMP $C5F5       A:00 X:00 Y:00 P:24 SP:FD CYC:7
/// ```
///
/// All reads go through [`Memory::peek`], so tracing never disturbs the
/// machine being traced.
pub fn trace_line<M: Memory>(cpu: &Cpu6502<M>) -> String {
    let state = cpu.state();
    let pc = state.pc;
    let peek = |addr: u16| cpu.mem().peek(addr).unwrap_or(UNREADABLE);

    let opcode = peek(pc);
    let op1 = peek(pc.wrapping_add(1));
    let op2 = peek(pc.wrapping_add(2));

    let (raw, disasm) = match opcodes::decode(opcode) {
        None => (
            format!("{:02X}      ", opcode),
            String::from(opcodes::mnemonic(opcode)),
        ),
        Some(entry) => {
            let raw = match entry.bytes {
                1 => format!("{:02X}      ", opcode),
                2 => format!("{:02X} {:02X}   ", opcode, op1),
                _ => format!("{:02X} {:02X} {:02X}", opcode, op1, op2),
            };
            let abs = u16::from_le_bytes([op1, op2]);
            let operand = match entry.mode {
                AddressingMode::Impl => String::new(),
                AddressingMode::Accum => String::from(" A"),
                AddressingMode::Imm => format!(" #${:02X}", op1),
                AddressingMode::ZP => format!(" ${:02X}", op1),
                AddressingMode::ZPX => format!(" ${:02X},X", op1),
                AddressingMode::ZPY => format!(" ${:02X},Y", op1),
                AddressingMode::Abs => format!(" ${:04X}", abs),
                AddressingMode::AbsX => format!(" ${:04X},X", abs),
                AddressingMode::AbsY => format!(" ${:04X},Y", abs),
                AddressingMode::AbsInd => format!(" (${:04X})", abs),
                AddressingMode::IndX => format!(" (${:02X},X)", op1),
                AddressingMode::IndY => format!(" (${:02X}),Y", op1),
                AddressingMode::Rel => {
                    let target = pc.wrapping_add(2).wrapping_add(op1 as i8 as u16);
                    format!(" ${:04X}", target)
                }
            };
            (raw, format!("{}{}", entry.mnemonic, operand))
        }
    };

    format!(
        "{:04X}  {}  {:<14} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
        pc,
        raw,
        disasm,
        state.acc,
        state.x,
        state.y,
        state.status.bits(),
        state.stack,
        state.tot_cycles
    )
}
