//! The 6502 decode table.
//!
//! A dense array of 256 entries indexed by opcode byte, written out in the
//! classic row-of-16 matrix order. Cells with no documented instruction
//! stay `None`: fetching one is an [`IllegalOpcode`] failure, never a
//! quiet NOP.
//!
//! [`IllegalOpcode`]: super::structs::CpuError::IllegalOpcode

use super::structs::{AddressingMode, Instruction};

/// One populated cell of the decode table: everything `step` needs short
/// of the operand itself.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Opcode {
    /// Three-letter assembler mnemonic, for tracing
    pub mnemonic: &'static str,
    /// The operation to execute
    pub instr: Instruction,
    /// How the bytes after the opcode are interpreted
    pub mode: AddressingMode,
    /// Instruction length in bytes, including the opcode
    pub bytes: u8,
    /// Base cycle count, before branch and page-cross penalties
    pub cycles: u32,
}

/// The decode table, indexed by opcode byte
pub static OPCODE_TABLE: [Option<Opcode>; 256] = build_table();

/// Look up an opcode byte; `None` marks an undocumented instruction
pub fn decode(opcode: u8) -> Option<Opcode> {
    OPCODE_TABLE[opcode as usize]
}

/// The assembler mnemonic for an opcode byte, or `"???"` for bytes with no
/// documented instruction
pub fn mnemonic(opcode: u8) -> &'static str {
    match OPCODE_TABLE[opcode as usize] {
        Some(entry) => entry.mnemonic,
        None => "???",
    }
}

const fn op(
    mnemonic: &'static str,
    instr: Instruction,
    mode: AddressingMode,
    bytes: u8,
    cycles: u32,
) -> Option<Opcode> {
    Some(Opcode {
        mnemonic,
        instr,
        mode,
        bytes,
        cycles,
    })
}

const fn build_table() -> [Option<Opcode>; 256] {
    use AddressingMode::*;
    use Instruction::*;

    let mut t: [Option<Opcode>; 256] = [None; 256];

    // 0x0_
    t[0x00] = op("BRK", BRK, Impl, 1, 7);
    t[0x01] = op("ORA", ORA, IndX, 2, 6);
    t[0x05] = op("ORA", ORA, ZP, 2, 3);
    t[0x06] = op("ASL", ASL, ZP, 2, 5);
    t[0x08] = op("PHP", PHP, Impl, 1, 3);
    t[0x09] = op("ORA", ORA, Imm, 2, 2);
    t[0x0A] = op("ASL", ASL, Accum, 1, 2);
    t[0x0D] = op("ORA", ORA, Abs, 3, 4);
    t[0x0E] = op("ASL", ASL, Abs, 3, 6);

    // 0x1_
    t[0x10] = op("BPL", BPL, Rel, 2, 2);
    t[0x11] = op("ORA", ORA, IndY, 2, 5);
    t[0x15] = op("ORA", ORA, ZPX, 2, 4);
    t[0x16] = op("ASL", ASL, ZPX, 2, 6);
    t[0x18] = op("CLC", CLC, Impl, 1, 2);
    t[0x19] = op("ORA", ORA, AbsY, 3, 4);
    t[0x1D] = op("ORA", ORA, AbsX, 3, 4);
    t[0x1E] = op("ASL", ASL, AbsX, 3, 7);

    // 0x2_
    t[0x20] = op("JSR", JSR, Abs, 3, 6);
    t[0x21] = op("AND", AND, IndX, 2, 6);
    t[0x24] = op("BIT", BIT, ZP, 2, 3);
    t[0x25] = op("AND", AND, ZP, 2, 3);
    t[0x26] = op("ROL", ROL, ZP, 2, 5);
    t[0x28] = op("PLP", PLP, Impl, 1, 4);
    t[0x29] = op("AND", AND, Imm, 2, 2);
    t[0x2A] = op("ROL", ROL, Accum, 1, 2);
    t[0x2C] = op("BIT", BIT, Abs, 3, 4);
    t[0x2D] = op("AND", AND, Abs, 3, 4);
    t[0x2E] = op("ROL", ROL, Abs, 3, 6);

    // 0x3_
    t[0x30] = op("BMI", BMI, Rel, 2, 2);
    t[0x31] = op("AND", AND, IndY, 2, 5);
    t[0x35] = op("AND", AND, ZPX, 2, 4);
    t[0x36] = op("ROL", ROL, ZPX, 2, 6);
    t[0x38] = op("SEC", SEC, Impl, 1, 2);
    t[0x39] = op("AND", AND, AbsY, 3, 4);
    t[0x3D] = op("AND", AND, AbsX, 3, 4);
    t[0x3E] = op("ROL", ROL, AbsX, 3, 7);

    // 0x4_
    t[0x40] = op("RTI", RTI, Impl, 1, 6);
    t[0x41] = op("EOR", EOR, IndX, 2, 6);
    t[0x45] = op("EOR", EOR, ZP, 2, 3);
    t[0x46] = op("LSR", LSR, ZP, 2, 5);
    t[0x48] = op("PHA", PHA, Impl, 1, 3);
    t[0x49] = op("EOR", EOR, Imm, 2, 2);
    t[0x4A] = op("LSR", LSR, Accum, 1, 2);
    t[0x4C] = op("JMP", JMP, Abs, 3, 3);
    t[0x4D] = op("EOR", EOR, Abs, 3, 4);
    t[0x4E] = op("LSR", LSR, Abs, 3, 6);

    // 0x5_
    t[0x50] = op("BVC", BVC, Rel, 2, 2);
    t[0x51] = op("EOR", EOR, IndY, 2, 5);
    t[0x55] = op("EOR", EOR, ZPX, 2, 4);
    t[0x56] = op("LSR", LSR, ZPX, 2, 6);
    t[0x58] = op("CLI", CLI, Impl, 1, 2);
    t[0x59] = op("EOR", EOR, AbsY, 3, 4);
    t[0x5D] = op("EOR", EOR, AbsX, 3, 4);
    t[0x5E] = op("LSR", LSR, AbsX, 3, 7);

    // 0x6_
    t[0x60] = op("RTS", RTS, Impl, 1, 6);
    t[0x61] = op("ADC", ADC, IndX, 2, 6);
    t[0x65] = op("ADC", ADC, ZP, 2, 3);
    t[0x66] = op("ROR", ROR, ZP, 2, 5);
    t[0x68] = op("PLA", PLA, Impl, 1, 4);
    t[0x69] = op("ADC", ADC, Imm, 2, 2);
    t[0x6A] = op("ROR", ROR, Accum, 1, 2);
    t[0x6C] = op("JMP", JMP, AbsInd, 3, 5);
    t[0x6D] = op("ADC", ADC, Abs, 3, 4);
    t[0x6E] = op("ROR", ROR, Abs, 3, 6);

    // 0x7_
    t[0x70] = op("BVS", BVS, Rel, 2, 2);
    t[0x71] = op("ADC", ADC, IndY, 2, 5);
    t[0x75] = op("ADC", ADC, ZPX, 2, 4);
    t[0x76] = op("ROR", ROR, ZPX, 2, 6);
    t[0x78] = op("SEI", SEI, Impl, 1, 2);
    t[0x79] = op("ADC", ADC, AbsY, 3, 4);
    t[0x7D] = op("ADC", ADC, AbsX, 3, 4);
    t[0x7E] = op("ROR", ROR, AbsX, 3, 7);

    // 0x8_
    t[0x81] = op("STA", STA, IndX, 2, 6);
    t[0x84] = op("STY", STY, ZP, 2, 3);
    t[0x85] = op("STA", STA, ZP, 2, 3);
    t[0x86] = op("STX", STX, ZP, 2, 3);
    t[0x88] = op("DEY", DEY, Impl, 1, 2);
    t[0x8A] = op("TXA", TXA, Impl, 1, 2);
    t[0x8C] = op("STY", STY, Abs, 3, 4);
    t[0x8D] = op("STA", STA, Abs, 3, 4);
    t[0x8E] = op("STX", STX, Abs, 3, 4);

    // 0x9_
    t[0x90] = op("BCC", BCC, Rel, 2, 2);
    t[0x91] = op("STA", STA, IndY, 2, 6);
    t[0x94] = op("STY", STY, ZPX, 2, 4);
    t[0x95] = op("STA", STA, ZPX, 2, 4);
    t[0x96] = op("STX", STX, ZPY, 2, 4);
    t[0x98] = op("TYA", TYA, Impl, 1, 2);
    t[0x99] = op("STA", STA, AbsY, 3, 5);
    t[0x9A] = op("TXS", TXS, Impl, 1, 2);
    t[0x9D] = op("STA", STA, AbsX, 3, 5);

    // 0xA_
    t[0xA0] = op("LDY", LDY, Imm, 2, 2);
    t[0xA1] = op("LDA", LDA, IndX, 2, 6);
    t[0xA2] = op("LDX", LDX, Imm, 2, 2);
    t[0xA4] = op("LDY", LDY, ZP, 2, 3);
    t[0xA5] = op("LDA", LDA, ZP, 2, 3);
    t[0xA6] = op("LDX", LDX, ZP, 2, 3);
    t[0xA8] = op("TAY", TAY, Impl, 1, 2);
    t[0xA9] = op("LDA", LDA, Imm, 2, 2);
    t[0xAA] = op("TAX", TAX, Impl, 1, 2);
    t[0xAC] = op("LDY", LDY, Abs, 3, 4);
    t[0xAD] = op("LDA", LDA, Abs, 3, 4);
    t[0xAE] = op("LDX", LDX, Abs, 3, 4);

    // 0xB_
    t[0xB0] = op("BCS", BCS, Rel, 2, 2);
    t[0xB1] = op("LDA", LDA, IndY, 2, 5);
    t[0xB4] = op("LDY", LDY, ZPX, 2, 4);
    t[0xB5] = op("LDA", LDA, ZPX, 2, 4);
    t[0xB6] = op("LDX", LDX, ZPY, 2, 4);
    t[0xB8] = op("CLV", CLV, Impl, 1, 2);
    t[0xB9] = op("LDA", LDA, AbsY, 3, 4);
    t[0xBA] = op("TSX", TSX, Impl, 1, 2);
    t[0xBC] = op("LDY", LDY, AbsX, 3, 4);
    t[0xBD] = op("LDA", LDA, AbsX, 3, 4);
    t[0xBE] = op("LDX", LDX, AbsY, 3, 4);

    // 0xC_
    t[0xC0] = op("CPY", CPY, Imm, 2, 2);
    t[0xC1] = op("CMP", CMP, IndX, 2, 6);
    t[0xC4] = op("CPY", CPY, ZP, 2, 3);
    t[0xC5] = op("CMP", CMP, ZP, 2, 3);
    t[0xC6] = op("DEC", DEC, ZP, 2, 5);
    t[0xC8] = op("INY", INY, Impl, 1, 2);
    t[0xC9] = op("CMP", CMP, Imm, 2, 2);
    t[0xCA] = op("DEX", DEX, Impl, 1, 2);
    t[0xCC] = op("CPY", CPY, Abs, 3, 4);
    t[0xCD] = op("CMP", CMP, Abs, 3, 4);
    t[0xCE] = op("DEC", DEC, Abs, 3, 6);

    // 0xD_
    t[0xD0] = op("BNE", BNE, Rel, 2, 2);
    t[0xD1] = op("CMP", CMP, IndY, 2, 5);
    t[0xD5] = op("CMP", CMP, ZPX, 2, 4);
    t[0xD6] = op("DEC", DEC, ZPX, 2, 6);
    t[0xD8] = op("CLD", CLD, Impl, 1, 2);
    t[0xD9] = op("CMP", CMP, AbsY, 3, 4);
    t[0xDD] = op("CMP", CMP, AbsX, 3, 4);
    t[0xDE] = op("DEC", DEC, AbsX, 3, 7);

    // 0xE_
    t[0xE0] = op("CPX", CPX, Imm, 2, 2);
    t[0xE1] = op("SBC", SBC, IndX, 2, 6);
    t[0xE4] = op("CPX", CPX, ZP, 2, 3);
    t[0xE5] = op("SBC", SBC, ZP, 2, 3);
    t[0xE6] = op("INC", INC, ZP, 2, 5);
    t[0xE8] = op("INX", INX, Impl, 1, 2);
    t[0xE9] = op("SBC", SBC, Imm, 2, 2);
    t[0xEA] = op("NOP", NOP, Impl, 1, 2);
    t[0xEC] = op("CPX", CPX, Abs, 3, 4);
    t[0xED] = op("SBC", SBC, Abs, 3, 4);
    t[0xEE] = op("INC", INC, Abs, 3, 6);

    // 0xF_
    t[0xF0] = op("BEQ", BEQ, Rel, 2, 2);
    t[0xF1] = op("SBC", SBC, IndY, 2, 5);
    t[0xF5] = op("SBC", SBC, ZPX, 2, 4);
    t[0xF6] = op("INC", INC, ZPX, 2, 6);
    t[0xF8] = op("SED", SED, Impl, 1, 2);
    t[0xF9] = op("SBC", SBC, AbsY, 3, 4);
    t[0xFD] = op("SBC", SBC, AbsX, 3, 4);
    t[0xFE] = op("INC", INC, AbsX, 3, 7);

    t
}
