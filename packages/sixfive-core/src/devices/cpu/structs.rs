use thiserror::Error;

use super::super::bus::MemoryError;

/// The 6502 register file.
///
/// Held internally by the interpreter, but `Copy` so it can be taken at
/// instruction boundaries to power debug formatters and assertions.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct CpuState {
    /// The accumulator
    pub acc: u8,

    /// X index register
    pub x: u8,

    /// Y index register
    pub y: u8,

    /// The stack pointer
    ///
    /// # Note
    ///
    /// Indexes into the first page ($01XX) of memory. The 6502 uses a
    /// descending stack, and S always points at the next free slot: a push
    /// writes at `$0100 | S` and then decrements S, a pull increments S and
    /// then reads.
    pub stack: u8,

    /// The program counter
    ///
    /// # Note
    ///
    /// Between instructions this always refers to the next opcode byte;
    /// there are no partially-executed instructions visible to callers.
    pub pc: u16,

    /// The program status register
    pub status: Status,

    /// Total cycles this CPU has run, for tracing and test comparison
    pub tot_cycles: u64,
}

/// The addressing mode of a decoded instruction
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum AddressingMode {
    /// Zero-page
    ZP,
    /// Zero-page indexed by X; the sum wraps within the zero page
    ZPX,
    /// Zero-page indexed by Y; the sum wraps within the zero page
    ZPY,
    /// Absolute indexed by X; may cross a page
    AbsX,
    /// Absolute indexed by Y; may cross a page
    AbsY,
    /// Indexed indirect, ($d,X): the pointer lives in the zero page
    IndX,
    /// Indirect indexed, ($d),Y: the pointer is dereferenced, then indexed
    IndY,
    /// No operand
    Impl,
    /// The operand is the accumulator, not memory
    Accum,
    /// The operand byte follows the opcode
    Imm,
    /// Signed displacement from the PC, for branches
    Rel,
    /// Indirect addressing, used only by JMP
    AbsInd,
    /// The operand bytes hold the full 16-bit address
    Abs,
}

/// The operation half of a decoded instruction
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Instruction {
    /// Add with carry (binary mode only on this CPU)
    ADC,
    /// Bitwise AND with the accumulator
    AND,
    /// Arithmetic shift left
    ASL,
    /// Bit test: Z from A & M, N and V straight from the operand
    BIT,

    //region Branches
    /// Branch on plus (N clear)
    BPL,
    /// Branch on minus (N set)
    BMI,
    /// Branch on overflow clear
    BVC,
    /// Branch on overflow set
    BVS,
    /// Branch on carry clear
    BCC,
    /// Branch on carry set
    BCS,
    /// Branch on not equal (Z clear)
    BNE,
    /// Branch on equal (Z set)
    BEQ,
    //endregion
    /// Software interrupt through the IRQ/BRK vector
    BRK,
    /// Compare with the accumulator
    CMP,
    /// Compare with X
    CPX,
    /// Compare with Y
    CPY,
    /// Decrement memory
    DEC,
    /// Bitwise exclusive OR with the accumulator
    EOR,

    //region Flag operations
    /// Clear carry
    CLC,
    /// Set carry
    SEC,
    /// Clear interrupt disable
    CLI,
    /// Set interrupt disable
    SEI,
    /// Clear overflow
    CLV,
    /// Clear decimal
    CLD,
    /// Set decimal (a bit only; arithmetic stays binary)
    SED,
    //endregion
    /// Increment memory
    INC,
    /// Jump
    JMP,
    /// Jump to subroutine
    JSR,
    /// Load the accumulator
    LDA,
    /// Load X
    LDX,
    /// Load Y
    LDY,
    /// Logical shift right
    LSR,
    /// No operation
    NOP,
    /// Bitwise OR with the accumulator
    ORA,

    //region Register transfers
    /// Transfer A to X
    TAX,
    /// Transfer X to A
    TXA,
    /// Decrement X
    DEX,
    /// Increment X
    INX,
    /// Transfer A to Y
    TAY,
    /// Transfer Y to A
    TYA,
    /// Decrement Y
    DEY,
    /// Increment Y
    INY,
    //endregion

    //region Rotations
    /// Rotate left through carry
    ROL,
    /// Rotate right through carry
    ROR,
    //endregion

    //region Returns
    /// Return from interrupt (pulls P, then PC; no +1)
    RTI,
    /// Return from subroutine (pulls PC, then adds 1)
    RTS,
    //endregion
    /// Subtract with carry (ADC of the one's complement)
    SBC,

    //region Stores
    /// Store the accumulator
    STA,
    /// Store X
    STX,
    /// Store Y
    STY,
    //endregion

    //region Stack operations
    /// Transfer X to the stack pointer (no flags)
    TXS,
    /// Transfer the stack pointer to X
    TSX,
    /// Push the accumulator
    PHA,
    /// Pull the accumulator
    PLA,
    /// Push the status byte, with B and U forced on in the pushed copy
    PHP,
    /// Pull the status byte, ignoring B and U from the stack
    PLP,
    //endregion
}

bitflags! {
    pub struct Status: u8 {
        const CARRY = 0x01;
        const ZERO = 0x02;
        const IRQ_DISABLE = 0x04;
        const DECIMAL = 0x08;
        const BREAK = 0x10;
        const UNUSED = 0x20;
        const OVERFLOW = 0x40;
        const NEGATIVE = 0x80;
    }
}

/// Register file at power-on
///
/// cf. http://wiki.nesdev.com/w/index.php/CPU_power_up_state
pub const POWERON_CPU_STATE: CpuState = CpuState {
    acc: 0,
    x: 0,
    y: 0,
    stack: 0xFD,
    pc: 0,
    status: Status::from_bits_truncate(0x24),
    tot_cycles: 0,
};

/// Failures surfaced by the interpreter.
///
/// Both kinds abort the current instruction; nothing is retried or
/// recovered internally.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    /// The fetched byte has no populated entry in the decode table.
    ///
    /// `pc` is the program counter after the fetch, one past the offending
    /// byte.
    #[error("illegal opcode {opcode:#04X}, PC stopped at {pc:#06X}")]
    IllegalOpcode { opcode: u8, pc: u16 },

    /// The memory collaborator refused a read or write
    #[error(transparent)]
    Memory(#[from] MemoryError),
}
