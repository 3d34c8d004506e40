//! Interpreter for the MOS 6502
//!
//! This is the Ricoh 2A03 flavor of the processor: the decimal flag is a
//! real, settable bit, but ADC and SBC always run in binary mode.
//! Undocumented opcodes are not implemented; executing one is an error,
//! not a NOP.

use log::warn;

use super::super::bus::Memory;
use super::opcodes::{self, Opcode};
use super::structs::{
    AddressingMode, CpuError, CpuState, Instruction, Status, POWERON_CPU_STATE,
};

/// Vector consulted by `reset`
pub const RESET_VECTOR: u16 = 0xFFFC;
/// Vector consulted by `nmi`
pub const NMI_VECTOR: u16 = 0xFFFA;
/// Vector consulted by `irq` and by BRK
pub const IRQ_VECTOR: u16 = 0xFFFE;

const STACK_PAGE: u16 = 0x0100;

/// Cycles consumed by reset and by interrupt entry
const INTERRUPT_CYCLES: u32 = 7;

/// The per-instruction addressing workspace.
///
/// Recomputed by `resolve` for every instruction. `crossed_page` feeds the
/// cycle accounting in `step` (and, for Relative mode, the taken-branch
/// penalty), so it is judged against the mode's own base: the unindexed
/// address for the absolute and indirect indexed modes, the post-operand
/// PC for branches.
#[derive(Debug, Copy, Clone)]
struct Operand {
    addr: u16,
    crossed_page: bool,
}

/// Whether two addresses sit on different 256-byte pages
fn crossed(base: u16, addr: u16) -> bool {
    base & 0xFF00 != addr & 0xFF00
}

/// The ops that pay an extra cycle when an indexed mode crosses a page.
///
/// Stores and read-modify-writes always pay the full indexed cost in their
/// base cycle count, so they are absent here.
fn page_cross_penalty(instr: Instruction, mode: AddressingMode) -> bool {
    use AddressingMode::*;
    use Instruction::*;
    matches!(mode, AbsX | AbsY | IndY)
        && matches!(instr, ADC | AND | CMP | EOR | LDA | LDX | LDY | ORA | SBC)
}

/// A MOS 6502 wired to a memory device.
///
/// The interpreter owns the register file outright and holds the memory
/// collaborator for its own lifetime. A parent harness that wants to keep
/// the device can hand in `&mut M` instead of `M`; the blanket impl on
/// mutable references makes both spellings work.
pub struct Cpu6502<M: Memory> {
    mem: M,
    state: CpuState,
}

impl<M: Memory> Cpu6502<M> {
    /// Create a new CPU around a memory device.
    ///
    /// The register file starts in the power-on state with PC at 0; call
    /// [`reset`](Cpu6502::reset) before stepping so the PC is loaded from
    /// the reset vector.
    pub fn new(mem: M) -> Cpu6502<M> {
        Cpu6502 {
            mem,
            state: POWERON_CPU_STATE,
        }
    }

    /// A copy of the register file, for tracing and tests
    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    pub fn stack_ptr(&self) -> u8 {
        self.state.stack
    }

    pub fn acc(&self) -> u8 {
        self.state.acc
    }

    pub fn x(&self) -> u8 {
        self.state.x
    }

    pub fn y(&self) -> u8 {
        self.state.y
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn total_cycles(&self) -> u64 {
        self.state.tot_cycles
    }

    /// Move the PC, for harnesses that enter a program somewhere other
    /// than through the reset vector
    pub fn set_pc(&mut self, addr: u16) {
        self.state.pc = addr;
    }

    pub fn mem(&self) -> &M {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut M {
        &mut self.mem
    }

    /// Hardware reset: force the register file to its power-on state and
    /// load the PC from the reset vector. Returns the cycles consumed.
    pub fn reset(&mut self) -> Result<u32, CpuError> {
        let pc = self.read_addr(RESET_VECTOR)?;
        self.state = CpuState {
            pc,
            tot_cycles: self.state.tot_cycles + u64::from(INTERRUPT_CYCLES),
            ..POWERON_CPU_STATE
        };
        Ok(INTERRUPT_CYCLES)
    }

    /// Service a non-maskable interrupt. Always taken.
    pub fn nmi(&mut self) -> Result<u32, CpuError> {
        self.interrupt(NMI_VECTOR)
    }

    /// Service a maskable interrupt request.
    ///
    /// Ignored while the I flag is set; an ignored request costs no cycles
    /// and changes no state.
    pub fn irq(&mut self) -> Result<u32, CpuError> {
        if self.state.status.contains(Status::IRQ_DISABLE) {
            return Ok(0);
        }
        self.interrupt(IRQ_VECTOR)
    }

    fn interrupt(&mut self, vector: u16) -> Result<u32, CpuError> {
        let [lo, hi] = self.state.pc.to_le_bytes();
        self.push(hi)?;
        self.push(lo)?;
        // hardware interrupts push B clear; only BRK pushes it set
        let pushed = (self.state.status | Status::UNUSED) - Status::BREAK;
        self.push(pushed.bits())?;
        self.state.status.insert(Status::IRQ_DISABLE);
        self.state.pc = self.read_addr(vector)?;
        self.state.tot_cycles += u64::from(INTERRUPT_CYCLES);
        Ok(INTERRUPT_CYCLES)
    }

    /// Fetch, decode, and execute one instruction, returning the cycles it
    /// consumed: the table's base count, plus one for a taken branch, plus
    /// one more for a branch or indexed read that crosses a page.
    ///
    /// On an illegal opcode the PC is left one past the offending byte and
    /// nothing else changes. A memory fault aborts mid-instruction; the
    /// register file keeps whatever updates happened before the fault.
    pub fn step(&mut self) -> Result<u32, CpuError> {
        let opcode = self.mem.read(self.state.pc)?;
        self.state.pc = self.state.pc.wrapping_add(1);
        let entry = opcodes::decode(opcode).ok_or(CpuError::IllegalOpcode {
            opcode,
            pc: self.state.pc,
        })?;

        let operand = self.resolve(entry.mode)?;
        let branch_cycles = self.execute(entry, operand)?;

        let mut cycles = entry.cycles + branch_cycles;
        if operand.crossed_page && page_cross_penalty(entry.instr, entry.mode) {
            cycles += 1;
        }
        self.state.tot_cycles += u64::from(cycles);
        Ok(cycles)
    }

    /// Resolve an addressing mode into an effective address, advancing the
    /// PC over the operand bytes
    fn resolve(&mut self, mode: AddressingMode) -> Result<Operand, CpuError> {
        use AddressingMode::*;
        let operand = match mode {
            Impl | Accum => Operand {
                addr: 0,
                crossed_page: false,
            },
            Imm => {
                let addr = self.state.pc;
                self.state.pc = self.state.pc.wrapping_add(1);
                Operand {
                    addr,
                    crossed_page: false,
                }
            }
            ZP => Operand {
                addr: u16::from(self.next_byte()?),
                crossed_page: false,
            },
            ZPX => {
                // indexing never carries out of the zero page
                let base = self.next_byte()?;
                Operand {
                    addr: u16::from(base.wrapping_add(self.state.x)),
                    crossed_page: false,
                }
            }
            ZPY => {
                let base = self.next_byte()?;
                Operand {
                    addr: u16::from(base.wrapping_add(self.state.y)),
                    crossed_page: false,
                }
            }
            Abs => Operand {
                addr: self.next_addr()?,
                crossed_page: false,
            },
            AbsX => {
                let base = self.next_addr()?;
                let addr = base.wrapping_add(u16::from(self.state.x));
                Operand {
                    addr,
                    crossed_page: crossed(base, addr),
                }
            }
            AbsY => {
                let base = self.next_addr()?;
                let addr = base.wrapping_add(u16::from(self.state.y));
                Operand {
                    addr,
                    crossed_page: crossed(base, addr),
                }
            }
            AbsInd => {
                let ptr = self.next_addr()?;
                Operand {
                    addr: self.read_addr_wrapped(ptr)?,
                    crossed_page: false,
                }
            }
            IndX => {
                let ptr = self.next_byte()?.wrapping_add(self.state.x);
                let lo = self.mem.read(u16::from(ptr))?;
                let hi = self.mem.read(u16::from(ptr.wrapping_add(1)))?;
                Operand {
                    addr: u16::from_le_bytes([lo, hi]),
                    crossed_page: false,
                }
            }
            IndY => {
                let ptr = self.next_byte()?;
                let lo = self.mem.read(u16::from(ptr))?;
                let hi = self.mem.read(u16::from(ptr.wrapping_add(1)))?;
                let base = u16::from_le_bytes([lo, hi]);
                let addr = base.wrapping_add(u16::from(self.state.y));
                Operand {
                    addr,
                    crossed_page: crossed(base, addr),
                }
            }
            Rel => {
                let disp = self.next_byte()? as i8;
                // the displacement is relative to the PC after the operand
                let addr = self.state.pc.wrapping_add(disp as u16);
                Operand {
                    addr,
                    crossed_page: crossed(self.state.pc, addr),
                }
            }
        };
        Ok(operand)
    }

    fn next_byte(&mut self) -> Result<u8, CpuError> {
        let value = self.mem.read(self.state.pc)?;
        self.state.pc = self.state.pc.wrapping_add(1);
        Ok(value)
    }

    fn next_addr(&mut self) -> Result<u16, CpuError> {
        let lo = self.next_byte()?;
        let hi = self.next_byte()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Read a little-endian address from two consecutive cells
    fn read_addr(&mut self, addr: u16) -> Result<u16, CpuError> {
        let lo = self.mem.read(addr)?;
        let hi = self.mem.read(addr.wrapping_add(1))?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Read a little-endian address through a pointer, reproducing the
    /// hardware defect in indirect JMP: when the pointer sits at the end
    /// of a page ($xxFF), the high byte comes from the start of that same
    /// page, not from the next one.
    fn read_addr_wrapped(&mut self, ptr: u16) -> Result<u16, CpuError> {
        let lo = self.mem.read(ptr)?;
        let hi_ptr = if ptr & 0x00FF == 0x00FF {
            ptr & 0xFF00
        } else {
            ptr.wrapping_add(1)
        };
        let hi = self.mem.read(hi_ptr)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Load the operand value: the accumulator in Accumulator mode, memory
    /// otherwise. Immediate mode reads the byte the mode already addressed.
    fn fetch(&mut self, mode: AddressingMode, operand: Operand) -> Result<u8, CpuError> {
        match mode {
            AddressingMode::Accum => Ok(self.state.acc),
            _ => Ok(self.mem.read(operand.addr)?),
        }
    }

    /// Run one decoded instruction. Returns the taken-branch cycle penalty
    /// (zero for everything that is not a branch); all other cycle costs
    /// are settled by `step`.
    fn execute(&mut self, entry: Opcode, operand: Operand) -> Result<u32, CpuError> {
        use Instruction::*;
        let mode = entry.mode;
        let addr = operand.addr;
        match entry.instr {
            //region Arithmetic
            ADC => {
                let value = self.fetch(mode, operand)?;
                self.adc(value);
            }
            // subtraction is addition of the one's complement
            SBC => {
                let value = self.fetch(mode, operand)?;
                self.adc(value ^ 0xFF);
            }
            //endregion

            //region Bitwise
            AND => {
                let value = self.fetch(mode, operand)?;
                self.state.acc &= value;
                self.set_zn(self.state.acc);
            }
            ORA => {
                let value = self.fetch(mode, operand)?;
                self.state.acc |= value;
                self.set_zn(self.state.acc);
            }
            EOR => {
                let value = self.fetch(mode, operand)?;
                self.state.acc ^= value;
                self.set_zn(self.state.acc);
            }
            BIT => {
                let value = self.fetch(mode, operand)?;
                self.state.status.set(Status::ZERO, self.state.acc & value == 0);
                self.state.status.set(Status::NEGATIVE, value & 0x80 != 0);
                self.state.status.set(Status::OVERFLOW, value & 0x40 != 0);
            }
            //endregion

            //region Shifts and rotates
            ASL => self.rmw(mode, addr, |cpu, input| {
                cpu.state.status.set(Status::CARRY, input & 0x80 != 0);
                input << 1
            })?,
            LSR => self.rmw(mode, addr, |cpu, input| {
                cpu.state.status.set(Status::CARRY, input & 0x01 != 0);
                input >> 1
            })?,
            ROL => self.rmw(mode, addr, |cpu, input| {
                let carry_in = cpu.state.status.contains(Status::CARRY) as u8;
                cpu.state.status.set(Status::CARRY, input & 0x80 != 0);
                (input << 1) | carry_in
            })?,
            ROR => self.rmw(mode, addr, |cpu, input| {
                let carry_in = cpu.state.status.contains(Status::CARRY) as u8;
                cpu.state.status.set(Status::CARRY, input & 0x01 != 0);
                (carry_in << 7) | (input >> 1)
            })?,
            //endregion

            //region Increments and decrements
            INC => self.rmw(mode, addr, |_, input| input.wrapping_add(1))?,
            DEC => self.rmw(mode, addr, |_, input| input.wrapping_sub(1))?,
            INX => {
                self.state.x = self.state.x.wrapping_add(1);
                self.set_zn(self.state.x);
            }
            DEX => {
                self.state.x = self.state.x.wrapping_sub(1);
                self.set_zn(self.state.x);
            }
            INY => {
                self.state.y = self.state.y.wrapping_add(1);
                self.set_zn(self.state.y);
            }
            DEY => {
                self.state.y = self.state.y.wrapping_sub(1);
                self.set_zn(self.state.y);
            }
            //endregion

            //region Compares
            CMP => {
                let value = self.fetch(mode, operand)?;
                self.compare(self.state.acc, value);
            }
            CPX => {
                let value = self.fetch(mode, operand)?;
                self.compare(self.state.x, value);
            }
            CPY => {
                let value = self.fetch(mode, operand)?;
                self.compare(self.state.y, value);
            }
            //endregion

            //region Loads and stores
            LDA => {
                let value = self.fetch(mode, operand)?;
                self.state.acc = value;
                self.set_zn(value);
            }
            LDX => {
                let value = self.fetch(mode, operand)?;
                self.state.x = value;
                self.set_zn(value);
            }
            LDY => {
                let value = self.fetch(mode, operand)?;
                self.state.y = value;
                self.set_zn(value);
            }
            STA => self.mem.write(addr, self.state.acc)?,
            STX => self.mem.write(addr, self.state.x)?,
            STY => self.mem.write(addr, self.state.y)?,
            //endregion

            //region Register transfers
            TAX => {
                self.state.x = self.state.acc;
                self.set_zn(self.state.x);
            }
            TAY => {
                self.state.y = self.state.acc;
                self.set_zn(self.state.y);
            }
            TXA => {
                self.state.acc = self.state.x;
                self.set_zn(self.state.acc);
            }
            TYA => {
                self.state.acc = self.state.y;
                self.set_zn(self.state.acc);
            }
            TSX => {
                self.state.x = self.state.stack;
                self.set_zn(self.state.x);
            }
            // the one transfer that leaves the flags alone
            TXS => self.state.stack = self.state.x,
            //endregion

            //region Stack operations
            PHA => self.push(self.state.acc)?,
            PHP => {
                // the pushed copy always carries B and U
                let pushed = self.state.status | Status::BREAK | Status::UNUSED;
                self.push(pushed.bits())?;
            }
            PLA => {
                let value = self.pull()?;
                self.state.acc = value;
                self.set_zn(value);
            }
            PLP => {
                let bits = self.pull()?;
                self.set_status(bits);
            }
            //endregion

            //region Jumps and returns
            JMP => self.state.pc = addr,
            JSR => {
                // hardware pushes the address of the JSR's own last byte
                let [lo, hi] = self.state.pc.wrapping_sub(1).to_le_bytes();
                self.push(hi)?;
                self.push(lo)?;
                self.state.pc = addr;
            }
            RTS => {
                let lo = self.pull()?;
                let hi = self.pull()?;
                self.state.pc = u16::from_le_bytes([lo, hi]).wrapping_add(1);
            }
            RTI => {
                let bits = self.pull()?;
                self.set_status(bits);
                let lo = self.pull()?;
                let hi = self.pull()?;
                self.state.pc = u16::from_le_bytes([lo, hi]);
            }
            //endregion

            //region Branches
            BPL => return Ok(self.branch(!self.state.status.contains(Status::NEGATIVE), operand)),
            BMI => return Ok(self.branch(self.state.status.contains(Status::NEGATIVE), operand)),
            BVC => return Ok(self.branch(!self.state.status.contains(Status::OVERFLOW), operand)),
            BVS => return Ok(self.branch(self.state.status.contains(Status::OVERFLOW), operand)),
            BCC => return Ok(self.branch(!self.state.status.contains(Status::CARRY), operand)),
            BCS => return Ok(self.branch(self.state.status.contains(Status::CARRY), operand)),
            BNE => return Ok(self.branch(!self.state.status.contains(Status::ZERO), operand)),
            BEQ => return Ok(self.branch(self.state.status.contains(Status::ZERO), operand)),
            //endregion

            //region Flag operations
            CLC => self.state.status.remove(Status::CARRY),
            SEC => self.state.status.insert(Status::CARRY),
            CLI => self.state.status.remove(Status::IRQ_DISABLE),
            SEI => self.state.status.insert(Status::IRQ_DISABLE),
            CLV => self.state.status.remove(Status::OVERFLOW),
            CLD => self.state.status.remove(Status::DECIMAL),
            SED => self.state.status.insert(Status::DECIMAL),
            //endregion

            BRK => {
                // the byte after BRK is padding; the pushed PC skips it
                self.state.pc = self.state.pc.wrapping_add(1);
                let [lo, hi] = self.state.pc.to_le_bytes();
                self.push(hi)?;
                self.push(lo)?;
                let pushed = self.state.status | Status::BREAK | Status::UNUSED;
                self.push(pushed.bits())?;
                self.state.status.insert(Status::IRQ_DISABLE);
                self.state.pc = self.read_addr(IRQ_VECTOR)?;
            }

            NOP => {}
        }
        Ok(0)
    }

    /// Binary-mode add with carry; SBC routes through here with the
    /// operand complemented
    fn adc(&mut self, value: u8) {
        if self.state.status.contains(Status::DECIMAL) {
            // the 2A03 wires the decimal flag to nothing
            warn!("decimal flag is set, but this CPU has no BCD mode");
        }
        let acc = self.state.acc;
        let carry = u16::from(self.state.status.contains(Status::CARRY));
        let sum = u16::from(acc) + u16::from(value) + carry;
        let result = (sum & 0xFF) as u8;
        self.state.status.set(Status::CARRY, sum > 0xFF);
        self.state
            .status
            .set(Status::OVERFLOW, (!(acc ^ value) & (acc ^ result)) & 0x80 != 0);
        self.state.acc = result;
        self.set_zn(result);
    }

    fn compare(&mut self, reg: u8, value: u8) {
        self.state.status.set(Status::CARRY, reg >= value);
        self.set_zn(reg.wrapping_sub(value));
    }

    /// Shared read-modify-write path for the shifts, rotates, INC and DEC.
    /// Z and N always come from the result; `modify` is responsible for C.
    fn rmw<F>(&mut self, mode: AddressingMode, addr: u16, modify: F) -> Result<(), CpuError>
    where
        F: FnOnce(&mut Self, u8) -> u8,
    {
        let input = match mode {
            AddressingMode::Accum => self.state.acc,
            _ => self.mem.read(addr)?,
        };
        let result = modify(self, input);
        self.set_zn(result);
        match mode {
            AddressingMode::Accum => self.state.acc = result,
            _ => self.mem.write(addr, result)?,
        }
        Ok(())
    }

    /// Conditional branch: not taken costs nothing extra, taken costs one
    /// cycle, one more when the target sits on a different page than the
    /// instruction's end
    fn branch(&mut self, taken: bool, operand: Operand) -> u32 {
        if !taken {
            return 0;
        }
        self.state.pc = operand.addr;
        1 + u32::from(operand.crossed_page)
    }

    /// Push: write at `$0100 | S`, then decrement S
    fn push(&mut self, value: u8) -> Result<(), CpuError> {
        self.mem
            .write(STACK_PAGE | u16::from(self.state.stack), value)?;
        self.state.stack = self.state.stack.wrapping_sub(1);
        Ok(())
    }

    /// Pull: increment S, then read at `$0100 | S`
    fn pull(&mut self) -> Result<u8, CpuError> {
        self.state.stack = self.state.stack.wrapping_add(1);
        Ok(self.mem.read(STACK_PAGE | u16::from(self.state.stack))?)
    }

    /// Install a pulled status byte. B is not a real flag: the live
    /// register keeps B clear and U set no matter what was on the stack.
    fn set_status(&mut self, bits: u8) {
        self.state.status = (Status::from_bits_truncate(bits) - Status::BREAK) | Status::UNUSED;
    }

    fn set_zn(&mut self, value: u8) {
        self.state.status.set(Status::ZERO, value == 0);
        self.state.status.set(Status::NEGATIVE, value & 0x80 != 0);
    }
}

#[cfg(test)]
mod tests {
    use super::super::opcodes::OPCODE_TABLE;
    use super::*;
    use crate::devices::bus::MemoryError;
    use crate::devices::mem::Ram;

    fn cpu_with(org: u16, program: &[u8]) -> Cpu6502<Ram> {
        let mut ram = Ram::new();
        ram.load(org, program);
        ram.load(RESET_VECTOR, &org.to_le_bytes());
        let mut cpu = Cpu6502::new(ram);
        cpu.reset().unwrap();
        cpu
    }

    fn run(cpu: &mut Cpu6502<Ram>, instructions: usize) -> u32 {
        let mut cycles = 0;
        for _ in 0..instructions {
            cycles = cpu.step().unwrap();
        }
        cycles
    }

    #[test]
    fn reset_loads_the_vector_and_poweron_state() {
        let mut ram = Ram::new();
        ram.load(RESET_VECTOR, &[0x34, 0x12]);
        let mut cpu = Cpu6502::new(ram);
        let cycles = cpu.reset().unwrap();
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc(), 0x1234);
        assert_eq!(cpu.stack_ptr(), 0xFD);
        assert_eq!(cpu.status().bits(), 0x24);
        assert_eq!((cpu.acc(), cpu.x(), cpu.y()), (0, 0, 0));
    }

    #[test]
    fn lda_immediate_loads_and_sets_flags() {
        let mut cpu = cpu_with(0x8000, &[0xA9, 0x66, 0xA9, 0x00, 0xA9, 0x80]);
        let cycles = cpu.step().unwrap();
        assert_eq!(cpu.acc(), 0x66);
        assert_eq!(cycles, 2);
        assert!(!cpu.status().contains(Status::ZERO));
        assert!(!cpu.status().contains(Status::NEGATIVE));

        cpu.step().unwrap();
        assert!(cpu.status().contains(Status::ZERO));

        cpu.step().unwrap();
        assert!(cpu.status().contains(Status::NEGATIVE));
        assert!(!cpu.status().contains(Status::ZERO));
    }

    // the adc cases from http://www.6502.org/tutorials/vflag.html
    #[test]
    fn adc_carry_and_overflow() {
        let cases: &[(u8, u8, bool, u8, bool, bool)] = &[
            // a, value, carry_in, result, carry_out, overflow
            (0x01, 0x01, false, 0x02, false, false),
            (0x01, 0xFF, false, 0x00, true, false),
            (0x7F, 0x01, false, 0x80, false, true),
            (0x80, 0xFF, false, 0x7F, true, true),
            (0x3F, 0x40, true, 0x80, false, true),
        ];
        for &(a, value, carry_in, result, carry_out, overflow) in cases {
            let carry_op = if carry_in { 0x38 } else { 0x18 }; // SEC / CLC
            let mut cpu = cpu_with(0x8000, &[carry_op, 0xA9, a, 0x69, value]);
            run(&mut cpu, 3);
            assert_eq!(cpu.acc(), result, "A {:02X} + {:02X}", a, value);
            assert_eq!(
                cpu.status().contains(Status::CARRY),
                carry_out,
                "C after {:02X} + {:02X}",
                a,
                value
            );
            assert_eq!(
                cpu.status().contains(Status::OVERFLOW),
                overflow,
                "V after {:02X} + {:02X}",
                a,
                value
            );
        }
    }

    #[test]
    fn adc_preserves_the_nine_bit_sum() {
        for &(a, value, carry) in &[
            (0x00u8, 0x00u8, false),
            (0xFF, 0x01, false),
            (0xFF, 0xFF, true),
            (0x12, 0x34, true),
            (0x80, 0x80, false),
        ] {
            let carry_op = if carry { 0x38 } else { 0x18 };
            let mut cpu = cpu_with(0x8000, &[carry_op, 0xA9, a, 0x69, value]);
            run(&mut cpu, 3);
            let extended =
                (u16::from(cpu.status().contains(Status::CARRY)) << 8) | u16::from(cpu.acc());
            assert_eq!(extended, u16::from(a) + u16::from(value) + u16::from(carry));
        }
    }

    // and the sbc cases from the same tutorial
    #[test]
    fn sbc_carry_and_overflow() {
        let cases: &[(u8, u8, bool, u8, bool, bool)] = &[
            // a, value, carry_in, result, carry_out, overflow
            (0x33, 0x11, true, 0x22, true, false),
            (0x00, 0x01, true, 0xFF, false, false),
            (0x80, 0x01, true, 0x7F, true, true),
            (0x7F, 0xFF, true, 0x80, false, true),
            (0xC0, 0x40, false, 0x7F, true, true),
        ];
        for &(a, value, carry_in, result, carry_out, overflow) in cases {
            let carry_op = if carry_in { 0x38 } else { 0x18 };
            let mut cpu = cpu_with(0x8000, &[carry_op, 0xA9, a, 0xE9, value]);
            run(&mut cpu, 3);
            assert_eq!(cpu.acc(), result, "A {:02X} - {:02X}", a, value);
            assert_eq!(cpu.status().contains(Status::CARRY), carry_out);
            assert_eq!(cpu.status().contains(Status::OVERFLOW), overflow);
        }
    }

    #[test]
    fn shifts_carry_the_discarded_bit() {
        for &value in &[0x01u8, 0x55, 0x80, 0xAA, 0xFF] {
            // ASL then LSR drops bit 7 into carry and shifts it out
            let mut cpu = cpu_with(0x8000, &[0xA9, value, 0x0A, 0x4A]);
            run(&mut cpu, 2);
            assert_eq!(cpu.status().contains(Status::CARRY), value & 0x80 != 0);
            cpu.step().unwrap();
            assert_eq!(cpu.acc(), value & 0x7F);
            assert!(!cpu.status().contains(Status::CARRY));

            // LSR then ASL drops bit 0 the same way
            let mut cpu = cpu_with(0x8000, &[0xA9, value, 0x4A, 0x0A]);
            run(&mut cpu, 2);
            assert_eq!(cpu.status().contains(Status::CARRY), value & 0x01 != 0);
            cpu.step().unwrap();
            assert_eq!(cpu.acc(), value & 0xFE);
            assert!(!cpu.status().contains(Status::CARRY));
        }
    }

    #[test]
    fn rotates_go_through_the_carry() {
        // C=1, A=0x80: ROL -> A=0x01, C=1
        let mut cpu = cpu_with(0x8000, &[0x38, 0xA9, 0x80, 0x2A]);
        run(&mut cpu, 3);
        assert_eq!(cpu.acc(), 0x01);
        assert!(cpu.status().contains(Status::CARRY));

        // C=1, A=0x01: ROR -> A=0x80, C=1
        let mut cpu = cpu_with(0x8000, &[0x38, 0xA9, 0x01, 0x6A]);
        run(&mut cpu, 3);
        assert_eq!(cpu.acc(), 0x80);
        assert!(cpu.status().contains(Status::CARRY));
        assert!(cpu.status().contains(Status::NEGATIVE));
    }

    #[test]
    fn stack_round_trips_the_accumulator() {
        for imm in [0x00u8, 0x42, 0xFF] {
            let mut cpu = cpu_with(0x8000, &[0xA9, 0x99, 0x48, 0xA9, imm, 0x68]);
            run(&mut cpu, 4);
            assert_eq!(cpu.acc(), 0x99);
        }
    }

    #[test]
    fn push_writes_then_decrements() {
        let mut cpu = cpu_with(0x8000, &[0xA9, 0x42, 0x48]);
        run(&mut cpu, 2);
        assert_eq!(cpu.stack_ptr(), 0xFC);
        assert_eq!(cpu.mem().peek(0x01FD), Some(0x42));
    }

    #[test]
    fn php_forces_break_and_unused_on_the_pushed_copy() {
        let mut cpu = cpu_with(0x8000, &[0x08]);
        cpu.step().unwrap();
        // live P is 0x24 after reset; the pushed copy carries B and U
        assert_eq!(cpu.mem().peek(0x01FD), Some(0x34));
        assert_eq!(cpu.status().bits(), 0x24);
    }

    #[test]
    fn plp_ignores_break_and_keeps_unused() {
        // push 0xFF through memory, pull it back into P
        let mut cpu = cpu_with(0x8000, &[0x28]);
        cpu.mem_mut().write(0x01FE, 0xFF).unwrap();
        cpu.step().unwrap();
        assert!(!cpu.status().contains(Status::BREAK));
        assert!(cpu.status().contains(Status::UNUSED));
        assert!(cpu.status().contains(Status::CARRY));
        assert!(cpu.status().contains(Status::NEGATIVE));
    }

    #[test]
    fn jsr_pushes_its_own_last_byte_and_rts_returns_past_it() {
        let mut cpu = cpu_with(0x8000, &[0x20, 0x00, 0x90]); // JSR $9000
        cpu.mem_mut().write(0x9000, 0x60).unwrap(); // RTS
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0x9000);
        // the pushed address is the JSR's last byte, $8002
        assert_eq!(cpu.mem().peek(0x01FD), Some(0x80));
        assert_eq!(cpu.mem().peek(0x01FC), Some(0x02));
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0x8003);
        assert_eq!(cpu.stack_ptr(), 0xFD);
    }

    #[test]
    fn rti_pulls_status_then_pc_with_no_adjustment() {
        let mut cpu = cpu_with(0x8000, &[0x40]);
        // hand-built interrupt frame: P=0xC3, return address $1234
        cpu.mem_mut().write(0x01FE, 0xC3).unwrap();
        cpu.mem_mut().write(0x01FF, 0x34).unwrap();
        cpu.mem_mut().write(0x0100, 0x12).unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 0x1234);
        // B discarded, U forced on
        assert_eq!(cpu.status().bits(), 0xE3);
        assert_eq!(cpu.stack_ptr(), 0x00);
    }

    #[test]
    fn brk_pushes_past_the_padding_byte_and_vectors() {
        let mut cpu = cpu_with(0x8000, &[0x00, 0xFF]); // BRK + padding
        cpu.mem_mut().write(IRQ_VECTOR, 0x00).unwrap();
        cpu.mem_mut().write(IRQ_VECTOR + 1, 0x60).unwrap();
        let cycles = cpu.step().unwrap();
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc(), 0x6000);
        assert!(cpu.status().contains(Status::IRQ_DISABLE));
        // pushed PC skips the padding byte
        assert_eq!(cpu.mem().peek(0x01FD), Some(0x80));
        assert_eq!(cpu.mem().peek(0x01FC), Some(0x02));
        // pushed P carries B and U
        assert_eq!(cpu.mem().peek(0x01FB), Some(0x24 | 0x30));
    }

    #[test]
    fn nmi_pushes_break_clear() {
        let mut cpu = cpu_with(0x8000, &[0xEA]);
        cpu.mem_mut().write(NMI_VECTOR, 0x00).unwrap();
        cpu.mem_mut().write(NMI_VECTOR + 1, 0x70).unwrap();
        let cycles = cpu.nmi().unwrap();
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc(), 0x7000);
        let pushed = cpu.mem().peek(0x01FB).unwrap();
        assert_eq!(pushed & 0x10, 0, "B must be clear on the pushed copy");
        assert_eq!(pushed & 0x20, 0x20, "U must be set on the pushed copy");
    }

    #[test]
    fn irq_honors_the_interrupt_mask() {
        // I is set on reset
        let mut cpu = cpu_with(0x8000, &[0x58, 0xEA]); // CLI
        let before = cpu.state();
        assert_eq!(cpu.irq().unwrap(), 0);
        assert_eq!(cpu.state(), before, "a masked IRQ changes nothing");

        cpu.step().unwrap(); // CLI
        cpu.mem_mut().write(IRQ_VECTOR, 0x00).unwrap();
        cpu.mem_mut().write(IRQ_VECTOR + 1, 0x50).unwrap();
        assert_eq!(cpu.irq().unwrap(), 7);
        assert_eq!(cpu.pc(), 0x5000);
        assert!(cpu.status().contains(Status::IRQ_DISABLE));
    }

    #[test]
    fn compare_orders_the_register_against_the_operand() {
        // A > value
        let mut cpu = cpu_with(0x8000, &[0xA9, 0x40, 0xC9, 0x20]);
        run(&mut cpu, 2);
        assert!(cpu.status().contains(Status::CARRY));
        assert!(!cpu.status().contains(Status::ZERO));

        // A == value
        let mut cpu = cpu_with(0x8000, &[0xA9, 0x40, 0xC9, 0x40]);
        run(&mut cpu, 2);
        assert!(cpu.status().contains(Status::CARRY));
        assert!(cpu.status().contains(Status::ZERO));

        // A < value; the 8-bit difference has bit 7 set
        let mut cpu = cpu_with(0x8000, &[0xA9, 0x20, 0xC9, 0x40]);
        run(&mut cpu, 2);
        assert!(!cpu.status().contains(Status::CARRY));
        assert!(cpu.status().contains(Status::NEGATIVE));
    }

    #[test]
    fn bit_copies_operand_bits_into_n_and_v() {
        let mut cpu = cpu_with(0x8000, &[0xA9, 0x0F, 0x24, 0x10]); // BIT $10
        cpu.mem_mut().write(0x0010, 0xC0).unwrap();
        run(&mut cpu, 2);
        assert!(cpu.status().contains(Status::NEGATIVE));
        assert!(cpu.status().contains(Status::OVERFLOW));
        assert!(cpu.status().contains(Status::ZERO), "0x0F & 0xC0 == 0");
    }

    #[test]
    fn memory_increments_and_decrements_wrap() {
        let mut cpu = cpu_with(0x8000, &[0xE6, 0x10, 0xC6, 0x20]); // INC $10; DEC $20
        cpu.mem_mut().write(0x0010, 0xFF).unwrap();
        cpu.mem_mut().write(0x0020, 0x00).unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.mem().peek(0x0010), Some(0x00));
        assert!(cpu.status().contains(Status::ZERO));
        cpu.step().unwrap();
        assert_eq!(cpu.mem().peek(0x0020), Some(0xFF));
        assert!(cpu.status().contains(Status::NEGATIVE));
    }

    #[test]
    fn txs_is_the_transfer_that_sets_no_flags() {
        let mut cpu = cpu_with(0x8000, &[0xA2, 0x42, 0x9A, 0xA2, 0x00, 0xBA]); // LDX #$42; TXS; LDX #0; TSX
        cpu.step().unwrap();
        let status_after_ldx = cpu.status();
        cpu.step().unwrap(); // TXS
        assert_eq!(cpu.stack_ptr(), 0x42);
        assert_eq!(cpu.status(), status_after_ldx);
        run(&mut cpu, 2); // TSX reloads X from S and does set flags
        assert_eq!(cpu.x(), 0x42);
        assert!(!cpu.status().contains(Status::ZERO));
    }

    #[test]
    fn indexed_indirect_wraps_in_the_zero_page() {
        // LDX #$04; LDA ($FE,X) -> pointer at $02/$03
        let mut cpu = cpu_with(0x8000, &[0xA2, 0x04, 0xA1, 0xFE]);
        cpu.mem_mut().write(0x0002, 0x00).unwrap();
        cpu.mem_mut().write(0x0003, 0x30).unwrap();
        cpu.mem_mut().write(0x3000, 0x77).unwrap();
        run(&mut cpu, 2);
        assert_eq!(cpu.acc(), 0x77);
    }

    #[test]
    fn indirect_indexed_reads_its_pointer_from_the_zero_page() {
        // LDY #$10; LDA ($FF),Y -> pointer low at $FF, high wraps to $00
        let mut cpu = cpu_with(0x8000, &[0xA0, 0x10, 0xB1, 0xFF]);
        cpu.mem_mut().write(0x00FF, 0x00).unwrap();
        cpu.mem_mut().write(0x0000, 0x40).unwrap();
        cpu.mem_mut().write(0x4010, 0x88).unwrap();
        run(&mut cpu, 2);
        assert_eq!(cpu.acc(), 0x88);
    }

    #[test]
    fn rmw_indexed_absolute_has_a_fixed_cost() {
        // ASL $00FF,X with X=1 crosses a page but still costs 7
        let mut cpu = cpu_with(0x8000, &[0xA2, 0x01, 0x1E, 0xFF, 0x00]);
        cpu.step().unwrap();
        assert_eq!(cpu.step().unwrap(), 7);
    }

    #[test]
    fn stores_pay_no_page_cross_penalty() {
        // STA $00FF,Y with Y=1 crosses a page but still costs 5
        let mut cpu = cpu_with(0x8000, &[0xA0, 0x01, 0x99, 0xFF, 0x00]);
        cpu.step().unwrap();
        assert_eq!(cpu.step().unwrap(), 5);
        assert_eq!(cpu.mem().peek(0x0100), Some(0x00));
    }

    #[test]
    fn illegal_opcode_reports_and_leaves_pc_past_the_byte() {
        let mut cpu = cpu_with(0x8000, &[0x02]);
        let err = cpu.step().unwrap_err();
        assert_eq!(
            err,
            CpuError::IllegalOpcode {
                opcode: 0x02,
                pc: 0x8001
            }
        );
        assert_eq!(cpu.pc(), 0x8001);
    }

    #[test]
    fn pc_advances_by_instruction_size_for_straightline_ops() {
        use Instruction::*;
        for (byte, entry) in OPCODE_TABLE.iter().enumerate() {
            if let Some(entry) = entry {
                if entry.mode == AddressingMode::Rel
                    || matches!(entry.instr, JMP | JSR | RTS | RTI | BRK)
                {
                    continue;
                }
                let mut ram = Ram::new();
                ram.load(0x8000, &[byte as u8, 0x00, 0x00]);
                let mut cpu = Cpu6502::new(ram);
                cpu.set_pc(0x8000);
                cpu.step().unwrap();
                assert_eq!(
                    cpu.pc(),
                    0x8000 + u16::from(entry.bytes),
                    "{} ({:02X})",
                    entry.mnemonic,
                    byte
                );
            }
        }
    }

    /// RAM below `rom_start`, write-protected above it
    struct RomAbove {
        ram: Ram,
        rom_start: u16,
    }

    impl Memory for RomAbove {
        fn read(&mut self, addr: u16) -> Result<u8, MemoryError> {
            self.ram.read(addr)
        }

        fn peek(&self, addr: u16) -> Option<u8> {
            self.ram.peek(addr)
        }

        fn write(&mut self, addr: u16, value: u8) -> Result<(), MemoryError> {
            if addr >= self.rom_start {
                return Err(MemoryError::ReadOnly(addr));
            }
            self.ram.write(addr, value)
        }
    }

    #[test]
    fn memory_faults_propagate_out_of_step() {
        let mut ram = Ram::new();
        ram.load(0x8000, &[0x8D, 0x00, 0x90]); // STA $9000
        let mut cpu = Cpu6502::new(RomAbove {
            ram,
            rom_start: 0x9000,
        });
        cpu.set_pc(0x8000);
        let err = cpu.step().unwrap_err();
        assert_eq!(err, CpuError::Memory(MemoryError::ReadOnly(0x9000)));
    }
}
