//! WASM front-end for the interpreter
use crate::devices::bus::Memory;
use crate::devices::cpu::{utils, Cpu6502, CpuError, RESET_VECTOR};
use crate::devices::mem::Ram;
use js_sys::Uint8Array;
use std::panic;
use wasm_bindgen::prelude::*;

/// A 6502 wired to 64 KiB of flat RAM, for driving from JavaScript
#[wasm_bindgen]
pub struct Mos6502 {
    cpu: Cpu6502<Ram>,
}

#[wasm_bindgen]
impl Mos6502 {
    /// Build an interpreter with `program` loaded at `org` and the reset
    /// vector pointed at it
    #[wasm_bindgen(constructor)]
    pub fn new(program: &[u8], org: u16) -> Result<Mos6502, JsValue> {
        let mut ram = Ram::new();
        ram.load(org, program);
        ram.load(RESET_VECTOR, &org.to_le_bytes());
        let mut cpu = Cpu6502::new(ram);
        cpu.reset().map_err(err_to_js)?;
        Ok(Mos6502 { cpu })
    }

    /// Execute one instruction, returning the cycles it consumed
    pub fn step(&mut self) -> Result<u32, JsValue> {
        self.cpu.step().map_err(err_to_js)
    }

    /// Trace the instruction at the current PC without executing it
    pub fn trace(&self) -> String {
        utils::trace_line(&self.cpu)
    }

    /// The register file as `[A, X, Y, S, P, PC]`
    pub fn registers(&self) -> Vec<u32> {
        let state = self.cpu.state();
        vec![
            u32::from(state.acc),
            u32::from(state.x),
            u32::from(state.y),
            u32::from(state.stack),
            u32::from(state.status.bits()),
            u32::from(state.pc),
        ]
    }

    /// A window of memory, for front-end hex views
    pub fn dump_ram(&self, start: u16, len: u16) -> Uint8Array {
        let mut buf = Vec::with_capacity(usize::from(len));
        for i in 0..len {
            buf.push(self.cpu.mem().peek(start.wrapping_add(i)).unwrap_or(0));
        }
        Uint8Array::from(buf.as_slice())
    }
}

fn err_to_js(err: CpuError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Installs a global panic handler to make debugging easier
#[wasm_bindgen]
pub fn init_debug_hooks() {
    panic::set_hook(Box::new(console_error_panic_hook::hook));
}
