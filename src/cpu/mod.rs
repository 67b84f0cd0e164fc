//! 8086 CPU emulation
//!
//! The CPU splits each step into fetch-and-decode and execute, and keeps
//! the decoded instruction visible in between. That split is the hook
//! surface outer shells build on: breakpoints fetch without executing,
//! `skip` drops a decoded instruction, `refetch` re-decodes after code
//! bytes were poked.

pub mod decode;
pub mod exec;
pub mod regs;

pub use decode::{sign_extend, ByteArg, Op, Prepared, Rep, WordArg};
pub use exec::{BranchKind, DeviceRequest, DryFlow};

use std::collections::HashSet;
use std::io::{self, Write};

use crate::memory::Memory;
use regs::Registers;

/// The 8086 interpreter state: register file, prepared instruction, and
/// the introspection mirrors (call stack, entry points). Memory is passed
/// in per operation, never owned.
pub struct Cpu {
    pub regs: Registers,
    prepared: Option<Prepared>,
    call_stack: Vec<(u16, u16)>,
    entry_points: HashSet<u32>,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            prepared: None,
            call_stack: Vec::new(),
            entry_points: HashSet::new(),
        }
    }

    /// Clear registers, flags, and all execution state.
    pub fn reset(&mut self) {
        self.regs = Registers::new();
        self.prepared = None;
        self.call_stack.clear();
        self.entry_points.clear();
    }

    /// Linear address of the next fetch.
    pub fn linear_cs_ip(&self) -> u32 {
        regs::linear(self.regs.get16(regs::CS), self.regs.get16(regs::IP))
    }

    /// Linear address of the stack top.
    pub fn linear_ss_sp(&self) -> u32 {
        regs::linear(self.regs.get16(regs::SS), self.regs.get16(regs::SP))
    }

    /// Decode the instruction at CS:IP, leaving it prepared for execution.
    /// IP advances past the instruction; the prepared record keeps the
    /// start address.
    pub fn fetch_and_decode(&mut self, mem: &Memory) {
        assert!(
            self.prepared.is_none(),
            "fetch_and_decode while an instruction is pending"
        );
        let p = decode::decode_one(self, mem);
        log::trace!("[{:04X}:{:04X}] {}", p.cs, p.ip, p.desc);
        self.prepared = Some(p);
    }

    /// Has an instruction been fetched but not yet executed?
    pub fn is_execute_pending(&self) -> bool {
        self.prepared.is_some()
    }

    /// The decoded-but-not-executed instruction, if any.
    pub fn prepared(&self) -> Option<&Prepared> {
        self.prepared.as_ref()
    }

    pub(crate) fn take_prepared(&mut self) -> Prepared {
        self.prepared
            .take()
            .expect("execute without a prepared instruction")
    }

    /// Execute the prepared instruction. INT/IN/OUT surface as a
    /// [`DeviceRequest`] for the caller to dispatch.
    pub fn execute(&mut self, mem: &mut Memory) -> Option<DeviceRequest> {
        exec::execute(self, mem)
    }

    /// Dry-run the prepared instruction: no state changes besides IP, and
    /// control-flow effects are reported instead of taken.
    pub fn execute_dry(&mut self, mem: &Memory) -> DryFlow {
        exec::execute_dry(self, mem)
    }

    /// Drop the prepared instruction without executing it. IP stays past
    /// the instruction, so this doubles as "skip".
    pub fn clear_execution_state(&mut self) {
        self.prepared = None;
    }

    /// Discard the prepared instruction, rewind CS:IP to where its fetch
    /// began, and decode again. Required after poking code bytes.
    pub fn refetch(&mut self, mem: &Memory) {
        let p = self
            .prepared
            .take()
            .expect("refetch without a prepared instruction");
        self.regs.set16(regs::CS, p.cs);
        self.regs.set16(regs::IP, p.ip);
        self.fetch_and_decode(mem);
    }

    /// Print `CS:IP  hex-bytes  mnemonic` for the prepared instruction.
    pub fn output_current_operation(&self, mem: &Memory, out: &mut dyn Write) -> io::Result<()> {
        let p = match &self.prepared {
            Some(p) => p,
            None => return Ok(()),
        };
        write!(out, "{:04X}:{:04X}  ", p.cs, p.ip)?;
        let start = regs::linear(p.cs, p.ip);
        for i in 0..p.len {
            write!(out, "{:02X}", mem.read(start + i as u32))?;
        }
        writeln!(out, "  {}", p.desc)
    }

    // === Operand access ===

    pub(crate) fn read_warg(&self, mem: &Memory, arg: WordArg) -> u16 {
        match arg {
            WordArg::Reg(r) => self.regs.get16(r),
            WordArg::Mem(addr) => mem.read_u16(addr),
            WordArg::Imm(v) => v,
        }
    }

    pub(crate) fn write_warg(&mut self, mem: &mut Memory, arg: WordArg, value: u16) {
        match arg {
            WordArg::Reg(r) => self.regs.set16(r, value),
            WordArg::Mem(addr) => mem.write_u16(addr, value),
            WordArg::Imm(_) => panic!("check failed: write to an immediate operand"),
        }
    }

    pub(crate) fn read_barg(&self, mem: &Memory, arg: ByteArg) -> u8 {
        match arg {
            ByteArg::Reg(r) => self.regs.get8(r),
            ByteArg::Mem(addr) => mem.read(addr),
            ByteArg::Imm(v) => v,
        }
    }

    pub(crate) fn write_barg(&mut self, mem: &mut Memory, arg: ByteArg, value: u8) {
        match arg {
            ByteArg::Reg(r) => self.regs.set8(r, value),
            ByteArg::Mem(addr) => mem.write(addr, value),
            ByteArg::Imm(_) => panic!("check failed: write to an immediate operand"),
        }
    }

    // === Stack ===

    pub fn push16(&mut self, mem: &mut Memory, value: u16) {
        let sp = self.regs.get16(regs::SP).wrapping_sub(2);
        self.regs.set16(regs::SP, sp);
        mem.write_u16(regs::linear(self.regs.get16(regs::SS), sp), value);
    }

    pub fn pop16(&mut self, mem: &Memory) -> u16 {
        let sp = self.regs.get16(regs::SP);
        let value = mem.read_u16(regs::linear(self.regs.get16(regs::SS), sp));
        self.regs.set16(regs::SP, sp.wrapping_add(2));
        value
    }

    // === Observability ===

    /// Call-stack mirror: one `(CS, IP-of-CALL)` pair per active call.
    pub fn call_stack(&self) -> &[(u16, u16)] {
        &self.call_stack
    }

    pub(crate) fn call_stack_push(&mut self, cs: u16, ip: u16) {
        self.call_stack.push((cs, ip));
    }

    /// Underflow is tolerated: a RET with no mirrored CALL empties to empty.
    pub(crate) fn call_stack_pop(&mut self) {
        self.call_stack.pop();
    }

    /// Linear addresses reached as branch or call targets at runtime.
    pub fn entry_points(&self) -> &HashSet<u32> {
        &self.entry_points
    }

    /// Record the current CS:IP as a control-flow target.
    pub(crate) fn note_entry_point(&mut self) {
        let addr = self.linear_cs_ip();
        self.entry_points.insert(addr);
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
