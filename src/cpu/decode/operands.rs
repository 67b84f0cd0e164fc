//! Operand locations bound by the decoder
//!
//! The decoder resolves every operand to a register-file slot, a linear
//! memory address, or an immediate value. Memory operands are linear
//! addresses computed from the segment registers at decode time, so a
//! prepared instruction is only valid until it executes; poking code or
//! data invalidates it (see `Cpu::refetch`).

/// A 16-bit operand location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordArg {
    /// Register-file index (`cpu::regs` constants).
    Reg(usize),
    /// Linear memory address of a little-endian word.
    Mem(u32),
    /// Immediate value, already sign-extended where the opcode demands.
    Imm(u16),
}

/// An 8-bit operand location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteArg {
    /// 8-bit register index (`cpu::regs` constants, AL..DH).
    Reg(usize),
    /// Linear memory address of a byte.
    Mem(u32),
    /// Immediate value.
    Imm(u8),
}
