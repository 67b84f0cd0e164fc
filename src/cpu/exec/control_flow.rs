//! Control transfer handlers (JMP, Jcc, CALL, RET, LOOP, INT)
//!
//! Branch targets were precomputed by the decoder (IP after the fetch
//! plus the sign-extended displacement). Every taken branch records its
//! target in the entry-point set; CALL and RET maintain the call-stack
//! mirror.

use crate::cpu::decode::{Cond, Prepared, WordArg};
use crate::cpu::exec::DeviceRequest;
use crate::cpu::regs::{self, F_CF, F_OF, F_PF, F_SF, F_ZF};
use crate::cpu::Cpu;
use crate::memory::Memory;

fn cond_met(cpu: &Cpu, cond: Cond) -> bool {
    let f = &cpu.regs;
    match cond {
        Cond::O => f.flag(F_OF),
        Cond::No => !f.flag(F_OF),
        Cond::B => f.flag(F_CF),
        Cond::Nb => !f.flag(F_CF),
        Cond::Z => f.flag(F_ZF),
        Cond::Nz => !f.flag(F_ZF),
        Cond::Be => f.flag(F_CF) || f.flag(F_ZF),
        Cond::A => !f.flag(F_CF) && !f.flag(F_ZF),
        Cond::S => f.flag(F_SF),
        Cond::Ns => !f.flag(F_SF),
        Cond::Pe => f.flag(F_PF),
        Cond::Po => !f.flag(F_PF),
        Cond::L => f.flag(F_SF) != f.flag(F_OF),
        Cond::Ge => f.flag(F_SF) == f.flag(F_OF),
        Cond::Le => f.flag(F_ZF) || f.flag(F_SF) != f.flag(F_OF),
        Cond::G => !f.flag(F_ZF) && f.flag(F_SF) == f.flag(F_OF),
    }
}

fn branch_to(cpu: &mut Cpu, target: u16) {
    cpu.regs.set16(regs::IP, target);
    cpu.note_entry_point();
}

pub fn jcc(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared, cond: Cond) {
    if cond_met(cpu, cond) {
        let target = cpu.read_warg(mem, p.w1());
        branch_to(cpu, target);
    }
}

pub fn jmp_rel(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let target = cpu.read_warg(mem, p.w1());
    branch_to(cpu, target);
}

pub fn jmp_rm(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let target = cpu.read_warg(mem, p.w1());
    branch_to(cpu, target);
}

pub fn jmp_far(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let off = cpu.read_warg(mem, p.w1());
    let seg = cpu.read_warg(mem, p.w2());
    cpu.regs.set16(regs::CS, seg);
    branch_to(cpu, off);
}

pub fn jmp_far_ind(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let addr = match p.w1() {
        WordArg::Mem(addr) => addr,
        _ => panic!("check failed: far indirect jump needs a memory operand"),
    };
    let off = mem.read_u16(addr);
    let seg = mem.read_u16(addr + 2);
    cpu.regs.set16(regs::CS, seg);
    branch_to(cpu, off);
}

pub fn call_near(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let target = cpu.read_warg(mem, p.w1());
    let ret = cpu.regs.get16(regs::IP);
    cpu.push16(mem, ret);
    cpu.call_stack_push(p.cs, p.ip);
    branch_to(cpu, target);
}

pub fn call_rm(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let target = cpu.read_warg(mem, p.w1());
    let ret = cpu.regs.get16(regs::IP);
    cpu.push16(mem, ret);
    cpu.call_stack_push(p.cs, p.ip);
    branch_to(cpu, target);
}

pub fn call_far(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let off = cpu.read_warg(mem, p.w1());
    let seg = cpu.read_warg(mem, p.w2());
    let ret_cs = cpu.regs.get16(regs::CS);
    let ret_ip = cpu.regs.get16(regs::IP);
    cpu.push16(mem, ret_cs);
    cpu.push16(mem, ret_ip);
    cpu.call_stack_push(p.cs, p.ip);
    cpu.regs.set16(regs::CS, seg);
    branch_to(cpu, off);
}

pub fn call_far_ind(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let addr = match p.w1() {
        WordArg::Mem(addr) => addr,
        _ => panic!("check failed: far indirect call needs a memory operand"),
    };
    let off = mem.read_u16(addr);
    let seg = mem.read_u16(addr + 2);
    let ret_cs = cpu.regs.get16(regs::CS);
    let ret_ip = cpu.regs.get16(regs::IP);
    cpu.push16(mem, ret_cs);
    cpu.push16(mem, ret_ip);
    cpu.call_stack_push(p.cs, p.ip);
    cpu.regs.set16(regs::CS, seg);
    branch_to(cpu, off);
}

pub fn ret(cpu: &mut Cpu, mem: &mut Memory, _p: &Prepared) {
    let ip = cpu.pop16(mem);
    cpu.regs.set16(regs::IP, ip);
    cpu.call_stack_pop();
}

pub fn ret_imm(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let ip = cpu.pop16(mem);
    cpu.regs.set16(regs::IP, ip);
    let extra = cpu.read_warg(mem, p.w1());
    let sp = cpu.regs.get16(regs::SP).wrapping_add(extra);
    cpu.regs.set16(regs::SP, sp);
    cpu.call_stack_pop();
}

pub fn retf(cpu: &mut Cpu, mem: &mut Memory, _p: &Prepared) {
    let ip = cpu.pop16(mem);
    let cs = cpu.pop16(mem);
    cpu.regs.set16(regs::IP, ip);
    cpu.regs.set16(regs::CS, cs);
    cpu.call_stack_pop();
}

pub fn retf_imm(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let ip = cpu.pop16(mem);
    let cs = cpu.pop16(mem);
    cpu.regs.set16(regs::IP, ip);
    cpu.regs.set16(regs::CS, cs);
    let extra = cpu.read_warg(mem, p.w1());
    let sp = cpu.regs.get16(regs::SP).wrapping_add(extra);
    cpu.regs.set16(regs::SP, sp);
    cpu.call_stack_pop();
}

pub fn iret(cpu: &mut Cpu, mem: &mut Memory, _p: &Prepared) {
    let ip = cpu.pop16(mem);
    let cs = cpu.pop16(mem);
    let flags = cpu.pop16(mem);
    cpu.regs.set16(regs::IP, ip);
    cpu.regs.set16(regs::CS, cs);
    cpu.regs.flags = flags;
}

pub fn loop_op(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let cx = cpu.regs.get16(regs::CX).wrapping_sub(1);
    cpu.regs.set16(regs::CX, cx);
    if cx != 0 {
        let target = cpu.read_warg(mem, p.w1());
        branch_to(cpu, target);
    }
}

pub fn loopz(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let cx = cpu.regs.get16(regs::CX).wrapping_sub(1);
    cpu.regs.set16(regs::CX, cx);
    if cx != 0 && cpu.regs.flag(F_ZF) {
        let target = cpu.read_warg(mem, p.w1());
        branch_to(cpu, target);
    }
}

pub fn loopnz(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    let cx = cpu.regs.get16(regs::CX).wrapping_sub(1);
    cpu.regs.set16(regs::CX, cx);
    if cx != 0 && !cpu.regs.flag(F_ZF) {
        let target = cpu.read_warg(mem, p.w1());
        branch_to(cpu, target);
    }
}

/// JCXZ branches when CX is zero, without touching CX.
pub fn jcxz(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    if cpu.regs.get16(regs::CX) == 0 {
        let target = cpu.read_warg(mem, p.w1());
        branch_to(cpu, target);
    }
}

/// `INT n` surfaces as a device request; the machine layer looks up the
/// registered handler.
pub fn int_op(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) -> DeviceRequest {
    let num = cpu.read_barg(mem, p.b1());
    DeviceRequest::Interrupt(num)
}
