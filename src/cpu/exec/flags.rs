//! Flag manipulation handlers (CLC, STC, CMC, CLD, STD, CLI, STI)

use crate::cpu::regs::{F_CF, F_DF, F_IF};
use crate::cpu::Cpu;

pub fn clc(cpu: &mut Cpu) {
    cpu.regs.set_flag(F_CF, false);
}

pub fn stc(cpu: &mut Cpu) {
    cpu.regs.set_flag(F_CF, true);
}

pub fn cmc(cpu: &mut Cpu) {
    let cf = cpu.regs.flag(F_CF);
    cpu.regs.set_flag(F_CF, !cf);
}

pub fn cld(cpu: &mut Cpu) {
    cpu.regs.set_flag(F_DF, false);
}

pub fn std_op(cpu: &mut Cpu) {
    cpu.regs.set_flag(F_DF, true);
}

pub fn cli(cpu: &mut Cpu) {
    cpu.regs.set_flag(F_IF, false);
}

pub fn sti(cpu: &mut Cpu) {
    cpu.regs.set_flag(F_IF, true);
}
