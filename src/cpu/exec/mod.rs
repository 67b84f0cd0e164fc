//! Instruction execution
//!
//! One short handler per mnemonic, grouped by category, all operating on
//! the prepared instruction's resolved operands. The REP loop and the
//! dry-run variant used by the disassembler live at this level: dry
//! execution never dispatches to the handlers at all, it only reports the
//! control-flow effect an instruction would have.

pub mod arithmetic;
pub mod control_flow;
pub mod data_transfer;
pub mod flags;
pub mod io;
pub mod logic;
pub mod shift;
pub mod stack;
pub mod string;

use crate::cpu::decode::{Op, Prepared, Rep};
use crate::cpu::regs::{self, F_ZF};
use crate::cpu::Cpu;
use crate::memory::Memory;

/// A device interaction the executor cannot complete on its own. The
/// machine layer routes these to the registered handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRequest {
    /// `INT n`.
    Interrupt(u8),
    /// `IN AL, port`; the dispatcher stores the result in AL.
    PortIn { port: u16 },
    /// `OUT port, AL`.
    PortOut { port: u16, value: u8 },
}

/// How a dry-run branch target was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Call,
    Jump,
}

/// Control-flow effect of one dry-run step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DryFlow {
    /// Statically known branch or call target, as a linear address.
    pub target: Option<(u32, BranchKind)>,
    /// True when the straight-line decode must stop here.
    pub stop: bool,
}

impl DryFlow {
    fn cont() -> Self {
        Self {
            target: None,
            stop: false,
        }
    }

    fn stop() -> Self {
        Self {
            target: None,
            stop: true,
        }
    }
}

/// Execute the prepared instruction for real.
pub(crate) fn execute(cpu: &mut Cpu, mem: &mut Memory) -> Option<DeviceRequest> {
    let p = cpu.take_prepared();

    if p.rep != Rep::None && p.op.is_string() {
        run_rep(cpu, mem, &p);
        return None;
    }

    dispatch(cpu, mem, &p)
}

/// The REP loop: repeat the string primitive while CX counts down; on
/// CMPS/SCAS the REPE/REPNE variants additionally stop when ZF disagrees.
fn run_rep(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) {
    while cpu.regs.get16(regs::CX) != 0 {
        dispatch(cpu, mem, p);
        let cx = cpu.regs.get16(regs::CX).wrapping_sub(1);
        cpu.regs.set16(regs::CX, cx);

        if p.op.rep_tests_zf() {
            let zf = cpu.regs.flag(F_ZF);
            let done = match p.rep {
                Rep::Rep => !zf,
                Rep::Repne => zf,
                Rep::None => unreachable!(),
            };
            if done {
                break;
            }
        }
    }
}

fn dispatch(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) -> Option<DeviceRequest> {
    match p.op {
        // Data transfer
        Op::MovB => data_transfer::mov_b(cpu, mem, p),
        Op::MovW => data_transfer::mov_w(cpu, mem, p),
        Op::XchgB => data_transfer::xchg_b(cpu, mem, p),
        Op::XchgW => data_transfer::xchg_w(cpu, mem, p),
        Op::Lea => data_transfer::lea(cpu, mem, p),
        Op::Lds => data_transfer::lds(cpu, mem, p),
        Op::Les => data_transfer::les(cpu, mem, p),
        Op::Xlat => data_transfer::xlat(cpu, mem, p),
        Op::Cbw => data_transfer::cbw(cpu, mem, p),
        Op::Cwd => data_transfer::cwd(cpu, mem, p),
        Op::Lahf => data_transfer::lahf(cpu, mem, p),
        Op::Sahf => data_transfer::sahf(cpu, mem, p),
        Op::Nop => {}

        // Stack
        Op::PushW => stack::push_w(cpu, mem, p),
        Op::PopW => stack::pop_w(cpu, mem, p),
        Op::Pushf => stack::pushf(cpu, mem, p),
        Op::Popf => stack::popf(cpu, mem, p),

        // Arithmetic
        Op::AddB => arithmetic::add_b(cpu, mem, p),
        Op::AddW => arithmetic::add_w(cpu, mem, p),
        Op::AdcB => arithmetic::adc_b(cpu, mem, p),
        Op::AdcW => arithmetic::adc_w(cpu, mem, p),
        Op::SubB => arithmetic::sub_b(cpu, mem, p),
        Op::SubW => arithmetic::sub_w(cpu, mem, p),
        Op::SbbB => arithmetic::sbb_b(cpu, mem, p),
        Op::SbbW => arithmetic::sbb_w(cpu, mem, p),
        Op::CmpB => arithmetic::cmp_b(cpu, mem, p),
        Op::CmpW => arithmetic::cmp_w(cpu, mem, p),
        Op::IncB => arithmetic::inc_b(cpu, mem, p),
        Op::IncW => arithmetic::inc_w(cpu, mem, p),
        Op::DecB => arithmetic::dec_b(cpu, mem, p),
        Op::DecW => arithmetic::dec_w(cpu, mem, p),
        Op::NegB => arithmetic::neg_b(cpu, mem, p),
        Op::NegW => arithmetic::neg_w(cpu, mem, p),
        Op::MulB => arithmetic::mul_b(cpu, mem, p),
        Op::MulW => arithmetic::mul_w(cpu, mem, p),
        Op::ImulB => arithmetic::imul_b(cpu, mem, p),
        Op::ImulW => arithmetic::imul_w(cpu, mem, p),
        Op::DivB => arithmetic::div_b(cpu, mem, p),
        Op::DivW => arithmetic::div_w(cpu, mem, p),
        Op::IdivB => arithmetic::idiv_b(cpu, mem, p),
        Op::IdivW => arithmetic::idiv_w(cpu, mem, p),

        // Logic
        Op::AndB => logic::and_b(cpu, mem, p),
        Op::AndW => logic::and_w(cpu, mem, p),
        Op::OrB => logic::or_b(cpu, mem, p),
        Op::OrW => logic::or_w(cpu, mem, p),
        Op::XorB => logic::xor_b(cpu, mem, p),
        Op::XorW => logic::xor_w(cpu, mem, p),
        Op::TestB => logic::test_b(cpu, mem, p),
        Op::TestW => logic::test_w(cpu, mem, p),
        Op::NotB => logic::not_b(cpu, mem, p),
        Op::NotW => logic::not_w(cpu, mem, p),

        // Shifts and rotates
        Op::RolB => shift::rol_b(cpu, mem, p),
        Op::RolW => shift::rol_w(cpu, mem, p),
        Op::RorB => shift::ror_b(cpu, mem, p),
        Op::RorW => shift::ror_w(cpu, mem, p),
        Op::RclB => shift::rcl_b(cpu, mem, p),
        Op::RclW => shift::rcl_w(cpu, mem, p),
        Op::RcrB => shift::rcr_b(cpu, mem, p),
        Op::RcrW => shift::rcr_w(cpu, mem, p),
        Op::ShlB => shift::shl_b(cpu, mem, p),
        Op::ShlW => shift::shl_w(cpu, mem, p),
        Op::ShrB => shift::shr_b(cpu, mem, p),
        Op::ShrW => shift::shr_w(cpu, mem, p),
        Op::SarB => shift::sar_b(cpu, mem, p),
        Op::SarW => shift::sar_w(cpu, mem, p),

        // String primitives
        Op::Movsb => string::movsb(cpu, mem, p),
        Op::Movsw => string::movsw(cpu, mem, p),
        Op::Cmpsb => string::cmpsb(cpu, mem, p),
        Op::Cmpsw => string::cmpsw(cpu, mem, p),
        Op::Stosb => string::stosb(cpu, mem, p),
        Op::Stosw => string::stosw(cpu, mem, p),
        Op::Lodsb => string::lodsb(cpu, mem, p),
        Op::Lodsw => string::lodsw(cpu, mem, p),
        Op::Scasb => string::scasb(cpu, mem, p),
        Op::Scasw => string::scasw(cpu, mem, p),

        // Control transfer
        Op::Jcc(cond) => control_flow::jcc(cpu, mem, p, cond),
        Op::JmpShort | Op::JmpNear => control_flow::jmp_rel(cpu, mem, p),
        Op::JmpRm => control_flow::jmp_rm(cpu, mem, p),
        Op::JmpFar => control_flow::jmp_far(cpu, mem, p),
        Op::JmpFarInd => control_flow::jmp_far_ind(cpu, mem, p),
        Op::CallNear => control_flow::call_near(cpu, mem, p),
        Op::CallRm => control_flow::call_rm(cpu, mem, p),
        Op::CallFar => control_flow::call_far(cpu, mem, p),
        Op::CallFarInd => control_flow::call_far_ind(cpu, mem, p),
        Op::Loop => control_flow::loop_op(cpu, mem, p),
        Op::Loopz => control_flow::loopz(cpu, mem, p),
        Op::Loopnz => control_flow::loopnz(cpu, mem, p),
        Op::Jcxz => control_flow::jcxz(cpu, mem, p),
        Op::Ret => control_flow::ret(cpu, mem, p),
        Op::RetImm => control_flow::ret_imm(cpu, mem, p),
        Op::Retf => control_flow::retf(cpu, mem, p),
        Op::RetfImm => control_flow::retf_imm(cpu, mem, p),
        Op::Iret => control_flow::iret(cpu, mem, p),
        Op::Int => return Some(control_flow::int_op(cpu, mem, p)),

        // Flags
        Op::Clc => flags::clc(cpu),
        Op::Stc => flags::stc(cpu),
        Op::Cmc => flags::cmc(cpu),
        Op::Cld => flags::cld(cpu),
        Op::Std => flags::std_op(cpu),
        Op::Cli => flags::cli(cpu),
        Op::Sti => flags::sti(cpu),

        // I/O
        Op::InB => return Some(io::in_b(cpu, mem, p)),
        Op::OutB => return Some(io::out_b(cpu, mem, p)),

        Op::Unsupported(name) => panic!("opcode '{}' not implemented", name),
    }
    None
}

/// Dry-run step: consume the prepared instruction, report what it would
/// have done to control flow, and change nothing but IP. Register reads
/// see the dry CPU's zeroed file; memory operand reads see the real image.
pub(crate) fn execute_dry(cpu: &mut Cpu, mem: &Memory) -> DryFlow {
    let p = cpu.take_prepared();
    let cs = cpu.regs.get16(regs::CS);
    let near = |offset: u16| regs::linear(cs, offset);

    match p.op {
        Op::CallNear => DryFlow {
            target: Some((near(cpu.read_warg(mem, p.w1())), BranchKind::Call)),
            stop: false,
        },
        Op::CallRm => {
            // Indirect call: the target is only known when it comes from
            // the image itself; a register target reads as zero here.
            let value = cpu.read_warg(mem, p.w1());
            DryFlow {
                target: (value != 0).then(|| (near(value), BranchKind::Call)),
                stop: false,
            }
        }
        Op::CallFar => {
            let off = cpu.read_warg(mem, p.w1());
            let seg = cpu.read_warg(mem, p.w2());
            DryFlow {
                target: Some((regs::linear(seg, off), BranchKind::Call)),
                stop: false,
            }
        }
        Op::CallFarInd => DryFlow::cont(),

        Op::Jcc(_) | Op::Loop | Op::Loopz | Op::Loopnz | Op::Jcxz => DryFlow {
            target: Some((near(cpu.read_warg(mem, p.w1())), BranchKind::Jump)),
            stop: false,
        },

        Op::JmpShort | Op::JmpNear => DryFlow {
            target: Some((near(cpu.read_warg(mem, p.w1())), BranchKind::Jump)),
            stop: true,
        },
        Op::JmpRm => {
            // A zero target means a register-indirect jump: ignore it.
            let value = cpu.read_warg(mem, p.w1());
            DryFlow {
                target: (value != 0).then(|| (near(value), BranchKind::Jump)),
                stop: true,
            }
        }
        Op::JmpFar => {
            let off = cpu.read_warg(mem, p.w1());
            let seg = cpu.read_warg(mem, p.w2());
            DryFlow {
                target: Some((regs::linear(seg, off), BranchKind::Jump)),
                stop: true,
            }
        }
        Op::JmpFarInd => DryFlow::stop(),

        Op::Ret | Op::RetImm | Op::Retf | Op::RetfImm | Op::Iret => DryFlow::stop(),

        Op::Unsupported(name) => {
            log::debug!("skipping unimplemented opcode '{}' in dry run", name);
            DryFlow::cont()
        }

        _ => DryFlow::cont(),
    }
}
