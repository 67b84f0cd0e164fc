//! Instruction fetch and decode
//!
//! A byte-stream recognizer driven by `fetch()`: read one byte at CS:IP,
//! advance IP, count it. Decoding runs in phases — prefix loop, opcode,
//! ModR/M and displacement, immediate, operand binding — and stashes a
//! [`Prepared`] instruction for the executor. The disassembler drives the
//! same path; nothing here mutates machine state other than CS:IP.

mod modrm;
mod operands;
mod prepared;

pub use operands::{ByteArg, WordArg};
pub use prepared::{Cond, Op, Prepared, Rep};

use crate::cpu::regs;
use crate::cpu::Cpu;
use crate::memory::Memory;

use modrm::{reg16_name, reg8_name, ModRm, R16_MAP, R8_MAP, SEG_MAP};

/// Sign-extend a byte to a word.
#[inline(always)]
pub fn sign_extend(b: u8) -> u16 {
    if b < 0x80 {
        b as u16
    } else {
        0xFF00 | b as u16
    }
}

/// Decode one instruction at CS:IP, advancing IP past it.
pub(crate) fn decode_one(cpu: &mut Cpu, mem: &Memory) -> Prepared {
    let cs = cpu.regs.get16(regs::CS);
    let ip = cpu.regs.get16(regs::IP);
    let decoder = Decoder {
        cpu,
        mem,
        len: 0,
        seg_override: None,
        rep: Rep::None,
    };
    decoder.run(cs, ip)
}

pub(crate) struct Decoder<'a> {
    pub(crate) cpu: &'a mut Cpu,
    mem: &'a Memory,
    len: u16,
    pub(crate) seg_override: Option<usize>,
    rep: Rep,
}

fn hex8(v: u8) -> String {
    format!("{:02X}h", v)
}

fn hex16(v: u16) -> String {
    format!("{:04X}h", v)
}

const ALU_NAMES: [&str; 8] = ["ADD", "OR", "ADC", "SBB", "AND", "SUB", "XOR", "CMP"];
const ALU_OPS_B: [Op; 8] = [
    Op::AddB,
    Op::OrB,
    Op::AdcB,
    Op::SbbB,
    Op::AndB,
    Op::SubB,
    Op::XorB,
    Op::CmpB,
];
const ALU_OPS_W: [Op; 8] = [
    Op::AddW,
    Op::OrW,
    Op::AdcW,
    Op::SbbW,
    Op::AndW,
    Op::SubW,
    Op::XorW,
    Op::CmpW,
];

const SHIFT_NAMES: [&str; 8] = ["ROL", "ROR", "RCL", "RCR", "SHL", "SHR", "SHL", "SAR"];
const SHIFT_OPS_B: [Op; 8] = [
    Op::RolB,
    Op::RorB,
    Op::RclB,
    Op::RcrB,
    Op::ShlB,
    Op::ShrB,
    Op::ShlB,
    Op::SarB,
];
const SHIFT_OPS_W: [Op; 8] = [
    Op::RolW,
    Op::RorW,
    Op::RclW,
    Op::RcrW,
    Op::ShlW,
    Op::ShrW,
    Op::ShlW,
    Op::SarW,
];

const COND_TABLE: [Cond; 16] = [
    Cond::O,
    Cond::No,
    Cond::B,
    Cond::Nb,
    Cond::Z,
    Cond::Nz,
    Cond::Be,
    Cond::A,
    Cond::S,
    Cond::Ns,
    Cond::Pe,
    Cond::Po,
    Cond::L,
    Cond::Ge,
    Cond::Le,
    Cond::G,
];

impl<'a> Decoder<'a> {
    /// Read one byte at CS:IP, advance IP (with offset-wrap carry into the
    /// segment), and count it toward `bytes_fetched`.
    pub(super) fn fetch(&mut self) -> u8 {
        let cs = self.cpu.regs.get16(regs::CS);
        let ip = self.cpu.regs.get16(regs::IP);
        let byte = self.mem.read(regs::linear(cs, ip));
        if ip == 0xFFFF {
            self.cpu.regs.set16(regs::IP, 0);
            self.cpu.regs.set16(regs::CS, cs.wrapping_add(0x1000));
        } else {
            self.cpu.regs.set16(regs::IP, ip + 1);
        }
        self.len += 1;
        byte
    }

    pub(super) fn fetch_u16(&mut self) -> u16 {
        let lo = self.fetch() as u16;
        let hi = self.fetch() as u16;
        lo | (hi << 8)
    }

    fn fetch_i8(&mut self) -> i16 {
        self.fetch() as i8 as i16
    }

    /// Linear address of seg-register:offset at decode time.
    fn lin(&self, seg: usize, offset: u16) -> u32 {
        regs::linear(self.cpu.regs.get16(seg), offset)
    }

    fn rm_w(&self, m: &ModRm) -> (WordArg, String) {
        match &m.ea {
            None => {
                let r = R16_MAP[m.rm as usize];
                (WordArg::Reg(r), reg16_name(r).to_string())
            }
            Some(ea) => (WordArg::Mem(self.lin(ea.seg, ea.offset)), ea.desc.clone()),
        }
    }

    fn rm_b(&self, m: &ModRm) -> (ByteArg, String) {
        match &m.ea {
            None => {
                let r = R8_MAP[m.rm as usize];
                (ByteArg::Reg(r), reg8_name(r).to_string())
            }
            Some(ea) => (ByteArg::Mem(self.lin(ea.seg, ea.offset)), ea.desc.clone()),
        }
    }

    fn reg_w(&self, field: u8) -> (WordArg, &'static str) {
        let r = R16_MAP[(field & 0b111) as usize];
        (WordArg::Reg(r), reg16_name(r))
    }

    fn reg_b(&self, field: u8) -> (ByteArg, &'static str) {
        let r = R8_MAP[(field & 0b111) as usize];
        (ByteArg::Reg(r), reg8_name(r))
    }

    fn sreg(&self, field: u8) -> (WordArg, &'static str) {
        let r = SEG_MAP[(field & 0b11) as usize];
        (WordArg::Reg(r), reg16_name(r))
    }

    /// Branch target: IP after the fetch plus a signed displacement.
    fn branch_target(&self, disp: i16) -> u16 {
        self.cpu.regs.get16(regs::IP).wrapping_add(disp as u16)
    }

    fn invalid(&self, opcode: u8) -> ! {
        panic!("invalid opcode 0x{:02X}", opcode)
    }

    /// ALU `op r/m, r` / `op r, r/m` block (bit 0: width, bit 1: direction).
    fn alu_rm_r(&mut self, p: &mut Prepared, opcode: u8, name: &str, op_b: Op, op_w: Op) {
        let m = self.modrm();
        match opcode & 0b11 {
            0b00 => {
                let (rm, rm_desc) = self.rm_b(&m);
                let (r, r_desc) = self.reg_b(m.reg);
                p.op = op_b;
                p.barg1 = Some(rm);
                p.barg2 = Some(r);
                p.desc = format!("{} {}, {}", name, rm_desc, r_desc);
            }
            0b01 => {
                let (rm, rm_desc) = self.rm_w(&m);
                let (r, r_desc) = self.reg_w(m.reg);
                p.op = op_w;
                p.warg1 = Some(rm);
                p.warg2 = Some(r);
                p.desc = format!("{} {}, {}", name, rm_desc, r_desc);
            }
            0b10 => {
                let (rm, rm_desc) = self.rm_b(&m);
                let (r, r_desc) = self.reg_b(m.reg);
                p.op = op_b;
                p.barg1 = Some(r);
                p.barg2 = Some(rm);
                p.desc = format!("{} {}, {}", name, r_desc, rm_desc);
            }
            _ => {
                let (rm, rm_desc) = self.rm_w(&m);
                let (r, r_desc) = self.reg_w(m.reg);
                p.op = op_w;
                p.warg1 = Some(r);
                p.warg2 = Some(rm);
                p.desc = format!("{} {}, {}", name, r_desc, rm_desc);
            }
        }
    }

    /// ALU `op AL/AX, imm` pair (bit 0: width).
    fn alu_acc_imm(&mut self, p: &mut Prepared, opcode: u8, name: &str, op_b: Op, op_w: Op) {
        if opcode & 1 == 0 {
            let v = self.fetch();
            p.op = op_b;
            p.barg1 = Some(ByteArg::Reg(regs::AL));
            p.barg2 = Some(ByteArg::Imm(v));
            p.desc = format!("{} AL, {}", name, hex8(v));
        } else {
            let v = self.fetch_u16();
            p.op = op_w;
            p.warg1 = Some(WordArg::Reg(regs::AX));
            p.warg2 = Some(WordArg::Imm(v));
            p.desc = format!("{} AX, {}", name, hex16(v));
        }
    }

    /// Group 80/81/82/83: ALU `op r/m, imm`, selected by the reg field.
    fn group_alu_imm(&mut self, p: &mut Prepared, opcode: u8) {
        let m = self.modrm();
        let sel = m.reg as usize;
        match opcode {
            0x80 | 0x82 => {
                let (rm, rm_desc) = self.rm_b(&m);
                let v = self.fetch();
                p.op = ALU_OPS_B[sel];
                p.barg1 = Some(rm);
                p.barg2 = Some(ByteArg::Imm(v));
                p.desc = format!("{} {}, {}", ALU_NAMES[sel], rm_desc, hex8(v));
            }
            0x81 => {
                let (rm, rm_desc) = self.rm_w(&m);
                let v = self.fetch_u16();
                p.op = ALU_OPS_W[sel];
                p.warg1 = Some(rm);
                p.warg2 = Some(WordArg::Imm(v));
                p.desc = format!("{} {}, {}", ALU_NAMES[sel], rm_desc, hex16(v));
            }
            _ => {
                // 0x83: byte immediate sign-extended to a word
                let (rm, rm_desc) = self.rm_w(&m);
                let v = sign_extend(self.fetch());
                p.op = ALU_OPS_W[sel];
                p.warg1 = Some(rm);
                p.warg2 = Some(WordArg::Imm(v));
                p.desc = format!("{} {}, {}", ALU_NAMES[sel], rm_desc, hex16(v));
            }
        }
    }

    /// Groups D0-D3 and C0/C1: shifts and rotates, selected by reg field.
    fn group_shift(&mut self, p: &mut Prepared, opcode: u8) {
        let m = self.modrm();
        let sel = m.reg as usize;
        let byte_sized = opcode & 1 == 0;
        let name = SHIFT_NAMES[sel];

        let rm_desc;
        if byte_sized {
            let (rm, d) = self.rm_b(&m);
            p.op = SHIFT_OPS_B[sel];
            p.barg1 = Some(rm);
            rm_desc = d;
        } else {
            let (rm, d) = self.rm_w(&m);
            p.op = SHIFT_OPS_W[sel];
            p.warg1 = Some(rm);
            rm_desc = d;
        }

        match opcode {
            0xD0 | 0xD1 => {
                p.barg2 = Some(ByteArg::Imm(1));
                p.desc = format!("{} {}, 1", name, rm_desc);
            }
            0xD2 | 0xD3 => {
                p.barg2 = Some(ByteArg::Reg(regs::CL));
                p.desc = format!("{} {}, CL", name, rm_desc);
            }
            _ => {
                // C0/C1: shift by immediate count
                let n = self.fetch();
                p.barg2 = Some(ByteArg::Imm(n));
                p.desc = format!("{} {}, {}", name, rm_desc, hex8(n));
            }
        }
    }

    /// Group F6/F7: TEST imm / NOT / NEG / MUL / IMUL / DIV / IDIV.
    fn group_mul(&mut self, p: &mut Prepared, opcode: u8) {
        let m = self.modrm();
        let byte_sized = opcode == 0xF6;
        match m.reg {
            0 | 1 => {
                if byte_sized {
                    let (rm, rm_desc) = self.rm_b(&m);
                    let v = self.fetch();
                    p.op = Op::TestB;
                    p.barg1 = Some(rm);
                    p.barg2 = Some(ByteArg::Imm(v));
                    p.desc = format!("TEST {}, {}", rm_desc, hex8(v));
                } else {
                    let (rm, rm_desc) = self.rm_w(&m);
                    let v = self.fetch_u16();
                    p.op = Op::TestW;
                    p.warg1 = Some(rm);
                    p.warg2 = Some(WordArg::Imm(v));
                    p.desc = format!("TEST {}, {}", rm_desc, hex16(v));
                }
            }
            sel => {
                const NAMES: [&str; 8] = ["", "", "NOT", "NEG", "MUL", "IMUL", "DIV", "IDIV"];
                const OPS_B: [Op; 8] = [
                    Op::Nop,
                    Op::Nop,
                    Op::NotB,
                    Op::NegB,
                    Op::MulB,
                    Op::ImulB,
                    Op::DivB,
                    Op::IdivB,
                ];
                const OPS_W: [Op; 8] = [
                    Op::Nop,
                    Op::Nop,
                    Op::NotW,
                    Op::NegW,
                    Op::MulW,
                    Op::ImulW,
                    Op::DivW,
                    Op::IdivW,
                ];
                if byte_sized {
                    let (rm, rm_desc) = self.rm_b(&m);
                    p.op = OPS_B[sel as usize];
                    p.barg1 = Some(rm);
                    p.desc = format!("{} {}", NAMES[sel as usize], rm_desc);
                } else {
                    let (rm, rm_desc) = self.rm_w(&m);
                    p.op = OPS_W[sel as usize];
                    p.warg1 = Some(rm);
                    p.desc = format!("{} {}", NAMES[sel as usize], rm_desc);
                }
            }
        }
    }

    /// Group FF: INC/DEC/CALL/JMP/PUSH on r/m16.
    fn group_ff(&mut self, p: &mut Prepared, opcode: u8) {
        let m = self.modrm();
        let (rm, rm_desc) = self.rm_w(&m);
        match m.reg {
            0 => {
                p.op = Op::IncW;
                p.warg1 = Some(rm);
                p.desc = format!("INC {}", rm_desc);
            }
            1 => {
                p.op = Op::DecW;
                p.warg1 = Some(rm);
                p.desc = format!("DEC {}", rm_desc);
            }
            2 => {
                p.op = Op::CallRm;
                p.warg1 = Some(rm);
                p.desc = format!("CALL {}", rm_desc);
            }
            3 => {
                p.op = Op::CallFarInd;
                p.warg1 = Some(rm);
                p.desc = format!("CALL FAR {}", rm_desc);
            }
            4 => {
                p.op = Op::JmpRm;
                p.warg1 = Some(rm);
                p.desc = format!("JMP {}", rm_desc);
            }
            5 => {
                p.op = Op::JmpFarInd;
                p.warg1 = Some(rm);
                p.desc = format!("JMP FAR {}", rm_desc);
            }
            6 => {
                p.op = Op::PushW;
                p.warg1 = Some(rm);
                p.desc = format!("PUSH {}", rm_desc);
            }
            _ => self.invalid(opcode),
        }
    }

    /// Relative branch with an 8-bit displacement.
    fn rel8_branch(&mut self, p: &mut Prepared, op: Op, name: &str) {
        let disp = self.fetch_i8();
        let target = self.branch_target(disp);
        p.op = op;
        p.warg1 = Some(WordArg::Imm(target));
        p.desc = format!("{} {}", name, hex16(target));
    }

    fn run(mut self, cs: u16, ip: u16) -> Prepared {
        let mut p = Prepared {
            opcode: 0,
            op: Op::Nop,
            seg: regs::DS,
            rep: Rep::None,
            warg1: None,
            warg2: None,
            barg1: None,
            barg2: None,
            len: 0,
            cs,
            ip,
            desc: String::new(),
        };

        // Prefix loop: any mix of segment override, LOCK, and repeat.
        let opcode = loop {
            let byte = self.fetch();
            match byte {
                0x26 => self.seg_override = Some(regs::ES),
                0x2E => self.seg_override = Some(regs::CS),
                0x36 => self.seg_override = Some(regs::SS),
                0x3E => self.seg_override = Some(regs::DS),
                0xF0 => {} // LOCK is accepted and ignored
                0xF2 => self.rep = Rep::Repne,
                0xF3 => self.rep = Rep::Rep,
                _ => break byte,
            }
        };
        p.opcode = opcode;

        match opcode {
            // ALU families: r/m,r - r,r/m - acc,imm plus the segment
            // push/pop opcodes interleaved with them.
            0x00..=0x03 => self.alu_rm_r(&mut p, opcode, "ADD", Op::AddB, Op::AddW),
            0x04 | 0x05 => self.alu_acc_imm(&mut p, opcode, "ADD", Op::AddB, Op::AddW),
            0x08..=0x0B => self.alu_rm_r(&mut p, opcode, "OR", Op::OrB, Op::OrW),
            0x0C | 0x0D => self.alu_acc_imm(&mut p, opcode, "OR", Op::OrB, Op::OrW),
            0x10..=0x13 => self.alu_rm_r(&mut p, opcode, "ADC", Op::AdcB, Op::AdcW),
            0x14 | 0x15 => self.alu_acc_imm(&mut p, opcode, "ADC", Op::AdcB, Op::AdcW),
            0x18..=0x1B => self.alu_rm_r(&mut p, opcode, "SBB", Op::SbbB, Op::SbbW),
            0x1C | 0x1D => self.alu_acc_imm(&mut p, opcode, "SBB", Op::SbbB, Op::SbbW),
            0x20..=0x23 => self.alu_rm_r(&mut p, opcode, "AND", Op::AndB, Op::AndW),
            0x24 | 0x25 => self.alu_acc_imm(&mut p, opcode, "AND", Op::AndB, Op::AndW),
            0x28..=0x2B => self.alu_rm_r(&mut p, opcode, "SUB", Op::SubB, Op::SubW),
            0x2C | 0x2D => self.alu_acc_imm(&mut p, opcode, "SUB", Op::SubB, Op::SubW),
            0x30..=0x33 => self.alu_rm_r(&mut p, opcode, "XOR", Op::XorB, Op::XorW),
            0x34 | 0x35 => self.alu_acc_imm(&mut p, opcode, "XOR", Op::XorB, Op::XorW),
            0x38..=0x3B => self.alu_rm_r(&mut p, opcode, "CMP", Op::CmpB, Op::CmpW),
            0x3C | 0x3D => self.alu_acc_imm(&mut p, opcode, "CMP", Op::CmpB, Op::CmpW),

            0x06 | 0x0E | 0x16 | 0x1E => {
                let (r, name) = self.sreg(opcode >> 3);
                p.op = Op::PushW;
                p.warg1 = Some(r);
                p.desc = format!("PUSH {}", name);
            }
            0x07 | 0x17 | 0x1F => {
                let (r, name) = self.sreg(opcode >> 3);
                p.op = Op::PopW;
                p.warg1 = Some(r);
                p.desc = format!("POP {}", name);
            }

            // BCD adjust family: decodes, never executes.
            0x27 => {
                p.op = Op::Unsupported("DAA");
                p.desc = "DAA".into();
            }
            0x2F => {
                p.op = Op::Unsupported("DAS");
                p.desc = "DAS".into();
            }
            0x37 => {
                p.op = Op::Unsupported("AAA");
                p.desc = "AAA".into();
            }
            0x3F => {
                p.op = Op::Unsupported("AAS");
                p.desc = "AAS".into();
            }

            0x40..=0x47 => {
                let (r, name) = self.reg_w(opcode);
                p.op = Op::IncW;
                p.warg1 = Some(r);
                p.desc = format!("INC {}", name);
            }
            0x48..=0x4F => {
                let (r, name) = self.reg_w(opcode);
                p.op = Op::DecW;
                p.warg1 = Some(r);
                p.desc = format!("DEC {}", name);
            }
            0x50..=0x57 => {
                let (r, name) = self.reg_w(opcode);
                p.op = Op::PushW;
                p.warg1 = Some(r);
                p.desc = format!("PUSH {}", name);
            }
            0x58..=0x5F => {
                let (r, name) = self.reg_w(opcode);
                p.op = Op::PopW;
                p.warg1 = Some(r);
                p.desc = format!("POP {}", name);
            }

            0x70..=0x7F => {
                let cond = COND_TABLE[(opcode & 0x0F) as usize];
                self.rel8_branch(&mut p, Op::Jcc(cond), cond.name());
            }

            0x80..=0x83 => self.group_alu_imm(&mut p, opcode),

            0x84 | 0x85 => self.alu_rm_r(&mut p, opcode & 0x01, "TEST", Op::TestB, Op::TestW),
            0x86 | 0x87 => self.alu_rm_r(&mut p, opcode & 0x01, "XCHG", Op::XchgB, Op::XchgW),
            0x88..=0x8B => self.alu_rm_r(&mut p, opcode, "MOV", Op::MovB, Op::MovW),

            0x8C => {
                let m = self.modrm();
                let (rm, rm_desc) = self.rm_w(&m);
                let (sr, sr_name) = self.sreg(m.reg);
                p.op = Op::MovW;
                p.warg1 = Some(rm);
                p.warg2 = Some(sr);
                p.desc = format!("MOV {}, {}", rm_desc, sr_name);
            }
            0x8D => {
                let m = self.modrm();
                let ea = match &m.ea {
                    Some(ea) => ea,
                    None => self.invalid(opcode),
                };
                let offset = ea.offset;
                let ea_desc = ea.desc.clone();
                let (r, r_name) = self.reg_w(m.reg);
                p.op = Op::Lea;
                p.warg1 = Some(r);
                p.warg2 = Some(WordArg::Imm(offset));
                p.desc = format!("LEA {}, {}", r_name, ea_desc);
            }
            0x8E => {
                let m = self.modrm();
                let (rm, rm_desc) = self.rm_w(&m);
                let (sr, sr_name) = self.sreg(m.reg);
                p.op = Op::MovW;
                p.warg1 = Some(sr);
                p.warg2 = Some(rm);
                p.desc = format!("MOV {}, {}", sr_name, rm_desc);
            }
            0x8F => {
                let m = self.modrm();
                let (rm, rm_desc) = self.rm_w(&m);
                p.op = Op::PopW;
                p.warg1 = Some(rm);
                p.desc = format!("POP {}", rm_desc);
            }

            0x90 => {
                p.op = Op::Nop;
                p.desc = "NOP".into();
            }
            0x91..=0x97 => {
                let (r, name) = self.reg_w(opcode);
                p.op = Op::XchgW;
                p.warg1 = Some(WordArg::Reg(regs::AX));
                p.warg2 = Some(r);
                p.desc = format!("XCHG AX, {}", name);
            }

            0x98 => {
                p.op = Op::Cbw;
                p.desc = "CBW".into();
            }
            0x99 => {
                p.op = Op::Cwd;
                p.desc = "CWD".into();
            }
            0x9A => {
                let off = self.fetch_u16();
                let seg = self.fetch_u16();
                p.op = Op::CallFar;
                p.warg1 = Some(WordArg::Imm(off));
                p.warg2 = Some(WordArg::Imm(seg));
                p.desc = format!("CALL {:04X}h:{:04X}h", seg, off);
            }
            0x9B => {
                p.op = Op::Unsupported("WAIT");
                p.desc = "WAIT".into();
            }
            0x9C => {
                p.op = Op::Pushf;
                p.desc = "PUSHF".into();
            }
            0x9D => {
                p.op = Op::Popf;
                p.desc = "POPF".into();
            }
            0x9E => {
                p.op = Op::Sahf;
                p.desc = "SAHF".into();
            }
            0x9F => {
                p.op = Op::Lahf;
                p.desc = "LAHF".into();
            }

            // MOV between the accumulator and a direct address.
            0xA0..=0xA3 => {
                let off = self.fetch_u16();
                let seg = self.seg_override.unwrap_or(regs::DS);
                let addr = self.lin(seg, off);
                let ea_desc = self.ea_desc(&format!("[{:04X}h]", off));
                match opcode {
                    0xA0 => {
                        p.op = Op::MovB;
                        p.barg1 = Some(ByteArg::Reg(regs::AL));
                        p.barg2 = Some(ByteArg::Mem(addr));
                        p.desc = format!("MOV AL, {}", ea_desc);
                    }
                    0xA1 => {
                        p.op = Op::MovW;
                        p.warg1 = Some(WordArg::Reg(regs::AX));
                        p.warg2 = Some(WordArg::Mem(addr));
                        p.desc = format!("MOV AX, {}", ea_desc);
                    }
                    0xA2 => {
                        p.op = Op::MovB;
                        p.barg1 = Some(ByteArg::Mem(addr));
                        p.barg2 = Some(ByteArg::Reg(regs::AL));
                        p.desc = format!("MOV {}, AL", ea_desc);
                    }
                    _ => {
                        p.op = Op::MovW;
                        p.warg1 = Some(WordArg::Mem(addr));
                        p.warg2 = Some(WordArg::Reg(regs::AX));
                        p.desc = format!("MOV {}, AX", ea_desc);
                    }
                }
            }

            0xA4 => {
                p.op = Op::Movsb;
                p.desc = "MOVSB".into();
            }
            0xA5 => {
                p.op = Op::Movsw;
                p.desc = "MOVSW".into();
            }
            0xA6 => {
                p.op = Op::Cmpsb;
                p.desc = "CMPSB".into();
            }
            0xA7 => {
                p.op = Op::Cmpsw;
                p.desc = "CMPSW".into();
            }
            0xA8 | 0xA9 => self.alu_acc_imm(&mut p, opcode, "TEST", Op::TestB, Op::TestW),
            0xAA => {
                p.op = Op::Stosb;
                p.desc = "STOSB".into();
            }
            0xAB => {
                p.op = Op::Stosw;
                p.desc = "STOSW".into();
            }
            0xAC => {
                p.op = Op::Lodsb;
                p.desc = "LODSB".into();
            }
            0xAD => {
                p.op = Op::Lodsw;
                p.desc = "LODSW".into();
            }
            0xAE => {
                p.op = Op::Scasb;
                p.desc = "SCASB".into();
            }
            0xAF => {
                p.op = Op::Scasw;
                p.desc = "SCASW".into();
            }

            0xB0..=0xB7 => {
                let (r, name) = self.reg_b(opcode);
                let v = self.fetch();
                p.op = Op::MovB;
                p.barg1 = Some(r);
                p.barg2 = Some(ByteArg::Imm(v));
                p.desc = format!("MOV {}, {}", name, hex8(v));
            }
            0xB8..=0xBF => {
                let (r, name) = self.reg_w(opcode);
                let v = self.fetch_u16();
                p.op = Op::MovW;
                p.warg1 = Some(r);
                p.warg2 = Some(WordArg::Imm(v));
                p.desc = format!("MOV {}, {}", name, hex16(v));
            }

            0xC0 | 0xC1 => self.group_shift(&mut p, opcode),

            0xC2 => {
                let v = self.fetch_u16();
                p.op = Op::RetImm;
                p.warg1 = Some(WordArg::Imm(v));
                p.desc = format!("RET {}", hex16(v));
            }
            0xC3 => {
                p.op = Op::Ret;
                p.desc = "RET".into();
            }

            0xC4 | 0xC5 => {
                let m = self.modrm();
                let (rm, rm_desc) = self.rm_w(&m);
                if !matches!(rm, WordArg::Mem(_)) {
                    self.invalid(opcode);
                }
                let (r, r_name) = self.reg_w(m.reg);
                p.op = if opcode == 0xC4 { Op::Les } else { Op::Lds };
                p.warg1 = Some(r);
                p.warg2 = Some(rm);
                let name = if opcode == 0xC4 { "LES" } else { "LDS" };
                p.desc = format!("{} {}, {}", name, r_name, rm_desc);
            }

            0xC6 => {
                let m = self.modrm();
                let (rm, rm_desc) = self.rm_b(&m);
                let v = self.fetch();
                p.op = Op::MovB;
                p.barg1 = Some(rm);
                p.barg2 = Some(ByteArg::Imm(v));
                p.desc = format!("MOV {}, {}", rm_desc, hex8(v));
            }
            0xC7 => {
                let m = self.modrm();
                let (rm, rm_desc) = self.rm_w(&m);
                let v = self.fetch_u16();
                p.op = Op::MovW;
                p.warg1 = Some(rm);
                p.warg2 = Some(WordArg::Imm(v));
                p.desc = format!("MOV {}, {}", rm_desc, hex16(v));
            }

            0xCA => {
                let v = self.fetch_u16();
                p.op = Op::RetfImm;
                p.warg1 = Some(WordArg::Imm(v));
                p.desc = format!("RETF {}", hex16(v));
            }
            0xCB => {
                p.op = Op::Retf;
                p.desc = "RETF".into();
            }
            0xCC => {
                p.op = Op::Int;
                p.barg1 = Some(ByteArg::Imm(3));
                p.desc = "INT 3".into();
            }
            0xCD => {
                let n = self.fetch();
                p.op = Op::Int;
                p.barg1 = Some(ByteArg::Imm(n));
                p.desc = format!("INT {}", hex8(n));
            }
            0xCE => {
                p.op = Op::Unsupported("INTO");
                p.desc = "INTO".into();
            }
            0xCF => {
                p.op = Op::Iret;
                p.desc = "IRET".into();
            }

            0xD0..=0xD3 => self.group_shift(&mut p, opcode),

            0xD4 => {
                let base = self.fetch();
                p.op = Op::Unsupported("AAM");
                p.desc = format!("AAM {}", hex8(base));
            }
            0xD5 => {
                let base = self.fetch();
                p.op = Op::Unsupported("AAD");
                p.desc = format!("AAD {}", hex8(base));
            }
            0xD7 => {
                p.op = Op::Xlat;
                p.desc = "XLAT".into();
            }
            0xD8..=0xDF => {
                // Coprocessor escape carries a ModR/M byte.
                let _ = self.modrm();
                p.op = Op::Unsupported("ESC");
                p.desc = "ESC".into();
            }

            0xE0 => self.rel8_branch(&mut p, Op::Loopnz, "LOOPNZ"),
            0xE1 => self.rel8_branch(&mut p, Op::Loopz, "LOOPZ"),
            0xE2 => self.rel8_branch(&mut p, Op::Loop, "LOOP"),
            0xE3 => self.rel8_branch(&mut p, Op::Jcxz, "JCXZ"),

            0xE4 => {
                let port = self.fetch();
                p.op = Op::InB;
                p.barg1 = Some(ByteArg::Reg(regs::AL));
                p.barg2 = Some(ByteArg::Imm(port));
                p.desc = format!("IN AL, {}", hex8(port));
            }
            0xE5 => {
                let port = self.fetch();
                p.op = Op::Unsupported("IN AX");
                p.desc = format!("IN AX, {}", hex8(port));
            }
            0xE6 => {
                let port = self.fetch();
                p.op = Op::OutB;
                p.barg1 = Some(ByteArg::Reg(regs::AL));
                p.barg2 = Some(ByteArg::Imm(port));
                p.desc = format!("OUT {}, AL", hex8(port));
            }
            0xE7 => {
                let port = self.fetch();
                p.op = Op::Unsupported("OUT AX");
                p.desc = format!("OUT {}, AX", hex8(port));
            }

            0xE8 => {
                let disp = self.fetch_u16() as i16;
                let target = self.branch_target(disp);
                p.op = Op::CallNear;
                p.warg1 = Some(WordArg::Imm(target));
                p.desc = format!("CALL {}", hex16(target));
            }
            0xE9 => {
                let disp = self.fetch_u16() as i16;
                let target = self.branch_target(disp);
                p.op = Op::JmpNear;
                p.warg1 = Some(WordArg::Imm(target));
                p.desc = format!("JMP {}", hex16(target));
            }
            0xEA => {
                let off = self.fetch_u16();
                let seg = self.fetch_u16();
                p.op = Op::JmpFar;
                p.warg1 = Some(WordArg::Imm(off));
                p.warg2 = Some(WordArg::Imm(seg));
                p.desc = format!("JMP {:04X}h:{:04X}h", seg, off);
            }
            0xEB => self.rel8_branch(&mut p, Op::JmpShort, "JMP"),

            0xEC => {
                p.op = Op::InB;
                p.barg1 = Some(ByteArg::Reg(regs::AL));
                p.warg2 = Some(WordArg::Reg(regs::DX));
                p.desc = "IN AL, DX".into();
            }
            0xED => {
                p.op = Op::Unsupported("IN AX");
                p.desc = "IN AX, DX".into();
            }
            0xEE => {
                p.op = Op::OutB;
                p.barg1 = Some(ByteArg::Reg(regs::AL));
                p.warg2 = Some(WordArg::Reg(regs::DX));
                p.desc = "OUT DX, AL".into();
            }
            0xEF => {
                p.op = Op::Unsupported("OUT AX");
                p.desc = "OUT DX, AX".into();
            }

            0xF4 => {
                p.op = Op::Unsupported("HLT");
                p.desc = "HLT".into();
            }
            0xF5 => {
                p.op = Op::Cmc;
                p.desc = "CMC".into();
            }

            0xF6 | 0xF7 => self.group_mul(&mut p, opcode),

            0xF8 => {
                p.op = Op::Clc;
                p.desc = "CLC".into();
            }
            0xF9 => {
                p.op = Op::Stc;
                p.desc = "STC".into();
            }
            0xFA => {
                p.op = Op::Cli;
                p.desc = "CLI".into();
            }
            0xFB => {
                p.op = Op::Sti;
                p.desc = "STI".into();
            }
            0xFC => {
                p.op = Op::Cld;
                p.desc = "CLD".into();
            }
            0xFD => {
                p.op = Op::Std;
                p.desc = "STD".into();
            }

            0xFE => {
                let m = self.modrm();
                let (rm, rm_desc) = self.rm_b(&m);
                match m.reg {
                    0 => {
                        p.op = Op::IncB;
                        p.barg1 = Some(rm);
                        p.desc = format!("INC {}", rm_desc);
                    }
                    1 => {
                        p.op = Op::DecB;
                        p.barg1 = Some(rm);
                        p.desc = format!("DEC {}", rm_desc);
                    }
                    _ => self.invalid(opcode),
                }
            }
            0xFF => self.group_ff(&mut p, opcode),

            // Holes in the 8086 map.
            _ => self.invalid(opcode),
        }

        p.seg = self.seg_override.unwrap_or(regs::DS);
        p.rep = self.rep;
        p.len = self.len;
        if p.rep == Rep::Rep {
            p.desc = format!("REP {}", p.desc);
        } else if p.rep == Rep::Repne {
            p.desc = format!("REPNE {}", p.desc);
        }
        p
    }
}
