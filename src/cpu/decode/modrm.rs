//! ModR/M decoding and effective-address computation
//!
//! The ModR/M byte packs `mod(2) | reg(3) | rm(3)`. Hardware register
//! encodings differ from the register-file index order, so the maps below
//! translate each 3-bit field into a file index.

use crate::cpu::regs::{self, REG16_NAMES, REG8_NAMES};

use super::Decoder;

/// Hardware r16 encoding (AX CX DX BX SP BP SI DI) to register-file index.
pub(super) const R16_MAP: [usize; 8] = [
    regs::AX,
    regs::CX,
    regs::DX,
    regs::BX,
    regs::SP,
    regs::BP,
    regs::SI,
    regs::DI,
];

/// Hardware r8 encoding (AL CL DL BL AH CH DH BH) to register-file index.
pub(super) const R8_MAP: [usize; 8] = [
    regs::AL,
    regs::CL,
    regs::DL,
    regs::BL,
    regs::AH,
    regs::CH,
    regs::DH,
    regs::BH,
];

/// Hardware segment encoding (ES CS SS DS) to register-file index.
pub(super) const SEG_MAP: [usize; 4] = [regs::ES, regs::CS, regs::SS, regs::DS];

pub(super) fn reg16_name(file_index: usize) -> &'static str {
    REG16_NAMES[file_index]
}

pub(super) fn reg8_name(file_index: usize) -> &'static str {
    REG8_NAMES[file_index]
}

/// A resolved effective address: default or overridden segment (as a
/// register-file index), 16-bit offset, and its textual form.
pub(super) struct Ea {
    pub seg: usize,
    pub offset: u16,
    pub desc: String,
}

/// A decoded ModR/M byte with any displacement already consumed.
pub(super) struct ModRm {
    /// The `reg` field: register operand or group-opcode selector.
    pub reg: u8,
    /// The `rm` field, meaningful as a register when `ea` is `None`.
    pub rm: u8,
    /// Effective address for the memory modes; `None` for mod=11.
    pub ea: Option<Ea>,
}

// Base expression, default segment, and display text per rm encoding
// (Intel 8086 Table 2-2). The default segment is SS whenever BP is a base.
const EA_BASES: [(&str, usize); 8] = [
    ("BX+SI", regs::DS),
    ("BX+DI", regs::DS),
    ("BP+SI", regs::SS),
    ("BP+DI", regs::SS),
    ("SI", regs::DS),
    ("DI", regs::DS),
    ("BP", regs::SS),
    ("BX", regs::DS),
];

impl Decoder<'_> {
    /// Fetch and resolve a ModR/M byte, including displacement or direct
    /// address bytes.
    pub(super) fn modrm(&mut self) -> ModRm {
        let byte = self.fetch();
        let mode = byte >> 6;
        let reg = (byte >> 3) & 0b111;
        let rm = byte & 0b111;

        if mode == 0b11 {
            return ModRm { reg, rm, ea: None };
        }

        // mod=00 rm=110 is a direct 16-bit address, not [BP].
        if mode == 0b00 && rm == 0b110 {
            let offset = self.fetch_u16();
            let desc = self.ea_desc(&format!("[{:04X}h]", offset));
            let seg = self.seg_override.unwrap_or(regs::DS);
            return ModRm {
                reg,
                rm,
                ea: Some(Ea { seg, offset, desc }),
            };
        }

        let disp: i16 = match mode {
            0b00 => 0,
            0b01 => self.fetch() as i8 as i16,
            _ => self.fetch_u16() as i16,
        };

        let (base_desc, default_seg) = EA_BASES[rm as usize];
        let base = self.ea_base(rm);
        let offset = base.wrapping_add(disp as u16);
        let seg = self.seg_override.unwrap_or(default_seg);

        let inner = if disp == 0 {
            format!("[{}]", base_desc)
        } else if disp > 0 {
            format!("[{}+{:X}h]", base_desc, disp)
        } else {
            format!("[{}-{:X}h]", base_desc, -(disp as i32))
        };
        let desc = self.ea_desc(&inner);

        ModRm {
            reg,
            rm,
            ea: Some(Ea { seg, offset, desc }),
        }
    }

    /// Sum of the base/index registers for an rm encoding.
    fn ea_base(&self, rm: u8) -> u16 {
        let r = &self.cpu.regs;
        match rm {
            0b000 => r.get16(regs::BX).wrapping_add(r.get16(regs::SI)),
            0b001 => r.get16(regs::BX).wrapping_add(r.get16(regs::DI)),
            0b010 => r.get16(regs::BP).wrapping_add(r.get16(regs::SI)),
            0b011 => r.get16(regs::BP).wrapping_add(r.get16(regs::DI)),
            0b100 => r.get16(regs::SI),
            0b101 => r.get16(regs::DI),
            0b110 => r.get16(regs::BP),
            _ => r.get16(regs::BX),
        }
    }

    /// Prefix an address expression with the segment override, if any.
    pub(super) fn ea_desc(&self, inner: &str) -> String {
        match self.seg_override {
            Some(seg) => format!("{}:{}", REG16_NAMES[seg], inner),
            None => inner.to_string(),
        }
    }
}
