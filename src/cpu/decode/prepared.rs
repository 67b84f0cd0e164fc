//! The prepared instruction: decoded, not yet executed

use super::operands::{ByteArg, WordArg};

/// Repeat prefix recorded during the prefix loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rep {
    /// No repeat prefix.
    None,
    /// REP/REPE (0xF3): repeat while CX != 0; on CMPS/SCAS also while ZF=1.
    Rep,
    /// REPNE (0xF2): repeat while CX != 0 and ZF=0 on CMPS/SCAS.
    Repne,
}

/// Condition codes for the 0x70..0x7F branch block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    O,
    No,
    B,
    Nb,
    Z,
    Nz,
    Be,
    A,
    S,
    Ns,
    Pe,
    Po,
    L,
    Ge,
    Le,
    G,
}

impl Cond {
    pub fn name(self) -> &'static str {
        match self {
            Cond::O => "JO",
            Cond::No => "JNO",
            Cond::B => "JB",
            Cond::Nb => "JNB",
            Cond::Z => "JZ",
            Cond::Nz => "JNZ",
            Cond::Be => "JBE",
            Cond::A => "JA",
            Cond::S => "JS",
            Cond::Ns => "JNS",
            Cond::Pe => "JPE",
            Cond::Po => "JPO",
            Cond::L => "JL",
            Cond::Ge => "JGE",
            Cond::Le => "JLE",
            Cond::G => "JG",
        }
    }
}

/// Mnemonic identifier. Width is part of the identifier (`..B` operates on
/// `barg1`/`barg2`, `..W` on `warg1`/`warg2`) so the executor never guesses
/// operand sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // Data transfer
    MovB,
    MovW,
    XchgB,
    XchgW,
    Lea,
    Lds,
    Les,
    Xlat,
    Cbw,
    Cwd,
    Lahf,
    Sahf,
    Nop,
    // Stack
    PushW,
    PopW,
    Pushf,
    Popf,
    // Arithmetic
    AddB,
    AddW,
    AdcB,
    AdcW,
    SubB,
    SubW,
    SbbB,
    SbbW,
    CmpB,
    CmpW,
    IncB,
    IncW,
    DecB,
    DecW,
    NegB,
    NegW,
    MulB,
    MulW,
    ImulB,
    ImulW,
    DivB,
    DivW,
    IdivB,
    IdivW,
    // Logic
    AndB,
    AndW,
    OrB,
    OrW,
    XorB,
    XorW,
    TestB,
    TestW,
    NotB,
    NotW,
    // Shifts and rotates
    RolB,
    RolW,
    RorB,
    RorW,
    RclB,
    RclW,
    RcrB,
    RcrW,
    ShlB,
    ShlW,
    ShrB,
    ShrW,
    SarB,
    SarW,
    // String primitives
    Movsb,
    Movsw,
    Cmpsb,
    Cmpsw,
    Stosb,
    Stosw,
    Lodsb,
    Lodsw,
    Scasb,
    Scasw,
    // Control transfer
    Jcc(Cond),
    JmpShort,
    JmpNear,
    JmpRm,
    JmpFar,
    JmpFarInd,
    CallNear,
    CallRm,
    CallFar,
    CallFarInd,
    Loop,
    Loopz,
    Loopnz,
    Jcxz,
    Ret,
    RetImm,
    Retf,
    RetfImm,
    Iret,
    Int,
    // Flags
    Clc,
    Stc,
    Cmc,
    Cld,
    Std,
    Cli,
    Sti,
    // I/O
    InB,
    OutB,
    /// Decoded with the correct length but with no executable semantics.
    /// Fatal when executed, skipped during dry runs.
    Unsupported(&'static str),
}

impl Op {
    /// True for the string primitives the REP prefix loops over.
    pub fn is_string(self) -> bool {
        matches!(
            self,
            Op::Movsb
                | Op::Movsw
                | Op::Cmpsb
                | Op::Cmpsw
                | Op::Stosb
                | Op::Stosw
                | Op::Lodsb
                | Op::Lodsw
                | Op::Scasb
                | Op::Scasw
        )
    }

    /// True for string primitives whose REPE/REPNE loop consults ZF.
    pub fn rep_tests_zf(self) -> bool {
        matches!(self, Op::Cmpsb | Op::Cmpsw | Op::Scasb | Op::Scasw)
    }
}

/// A fully decoded instruction, consumed exactly once by the executor.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Primary opcode byte.
    pub opcode: u8,
    /// Mnemonic identifier.
    pub op: Op,
    /// Effective data segment: register-file index, DS unless overridden
    /// by a segment prefix. String sources honor this; destinations are
    /// always ES:DI.
    pub seg: usize,
    /// Repeat prefix.
    pub rep: Rep,
    pub warg1: Option<WordArg>,
    pub warg2: Option<WordArg>,
    pub barg1: Option<ByteArg>,
    pub barg2: Option<ByteArg>,
    /// Bytes consumed from the stream, prefixes included.
    pub len: u16,
    /// CS:IP at which fetch began.
    pub cs: u16,
    pub ip: u16,
    /// Human-readable form, e.g. `MOV AX, 1234h`.
    pub desc: String,
}

impl Prepared {
    pub fn w1(&self) -> WordArg {
        self.warg1
            .unwrap_or_else(|| panic!("check failed: warg1 missing for {}", self.desc))
    }

    pub fn w2(&self) -> WordArg {
        self.warg2
            .unwrap_or_else(|| panic!("check failed: warg2 missing for {}", self.desc))
    }

    pub fn b1(&self) -> ByteArg {
        self.barg1
            .unwrap_or_else(|| panic!("check failed: barg1 missing for {}", self.desc))
    }

    pub fn b2(&self) -> ByteArg {
        self.barg2
            .unwrap_or_else(|| panic!("check failed: barg2 missing for {}", self.desc))
    }
}
