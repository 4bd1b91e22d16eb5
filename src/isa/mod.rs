//! Instruction word layout and decoding.

mod decode;

pub use decode::{decode, DecodedInstruction};

/// The twelve defined opcodes, plus a catch-all for unassigned bit patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Opcode {
    #[default]
    Add,
    Sub,
    Mul,
    Movi,
    Beqz,
    Andi,
    Eor,
    Br,
    Sal,
    Sar,
    Ldr,
    Str,
    Undefined(u8),
}

impl Opcode {
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Opcode::Add,
            1 => Opcode::Sub,
            2 => Opcode::Mul,
            3 => Opcode::Movi,
            4 => Opcode::Beqz,
            5 => Opcode::Andi,
            6 => Opcode::Eor,
            7 => Opcode::Br,
            8 => Opcode::Sal,
            9 => Opcode::Sar,
            10 => Opcode::Ldr,
            11 => Opcode::Str,
            other => Opcode::Undefined(other),
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Movi => "MOVI",
            Opcode::Beqz => "BEQZ",
            Opcode::Andi => "ANDI",
            Opcode::Eor => "EOR",
            Opcode::Br => "BR",
            Opcode::Sal => "SAL",
            Opcode::Sar => "SAR",
            Opcode::Ldr => "LDR",
            Opcode::Str => "STR",
            Opcode::Undefined(_) => "UNDEFINED",
        }
    }

    /// Opcodes whose trailing 6-bit field is a signed immediate rather than
    /// a destination register index or zero-extended offset.
    pub fn uses_signed_immediate(&self) -> bool {
        matches!(self, Opcode::Movi | Opcode::Andi | Opcode::Sal | Opcode::Sar)
    }

    /// Opcodes whose trailing 6-bit field is a zero-extended address/offset.
    pub fn uses_zero_extended_immediate(&self) -> bool {
        matches!(self, Opcode::Beqz | Opcode::Ldr | Opcode::Str)
    }

    pub fn bits(&self) -> u8 {
        match self {
            Opcode::Add => 0,
            Opcode::Sub => 1,
            Opcode::Mul => 2,
            Opcode::Movi => 3,
            Opcode::Beqz => 4,
            Opcode::Andi => 5,
            Opcode::Eor => 6,
            Opcode::Br => 7,
            Opcode::Sal => 8,
            Opcode::Sar => 9,
            Opcode::Ldr => 10,
            Opcode::Str => 11,
            Opcode::Undefined(bits) => *bits,
        }
    }
}
