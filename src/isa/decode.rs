use super::Opcode;

/// A 16-bit instruction word split into its three fixed-width fields, with
/// accessors for the two interpretations of the trailing 6-bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstruction {
    pub opcode: Opcode,
    pub src: u8,
    dst_or_imm: u8,
}

impl DecodedInstruction {
    /// The trailing field read as a register index (0..63).
    pub fn dst_reg(&self) -> usize {
        self.dst_or_imm as usize
    }

    /// The trailing field sign-extended from 6 bits to 8 bits, for opcodes
    /// that use it as a signed immediate (MOVI, ANDI, SAL, SAR).
    pub fn imm_signed(&self) -> i8 {
        let v = self.dst_or_imm & 0x3F;
        if v & 0x20 != 0 {
            (v | 0xC0) as i8
        } else {
            v as i8
        }
    }

    /// The trailing field zero-extended from 6 bits to 8 bits, for opcodes
    /// that use it as an unsigned address/offset (BEQZ, LDR, STR).
    pub fn imm_unsigned(&self) -> u8 {
        self.dst_or_imm & 0x3F
    }
}

/// Splits a 16-bit instruction word into opcode, source register, and
/// trailing field. Purely a bitfield operation; extension to 8 bits happens
/// lazily via [`DecodedInstruction::imm_signed`] / [`imm_unsigned`].
pub fn decode(word: u16) -> DecodedInstruction {
    let opcode = Opcode::from_bits(((word >> 12) & 0xF) as u8);
    let src = ((word >> 6) & 0x3F) as u8;
    let dst_or_imm = (word & 0x3F) as u8;
    DecodedInstruction {
        opcode,
        src,
        dst_or_imm,
    }
}
