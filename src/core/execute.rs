use crate::arch::status::Flag;
use crate::arch::{RegisterFile, StatusRegister};
use crate::isa::{DecodedInstruction, Opcode};

/// Emitted by the execute unit when a branch should flush the pipeline and
/// redirect fetch to a new program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushRequest {
    pub new_pc: u16,
}

/// Everything the controller and trace emitter need after one execute step:
/// the flush request (if any) and a human-readable operation summary for the
/// trace, grounded on the original C source's per-opcode `printf` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteOutcome {
    pub flush: Option<FlushRequest>,
    pub summary: String,
}

fn add(a: i8, b: i8) -> (i8, bool, bool) {
    let ua = a as u8 as u16;
    let ub = b as u8 as u16;
    let sum = ua + ub;
    let carry = sum > 0xFF;
    let result = sum as u8 as i8;
    let overflow = (a >= 0 && b >= 0 && result < 0) || (a < 0 && b < 0 && result >= 0);
    (result, carry, overflow)
}

fn sub(a: i8, b: i8) -> (i8, bool) {
    let result = a.wrapping_sub(b);
    let overflow = (a >= 0 && b < 0 && result < 0) || (a < 0 && b >= 0 && result >= 0);
    (result, overflow)
}

/// Executes one decoded instruction against the machine's architectural
/// state, applying exactly the register/memory/flag writes the opcode table
/// specifies, and returns a flush request (if a branch was taken) plus a
/// trace-ready summary of what happened.
///
/// `pc` is the address the instruction was fetched from, used as the base
/// for `BEQZ`'s relative offset; the caller is responsible for applying the
/// returned flush target to the machine's program counter.
pub fn execute(
    decoded: &DecodedInstruction,
    pc: u16,
    regs: &mut RegisterFile,
    sr: &mut StatusRegister,
    data_mem: &mut [i8],
) -> ExecuteOutcome {
    let src = decoded.src as usize;
    let dst = decoded.dst_reg();

    match decoded.opcode {
        Opcode::Add => {
            let (a, b) = (regs.read(src), regs.read(dst));
            let (result, carry, overflow) = add(a, b);
            regs.write(src, result);
            let negative = result < 0;
            sr.set(Flag::Carry, carry);
            sr.set(Flag::Overflow, overflow);
            sr.set(Flag::Negative, negative);
            sr.set(Flag::Sign, negative ^ overflow);
            sr.set(Flag::Zero, result == 0);
            ExecuteOutcome {
                flush: None,
                summary: format!(
                    "ADD: R{src} ({a}) + R{dst} ({b}) -> R{src} = {result}"
                ),
            }
        }
        Opcode::Sub => {
            let (a, b) = (regs.read(src), regs.read(dst));
            let (result, overflow) = sub(a, b);
            regs.write(src, result);
            let negative = result < 0;
            sr.set(Flag::Overflow, overflow);
            sr.set(Flag::Negative, negative);
            sr.set(Flag::Sign, negative ^ overflow);
            sr.set(Flag::Zero, result == 0);
            ExecuteOutcome {
                flush: None,
                summary: format!(
                    "SUB: R{src} ({a}) - R{dst} ({b}) -> R{src} = {result}"
                ),
            }
        }
        Opcode::Mul => {
            let (a, b) = (regs.read(src), regs.read(dst));
            let result = (a as i32).wrapping_mul(b as i32) as i8;
            regs.write(src, result);
            sr.set(Flag::Negative, result < 0);
            sr.set(Flag::Zero, result == 0);
            ExecuteOutcome {
                flush: None,
                summary: format!(
                    "MUL: R{src} ({a}) * R{dst} ({b}) -> R{src} = {result}"
                ),
            }
        }
        Opcode::Movi => {
            let before = regs.read(src);
            let imm = decoded.imm_signed();
            regs.write(src, imm);
            ExecuteOutcome {
                flush: None,
                summary: format!("MOVI: R{src} ({before}) -> {imm}"),
            }
        }
        Opcode::Beqz => {
            let val = regs.read(src);
            if val == 0 {
                let target = pc.wrapping_add(decoded.imm_unsigned() as u16);
                ExecuteOutcome {
                    flush: Some(FlushRequest { new_pc: target }),
                    summary: format!(
                        "BEQZ: R{src} ({val}) == 0, PC {pc} -> {target} (taken)"
                    ),
                }
            } else {
                ExecuteOutcome {
                    flush: None,
                    summary: format!("BEQZ: R{src} ({val}) != 0, not taken"),
                }
            }
        }
        Opcode::Andi => {
            let before = regs.read(src);
            let imm = decoded.imm_signed();
            let result = before & imm;
            regs.write(src, result);
            sr.set(Flag::Negative, result < 0);
            sr.set(Flag::Zero, result == 0);
            ExecuteOutcome {
                flush: None,
                summary: format!("ANDI: R{src} ({before}) & {imm} -> R{src} = {result}"),
            }
        }
        Opcode::Eor => {
            let (a, b) = (regs.read(src), regs.read(dst));
            let result = a ^ b;
            regs.write(src, result);
            sr.set(Flag::Negative, result < 0);
            sr.set(Flag::Zero, result == 0);
            ExecuteOutcome {
                flush: None,
                summary: format!(
                    "EOR: R{src} ({a}) ^ R{dst} ({b}) -> R{src} = {result}"
                ),
            }
        }
        Opcode::Br => {
            let hi = regs.read(src) as u8 as u16;
            let lo = regs.read(dst) as u8 as u16;
            let target = (hi << 8) | lo;
            ExecuteOutcome {
                flush: Some(FlushRequest { new_pc: target }),
                summary: format!(
                    "BR: R{src}:R{dst} -> PC {pc} -> {target}"
                ),
            }
        }
        Opcode::Sal => {
            let before = regs.read(src);
            let shift = (decoded.imm_signed() & 0x7) as u32;
            let result = ((before as u8) << shift) as i8;
            regs.write(src, result);
            sr.set(Flag::Negative, result < 0);
            sr.set(Flag::Zero, result == 0);
            ExecuteOutcome {
                flush: None,
                summary: format!(
                    "SAL: R{src} ({before}) << {shift} -> R{src} = {result}"
                ),
            }
        }
        Opcode::Sar => {
            let before = regs.read(src);
            let shift = (decoded.imm_signed() & 0x7) as u32;
            let result = before >> shift;
            regs.write(src, result);
            sr.set(Flag::Negative, result < 0);
            sr.set(Flag::Zero, result == 0);
            ExecuteOutcome {
                flush: None,
                summary: format!(
                    "SAR: R{src} ({before}) >> {shift} -> R{src} = {result}"
                ),
            }
        }
        Opcode::Ldr => {
            let addr = decoded.imm_unsigned() as usize;
            let value = data_mem[addr];
            regs.write(src, value);
            ExecuteOutcome {
                flush: None,
                summary: format!("LDR: mem[{addr}] ({value}) -> R{src}"),
            }
        }
        Opcode::Str => {
            let addr = decoded.imm_unsigned() as usize;
            let value = regs.read(src);
            data_mem[addr] = value;
            ExecuteOutcome {
                flush: None,
                summary: format!("STR: R{src} ({value}) -> mem[{addr}]"),
            }
        }
        Opcode::Undefined(bits) => {
            tracing::warn!(opcode_bits = bits, pc, "undefined opcode, ignoring");
            ExecuteOutcome {
                flush: None,
                summary: format!("UNDEFINED opcode {bits:#x} at pc {pc}, ignored"),
            }
        }
    }
}
