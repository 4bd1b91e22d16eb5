//! Textual assembler: turns one line of mnemonic assembly into one 16-bit
//! instruction word. All-or-nothing over a whole program: the first line
//! that fails to assemble aborts the load with its 1-based line number.

use thiserror::Error;

/// Failures that can occur while assembling or loading a program. These are
/// always fatal to simulation startup, unlike runtime diagnostics (see
/// [`crate::core::execute`]'s handling of undefined opcodes), which are
/// logged and ignored instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("could not read program file {path:?}: {reason}")]
    Io { path: String, reason: String },

    #[error("line {line}: unknown mnemonic {mnemonic:?}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: unknown register {register:?}")]
    UnknownRegister { line: usize, register: String },

    #[error("line {line}: malformed instruction {text:?}")]
    MalformedLine { line: usize, text: String },

    #[error("line {line}: immediate {value} out of 6-bit signed range (-32..=31)")]
    ImmediateOutOfRange { line: usize, value: i32 },

    #[error("program has {words} words, exceeds instruction memory capacity of {capacity}")]
    ProgramTooLarge { words: usize, capacity: usize },

    #[error("data memory capacity {bytes} is too small for the 6-bit address space (minimum {minimum})")]
    DataMemoryTooSmall { bytes: usize, minimum: usize },
}

fn opcode_bits(mnemonic: &str) -> Option<u16> {
    Some(match mnemonic {
        "ADD" => 0,
        "SUB" => 1,
        "MUL" => 2,
        "MOVI" => 3,
        "BEQZ" => 4,
        "ANDI" => 5,
        "EOR" => 6,
        "BR" => 7,
        "SAL" => 8,
        "SAR" => 9,
        "LDR" => 10,
        "STR" => 11,
        _ => return None,
    })
}

fn parse_register(token: &str, line: usize) -> Result<u16, LoadError> {
    let digits = token.strip_prefix('R').ok_or_else(|| LoadError::UnknownRegister {
        line,
        register: token.to_string(),
    })?;
    let idx: u16 = digits.parse().map_err(|_| LoadError::UnknownRegister {
        line,
        register: token.to_string(),
    })?;
    if idx > 63 {
        return Err(LoadError::UnknownRegister {
            line,
            register: token.to_string(),
        });
    }
    Ok(idx)
}

/// Parses the trailing operand as either a register (dst) or a decimal
/// immediate (dst-or-imm), returning its raw 6-bit encoding.
fn parse_trailing_field(token: &str, line: usize) -> Result<u16, LoadError> {
    if let Some(digits) = token.strip_prefix('R') {
        if let Ok(idx) = digits.parse::<u16>() {
            if idx <= 63 {
                return Ok(idx);
            }
        }
        return Err(LoadError::UnknownRegister {
            line,
            register: token.to_string(),
        });
    }
    let value: i32 = token.parse().map_err(|_| LoadError::MalformedLine {
        line,
        text: token.to_string(),
    })?;
    if !(-32..=31).contains(&value) {
        return Err(LoadError::ImmediateOutOfRange { line, value });
    }
    Ok((value as i16 as u16) & 0x3F)
}

/// Assembles one non-empty source line into a 16-bit instruction word.
pub fn assemble_line(text: &str, line: usize) -> Result<u16, LoadError> {
    let cleaned = text.replace(',', " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    let (mnemonic, operands) = tokens.split_first().ok_or_else(|| LoadError::MalformedLine {
        line,
        text: text.to_string(),
    })?;
    let mnemonic = mnemonic.to_uppercase();
    let opcode = opcode_bits(&mnemonic).ok_or_else(|| LoadError::UnknownMnemonic {
        line,
        mnemonic: mnemonic.clone(),
    })?;

    if operands.len() != 2 {
        return Err(LoadError::MalformedLine {
            line,
            text: text.to_string(),
        });
    }
    let src = parse_register(operands[0], line)?;
    let trailing = parse_trailing_field(operands[1], line)?;

    Ok((opcode << 12) | (src << 6) | trailing)
}

/// Assembles a whole program's worth of source text, stopping at the first
/// blank line (or end of file) and at the first line that fails to assemble.
pub fn assemble_program(source: &str) -> Result<Vec<u16>, LoadError> {
    let mut words = Vec::new();
    for (offset, raw_line) in source.lines().enumerate() {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            break;
        }
        words.push(assemble_line(trimmed, offset + 1)?);
    }
    Ok(words)
}
