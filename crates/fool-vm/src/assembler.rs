//! Two-pass assembler for the textual instruction stream.
//!
//! Input is one instruction (`mnemonic [operand]`) or one label definition
//! (`name:`) per line; blank lines are ignored. The first pass assigns an
//! address to every label, the second encodes instructions, replacing
//! label operands with those addresses.

use fool_core::{AssemblyError, OpCode};
use rustc_hash::FxHashMap;

enum Line<'src> {
    Label(&'src str),
    Instr {
        op: OpCode,
        operand: Option<&'src str>,
    },
}

/// Assemble `source` into code cells, failing if the result would not fit
/// in `capacity` cells.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn assemble(source: &str, capacity: usize) -> Result<Vec<i32>, AssemblyError> {
    let mut lines = Vec::new();
    let mut labels: FxHashMap<&str, i32> = FxHashMap::default();
    let mut size = 0usize;

    for (index, text) in source.lines().enumerate() {
        let number = index + 1;
        let line = parse_line(text, number)?;
        match line {
            Some(Line::Label(name)) => {
                if labels.insert(name, size as i32).is_some() {
                    return Err(AssemblyError::DuplicateLabel {
                        line: number,
                        label: name.to_string(),
                    });
                }
            }
            Some(Line::Instr { op, operand }) => {
                size += op.width();
                lines.push((number, op, operand));
            }
            None => {}
        }
    }

    if size > capacity {
        return Err(AssemblyError::ProgramTooLarge { size, capacity });
    }

    let mut code = Vec::with_capacity(size);
    for (number, op, operand) in lines {
        code.push(i32::from(op));
        if let Some(operand) = operand {
            code.push(resolve_operand(operand, number, &labels)?);
        }
    }

    tracing::debug!(cells = code.len(), labels = labels.len(), "assembled");
    Ok(code)
}

fn parse_line(text: &str, number: usize) -> Result<Option<Line<'_>>, AssemblyError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if let Some(name) = text.strip_suffix(':') {
        return Ok(Some(Line::Label(name.trim())));
    }

    let mut tokens = text.split_whitespace();
    let mnemonic = tokens.next().unwrap_or_default();
    let op = OpCode::from_mnemonic(mnemonic).ok_or_else(|| AssemblyError::UnknownMnemonic {
        line: number,
        mnemonic: mnemonic.to_string(),
    })?;
    let operand = tokens.next();
    if let Some(extra) = tokens.next() {
        return Err(AssemblyError::InvalidOperand {
            line: number,
            operand: extra.to_string(),
        });
    }

    match (op.has_operand(), operand) {
        (true, None) => Err(AssemblyError::MissingOperand {
            line: number,
            mnemonic: mnemonic.to_string(),
        }),
        (false, Some(_)) => Err(AssemblyError::UnexpectedOperand {
            line: number,
            mnemonic: mnemonic.to_string(),
        }),
        _ => Ok(Some(Line::Instr { op, operand })),
    }
}

fn resolve_operand(
    operand: &str,
    number: usize,
    labels: &FxHashMap<&str, i32>,
) -> Result<i32, AssemblyError> {
    if let Ok(value) = operand.parse::<i32>() {
        return Ok(value);
    }
    let is_name = operand
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !is_name {
        return Err(AssemblyError::InvalidOperand {
            line: number,
            operand: operand.to_string(),
        });
    }
    labels
        .get(operand)
        .copied()
        .ok_or_else(|| AssemblyError::UndefinedLabel {
            label: operand.to_string(),
        })
}
