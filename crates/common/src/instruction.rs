//! Decoded instructions: a raw opcode plus integer operands.
//!
//! The code is stored as the raw `i32` the producer emitted so that a
//! stream may hold codes outside the catalog. Those are rejected when the
//! engine decodes them, not when the stream is built.

use std::fmt;

use crate::error::DecodeError;
use crate::opcode::Opcode;

/// A single instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Raw opcode as emitted by the producer.
    pub code: i32,
    /// Register indices, pool indices or jump targets. Meaning depends on
    /// the opcode.
    pub operands: Vec<i32>,
}

impl Instruction {
    /// Create an instruction for a catalog opcode.
    pub fn new(opcode: Opcode, operands: &[i32]) -> Self {
        Self {
            code: opcode.code(),
            operands: operands.to_vec(),
        }
    }

    /// Create an instruction from a raw code, known or not.
    pub fn raw(code: i32, operands: Vec<i32>) -> Self {
        Self { code, operands }
    }

    /// Decode the opcode.
    pub fn opcode(&self) -> Result<Opcode, DecodeError> {
        Opcode::try_from(self.code)
    }
}

/// Renders `MNEMONIC op1 op2 ...`; unknown codes render as `<code>`.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode() {
            Ok(op) => f.write_str(op.mnemonic())?,
            Err(_) => write!(f, "<{}>", self.code)?,
        }
        for operand in &self.operands {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}
