//! Runtime errors for the VM.
//!
//! Every failure is fatal: the loop stops and the error carries the
//! faulting instruction address, the raw opcode and the frame depth.

use bvm_common::{Opcode, PoolError, TypeSig};
use thiserror::Error;

use crate::frame::BankFault;

/// A fatal failure of a run, with the position it happened at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at instruction {at}{} (frame depth {depth})", opcode_context(.opcode))]
pub struct RuntimeError {
    pub kind: ErrorKind,
    /// Address of the faulting instruction.
    pub at: usize,
    /// Raw code of the faulting instruction, if one was being executed.
    pub opcode: Option<i32>,
    /// Number of live frames when the failure was raised.
    pub depth: usize,
}

/// ` in MNEMONIC` for a catalog code, ` in opcode N` otherwise.
fn opcode_context(code: &Option<i32>) -> String {
    match code {
        Some(code) => match Opcode::try_from(*code) {
            Ok(op) => format!(" in {op}"),
            Err(_) => format!(" in opcode {code}"),
        },
        None => String::new(),
    }
}

impl RuntimeError {
    pub fn class(&self) -> FailureClass {
        self.kind.class()
    }
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Constant pool index out of range or of the wrong variant.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A function entry names a slot that does not exist in its package.
    #[error("unknown function {function_ref} in package {package_index}")]
    UnknownFunction { package_index: i32, function_ref: i32 },

    /// The instruction carries fewer operands than its opcode needs.
    #[error("{opcode} needs {expected} operands, found {found}")]
    MissingOperands {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },

    /// Branch or jump target outside the instruction stream.
    #[error("jump target {0} outside the instruction stream")]
    InvalidJumpTarget(i32),

    /// Call site argument count differs from the callee's parameter count.
    #[error("call supplies {args} arguments for {params} parameters")]
    ArgumentCountMismatch { params: usize, args: usize },

    /// Return site result count disagrees with the callee's return
    /// signatures or the caller's result registers.
    #[error("return of {results} values, {signatures} return signatures, {registers} caller registers")]
    ReturnCountMismatch {
        results: usize,
        signatures: usize,
        registers: usize,
    },

    /// The program's designated entry function does not exist.
    #[error("no entry function at index {0}")]
    NoEntryFunction(usize),

    /// A function's first instruction lies outside the instruction stream.
    #[error("function {function} starts at {address}, outside the instruction stream")]
    InvalidCodeAddress { function: String, address: usize },

    /// The stream ended while calls above the entry frame were still live.
    #[error("instruction stream ended inside a call ({depth} live frames)")]
    UnterminatedCall { depth: usize },

    /// An instruction was dispatched with no frame on the control stack.
    #[error("no active frame")]
    NoActiveFrame,

    /// The code is not a member of the instruction set.
    #[error("unknown opcode {0}")]
    UnknownOpcode(i32),

    /// The opcode is in the instruction set but this engine does not execute it.
    #[error("opcode {0} not supported yet")]
    UnimplementedOpcode(Opcode),

    /// A parameter or result signature has no primitive bank.
    #[error("cannot marshal a value of type signature {0}")]
    UnsupportedTypeSig(TypeSig),

    /// A call would push past the control stack capacity.
    #[error("control stack overflow (capacity {capacity})")]
    StackOverflow { capacity: usize },

    /// A register or local operand names a slot outside its bank.
    #[error(transparent)]
    BankIndexOutOfRange(#[from] BankFault),

    /// Integer division or remainder by zero.
    #[error("integer division by zero")]
    DivisionByZero,
}

/// Failure taxonomy. Every class aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Producer or loader defect: bad pool index, missing operand, bad
    /// linkage.
    MalformedProgram,
    /// The opcode or type is outside what this engine executes.
    UnsupportedOperation,
    StackOverflow,
    BankIndexOutOfRange,
    /// A semantic error of the executed program, such as division by zero.
    Arithmetic,
}

impl ErrorKind {
    pub fn class(&self) -> FailureClass {
        match self {
            ErrorKind::Pool(_)
            | ErrorKind::UnknownFunction { .. }
            | ErrorKind::MissingOperands { .. }
            | ErrorKind::InvalidJumpTarget(_)
            | ErrorKind::ArgumentCountMismatch { .. }
            | ErrorKind::ReturnCountMismatch { .. }
            | ErrorKind::NoEntryFunction(_)
            | ErrorKind::InvalidCodeAddress { .. }
            | ErrorKind::UnterminatedCall { .. }
            | ErrorKind::NoActiveFrame => FailureClass::MalformedProgram,
            ErrorKind::UnknownOpcode(_)
            | ErrorKind::UnimplementedOpcode(_)
            | ErrorKind::UnsupportedTypeSig(_) => FailureClass::UnsupportedOperation,
            ErrorKind::StackOverflow { .. } => FailureClass::StackOverflow,
            ErrorKind::BankIndexOutOfRange(_) => FailureClass::BankIndexOutOfRange,
            ErrorKind::DivisionByZero => FailureClass::Arithmetic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Space;
    use bvm_common::{Bank, EntryKind};

    #[test]
    fn error_display_formats() {
        let err = RuntimeError {
            kind: ErrorKind::DivisionByZero,
            at: 5,
            opcode: Some(Opcode::Idiv.code()),
            depth: 2,
        };
        assert_eq!(
            err.to_string(),
            "integer division by zero at instruction 5 in IDIV (frame depth 2)"
        );
        let unknown = RuntimeError {
            kind: ErrorKind::UnknownOpcode(214),
            at: 1,
            opcode: Some(214),
            depth: 1,
        };
        assert_eq!(
            unknown.to_string(),
            "unknown opcode 214 at instruction 1 in opcode 214 (frame depth 1)"
        );
        let setup = RuntimeError {
            kind: ErrorKind::NoEntryFunction(3),
            at: 0,
            opcode: None,
            depth: 0,
        };
        assert_eq!(
            setup.to_string(),
            "no entry function at index 3 at instruction 0 (frame depth 0)"
        );
        assert_eq!(
            ErrorKind::UnimplementedOpcode(Opcode::I2f).to_string(),
            "opcode I2F not supported yet"
        );
        assert_eq!(
            ErrorKind::StackOverflow { capacity: 4 }.to_string(),
            "control stack overflow (capacity 4)"
        );
    }

    #[test]
    fn classes() {
        let pool = ErrorKind::Pool(PoolError::KindMismatch {
            index: 0,
            expected: EntryKind::Integer,
            found: EntryKind::Float,
        });
        assert_eq!(pool.class(), FailureClass::MalformedProgram);
        assert_eq!(
            ErrorKind::UnknownOpcode(300).class(),
            FailureClass::UnsupportedOperation
        );
        assert_eq!(
            ErrorKind::UnsupportedTypeSig(TypeSig::Json).class(),
            FailureClass::UnsupportedOperation
        );
        assert_eq!(
            ErrorKind::StackOverflow { capacity: 1 }.class(),
            FailureClass::StackOverflow
        );
        assert_eq!(
            ErrorKind::BankIndexOutOfRange(BankFault {
                bank: Bank::Int,
                index: 9,
                size: 2,
                space: Space::Register,
            })
            .class(),
            FailureClass::BankIndexOutOfRange
        );
        assert_eq!(ErrorKind::DivisionByZero.class(), FailureClass::Arithmetic);
        assert_eq!(
            ErrorKind::UnterminatedCall { depth: 2 }.class(),
            FailureClass::MalformedProgram
        );
    }
}
