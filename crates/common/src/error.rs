//! Decode and constant-pool errors for the bytecode contract.

use crate::constant::EntryKind;
use thiserror::Error;

/// Errors that occur while decoding raw codes into contract types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The code is not a member of the instruction set.
    #[error("unknown opcode: {0}")]
    UnknownOpcode(i32),

    /// The signature string does not start with a known type character.
    #[error("unknown type signature: {0:?}")]
    UnknownTypeSig(String),
}

/// Errors raised while resolving a constant-pool index.
///
/// Both variants mean the program producer emitted a bad index; neither is
/// recoverable at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Index is negative or past the end of the pool.
    #[error("constant pool index {index} out of range (pool size {size})")]
    IndexOutOfRange { index: i32, size: usize },

    /// The entry at the index is not the variant the opcode expects.
    #[error("constant pool entry {index} is {found}, expected {expected}")]
    KindMismatch {
        index: i32,
        expected: EntryKind,
        found: EntryKind,
    },
}
