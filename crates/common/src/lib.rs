//! Bytecode contract shared by the register VM and its producers.
//!
//! This crate provides the data structures a compiler emits and the engine
//! consumes:
//!
//! - [`Opcode`] — the full numeric opcode catalog
//! - [`Instruction`] — a raw opcode plus integer operands
//! - [`ConstantPool`] — typed literals and call/return linkage entries
//! - [`TypeSig`] and [`Bank`] — the signature alphabet and the register
//!   banks it selects
//! - [`FunctionInfo`] — entry address, signatures and frame sizing
//! - [`Program`] — instructions, pool and function table together
//!
//! # Dependencies
//!
//! This crate uses `thiserror` for its error types and has no other
//! dependencies.

pub mod constant;
pub mod error;
pub mod function;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod type_sig;

// Re-export commonly used types at the crate root.
pub use constant::{
    ConstantEntry, ConstantPool, EntryKind, FunctionCallEntry, FunctionRef, FunctionReturnEntry,
};
pub use error::{DecodeError, PoolError};
pub use function::{BankSizes, FunctionInfo};
pub use instruction::Instruction;
pub use opcode::{Opcode, INSTRUCTION_CODE_COUNT};
pub use program::Program;
pub use type_sig::{Bank, TypeSig};
