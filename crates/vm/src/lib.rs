//! Register virtual machine: executes typed register-file bytecode.
//!
//! The VM is a register machine with:
//! - A bounded control stack of frames addressed by a frame pointer
//! - Per-frame register and local banks, one fixed-size array per type
//! - A call/return ABI that routes values between frames by type signature
//!
//! # Usage
//!
//! ```
//! use bvm_common::{
//!     BankSizes, ConstantEntry, ConstantPool, FunctionInfo, FunctionReturnEntry, Instruction,
//!     Opcode, Program,
//! };
//!
//! let mut pool = ConstantPool::default();
//! let answer = pool.push(ConstantEntry::Integer(42));
//! let ret = pool.push(ConstantEntry::FunctionReturn(FunctionReturnEntry::default()));
//!
//! let program = Program::new(
//!     vec![
//!         Instruction::new(Opcode::Iconst, &[answer, 0]),
//!         Instruction::new(Opcode::Ret, &[ret]),
//!     ],
//!     pool,
//!     vec![FunctionInfo::new("main", 0).with_registers(BankSizes::new(1, 0, 0, 0))],
//! );
//!
//! let frame = bvm::run(&program).unwrap();
//! assert_eq!(frame.regs.int(0), Ok(42));
//! ```

mod call;
pub mod config;
pub mod control_stack;
pub mod error;
pub mod execute;
pub mod frame;
pub mod machine;

pub use config::{ConfigError, VmConfig};
pub use error::{ErrorKind, FailureClass, RuntimeError};
pub use frame::{BankFault, RegisterFile, Space, StackFrame};
pub use machine::Machine;

use bvm_common::Program;

/// Execute a program with the default configuration.
///
/// Returns the entry frame with its final register and local state.
///
/// # Errors
///
/// Returns [`RuntimeError`] if execution aborts (malformed program,
/// unsupported opcode, stack overflow, bank index out of range, or a
/// runtime fault such as division by zero).
pub fn run(program: &Program) -> Result<StackFrame<'_>, RuntimeError> {
    Machine::new(program).exec_main()
}
