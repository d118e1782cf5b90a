//! VM state: instruction pointer, control stack, program under execution.

use bvm_common::{FunctionInfo, Program};

use crate::config::{ConfigError, VmConfig};
use crate::control_stack::ControlStack;
use crate::error::{ErrorKind, RuntimeError};
use crate::frame::StackFrame;

/// The register virtual machine.
///
/// One instance runs one program; all mutable state is private to it.
pub struct Machine<'a> {
    /// The program being executed.
    pub(crate) program: &'a Program,
    /// Active frames; the top one is the current function.
    pub(crate) stack: ControlStack<'a>,
    /// Address of the next instruction to fetch.
    pub(crate) ip: usize,
    /// Address of the instruction currently executing.
    pub(crate) at: usize,
    /// The entry frame after its final `RET`.
    pub(crate) retired: Option<StackFrame<'a>>,
    /// The failure that aborted the run. Latched until the next `start`.
    pub(crate) faulted: Option<RuntimeError>,
}

impl<'a> Machine<'a> {
    /// Create a machine with the default configuration.
    pub fn new(program: &'a Program) -> Self {
        Self::build(program, VmConfig::default())
    }

    pub fn with_config(program: &'a Program, config: VmConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(program, config))
    }

    fn build(program: &'a Program, config: VmConfig) -> Self {
        Self {
            program,
            stack: ControlStack::new(config.control_stack_capacity),
            ip: 0,
            at: 0,
            retired: None,
            faulted: None,
        }
    }

    /// Address of the next instruction to fetch.
    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Number of live frames.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Index of the active frame, `None` once the outermost call returned.
    pub fn frame_pointer(&self) -> Option<usize> {
        self.stack.frame_pointer()
    }

    /// The active frame, if any.
    pub fn top_frame(&self) -> Option<&StackFrame<'a>> {
        self.stack.top()
    }

    /// The entry frame once its final `RET` has executed.
    pub fn retired(&self) -> Option<&StackFrame<'a>> {
        self.retired.as_ref()
    }

    /// The failure that aborted the current run, if any.
    pub fn fault(&self) -> Option<&RuntimeError> {
        self.faulted.as_ref()
    }

    /// True while there is an instruction to fetch and a frame to run it in,
    /// and no failure has aborted the run.
    pub fn is_running(&self) -> bool {
        self.faulted.is_none() && self.ip < self.program.len() && !self.stack.is_empty()
    }

    pub(crate) fn active_frame(&self) -> Result<&StackFrame<'a>, ErrorKind> {
        self.stack.top().ok_or(ErrorKind::NoActiveFrame)
    }

    pub(crate) fn active_frame_mut(&mut self) -> Result<&mut StackFrame<'a>, ErrorKind> {
        self.stack.top_mut().ok_or(ErrorKind::NoActiveFrame)
    }

    /// Move the instruction pointer to an absolute address.
    ///
    /// The end of the stream is a valid target and stops the loop.
    pub(crate) fn jump(&mut self, target: i32) -> Result<(), ErrorKind> {
        match usize::try_from(target) {
            Ok(addr) if addr <= self.program.len() => {
                self.ip = addr;
                Ok(())
            }
            _ => Err(ErrorKind::InvalidJumpTarget(target)),
        }
    }

    /// Where `function` starts. Its first instruction must exist.
    pub(crate) fn code_address(&self, function: &FunctionInfo) -> Result<usize, ErrorKind> {
        if function.code_address < self.program.len() {
            Ok(function.code_address)
        } else {
            Err(ErrorKind::InvalidCodeAddress {
                function: function.name.clone(),
                address: function.code_address,
            })
        }
    }

    /// Attach the current position to an error kind.
    pub(crate) fn fail(&self, kind: ErrorKind, opcode: Option<i32>) -> RuntimeError {
        RuntimeError {
            kind,
            at: self.at,
            opcode,
            depth: self.stack.depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bvm_common::{ConstantPool, FunctionInfo, Instruction, Opcode};

    fn program() -> Program {
        Program::new(
            vec![
                Instruction::new(Opcode::Nop, &[]),
                Instruction::new(Opcode::Nop, &[]),
            ],
            ConstantPool::default(),
            vec![FunctionInfo::new("main", 0)],
        )
    }

    #[test]
    fn fresh_machine_is_idle() {
        let program = program();
        let vm = Machine::new(&program);
        assert_eq!(vm.ip(), 0);
        assert_eq!(vm.depth(), 0);
        assert_eq!(vm.frame_pointer(), None);
        assert!(vm.top_frame().is_none());
        assert!(vm.retired().is_none());
        assert!(vm.fault().is_none());
        assert!(!vm.is_running());
    }

    #[test]
    fn zero_capacity_config_rejected() {
        let program = program();
        let config = VmConfig::default().with_control_stack_capacity(0);
        assert!(matches!(
            Machine::with_config(&program, config),
            Err(ConfigError::ZeroCapacity)
        ));
    }

    #[test]
    fn jump_bounds() {
        let program = program();
        let mut vm = Machine::new(&program);
        assert_eq!(vm.jump(1), Ok(()));
        assert_eq!(vm.ip(), 1);
        assert_eq!(vm.jump(2), Ok(()));
        assert_eq!(vm.jump(3), Err(ErrorKind::InvalidJumpTarget(3)));
        assert_eq!(vm.jump(-1), Err(ErrorKind::InvalidJumpTarget(-1)));
        assert_eq!(vm.ip(), 2);
    }

    #[test]
    fn code_address_must_name_an_instruction() {
        let program = program();
        let vm = Machine::new(&program);
        assert_eq!(vm.code_address(&FunctionInfo::new("f", 1)), Ok(1));
        assert_eq!(
            vm.code_address(&FunctionInfo::new("g", 2)),
            Err(ErrorKind::InvalidCodeAddress {
                function: "g".into(),
                address: 2,
            })
        );
    }

    #[test]
    fn active_frame_requires_a_frame() {
        let program = program();
        let mut vm = Machine::new(&program);
        assert_eq!(vm.active_frame().err(), Some(ErrorKind::NoActiveFrame));
        assert!(vm.active_frame_mut().is_err());
    }
}
