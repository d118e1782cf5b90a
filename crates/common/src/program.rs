//! Program container: instruction stream, constant pool and function table.

use crate::constant::{ConstantPool, FunctionRef};
use crate::function::FunctionInfo;
use crate::instruction::Instruction;

/// A complete program handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub constants: ConstantPool,
    pub functions: Vec<FunctionInfo>,
    /// Index into `functions` of the entry point.
    pub entry: usize,
}

impl Program {
    /// Create a program whose entry point is the first function.
    pub fn new(
        instructions: Vec<Instruction>,
        constants: ConstantPool,
        functions: Vec<FunctionInfo>,
    ) -> Self {
        Self {
            instructions,
            constants,
            functions,
            entry: 0,
        }
    }

    /// Designate a different entry function.
    pub fn with_entry(mut self, entry: usize) -> Self {
        self.entry = entry;
        self
    }

    pub fn entry_function(&self) -> Option<&FunctionInfo> {
        self.functions.get(self.entry)
    }

    /// Look up the function a pool function entry refers to.
    ///
    /// Returns `None` if the slot does not exist or belongs to a different
    /// package.
    pub fn function(&self, func: FunctionRef) -> Option<&FunctionInfo> {
        usize::try_from(func.function_ref)
            .ok()
            .and_then(|i| self.functions.get(i))
            .filter(|info| info.package_index == func.package_index)
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Numbered listing of the instruction stream, one instruction per line.
    pub fn disassemble(&self) -> String {
        self.instructions
            .iter()
            .enumerate()
            .map(|(addr, instr)| format!("{addr}: {instr}\n"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;

    fn two_function_program() -> Program {
        Program::new(
            vec![
                Instruction::new(Opcode::Iconst1, &[0]),
                Instruction::new(Opcode::Goto, &[0]),
            ],
            ConstantPool::default(),
            vec![
                FunctionInfo::new("main", 0),
                FunctionInfo::new("helper", 1).with_package(3),
            ],
        )
    }

    #[test]
    fn entry_defaults_to_first_function() {
        let program = two_function_program();
        assert_eq!(program.entry_function().unwrap().name, "main");
        let program = program.with_entry(1);
        assert_eq!(program.entry_function().unwrap().name, "helper");
    }

    #[test]
    fn entry_missing() {
        let program = Program::new(vec![], ConstantPool::default(), vec![]);
        assert!(program.entry_function().is_none());
        assert!(program.is_empty());
    }

    #[test]
    fn function_lookup_checks_package() {
        let program = two_function_program();
        let found = program.function(FunctionRef {
            package_index: 3,
            function_ref: 1,
        });
        assert_eq!(found.map(|f| f.name.as_str()), Some("helper"));

        let wrong_package = program.function(FunctionRef {
            package_index: 0,
            function_ref: 1,
        });
        assert!(wrong_package.is_none());

        let out_of_range = program.function(FunctionRef {
            package_index: 0,
            function_ref: -1,
        });
        assert!(out_of_range.is_none());
    }

    #[test]
    fn disassemble_lists_every_instruction() {
        let program = two_function_program();
        assert_eq!(program.disassemble(), "0: ICONST_1 0\n1: GOTO 0\n");
        assert_eq!(program.len(), 2);
    }
}
