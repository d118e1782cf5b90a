//! Function metadata: entry address, signatures and frame sizing.

use crate::type_sig::{Bank, TypeSig};

/// Number of slots per bank, for either the register file or the locals of
/// a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BankSizes {
    pub ints: usize,
    pub floats: usize,
    pub strings: usize,
    pub flags: usize,
}

impl BankSizes {
    pub fn new(ints: usize, floats: usize, strings: usize, flags: usize) -> Self {
        Self {
            ints,
            floats,
            strings,
            flags,
        }
    }

    /// Slot count for one bank.
    pub fn of(&self, bank: Bank) -> usize {
        match bank {
            Bank::Int => self.ints,
            Bank::Float => self.floats,
            Bank::String => self.strings,
            Bank::Flag => self.flags,
        }
    }
}

/// A callable unit of the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    /// Package this function was declared in. Must match the
    /// `package_index` of any function entry that refers to it.
    pub package_index: i32,
    /// Address of the first instruction of the body.
    pub code_address: usize,
    pub param_sigs: Vec<TypeSig>,
    pub return_sigs: Vec<TypeSig>,
    /// Register file sizing for frames of this function.
    pub registers: BankSizes,
    /// Local variable sizing for frames of this function.
    pub locals: BankSizes,
}

impl FunctionInfo {
    /// A function with no parameters, no results and empty banks.
    pub fn new(name: impl Into<String>, code_address: usize) -> Self {
        Self {
            name: name.into(),
            package_index: 0,
            code_address,
            param_sigs: Vec::new(),
            return_sigs: Vec::new(),
            registers: BankSizes::default(),
            locals: BankSizes::default(),
        }
    }

    pub fn with_package(mut self, package_index: i32) -> Self {
        self.package_index = package_index;
        self
    }

    pub fn with_params(mut self, sigs: &[TypeSig]) -> Self {
        self.param_sigs = sigs.to_vec();
        self
    }

    pub fn with_returns(mut self, sigs: &[TypeSig]) -> Self {
        self.return_sigs = sigs.to_vec();
        self
    }

    pub fn with_registers(mut self, sizes: BankSizes) -> Self {
        self.registers = sizes;
        self
    }

    pub fn with_locals(mut self, sizes: BankSizes) -> Self {
        self.locals = sizes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let info = FunctionInfo::new("add", 7)
            .with_package(2)
            .with_params(&[TypeSig::Int, TypeSig::Int])
            .with_returns(&[TypeSig::Int])
            .with_registers(BankSizes::new(3, 0, 0, 0))
            .with_locals(BankSizes::new(2, 0, 0, 0));
        assert_eq!(info.name, "add");
        assert_eq!(info.package_index, 2);
        assert_eq!(info.code_address, 7);
        assert_eq!(info.param_sigs.len(), 2);
        assert_eq!(info.registers.of(Bank::Int), 3);
        assert_eq!(info.locals.of(Bank::Float), 0);
    }
}
