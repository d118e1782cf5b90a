//! Activation records and their typed register files.
//!
//! A frame owns two [`RegisterFile`]s of the same shape: one for transient
//! registers and one for declared locals. Each file is a set of parallel
//! fixed-size arrays, one per [`Bank`]. The opcode alone decides which
//! array an operand indexes.

use std::fmt;

use bvm_common::{Bank, BankSizes, FunctionInfo};
use thiserror::Error;

/// Whether a slot lives in the register file or the locals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    Register,
    Local,
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Space::Register => f.write_str("register"),
            Space::Local => f.write_str("local"),
        }
    }
}

/// An operand named a slot outside its bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{space} {bank} index {index} out of range (bank size {size})")]
pub struct BankFault {
    pub bank: Bank,
    pub index: i32,
    pub size: usize,
    pub space: Space,
}

/// One set of typed banks.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterFile {
    space: Space,
    ints: Box<[i64]>,
    floats: Box<[f64]>,
    strings: Box<[String]>,
    flags: Box<[i32]>,
}

impl RegisterFile {
    /// Zero-initialized banks sized per `sizes`.
    pub fn new(space: Space, sizes: &BankSizes) -> Self {
        Self {
            space,
            ints: vec![0; sizes.ints].into_boxed_slice(),
            floats: vec![0.0; sizes.floats].into_boxed_slice(),
            strings: vec![String::new(); sizes.strings].into_boxed_slice(),
            flags: vec![0; sizes.flags].into_boxed_slice(),
        }
    }

    pub fn int(&self, index: i32) -> Result<i64, BankFault> {
        slot(&self.ints, self.space, Bank::Int, index).copied()
    }

    pub fn set_int(&mut self, index: i32, value: i64) -> Result<(), BankFault> {
        *slot_mut(&mut self.ints, self.space, Bank::Int, index)? = value;
        Ok(())
    }

    pub fn float(&self, index: i32) -> Result<f64, BankFault> {
        slot(&self.floats, self.space, Bank::Float, index).copied()
    }

    pub fn set_float(&mut self, index: i32, value: f64) -> Result<(), BankFault> {
        *slot_mut(&mut self.floats, self.space, Bank::Float, index)? = value;
        Ok(())
    }

    pub fn string(&self, index: i32) -> Result<&str, BankFault> {
        slot(&self.strings, self.space, Bank::String, index).map(String::as_str)
    }

    pub fn set_string(&mut self, index: i32, value: String) -> Result<(), BankFault> {
        *slot_mut(&mut self.strings, self.space, Bank::String, index)? = value;
        Ok(())
    }

    pub fn flag(&self, index: i32) -> Result<i32, BankFault> {
        slot(&self.flags, self.space, Bank::Flag, index).copied()
    }

    pub fn set_flag(&mut self, index: i32, value: i32) -> Result<(), BankFault> {
        *slot_mut(&mut self.flags, self.space, Bank::Flag, index)? = value;
        Ok(())
    }

    /// Copy slot `from` of `src` into slot `to` of `self`, both in `bank`.
    pub fn copy_from(
        &mut self,
        bank: Bank,
        to: i32,
        src: &RegisterFile,
        from: i32,
    ) -> Result<(), BankFault> {
        match bank {
            Bank::Int => self.set_int(to, src.int(from)?),
            Bank::Float => self.set_float(to, src.float(from)?),
            Bank::String => self.set_string(to, src.string(from)?.to_owned()),
            Bank::Flag => self.set_flag(to, src.flag(from)?),
        }
    }

    /// Fail unless `index` names a slot of `bank`.
    pub fn check(&self, bank: Bank, index: i32) -> Result<(), BankFault> {
        match bank {
            Bank::Int => slot(&self.ints, self.space, bank, index).map(drop),
            Bank::Float => slot(&self.floats, self.space, bank, index).map(drop),
            Bank::String => slot(&self.strings, self.space, bank, index).map(drop),
            Bank::Flag => slot(&self.flags, self.space, bank, index).map(drop),
        }
    }

    /// Number of slots in one bank.
    pub fn size(&self, bank: Bank) -> usize {
        match bank {
            Bank::Int => self.ints.len(),
            Bank::Float => self.floats.len(),
            Bank::String => self.strings.len(),
            Bank::Flag => self.flags.len(),
        }
    }

    pub fn ints(&self) -> &[i64] {
        &self.ints
    }

    pub fn floats(&self) -> &[f64] {
        &self.floats
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn flags(&self) -> &[i32] {
        &self.flags
    }
}

fn slot<T>(bank_slots: &[T], space: Space, bank: Bank, index: i32) -> Result<&T, BankFault> {
    usize::try_from(index)
        .ok()
        .and_then(|i| bank_slots.get(i))
        .ok_or(BankFault {
            bank,
            index,
            size: bank_slots.len(),
            space,
        })
}

fn slot_mut<T>(
    bank_slots: &mut [T],
    space: Space,
    bank: Bank,
    index: i32,
) -> Result<&mut T, BankFault> {
    let size = bank_slots.len();
    usize::try_from(index)
        .ok()
        .and_then(|i| bank_slots.get_mut(i))
        .ok_or(BankFault {
            bank,
            index,
            size,
            space,
        })
}

/// Activation record of one in-flight call.
#[derive(Debug, Clone, PartialEq)]
pub struct StackFrame<'a> {
    /// The function this frame executes.
    pub function: &'a FunctionInfo,
    /// Instruction pointer to resume the caller at.
    pub return_address: usize,
    /// Caller registers that receive this call's results, lined up with
    /// the callee's return signatures.
    pub return_registers: &'a [i32],
    pub regs: RegisterFile,
    pub locals: RegisterFile,
}

impl<'a> StackFrame<'a> {
    /// A fresh frame sized per `function`.
    pub fn new(
        function: &'a FunctionInfo,
        return_address: usize,
        return_registers: &'a [i32],
    ) -> Self {
        Self {
            function,
            return_address,
            return_registers,
            regs: RegisterFile::new(Space::Register, &function.registers),
            locals: RegisterFile::new(Space::Local, &function.locals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> RegisterFile {
        RegisterFile::new(Space::Register, &BankSizes::new(2, 1, 1, 3))
    }

    #[test]
    fn banks_start_zeroed_and_sized() {
        let regs = file();
        assert_eq!(regs.ints(), &[0, 0]);
        assert_eq!(regs.floats(), &[0.0]);
        assert_eq!(regs.strings(), &[String::new()]);
        assert_eq!(regs.flags(), &[0, 0, 0]);
        assert_eq!(regs.size(Bank::Flag), 3);
    }

    #[test]
    fn banks_do_not_alias() {
        let mut regs = file();
        regs.set_int(0, 7).unwrap();
        regs.set_flag(0, -1).unwrap();
        regs.set_float(0, 1.5).unwrap();
        regs.set_string(0, "x".into()).unwrap();
        assert_eq!(regs.int(0), Ok(7));
        assert_eq!(regs.flag(0), Ok(-1));
        assert_eq!(regs.float(0), Ok(1.5));
        assert_eq!(regs.string(0), Ok("x"));
        assert_eq!(regs.int(1), Ok(0));
    }

    #[test]
    fn out_of_range_reports_bank_and_space() {
        let mut locals = RegisterFile::new(Space::Local, &BankSizes::new(1, 0, 0, 0));
        assert_eq!(
            locals.set_int(1, 3),
            Err(BankFault {
                bank: Bank::Int,
                index: 1,
                size: 1,
                space: Space::Local,
            })
        );
        assert_eq!(
            locals.float(0),
            Err(BankFault {
                bank: Bank::Float,
                index: 0,
                size: 0,
                space: Space::Local,
            })
        );
        assert!(locals.int(-1).is_err());
        assert_eq!(
            locals.int(-1).unwrap_err().to_string(),
            "local int index -1 out of range (bank size 1)"
        );
    }

    #[test]
    fn copy_between_files() {
        let mut src = file();
        src.set_string(0, "hello".into()).unwrap();
        src.set_int(1, 99).unwrap();
        let mut dst = RegisterFile::new(Space::Local, &BankSizes::new(3, 0, 2, 0));
        dst.copy_from(Bank::String, 1, &src, 0).unwrap();
        dst.copy_from(Bank::Int, 2, &src, 1).unwrap();
        assert_eq!(dst.string(1), Ok("hello"));
        assert_eq!(dst.int(2), Ok(99));
        assert!(dst.copy_from(Bank::Flag, 0, &src, 0).is_err());
    }

    #[test]
    fn check_matches_bank_size() {
        let regs = RegisterFile::new(Space::Register, &BankSizes::new(2, 0, 1, 0));
        assert_eq!(regs.check(Bank::Int, 1), Ok(()));
        assert_eq!(regs.check(Bank::String, 0), Ok(()));
        assert!(regs.check(Bank::Int, 2).is_err());
        assert!(regs.check(Bank::Float, 0).is_err());
        assert!(regs.check(Bank::Flag, -1).is_err());
    }

    #[test]
    fn frame_sized_from_function() {
        let info = FunctionInfo::new("f", 0)
            .with_registers(BankSizes::new(4, 0, 0, 1))
            .with_locals(BankSizes::new(2, 1, 0, 0));
        let frame = StackFrame::new(&info, 9, &[]);
        assert_eq!(frame.regs.size(Bank::Int), 4);
        assert_eq!(frame.locals.size(Bank::Float), 1);
        assert_eq!(frame.return_address, 9);
    }
}
