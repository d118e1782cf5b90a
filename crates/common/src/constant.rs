//! Constant pool: typed literals and linkage descriptors indexed by
//! instructions.
//!
//! The pool is built before execution and never mutated afterwards.
//! Resolution is a direct index plus a variant check.

use std::fmt;

use crate::error::PoolError;

/// Identifies a callee: the package it belongs to and its slot in the
/// program's function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionRef {
    pub package_index: i32,
    pub function_ref: i32,
}

/// A call site: which caller registers supply arguments and which receive
/// results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionCallEntry {
    /// Caller registers, one per formal parameter, in parameter order.
    pub arg_registers: Vec<i32>,
    /// Caller registers that receive results, in return-signature order.
    pub return_registers: Vec<i32>,
}

/// A return site: the callee registers holding the results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionReturnEntry {
    pub result_registers: Vec<i32>,
}

/// One entry of the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantEntry {
    Integer(i64),
    Float(f64),
    String(String),
    Function(FunctionRef),
    FunctionCall(FunctionCallEntry),
    FunctionReturn(FunctionReturnEntry),
}

/// Discriminant of a [`ConstantEntry`], used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Integer,
    Float,
    String,
    Function,
    FunctionCall,
    FunctionReturn,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Integer => "integer",
            EntryKind::Float => "float",
            EntryKind::String => "string",
            EntryKind::Function => "function",
            EntryKind::FunctionCall => "function call",
            EntryKind::FunctionReturn => "function return",
        };
        f.write_str(name)
    }
}

impl ConstantEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            ConstantEntry::Integer(_) => EntryKind::Integer,
            ConstantEntry::Float(_) => EntryKind::Float,
            ConstantEntry::String(_) => EntryKind::String,
            ConstantEntry::Function(_) => EntryKind::Function,
            ConstantEntry::FunctionCall(_) => EntryKind::FunctionCall,
            ConstantEntry::FunctionReturn(_) => EntryKind::FunctionReturn,
        }
    }
}

/// Ordered, 0-indexed table of constant entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstantPool {
    entries: Vec<ConstantEntry>,
}

impl ConstantPool {
    pub fn new(entries: Vec<ConstantEntry>) -> Self {
        Self { entries }
    }

    /// Append an entry and return its index.
    ///
    /// Only meant for building a pool before execution starts.
    pub fn push(&mut self, entry: ConstantEntry) -> i32 {
        self.entries.push(entry);
        (self.entries.len() - 1) as i32
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch the raw entry at `index`.
    pub fn get(&self, index: i32) -> Result<&ConstantEntry, PoolError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .ok_or(PoolError::IndexOutOfRange {
                index,
                size: self.entries.len(),
            })
    }

    pub fn integer(&self, index: i32) -> Result<i64, PoolError> {
        match self.get(index)? {
            ConstantEntry::Integer(value) => Ok(*value),
            other => Err(mismatch(index, EntryKind::Integer, other)),
        }
    }

    pub fn float(&self, index: i32) -> Result<f64, PoolError> {
        match self.get(index)? {
            ConstantEntry::Float(value) => Ok(*value),
            other => Err(mismatch(index, EntryKind::Float, other)),
        }
    }

    pub fn string(&self, index: i32) -> Result<&str, PoolError> {
        match self.get(index)? {
            ConstantEntry::String(value) => Ok(value),
            other => Err(mismatch(index, EntryKind::String, other)),
        }
    }

    pub fn function(&self, index: i32) -> Result<FunctionRef, PoolError> {
        match self.get(index)? {
            ConstantEntry::Function(func) => Ok(*func),
            other => Err(mismatch(index, EntryKind::Function, other)),
        }
    }

    pub fn call_site(&self, index: i32) -> Result<&FunctionCallEntry, PoolError> {
        match self.get(index)? {
            ConstantEntry::FunctionCall(call) => Ok(call),
            other => Err(mismatch(index, EntryKind::FunctionCall, other)),
        }
    }

    pub fn return_site(&self, index: i32) -> Result<&FunctionReturnEntry, PoolError> {
        match self.get(index)? {
            ConstantEntry::FunctionReturn(ret) => Ok(ret),
            other => Err(mismatch(index, EntryKind::FunctionReturn, other)),
        }
    }
}

fn mismatch(index: i32, expected: EntryKind, found: &ConstantEntry) -> PoolError {
    PoolError::KindMismatch {
        index,
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pool() -> ConstantPool {
        ConstantPool::new(vec![
            ConstantEntry::Integer(120),
            ConstantEntry::Float(2.5),
            ConstantEntry::String("hello".into()),
            ConstantEntry::Function(FunctionRef {
                package_index: 0,
                function_ref: 1,
            }),
            ConstantEntry::FunctionCall(FunctionCallEntry {
                arg_registers: vec![0, 1],
                return_registers: vec![2],
            }),
            ConstantEntry::FunctionReturn(FunctionReturnEntry {
                result_registers: vec![3],
            }),
        ])
    }

    #[test]
    fn resolves_each_variant() {
        let pool = sample_pool();
        assert_eq!(pool.integer(0), Ok(120));
        assert_eq!(pool.float(1), Ok(2.5));
        assert_eq!(pool.string(2), Ok("hello"));
        assert_eq!(
            pool.function(3),
            Ok(FunctionRef {
                package_index: 0,
                function_ref: 1
            })
        );
        assert_eq!(pool.call_site(4).unwrap().arg_registers, vec![0, 1]);
        assert_eq!(pool.return_site(5).unwrap().result_registers, vec![3]);
    }

    #[test]
    fn out_of_range_index() {
        let pool = sample_pool();
        assert_eq!(
            pool.integer(6),
            Err(PoolError::IndexOutOfRange { index: 6, size: 6 })
        );
        assert_eq!(
            pool.integer(-1),
            Err(PoolError::IndexOutOfRange { index: -1, size: 6 })
        );
    }

    #[test]
    fn wrong_variant() {
        let pool = sample_pool();
        assert_eq!(
            pool.integer(2),
            Err(PoolError::KindMismatch {
                index: 2,
                expected: EntryKind::Integer,
                found: EntryKind::String,
            })
        );
        assert_eq!(
            pool.return_site(4),
            Err(PoolError::KindMismatch {
                index: 4,
                expected: EntryKind::FunctionReturn,
                found: EntryKind::FunctionCall,
            })
        );
    }

    #[test]
    fn push_returns_index() {
        let mut pool = ConstantPool::default();
        assert!(pool.is_empty());
        assert_eq!(pool.push(ConstantEntry::Integer(1)), 0);
        assert_eq!(pool.push(ConstantEntry::Integer(2)), 1);
        assert_eq!(pool.len(), 2);
    }
}
