//! Type-signature alphabet and the register banks it selects.
//!
//! Signatures appear positionally in a function's parameter and return
//! lists. They are the only thing that picks a bank when values cross
//! frames; no register carries a runtime tag.

use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// A register/local bank. Each frame has one fixed-size array per bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    /// 64-bit signed integers.
    Int,
    /// 64-bit IEEE-754 floats.
    Float,
    /// Strings.
    String,
    /// 32-bit flags: booleans and three-way compare results.
    Flag,
}

/// All primitive banks, in cursor order.
pub const ALL_BANKS: [Bank; 4] = [Bank::Int, Bank::Float, Bank::String, Bank::Flag];

impl Bank {
    /// Position of this bank in [`ALL_BANKS`].
    pub fn index(&self) -> usize {
        match self {
            Bank::Int => 0,
            Bank::Float => 1,
            Bank::String => 2,
            Bank::Flag => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Bank::Int => "int",
            Bank::Float => "float",
            Bank::String => "string",
            Bank::Flag => "flag",
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parameter or return type signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSig {
    Int,
    Float,
    String,
    Boolean,
    Any,
    Json,
    Map,
    Xml,
    Array,
    Struct,
    Connector,
}

/// All signatures, in definition order.
pub const ALL_TYPE_SIGS: [TypeSig; 11] = [
    TypeSig::Int,
    TypeSig::Float,
    TypeSig::String,
    TypeSig::Boolean,
    TypeSig::Any,
    TypeSig::Json,
    TypeSig::Map,
    TypeSig::Xml,
    TypeSig::Array,
    TypeSig::Struct,
    TypeSig::Connector,
];

impl TypeSig {
    /// The leading character of this signature's encoded form.
    pub fn code(&self) -> char {
        match self {
            TypeSig::Int => 'I',
            TypeSig::Float => 'F',
            TypeSig::String => 'S',
            TypeSig::Boolean => 'B',
            TypeSig::Any => 'A',
            TypeSig::Json => 'J',
            TypeSig::Map => 'M',
            TypeSig::Xml => 'X',
            TypeSig::Array => '[',
            TypeSig::Struct => 'T',
            TypeSig::Connector => 'C',
        }
    }

    /// The primitive bank values of this type live in, if any.
    ///
    /// Reference-like signatures have no primitive bank.
    pub fn bank(&self) -> Option<Bank> {
        match self {
            TypeSig::Int => Some(Bank::Int),
            TypeSig::Float => Some(Bank::Float),
            TypeSig::String => Some(Bank::String),
            TypeSig::Boolean => Some(Bank::Flag),
            _ => None,
        }
    }
}

impl TryFrom<char> for TypeSig {
    type Error = DecodeError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        ALL_TYPE_SIGS
            .iter()
            .copied()
            .find(|sig| sig.code() == value)
            .ok_or_else(|| DecodeError::UnknownTypeSig(value.to_string()))
    }
}

/// Parses an encoded signature such as `"I"` or `"Tmypkg:Person;"`.
///
/// Only the leading character selects the variant; any trailing type name
/// (struct, connector, array element) is not needed for bank selection.
impl FromStr for TypeSig {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = s
            .chars()
            .next()
            .ok_or_else(|| DecodeError::UnknownTypeSig(String::new()))?;
        TypeSig::try_from(first).map_err(|_| DecodeError::UnknownTypeSig(s.to_string()))
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
