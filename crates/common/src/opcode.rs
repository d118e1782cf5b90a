//! Opcode catalog for the register VM instruction set.
//!
//! Numeric codes are a stable contract with the external compiler: programs
//! carry raw `i32` codes and no operand is self-describing, so both the code
//! and the operand order of every entry must stay fixed.

use std::fmt;

use crate::error::DecodeError;

/// One past the highest code in the catalog. Every valid code is below it.
pub const INSTRUCTION_CODE_COUNT: i32 = 214;

macro_rules! opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $code:literal, $mnemonic:literal, $operands:literal;
        )*
    ) => {
        /// Identifies the operation an instruction performs.
        ///
        /// `#[repr(i32)]` pins each variant to its wire code.
        #[repr(i32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $code,
            )*
        }

        /// Every opcode in the catalog, in code order.
        pub const ALL_OPCODES: &[Opcode] = &[$(Opcode::$name,)*];

        impl TryFrom<i32> for Opcode {
            type Error = DecodeError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                match value {
                    $($code => Ok(Opcode::$name),)*
                    _ => Err(DecodeError::UnknownOpcode(value)),
                }
            }
        }

        impl Opcode {
            /// Returns the assembly mnemonic for this opcode.
            pub fn mnemonic(&self) -> &'static str {
                match self {
                    $(Opcode::$name => $mnemonic,)*
                }
            }

            /// Number of operands an instruction with this opcode carries.
            pub fn operand_count(&self) -> usize {
                match self {
                    $(Opcode::$name => $operands,)*
                }
            }
        }
    };
}

opcodes! {
    /// No operation.
    Nop = 0, "NOP", 0;

    // Constant loads: pool-indexed take (cp, reg), immediates take (reg).
    /// Load an integer pool entry into an int register.
    Iconst = 2, "ICONST", 2;
    /// Load a float pool entry into a float register.
    Fconst = 3, "FCONST", 2;
    /// Load a string pool entry into a string register.
    Sconst = 4, "SCONST", 2;
    Iconst0 = 5, "ICONST_0", 1;
    Iconst1 = 6, "ICONST_1", 1;
    Iconst2 = 7, "ICONST_2", 1;
    Iconst3 = 8, "ICONST_3", 1;
    Iconst4 = 9, "ICONST_4", 1;
    Iconst5 = 10, "ICONST_5", 1;
    Fconst0 = 11, "FCONST_0", 1;
    Fconst1 = 12, "FCONST_1", 1;
    Fconst2 = 13, "FCONST_2", 1;
    Fconst3 = 14, "FCONST_3", 1;
    Fconst4 = 15, "FCONST_4", 1;
    Fconst5 = 16, "FCONST_5", 1;
    /// Write 0 into a flag register.
    Bconst0 = 17, "BCONST_0", 1;
    /// Write 1 into a flag register.
    Bconst1 = 18, "BCONST_1", 1;
    RconstNull = 19, "RCONST_NULL", 1;

    // Local loads: (local, reg).
    Iload = 22, "ILOAD", 2;
    Fload = 23, "FLOAD", 2;
    Sload = 24, "SLOAD", 2;
    Bload = 25, "BLOAD", 2;
    Rload = 26, "RLOAD", 2;
    Iaload = 27, "IALOAD", 3;
    Faload = 28, "FALOAD", 3;
    Saload = 29, "SALOAD", 3;
    Baload = 30, "BALOAD", 3;
    Raload = 31, "RALOAD", 3;
    JsonAload = 32, "JSONALOAD", 3;
    Igload = 33, "IGLOAD", 2;
    Fgload = 34, "FGLOAD", 2;
    Sgload = 35, "SGLOAD", 2;
    Bgload = 36, "BGLOAD", 2;
    Rgload = 37, "RGLOAD", 2;

    // Local stores: (reg, local).
    Istore = 38, "ISTORE", 2;
    Fstore = 39, "FSTORE", 2;
    Sstore = 40, "SSTORE", 2;
    Bstore = 41, "BSTORE", 2;
    Rstore = 42, "RSTORE", 2;
    Iastore = 43, "IASTORE", 3;
    Fastore = 44, "FASTORE", 3;
    Sastore = 45, "SASTORE", 3;
    Bastore = 46, "BASTORE", 3;
    Rastore = 47, "RASTORE", 3;
    JsonAstore = 48, "JSONASTORE", 3;
    Igstore = 49, "IGSTORE", 2;
    Fgstore = 50, "FGSTORE", 2;
    Sgstore = 51, "SGSTORE", 2;
    Bgstore = 52, "BGSTORE", 2;
    Rgstore = 53, "RGSTORE", 2;

    // Struct field access: (struct reg, field, reg).
    IfieldLoad = 54, "IFIELDLOAD", 3;
    FfieldLoad = 55, "FFIELDLOAD", 3;
    SfieldLoad = 56, "SFIELDLOAD", 3;
    BfieldLoad = 57, "BFIELDLOAD", 3;
    RfieldLoad = 58, "RFIELDLOAD", 3;
    IfieldStore = 60, "IFIELDSTORE", 3;
    FfieldStore = 61, "FFIELDSTORE", 3;
    SfieldStore = 62, "SFIELDSTORE", 3;
    BfieldStore = 63, "BFIELDSTORE", 3;
    RfieldStore = 64, "RFIELDSTORE", 3;

    /// `MAPLOAD map_reg key_reg value_reg`
    MapLoad = 65, "MAPLOAD", 3;
    /// `MAPSTORE map_reg key_reg value_reg`
    MapStore = 66, "MAPSTORE", 3;
    /// `JSONLOAD json_reg key_reg json_value_reg`
    JsonLoad = 67, "JSONLOAD", 3;
    JsonStore = 68, "JSONSTORE", 3;

    // Arithmetic: (lhs, rhs, dest).
    Iadd = 70, "IADD", 3;
    Fadd = 71, "FADD", 3;
    /// String concatenation.
    Sadd = 72, "SADD", 3;
    Isub = 73, "ISUB", 3;
    Fsub = 74, "FSUB", 3;
    Imul = 75, "IMUL", 3;
    Fmul = 76, "FMUL", 3;
    Idiv = 77, "IDIV", 3;
    Fdiv = 78, "FDIV", 3;
    Imod = 79, "IMOD", 3;
    Fmod = 80, "FMOD", 3;
    /// `INEG src dest`
    Ineg = 81, "INEG", 2;
    /// `FNEG src dest`
    Fneg = 82, "FNEG", 2;

    // Same-bank register copies: (src, dest).
    Imove = 83, "IMOVE", 2;
    Fmove = 84, "FMOVE", 2;
    Smove = 85, "SMOVE", 2;
    Bmove = 86, "BMOVE", 2;
    Rmove = 87, "RMOVE", 2;

    // Three-way compare into a flag register: (lhs, rhs, flag).
    Icmp = 100, "ICMP", 3;
    Fcmp = 101, "FCMP", 3;
    Scmp = 102, "SCMP", 3;
    Bcmp = 103, "BCMP", 3;

    // Conditional branches on a flag register: (flag, target).
    Ifeq = 110, "IFEQ", 2;
    Ifne = 111, "IFNE", 2;
    Iflt = 112, "IFLT", 2;
    Ifge = 113, "IFGE", 2;
    Ifgt = 114, "IFGT", 2;
    Ifle = 115, "IFLE", 2;

    /// Unconditional jump to an absolute address.
    Goto = 119, "GOTO", 1;
    /// `CALL function_cp call_site_cp`
    Call = 120, "CALL", 2;
    /// Asynchronous call. Same operand shape as `CALL`.
    Acall = 121, "ACALL", 2;
    /// `RET return_site_cp`
    Ret = 125, "RET", 1;

    // Type conversion: (src, dest).
    I2f = 130, "I2F", 2;
    I2s = 131, "I2S", 2;
    I2b = 132, "I2B", 2;
    I2any = 133, "I2ANY", 2;
    I2json = 134, "I2JSON", 2;
    F2i = 135, "F2I", 2;
    F2s = 136, "F2S", 2;
    F2b = 137, "F2B", 2;
    F2any = 138, "F2ANY", 2;
    F2json = 139, "F2JSON", 2;
    S2i = 140, "S2I", 2;
    S2f = 141, "S2F", 2;
    S2b = 142, "S2B", 2;
    S2any = 143, "S2ANY", 2;
    S2json = 144, "S2JSON", 2;
    B2i = 145, "B2I", 2;
    B2f = 146, "B2F", 2;
    B2s = 147, "B2S", 2;
    B2any = 148, "B2ANY", 2;
    B2json = 149, "B2JSON", 2;
    Json2i = 150, "JSON2I", 2;
    Json2f = 151, "JSON2F", 2;
    Json2s = 152, "JSON2S", 2;
    Json2b = 153, "JSON2B", 2;
    Any2i = 154, "ANY2I", 2;
    Any2f = 155, "ANY2F", 2;
    Any2s = 156, "ANY2S", 2;
    Any2b = 157, "ANY2B", 2;
    Any2json = 158, "ANY2JSON", 2;
    Any2map = 159, "ANY2MAP", 2;
    Null2json = 160, "NULL2JSON", 2;

    // Construction.
    Inewarray = 200, "INEWARRAY", 1;
    Fnewarray = 201, "FNEWARRAY", 1;
    Snewarray = 202, "SNEWARRAY", 1;
    Bnewarray = 203, "BNEWARRAY", 1;
    Rnewarray = 204, "RNEWARRAY", 1;
    JsonNewarray = 205, "JSONNEWARRAY", 1;
    /// `NEWSTRUCT struct_cp dest`
    NewStruct = 210, "NEWSTRUCT", 2;
    /// `NEWCONNECTOR connector_cp dest`
    NewConnector = 211, "NEWCONNECTOR", 2;
    NewMap = 212, "NEWMAP", 1;
    NewJson = 213, "NEWJSON", 1;
}

impl Opcode {
    /// The wire code of this opcode.
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
