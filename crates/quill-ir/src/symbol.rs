//! Value references
//!
//! A `Symbol` is anything an instruction operand can name: another
//! instruction's result register, a function parameter, a function, or an
//! immediate constant. Symbols are referenced by the writer, never mutated.

use std::fmt;

use crate::types::{PrimitiveKind, Type};

/// Result register of a value-producing instruction, unique within a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reg(pub u32);

/// Parameter slot of the enclosing function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub u32);

/// Function slot in the module (declaration or definition)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(pub u32);

/// An immediate constant carrying its own type
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Integer literal (i1 renders as `true`/`false`)
    Integer {
        /// Static type of the literal
        ty: Type,
        /// Value, sign-extended
        value: i64,
    },
    /// Floating-point literal
    Float {
        /// Static type of the literal
        ty: Type,
        /// Value
        value: f64,
    },
    /// Null pointer of the given pointer type
    Null(Type),
    /// Undefined value of the given type
    Undef(Type),
}

impl Constant {
    /// i1 constant
    pub fn i1(value: bool) -> Constant {
        Constant::Integer { ty: Type::I1, value: value as i64 }
    }

    /// i32 constant
    pub fn i32(value: i32) -> Constant {
        Constant::Integer { ty: Type::I32, value: value as i64 }
    }

    /// i64 constant
    pub fn i64(value: i64) -> Constant {
        Constant::Integer { ty: Type::I64, value }
    }

    /// Integer constant of an arbitrary integer type
    pub fn integer(ty: Type, value: i64) -> Constant {
        Constant::Integer { ty, value }
    }

    /// double constant
    pub fn double(value: f64) -> Constant {
        Constant::Float { ty: Type::DOUBLE, value }
    }

    /// The constant's static type
    pub fn ty(&self) -> &Type {
        match self {
            Constant::Integer { ty, .. } => ty,
            Constant::Float { ty, .. } => ty,
            Constant::Null(ty) => ty,
            Constant::Undef(ty) => ty,
        }
    }

    /// Whether this is the integer constant 1
    pub fn is_integer_one(&self) -> bool {
        matches!(self, Constant::Integer { value: 1, .. })
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Integer { ty, value } => {
                if matches!(ty, Type::Primitive { kind: PrimitiveKind::I1, .. }) {
                    write!(f, "{}", if *value != 0 { "true" } else { "false" })
                } else {
                    write!(f, "{value}")
                }
            }
            Constant::Float { value, .. } => write_float_literal(f, *value),
            Constant::Null(_) => write!(f, "null"),
            Constant::Undef(_) => write!(f, "undef"),
        }
    }
}

/// Render a float with a guaranteed decimal point so the literal is
/// unambiguously floating-point in the textual grammar.
fn write_float_literal(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value == value.trunc() && value.is_finite() && value.abs() < 1e15 {
        write!(f, "{value:.1}")
    } else {
        write!(f, "{value}")
    }
}

/// A polymorphic value reference used as an instruction operand
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// Result of an instruction in the same function
    Register(Reg),
    /// Parameter of the enclosing function
    Parameter(ParamId),
    /// Function declaration or definition in the module
    Function(FuncId),
    /// Immediate constant
    Constant(Constant),
}

impl From<Constant> for Symbol {
    fn from(constant: Constant) -> Symbol {
        Symbol::Constant(constant)
    }
}

impl From<Reg> for Symbol {
    fn from(reg: Reg) -> Symbol {
        Symbol::Register(reg)
    }
}

impl From<ParamId> for Symbol {
    fn from(param: ParamId) -> Symbol {
        Symbol::Parameter(param)
    }
}

impl From<FuncId> for Symbol {
    fn from(func: FuncId) -> Symbol {
        Symbol::Function(func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literals() {
        assert_eq!(Constant::i32(42).to_string(), "42");
        assert_eq!(Constant::i64(-7).to_string(), "-7");
        assert_eq!(Constant::i1(true).to_string(), "true");
        assert_eq!(Constant::i1(false).to_string(), "false");
    }

    #[test]
    fn float_literals_carry_a_point() {
        assert_eq!(Constant::double(1.0).to_string(), "1.0");
        assert_eq!(Constant::double(-2.5).to_string(), "-2.5");
        assert_eq!(Constant::double(0.0).to_string(), "0.0");
    }

    #[test]
    fn special_constants() {
        assert_eq!(Constant::Null(Type::pointer(Type::I8)).to_string(), "null");
        assert_eq!(Constant::Undef(Type::I32).to_string(), "undef");
    }

    #[test]
    fn count_of_one_is_recognized() {
        assert!(Constant::i32(1).is_integer_one());
        assert!(!Constant::i32(2).is_integer_one());
        assert!(!Constant::double(1.0).is_integer_one());
    }
}
