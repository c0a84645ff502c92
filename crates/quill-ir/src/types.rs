//! LLVM IR type hierarchy
//!
//! Closed, structural type representation for the module graph. Equality is
//! structural. A primitive's constant-ness participates in equality but never
//! in rendered text; the writer treats const and non-const primitives of the
//! same kind as textually equivalent when matching call arguments.

use std::fmt;

/// Primitive type kind (integer bit width or floating-point format)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// 1-bit integer (boolean)
    I1,
    /// 8-bit integer
    I8,
    /// 16-bit integer
    I16,
    /// 32-bit integer
    I32,
    /// 64-bit integer
    I64,
    /// 16-bit IEEE float
    Half,
    /// 32-bit IEEE float
    Float,
    /// 64-bit IEEE float
    Double,
}

impl PrimitiveKind {
    /// Bit width of the primitive
    pub fn bit_size(self) -> u32 {
        match self {
            PrimitiveKind::I1 => 1,
            PrimitiveKind::I8 => 8,
            PrimitiveKind::I16 => 16,
            PrimitiveKind::I32 => 32,
            PrimitiveKind::I64 => 64,
            PrimitiveKind::Half => 16,
            PrimitiveKind::Float => 32,
            PrimitiveKind::Double => 64,
        }
    }

    /// Whether this kind is an integer type
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::I1
                | PrimitiveKind::I8
                | PrimitiveKind::I16
                | PrimitiveKind::I32
                | PrimitiveKind::I64
        )
    }

    /// Whether this kind is a floating-point type
    pub fn is_floating_point(self) -> bool {
        !self.is_integer()
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::I1 => write!(f, "i1"),
            PrimitiveKind::I8 => write!(f, "i8"),
            PrimitiveKind::I16 => write!(f, "i16"),
            PrimitiveKind::I32 => write!(f, "i32"),
            PrimitiveKind::I64 => write!(f, "i64"),
            PrimitiveKind::Half => write!(f, "half"),
            PrimitiveKind::Float => write!(f, "float"),
            PrimitiveKind::Double => write!(f, "double"),
        }
    }
}

/// Flavor of a metadata marker type. Both render as `metadata`; the writer
/// considers any two metadata-kind types equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    /// Plain metadata
    Metadata,
    /// Debug-info metadata
    Debug,
}

/// Function signature: return type, ordered parameter types, varargs flag
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    /// Return type (void for functions returning no value)
    pub return_type: Box<Type>,
    /// Formal parameter types, in declaration order
    pub params: Vec<Type>,
    /// Whether the function accepts a variable number of arguments
    pub varargs: bool,
}

impl FunctionType {
    /// Create a signature from a return type and parameter types
    pub fn new(return_type: Type, params: Vec<Type>, varargs: bool) -> Self {
        FunctionType {
            return_type: Box::new(return_type),
            params,
            varargs,
        }
    }
}

/// An LLVM IR type
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Primitive type; `constant` marks values known to be immutable and is
    /// ignored for rendering
    Primitive {
        /// The primitive kind
        kind: PrimitiveKind,
        /// Constant-ness marker (never rendered)
        constant: bool,
    },
    /// Pointer to a pointee type
    Pointer(Box<Type>),
    /// Fixed-length vector of a primitive element type
    Vector {
        /// Element type
        elem: Box<Type>,
        /// Number of elements
        len: u32,
    },
    /// Anonymous aggregate
    Struct {
        /// Field types, in order
        fields: Vec<Type>,
        /// Whether the struct layout is packed
        packed: bool,
    },
    /// Function signature type
    Function(FunctionType),
    /// No value
    Void,
    /// Metadata marker
    Meta(MetaKind),
}

impl Type {
    /// Non-const i1
    pub const I1: Type = Type::Primitive { kind: PrimitiveKind::I1, constant: false };
    /// Non-const i8
    pub const I8: Type = Type::Primitive { kind: PrimitiveKind::I8, constant: false };
    /// Non-const i16
    pub const I16: Type = Type::Primitive { kind: PrimitiveKind::I16, constant: false };
    /// Non-const i32
    pub const I32: Type = Type::Primitive { kind: PrimitiveKind::I32, constant: false };
    /// Non-const i64
    pub const I64: Type = Type::Primitive { kind: PrimitiveKind::I64, constant: false };
    /// Non-const float
    pub const FLOAT: Type = Type::Primitive { kind: PrimitiveKind::Float, constant: false };
    /// Non-const double
    pub const DOUBLE: Type = Type::Primitive { kind: PrimitiveKind::Double, constant: false };

    /// Pointer to `pointee`
    pub fn pointer(pointee: Type) -> Type {
        Type::Pointer(Box::new(pointee))
    }

    /// Vector of `len` elements of type `elem`
    pub fn vector(elem: Type, len: u32) -> Type {
        Type::Vector { elem: Box::new(elem), len }
    }

    /// Unpacked struct with the given field types
    pub fn structure(fields: Vec<Type>) -> Type {
        Type::Struct { fields, packed: false }
    }

    /// The pointee if this is a pointer type
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Whether this is a pointer whose pointee is a function type
    pub fn is_function_pointer(&self) -> bool {
        matches!(self.pointee(), Some(Type::Function(_)))
    }

    /// Textual equivalence used for call-argument matching: structural
    /// equality, or both metadata-kind, or both primitives of the same kind
    /// regardless of constant-ness.
    pub fn is_equivalent_ir_type(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        if matches!(self, Type::Meta(_)) && matches!(other, Type::Meta(_)) {
            return true;
        }
        if let (Type::Primitive { kind: a, .. }, Type::Primitive { kind: b, .. }) = (self, other) {
            return a == b;
        }
        false
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive { kind, .. } => write!(f, "{kind}"),
            Type::Pointer(pointee) => write!(f, "{pointee}*"),
            Type::Vector { elem, len } => write!(f, "<{len} x {elem}>"),
            Type::Struct { fields, packed } => {
                if *packed {
                    write!(f, "<")?;
                }
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i != 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {field}")?;
                }
                write!(f, " }}")?;
                if *packed {
                    write!(f, ">")?;
                }
                Ok(())
            }
            Type::Function(func) => {
                write!(f, "{} ", func.return_type)?;
                write_formal_params(f, func)
            }
            Type::Void => write!(f, "void"),
            Type::Meta(_) => write!(f, "metadata"),
        }
    }
}

/// Render a signature's parenthesized parameter list, `...` included for
/// varargs. The return type is not part of this fragment.
pub fn write_formal_params(f: &mut impl fmt::Write, func: &FunctionType) -> fmt::Result {
    write!(f, "(")?;
    for (i, param) in func.params.iter().enumerate() {
        if i != 0 {
            write!(f, ", ")?;
        }
        write!(f, "{param}")?;
    }
    if func.varargs {
        if !func.params.is_empty() {
            write!(f, ", ")?;
        }
        write!(f, "...")?;
    }
    write!(f, ")")
}
