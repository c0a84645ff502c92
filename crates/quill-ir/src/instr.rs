//! Instructions, blocks, functions, and the module container
//!
//! The instruction set is a closed tagged union; the writer dispatches over it
//! exhaustively, so adding or removing a variant is a compile-checked change.
//! The graph is immutable once built: the writer only ever reads it.

use crate::symbol::{FuncId, ParamId, Reg, Symbol};
use crate::types::{FunctionType, Type};

/// Basic block slot within a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

/// Binary arithmetic/bitwise operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    FAdd,
    Sub,
    FSub,
    Mul,
    FMul,
    UDiv,
    SDiv,
    FDiv,
    URem,
    SRem,
    FRem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
}

impl BinaryOperator {
    /// Instruction mnemonic in the textual grammar
    pub fn ir_string(self) -> &'static str {
        match self {
            BinaryOperator::Add => "add",
            BinaryOperator::FAdd => "fadd",
            BinaryOperator::Sub => "sub",
            BinaryOperator::FSub => "fsub",
            BinaryOperator::Mul => "mul",
            BinaryOperator::FMul => "fmul",
            BinaryOperator::UDiv => "udiv",
            BinaryOperator::SDiv => "sdiv",
            BinaryOperator::FDiv => "fdiv",
            BinaryOperator::URem => "urem",
            BinaryOperator::SRem => "srem",
            BinaryOperator::FRem => "frem",
            BinaryOperator::Shl => "shl",
            BinaryOperator::LShr => "lshr",
            BinaryOperator::AShr => "ashr",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
        }
    }

    /// Whether this operator works on floating-point operands
    pub fn is_floating_point(self) -> bool {
        matches!(
            self,
            BinaryOperator::FAdd
                | BinaryOperator::FSub
                | BinaryOperator::FMul
                | BinaryOperator::FDiv
                | BinaryOperator::FRem
        )
    }
}

/// Wrap/exactness flag attached to a binary operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationFlag {
    /// No unsigned wrap
    NoUnsignedWrap,
    /// No signed wrap
    NoSignedWrap,
    /// Division/shift is exact
    Exact,
}

impl OperationFlag {
    /// Flag token in the textual grammar
    pub fn ir_string(self) -> &'static str {
        match self {
            OperationFlag::NoUnsignedWrap => "nuw",
            OperationFlag::NoSignedWrap => "nsw",
            OperationFlag::Exact => "exact",
        }
    }
}

/// Cast operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastOperator {
    Trunc,
    ZExt,
    SExt,
    FpTrunc,
    FpExt,
    FpToUi,
    FpToSi,
    UiToFp,
    SiToFp,
    PtrToInt,
    IntToPtr,
    Bitcast,
}

impl CastOperator {
    /// Instruction mnemonic in the textual grammar
    pub fn ir_string(self) -> &'static str {
        match self {
            CastOperator::Trunc => "trunc",
            CastOperator::ZExt => "zext",
            CastOperator::SExt => "sext",
            CastOperator::FpTrunc => "fptrunc",
            CastOperator::FpExt => "fpext",
            CastOperator::FpToUi => "fptoui",
            CastOperator::FpToSi => "fptosi",
            CastOperator::UiToFp => "uitofp",
            CastOperator::SiToFp => "sitofp",
            CastOperator::PtrToInt => "ptrtoint",
            CastOperator::IntToPtr => "inttoptr",
            CastOperator::Bitcast => "bitcast",
        }
    }
}

/// Comparison predicate (integer and floating-point)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOperator {
    // Integer predicates
    Eq,
    Ne,
    UGt,
    UGe,
    ULt,
    ULe,
    SGt,
    SGe,
    SLt,
    SLe,
    // Floating-point predicates
    FFalse,
    FOEq,
    FOGt,
    FOGe,
    FOLt,
    FOLe,
    FONe,
    FOrd,
    FUEq,
    FUGt,
    FUGe,
    FULt,
    FULe,
    FUNe,
    FUno,
    FTrue,
}

impl CompareOperator {
    /// Predicate token in the textual grammar
    pub fn ir_string(self) -> &'static str {
        match self {
            CompareOperator::Eq => "eq",
            CompareOperator::Ne => "ne",
            CompareOperator::UGt => "ugt",
            CompareOperator::UGe => "uge",
            CompareOperator::ULt => "ult",
            CompareOperator::ULe => "ule",
            CompareOperator::SGt => "sgt",
            CompareOperator::SGe => "sge",
            CompareOperator::SLt => "slt",
            CompareOperator::SLe => "sle",
            CompareOperator::FFalse => "false",
            CompareOperator::FOEq => "oeq",
            CompareOperator::FOGt => "ogt",
            CompareOperator::FOGe => "oge",
            CompareOperator::FOLt => "olt",
            CompareOperator::FOLe => "ole",
            CompareOperator::FONe => "one",
            CompareOperator::FOrd => "ord",
            CompareOperator::FUEq => "ueq",
            CompareOperator::FUGt => "ugt",
            CompareOperator::FUGe => "uge",
            CompareOperator::FULt => "ult",
            CompareOperator::FULe => "ule",
            CompareOperator::FUNe => "une",
            CompareOperator::FUno => "uno",
            CompareOperator::FTrue => "true",
        }
    }

    /// Whether this predicate belongs to `fcmp` rather than `icmp`
    pub fn is_floating_point(self) -> bool {
        matches!(
            self,
            CompareOperator::FFalse
                | CompareOperator::FOEq
                | CompareOperator::FOGt
                | CompareOperator::FOGe
                | CompareOperator::FOLt
                | CompareOperator::FOLe
                | CompareOperator::FONe
                | CompareOperator::FOrd
                | CompareOperator::FUEq
                | CompareOperator::FUGt
                | CompareOperator::FUGe
                | CompareOperator::FULt
                | CompareOperator::FULe
                | CompareOperator::FUNe
                | CompareOperator::FUno
                | CompareOperator::FTrue
        )
    }
}

/// Memory-consistency ordering attached to an atomic operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomicOrdering {
    /// Sentinel: the operation is not atomic
    NotAtomic,
    Unordered,
    Monotonic,
    Acquire,
    Release,
    AcquireRelease,
    SequentiallyConsistent,
}

impl AtomicOrdering {
    /// Ordering token in the textual grammar; only meaningful when the
    /// ordering is not [`AtomicOrdering::NotAtomic`]
    pub fn ir_string(self) -> &'static str {
        match self {
            AtomicOrdering::NotAtomic => "",
            AtomicOrdering::Unordered => "unordered",
            AtomicOrdering::Monotonic => "monotonic",
            AtomicOrdering::Acquire => "acquire",
            AtomicOrdering::Release => "release",
            AtomicOrdering::AcquireRelease => "acq_rel",
            AtomicOrdering::SequentiallyConsistent => "seq_cst",
        }
    }

    /// Whether the operation carrying this ordering is atomic
    pub fn is_atomic(self) -> bool {
        !matches!(self, AtomicOrdering::NotAtomic)
    }
}

/// Set of execution agents an atomic operation's ordering applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynchronizationScope {
    /// Whole-system ordering (the default)
    CrossThread,
    /// Single-thread ordering
    SingleThread,
}

/// Atomicity attributes shared by load and store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atomicity {
    /// Memory ordering ([`AtomicOrdering::NotAtomic`] for plain accesses)
    pub ordering: AtomicOrdering,
    /// Synchronization scope (only rendered inside an atomic clause)
    pub scope: SynchronizationScope,
    /// Volatility flag
    pub volatile: bool,
}

impl Atomicity {
    /// Plain non-atomic, non-volatile access
    pub const NONE: Atomicity = Atomicity {
        ordering: AtomicOrdering::NotAtomic,
        scope: SynchronizationScope::CrossThread,
        volatile: false,
    };
}

/// Read-modify-write operator for `atomicrmw`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RmwOperator {
    Xchg,
    Add,
    Sub,
    And,
    Nand,
    Or,
    Xor,
    Max,
    Min,
    UMax,
    UMin,
}

impl RmwOperator {
    /// Operator token in the textual grammar
    pub fn ir_string(self) -> &'static str {
        match self {
            RmwOperator::Xchg => "xchg",
            RmwOperator::Add => "add",
            RmwOperator::Sub => "sub",
            RmwOperator::And => "and",
            RmwOperator::Nand => "nand",
            RmwOperator::Or => "or",
            RmwOperator::Xor => "xor",
            RmwOperator::Max => "max",
            RmwOperator::Min => "min",
            RmwOperator::UMax => "umax",
            RmwOperator::UMin => "umin",
        }
    }
}

/// One `<value> -> <target>` arm of a switch
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// Case value (an integer constant in well-formed input)
    pub value: Symbol,
    /// Target block for this case
    pub target: BlockId,
}

/// Landingpad catch/filter clause. Recognized by the model but not encodable
/// by the writer.
#[derive(Debug, Clone, PartialEq)]
pub enum LandingPadClause {
    /// `catch <type> <value>`
    Catch(Symbol),
    /// `filter <type> <value>`
    Filter(Symbol),
}

/// An IR instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // ===== Memory =====
    Allocate {
        dest: Reg,
        /// Type of the allocated slot (the result is a pointer to it)
        pointee: Type,
        /// Element count; the literal 1 is omitted from the text
        count: Symbol,
        /// Alignment exponent; 0 means unspecified
        align: u32,
    },
    Load {
        dest: Reg,
        /// Pointer operand
        source: Symbol,
        /// Alignment exponent; 0 means unspecified
        align: u32,
        atomicity: Atomicity,
    },
    Store {
        /// Value operand; its printed type derives from the destination pointer
        value: Symbol,
        /// Pointer operand
        destination: Symbol,
        /// Alignment exponent; 0 means unspecified
        align: u32,
        atomicity: Atomicity,
    },
    CompareExchange {
        dest: Reg,
        ptr: Symbol,
        expected: Symbol,
        replacement: Symbol,
        ordering: AtomicOrdering,
        scope: SynchronizationScope,
        volatile: bool,
    },
    ReadModifyWrite {
        dest: Reg,
        op: RmwOperator,
        ptr: Symbol,
        value: Symbol,
        ordering: AtomicOrdering,
        scope: SynchronizationScope,
        volatile: bool,
    },
    Fence {
        ordering: AtomicOrdering,
        scope: SynchronizationScope,
    },
    GetElementPointer {
        dest: Reg,
        base: Symbol,
        indices: Vec<Symbol>,
        inbounds: bool,
    },

    // ===== Arithmetic =====
    BinaryOperation {
        dest: Reg,
        op: BinaryOperator,
        flags: Vec<OperationFlag>,
        /// Common operand/result type
        ty: Type,
        lhs: Symbol,
        rhs: Symbol,
    },
    Compare {
        dest: Reg,
        op: CompareOperator,
        lhs: Symbol,
        rhs: Symbol,
    },
    Cast {
        dest: Reg,
        op: CastOperator,
        value: Symbol,
        to: Type,
    },
    Select {
        dest: Reg,
        condition: Symbol,
        on_true: Symbol,
        on_false: Symbol,
    },

    // ===== Aggregates and vectors =====
    ExtractElement {
        dest: Reg,
        vector: Symbol,
        index: Symbol,
    },
    InsertElement {
        dest: Reg,
        vector: Symbol,
        value: Symbol,
        index: Symbol,
    },
    ExtractValue {
        dest: Reg,
        aggregate: Symbol,
        index: u32,
    },
    InsertValue {
        dest: Reg,
        aggregate: Symbol,
        value: Symbol,
        index: u32,
    },
    ShuffleVector {
        dest: Reg,
        vector1: Symbol,
        vector2: Symbol,
        mask: Symbol,
    },

    // ===== Calls =====
    Call {
        dest: Reg,
        /// Declared type of the call itself (the return type only)
        return_type: Type,
        target: Symbol,
        args: Vec<Symbol>,
    },
    VoidCall {
        return_type: Type,
        target: Symbol,
        args: Vec<Symbol>,
    },
    Invoke {
        dest: Reg,
        return_type: Type,
        target: Symbol,
        args: Vec<Symbol>,
        normal: BlockId,
        unwind: BlockId,
    },
    VoidInvoke {
        return_type: Type,
        target: Symbol,
        args: Vec<Symbol>,
        normal: BlockId,
        unwind: BlockId,
    },

    // ===== Exception handling =====
    LandingPad {
        dest: Reg,
        ty: Type,
        cleanup: bool,
        clauses: Vec<LandingPadClause>,
    },
    Resume {
        value: Symbol,
    },

    // ===== Control flow =====
    Phi {
        dest: Reg,
        ty: Type,
        incoming: Vec<(Symbol, BlockId)>,
    },
    Branch {
        target: BlockId,
    },
    ConditionalBranch {
        condition: Symbol,
        on_true: BlockId,
        on_false: BlockId,
    },
    IndirectBranch {
        address: Symbol,
        successors: Vec<BlockId>,
    },
    Switch {
        condition: Symbol,
        default: BlockId,
        cases: Vec<SwitchCase>,
    },
    Return {
        value: Option<Symbol>,
    },
    Unreachable,
}

impl Instruction {
    /// The result register if this instruction produces a value
    pub fn dest(&self) -> Option<Reg> {
        match self {
            Instruction::Allocate { dest, .. }
            | Instruction::Load { dest, .. }
            | Instruction::CompareExchange { dest, .. }
            | Instruction::ReadModifyWrite { dest, .. }
            | Instruction::GetElementPointer { dest, .. }
            | Instruction::BinaryOperation { dest, .. }
            | Instruction::Compare { dest, .. }
            | Instruction::Cast { dest, .. }
            | Instruction::Select { dest, .. }
            | Instruction::ExtractElement { dest, .. }
            | Instruction::InsertElement { dest, .. }
            | Instruction::ExtractValue { dest, .. }
            | Instruction::InsertValue { dest, .. }
            | Instruction::ShuffleVector { dest, .. }
            | Instruction::Call { dest, .. }
            | Instruction::Invoke { dest, .. }
            | Instruction::LandingPad { dest, .. }
            | Instruction::Phi { dest, .. } => Some(*dest),

            Instruction::Store { .. }
            | Instruction::Fence { .. }
            | Instruction::VoidCall { .. }
            | Instruction::VoidInvoke { .. }
            | Instruction::Resume { .. }
            | Instruction::Branch { .. }
            | Instruction::ConditionalBranch { .. }
            | Instruction::IndirectBranch { .. }
            | Instruction::Switch { .. }
            | Instruction::Return { .. }
            | Instruction::Unreachable => None,
        }
    }

    /// Whether this instruction ends a basic block's control flow
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Branch { .. }
                | Instruction::ConditionalBranch { .. }
                | Instruction::IndirectBranch { .. }
                | Instruction::Switch { .. }
                | Instruction::Return { .. }
                | Instruction::Unreachable
                | Instruction::Invoke { .. }
                | Instruction::VoidInvoke { .. }
                | Instruction::Resume { .. }
        )
    }
}

/// A named, typed result register slot
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterInfo {
    /// Name without the `%` sigil, unique within the function
    pub name: String,
    /// Static type of the value
    pub ty: Type,
}

/// A typed function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Name without the `%` sigil
    pub name: String,
    /// Static type
    pub ty: Type,
}

/// A straight-line instruction sequence ending in a terminator
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Explicit label, without the `%` sigil; a missing label is synthesized
    /// from the block's position at encoding time
    pub label: Option<String>,
    /// Instructions in order
    pub instructions: Vec<Instruction>,
}

/// A function declaration (no blocks) or definition (one or more blocks)
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Name without the `@` sigil
    pub name: String,
    /// Signature
    pub ty: FunctionType,
    /// Parameters, in signature order (named only for definitions)
    pub params: Vec<Parameter>,
    /// Basic blocks; the first is the entry block. Empty for declarations.
    pub blocks: Vec<Block>,
    registers: Vec<RegisterInfo>,
}

impl Function {
    /// Create an empty function with no parameters or blocks
    pub fn new(name: impl Into<String>, ty: FunctionType) -> Function {
        Function {
            name: name.into(),
            ty,
            params: Vec::new(),
            blocks: Vec::new(),
            registers: Vec::new(),
        }
    }

    /// Whether this is a declaration (a body-less function)
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Allocate a named result register
    pub fn add_register(&mut self, name: impl Into<String>, ty: Type) -> Reg {
        let reg = Reg(self.registers.len() as u32);
        self.registers.push(RegisterInfo { name: name.into(), ty });
        reg
    }

    /// Look up a register slot
    pub fn register(&self, reg: Reg) -> &RegisterInfo {
        &self.registers[reg.0 as usize]
    }

    /// Number of allocated registers
    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Look up a parameter slot
    pub fn param(&self, param: ParamId) -> &Parameter {
        &self.params[param.0 as usize]
    }

    /// Get a block by id
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    /// Find the instruction that defines a register, scanning in block order
    pub fn defining_instruction(&self, reg: Reg) -> Option<&Instruction> {
        self.blocks
            .iter()
            .flat_map(|block| block.instructions.iter())
            .find(|instr| instr.dest() == Some(reg))
    }
}

/// The top-level container of functions in one compilation unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    /// Declarations and definitions, in declaration order
    pub functions: Vec<Function>,
}

impl Module {
    /// Create an empty module
    pub fn new() -> Module {
        Module::default()
    }

    /// Append a function and return its id
    pub fn add_function(&mut self, function: Function) -> FuncId {
        let id = FuncId(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    /// Get a function by id
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Constant;

    #[test]
    fn dest_reflects_value_production() {
        let add = Instruction::BinaryOperation {
            dest: Reg(3),
            op: BinaryOperator::Add,
            flags: vec![],
            ty: Type::I32,
            lhs: Constant::i32(1).into(),
            rhs: Constant::i32(2).into(),
        };
        assert_eq!(add.dest(), Some(Reg(3)));

        let ret = Instruction::Return { value: None };
        assert_eq!(ret.dest(), None);
        assert!(ret.is_terminator());
        assert!(!add.is_terminator());
    }

    #[test]
    fn defining_instruction_scans_blocks() {
        let mut func = Function::new("f", FunctionType::new(Type::Void, vec![], false));
        let dest = func.add_register("x", Type::I32);
        func.blocks.push(Block {
            label: None,
            instructions: vec![
                Instruction::Allocate {
                    dest,
                    pointee: Type::I32,
                    count: Constant::i32(1).into(),
                    align: 0,
                },
                Instruction::Return { value: None },
            ],
        });

        assert!(matches!(
            func.defining_instruction(dest),
            Some(Instruction::Allocate { .. })
        ));
        assert!(func.defining_instruction(Reg(99)).is_none());
    }

    #[test]
    fn fcmp_and_icmp_predicates_are_separated() {
        assert!(CompareOperator::FOEq.is_floating_point());
        assert!(!CompareOperator::SLt.is_floating_point());
        assert_eq!(CompareOperator::FUNe.ir_string(), "une");
        assert_eq!(CompareOperator::SLe.ir_string(), "sle");
    }
}
