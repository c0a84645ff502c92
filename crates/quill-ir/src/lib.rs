//! Quill IR Model
//!
//! In-memory representation of an SSA intermediate representation:
//! types, symbols, instructions, and builders for constructing modules.

pub mod builder;
pub mod extract;
pub mod instr;
pub mod symbol;
pub mod types;

pub use builder::{FunctionBuilder, ModuleBuilder};
pub use extract::{find_unique, ExtractError};
pub use instr::{
    AtomicOrdering, Atomicity, BinaryOperator, Block, BlockId, CastOperator, CompareOperator,
    Function, Instruction, LandingPadClause, Module, OperationFlag, Parameter, RmwOperator,
    SwitchCase, SynchronizationScope,
};
pub use symbol::{Constant, FuncId, ParamId, Reg, Symbol};
pub use types::{FunctionType, MetaKind, PrimitiveKind, Type};
