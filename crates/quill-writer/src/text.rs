//! Per-function encoding context and operand rendering

use std::borrow::Cow;
use std::fmt::{self, Write};

use quill_ir::{BlockId, Function, Instruction, Module, Reg, Symbol, Type};
use rustc_hash::FxHashMap;

use crate::dialect::Dialect;

/// Everything the emitters need while encoding one function body
pub(crate) struct Cx<'a> {
    pub module: &'a Module,
    pub func: &'a Function,
    pub dialect: Dialect,
    defs: FxHashMap<Reg, &'a Instruction>,
}

impl<'a> Cx<'a> {
    pub fn new(module: &'a Module, func: &'a Function, dialect: Dialect) -> Cx<'a> {
        let mut defs = FxHashMap::default();
        for block in &func.blocks {
            for instr in &block.instructions {
                if let Some(dest) = instr.dest() {
                    defs.insert(dest, instr);
                }
            }
        }
        Cx { module, func, dialect, defs }
    }

    /// The instruction whose result the register holds, if any
    pub fn defining_instruction(&self, reg: Reg) -> Option<&'a Instruction> {
        self.defs.get(&reg).copied()
    }

    /// The value-position type of a symbol. Function references are values
    /// of pointer-to-function type.
    pub fn symbol_type(&self, symbol: &Symbol) -> Type {
        match symbol {
            Symbol::Register(reg) => self.func.register(*reg).ty.clone(),
            Symbol::Parameter(param) => self.func.param(*param).ty.clone(),
            Symbol::Function(id) => {
                Type::pointer(Type::Function(self.module.function(*id).ty.clone()))
            }
            Symbol::Constant(constant) => constant.ty().clone(),
        }
    }

    /// Bare value text: `%reg`, `%param`, `@func`, or a constant literal
    pub fn write_value(&self, out: &mut impl Write, symbol: &Symbol) -> fmt::Result {
        match symbol {
            Symbol::Register(reg) => write!(out, "%{}", self.func.register(*reg).name),
            Symbol::Parameter(param) => write!(out, "%{}", self.func.param(*param).name),
            Symbol::Function(id) => write!(out, "@{}", self.module.function(*id).name),
            Symbol::Constant(constant) => write!(out, "{constant}"),
        }
    }

    /// `<ty> <value>` with the type taken from the symbol itself
    pub fn write_typed_value(&self, out: &mut impl Write, symbol: &Symbol) -> fmt::Result {
        write!(out, "{} ", self.symbol_type(symbol))?;
        self.write_value(out, symbol)
    }

    /// Value text of a symbol as an owned string, for error messages
    pub fn value_text(&self, symbol: &Symbol) -> String {
        let mut text = String::new();
        let _ = self.write_value(&mut text, symbol);
        text
    }

    /// Block name in operand position, e.g. `%entry` or `%b2`
    pub fn write_block_ref(&self, out: &mut impl Write, block: BlockId) -> fmt::Result {
        write!(out, "%{}", block_label(self.func, block))
    }
}

/// Label text of a block; unlabeled blocks get a synthesized `b<index>` name
pub(crate) fn block_label(func: &Function, block: BlockId) -> Cow<'_, str> {
    match &func.block(block).label {
        Some(label) => Cow::Borrowed(label.as_str()),
        None => Cow::Owned(format!("b{}", block.0)),
    }
}
