//! Programmatic module construction
//!
//! Builder helpers used by test generation. The builders are responsible for
//! producing a structurally valid graph (unique names, terminated blocks);
//! the writer consumes the result without re-validating it.

use rustc_hash::FxHashSet;

use crate::instr::{
    AtomicOrdering, Atomicity, BinaryOperator, Block, BlockId, CastOperator, CompareOperator,
    Function, Instruction, Parameter, RmwOperator, SwitchCase, SynchronizationScope,
};
use crate::symbol::{Constant, FuncId, Reg, Symbol};
use crate::types::{FunctionType, Type};
use crate::Module;

/// Builds a module function by function
#[derive(Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    /// Create an empty module builder
    pub fn new() -> ModuleBuilder {
        ModuleBuilder::default()
    }

    /// Add a body-less function declaration
    pub fn declare_function(&mut self, name: &str, ty: FunctionType) -> FuncId {
        let mut func = Function::new(name, ty.clone());
        func.params = ty
            .params
            .iter()
            .enumerate()
            .map(|(i, param_ty)| Parameter { name: format!("arg{i}"), ty: param_ty.clone() })
            .collect();
        self.module.add_function(func)
    }

    /// Add a function definition shell; blocks and instructions are added
    /// through [`ModuleBuilder::function_builder`]
    pub fn define_function(&mut self, name: &str, ty: FunctionType, param_names: &[&str]) -> FuncId {
        debug_assert_eq!(ty.params.len(), param_names.len());
        let mut func = Function::new(name, ty.clone());
        func.params = ty
            .params
            .iter()
            .zip(param_names)
            .map(|(param_ty, name)| Parameter { name: (*name).to_string(), ty: param_ty.clone() })
            .collect();
        self.module.add_function(func)
    }

    /// Get a builder for one function's body
    pub fn function_builder(&mut self, id: FuncId) -> FunctionBuilder<'_> {
        FunctionBuilder::new(&mut self.module.functions[id.0 as usize])
    }

    /// Read access to the module under construction
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Finish and take the module
    pub fn build(self) -> Module {
        self.module
    }
}

/// Builds one function's blocks and instructions
pub struct FunctionBuilder<'a> {
    func: &'a mut Function,
    current: BlockId,
    next_temp: u32,
    used_names: FxHashSet<String>,
}

impl<'a> FunctionBuilder<'a> {
    /// Create a builder targeting an existing function; creates the entry
    /// block if the function has none yet
    pub fn new(func: &'a mut Function) -> FunctionBuilder<'a> {
        let mut used_names: FxHashSet<String> =
            func.params.iter().map(|param| param.name.clone()).collect();
        for i in 0..func.register_count() {
            used_names.insert(func.register(Reg(i as u32)).name.clone());
        }
        if func.blocks.is_empty() {
            func.blocks.push(Block { label: None, instructions: Vec::new() });
        }
        FunctionBuilder { func, current: BlockId(0), next_temp: 0, used_names }
    }

    /// Create a new unlabeled block and return its id
    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId(self.func.blocks.len() as u32);
        self.func.blocks.push(Block { label: None, instructions: Vec::new() });
        id
    }

    /// Create a new labeled block and return its id
    pub fn create_named_block(&mut self, label: &str) -> BlockId {
        let id = BlockId(self.func.blocks.len() as u32);
        self.func.blocks.push(Block { label: Some(label.to_string()), instructions: Vec::new() });
        id
    }

    /// Switch to emitting into a different block
    pub fn switch_to_block(&mut self, block: BlockId) {
        self.current = block;
    }

    /// The block currently being emitted into
    pub fn current_block(&self) -> BlockId {
        self.current
    }

    /// Allocate an explicitly named result register
    pub fn reg(&mut self, name: &str, ty: Type) -> Reg {
        let fresh = self.used_names.insert(name.to_string());
        debug_assert!(fresh, "duplicate value name {name:?}");
        self.func.add_register(name, ty)
    }

    /// Allocate an auto-named temporary register
    pub fn temp(&mut self, ty: Type) -> Reg {
        loop {
            let name = format!("t{}", self.next_temp);
            self.next_temp += 1;
            if self.used_names.insert(name.clone()) {
                return self.func.add_register(name, ty);
            }
        }
    }

    /// Append an instruction to the current block
    pub fn emit(&mut self, instr: Instruction) {
        self.func.blocks[self.current.0 as usize].instructions.push(instr);
    }

    // ===== Memory =====

    /// `alloca` of a single slot, unspecified alignment
    pub fn allocate(&mut self, pointee: Type) -> Reg {
        self.allocate_array(pointee, Constant::i32(1), 0)
    }

    /// `alloca` with an explicit element count and alignment exponent
    pub fn allocate_array(&mut self, pointee: Type, count: Constant, align: u32) -> Reg {
        let dest = self.temp(Type::pointer(pointee.clone()));
        self.emit(Instruction::Allocate { dest, pointee, count: count.into(), align });
        dest
    }

    /// Plain `load` producing a value of `ty`
    pub fn load(&mut self, ty: Type, source: impl Into<Symbol>) -> Reg {
        self.load_atomic(ty, source, 0, Atomicity::NONE)
    }

    /// `load` with explicit alignment exponent and atomicity
    pub fn load_atomic(
        &mut self,
        ty: Type,
        source: impl Into<Symbol>,
        align: u32,
        atomicity: Atomicity,
    ) -> Reg {
        let dest = self.temp(ty);
        self.emit(Instruction::Load { dest, source: source.into(), align, atomicity });
        dest
    }

    /// Plain `store`
    pub fn store(&mut self, value: impl Into<Symbol>, destination: impl Into<Symbol>) {
        self.store_atomic(value, destination, 0, Atomicity::NONE);
    }

    /// `store` with explicit alignment exponent and atomicity
    pub fn store_atomic(
        &mut self,
        value: impl Into<Symbol>,
        destination: impl Into<Symbol>,
        align: u32,
        atomicity: Atomicity,
    ) {
        self.emit(Instruction::Store {
            value: value.into(),
            destination: destination.into(),
            align,
            atomicity,
        });
    }

    /// `cmpxchg` on a location of value type `value_ty`; the result aggregate
    /// is `{ value_ty, i1 }`
    #[allow(clippy::too_many_arguments)]
    pub fn cmpxchg(
        &mut self,
        value_ty: Type,
        ptr: impl Into<Symbol>,
        expected: impl Into<Symbol>,
        replacement: impl Into<Symbol>,
        ordering: AtomicOrdering,
        scope: SynchronizationScope,
        volatile: bool,
    ) -> Reg {
        let dest = self.temp(Type::structure(vec![value_ty, Type::I1]));
        self.emit(Instruction::CompareExchange {
            dest,
            ptr: ptr.into(),
            expected: expected.into(),
            replacement: replacement.into(),
            ordering,
            scope,
            volatile,
        });
        dest
    }

    /// `atomicrmw` producing the previous value of type `value_ty`
    #[allow(clippy::too_many_arguments)]
    pub fn atomicrmw(
        &mut self,
        op: RmwOperator,
        value_ty: Type,
        ptr: impl Into<Symbol>,
        value: impl Into<Symbol>,
        ordering: AtomicOrdering,
        scope: SynchronizationScope,
        volatile: bool,
    ) -> Reg {
        let dest = self.temp(value_ty);
        self.emit(Instruction::ReadModifyWrite {
            dest,
            op,
            ptr: ptr.into(),
            value: value.into(),
            ordering,
            scope,
            volatile,
        });
        dest
    }

    /// `fence`
    pub fn fence(&mut self, ordering: AtomicOrdering, scope: SynchronizationScope) {
        self.emit(Instruction::Fence { ordering, scope });
    }

    /// `getelementptr` producing a pointer of type `result_ty`
    pub fn gep(
        &mut self,
        result_ty: Type,
        base: impl Into<Symbol>,
        indices: Vec<Symbol>,
        inbounds: bool,
    ) -> Reg {
        let dest = self.temp(result_ty);
        self.emit(Instruction::GetElementPointer { dest, base: base.into(), indices, inbounds });
        dest
    }

    // ===== Arithmetic =====

    /// Binary operation on operands of type `ty`
    pub fn binary(
        &mut self,
        op: BinaryOperator,
        ty: Type,
        lhs: impl Into<Symbol>,
        rhs: impl Into<Symbol>,
    ) -> Reg {
        let dest = self.temp(ty.clone());
        self.emit(Instruction::BinaryOperation {
            dest,
            op,
            flags: vec![],
            ty,
            lhs: lhs.into(),
            rhs: rhs.into(),
        });
        dest
    }

    /// Comparison of operands of type `operand_ty`; vector operands yield a
    /// vector of i1
    pub fn compare(
        &mut self,
        op: CompareOperator,
        operand_ty: &Type,
        lhs: impl Into<Symbol>,
        rhs: impl Into<Symbol>,
    ) -> Reg {
        let result_ty = match operand_ty {
            Type::Vector { len, .. } => Type::vector(Type::I1, *len),
            _ => Type::I1,
        };
        let dest = self.temp(result_ty);
        self.emit(Instruction::Compare { dest, op, lhs: lhs.into(), rhs: rhs.into() });
        dest
    }

    /// Cast producing a value of type `to`
    pub fn cast(&mut self, op: CastOperator, value: impl Into<Symbol>, to: Type) -> Reg {
        let dest = self.temp(to.clone());
        self.emit(Instruction::Cast { dest, op, value: value.into(), to });
        dest
    }

    /// `select` between two values of type `ty`
    pub fn select(
        &mut self,
        ty: Type,
        condition: impl Into<Symbol>,
        on_true: impl Into<Symbol>,
        on_false: impl Into<Symbol>,
    ) -> Reg {
        let dest = self.temp(ty);
        self.emit(Instruction::Select {
            dest,
            condition: condition.into(),
            on_true: on_true.into(),
            on_false: on_false.into(),
        });
        dest
    }

    // ===== Aggregates and vectors =====

    /// `extractelement` producing a value of `elem_ty`
    pub fn extract_element(
        &mut self,
        elem_ty: Type,
        vector: impl Into<Symbol>,
        index: impl Into<Symbol>,
    ) -> Reg {
        let dest = self.temp(elem_ty);
        self.emit(Instruction::ExtractElement {
            dest,
            vector: vector.into(),
            index: index.into(),
        });
        dest
    }

    /// `insertelement` producing an updated vector of `vector_ty`
    pub fn insert_element(
        &mut self,
        vector_ty: Type,
        vector: impl Into<Symbol>,
        value: impl Into<Symbol>,
        index: impl Into<Symbol>,
    ) -> Reg {
        let dest = self.temp(vector_ty);
        self.emit(Instruction::InsertElement {
            dest,
            vector: vector.into(),
            value: value.into(),
            index: index.into(),
        });
        dest
    }

    /// `extractvalue` producing a value of `elem_ty`
    pub fn extract_value(&mut self, elem_ty: Type, aggregate: impl Into<Symbol>, index: u32) -> Reg {
        let dest = self.temp(elem_ty);
        self.emit(Instruction::ExtractValue { dest, aggregate: aggregate.into(), index });
        dest
    }

    /// `insertvalue` producing an updated aggregate of `aggregate_ty`
    pub fn insert_value(
        &mut self,
        aggregate_ty: Type,
        aggregate: impl Into<Symbol>,
        value: impl Into<Symbol>,
        index: u32,
    ) -> Reg {
        let dest = self.temp(aggregate_ty);
        self.emit(Instruction::InsertValue {
            dest,
            aggregate: aggregate.into(),
            value: value.into(),
            index,
        });
        dest
    }

    /// `shufflevector` producing a vector of `result_ty`
    pub fn shuffle_vector(
        &mut self,
        result_ty: Type,
        vector1: impl Into<Symbol>,
        vector2: impl Into<Symbol>,
        mask: impl Into<Symbol>,
    ) -> Reg {
        let dest = self.temp(result_ty);
        self.emit(Instruction::ShuffleVector {
            dest,
            vector1: vector1.into(),
            vector2: vector2.into(),
            mask: mask.into(),
        });
        dest
    }

    // ===== Calls =====

    /// Value-producing `call`
    pub fn call(&mut self, return_type: Type, target: impl Into<Symbol>, args: Vec<Symbol>) -> Reg {
        let dest = self.temp(return_type.clone());
        self.emit(Instruction::Call { dest, return_type, target: target.into(), args });
        dest
    }

    /// `call` whose result is discarded
    pub fn void_call(&mut self, target: impl Into<Symbol>, args: Vec<Symbol>) {
        self.emit(Instruction::VoidCall {
            return_type: Type::Void,
            target: target.into(),
            args,
        });
    }

    /// Value-producing `invoke`
    pub fn invoke(
        &mut self,
        return_type: Type,
        target: impl Into<Symbol>,
        args: Vec<Symbol>,
        normal: BlockId,
        unwind: BlockId,
    ) -> Reg {
        let dest = self.temp(return_type.clone());
        self.emit(Instruction::Invoke {
            dest,
            return_type,
            target: target.into(),
            args,
            normal,
            unwind,
        });
        dest
    }

    /// `invoke` whose result is discarded
    pub fn void_invoke(
        &mut self,
        target: impl Into<Symbol>,
        args: Vec<Symbol>,
        normal: BlockId,
        unwind: BlockId,
    ) {
        self.emit(Instruction::VoidInvoke {
            return_type: Type::Void,
            target: target.into(),
            args,
            normal,
            unwind,
        });
    }

    // ===== Exception handling =====

    /// `landingpad` with an optional cleanup marker
    pub fn landingpad(&mut self, ty: Type, cleanup: bool) -> Reg {
        let dest = self.temp(ty.clone());
        self.emit(Instruction::LandingPad { dest, ty, cleanup, clauses: vec![] });
        dest
    }

    /// `resume`
    pub fn resume(&mut self, value: impl Into<Symbol>) {
        self.emit(Instruction::Resume { value: value.into() });
    }

    // ===== Control flow =====

    /// `phi` over the given incoming edges
    pub fn phi(&mut self, ty: Type, incoming: Vec<(Symbol, BlockId)>) -> Reg {
        let dest = self.temp(ty.clone());
        self.emit(Instruction::Phi { dest, ty, incoming });
        dest
    }

    /// Unconditional branch
    pub fn branch(&mut self, target: BlockId) {
        self.emit(Instruction::Branch { target });
    }

    /// Conditional branch
    pub fn cond_branch(&mut self, condition: impl Into<Symbol>, on_true: BlockId, on_false: BlockId) {
        self.emit(Instruction::ConditionalBranch {
            condition: condition.into(),
            on_true,
            on_false,
        });
    }

    /// `indirectbr` over the given successor set
    pub fn indirect_branch(&mut self, address: impl Into<Symbol>, successors: Vec<BlockId>) {
        self.emit(Instruction::IndirectBranch { address: address.into(), successors });
    }

    /// `switch`
    pub fn switch(
        &mut self,
        condition: impl Into<Symbol>,
        default: BlockId,
        cases: Vec<SwitchCase>,
    ) {
        self.emit(Instruction::Switch { condition: condition.into(), default, cases });
    }

    /// `ret` with a value
    pub fn ret(&mut self, value: impl Into<Symbol>) {
        self.emit(Instruction::Return { value: Some(value.into()) });
    }

    /// `ret void`
    pub fn ret_void(&mut self) {
        self.emit(Instruction::Return { value: None });
    }

    /// `unreachable`
    pub fn unreachable(&mut self) {
        self.emit(Instruction::Unreachable);
    }

    /// Access the function under construction
    pub fn func(&self) -> &Function {
        self.func
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_sig() -> FunctionType {
        FunctionType::new(Type::Void, vec![], false)
    }

    #[test]
    fn entry_block_is_created_lazily() {
        let mut builder = ModuleBuilder::new();
        let id = builder.define_function("f", empty_sig(), &[]);
        {
            let mut fb = builder.function_builder(id);
            assert_eq!(fb.current_block(), BlockId(0));
            fb.ret_void();
        }
        let module = builder.build();
        assert_eq!(module.function(id).blocks.len(), 1);
        assert!(!module.function(id).is_declaration());
    }

    #[test]
    fn temporaries_avoid_parameter_names() {
        let mut builder = ModuleBuilder::new();
        let sig = FunctionType::new(Type::I32, vec![Type::I32], false);
        let id = builder.define_function("f", sig, &["t0"]);
        let mut fb = builder.function_builder(id);
        let reg = fb.allocate(Type::I32);
        assert_eq!(fb.func().register(reg).name, "t1");
    }

    #[test]
    fn declarations_have_no_blocks() {
        let mut builder = ModuleBuilder::new();
        let sig = FunctionType::new(Type::I32, vec![Type::pointer(Type::I8)], true);
        let id = builder.declare_function("printf", sig);
        assert!(builder.module().function(id).is_declaration());
    }

    #[test]
    fn compare_on_vectors_yields_a_bool_vector() {
        let mut builder = ModuleBuilder::new();
        let id = builder.define_function("f", empty_sig(), &[]);
        let mut fb = builder.function_builder(id);
        let vec_ty = Type::vector(Type::I32, 2);
        let v = fb.allocate(vec_ty.clone());
        let loaded = fb.load(vec_ty.clone(), v);
        let cmp = fb.compare(CompareOperator::Eq, &vec_ty, loaded, loaded);
        assert_eq!(fb.func().register(cmp).ty, Type::vector(Type::I1, 2));
    }
}
