//! Call-target signature resolution
//!
//! The encoding of a call depends on the callee's function type, which is
//! not stored on the call itself. It is recovered from the target symbol by
//! case analysis: direct function references carry their type, everything
//! else is a pointer (or chain of pointers) whose pointee must turn out to
//! be a function type.

use quill_ir::{FunctionType, Instruction, Symbol, Type};

use crate::error::{WriteError, WriteResult};
use crate::text::Cx;

/// Resolve the signature a call target is invoked with.
///
/// Call results are unwrapped by exactly one pointer level; parameters,
/// load results, and other registers are unwrapped through every pointer
/// level. A target that does not bottom out at a function type is fatal.
pub(crate) fn callee_function_type(cx: &Cx<'_>, target: &Symbol) -> WriteResult<FunctionType> {
    match target {
        Symbol::Function(id) => Ok(cx.module.function(*id).ty.clone()),
        Symbol::Parameter(param) => strip_all(cx, target, cx.func.param(*param).ty.clone()),
        Symbol::Register(reg) => match cx.defining_instruction(*reg) {
            Some(Instruction::Call { .. }) => strip_one(cx, target, cx.func.register(*reg).ty.clone()),
            Some(Instruction::Load { source, .. }) => strip_all(cx, target, cx.symbol_type(source)),
            _ => strip_all(cx, target, cx.func.register(*reg).ty.clone()),
        },
        Symbol::Constant(constant) => strip_one(cx, target, constant.ty().clone()),
    }
}

/// Unwrap exactly one pointer level and require a function type underneath
fn strip_one(cx: &Cx<'_>, target: &Symbol, ty: Type) -> WriteResult<FunctionType> {
    match ty.pointee() {
        Some(Type::Function(func)) => Ok(func.clone()),
        _ => Err(unresolved(cx, target)),
    }
}

/// Unwrap every pointer level and require a function type underneath
fn strip_all(cx: &Cx<'_>, target: &Symbol, ty: Type) -> WriteResult<FunctionType> {
    let mut ty = &ty;
    while let Some(pointee) = ty.pointee() {
        ty = pointee;
    }
    match ty {
        Type::Function(func) => Ok(func.clone()),
        _ => Err(unresolved(cx, target)),
    }
}

fn unresolved(cx: &Cx<'_>, target: &Symbol) -> WriteError {
    WriteError::UnresolvedCallTarget { target: cx.value_text(target) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use quill_ir::{Constant, ModuleBuilder};

    fn callee_sig() -> FunctionType {
        FunctionType::new(Type::I32, vec![Type::I32], false)
    }

    #[test]
    fn direct_function_reference() {
        let mut builder = ModuleBuilder::new();
        let callee = builder.declare_function("callee", callee_sig());
        let caller =
            builder.define_function("caller", FunctionType::new(Type::Void, vec![], false), &[]);
        let module = builder.build();
        let cx = Cx::new(&module, module.function(caller), Dialect::default());
        assert_eq!(
            callee_function_type(&cx, &Symbol::Function(callee)).unwrap(),
            callee_sig()
        );
    }

    #[test]
    fn parameter_targets_unwrap_every_pointer_level() {
        let fnptr = Type::pointer(Type::pointer(Type::Function(callee_sig())));
        let mut builder = ModuleBuilder::new();
        let caller = builder.define_function(
            "caller",
            FunctionType::new(Type::Void, vec![fnptr], false),
            &["callee"],
        );
        builder.function_builder(caller).ret_void();
        let module = builder.build();
        let cx = Cx::new(&module, module.function(caller), Dialect::default());
        assert_eq!(
            callee_function_type(&cx, &quill_ir::ParamId(0).into()).unwrap(),
            callee_sig()
        );
    }

    #[test]
    fn load_results_resolve_via_the_loaded_location() {
        let fnptr = Type::pointer(Type::Function(callee_sig()));
        let mut builder = ModuleBuilder::new();
        let caller =
            builder.define_function("caller", FunctionType::new(Type::Void, vec![], false), &[]);
        let target;
        {
            let mut fb = builder.function_builder(caller);
            let slot = fb.allocate(fnptr.clone());
            target = fb.load(fnptr, slot);
            fb.ret_void();
        }
        let module = builder.build();
        let cx = Cx::new(&module, module.function(caller), Dialect::default());
        assert_eq!(
            callee_function_type(&cx, &target.into()).unwrap(),
            callee_sig()
        );
    }

    #[test]
    fn call_results_unwrap_exactly_one_pointer_level() {
        let handler_ptr = Type::pointer(Type::Function(callee_sig()));
        let deep_ptr = Type::pointer(handler_ptr.clone());

        let mut builder = ModuleBuilder::new();
        let get = builder
            .declare_function("get", FunctionType::new(handler_ptr.clone(), vec![], false));
        let get_deep = builder
            .declare_function("get_deep", FunctionType::new(deep_ptr.clone(), vec![], false));
        let caller =
            builder.define_function("caller", FunctionType::new(Type::Void, vec![], false), &[]);
        let target;
        let deep_target;
        {
            let mut fb = builder.function_builder(caller);
            target = fb.call(handler_ptr, get, vec![]);
            deep_target = fb.call(deep_ptr, get_deep, vec![]);
            fb.ret_void();
        }
        let module = builder.build();
        let cx = Cx::new(&module, module.function(caller), Dialect::default());

        assert_eq!(
            callee_function_type(&cx, &target.into()).unwrap(),
            callee_sig()
        );
        // a second pointer level is not unwrapped for call results
        assert!(matches!(
            callee_function_type(&cx, &deep_target.into()),
            Err(WriteError::UnresolvedCallTarget { .. })
        ));
    }

    #[test]
    fn non_function_targets_are_fatal() {
        let mut builder = ModuleBuilder::new();
        let caller =
            builder.define_function("caller", FunctionType::new(Type::Void, vec![], false), &[]);
        builder.function_builder(caller).ret_void();
        let module = builder.build();
        let cx = Cx::new(&module, module.function(caller), Dialect::default());
        let err = callee_function_type(&cx, &Constant::i32(0).into()).unwrap_err();
        assert!(matches!(err, WriteError::UnresolvedCallTarget { .. }));
    }
}
