//! Golden tests for call and invoke encoding, including explicit callee
//! signatures and formal/actual type annotations

use indoc::indoc;
use pretty_assertions::assert_eq;

use quill_ir::{Constant, FunctionType, Module, ModuleBuilder, ParamId, Type};
use quill_writer::{write_module, Dialect, WriteError};

fn emit(module: &Module) -> String {
    write_module(module, Dialect::default()).unwrap()
}

#[test]
fn plain_calls_need_no_signature() {
    let mut builder = ModuleBuilder::new();
    let callee =
        builder.declare_function("abs", FunctionType::new(Type::I32, vec![Type::I32], false));
    let f = builder.define_function("f", FunctionType::new(Type::I32, vec![], false), &[]);
    {
        let mut fb = builder.function_builder(f);
        let result = fb.call(Type::I32, callee, vec![Constant::i32(-3).into()]);
        fb.ret(result);
    }

    assert_eq!(
        emit(&builder.build()),
        indoc! {"
            declare i32 @abs(i32)

            define i32 @f() {
              %t0 = call i32 @abs(i32 -3)
              ret i32 %t0
            }
        "}
    );
}

#[test]
fn varargs_callees_get_an_explicit_signature() {
    let mut builder = ModuleBuilder::new();
    let printf = builder.declare_function(
        "printf",
        FunctionType::new(Type::I32, vec![Type::pointer(Type::I8)], true),
    );
    let f = builder.define_function(
        "f",
        FunctionType::new(Type::Void, vec![Type::pointer(Type::I8)], false),
        &["msg"],
    );
    {
        let mut fb = builder.function_builder(f);
        fb.call(Type::I32, printf, vec![ParamId(0).into(), Constant::i32(7).into()]);
        fb.ret_void();
    }

    assert_eq!(
        emit(&builder.build()),
        indoc! {"
            declare i32 @printf(i8*, ...)

            define void @f(i8* %msg) {
              %t0 = call i32 (i8*, ...)* @printf(i8* %msg, i32 7)
              ret void
            }
        "}
    );
}

#[test]
fn function_pointer_returns_force_an_explicit_signature() {
    let handler = FunctionType::new(Type::Void, vec![], false);
    let handler_ptr = Type::pointer(Type::Function(handler));

    let mut builder = ModuleBuilder::new();
    let get = builder.declare_function(
        "get_handler",
        FunctionType::new(handler_ptr.clone(), vec![], false),
    );
    let f = builder.define_function("f", FunctionType::new(Type::Void, vec![], false), &[]);
    {
        let mut fb = builder.function_builder(f);
        fb.call(handler_ptr, get, vec![]);
        fb.ret_void();
    }

    assert_eq!(
        emit(&builder.build()),
        indoc! {"
            declare void ()* @get_handler()

            define void @f() {
              %t0 = call void ()* ()* @get_handler()
              ret void
            }
        "}
    );
}

#[test]
fn mismatched_actuals_are_annotated_with_the_formal() {
    let mut builder = ModuleBuilder::new();
    let sink = builder.declare_function(
        "sink",
        FunctionType::new(Type::Void, vec![Type::pointer(Type::I8)], false),
    );
    let f = builder.define_function(
        "f",
        FunctionType::new(Type::Void, vec![Type::pointer(Type::I32)], false),
        &["p"],
    );
    {
        let mut fb = builder.function_builder(f);
        fb.void_call(sink, vec![ParamId(0).into()]);
        fb.ret_void();
    }

    assert_eq!(
        emit(&builder.build()),
        indoc! {"
            declare void @sink(i8*)

            define void @f(i32* %p) {
              call void @sink(i8* i32* %p)
              ret void
            }
        "}
    );
}

#[test]
fn invoke_arguments_are_never_annotated() {
    let mut builder = ModuleBuilder::new();
    let sink = builder.declare_function(
        "sink",
        FunctionType::new(Type::Void, vec![Type::pointer(Type::I8)], false),
    );
    let f = builder.define_function(
        "f",
        FunctionType::new(Type::Void, vec![Type::pointer(Type::I32)], false),
        &["p"],
    );
    {
        let mut fb = builder.function_builder(f);
        let cont = fb.create_named_block("cont");
        let catch = fb.create_named_block("catch");
        fb.void_invoke(sink, vec![ParamId(0).into()], cont, catch);
        fb.switch_to_block(cont);
        fb.ret_void();
        fb.switch_to_block(catch);
        let pad = fb.landingpad(Type::structure(vec![Type::pointer(Type::I8), Type::I32]), true);
        fb.resume(pad);
    }

    assert_eq!(
        emit(&builder.build()),
        indoc! {"
            declare void @sink(i8*)

            define void @f(i32* %p) {
              invoke void @sink(i32* %p)
                      to label %cont unwind label %catch
            cont:
              ret void
            catch:
              %t0 = landingpad { i8*, i32 }
                      cleanup
              resume { i8*, i32 } %t0
            }
        "}
    );
}

#[test]
fn indirect_calls_resolve_through_the_loaded_slot() {
    let handler = FunctionType::new(Type::Void, vec![], false);
    let handler_ptr = Type::pointer(Type::Function(handler));

    let mut builder = ModuleBuilder::new();
    let f = builder.define_function(
        "f",
        FunctionType::new(Type::Void, vec![Type::pointer(handler_ptr.clone())], false),
        &["slot"],
    );
    {
        let mut fb = builder.function_builder(f);
        let target = fb.load(handler_ptr, ParamId(0));
        fb.void_call(target, vec![]);
        fb.ret_void();
    }

    assert_eq!(
        emit(&builder.build()),
        indoc! {"
            define void @f(void ()** %slot) {
              %t0 = load void ()** %slot
              call void %t0()
              ret void
            }
        "}
    );
}

#[test]
fn unresolvable_targets_are_fatal() {
    let mut builder = ModuleBuilder::new();
    let f = builder.define_function("f", FunctionType::new(Type::Void, vec![], false), &[]);
    {
        let mut fb = builder.function_builder(f);
        fb.void_call(Constant::i32(3), vec![]);
        fb.ret_void();
    }

    let err = write_module(&builder.build(), Dialect::default()).unwrap_err();
    match err {
        WriteError::UnresolvedCallTarget { target } => assert_eq!(target, "3"),
        other => panic!("unexpected error: {other}"),
    }
}
