//! Golden tests for branches, phi nodes, and the two switch encodings

use indoc::indoc;
use pretty_assertions::assert_eq;

use quill_ir::{
    CompareOperator, Constant, FunctionType, Module, ModuleBuilder, ParamId, SwitchCase, Symbol,
    Type,
};
use quill_writer::{write_module, Dialect, WriteError};

fn emit(module: &Module) -> String {
    write_module(module, Dialect::default()).unwrap()
}

#[test]
fn branches_and_phi() {
    let mut builder = ModuleBuilder::new();
    let sig = FunctionType::new(Type::I32, vec![Type::I32, Type::I32], false);
    let max = builder.define_function("max", sig, &["a", "b"]);
    {
        let mut fb = builder.function_builder(max);
        let bigger = fb.create_named_block("bigger");
        let smaller = fb.create_named_block("smaller");
        let join = fb.create_named_block("join");

        let cond = fb.compare(CompareOperator::SGt, &Type::I32, ParamId(0), ParamId(1));
        fb.cond_branch(cond, bigger, smaller);
        fb.switch_to_block(bigger);
        fb.branch(join);
        fb.switch_to_block(smaller);
        fb.branch(join);
        fb.switch_to_block(join);
        let result = fb.phi(
            Type::I32,
            vec![(ParamId(0).into(), bigger), (ParamId(1).into(), smaller)],
        );
        fb.ret(result);
    }

    assert_eq!(
        emit(&builder.build()),
        indoc! {"
            define i32 @max(i32 %a, i32 %b) {
              %t0 = icmp sgt i32 %a, %b
              br i1 %t0, label %bigger, label %smaller
            bigger:
              br label %join
            smaller:
              br label %join
            join:
              %t1 = phi i32 [ %a, %bigger ], [ %b, %smaller ]
              ret i32 %t1
            }
        "}
    );
}

fn switch_module(case_value: Constant) -> Module {
    let mut builder = ModuleBuilder::new();
    let f = builder.define_function(
        "dispatch",
        FunctionType::new(Type::Void, vec![Type::I32], false),
        &["x"],
    );
    {
        let mut fb = builder.function_builder(f);
        let fallback = fb.create_named_block("fallback");
        let one = fb.create_named_block("one");
        let two = fb.create_named_block("two");
        fb.switch(
            ParamId(0),
            fallback,
            vec![
                SwitchCase { value: Constant::i32(1).into(), target: one },
                SwitchCase { value: case_value.into(), target: two },
            ],
        );
        for block in [fallback, one, two] {
            fb.switch_to_block(block);
            fb.ret_void();
        }
    }
    builder.build()
}

#[test]
fn switch_cases_carry_their_own_types() {
    assert_eq!(
        emit(&switch_module(Constant::i64(200))),
        indoc! {"
            define void @dispatch(i32 %x) {
              switch i32 %x, label %fallback [ i32 1, label %one
                      i64 200, label %two ]
            fallback:
              ret void
            one:
              ret void
            two:
              ret void
            }
        "}
    );
}

#[test]
fn legacy_switch_cases_repeat_the_condition_type() {
    assert_eq!(
        write_module(&switch_module(Constant::i64(200)), Dialect::Llvm32).unwrap(),
        indoc! {"
            define void @dispatch(i32 %x) {
              switch i32 %x, label %fallback [ i32 1, label %one
                      i32 200, label %two ]
            fallback:
              ret void
            one:
              ret void
            two:
              ret void
            }
        "}
    );
}

#[test]
fn legacy_switch_rejects_non_constant_cases() {
    let mut builder = ModuleBuilder::new();
    let f = builder.define_function(
        "dispatch",
        FunctionType::new(Type::Void, vec![Type::I32], false),
        &["x"],
    );
    {
        let mut fb = builder.function_builder(f);
        let fallback = fb.create_named_block("fallback");
        fb.switch(
            ParamId(0),
            fallback,
            vec![SwitchCase { value: Symbol::Parameter(ParamId(0)), target: fallback }],
        );
        fb.switch_to_block(fallback);
        fb.ret_void();
    }

    let err = write_module(&builder.build(), Dialect::Llvm32).unwrap_err();
    assert!(matches!(err, WriteError::UnexpectedShape { instruction: "switch", .. }));
}

#[test]
fn indirect_branches() {
    let mut builder = ModuleBuilder::new();
    let f = builder.define_function(
        "f",
        FunctionType::new(Type::Void, vec![Type::pointer(Type::I8)], false),
        &["addr"],
    );
    {
        let mut fb = builder.function_builder(f);
        let first = fb.create_named_block("first");
        let second = fb.create_named_block("second");
        fb.indirect_branch(ParamId(0), vec![first, second]);
        fb.switch_to_block(first);
        fb.ret_void();
        fb.switch_to_block(second);
        fb.ret_void();
    }

    assert_eq!(
        emit(&builder.build()),
        indoc! {"
            define void @f(i8* %addr) {
              indirectbr i8* %addr, [ label %first, label %second ]
            first:
              ret void
            second:
              ret void
            }
        "}
    );
}

#[test]
fn indirect_branch_with_no_successors() {
    let mut builder = ModuleBuilder::new();
    let f = builder.define_function(
        "f",
        FunctionType::new(Type::Void, vec![Type::pointer(Type::I8)], false),
        &["addr"],
    );
    builder.function_builder(f).indirect_branch(ParamId(0), vec![]);

    assert_eq!(
        emit(&builder.build()),
        indoc! {"
            define void @f(i8* %addr) {
              indirectbr i8* %addr, [  ]
            }
        "}
    );
}

#[test]
fn unlabeled_blocks_get_synthesized_labels() {
    let mut builder = ModuleBuilder::new();
    let f = builder.define_function("f", FunctionType::new(Type::Void, vec![], false), &[]);
    {
        let mut fb = builder.function_builder(f);
        let next = fb.create_block();
        fb.branch(next);
        fb.switch_to_block(next);
        fb.unreachable();
    }

    assert_eq!(
        emit(&builder.build()),
        indoc! {"
            define void @f() {
              br label %b1
            b1:
              unreachable
            }
        "}
    );
}
