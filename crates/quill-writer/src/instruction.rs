//! Instruction encoders
//!
//! One encoder per instruction form, each producing the exact byte sequence
//! of the textual grammar. Alignments are stored as exponents, so the
//! printed value is `1 << (align - 1)` and an exponent of zero means the
//! clause is omitted.

use std::fmt::Write;

use quill_ir::{
    AtomicOrdering, Atomicity, BinaryOperator, BlockId, CastOperator, CompareOperator, Constant,
    FunctionType, Instruction, LandingPadClause, OperationFlag, Reg, RmwOperator, SwitchCase,
    Symbol, SynchronizationScope, Type,
};

use crate::error::{WriteError, WriteResult};
use crate::resolver;
use crate::text::Cx;

const INDENT: &str = "  ";
const DEEP_INDENT: &str = "        ";

fn write_indent(out: &mut impl Write) -> WriteResult<()> {
    write!(out, "{INDENT}")?;
    Ok(())
}

fn write_deep_indent(out: &mut impl Write) -> WriteResult<()> {
    write!(out, "{INDENT}{DEEP_INDENT}")?;
    Ok(())
}

fn alignment_in_bytes(align: u32) -> WriteResult<u64> {
    // the exponent must fit a u64 shift; anything larger is not a real
    // alignment
    if align > 64 {
        return Err(WriteError::Unsupported {
            construct: format!("alignment exponent {align}"),
        });
    }
    Ok(1u64 << (align - 1))
}

fn dest_name<'a>(cx: &Cx<'a>, reg: Reg) -> &'a str {
    &cx.func.register(reg).name
}

/// Encode one instruction, including its trailing newline
pub(crate) fn write_instruction(
    cx: &Cx<'_>,
    out: &mut impl Write,
    instr: &Instruction,
) -> WriteResult<()> {
    match instr {
        Instruction::Allocate { dest, pointee, count, align } => {
            write_allocate(cx, out, *dest, pointee, count, *align)
        }
        Instruction::Load { dest, source, align, atomicity } => {
            write_load(cx, out, *dest, source, *align, atomicity)
        }
        Instruction::Store { value, destination, align, atomicity } => {
            write_store(cx, out, value, destination, *align, atomicity)
        }
        Instruction::CompareExchange {
            dest,
            ptr,
            expected,
            replacement,
            ordering,
            scope,
            volatile,
        } => write_cmpxchg(cx, out, *dest, ptr, expected, replacement, *ordering, *scope, *volatile),
        Instruction::ReadModifyWrite { dest, op, ptr, value, ordering, scope, volatile } => {
            write_atomicrmw(cx, out, *dest, *op, ptr, value, *ordering, *scope, *volatile)
        }
        Instruction::Fence { ordering, scope } => write_fence(out, *ordering, *scope),
        Instruction::GetElementPointer { dest, base, indices, inbounds } => {
            write_gep(cx, out, *dest, base, indices, *inbounds)
        }
        Instruction::BinaryOperation { dest, op, flags, ty, lhs, rhs } => {
            write_binary(cx, out, *dest, *op, flags, ty, lhs, rhs)
        }
        Instruction::Compare { dest, op, lhs, rhs } => write_compare(cx, out, *dest, *op, lhs, rhs),
        Instruction::Cast { dest, op, value, to } => write_cast(cx, out, *dest, *op, value, to),
        Instruction::Select { dest, condition, on_true, on_false } => {
            write_select(cx, out, *dest, condition, on_true, on_false)
        }
        Instruction::ExtractElement { dest, vector, index } => {
            write_extract_element(cx, out, *dest, vector, index)
        }
        Instruction::InsertElement { dest, vector, value, index } => {
            write_insert_element(cx, out, *dest, vector, value, index)
        }
        Instruction::ExtractValue { dest, aggregate, index } => {
            write_extract_value(cx, out, *dest, aggregate, *index)
        }
        Instruction::InsertValue { dest, aggregate, value, index } => {
            write_insert_value(cx, out, *dest, aggregate, value, *index)
        }
        Instruction::ShuffleVector { dest, vector1, vector2, mask } => {
            write_shuffle_vector(cx, out, *dest, vector1, vector2, mask)
        }
        Instruction::Call { dest, return_type, target, args } => {
            write_indent(out)?;
            write!(out, "%{} = call ", dest_name(cx, *dest))?;
            write_callee_and_args(cx, out, return_type, target, args, true)?;
            writeln!(out)?;
            Ok(())
        }
        Instruction::VoidCall { return_type, target, args } => {
            write_indent(out)?;
            write!(out, "call ")?;
            write_callee_and_args(cx, out, return_type, target, args, true)?;
            writeln!(out)?;
            Ok(())
        }
        Instruction::Invoke { dest, return_type, target, args, normal, unwind } => {
            write_indent(out)?;
            write!(out, "%{} = invoke ", dest_name(cx, *dest))?;
            write_callee_and_args(cx, out, return_type, target, args, false)?;
            write_invoke_tail(cx, out, *normal, *unwind)
        }
        Instruction::VoidInvoke { return_type, target, args, normal, unwind } => {
            write_indent(out)?;
            write!(out, "invoke ")?;
            write_callee_and_args(cx, out, return_type, target, args, false)?;
            write_invoke_tail(cx, out, *normal, *unwind)
        }
        Instruction::LandingPad { dest, ty, cleanup, clauses } => {
            write_landingpad(cx, out, *dest, ty, *cleanup, clauses)
        }
        Instruction::Resume { value } => {
            write_indent(out)?;
            write!(out, "resume ")?;
            cx.write_typed_value(out, value)?;
            writeln!(out)?;
            Ok(())
        }
        Instruction::Phi { dest, ty, incoming } => write_phi(cx, out, *dest, ty, incoming),
        Instruction::Branch { target } => {
            write_indent(out)?;
            write!(out, "br label ")?;
            cx.write_block_ref(out, *target)?;
            writeln!(out)?;
            Ok(())
        }
        Instruction::ConditionalBranch { condition, on_true, on_false } => {
            write_indent(out)?;
            write!(out, "br ")?;
            cx.write_typed_value(out, condition)?;
            write!(out, ", label ")?;
            cx.write_block_ref(out, *on_true)?;
            write!(out, ", label ")?;
            cx.write_block_ref(out, *on_false)?;
            writeln!(out)?;
            Ok(())
        }
        Instruction::IndirectBranch { address, successors } => {
            write_indirect_branch(cx, out, address, successors)
        }
        Instruction::Switch { condition, default, cases } => {
            write_switch(cx, out, condition, *default, cases)
        }
        Instruction::Return { value } => {
            write_indent(out)?;
            match value {
                None => write!(out, "ret void")?,
                Some(value) => {
                    write!(out, "ret ")?;
                    cx.write_typed_value(out, value)?;
                }
            }
            writeln!(out)?;
            Ok(())
        }
        Instruction::Unreachable => {
            write_indent(out)?;
            writeln!(out, "unreachable")?;
            Ok(())
        }
    }
}

// ===== Memory =====

fn write_allocate(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    pointee: &Type,
    count: &Symbol,
    align: u32,
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = alloca {pointee}", dest_name(cx, dest))?;

    // an element count of exactly 1 is left implicit
    let is_one = matches!(count, Symbol::Constant(constant) if constant.is_integer_one());
    if !is_one {
        write!(out, ", ")?;
        cx.write_typed_value(out, count)?;
    }

    if align != 0 {
        write!(out, ", align {}", alignment_in_bytes(align)?)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_load(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    source: &Symbol,
    align: u32,
    atomicity: &Atomicity,
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = load", dest_name(cx, dest))?;
    if atomicity.ordering.is_atomic() {
        write!(out, " atomic")?;
    }
    if atomicity.volatile {
        write!(out, " volatile")?;
    }
    write!(out, " ")?;
    cx.write_typed_value(out, source)?;
    if atomicity.ordering.is_atomic() {
        if atomicity.scope == SynchronizationScope::SingleThread {
            write!(out, " singlethread")?;
        }
        write!(out, " {}", atomicity.ordering.ir_string())?;
    }
    if align != 0 {
        write!(out, ", align {}", alignment_in_bytes(align)?)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_store(
    cx: &Cx<'_>,
    out: &mut impl Write,
    value: &Symbol,
    destination: &Symbol,
    align: u32,
    atomicity: &Atomicity,
) -> WriteResult<()> {
    // the value's printed type comes from the destination pointer, not from
    // the value symbol
    let dest_ty = cx.symbol_type(destination);
    let value_ty = dest_ty.pointee().ok_or_else(|| WriteError::UnexpectedShape {
        instruction: "store",
        what: format!("destination of type {dest_ty} is not a pointer"),
    })?;

    write_indent(out)?;
    write!(out, "store ")?;
    if atomicity.ordering.is_atomic() {
        write!(out, "atomic ")?;
    }
    if atomicity.volatile {
        write!(out, "volatile ")?;
    }
    write!(out, "{value_ty} ")?;
    cx.write_value(out, value)?;
    write!(out, ", {dest_ty} ")?;
    cx.write_value(out, destination)?;
    if atomicity.ordering.is_atomic() {
        if atomicity.scope == SynchronizationScope::SingleThread {
            write!(out, " singlethread")?;
        }
        write!(out, " {}", atomicity.ordering.ir_string())?;
    }
    if align != 0 {
        write!(out, ", align {}", alignment_in_bytes(align)?)?;
    }
    writeln!(out)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_cmpxchg(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    ptr: &Symbol,
    expected: &Symbol,
    replacement: &Symbol,
    ordering: AtomicOrdering,
    scope: SynchronizationScope,
    volatile: bool,
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = cmpxchg", dest_name(cx, dest))?;
    if volatile {
        write!(out, " volatile")?;
    }
    write!(out, " ")?;
    cx.write_typed_value(out, ptr)?;
    write!(out, ", ")?;
    cx.write_typed_value(out, expected)?;
    write!(out, ", ")?;
    cx.write_typed_value(out, replacement)?;
    if scope == SynchronizationScope::SingleThread {
        write!(out, " singlethread")?;
    }
    write!(out, " {}", ordering.ir_string())?;
    writeln!(out)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_atomicrmw(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    op: RmwOperator,
    ptr: &Symbol,
    value: &Symbol,
    ordering: AtomicOrdering,
    scope: SynchronizationScope,
    volatile: bool,
) -> WriteResult<()> {
    if scope == SynchronizationScope::SingleThread {
        return Err(WriteError::Unsupported {
            construct: "single-thread atomicrmw".to_string(),
        });
    }
    write_indent(out)?;
    write!(out, "%{} = atomicrmw ", dest_name(cx, dest))?;
    if volatile {
        write!(out, "volatile ")?;
    }
    write!(out, "{} ", op.ir_string())?;
    cx.write_typed_value(out, ptr)?;
    write!(out, ", ")?;
    cx.write_typed_value(out, value)?;
    write!(out, " {}", ordering.ir_string())?;
    writeln!(out)?;
    Ok(())
}

fn write_fence(
    out: &mut impl Write,
    ordering: AtomicOrdering,
    scope: SynchronizationScope,
) -> WriteResult<()> {
    if scope == SynchronizationScope::SingleThread {
        return Err(WriteError::Unsupported { construct: "single-thread fence".to_string() });
    }
    write_indent(out)?;
    writeln!(out, "fence {}", ordering.ir_string())?;
    Ok(())
}

fn write_gep(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    base: &Symbol,
    indices: &[Symbol],
    inbounds: bool,
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = getelementptr ", dest_name(cx, dest))?;
    if inbounds {
        write!(out, "inbounds ")?;
    }
    cx.write_typed_value(out, base)?;
    for index in indices {
        write!(out, ", ")?;
        cx.write_typed_value(out, index)?;
    }
    writeln!(out)?;
    Ok(())
}

// ===== Arithmetic =====

#[allow(clippy::too_many_arguments)]
fn write_binary(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    op: BinaryOperator,
    flags: &[OperationFlag],
    ty: &Type,
    lhs: &Symbol,
    rhs: &Symbol,
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = {} ", dest_name(cx, dest), op.ir_string())?;
    for flag in flags {
        write!(out, "{} ", flag.ir_string())?;
    }
    write!(out, "{ty} ")?;
    cx.write_value(out, lhs)?;
    write!(out, ", ")?;
    cx.write_value(out, rhs)?;
    writeln!(out)?;
    Ok(())
}

fn write_compare(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    op: CompareOperator,
    lhs: &Symbol,
    rhs: &Symbol,
) -> WriteResult<()> {
    let mnemonic = if op.is_floating_point() { "fcmp" } else { "icmp" };
    write_indent(out)?;
    write!(out, "%{} = {mnemonic} {} ", dest_name(cx, dest), op.ir_string())?;
    cx.write_typed_value(out, lhs)?;
    write!(out, ", ")?;
    cx.write_value(out, rhs)?;
    writeln!(out)?;
    Ok(())
}

fn write_cast(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    op: CastOperator,
    value: &Symbol,
    to: &Type,
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = {} ", dest_name(cx, dest), op.ir_string())?;
    cx.write_typed_value(out, value)?;
    write!(out, " to {to}")?;
    writeln!(out)?;
    Ok(())
}

fn write_select(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    condition: &Symbol,
    on_true: &Symbol,
    on_false: &Symbol,
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = select ", dest_name(cx, dest))?;
    cx.write_typed_value(out, condition)?;
    write!(out, ", ")?;
    cx.write_typed_value(out, on_true)?;
    write!(out, ", ")?;
    cx.write_typed_value(out, on_false)?;
    writeln!(out)?;
    Ok(())
}

// ===== Aggregates and vectors =====

fn write_extract_element(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    vector: &Symbol,
    index: &Symbol,
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = extractelement ", dest_name(cx, dest))?;
    cx.write_typed_value(out, vector)?;
    write!(out, ", ")?;
    cx.write_typed_value(out, index)?;
    writeln!(out)?;
    Ok(())
}

fn write_insert_element(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    vector: &Symbol,
    value: &Symbol,
    index: &Symbol,
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = insertelement ", dest_name(cx, dest))?;
    cx.write_typed_value(out, vector)?;
    write!(out, ", ")?;
    cx.write_typed_value(out, value)?;
    write!(out, ", ")?;
    cx.write_typed_value(out, index)?;
    writeln!(out)?;
    Ok(())
}

fn write_extract_value(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    aggregate: &Symbol,
    index: u32,
) -> WriteResult<()> {
    write_indent(out)?;

    // An extractvalue whose aggregate is a cmpxchg result is not valid in
    // this grammar. It is rewritten as a spill through a fresh stack slot,
    // with the original instruction kept as a trailing comment.
    if is_cmpxchg_result(cx, aggregate) {
        write_spill_assignment(cx, out, dest, aggregate)?;
        write!(out, " ;")?;
    }

    write!(out, "%{} = extractvalue ", dest_name(cx, dest))?;
    cx.write_typed_value(out, aggregate)?;
    write!(out, ", {index}")?;
    writeln!(out)?;
    Ok(())
}

fn is_cmpxchg_result(cx: &Cx<'_>, aggregate: &Symbol) -> bool {
    match aggregate {
        Symbol::Register(reg) => matches!(
            cx.defining_instruction(*reg),
            Some(Instruction::CompareExchange { .. })
        ),
        _ => false,
    }
}

/// Emit an assignment of the aggregate into `dest` via a temporary stack
/// slot. Leaves the cursor at the end of the load line, without a newline.
fn write_spill_assignment(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    aggregate: &Symbol,
) -> WriteResult<()> {
    let ty = cx.symbol_type(aggregate);
    let name = dest_name(cx, dest);
    let tmp = format!("%quill_tmp_{name}");

    write!(out, "{tmp} = alloca {ty}")?;
    writeln!(out)?;

    write_indent(out)?;
    write!(out, "store {ty} ")?;
    cx.write_value(out, aggregate)?;
    write!(out, ", {ty}* {tmp}")?;
    writeln!(out)?;

    write_indent(out)?;
    write!(out, "%{name} = load {ty}* {tmp}")?;
    Ok(())
}

fn write_insert_value(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    aggregate: &Symbol,
    value: &Symbol,
    index: u32,
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = insertvalue ", dest_name(cx, dest))?;
    cx.write_typed_value(out, aggregate)?;
    write!(out, ", ")?;
    cx.write_typed_value(out, value)?;
    write!(out, ", {index}")?;
    writeln!(out)?;
    Ok(())
}

fn write_shuffle_vector(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    vector1: &Symbol,
    vector2: &Symbol,
    mask: &Symbol,
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = shufflevector ", dest_name(cx, dest))?;
    cx.write_typed_value(out, vector1)?;
    write!(out, ", ")?;
    cx.write_typed_value(out, vector2)?;
    write!(out, ", ")?;
    cx.write_typed_value(out, mask)?;
    writeln!(out)?;
    Ok(())
}

// ===== Calls =====

/// Shared body of call and invoke: return type, optional explicit callee
/// signature, target value, and the parenthesized argument list.
///
/// The callee's signature is written out only when the call could not be
/// re-parsed without it, i.e. for varargs callees and for callees returning
/// a pointer to function.
fn write_callee_and_args(
    cx: &Cx<'_>,
    out: &mut impl Write,
    return_type: &Type,
    target: &Symbol,
    args: &[Symbol],
    check_formals: bool,
) -> WriteResult<()> {
    write!(out, "{return_type} ")?;

    let callee_ty = resolver::callee_function_type(cx, target)?;
    if needs_explicit_signature(&callee_ty) {
        quill_ir::types::write_formal_params(out, &callee_ty)?;
        write!(out, "* ")?;
    }

    cx.write_value(out, target)?;

    write!(out, "(")?;
    for (i, arg) in args.iter().enumerate() {
        if i != 0 {
            write!(out, ", ")?;
        }
        let arg_ty = cx.symbol_type(arg);
        if check_formals {
            // intrinsics such as the debug declare take arguments whose
            // declared formal differs from the value's own type; the formal
            // is then printed in front of the actual type
            if let Some(formal) = callee_ty.params.get(i) {
                if !formal.is_equivalent_ir_type(&arg_ty) {
                    write!(out, "{formal} ")?;
                }
            }
        }
        write!(out, "{arg_ty} ")?;
        cx.write_value(out, arg)?;
    }
    write!(out, ")")?;
    Ok(())
}

fn needs_explicit_signature(callee_ty: &FunctionType) -> bool {
    callee_ty.varargs || callee_ty.return_type.is_function_pointer()
}

fn write_invoke_tail(
    cx: &Cx<'_>,
    out: &mut impl Write,
    normal: BlockId,
    unwind: BlockId,
) -> WriteResult<()> {
    writeln!(out)?;
    write_deep_indent(out)?;
    write!(out, "to label ")?;
    cx.write_block_ref(out, normal)?;
    write!(out, " unwind label ")?;
    cx.write_block_ref(out, unwind)?;
    writeln!(out)?;
    Ok(())
}

// ===== Exception handling =====

fn write_landingpad(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    ty: &Type,
    cleanup: bool,
    clauses: &[LandingPadClause],
) -> WriteResult<()> {
    if !clauses.is_empty() {
        return Err(WriteError::Unsupported { construct: "landingpad clause".to_string() });
    }
    write_indent(out)?;
    write!(out, "%{} = landingpad {ty}", dest_name(cx, dest))?;
    if cleanup {
        writeln!(out)?;
        write_deep_indent(out)?;
        write!(out, "cleanup")?;
    }
    writeln!(out)?;
    Ok(())
}

// ===== Control flow =====

fn write_phi(
    cx: &Cx<'_>,
    out: &mut impl Write,
    dest: Reg,
    ty: &Type,
    incoming: &[(Symbol, BlockId)],
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "%{} = phi {ty} ", dest_name(cx, dest))?;
    for (i, (value, block)) in incoming.iter().enumerate() {
        if i != 0 {
            write!(out, ", ")?;
        }
        write!(out, "[ ")?;
        cx.write_value(out, value)?;
        write!(out, ", ")?;
        cx.write_block_ref(out, *block)?;
        write!(out, " ]")?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_indirect_branch(
    cx: &Cx<'_>,
    out: &mut impl Write,
    address: &Symbol,
    successors: &[BlockId],
) -> WriteResult<()> {
    write_indent(out)?;
    write!(out, "indirectbr ")?;
    cx.write_typed_value(out, address)?;
    write!(out, ", [ ")?;
    for (i, successor) in successors.iter().enumerate() {
        if i != 0 {
            write!(out, ", ")?;
        }
        write!(out, "label ")?;
        cx.write_block_ref(out, *successor)?;
    }
    write!(out, " ]")?;
    writeln!(out)?;
    Ok(())
}

fn write_switch(
    cx: &Cx<'_>,
    out: &mut impl Write,
    condition: &Symbol,
    default: BlockId,
    cases: &[SwitchCase],
) -> WriteResult<()> {
    let condition_ty = cx.symbol_type(condition);

    write_indent(out)?;
    write!(out, "switch {condition_ty} ")?;
    cx.write_value(out, condition)?;
    write!(out, ", label ")?;
    cx.write_block_ref(out, default)?;

    write!(out, " [ ")?;
    for (i, case) in cases.iter().enumerate() {
        if i != 0 {
            writeln!(out)?;
            write_deep_indent(out)?;
        }
        if cx.dialect.uses_legacy_switch_cases() {
            // the older grammar repeats the condition's type and writes the
            // raw case value
            let value = match &case.value {
                Symbol::Constant(Constant::Integer { value, .. }) => *value,
                other => {
                    return Err(WriteError::UnexpectedShape {
                        instruction: "switch",
                        what: format!("case value {} is not an integer constant", cx.value_text(other)),
                    })
                }
            };
            write!(out, "{condition_ty} {value}, label ")?;
        } else {
            cx.write_typed_value(out, &case.value)?;
            write!(out, ", label ")?;
        }
        cx.write_block_ref(out, case.target)?;
    }
    write!(out, " ]")?;
    writeln!(out)?;
    Ok(())
}
