//! Module-level driver
//!
//! Walks the module function by function, emitting declaration lines for
//! body-less functions and full bodies otherwise. Functions are separated
//! by one blank line; every non-entry block gets a label line.

use std::fmt::Write;

use quill_ir::types::write_formal_params;
use quill_ir::{BlockId, Function, Module};

use crate::dialect::Dialect;
use crate::error::WriteResult;
use crate::instruction;
use crate::text::{block_label, Cx};

pub(crate) fn write_module_to(
    out: &mut impl Write,
    module: &Module,
    dialect: Dialect,
) -> WriteResult<()> {
    for (i, func) in module.functions.iter().enumerate() {
        if i != 0 {
            writeln!(out)?;
        }
        write_function(out, module, func, dialect)?;
    }
    Ok(())
}

fn write_function(
    out: &mut impl Write,
    module: &Module,
    func: &Function,
    dialect: Dialect,
) -> WriteResult<()> {
    if func.is_declaration() {
        log::trace!("declaring @{}", func.name);
        write!(out, "declare {} @{}", func.ty.return_type, func.name)?;
        write_formal_params(out, &func.ty)?;
        writeln!(out)?;
        return Ok(());
    }

    log::debug!("writing body of @{} ({} blocks)", func.name, func.blocks.len());
    let cx = Cx::new(module, func, dialect);

    write!(out, "define {} @{}(", func.ty.return_type, func.name)?;
    for (i, param) in func.params.iter().enumerate() {
        if i != 0 {
            write!(out, ", ")?;
        }
        write!(out, "{} %{}", param.ty, param.name)?;
    }
    if func.ty.varargs {
        if func.params.is_empty() {
            write!(out, "...")?;
        } else {
            write!(out, ", ...")?;
        }
    }
    writeln!(out, ") {{")?;

    for (index, block) in func.blocks.iter().enumerate() {
        if index != 0 {
            writeln!(out, "{}:", block_label(func, BlockId(index as u32)))?;
        }
        for instr in &block.instructions {
            instruction::write_instruction(&cx, out, instr)?;
        }
    }

    writeln!(out, "}}")?;
    Ok(())
}
