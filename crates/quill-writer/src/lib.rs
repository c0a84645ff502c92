//! Quill Writer
//!
//! Textual encoder turning a [`quill_ir::Module`] into LLVM-style `.ll`
//! assembly text. Encoding is a pure function of the module and the chosen
//! [`Dialect`]: the same input always produces the same bytes.

pub mod dialect;
pub mod error;

mod instruction;
mod module;
mod resolver;
mod text;

pub use dialect::Dialect;
pub use error::{WriteError, WriteResult};

use quill_ir::Module;

/// Encode a module into an owned string
pub fn write_module(module: &Module, dialect: Dialect) -> WriteResult<String> {
    let mut out = String::new();
    write_module_to(&mut out, module, dialect)?;
    Ok(out)
}

/// Encode a module into any [`std::fmt::Write`] sink
pub fn write_module_to(
    out: &mut impl std::fmt::Write,
    module: &Module,
    dialect: Dialect,
) -> WriteResult<()> {
    module::write_module_to(out, module, dialect)
}
