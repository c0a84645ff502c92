//! Grammar dialect selection

/// Version of the textual grammar to emit.
///
/// The two dialects differ only in how switch cases are written: the older
/// grammar repeats the condition's type in front of each raw case value,
/// the newer one writes each case value with its own type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// 3.2-era grammar with the older switch case encoding
    Llvm32,
    /// 3.8-era grammar
    #[default]
    Llvm38,
}

impl Dialect {
    /// Whether switch cases carry the condition's type instead of their own
    pub fn uses_legacy_switch_cases(self) -> bool {
        matches!(self, Dialect::Llvm32)
    }
}
