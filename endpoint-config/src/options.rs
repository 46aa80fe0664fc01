use serde::Serialize;

/// First NVM token identifier handed out by the token grouper.
pub const DEFAULT_TOKEN_BASE: u16 = 0xB000;

/// Largest default (in bytes) that fits the inline default slot.
pub const DEFAULT_INLINE_BUDGET: u16 = 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// How much storage a string attribute gets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum StringSizing {
    /// Always reserve `max_length` plus the length prefix.
    #[default]
    MaxLength,
    /// Read-only strings with a default only need room for that default.
    MinimizeWriteOnce,
}

/// Policy knobs of a compilation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerOptions {
    pub endianness: Endianness,
    pub inline_budget: u16,
    /// Treat unrecognized storage options as RAM instead of failing.
    pub lenient_storage: bool,
    pub string_sizing: StringSizing,
    pub token_base: u16,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            endianness: Endianness::default(),
            inline_budget: DEFAULT_INLINE_BUDGET,
            lenient_storage: false,
            string_sizing: StringSizing::default(),
            token_base: DEFAULT_TOKEN_BASE,
        }
    }
}
