//! Compiles a Matter data model (endpoint types, clusters, attributes
//! and commands) into the flat, cross-indexed tables firmware uses to
//! describe its fixed endpoints.

pub mod compiler;
pub mod encode;
pub mod error;
pub mod literal;
pub mod masks;
pub mod options;
pub mod ordering;
pub mod structs;
pub mod tokens;
pub mod types;

pub use compiler::{compile, EndpointConfig};
pub use error::{Error, Location, Result};
pub use options::{CompilerOptions, Endianness, StringSizing};
pub use tokens::{group_nvm_tokens, TokenTable};
