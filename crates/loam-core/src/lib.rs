//! Shared, dependency-minimized core types used across Loam.

pub mod name;
pub mod path;
pub mod text;

/// The current Loam version.
pub const LOAM_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use name::SymbolName;
pub use path::{PathResolver, RootKind, SourcePath};
pub use text::{LineCol, LineIndex, Span};
