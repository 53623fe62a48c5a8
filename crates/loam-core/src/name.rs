//! Symbol name type.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A lightweight owned symbol name.
///
/// Backed by [`smol_str::SmolStr`], which stores short strings inline and
/// avoids heap allocation for typical identifiers.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SymbolName(SmolStr);

impl SymbolName {
    #[inline]
    pub fn new(text: impl Into<SmolStr>) -> Self {
        Self(text.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for SymbolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SymbolName").field(&self.0.as_str()).finish()
    }
}

impl std::fmt::Display for SymbolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SymbolName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SymbolName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::borrow::Borrow<str> for SymbolName {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}
