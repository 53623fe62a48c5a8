//! Naming tables: which file defines which symbol.
//!
//! The forward table (path → symbols) and reverse table (symbol → path)
//! reflect **disk only**; editor buffers never reach them. The reverse table
//! is a delta layered over a persistent index loaded from saved state.

mod file_info;
mod forward;
mod reverse;
mod saved_state;

pub use file_info::FileInfo;
pub use forward::ForwardNamingTable;
pub use reverse::ReverseNamingTable;
pub use saved_state::{
    write_saved_state, DiskSavedStateLoader, LoadError, NamingIndex, SavedState, SavedStateLoader,
};
