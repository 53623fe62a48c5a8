//! Editor-held buffers and the file-system seam.

mod entry;
mod fs;

pub use entry::{Entry, EntryTable};
pub use fs::{FileSystem, LocalFs, MemoryFs, SharedResolver};
