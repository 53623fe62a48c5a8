//! The layered cache coherence machine.
//!
//! [`DeclStore`] holds the process-wide caches (shallow decls, folded decls,
//! linearizations, typed ASTs). [`Context`] is the read view a query goes
//! through; [`Snapshot`] routes its reads entry-first and its writes either to
//! the shared store or to a quarantine side area, depending on how it was
//! made. The invalidation engine applies the two mutation triggers: entry
//! changes and disk changes.

mod context;
mod invalidate;
mod snapshot;
mod store;

pub use context::{Context, ProgramOptions};
pub use invalidate::{invalidate_entry_changed, process_disk_change, DiskChange};
pub use snapshot::{respect_but_quarantine_unsaved_changes, NamingView, Snapshot};
pub use store::DeclStore;
