//! Initialization from saved state.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use loam_core::{PathResolver, SourcePath};
use loam_decl::{process_disk_change, Context, DeclStore, ProgramOptions};
use loam_index::SymbolIndexEnv;
use loam_naming::{
    DiskSavedStateLoader, ForwardNamingTable, ReverseNamingTable, SavedStateLoader,
};
use loam_vfs::{FileSystem, LocalFs, SharedResolver};

use crate::config::DaemonConfig;
use crate::error::DaemonError;
use crate::state::InitializedState;
use crate::stubs::{materialize_stubs, STDLIB_STUBS};

/// Conventional saved-state location under the repository root.
pub const SAVED_STATE_RELATIVE_PATH: &str = ".loam/naming.bin";

pub struct InitializeParams {
    pub root: PathBuf,
    pub saved_state_path: Option<PathBuf>,
    pub use_ranked_autocomplete: bool,
    pub config: DaemonConfig,
}

fn uncaught(step: &str, err: impl std::fmt::Display) -> DaemonError {
    DaemonError::InitUncaught {
        debug: format!("{step}: {err}"),
    }
}

pub fn initialize(params: InitializeParams) -> Result<InitializedState, DaemonError> {
    // 1. Roots and stubs.
    let stdlib_stubs = materialize_stubs().map_err(|err| uncaught("materialize stubs", err))?;
    let resolver = SharedResolver::new(PathResolver::new(
        &params.root,
        stdlib_stubs.path(),
        std::env::temp_dir(),
    ));

    // 2. Empty store and default context. Shallow class decls are required
    // for per-member invalidation.
    let store = Arc::new(DeclStore::default());
    let fs: Arc<dyn FileSystem> = Arc::new(LocalFs::new(resolver.clone()));
    let ctx = Context::new(
        ProgramOptions {
            shallow_class_decls: true,
            ranked_autocomplete: params.use_ranked_autocomplete,
        },
        store.clone(),
        fs.clone(),
    );

    // 3–4. Load saved state. An explicit path is the caller asserting nothing
    // changed since the blob was produced.
    let loader = DiskSavedStateLoader {
        path: params
            .saved_state_path
            .clone()
            .unwrap_or_else(|| params.root.join(SAVED_STATE_RELATIVE_PATH)),
        assume_no_changes: params.saved_state_path.is_some(),
    };
    let saved = loader.load()?;

    // 5. Naming tables and the symbol index, then the stubs' own symbols
    // through the regular disk-change machinery.
    let mut fnt = ForwardNamingTable::from_index(&saved.index);
    let mut rnt = ReverseNamingTable::from_index(&saved.index);
    let mut symbol_index = SymbolIndexEnv::from_naming_index(&saved.index);

    for (name, _) in STDLIB_STUBS {
        let change = process_disk_change(&store, &mut fnt, &mut rnt, &*fs, &SourcePath::stdlib(*name))
            .map_err(|err| uncaught("register stubs", err))?;
        if let Some(change) = change {
            symbol_index.apply_delta(change.old_info.as_ref(), change.new_info.as_ref());
        }
    }

    let changed_files: HashSet<SourcePath> = saved.changed_files.into_iter().collect();
    let changed_files_denominator = changed_files.len();

    tracing::info!(
        target = "loam.daemon",
        root = %params.root.display(),
        files = fnt.len(),
        backlog = changed_files_denominator,
        "initialized from saved state"
    );

    Ok(InitializedState {
        stdlib_stubs,
        resolver,
        fnt,
        rnt,
        symbol_index,
        ctx,
        changed_files,
        changed_files_denominator,
    })
}
