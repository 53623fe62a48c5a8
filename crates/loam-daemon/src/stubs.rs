//! Standard-library stubs.
//!
//! The stubs ship inside the binary and are materialized into a fresh scratch
//! directory at initialize time; the directory is deleted on shutdown. An
//! external cleaner may remove it while the daemon runs, so entry-creating
//! operations re-materialize on demand (see
//! [`InitializedState::ensure_stubs`](crate::state::InitializedState::ensure_stubs)).

use std::io;

use tempfile::TempDir;

pub const STDLIB_STUBS: &[(&str, &str)] = &[
    (
        "prelude.lm",
        "fun print(value)\nfun len(collection)\nfun assert_true(condition)\nconst NOTHING\n",
    ),
    (
        "collections.lm",
        "class Vector {\n    method push(item)\n    method pop()\n    method at(index)\n    prop size\n}\nclass Map extends Vector {\n    method get(key)\n    method put(key, value)\n}\n",
    ),
];

pub fn materialize_stubs() -> io::Result<TempDir> {
    let dir = tempfile::Builder::new().prefix("loam-stubs-").tempdir()?;
    for (name, text) in STDLIB_STUBS {
        std::fs::write(dir.path().join(name), text)?;
    }
    tracing::debug!(
        target = "loam.daemon",
        dir = %dir.path().display(),
        files = STDLIB_STUBS.len(),
        "materialized standard-library stubs"
    );
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stubs_land_on_disk_and_vanish_with_the_dir() {
        let dir = materialize_stubs().unwrap();
        let prelude = dir.path().join("prelude.lm");
        assert!(prelude.exists());
        let root = dir.path().to_path_buf();
        drop(dir);
        assert!(!root.exists());
    }
}
