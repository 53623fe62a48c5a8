//! Repository-relative paths with a tagged root prefix.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The root a [`SourcePath`] is relative to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RootKind {
    /// The repository under analysis.
    Repo,
    /// The materialized standard-library stubs.
    Stdlib,
    /// Scratch files that exist only for the lifetime of the daemon.
    Scratch,
}

impl RootKind {
    fn scheme(self) -> &'static str {
        match self {
            RootKind::Repo => "repo",
            RootKind::Stdlib => "stdlib",
            RootKind::Scratch => "scratch",
        }
    }
}

/// A repository-relative path. Equality is structural.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePath {
    root: RootKind,
    suffix: String,
}

impl SourcePath {
    pub fn new(root: RootKind, suffix: impl Into<String>) -> Self {
        Self {
            root,
            suffix: suffix.into(),
        }
    }

    pub fn repo(suffix: impl Into<String>) -> Self {
        Self::new(RootKind::Repo, suffix)
    }

    pub fn stdlib(suffix: impl Into<String>) -> Self {
        Self::new(RootKind::Stdlib, suffix)
    }

    pub fn scratch(suffix: impl Into<String>) -> Self {
        Self::new(RootKind::Scratch, suffix)
    }

    pub fn root(&self) -> RootKind {
        self.root
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Whether this path names a Loam source file.
    ///
    /// Disk changes to anything else are counted for progress reporting but
    /// never reach the naming tables.
    pub fn is_source_file(&self) -> bool {
        self.suffix.ends_with(".lm")
    }
}

impl fmt::Debug for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourcePath({self})")
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.root.scheme(), self.suffix)
    }
}

/// Maps tagged roots to absolute directories.
///
/// This is an explicitly passed capability: everything that resolves a
/// [`SourcePath`] to the file system is handed a resolver rather than
/// consulting process-global state. The initialized daemon owns it, and the
/// stdlib root can be re-pointed when the stubs directory is re-materialized.
#[derive(Debug, Clone)]
pub struct PathResolver {
    repo_root: PathBuf,
    stdlib_root: PathBuf,
    scratch_root: PathBuf,
}

impl PathResolver {
    pub fn new(
        repo_root: impl Into<PathBuf>,
        stdlib_root: impl Into<PathBuf>,
        scratch_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repo_root: repo_root.into(),
            stdlib_root: stdlib_root.into(),
            scratch_root: scratch_root.into(),
        }
    }

    pub fn resolve(&self, path: &SourcePath) -> PathBuf {
        let root = match path.root() {
            RootKind::Repo => &self.repo_root,
            RootKind::Stdlib => &self.stdlib_root,
            RootKind::Scratch => &self.scratch_root,
        };
        root.join(path.suffix())
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn stdlib_root(&self) -> &Path {
        &self.stdlib_root
    }

    pub fn set_stdlib_root(&mut self, root: impl Into<PathBuf>) {
        self.stdlib_root = root.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn equality_is_structural() {
        assert_eq!(SourcePath::repo("a/b.lm"), SourcePath::repo("a/b.lm"));
        assert_ne!(SourcePath::repo("a.lm"), SourcePath::stdlib("a.lm"));
    }

    #[test]
    fn resolver_joins_the_tagged_root() {
        let resolver = PathResolver::new("/repo", "/stubs", "/scratch");
        assert_eq!(
            resolver.resolve(&SourcePath::repo("src/main.lm")),
            PathBuf::from("/repo/src/main.lm")
        );
        assert_eq!(
            resolver.resolve(&SourcePath::stdlib("prelude.lm")),
            PathBuf::from("/stubs/prelude.lm")
        );
    }

    #[test]
    fn stdlib_root_can_be_repointed() {
        let mut resolver = PathResolver::new("/repo", "/stubs", "/scratch");
        resolver.set_stdlib_root("/stubs-2");
        assert_eq!(
            resolver.resolve(&SourcePath::stdlib("prelude.lm")),
            PathBuf::from("/stubs-2/prelude.lm")
        );
    }

    #[test]
    fn source_file_check_is_extension_based() {
        assert!(SourcePath::repo("a.lm").is_source_file());
        assert!(!SourcePath::repo("README.md").is_source_file());
        assert!(!SourcePath::repo("a.lm.orig").is_source_file());
    }
}
