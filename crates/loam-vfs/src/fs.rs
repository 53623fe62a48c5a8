//! File system abstraction.
//!
//! The trait is intentionally small so it can be implemented for different
//! backends (the local FS behind a path resolver, an in-memory map for
//! tests).

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use loam_core::{PathResolver, SourcePath};

pub trait FileSystem: Send + Sync {
    /// Reads the file contents as UTF-8 text.
    fn read_to_string(&self, path: &SourcePath) -> io::Result<String>;

    /// Returns whether a path exists.
    fn exists(&self, path: &SourcePath) -> bool;
}

/// A [`PathResolver`] shared between the daemon state (which re-points the
/// stdlib root when the stubs directory is re-materialized) and the file
/// system that consults it.
#[derive(Debug, Clone)]
pub struct SharedResolver {
    inner: Arc<Mutex<PathResolver>>,
}

impl SharedResolver {
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            inner: Arc::new(Mutex::new(resolver)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, PathResolver> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!(
                    target = "loam.vfs",
                    "path resolver mutex poisoned; continuing with recovered guard"
                );
                poisoned.into_inner()
            }
        }
    }

    pub fn resolve(&self, path: &SourcePath) -> std::path::PathBuf {
        self.lock().resolve(path)
    }
}

/// Local OS file system, resolving tagged paths through a [`SharedResolver`].
#[derive(Debug, Clone)]
pub struct LocalFs {
    resolver: SharedResolver,
}

impl LocalFs {
    pub fn new(resolver: SharedResolver) -> Self {
        Self { resolver }
    }
}

impl FileSystem for LocalFs {
    fn read_to_string(&self, path: &SourcePath) -> io::Result<String> {
        std::fs::read_to_string(self.resolver.resolve(path))
    }

    fn exists(&self, path: &SourcePath) -> bool {
        self.resolver.resolve(path).exists()
    }
}

/// In-memory file system for tests.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: Mutex<HashMap<SourcePath, String>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, path: SourcePath, contents: impl Into<String>) {
        self.files
            .lock()
            .expect("memory fs mutex poisoned")
            .insert(path, contents.into());
    }

    pub fn delete(&self, path: &SourcePath) {
        self.files
            .lock()
            .expect("memory fs mutex poisoned")
            .remove(path);
    }
}

impl FileSystem for MemoryFs {
    fn read_to_string(&self, path: &SourcePath) -> io::Result<String> {
        self.files
            .lock()
            .expect("memory fs mutex poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))
    }

    fn exists(&self, path: &SourcePath) -> bool {
        self.files
            .lock()
            .expect("memory fs mutex poisoned")
            .contains_key(path)
    }
}
