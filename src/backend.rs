// src/backend.rs
//
// The storage medium a container's files live on. A minimal synchronous
// trait in the style of `PackageFormat` (see packages/traits.rs): a small
// seam that the Container Orchestrator can work against, with exactly one
// implementation shipped today. Deliberately synchronous — the engine is a
// single-writer, blocking-I/O design (see the concurrency model) and an
// async backend would contradict that.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Abstraction over where a container's bytes live.
pub trait Backend {
    /// Returns whether `relative` exists under the container root.
    fn exists(&self, relative: &str) -> bool;

    /// Ensures the parent directories of `relative` exist.
    fn ensure_parent(&self, relative: &str) -> Result<()>;

    /// Opens `relative` for exclusive-create writing; fails if it exists.
    fn create_new(&self, relative: &str) -> Result<fs::File>;

    /// Opens `relative` for reading.
    fn open(&self, relative: &str) -> Result<fs::File>;

    /// Returns the size in bytes of `relative`.
    fn size(&self, relative: &str) -> Result<u64>;

    /// Reads the full contents of `relative`.
    fn read_bytes(&self, relative: &str) -> Result<Vec<u8>>;

    /// Walks every regular file under the root, yielding root-relative
    /// forward-slash paths without a leading slash.
    fn walk_files(&self) -> Result<Vec<String>>;

    /// The absolute path backing `relative`, for backends that expose one.
    fn resolve(&self, relative: &str) -> PathBuf;
}

/// A backend rooted at a plain directory on the local filesystem.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Opens (creating if needed) a directory-backed container root.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(LocalBackend { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Backend for LocalBackend {
    fn exists(&self, relative: &str) -> bool {
        self.root.join(relative).exists()
    }

    fn ensure_parent(&self, relative: &str) -> Result<()> {
        if let Some(parent) = self.root.join(relative).parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn create_new(&self, relative: &str) -> Result<fs::File> {
        Ok(fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.root.join(relative))?)
    }

    fn open(&self, relative: &str) -> Result<fs::File> {
        Ok(fs::File::open(self.root.join(relative))?)
    }

    fn size(&self, relative: &str) -> Result<u64> {
        Ok(fs::metadata(self.root.join(relative))?.len())
    }

    fn read_bytes(&self, relative: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.root.join(relative))?)
    }

    fn walk_files(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        walk_dir(&self.root, &self.root, &mut out)?;
        Ok(out)
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

fn walk_dir(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk_dir(root, &path, out)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .expect("entry is under root")
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            out.push(relative);
        }
    }
    Ok(())
}

/// Returns a fresh payload path under `base_dir/name` (or `name` alone when
/// `base_dir` is empty), suffixing with `_0`, `_1`, ... before the extension
/// until a name that does not yet exist is found. Mirrors `store_file`'s
/// collision handling: it never overwrites.
pub fn next_free_path(backend: &dyn Backend, base_dir: &str, name: &str) -> String {
    let joined = if base_dir.is_empty() || base_dir == "." {
        name.to_string()
    } else {
        format!("{base_dir}/{name}")
    };

    if !backend.exists(&joined) {
        return joined;
    }

    let (stem, ext) = split_ext(&joined);
    let mut i = 0u64;
    loop {
        let candidate = if ext.is_empty() {
            format!("{stem}_{i}")
        } else {
            format!("{stem}_{i}.{ext}")
        };
        if !backend.exists(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

fn split_ext(path: &str) -> (&str, &str) {
    match path.rfind('.') {
        Some(idx) if idx > path.rfind('/').unwrap_or(0) => (&path[..idx], &path[idx + 1..]),
        _ => (path, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_and_reads_local_files() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::create(dir.path()).unwrap();
        backend.ensure_parent("sub/file.txt").unwrap();
        {
            use std::io::Write;
            let mut f = backend.create_new("sub/file.txt").unwrap();
            f.write_all(b"hi").unwrap();
        }
        assert!(backend.exists("sub/file.txt"));
        assert_eq!(backend.size("sub/file.txt").unwrap(), 2);
        assert_eq!(backend.read_bytes("sub/file.txt").unwrap(), b"hi");
    }

    #[test]
    fn next_free_path_suffixes_on_collision() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::create(dir.path()).unwrap();
        backend.create_new("testfile.txt").unwrap();
        let next = next_free_path(&backend, "", "testfile.txt");
        assert_eq!(next, "testfile_0.txt");
    }

    #[test]
    fn walk_files_lists_nested_entries() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::create(dir.path()).unwrap();
        backend.ensure_parent("a/b.txt").unwrap();
        backend.create_new("a/b.txt").unwrap();
        backend.create_new("c.txt").unwrap();
        let mut files = backend.walk_files().unwrap();
        files.sort();
        assert_eq!(files, vec!["a/b.txt".to_string(), "c.txt".to_string()]);
    }
}
