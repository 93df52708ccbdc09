// src/hashing.rs
//
// Tee-hashing writer for payload files: computes MD5 and SHA-1 digests of
// every byte written while forwarding the bytes to an open file handle.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};

use md5::{Digest, Md5};
use sha1::Sha1;

/// Names of the digests computed by [`HashedFile`], matching the "Supported
/// hashes" external interface: MD5 and SHA-1.
pub const HASH_ALGORITHMS: [&str; 2] = ["MD5", "SHA-1"];

/// A file handle that hashes every byte written to it, so the caller can
/// retrieve content digests without a second read pass.
pub struct HashedFile {
    file: File,
    md5: Md5,
    sha1: Sha1,
}

impl HashedFile {
    /// Opens `file` for writing. The caller is responsible for having
    /// created it with exclusive-create semantics; this type only adds
    /// hashing, not the create-vs-overwrite policy.
    pub fn new(file: File) -> Self {
        HashedFile {
            file,
            md5: Md5::new(),
            sha1: Sha1::new(),
        }
    }

    /// Returns the hex-encoded digests computed so far, keyed by algorithm
    /// name ("MD5", "SHA-1").
    pub fn hashes(&self) -> BTreeMap<String, String> {
        let mut hashes = BTreeMap::new();
        hashes.insert("MD5".to_string(), hex_encode(&self.md5.clone().finalize()));
        hashes.insert("SHA-1".to_string(), hex_encode(&self.sha1.clone().finalize()));
        hashes
    }
}

impl Write for HashedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.md5.update(buf);
        self.sha1.update(buf);
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(out, "{:02x}", b).expect("writing to a String cannot fail");
    }
    out
}

/// Computes MD5 and SHA-1 digests of an already-written file, for use by the
/// validate pass when re-checking stored payloads against recorded hashes.
pub fn hash_bytes(data: &[u8]) -> BTreeMap<String, String> {
    let mut md5 = Md5::new();
    md5.update(data);
    let mut sha1 = Sha1::new();
    sha1.update(data);

    let mut hashes = BTreeMap::new();
    hashes.insert("MD5".to_string(), hex_encode(&md5.finalize()));
    hashes.insert("SHA-1".to_string(), hex_encode(&sha1.finalize()));
    hashes
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn hashes_match_known_vectors() {
        let tmp = NamedTempFile::new().unwrap();
        let file = tmp.reopen().unwrap();
        let mut hashed = HashedFile::new(file);
        hashed.write_all(b"abc").unwrap();

        let hashes = hashed.hashes();
        assert_eq!(hashes["MD5"], "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(hashes["SHA-1"], "a9993e364706816aba3e25717850c26c9cd0d89");
    }

    #[test]
    fn hash_bytes_matches_hashed_file() {
        let tmp = NamedTempFile::new().unwrap();
        let file = tmp.reopen().unwrap();
        let mut hashed = HashedFile::new(file);
        hashed.write_all(b"hello world").unwrap();

        assert_eq!(hashed.hashes(), hash_bytes(b"hello world"));
    }
}
