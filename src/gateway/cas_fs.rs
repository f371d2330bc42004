use std::fs;
use std::path::{Path, PathBuf};

use crate::digest::sha256_hex;
use crate::error::Result;

/// A blob stored under its sha256 in the local content-addressed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasObject {
    /// `cas:sha256:<hex>`
    pub reference: String,
    pub sha256_hex: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Write `bytes` to `root/sha256/ab/cd/<hex>`; existing blobs are left untouched.
pub fn write_cas(root: &Path, bytes: &[u8]) -> Result<CasObject> {
    let hex = sha256_hex(bytes);
    let path = cas_path(root, &hex);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    if !path.exists() {
        fs::write(&path, bytes)?;
    }
    Ok(CasObject {
        reference: format!("cas:sha256:{}", hex),
        sha256_hex: hex,
        path,
        size: bytes.len() as u64,
    })
}

pub fn cas_path(root: &Path, hex: &str) -> PathBuf {
    root.join("sha256").join(&hex[0..2]).join(&hex[2..4]).join(hex)
}
