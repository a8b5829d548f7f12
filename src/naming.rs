//! Object-key naming for uploaded images.
//!
//! Every upload lands in the shared image bucket under a flat key of the form
//! `<prefix>-<hash>.<ext>`:
//!
//! - `partner-3f9a0c1b2d4e.svg` (partner logo)
//! - `cover-8b1e77a0c3d2.jpg` (project cover)
//!
//! The hash is the first [`HASH_LEN`] hex digits of the SHA-256 of the file
//! contents, so uploading the same file twice yields the same key and the
//! second upload is a no-op. The extension comes from the original filename,
//! lower-cased; files without one get a bare key.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex digits of the content hash kept in the key.
pub const HASH_LEN: usize = 12;

/// What an upload is for; decides the key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    PartnerLogo,
    Cover,
}

impl UploadKind {
    pub fn prefix(self) -> &'static str {
        match self {
            UploadKind::PartnerLogo => "partner",
            UploadKind::Cover => "cover",
        }
    }
}

/// Lower-cased extension of `filename`, if it has a usable one.
///
/// - `"logo.SVG"` → `Some("svg")`
/// - `"archive.tar.gz"` → `Some("gz")`
/// - `".hidden"` → `None`
/// - `"README"` → `None`
pub fn file_extension(filename: &str) -> Option<String> {
    let name = Path::new(filename).file_name()?.to_str()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Truncated SHA-256 of `bytes`, as lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(bytes));
    digest[..HASH_LEN].to_string()
}

/// Bucket key for an upload of `bytes` originally named `filename`.
pub fn object_key(kind: UploadKind, filename: &str, bytes: &[u8]) -> String {
    let hash = content_hash(bytes);
    match file_extension(filename) {
        Some(ext) => format!("{}-{}.{}", kind.prefix(), hash, ext),
        None => format!("{}-{}", kind.prefix(), hash),
    }
}
