//! The set of files a worker generation precaches on install

use base64::prelude::{Engine as _, BASE64_STANDARD, BASE64_URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use thiserror::Error;

use crate::api::{Asset, Object};

/// Length of the package digest embedded in generation names
pub const PACKAGE_DIGEST_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrityError {
    #[error("Unsupported integrity algorithm in {0:?}")]
    UnsupportedAlgorithm(String),
    #[error("Integrity mismatch, expected {expected} got {got}")]
    Mismatch { expected: String, got: String },
}

/// A precached path with an optional subresource integrity string
/// (`sha384-<base64>`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashedFile {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl HashedFile {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self { path: path.into(), hash: None }
    }

    pub fn with_hash<S: Into<String>>(mut self, hash: S) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Checks `bytes` against the integrity string. Files without one always
    /// pass
    pub fn verify(&self, bytes: &[u8]) -> Result<(), IntegrityError> {
        let Some(expected) = &self.hash else {
            return Ok(());
        };

        let (algorithm, _) = expected
            .split_once('-')
            .ok_or_else(|| IntegrityError::UnsupportedAlgorithm(expected.clone()))?;

        let digest = match algorithm {
            "sha256" => BASE64_STANDARD.encode(Sha256::digest(bytes)),
            "sha384" => BASE64_STANDARD.encode(Sha384::digest(bytes)),
            "sha512" => BASE64_STANDARD.encode(Sha512::digest(bytes)),
            _ => return Err(IntegrityError::UnsupportedAlgorithm(expected.clone())),
        };
        let got = format!("{algorithm}-{digest}");

        if &got == expected {
            Ok(())
        } else {
            Err(IntegrityError::Mismatch { expected: expected.clone(), got })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceWorkerPackage {
    pub version: String,
    pub files: Vec<HashedFile>,
    /// Document served when a page can't be fetched or found in the cache
    pub offline: HashedFile,
}

impl Default for ServiceWorkerPackage {
    fn default() -> Self {
        Self {
            version: "2".to_string(),
            files: Asset::ALL.iter().map(|a| HashedFile::new(a.path())).collect(),
            offline: HashedFile::new(Object::Offline.path()),
        }
    }
}

impl ServiceWorkerPackage {
    pub fn file(&self, path: &str) -> Option<&HashedFile> {
        self.precache().find(|f| f.path == path)
    }

    /// Every file installed into a generation, the offline document last
    pub fn precache(&self) -> impl Iterator<Item = &HashedFile> {
        self.files.iter().chain(std::iter::once(&self.offline))
    }

    /// Short stable digest over everything that affects what gets precached
    ///
    /// Changing a path, an integrity hash or the version changes the digest
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.version.as_bytes());
        for f in self.precache() {
            hasher.update(b"\n");
            hasher.update(f.path.as_bytes());
            hasher.update(b" ");
            hasher.update(f.hash.as_deref().unwrap_or_default().as_bytes());
        }

        let mut digest = BASE64_URL_SAFE_NO_PAD.encode(hasher.finalize());
        digest.truncate(PACKAGE_DIGEST_LEN);
        digest
    }
}
