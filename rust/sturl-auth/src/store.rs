//! Directory-backed persistence of acquired credentials.
//!
//! Each credential is one file under the store directory, named
//! `<identifier>.sturl` and holding the indented JSON form of
//! [`Credential`]. Files from before the suffix convention (bare
//! `<identifier>`) are renamed in place the first time they are touched.
//! Corrupt files are reported, never deleted.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::credential::Credential;
use crate::environment::EnvironmentName;
use crate::error::AuthorizationError;

/// File extension of stored credentials.
pub const CREDENTIAL_SUFFIX: &str = "sturl";

/// A directory of persisted credentials keyed by identifier.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    /// Creates a store over the given directory.
    ///
    /// The directory is created lazily on the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CredentialStore { dir: dir.into() }
    }

    /// Returns the directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path a credential is stored at.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{CREDENTIAL_SUFFIX}"))
    }

    fn legacy_path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Loads the credential stored under `name`.
    ///
    /// A missing file is [`AuthorizationError::NotFound`]; an unparsable
    /// one is [`AuthorizationError::CorruptCredential`], left in place for
    /// the user to inspect or delete.
    pub async fn load(&self, name: &str) -> Result<Credential, AuthorizationError> {
        self.migrate_legacy(name).await?;

        let path = self.path_for(name);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AuthorizationError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw).map_err(|_| AuthorizationError::CorruptCredential { path })
    }

    /// Persists `credential` under `name`, overwriting any existing file.
    pub async fn save(&self, name: &str, credential: &Credential) -> Result<(), AuthorizationError> {
        fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_string_pretty(credential)?;
        fs::write(self.path_for(name), body).await?;
        Ok(())
    }

    /// Renames a pre-suffix credential file to the current convention.
    ///
    /// No-op when the suffixed file already exists or no legacy file is
    /// present; safe to call repeatedly.
    pub async fn migrate_legacy(&self, name: &str) -> Result<(), AuthorizationError> {
        let current = self.path_for(name);
        let legacy = self.legacy_path_for(name);
        if !fs::try_exists(&current).await? && fs::try_exists(&legacy).await? {
            debug!(from = %legacy.display(), to = %current.display(), "migrating legacy credential file");
            fs::rename(&legacy, &current).await?;
        }
        Ok(())
    }

    /// Enumerates stored credentials as `(identifier, environment)` pairs.
    ///
    /// Files that fail to parse are skipped; a missing store directory
    /// yields an empty listing.
    pub async fn list(&self) -> Result<Vec<(String, EnvironmentName)>, AuthorizationError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CREDENTIAL_SUFFIX) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Ok(raw) = fs::read_to_string(&path).await else {
                continue;
            };
            match serde_json::from_str::<Credential>(&raw) {
                Ok(credential) => found.push((name.to_string(), credential.environment)),
                Err(error) => {
                    debug!(path = %path.display(), %error, "skipping unreadable credential file");
                }
            }
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }
}
