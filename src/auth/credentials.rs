//! Credential type and its file-backed storage.
//!
//! Credentials are stored in `~/.sessionlink/credentials.json` by default.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::expiry;
use crate::traits::RefreshedTokens;

/// The credentials directory name.
const CREDENTIALS_DIR: &str = ".sessionlink";

/// The credentials file name.
const CREDENTIALS_FILE: &str = "credentials.json";

/// The access/refresh token pair held by the token store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    /// Short-lived bearer token attached to every authenticated request.
    pub access_token: String,
    /// Single-use token exchanged for a new access token.
    pub refresh_token: String,
    /// Access token expiry as Unix timestamp (seconds), decoded from its
    /// `exp` claim. `None` when the token carries no readable claim.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl Credential {
    /// Create a credential, deriving the expiry from the access token.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        let access_token = access_token.into();
        let expires_at = expiry::token_expiration(&access_token);
        Self {
            access_token,
            refresh_token: refresh_token.into(),
            expires_at,
        }
    }

    /// The credential that replaces this one after a refresh.
    ///
    /// A rotated refresh token replaces the old one; otherwise the old one is
    /// kept.
    pub fn rotated(&self, tokens: &RefreshedTokens) -> Self {
        Self::new(
            tokens.access_token.clone(),
            tokens
                .refresh_token
                .clone()
                .unwrap_or_else(|| self.refresh_token.clone()),
        )
    }

    /// Seconds until the access token expires, negative once expired. `None`
    /// when unknown or out of range.
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at
            .and_then(|exp| exp.checked_sub(chrono::Utc::now().timestamp()))
    }

    /// Check if the access token is past its expiry.
    ///
    /// A credential without a known expiry is not considered expired; the
    /// server decides.
    pub fn is_expired(&self) -> bool {
        self.seconds_until_expiry().is_some_and(|secs| secs <= 0)
    }
}

/// Manages credential file storage and retrieval.
#[derive(Debug, Clone)]
pub struct CredentialsManager {
    /// Path to the credentials file.
    credentials_path: PathBuf,
}

impl CredentialsManager {
    /// Create a manager for the default location under the home directory.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn new() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self::with_path(home.join(CREDENTIALS_DIR).join(CREDENTIALS_FILE)))
    }

    /// Create a manager for an explicit file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: path.into(),
        }
    }

    /// Get the path to the credentials file.
    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    /// Load the credential from the credentials file.
    ///
    /// Returns `None` if the file doesn't exist or can't be parsed.
    pub fn load(&self) -> Option<Credential> {
        let file = File::open(&self.credentials_path).ok()?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).ok()
    }

    /// Save the credential to the credentials file.
    ///
    /// Writes to a sibling temporary file and renames it into place, so a
    /// concurrent reader never sees a half-written file. Creates the parent
    /// directory if it doesn't exist.
    pub fn save(&self, credential: &Credential) -> std::io::Result<()> {
        if let Some(parent) = self.credentials_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.credentials_path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            restrict_permissions(&file)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, credential)?;
            writer.flush()?;
        }

        fs::rename(&tmp_path, &self.credentials_path)
    }

    /// Remove the credentials file. Succeeds if it didn't exist.
    pub fn clear(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.credentials_path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File) -> std::io::Result<()> {
    Ok(())
}
