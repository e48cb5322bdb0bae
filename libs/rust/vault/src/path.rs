//! Validated mount and secret paths.
//!
//! Segments are restricted to `[A-Za-z0-9_.-]`, which keeps every path safe to
//! splice into a request URL without further encoding.

use crate::error::{VaultError, VaultResult};
use std::fmt;

fn validate_segments(raw: &str) -> VaultResult<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(VaultError::invalid_path(raw, "path is empty"));
    }

    for segment in trimmed.split('/') {
        if segment.is_empty() {
            return Err(VaultError::invalid_path(raw, "empty path segment"));
        }
        if segment == "." || segment == ".." {
            return Err(VaultError::invalid_path(raw, "relative path segment"));
        }
        if let Some(c) = segment
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(VaultError::invalid_path(
                raw,
                format!("unsupported character {c:?}"),
            ));
        }
    }

    Ok(trimmed.to_string())
}

/// Path at which a secret engine is mounted, e.g. `secrets`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountPath(String);

impl MountPath {
    /// Parse and normalise a mount path.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidPath`] for empty or malformed paths.
    pub fn parse(raw: &str) -> VaultResult<Self> {
        validate_segments(raw).map(Self)
    }

    /// The normalised path without surrounding slashes.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which `sys/mounts` lists this mount.
    #[must_use]
    pub fn listing_key(&self) -> String {
        format!("{}/", self.0)
    }
}

impl fmt::Display for MountPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of a secret relative to its mount, e.g. `aws/credentials`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretPath(String);

impl SecretPath {
    /// Parse a secret path relative to `mount`.
    ///
    /// A leading mount prefix is stripped, so `secrets/aws/credentials` and
    /// `aws/credentials` name the same secret under mount `secrets`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidPath`] for malformed paths or a path that
    /// names only the mount itself.
    pub fn parse(raw: &str, mount: &MountPath) -> VaultResult<Self> {
        let normalised = validate_segments(raw)?;
        let relative = match normalised.strip_prefix(mount.as_str()) {
            Some("") => {
                return Err(VaultError::invalid_path(raw, "path names the mount itself"));
            }
            Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_string(),
            _ => normalised,
        };
        Ok(Self(relative))
    }

    /// The path relative to the mount.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// KV v2 data endpoint for this secret.
    #[must_use]
    pub fn data_endpoint(&self, mount: &MountPath) -> String {
        format!("{mount}/data/{}", self.0)
    }
}

impl fmt::Display for SecretPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
