//! Generic secret store trait.
//!
//! The provisioner drives any [`SecretStore`]; [`crate::VaultClient`] is the
//! HTTP implementation and tests substitute an in-memory one.

use crate::error::VaultResult;
use crate::path::{MountPath, SecretPath};
use crate::secrets::{MountInfo, SecretRecord, TokenInfo, VersionMetadata};
use std::future::Future;

/// Operations a provisioning run performs against a secret store.
pub trait SecretStore: Send + Sync {
    /// Mount a KV v2 engine at `mount`.
    ///
    /// Fails with [`crate::VaultError::MountConflict`] if the path is taken.
    fn enable_kv_v2(&self, mount: &MountPath) -> impl Future<Output = VaultResult<()>> + Send;

    /// Describe the engine mounted at `mount`, if any.
    fn mount_info(
        &self,
        mount: &MountPath,
    ) -> impl Future<Output = VaultResult<Option<MountInfo>>> + Send;

    /// Replace the secret at `path` with `record`, creating a new version.
    fn write_secret(
        &self,
        mount: &MountPath,
        path: &SecretPath,
        record: &SecretRecord,
    ) -> impl Future<Output = VaultResult<VersionMetadata>> + Send;

    /// Read the latest version of the secret at `path`.
    fn read_secret(
        &self,
        mount: &MountPath,
        path: &SecretPath,
    ) -> impl Future<Output = VaultResult<(SecretRecord, VersionMetadata)>> + Send;

    /// Read a specific version of the secret at `path`.
    fn read_secret_version(
        &self,
        mount: &MountPath,
        path: &SecretPath,
        version: u32,
    ) -> impl Future<Output = VaultResult<(SecretRecord, VersionMetadata)>> + Send;

    /// Look up the calling token.
    fn lookup_self(&self) -> impl Future<Output = VaultResult<TokenInfo>> + Send;
}
