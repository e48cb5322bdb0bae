//! Mock implementations for testing.
//!
//! [`MockSecretStore`] keeps mounts and versioned secrets in memory, records
//! every call, and can be told to fail a given operation.

use kv_vault_client::{
    EngineType, MountInfo, MountPath, SecretPath, SecretRecord, SecretStore, TokenInfo, VaultError,
    VaultResult, VersionMetadata,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// Store operation, as recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `enable_kv_v2`
    EnableMount,
    /// `mount_info`
    MountInfo,
    /// `write_secret`
    Write,
    /// `read_secret`
    Read,
    /// `read_secret_version`
    ReadVersion,
    /// `lookup_self`
    LookupSelf,
}

/// Failure to inject for an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Server cannot be reached
    Unavailable,
    /// Token lacks capability
    PermissionDenied,
    /// Token rejected
    Unauthorized,
    /// Rate limited
    RateLimited,
    /// Request rejected with the given message
    BadRequest(String),
}

impl Failure {
    fn to_error(&self, target: &str) -> VaultError {
        match self {
            Self::Unavailable => VaultError::unavailable("connection refused"),
            Self::PermissionDenied => VaultError::PermissionDenied(target.to_string()),
            Self::Unauthorized => VaultError::auth_failed("permission denied"),
            Self::RateLimited => VaultError::RateLimited,
            Self::BadRequest(msg) => VaultError::BadRequest(msg.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    mounts: HashMap<String, MountInfo>,
    secrets: HashMap<(String, String), Vec<SecretRecord>>,
    calls: Vec<Operation>,
}

/// In-memory secret store for testing.
#[derive(Debug, Default)]
pub struct MockSecretStore {
    state: RwLock<MockState>,
    failures: HashMap<Operation, Failure>,
    read_override: Option<SecretRecord>,
}

impl MockSecretStore {
    /// Create an empty store with no mounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a mount.
    #[must_use]
    pub fn with_mount(mut self, mount: &str, info: MountInfo) -> Self {
        self.state
            .get_mut()
            .mounts
            .insert(mount.trim_matches('/').to_string(), info);
        self
    }

    /// Pre-populate a KV v2 mount.
    #[must_use]
    pub fn with_kv_v2_mount(self, mount: &str) -> Self {
        self.with_mount(mount, MountInfo::of(EngineType::KvV2))
    }

    /// Fail every call of `operation`.
    #[must_use]
    pub fn failing(mut self, operation: Operation, failure: Failure) -> Self {
        self.failures.insert(operation, failure);
        self
    }

    /// Return `record` from reads instead of what was stored.
    #[must_use]
    pub fn with_read_override(mut self, record: SecretRecord) -> Self {
        self.read_override = Some(record);
        self
    }

    /// Operations called so far, in order.
    pub async fn calls(&self) -> Vec<Operation> {
        self.state.read().await.calls.clone()
    }

    /// Whether `operation` was called at least once.
    pub async fn was_called(&self, operation: Operation) -> bool {
        self.state.read().await.calls.contains(&operation)
    }

    /// Latest stored version of a secret.
    pub async fn stored(&self, mount: &str, path: &str) -> Option<SecretRecord> {
        self.state
            .read()
            .await
            .secrets
            .get(&(mount.to_string(), path.to_string()))
            .and_then(|versions| versions.last().cloned())
    }

    /// Number of stored versions of a secret.
    pub async fn version_count(&self, mount: &str, path: &str) -> usize {
        self.state
            .read()
            .await
            .secrets
            .get(&(mount.to_string(), path.to_string()))
            .map_or(0, Vec::len)
    }

    /// Whether a mount exists.
    pub async fn has_mount(&self, mount: &str) -> bool {
        self.state.read().await.mounts.contains_key(mount)
    }

    /// Log the call and return the injected failure, if any.
    async fn enter(&self, operation: Operation, target: &str) -> VaultResult<()> {
        self.state.write().await.calls.push(operation);
        match self.failures.get(&operation) {
            Some(failure) => Err(failure.to_error(target)),
            None => Ok(()),
        }
    }

    async fn read_version(
        &self,
        mount: &MountPath,
        path: &SecretPath,
        version: Option<u32>,
    ) -> VaultResult<(SecretRecord, VersionMetadata)> {
        let endpoint = path.data_endpoint(mount);
        let state = self.state.read().await;
        let versions = state
            .secrets
            .get(&(mount.to_string(), path.to_string()))
            .ok_or_else(|| VaultError::not_found(&endpoint))?;

        let number = version.unwrap_or(u32::try_from(versions.len()).unwrap_or(u32::MAX));
        let index = usize::try_from(number)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| VaultError::not_found(&endpoint))?;
        let record = versions
            .get(index)
            .cloned()
            .ok_or_else(|| VaultError::not_found(&endpoint))?;

        let record = self.read_override.clone().unwrap_or(record);
        Ok((record, VersionMetadata::new(number)))
    }
}

impl SecretStore for MockSecretStore {
    async fn enable_kv_v2(&self, mount: &MountPath) -> VaultResult<()> {
        self.enter(Operation::EnableMount, mount.as_str()).await?;
        let mut state = self.state.write().await;
        if state.mounts.contains_key(mount.as_str()) {
            return Err(VaultError::MountConflict(mount.to_string()));
        }
        state
            .mounts
            .insert(mount.to_string(), MountInfo::of(EngineType::KvV2));
        Ok(())
    }

    async fn mount_info(&self, mount: &MountPath) -> VaultResult<Option<MountInfo>> {
        self.enter(Operation::MountInfo, "sys/mounts").await?;
        Ok(self.state.read().await.mounts.get(mount.as_str()).cloned())
    }

    async fn write_secret(
        &self,
        mount: &MountPath,
        path: &SecretPath,
        record: &SecretRecord,
    ) -> VaultResult<VersionMetadata> {
        let endpoint = path.data_endpoint(mount);
        self.enter(Operation::Write, &endpoint).await?;

        let mut state = self.state.write().await;
        if !state.mounts.contains_key(mount.as_str()) {
            return Err(VaultError::BadRequest(format!(
                "no handler for route \"{endpoint}\""
            )));
        }
        let versions = state
            .secrets
            .entry((mount.to_string(), path.to_string()))
            .or_default();
        versions.push(record.clone());
        let version = u32::try_from(versions.len()).unwrap_or(u32::MAX);
        Ok(VersionMetadata::new(version))
    }

    async fn read_secret(
        &self,
        mount: &MountPath,
        path: &SecretPath,
    ) -> VaultResult<(SecretRecord, VersionMetadata)> {
        self.enter(Operation::Read, &path.data_endpoint(mount)).await?;
        self.read_version(mount, path, None).await
    }

    async fn read_secret_version(
        &self,
        mount: &MountPath,
        path: &SecretPath,
        version: u32,
    ) -> VaultResult<(SecretRecord, VersionMetadata)> {
        self.enter(Operation::ReadVersion, &path.data_endpoint(mount))
            .await?;
        self.read_version(mount, path, Some(version)).await
    }

    async fn lookup_self(&self) -> VaultResult<TokenInfo> {
        self.enter(Operation::LookupSelf, "auth/token/lookup-self")
            .await?;
        Ok(TokenInfo {
            accessor: "mock-accessor".to_string(),
            display_name: "token".to_string(),
            policies: vec!["root".to_string()],
            ttl: Duration::ZERO,
            renewable: false,
        })
    }
}
