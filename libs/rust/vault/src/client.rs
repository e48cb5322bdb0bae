//! Vault HTTP client with token authentication.

use crate::{
    config::VaultConfig,
    error::{VaultError, VaultResult},
    path::{MountPath, SecretPath},
    provider::SecretStore,
    secrets::{
        EngineType, ErrorResponse, KvReadResponse, KvWriteResponse, LookupSelfResponse, MountInfo,
        SecretRecord, TokenInfo, VaultToken, VersionMetadata,
    },
};
use reqwest::{Client, Method, StatusCode};
use rust_common::{HttpConfig, build_http_client, classify_transport_error};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, instrument, warn};

/// Vault client bound to one server and one token.
pub struct VaultClient {
    config: VaultConfig,
    http: Client,
    token: VaultToken,
}

impl fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultClient")
            .field("addr", &self.config.addr.as_str())
            .field("namespace", &self.config.namespace)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    /// Create a new Vault client.
    ///
    /// No request is sent; the token is attached to every later call.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use kv_vault_client::{MountPath, SecretStore, VaultClient, VaultConfig, VaultToken};
    ///
    /// # tokio_test::block_on(async {
    /// let client = VaultClient::new(
    ///     VaultConfig::new("http://127.0.0.1:8200")?,
    ///     VaultToken::new("dev-only-token")?,
    /// )?;
    /// client.enable_kv_v2(&MountPath::parse("secrets")?).await?;
    /// # Ok::<(), kv_vault_client::VaultError>(())
    /// # }).unwrap();
    /// ```
    pub fn new(config: VaultConfig, token: VaultToken) -> VaultResult<Self> {
        let http_config = HttpConfig::default()
            .with_timeout(config.timeout)
            .with_user_agent(config.user_agent.clone());
        let http = build_http_client(&http_config)?;

        Ok(Self {
            config,
            http,
            token,
        })
    }

    /// Send a request and return the parsed body, or `None` for an empty body.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> VaultResult<Option<serde_json::Value>> {
        let url = self.config.endpoint(path);
        debug!(%method, path, "Vault request");

        let mut request = self
            .http
            .request(method, &url)
            .header("X-Vault-Token", self.token.expose())
            .header("Accept", "application/json");

        if let Some(ns) = &self.config.namespace {
            request = request.header("X-Vault-Namespace", ns);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(b) = body {
            request = request.json(&b);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VaultError::from(classify_transport_error(e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| VaultError::from(classify_transport_error(e)))?;

        check_status(status, path, &text)?;

        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> VaultResult<T> {
        let value = self
            .send(method, path, query, body)
            .await?
            .ok_or_else(|| VaultError::UnexpectedResponse(path.to_string()))?;
        Ok(serde_json::from_value(value)?)
    }

    async fn read_kv(
        &self,
        mount: &MountPath,
        path: &SecretPath,
        query: &[(&str, String)],
    ) -> VaultResult<(SecretRecord, VersionMetadata)> {
        let endpoint = path.data_endpoint(mount);
        let response: KvReadResponse = self.request(Method::GET, &endpoint, query, None).await?;

        let metadata = VersionMetadata::from(response.data.metadata);
        let Some(data) = response.data.data else {
            // Soft-deleted or destroyed versions keep metadata but no data.
            return Err(VaultError::not_found(endpoint));
        };

        Ok((SecretRecord::from_data(data), metadata))
    }
}

/// Map a Vault response status to an error.
fn check_status(status: StatusCode, path: &str, body: &str) -> VaultResult<()> {
    if status.is_success() {
        return Ok(());
    }

    let message = error_message(body);
    match status.as_u16() {
        400 if message.to_lowercase().contains("already in use") => {
            Err(VaultError::MountConflict(message))
        }
        400 => Err(VaultError::BadRequest(message)),
        401 => Err(VaultError::auth_failed(message)),
        403 => Err(VaultError::PermissionDenied(path.to_string())),
        404 => Err(VaultError::not_found(path)),
        429 => Err(VaultError::RateLimited),
        500..=599 => Err(VaultError::unavailable(format!("Status {status}: {message}"))),
        code => Err(VaultError::UnexpectedStatus {
            status: code,
            message,
        }),
    }
}

/// Extract Vault's `errors` array, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .filter(|e| !e.errors.is_empty())
        .map_or_else(|| body.trim().to_string(), |e| e.errors.join("; "))
}

/// Pick the mount table out of a `sys/mounts` response.
///
/// Newer servers nest the table under `data`; older ones list mounts at the top level.
fn find_mount(listing: &serde_json::Value, key: &str) -> VaultResult<Option<MountInfo>> {
    let entry = listing
        .get("data")
        .and_then(|d| d.get(key))
        .or_else(|| listing.get(key));

    entry
        .map(|v| serde_json::from_value(v.clone()).map_err(VaultError::from))
        .transpose()
}

impl SecretStore for VaultClient {
    #[instrument(skip(self), fields(mount = %mount))]
    async fn enable_kv_v2(&self, mount: &MountPath) -> VaultResult<()> {
        let path = format!("sys/mounts/{mount}");
        self.send(
            Method::POST,
            &path,
            &[],
            Some(EngineType::KvV2.mount_request()),
        )
        .await
        .map_err(|e| match e {
            VaultError::MountConflict(_) => VaultError::MountConflict(mount.to_string()),
            other => other,
        })?;
        debug!("KV v2 engine enabled");
        Ok(())
    }

    #[instrument(skip(self), fields(mount = %mount))]
    async fn mount_info(&self, mount: &MountPath) -> VaultResult<Option<MountInfo>> {
        let listing = self
            .send(Method::GET, "sys/mounts", &[], None)
            .await?
            .unwrap_or(serde_json::Value::Null);
        find_mount(&listing, &mount.listing_key())
    }

    #[instrument(skip(self, record), fields(mount = %mount, path = %path, fields = record.len()))]
    async fn write_secret(
        &self,
        mount: &MountPath,
        path: &SecretPath,
        record: &SecretRecord,
    ) -> VaultResult<VersionMetadata> {
        let body = serde_json::json!({ "data": record.to_data() });
        let response: KvWriteResponse = self
            .request(Method::POST, &path.data_endpoint(mount), &[], Some(body))
            .await?;
        let metadata = VersionMetadata::from(response.data);
        debug!(version = metadata.version, "Secret written");
        Ok(metadata)
    }

    #[instrument(skip(self), fields(mount = %mount, path = %path))]
    async fn read_secret(
        &self,
        mount: &MountPath,
        path: &SecretPath,
    ) -> VaultResult<(SecretRecord, VersionMetadata)> {
        self.read_kv(mount, path, &[]).await
    }

    #[instrument(skip(self), fields(mount = %mount, path = %path))]
    async fn read_secret_version(
        &self,
        mount: &MountPath,
        path: &SecretPath,
        version: u32,
    ) -> VaultResult<(SecretRecord, VersionMetadata)> {
        let (record, metadata) = self
            .read_kv(mount, path, &[("version", version.to_string())])
            .await?;
        if metadata.version != version {
            warn!(requested = version, returned = metadata.version, "Version mismatch");
        }
        Ok((record, metadata))
    }

    #[instrument(skip(self))]
    async fn lookup_self(&self) -> VaultResult<TokenInfo> {
        let response: LookupSelfResponse = self
            .request(Method::GET, "auth/token/lookup-self", &[], None)
            .await?;
        Ok(TokenInfo::from(response.data))
    }
}
