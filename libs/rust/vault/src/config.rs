//! Vault client configuration.

use crate::error::{VaultError, VaultResult};
use std::time::Duration;
use url::Url;

/// Address used when none is configured.
pub const DEFAULT_ADDR: &str = "http://127.0.0.1:8200";

/// Vault client configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Vault server address
    pub addr: Url,
    /// Enterprise namespace sent as `X-Vault-Namespace`
    pub namespace: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            addr: Url::parse(DEFAULT_ADDR).unwrap_or_else(|_| unreachable!("valid constant")),
            namespace: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("kv-vault-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl VaultConfig {
    /// Create a configuration for the server at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] unless `addr` is an absolute
    /// `http` or `https` URL.
    pub fn new(addr: &str) -> VaultResult<Self> {
        let addr = Url::parse(addr.trim())
            .map_err(|e| VaultError::InvalidConfig(format!("Vault address '{addr}': {e}")))?;
        if !matches!(addr.scheme(), "http" | "https") {
            return Err(VaultError::InvalidConfig(format!(
                "Vault address must use http or https, got '{}'",
                addr.scheme()
            )));
        }
        if addr.host_str().is_none() {
            return Err(VaultError::InvalidConfig(format!(
                "Vault address '{addr}' has no host"
            )));
        }
        Ok(Self {
            addr,
            ..Default::default()
        })
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the namespace; blank values clear it.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.trim().is_empty());
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Full URL of an API path, e.g. `sys/mounts` -> `{addr}/v1/sys/mounts`.
    #[must_use]
    pub fn endpoint(&self, api_path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.addr.as_str().trim_end_matches('/'),
            api_path.trim_start_matches('/')
        )
    }
}
