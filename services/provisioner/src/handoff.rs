//! Token handoff for external callers.
//!
//! The last workflow step prints the token and a ready-to-run `curl` command
//! for the provisioned secret. Output goes to the given writer, never through
//! the logger.

use kv_vault_client::{MountPath, SecretPath, VaultConfig, VaultToken};
use std::io::{self, Write};

/// Token plus the endpoint an external caller should use with it.
#[derive(Debug, Clone)]
pub struct TokenHandoff {
    token: VaultToken,
    endpoint: String,
    namespace: Option<String>,
}

impl TokenHandoff {
    /// Handoff for the secret at `path` under `mount`.
    #[must_use]
    pub fn new(config: &VaultConfig, token: VaultToken, mount: &MountPath, path: &SecretPath) -> Self {
        Self {
            token,
            endpoint: config.endpoint(&path.data_endpoint(mount)),
            namespace: config.namespace.clone(),
        }
    }

    /// Sample command authenticating directly against the HTTP API.
    #[must_use]
    pub fn curl_command(&self) -> String {
        let mut cmd = format!("curl --header \"X-Vault-Token: {}\"", self.token.expose());
        if let Some(ns) = &self.namespace {
            cmd.push_str(&format!(" --header \"X-Vault-Namespace: {ns}\""));
        }
        cmd.push(' ');
        cmd.push_str(&self.endpoint);
        cmd
    }

    /// Text printed for the operator.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "Token for external use: {}\n\
             Example:\n  {}\n",
            self.token.expose(),
            self.curl_command()
        )
    }

    /// Write [`Self::render`] to `out` and flush it.
    ///
    /// # Errors
    ///
    /// Returns the writer's I/O error.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        out.write_all(self.render().as_bytes())?;
        out.flush()
    }
}
