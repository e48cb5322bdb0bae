//! HashiCorp Vault client for KV v2 provisioning.
//!
//! Provides token-authenticated access to the three operations a provisioning
//! run needs (engine mount, secret write, secret read) plus mount and token
//! introspection. Secret values and the token are held in [`secrecy`] types
//! and never appear in `Debug` output.

pub mod client;
pub mod config;
pub mod error;
pub mod path;
pub mod provider;
pub mod secrets;

pub use client::VaultClient;
pub use config::VaultConfig;
pub use error::{VaultError, VaultResult};
pub use path::{MountPath, SecretPath};
pub use provider::SecretStore;
pub use secrets::{EngineType, MountInfo, SecretRecord, TokenInfo, VaultToken, VersionMetadata};
