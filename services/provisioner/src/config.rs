//! Type-safe configuration with validation.
//!
//! Every setting is a CLI flag bound to an environment variable; `.env` files
//! are loaded first. [`Config::resolve`] validates the raw flags and applies
//! the environment fallbacks for the token and the default AWS fields.

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use kv_vault_client::{MountPath, SecretPath, SecretRecord, VaultConfig, VaultError, VaultToken};
use rust_common::{LogFormat, TracingConfig};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Fields written when none are given on the command line, keyed by the
/// environment variable that supplies each value.
const DEFAULT_FIELDS: &[(&str, &str)] = &[
    ("access_key", "AWS_ACCESS_KEY_ID"),
    ("secret_access_key", "AWS_SECRET_ACCESS_KEY"),
];

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required setting
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Malformed `--field` argument
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Raw argument
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Same field given twice
    #[error("Field '{0}' given more than once")]
    DuplicateField(String),

    /// Invalid timeout value
    #[error("Invalid timeout: must be greater than 0")]
    InvalidTimeout,

    /// Address, token or path rejected by the client
    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// What to do when the mount path is already in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MountPolicy {
    /// Stop with a mount conflict
    #[default]
    Fail,
    /// Continue if the existing mount is already a KV v2 engine
    Reuse,
}

/// Command-line arguments.
#[derive(Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Vault server address
    #[arg(long, env = "VAULT_ADDR", default_value = kv_vault_client::config::DEFAULT_ADDR)]
    pub vault_addr: String,

    /// Vault token (falls back to VAULT_SERVICE_TOKEN)
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Vault Enterprise namespace
    #[arg(long, env = "VAULT_NAMESPACE")]
    pub namespace: Option<String>,

    /// Region hint, logged for operators
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Mount path of the KV v2 engine
    #[arg(long, env = "PROVISION_MOUNT", default_value = "secrets")]
    pub mount: String,

    /// Secret path, with or without the mount prefix
    #[arg(long, env = "PROVISION_SECRET_PATH", default_value = "aws/credentials")]
    pub secret_path: String,

    /// Secret field as key=value; repeatable
    #[arg(short = 'f', long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    /// Field that must be present and non-empty after the read-back; repeatable
    #[arg(long = "require-field", value_name = "KEY")]
    pub required_fields: Vec<String>,

    /// What to do when the mount path is already in use
    #[arg(long, env = "PROVISION_MOUNT_POLICY", value_enum, default_value_t = MountPolicy::Fail)]
    pub mount_policy: MountPolicy,

    /// Look up the token before touching any mount
    #[arg(
        long,
        env = "PROVISION_VERIFY_TOKEN",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub verify_token: bool,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// Log level filter (RUST_LOG takes precedence)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format: text or json
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl fmt::Debug for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self.fields.iter().map(String::as_str).map(redact_value).collect();
        f.debug_struct("Cli")
            .field("vault_addr", &self.vault_addr)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("namespace", &self.namespace)
            .field("region", &self.region)
            .field("mount", &self.mount)
            .field("secret_path", &self.secret_path)
            .field("fields", &fields)
            .field("required_fields", &self.required_fields)
            .field("mount_policy", &self.mount_policy)
            .field("verify_token", &self.verify_token)
            .field("request_timeout", &self.request_timeout)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Cli {
    /// Tracing settings, available before the rest of the config is validated.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig::default()
            .with_service_name(env!("CARGO_PKG_NAME"))
            .with_log_level(self.log_level.clone())
            .with_format(LogFormat::parse(&self.log_format))
    }
}

/// Validated provisioning configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Client settings
    pub vault: VaultConfig,
    /// Credential for every request
    pub token: VaultToken,
    /// Region hint
    pub region: String,
    /// Engine mount
    pub mount: MountPath,
    /// Secret path under the mount
    pub secret_path: SecretPath,
    /// Record to write
    pub record: SecretRecord,
    /// Fields checked after the read-back
    pub required_fields: Vec<String>,
    /// Existing-mount handling
    pub mount_policy: MountPolicy,
    /// Whether to look up the token first
    pub verify_token: bool,
}

impl Config {
    /// Resolve parsed arguments against the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a setting is missing or invalid.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, |name| std::env::var(name).ok())
    }

    /// Validate `cli`, using `lookup` for environment fallbacks.
    ///
    /// # Errors
    ///
    /// Returns an error if a setting is missing or invalid.
    pub fn resolve(cli: Cli, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if cli.request_timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let vault = VaultConfig::new(&cli.vault_addr)?
            .with_timeout(Duration::from_secs(cli.request_timeout))
            .with_namespace(cli.namespace)
            .with_user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ));

        let raw_token = cli
            .token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| lookup("VAULT_SERVICE_TOKEN"))
            .ok_or_else(|| {
                ConfigError::MissingRequired("VAULT_TOKEN or VAULT_SERVICE_TOKEN".to_string())
            })?;
        let token = VaultToken::new(raw_token)?;

        let mount = MountPath::parse(&cli.mount)?;
        let secret_path = SecretPath::parse(&cli.secret_path, &mount)?;

        let record = if cli.fields.is_empty() {
            default_record(&lookup)?
        } else {
            parse_fields(&cli.fields)?
        };

        let required_fields = if cli.required_fields.is_empty() {
            DEFAULT_FIELDS
                .iter()
                .map(|(name, _)| *name)
                .filter(|name| record.field_names().any(|f| f == *name))
                .map(str::to_string)
                .collect()
        } else {
            cli.required_fields
        };

        Ok(Self {
            vault,
            token,
            region: cli.region,
            mount,
            secret_path,
            record,
            required_fields,
            mount_policy: cli.mount_policy,
            verify_token: cli.verify_token,
        })
    }
}

/// Parse one `key=value` argument.
fn parse_field(raw: &str) -> Result<(String, String), ConfigError> {
    let (key, value) = raw.split_once('=').ok_or_else(|| ConfigError::InvalidField {
        field: redact_value(raw),
        reason: "expected KEY=VALUE".to_string(),
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::InvalidField {
            field: redact_value(raw),
            reason: "field name is empty".to_string(),
        });
    }
    Ok((key.to_string(), value.to_string()))
}

/// Keep only the name part of a field argument for error messages.
fn redact_value(raw: &str) -> String {
    match raw.split_once('=') {
        Some((key, _)) => format!("{key}=***"),
        None => "***".to_string(),
    }
}

fn parse_fields(raw: &[String]) -> Result<SecretRecord, ConfigError> {
    let mut seen = BTreeSet::new();
    let mut record = SecretRecord::new();
    for arg in raw {
        let (key, value) = parse_field(arg)?;
        if !seen.insert(key.clone()) {
            return Err(ConfigError::DuplicateField(key));
        }
        record.insert(key, value);
    }
    Ok(record)
}

fn default_record(lookup: &impl Fn(&str) -> Option<String>) -> Result<SecretRecord, ConfigError> {
    let mut record = SecretRecord::new();
    for (field, var) in DEFAULT_FIELDS {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            record.insert(*field, value);
        }
    }
    if record.is_empty() {
        return Err(ConfigError::MissingRequired(
            "at least one --field KEY=VALUE (or AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY)"
                .to_string(),
        ));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> Cli {
        Cli {
            vault_addr: "http://127.0.0.1:8200".to_string(),
            token: Some("dev-only-token".to_string()),
            namespace: None,
            region: "us-east-1".to_string(),
            mount: "secrets".to_string(),
            secret_path: "secrets/aws/credentials".to_string(),
            fields: vec!["access_key=X".to_string(), "secret_access_key=Y".to_string()],
            required_fields: Vec::new(),
            mount_policy: MountPolicy::Fail,
            verify_token: false,
            request_timeout: 30,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolves_scenario_config() {
        let config = Config::resolve(cli(), no_env).unwrap();
        assert_eq!(config.token.expose(), "dev-only-token");
        assert_eq!(config.mount.as_str(), "secrets");
        assert_eq!(config.secret_path.as_str(), "aws/credentials");
        assert_eq!(config.record.get("access_key"), Some("X"));
        assert_eq!(config.record.get("secret_access_key"), Some("Y"));
        assert_eq!(config.required_fields, vec!["access_key", "secret_access_key"]);
        assert_eq!(config.vault.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_token_falls_back_to_service_token() {
        let mut args = cli();
        args.token = None;
        let config = Config::resolve(args, |name| {
            (name == "VAULT_SERVICE_TOKEN").then(|| "svc-token".to_string())
        })
        .unwrap();
        assert_eq!(config.token.expose(), "svc-token");
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut args = cli();
        args.token = Some("   ".to_string());
        assert!(matches!(
            Config::resolve(args, no_env),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_fields_default_from_aws_env() {
        let mut args = cli();
        args.fields.clear();
        let config = Config::resolve(args, |name| match name {
            "AWS_ACCESS_KEY_ID" => Some("AKIA".to_string()),
            "AWS_SECRET_ACCESS_KEY" => Some("shh".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.record.len(), 2);
        assert_eq!(config.record.get("access_key"), Some("AKIA"));
    }

    #[test]
    fn test_no_fields_rejected() {
        let mut args = cli();
        args.fields.clear();
        assert!(matches!(
            Config::resolve(args, no_env),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut args = cli();
        args.fields.push("access_key=Z".to_string());
        assert!(matches!(
            Config::resolve(args, no_env),
            Err(ConfigError::DuplicateField(f)) if f == "access_key"
        ));
    }

    #[test]
    fn test_malformed_field_does_not_echo_value() {
        let mut args = cli();
        args.fields = vec!["=hunter2".to_string()];
        let err = Config::resolve(args, no_env).unwrap_err();
        assert!(!err.to_string().contains("hunter2"));

        let mut args = cli();
        args.fields = vec!["hunter2".to_string()];
        let err = Config::resolve(args, no_env).unwrap_err();
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let mut args = cli();
        args.fields = vec!["conn=user=a;pass=b".to_string()];
        let config = Config::resolve(args, no_env).unwrap();
        assert_eq!(config.record.get("conn"), Some("user=a;pass=b"));
        assert!(config.required_fields.is_empty());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut args = cli();
        args.request_timeout = 0;
        assert!(matches!(
            Config::resolve(args, no_env),
            Err(ConfigError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_bad_address_rejected() {
        let mut args = cli();
        args.vault_addr = "vault:8200".to_string();
        assert!(matches!(
            Config::resolve(args, no_env),
            Err(ConfigError::Vault(VaultError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "kv-provisioner",
            "--token",
            "t",
            "--mount",
            "kv",
            "-f",
            "a=1",
            "--field",
            "b=2",
            "--mount-policy",
            "reuse",
            "--verify-token",
        ])
        .unwrap();
        assert_eq!(cli.fields, vec!["a=1", "b=2"]);
        assert_eq!(cli.mount_policy, MountPolicy::Reuse);
        assert!(cli.verify_token);
        assert_eq!(cli.mount, "kv");
    }

    #[test]
    fn test_cli_verify_token_defaults_off() {
        let cli = Cli::try_parse_from(["kv-provisioner", "--token", "t"]).unwrap();
        assert!(!cli.verify_token);
    }

    #[test]
    fn test_cli_debug_redacts_secrets() {
        let cli = Cli::try_parse_from([
            "kv-provisioner",
            "--token",
            "hvs.root-secret",
            "-f",
            "secret_access_key=wJalrXUtnFEMI",
        ])
        .unwrap();
        let debug = format!("{cli:?}");
        assert!(!debug.contains("hvs.root-secret"));
        assert!(!debug.contains("wJalrXUtnFEMI"));
        assert!(debug.contains("secret_access_key=***"));
        assert!(debug.contains("[REDACTED]"));
    }
}
