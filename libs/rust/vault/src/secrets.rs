//! Secret types and Vault wire structures.

use crate::error::{VaultError, VaultResult};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

/// Vault bearer token.
#[derive(Clone)]
pub struct VaultToken(SecretString);

impl VaultToken {
    /// Wrap a token string.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] for an empty or blank token.
    pub fn new(token: impl Into<String>) -> VaultResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(VaultError::InvalidConfig("Vault token is empty".to_string()));
        }
        Ok(Self(SecretString::from(token)))
    }

    /// Access the raw token.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for VaultToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultToken([REDACTED])")
    }
}

/// Secret engine types this client can mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineType {
    /// Versioned key-value store (KV v2)
    KvV2,
}

impl EngineType {
    /// Body of a `sys/mounts/{path}` enable request.
    #[must_use]
    pub fn mount_request(self) -> serde_json::Value {
        match self {
            Self::KvV2 => serde_json::json!({
                "type": "kv",
                "options": { "version": "2" },
                "description": "Versioned key-value store",
            }),
        }
    }
}

/// Field map stored at one secret path.
///
/// Values are held as [`SecretString`]; `Debug` lists field names only.
#[derive(Clone, Default)]
pub struct SecretRecord {
    fields: BTreeMap<String, SecretString>,
}

impl SecretRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields
            .insert(name.into(), SecretString::from(value.into()));
    }

    /// Read a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.expose_secret())
    }

    /// Whether the record holds a non-empty value for `name`.
    #[must_use]
    pub fn has_value(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Field names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of fields whose presence or value differs between the records.
    #[must_use]
    pub fn differing_fields(&self, other: &Self) -> Vec<String> {
        let mut names: Vec<String> = self
            .fields
            .keys()
            .chain(other.fields.keys())
            .filter(|name| self.get(name) != other.get(name))
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// JSON object sent as the `data` member of a KV v2 write.
    #[must_use]
    pub fn to_data(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.expose_secret().to_string())))
            .collect()
    }

    /// Build a record from a KV v2 `data` object.
    ///
    /// Scalars are stored by their string form; nested values keep their JSON text.
    #[must_use]
    pub fn from_data(data: serde_json::Map<String, serde_json::Value>) -> Self {
        data.into_iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, value)
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SecretRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl PartialEq for SecretRecord {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.differing_fields(other).is_empty()
    }
}

impl Eq for SecretRecord {}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in self.fields.keys() {
            map.entry(name, &"[REDACTED]");
        }
        map.finish()
    }
}

/// Version metadata returned by KV v2 reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMetadata {
    /// Version number, starting at 1
    pub version: u32,
    /// When this version was written
    pub created_time: Option<DateTime<Utc>>,
    /// When this version was soft-deleted
    pub deletion_time: Option<DateTime<Utc>>,
    /// Whether this version was permanently destroyed
    pub destroyed: bool,
}

impl VersionMetadata {
    /// Metadata for `version` with no timestamps.
    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self {
            version,
            created_time: None,
            deletion_time: None,
            destroyed: false,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl From<KvMetadata> for VersionMetadata {
    fn from(raw: KvMetadata) -> Self {
        Self {
            version: raw.version,
            created_time: parse_timestamp(&raw.created_time),
            deletion_time: parse_timestamp(&raw.deletion_time),
            destroyed: raw.destroyed,
        }
    }
}

/// An existing mount as listed by `sys/mounts`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MountInfo {
    /// Engine type, e.g. `kv`
    #[serde(rename = "type")]
    pub engine_type: String,
    /// Engine options, e.g. `version = "2"`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub options: HashMap<String, String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<HashMap<String, String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl MountInfo {
    /// Describe a mount of `engine`, as Vault would list it.
    #[must_use]
    pub fn of(engine: EngineType) -> Self {
        match engine {
            EngineType::KvV2 => Self {
                engine_type: "kv".to_string(),
                options: HashMap::from([("version".to_string(), "2".to_string())]),
            },
        }
    }

    /// Describe a mount of an arbitrary engine type with no options.
    #[must_use]
    pub fn other(engine_type: impl Into<String>) -> Self {
        Self {
            engine_type: engine_type.into(),
            options: HashMap::new(),
        }
    }

    /// Whether this mount is the given engine type.
    #[must_use]
    pub fn is(&self, engine: EngineType) -> bool {
        match engine {
            EngineType::KvV2 => {
                self.engine_type == "kv"
                    && self.options.get("version").map(String::as_str) == Some("2")
            }
        }
    }
}

/// Token details from `auth/token/lookup-self`.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    /// Token accessor
    pub accessor: String,
    /// Display name
    pub display_name: String,
    /// Attached policies
    pub policies: Vec<String>,
    /// Remaining TTL; zero for root tokens
    pub ttl: Duration,
    /// Whether the token can be renewed
    pub renewable: bool,
}

/// Vault KV v2 read response wrapper
#[derive(Debug, Deserialize)]
pub(crate) struct KvReadResponse {
    pub data: KvData,
}

/// `data` object of a KV v2 read
#[derive(Debug, Deserialize)]
pub(crate) struct KvData {
    /// `null` when the latest version was deleted
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
    pub metadata: KvMetadata,
}

/// Version metadata as Vault sends it; timestamps are RFC 3339 or empty
#[derive(Debug, Deserialize)]
pub(crate) struct KvMetadata {
    #[serde(default)]
    pub created_time: String,
    #[serde(default)]
    pub deletion_time: String,
    #[serde(default)]
    pub destroyed: bool,
    pub version: u32,
}

/// Vault KV v2 write response wrapper
#[derive(Debug, Deserialize)]
pub(crate) struct KvWriteResponse {
    pub data: KvMetadata,
}

/// Vault token lookup response
#[derive(Debug, Deserialize)]
pub(crate) struct LookupSelfResponse {
    pub data: LookupSelfData,
}

/// Fields of `auth/token/lookup-self` this client reads
#[derive(Debug, Deserialize)]
pub(crate) struct LookupSelfData {
    #[serde(default)]
    pub accessor: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub ttl: u64,
    #[serde(default)]
    pub renewable: bool,
}

impl From<LookupSelfData> for TokenInfo {
    fn from(raw: LookupSelfData) -> Self {
        Self {
            accessor: raw.accessor,
            display_name: raw.display_name,
            policies: raw.policies,
            ttl: Duration::from_secs(raw.ttl),
            renewable: raw.renewable,
        }
    }
}

/// Vault error body
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}
