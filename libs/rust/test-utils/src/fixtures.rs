//! Test fixtures with sample data.
//!
//! Includes Vault response bodies shaped like a real server's, for use with
//! `wiremock`.

use chrono::{SecondsFormat, Utc};
use kv_vault_client::SecretRecord;
use serde_json::{Value, json};

/// Development token used across scenarios.
pub const DEV_TOKEN: &str = "dev-only-token";

/// Default KV mount.
pub const DEFAULT_MOUNT: &str = "secrets";

/// AWS credential path, mount prefix included.
pub const AWS_CREDENTIALS_PATH: &str = "secrets/aws/credentials";

/// AWS credential record with the two fields the credential consumer reads.
#[must_use]
pub fn aws_credentials(access_key: &str, secret_access_key: &str) -> SecretRecord {
    SecretRecord::new()
        .with_field("access_key", access_key)
        .with_field("secret_access_key", secret_access_key)
}

fn metadata(version: u32) -> Value {
    json!({
        "created_time": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        "custom_metadata": null,
        "deletion_time": "",
        "destroyed": false,
        "version": version
    })
}

/// Body of a successful KV v2 write.
#[must_use]
pub fn kv_write_body(version: u32) -> Value {
    json!({
        "request_id": "4f6bb8c0-0000-0000-0000-000000000001",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": metadata(version),
        "wrap_info": null,
        "warnings": null,
        "auth": null
    })
}

/// Body of a successful KV v2 read of `record`.
#[must_use]
pub fn kv_read_body(record: &SecretRecord, version: u32) -> Value {
    json!({
        "request_id": "4f6bb8c0-0000-0000-0000-000000000002",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": {
            "data": record.to_data(),
            "metadata": metadata(version)
        },
        "wrap_info": null,
        "warnings": null,
        "auth": null
    })
}

/// Body Vault returns when enabling an engine at a taken path.
#[must_use]
pub fn mount_conflict_body(mount: &str) -> Value {
    json!({ "errors": [format!("path is already in use at {mount}/")] })
}

/// Body Vault returns for a forbidden request.
#[must_use]
pub fn permission_denied_body() -> Value {
    json!({ "errors": ["1 error occurred:\n\t* permission denied\n\n"] })
}

/// `sys/mounts` listing with the system mounts plus `extra` as `(path, type, version)`.
#[must_use]
pub fn mounts_listing_body(extra: &[(&str, &str, Option<&str>)]) -> Value {
    let mut table = serde_json::Map::new();
    table.insert(
        "sys/".to_string(),
        json!({ "type": "system", "options": null }),
    );
    table.insert(
        "cubbyhole/".to_string(),
        json!({ "type": "cubbyhole", "options": null }),
    );
    for (path, engine, version) in extra {
        let options = version.map_or(Value::Null, |v| json!({ "version": v }));
        table.insert(
            format!("{}/", path.trim_matches('/')),
            json!({ "type": engine, "options": options }),
        );
    }
    json!({ "data": Value::Object(table) })
}
