//! Shared proptest generators.
//!
//! Generated paths always satisfy the segment rules of
//! [`kv_vault_client::MountPath`] and [`kv_vault_client::SecretPath`].

use kv_vault_client::SecretRecord;
use proptest::prelude::*;

/// Generate a single valid path segment.
pub fn path_segment_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,12}"
}

/// Generate mount path strings.
pub fn mount_path_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("secrets".to_string()),
        Just("kv".to_string()),
        path_segment_strategy(),
    ]
}

/// Generate secret paths relative to a mount.
pub fn secret_path_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("aws/credentials".to_string()),
        Just("app/database".to_string()),
        prop::collection::vec(path_segment_strategy(), 1..4).prop_map(|s| s.join("/")),
    ]
}

/// Generate field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("access_key".to_string()),
        Just("secret_access_key".to_string()),
        "[a-z][a-z0-9_]{2,15}",
    ]
}

/// Generate secret field values.
pub fn secret_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9+/=_-]{8,48}"
}

/// Generate tokens shaped like Vault service tokens.
pub fn token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("dev-only-token".to_string()),
        "hvs\\.[A-Za-z0-9]{24}",
        "s\\.[A-Za-z0-9]{24}",
    ]
}

/// Generate non-empty secret records.
pub fn secret_record_strategy() -> impl Strategy<Value = SecretRecord> {
    prop::collection::btree_map(field_name_strategy(), secret_value_strategy(), 1..6)
        .prop_map(|fields| fields.into_iter().collect())
}
