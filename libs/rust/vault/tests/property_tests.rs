//! Property-based tests for Vault client.
//!
//! Tests validate:
//! - Secret non-exposure in debug output
//! - Path normalisation
//! - Record equality and KV v2 data round-trips

use kv_vault_client::{MountPath, SecretPath, SecretRecord, VaultToken};
use proptest::prelude::*;

// Strategy for generating secret values
fn secret_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9!@#$%^&*]{8,64}"
}

// Strategy for generating field names
fn field_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{2,15}"
}

// Strategy for generating path segments
fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,10}"
}

fn record_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((field_name_strategy(), secret_value_strategy()), 1..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Token values never show up in debug output.
    #[test]
    fn prop_token_not_exposed_in_debug(token in secret_value_strategy()) {
        let token_value = VaultToken::new(token.clone()).unwrap();
        let debug_output = format!("{token_value:?}");

        prop_assert!(!debug_output.contains(&token));
        prop_assert!(debug_output.contains("[REDACTED]"));
        prop_assert_eq!(token_value.expose(), token.as_str());
    }

    /// Field values never show up in debug output; names do.
    #[test]
    fn prop_record_values_redacted(fields in record_strategy()) {
        let record: SecretRecord = fields.iter().cloned().collect();
        let debug_output = format!("{record:?}");

        for (name, value) in &fields {
            prop_assert!(debug_output.contains(name.as_str()));
            // Short values may collide with a field name or the redaction marker.
            if !fields.iter().any(|(n, _)| n.contains(value.as_str())) {
                prop_assert!(!debug_output.contains(value.as_str()));
            }
        }
    }

    /// Serialising to KV v2 data and parsing it back yields an equal record.
    #[test]
    fn prop_record_data_round_trip(fields in record_strategy()) {
        let record: SecretRecord = fields.into_iter().collect();
        let parsed = SecretRecord::from_data(record.to_data());
        prop_assert_eq!(parsed.differing_fields(&record), Vec::<String>::new());
        prop_assert_eq!(parsed, record);
    }

    /// Changing one value is detected as exactly that field.
    #[test]
    fn prop_single_change_detected(
        fields in record_strategy(),
        replacement in secret_value_strategy(),
    ) {
        let record: SecretRecord = fields.iter().cloned().collect();
        let (name, _) = &fields[0];
        prop_assume!(record.get(name) != Some(replacement.as_str()));

        let changed = record.clone().with_field(name.clone(), replacement);
        prop_assert_ne!(&changed, &record);
        prop_assert_eq!(changed.differing_fields(&record), vec![name.clone()]);
    }

    /// Mount paths are normalised regardless of surrounding slashes.
    #[test]
    fn prop_mount_path_normalised(
        segments in prop::collection::vec(segment_strategy(), 1..4),
        leading in any::<bool>(),
        trailing in any::<bool>(),
    ) {
        let joined = segments.join("/");
        let raw = format!(
            "{}{joined}{}",
            if leading { "/" } else { "" },
            if trailing { "/" } else { "" },
        );
        let mount = MountPath::parse(&raw).unwrap();
        prop_assert_eq!(mount.as_str(), joined.as_str());
        prop_assert!(!mount.as_str().contains("//"));
    }

    /// A secret path with or without the mount prefix names the same secret.
    #[test]
    fn prop_secret_path_prefix_optional(
        mount_name in segment_strategy(),
        segments in prop::collection::vec(segment_strategy(), 1..4),
    ) {
        let mount = MountPath::parse(&mount_name).unwrap();
        let relative = segments.join("/");
        prop_assume!(relative != mount_name && !relative.starts_with(&format!("{mount_name}/")));

        let bare = SecretPath::parse(&relative, &mount).unwrap();
        let prefixed = SecretPath::parse(&format!("{mount_name}/{relative}"), &mount).unwrap();
        prop_assert_eq!(bare, prefixed);
    }
}

/// Blank tokens are rejected before any client exists.
#[test]
fn test_blank_token_rejected() {
    assert!(VaultToken::new("").is_err());
    assert!(VaultToken::new("\t \n").is_err());
}

/// Paths with characters outside the URL-safe set are rejected.
#[test]
fn test_unsafe_paths_rejected() {
    let mount = MountPath::parse("secrets").unwrap();
    for raw in ["aws/cred entials", "aws/%2e%2e", "aws/../sys", "aws?version=1"] {
        assert!(SecretPath::parse(raw, &mount).is_err(), "{raw} should be rejected");
    }
}
