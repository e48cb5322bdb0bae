//! Workflow step errors.
//!
//! Every failure names the step it happened in and carries the underlying
//! [`VaultError`] where there is one. Handling is uniform (the run stops),
//! but each error still reports whether it was transient.

use kv_vault_client::VaultError;
use std::fmt;
use thiserror::Error;

/// Workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Build the authenticated client
    SetCredential,
    /// Optional token lookup
    VerifyCredential,
    /// Mount the KV v2 engine
    EnableEngine,
    /// Write the secret record
    WriteSecret,
    /// Read the secret back and compare
    ReadSecret,
    /// Print the token and sample command
    EmitToken,
}

impl Step {
    /// Stable step name for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SetCredential => "set-credential",
            Self::VerifyCredential => "verify-credential",
            Self::EnableEngine => "enable-engine",
            Self::WriteSecret => "write-secret",
            Self::ReadSecret => "read-secret",
            Self::EmitToken => "emit-token",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a read-back did not match the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    /// Field names whose presence or value differs
    FieldsDiffer(Vec<String>),
    /// The read returned an older version than the write produced
    VersionRegressed {
        /// Version returned by the write
        written: u32,
        /// Version returned by the read
        read: u32,
    },
    /// Required fields missing or empty
    MissingRequired(Vec<String>),
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldsDiffer(names) => write!(f, "fields differ: {}", names.join(", ")),
            Self::VersionRegressed { written, read } => {
                write!(f, "read version {read} is older than written version {written}")
            }
            Self::MissingRequired(names) => {
                write!(f, "required fields missing or empty: {}", names.join(", "))
            }
        }
    }
}

/// A failed workflow step.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StepError {
    /// An engine is already mounted at the path
    #[error("secret engine already mounted at '{mount}'{}", .existing.as_ref().map(|e| format!(" ({e})")).unwrap_or_default())]
    MountConflict {
        /// Mount path
        mount: String,
        /// Engine found there, when known
        existing: Option<String>,
    },

    /// Mount request rejected for another reason
    #[error("failed to enable secret engine at '{mount}': {source}")]
    MountFailure {
        /// Mount path
        mount: String,
        /// Underlying error
        source: VaultError,
    },

    /// Write rejected
    #[error("failed to write secret at '{path}': {source}")]
    WriteFailure {
        /// Data endpoint of the secret
        path: String,
        /// Underlying error
        source: VaultError,
    },

    /// Read rejected or secret missing
    #[error("failed to read secret at '{path}': {source}")]
    ReadFailure {
        /// Data endpoint of the secret
        path: String,
        /// Underlying error
        source: VaultError,
    },

    /// Read-back differs from what was written
    #[error("secret at '{path}' failed verification: {reason}")]
    VerificationMismatch {
        /// Data endpoint of the secret
        path: String,
        /// What differed
        reason: MismatchReason,
    },

    /// Token lookup rejected
    #[error("credential rejected: {source}")]
    CredentialRejected {
        /// Underlying error
        source: VaultError,
    },

    /// Vault could not be reached
    #[error("Vault unreachable during {step}: {source}")]
    Unreachable {
        /// Step in progress
        step: Step,
        /// Underlying error
        source: VaultError,
    },

    /// Writing the token handoff failed
    #[error("failed to write token handoff: {0}")]
    Output(#[from] std::io::Error),

    /// The state machine was asked to skip or repeat a state
    #[error("invalid workflow transition from {from} to {to}")]
    InvalidTransition {
        /// Current state
        from: String,
        /// Requested state
        to: String,
    },
}

impl StepError {
    /// Classify a store error raised during `step`.
    ///
    /// `target` is the mount for engine steps and the data endpoint for
    /// secret steps.
    #[must_use]
    pub fn from_vault(step: Step, target: &str, source: VaultError) -> Self {
        if source.is_unreachable() {
            return Self::Unreachable { step, source };
        }
        match (step, source) {
            (Step::EnableEngine, VaultError::MountConflict(_)) => Self::MountConflict {
                mount: target.to_string(),
                existing: None,
            },
            (Step::EnableEngine, source) => Self::MountFailure {
                mount: target.to_string(),
                source,
            },
            (Step::WriteSecret, source) => Self::WriteFailure {
                path: target.to_string(),
                source,
            },
            (Step::ReadSecret, source) => Self::ReadFailure {
                path: target.to_string(),
                source,
            },
            (_, source) => Self::CredentialRejected { source },
        }
    }

    /// Stable error code for logs.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MountConflict { .. } => "MOUNT_CONFLICT",
            Self::MountFailure { .. } => "MOUNT_FAILURE",
            Self::WriteFailure { .. } => "WRITE_FAILURE",
            Self::ReadFailure { .. } => "READ_FAILURE",
            Self::VerificationMismatch { .. } => "VERIFICATION_MISMATCH",
            Self::CredentialRejected { .. } => "CREDENTIAL_REJECTED",
            Self::Unreachable { .. } => "UNREACHABLE",
            Self::Output(_) => "OUTPUT_FAILURE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }

    /// Whether re-running the workflow later could succeed unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Unreachable { .. } => true,
            Self::MountFailure { source, .. }
            | Self::WriteFailure { source, .. }
            | Self::ReadFailure { source, .. }
            | Self::CredentialRejected { source } => source.is_retryable(),
            _ => false,
        }
    }

    /// Operator-facing suggestion for fixing the failure.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::MountConflict { mount, .. } => Some(format!(
                "an engine is already mounted at '{mount}/'; rerun with --mount-policy reuse or pick another --mount"
            )),
            Self::MountFailure { mount, source } => match source {
                VaultError::PermissionDenied(_) => Some(format!(
                    "check that the token has 'create' and 'update' capabilities on 'sys/mounts/{mount}'"
                )),
                other => credential_hint(other),
            },
            Self::WriteFailure { path, source } => match source {
                VaultError::PermissionDenied(_) => Some(format!(
                    "check that the token has 'create' and 'update' capabilities on '{path}'"
                )),
                other => credential_hint(other),
            },
            Self::ReadFailure { path, source } => match source {
                VaultError::PermissionDenied(_) => Some(format!(
                    "check that the token has 'read' capability on '{path}'"
                )),
                VaultError::SecretNotFound(_) => Some(format!(
                    "path '{path}' not found; check the path and mount point"
                )),
                other => credential_hint(other),
            },
            Self::VerificationMismatch { .. } => Some(
                "another writer may have changed the secret between the write and the read"
                    .to_string(),
            ),
            Self::CredentialRejected { source } => credential_hint(source),
            Self::Unreachable { .. } => Some(
                "is Vault running and accessible at the configured address?".to_string(),
            ),
            Self::Output(_) | Self::InvalidTransition { .. } => None,
        }
    }
}

fn credential_hint(source: &VaultError) -> Option<String> {
    match source {
        VaultError::AuthenticationFailed(_) | VaultError::PermissionDenied(_) => Some(
            "the token may be expired or invalid; check VAULT_TOKEN".to_string(),
        ),
        VaultError::RateLimited => Some("Vault is rate limiting this client".to_string()),
        _ => None,
    }
}
