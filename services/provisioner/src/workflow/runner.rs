//! Provisioning workflow runner.
//!
//! Drives a [`SecretStore`] through the fixed step sequence. Each step runs
//! exactly once and only after the previous one succeeded; the first error
//! moves the run to [`WorkflowState::Failed`] and is returned as a
//! [`WorkflowFailure`].

use super::state::{StateTracker, WorkflowState};
use crate::config::{Config, MountPolicy};
use crate::error::{MismatchReason, Step, StepError};
use crate::handoff::TokenHandoff;
use kv_vault_client::{
    EngineType, MountInfo, MountPath, SecretPath, SecretRecord, SecretStore, VersionMetadata,
};
use std::io::Write;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// What to provision.
#[derive(Debug, Clone)]
pub struct WorkflowPlan {
    /// Engine mount
    pub mount: MountPath,
    /// Secret path under the mount
    pub path: SecretPath,
    /// Record to write
    pub record: SecretRecord,
    /// Fields that must be present and non-empty after the read-back
    pub required_fields: Vec<String>,
    /// Existing-mount handling
    pub mount_policy: MountPolicy,
    /// Look up the token before touching any mount
    pub verify_token: bool,
}

impl WorkflowPlan {
    /// Plan with default policies.
    #[must_use]
    pub const fn new(mount: MountPath, path: SecretPath, record: SecretRecord) -> Self {
        Self {
            mount,
            path,
            record,
            required_fields: Vec::new(),
            mount_policy: MountPolicy::Fail,
            verify_token: false,
        }
    }

    /// Set the required fields.
    #[must_use]
    pub fn with_required_fields(mut self, fields: Vec<String>) -> Self {
        self.required_fields = fields;
        self
    }

    /// Set the mount policy.
    #[must_use]
    pub const fn with_mount_policy(mut self, policy: MountPolicy) -> Self {
        self.mount_policy = policy;
        self
    }

    /// Enable the token lookup.
    #[must_use]
    pub const fn with_verify_token(mut self, verify: bool) -> Self {
        self.verify_token = verify;
        self
    }
}

impl From<&Config> for WorkflowPlan {
    fn from(config: &Config) -> Self {
        Self::new(
            config.mount.clone(),
            config.secret_path.clone(),
            config.record.clone(),
        )
        .with_required_fields(config.required_fields.clone())
        .with_mount_policy(config.mount_policy)
        .with_verify_token(config.verify_token)
    }
}

/// How the engine step was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// A new KV v2 engine was mounted
    Created,
    /// An existing KV v2 engine was kept
    Reused,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    /// Run identifier, also on every log line of the run
    pub run_id: Uuid,
    /// Final state, always [`WorkflowState::Done`]
    pub state: WorkflowState,
    /// Engine step outcome
    pub mount: MountOutcome,
    /// Metadata returned by the write
    pub written: VersionMetadata,
    /// Metadata returned by the read-back
    pub verified: VersionMetadata,
    /// Record as read back
    pub record: SecretRecord,
    /// Token and endpoint printed for the operator
    pub handoff: TokenHandoff,
    /// States visited
    pub history: Vec<WorkflowState>,
}

/// Result of a failed run.
#[derive(Error, Debug)]
#[error("provisioning failed at {step}: {error}")]
pub struct WorkflowFailure {
    /// Run identifier
    pub run_id: Uuid,
    /// Step that failed
    pub step: Step,
    /// Final state, always [`WorkflowState::Failed`]
    pub state: WorkflowState,
    /// Last state reached before the failure
    pub last_completed: WorkflowState,
    /// Cause
    #[source]
    pub error: StepError,
    /// States visited
    pub history: Vec<WorkflowState>,
}

/// Output of the steps that return data.
struct Completed {
    mount: MountOutcome,
    written: VersionMetadata,
    verified: VersionMetadata,
    record: SecretRecord,
}

/// One provisioning run against `S`.
pub struct ProvisioningWorkflow<'a, S> {
    store: &'a S,
    plan: WorkflowPlan,
    handoff: TokenHandoff,
    tracker: StateTracker,
    step: Step,
    run_id: Uuid,
}

impl<'a, S: SecretStore> ProvisioningWorkflow<'a, S> {
    /// Prepare a run. The store already carries the credential.
    #[must_use]
    pub fn new(store: &'a S, plan: WorkflowPlan, handoff: TokenHandoff) -> Self {
        Self {
            store,
            plan,
            handoff,
            tracker: StateTracker::new(),
            step: Step::SetCredential,
            run_id: Uuid::new_v4(),
        }
    }

    /// Execute every step in order, printing the token handoff to `out`.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowFailure`] carrying the first step error.
    pub async fn run(mut self, out: &mut impl Write) -> Result<WorkflowReport, WorkflowFailure> {
        let span = info_span!(
            "provision",
            run_id = %self.run_id,
            mount = %self.plan.mount,
            path = %self.plan.path,
        );

        let result = self.execute(out).instrument(span.clone()).await;
        let _entered = span.enter();

        match result {
            Ok(done) => {
                info!(outcome = ?done.mount, version = done.written.version, "Provisioning complete");
                Ok(WorkflowReport {
                    run_id: self.run_id,
                    state: self.tracker.current(),
                    mount: done.mount,
                    written: done.written,
                    verified: done.verified,
                    record: done.record,
                    handoff: self.handoff,
                    history: self.tracker.into_history(),
                })
            }
            Err(error) => {
                self.tracker.fail(self.step);
                error!(
                    step = %self.step,
                    code = error.code(),
                    retryable = error.is_retryable(),
                    error = %error,
                    "Provisioning step failed"
                );
                Err(WorkflowFailure {
                    run_id: self.run_id,
                    step: self.step,
                    state: self.tracker.current(),
                    last_completed: self.tracker.last_completed(),
                    error,
                    history: self.tracker.into_history(),
                })
            }
        }
    }

    async fn execute(&mut self, out: &mut impl Write) -> Result<Completed, StepError> {
        info!(step = %Step::SetCredential, "Credential set");

        if self.plan.verify_token {
            self.step = Step::VerifyCredential;
            self.verify_credential().await?;
        }

        self.step = Step::EnableEngine;
        let mount = self.enable_engine().await?;
        self.tracker.advance(WorkflowState::EngineEnabled)?;

        self.step = Step::WriteSecret;
        let written = self.write_secret().await?;
        self.tracker.advance(WorkflowState::SecretWritten)?;

        self.step = Step::ReadSecret;
        let (record, verified) = self.read_secret(&written).await?;
        self.tracker.advance(WorkflowState::SecretVerified)?;

        self.step = Step::EmitToken;
        self.handoff.write_to(out)?;
        info!(step = %Step::EmitToken, "Token handed off");
        self.tracker.advance(WorkflowState::Done)?;

        Ok(Completed {
            mount,
            written,
            verified,
            record,
        })
    }

    async fn verify_credential(&self) -> Result<(), StepError> {
        let info = self
            .store
            .lookup_self()
            .await
            .map_err(|e| StepError::from_vault(Step::VerifyCredential, "auth/token/lookup-self", e))?;
        info!(
            step = %Step::VerifyCredential,
            policies = info.policies.len(),
            ttl_secs = info.ttl.as_secs(),
            renewable = info.renewable,
            "Credential verified"
        );
        Ok(())
    }

    async fn enable_engine(&self) -> Result<MountOutcome, StepError> {
        let mount = &self.plan.mount;

        if self.plan.mount_policy == MountPolicy::Reuse {
            let existing = self
                .store
                .mount_info(mount)
                .await
                .map_err(|e| StepError::from_vault(Step::EnableEngine, mount.as_str(), e))?;
            match existing {
                Some(info) if info.is(EngineType::KvV2) => {
                    info!(step = %Step::EnableEngine, "Reusing existing KV v2 engine");
                    return Ok(MountOutcome::Reused);
                }
                Some(info) => {
                    warn!(engine = %info.engine_type, "Mount path taken by another engine");
                    return Err(StepError::MountConflict {
                        mount: mount.to_string(),
                        existing: Some(describe(&info)),
                    });
                }
                None => {}
            }
        }

        self.store
            .enable_kv_v2(mount)
            .await
            .map_err(|e| StepError::from_vault(Step::EnableEngine, mount.as_str(), e))?;
        info!(step = %Step::EnableEngine, "KV v2 engine enabled");
        Ok(MountOutcome::Created)
    }

    async fn write_secret(&self) -> Result<VersionMetadata, StepError> {
        let plan = &self.plan;
        let metadata = self
            .store
            .write_secret(&plan.mount, &plan.path, &plan.record)
            .await
            .map_err(|e| {
                StepError::from_vault(Step::WriteSecret, &plan.path.data_endpoint(&plan.mount), e)
            })?;
        info!(
            step = %Step::WriteSecret,
            fields = ?plan.record.field_names().collect::<Vec<_>>(),
            version = metadata.version,
            "Secret written"
        );
        Ok(metadata)
    }

    async fn read_secret(
        &self,
        written: &VersionMetadata,
    ) -> Result<(SecretRecord, VersionMetadata), StepError> {
        let plan = &self.plan;
        let endpoint = plan.path.data_endpoint(&plan.mount);
        let (record, metadata) = self
            .store
            .read_secret(&plan.mount, &plan.path)
            .await
            .map_err(|e| StepError::from_vault(Step::ReadSecret, &endpoint, e))?;

        if let Some(reason) = verify(plan, written, &record, &metadata) {
            return Err(StepError::VerificationMismatch {
                path: endpoint,
                reason,
            });
        }

        info!(
            step = %Step::ReadSecret,
            fields = record.len(),
            version = metadata.version,
            "Secret verified"
        );
        Ok((record, metadata))
    }
}

/// Compare a read-back against the write; `None` means it matches.
fn verify(
    plan: &WorkflowPlan,
    written: &VersionMetadata,
    read: &SecretRecord,
    metadata: &VersionMetadata,
) -> Option<MismatchReason> {
    let differing = plan.record.differing_fields(read);
    if !differing.is_empty() {
        return Some(MismatchReason::FieldsDiffer(differing));
    }
    if metadata.version < written.version {
        return Some(MismatchReason::VersionRegressed {
            written: written.version,
            read: metadata.version,
        });
    }
    let missing: Vec<String> = plan
        .required_fields
        .iter()
        .filter(|name| !read.has_value(name.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Some(MismatchReason::MissingRequired(missing));
    }
    None
}

fn describe(info: &MountInfo) -> String {
    match info.options.get("version") {
        Some(version) => format!("{} version {version}", info.engine_type),
        None => info.engine_type.clone(),
    }
}
