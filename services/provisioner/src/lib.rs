//! Vault KV provisioner.
//!
//! Runs a fixed, strictly sequential workflow against a Vault server:
//! enable a KV v2 engine, write a secret, read it back to verify it, and
//! hand the token to an external caller. Every step runs once; the first
//! failure ends the run.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handoff;
pub mod workflow;

pub use config::{Cli, Config, ConfigError, MountPolicy};
pub use error::{MismatchReason, Step, StepError};
pub use handoff::TokenHandoff;
pub use workflow::{
    MountOutcome, ProvisioningWorkflow, WorkflowFailure, WorkflowPlan, WorkflowReport,
    WorkflowState,
};
