//! Provisioning workflow: state machine and runner.

mod runner;
mod state;

pub use runner::{MountOutcome, ProvisioningWorkflow, WorkflowFailure, WorkflowPlan, WorkflowReport};
pub use state::{StateTracker, WorkflowState};
