//! Shared test utilities for the provisioning workspace.
//!
//! This crate provides:
//! - Proptest generators for paths, fields and records
//! - An in-memory [`MockSecretStore`] with failure injection
//! - Test fixtures with sample data and Vault response bodies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
pub use mocks::{Failure, MockSecretStore, Operation};
