//! Shared library for cross-cutting concerns in the provisioning workspace.
//!
//! This crate provides centralized implementations for:
//! - Error types with retryability classification
//! - HTTP client configuration and building
//! - Tracing subscriber initialisation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{HttpConfig, build_http_client, classify_transport_error};
pub use tracing_config::{LogFormat, TracingConfig, init_tracing};
