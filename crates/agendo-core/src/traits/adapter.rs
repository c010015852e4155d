// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait shared by every external collaborator.

use async_trait::async_trait;

use crate::error::AgendoError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Agendo adapters.
///
/// Storage, transport, LLM and payment backends implement this trait so the
/// binary can report their identity and health uniformly.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the type of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, AgendoError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), AgendoError>;
}
