// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait, registry, and role allow-lists.
//!
//! Scheduling actions exposed to the model implement [`Tool`]. The
//! [`ToolRegistry`] resolves them by name and the [`RoleAllowList`] decides
//! which names a caller's role may see or execute.

pub mod roles;
pub mod tool;

pub use roles::{RoleAllowList, ToolRole};
pub use tool::{Tool, ToolOutput, ToolRegistry, ToolScope};
