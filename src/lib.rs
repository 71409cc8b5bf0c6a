//! Protected ref access control
//!
//! Decides which actors may push to, merge into, or unprotect protected
//! branches and tags of a code hosting project.
//!
//! ## Features
//!
//! - **Wildcard ref patterns** - `release/*` style names, `*` spans `/`
//! - **Per-action access rules** by role threshold, user, group, or deploy key
//! - **Empty repository bootstrap** so the first push of a protected default
//!   branch is still governed
//! - **Policy extensions** layered in front of the default decision sequence
//! - **Layered configuration** via TOML files and environment variables
//!
//! ## Decision Model
//!
//! ```text
//! extensions → empty repository bootstrap → matching specs (OR'd) → deny
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [project]
//! default_branch = "main"
//!
//! [[protected_refs]]
//! name = "main"
//! push = [{ role = "maintainer" }]
//! merge = [{ role = "developer" }]
//!
//! [[protected_refs]]
//! name = "v*"
//! kind = "tag"
//! push = [{ group = 12 }]
//! unprotect = [{ role = "owner" }]
//! ```
//!
//! The engine is pure: it only reads the snapshot it is handed and never
//! performs I/O, so one evaluator can serve many threads.

pub mod access_control;
pub mod config;
pub mod error;
pub mod output;

// Re-export main types
pub use access_control::{AccessDecision, AccessEvaluator, AccessRequest, ProjectSnapshot};
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
