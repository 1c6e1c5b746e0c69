//! Locates Bazel runfiles at runtime.
//!
//! [`rlocation`] resolves a path relative to the main repository through a
//! process-wide index that is built from the environment on first use.
//! [`Runfiles`] exposes the underlying index for callers that need other
//! repositories, an unmapped view, or the variables to hand to a child
//! process.

pub mod config;
pub mod errors;
pub mod manifest;
pub mod repo;
pub mod repo_mapping;
pub mod runfiles;

pub use config::{RunfilesEnv, RunfilesLocation};
pub use errors::{Result, RunfilesError};
pub use manifest::Manifest;
pub use repo::{rlocation, RunfileResolver, MAIN_REPOSITORY, SOURCE_REPOSITORY};
pub use repo_mapping::RepoMapping;
pub use runfiles::{Runfiles, RunfilesKind};
