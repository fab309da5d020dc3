//! Shared types, error model, and configuration for relnotes.
//!
//! This crate is the foundation depended on by all other relnotes crates.
//! It provides:
//! - [`ReleaseNotesError`], the unified error type
//! - Domain types ([`LockedDependency`], [`ChangeRecord`])
//! - Configuration ([`AppConfig`] from TOML, [`BuildContext`] from the environment)

pub mod config;
pub mod context;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ChangelogConfig, GithubConfig, LockfileConfig, RuntimesConfig, TemplateConfig,
    config_dir, config_file_path, load_config, load_config_from,
};
pub use context::{AccessToken, BuildContext, EnvVarStatus, REQUIRED_VARS, RunMode, report_env};
pub use error::{ReleaseNotesError, Result};
pub use types::{ChangeRecord, LockedDependency};
