//! Application configuration for relnotes.
//!
//! An optional config file lives at `~/.relnotes/relnotes.toml` (or wherever
//! `--config` points). CLI flags override config file values, which override
//! defaults. Per-run identifiers come from the environment, see
//! [`crate::context`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReleaseNotesError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "relnotes.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".relnotes";

// ---------------------------------------------------------------------------
// Config structs (matching relnotes.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source-hosting API settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Where to find the pinned dependency.
    #[serde(default)]
    pub lockfile: LockfileConfig,

    /// Changelog differencing and classification.
    #[serde(default)]
    pub changelog: ChangelogConfig,

    /// Runtime build artifacts to include.
    #[serde(default)]
    pub runtimes: RuntimesConfig,

    /// Release note template.
    #[serde(default)]
    pub template: TemplateConfig,
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[lockfile]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockfileConfig {
    /// Lockfile path inside the repository.
    #[serde(default = "default_lockfile_path")]
    pub path: String,

    /// Package whose pinned revision identifies the paired repository commit.
    #[serde(default = "default_lockfile_package")]
    pub package: String,
}

impl Default for LockfileConfig {
    fn default() -> Self {
        Self {
            path: default_lockfile_path(),
            package: default_lockfile_package(),
        }
    }
}

fn default_lockfile_path() -> String {
    "Cargo.lock".into()
}
fn default_lockfile_package() -> String {
    "sc-cli".into()
}

/// `[changelog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogConfig {
    /// Whether to compute the changelog between the last release and the current ref.
    #[serde(default)]
    pub enabled: bool,

    /// Repository pinned through the lockfile (e.g. `tide-labs/substrate`).
    #[serde(default = "default_paired_repository")]
    pub paired_repository: String,

    /// Case-insensitive title substring marking cross-repository companion changes.
    #[serde(default = "default_companion_pattern")]
    pub companion_pattern: String,

    /// Label tagging release-notable changes.
    #[serde(default = "default_release_notes_label")]
    pub release_notes_label: String,

    /// Label tagging client-notable changes.
    #[serde(default = "default_client_label")]
    pub client_label: String,

    /// Label tagging runtime-notable changes.
    #[serde(default = "default_runtime_label")]
    pub runtime_label: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            paired_repository: default_paired_repository(),
            companion_pattern: default_companion_pattern(),
            release_notes_label: default_release_notes_label(),
            client_label: default_client_label(),
            runtime_label: default_runtime_label(),
        }
    }
}

fn default_paired_repository() -> String {
    "tide-labs/substrate".into()
}
fn default_companion_pattern() -> String {
    "companion".into()
}
fn default_release_notes_label() -> String {
    "B1-releasenotes".into()
}
fn default_client_label() -> String {
    "B5-clientnoteworthy".into()
}
fn default_runtime_label() -> String {
    "B7-runtimenoteworthy".into()
}

/// `[runtimes]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimesConfig {
    /// Repository checkout directory, relative to `GITHUB_WORKSPACE`.
    #[serde(default = "default_checkout_dir")]
    pub checkout_dir: String,

    /// Runtime names; each expects `<name>-srtool-json/<name>_srtool_output.json`.
    #[serde(default = "default_runtime_names")]
    pub names: Vec<String>,
}

impl Default for RuntimesConfig {
    fn default() -> Self {
        Self {
            checkout_dir: default_checkout_dir(),
            names: default_runtime_names(),
        }
    }
}

fn default_checkout_dir() -> String {
    "tidechain".into()
}
fn default_runtime_names() -> Vec<String> {
    vec!["tidechain".into(), "hertel".into()]
}

/// `[template]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Template file overriding the built-in release template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.relnotes/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReleaseNotesError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.relnotes/relnotes.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ReleaseNotesError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ReleaseNotesError::config(format!("failed to parse {}: {e}", path.display()))
    })
}
