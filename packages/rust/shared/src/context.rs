//! Per-run build context read from the CI environment.
//!
//! Every value the release pipeline needs to identify *this* release comes
//! from environment variables set by the workflow. Lookups go through a
//! closure so callers (and tests) decide where variables come from.

use std::fmt;
use std::path::PathBuf;

use crate::error::{ReleaseNotesError, Result};

/// Git reference being released (e.g. `refs/tags/v1.2.3`).
pub const GITHUB_REF: &str = "GITHUB_REF";
/// API token used for every remote call.
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// Directory holding the checkout and downloaded build artifacts.
pub const GITHUB_WORKSPACE: &str = "GITHUB_WORKSPACE";
/// `owner/name` of the repository being released.
pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
/// Stable compiler version reported by an earlier workflow step.
pub const RUSTC_STABLE: &str = "RUSTC_STABLE";
/// Nightly compiler version reported by an earlier workflow step.
pub const RUSTC_NIGHTLY: &str = "RUSTC_NIGHTLY";
/// Set to `true` by the CI runner.
pub const CI: &str = "CI";

/// Variables required to build a [`BuildContext`], in reporting order.
pub const REQUIRED_VARS: [&str; 6] = [
    GITHUB_REF,
    GITHUB_TOKEN,
    GITHUB_WORKSPACE,
    GITHUB_REPOSITORY,
    RUSTC_STABLE,
    RUSTC_NIGHTLY,
];

// ---------------------------------------------------------------------------
// RunMode
// ---------------------------------------------------------------------------

/// Whether we run inside CI or on a developer machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Ci,
    Local,
}

impl RunMode {
    /// `CI=true` selects [`RunMode::Ci`]; anything else is local.
    pub fn detect(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(CI).as_deref() {
            Some("true") => Self::Ci,
            _ => Self::Local,
        }
    }

    pub fn is_local(self) -> bool {
        self == Self::Local
    }
}

// ---------------------------------------------------------------------------
// AccessToken
// ---------------------------------------------------------------------------

/// API token. Never rendered by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<redacted, {} bytes>)", self.0.len())
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Presence report for one environment variable. Values are never captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVarStatus {
    pub name: &'static str,
    pub set: bool,
    pub len: usize,
}

/// Report which required variables are set, and their lengths.
///
/// Meant for local runs: it never fails, so a developer sees the whole
/// picture before [`BuildContext::from_lookup`] rejects the environment.
pub fn report_env(lookup: impl Fn(&str) -> Option<String>) -> Vec<EnvVarStatus> {
    tracing::debug!("running locally");
    REQUIRED_VARS
        .iter()
        .map(|&name| {
            let len = lookup(name).map(|v| v.len()).unwrap_or(0);
            let status = EnvVarStatus {
                name,
                set: len > 0,
                len,
            };
            tracing::debug!(var = name, set = status.set, len, "environment variable");
            status
        })
        .collect()
}

// ---------------------------------------------------------------------------
// BuildContext
// ---------------------------------------------------------------------------

/// Immutable identifiers of the release being built.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Reference being released, e.g. `refs/tags/v1.2.3`.
    pub current_ref: String,
    /// `owner/name` of the released repository.
    pub repository: String,
    /// API credentials.
    pub token: AccessToken,
    /// Workflow workspace root.
    pub workspace: PathBuf,
    /// `rustc` stable version string.
    pub rustc_stable: String,
    /// `rustc` nightly version string.
    pub rustc_nightly: String,
}

impl BuildContext {
    /// Build the context from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the context from an arbitrary variable source.
    ///
    /// Empty values count as missing. All missing variables are reported in
    /// one error rather than failing on the first.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| get(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ReleaseNotesError::config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let require = |name: &str| {
            get(name).ok_or_else(|| ReleaseNotesError::config(format!("{name} is not set")))
        };

        Ok(Self {
            current_ref: require(GITHUB_REF)?,
            repository: require(GITHUB_REPOSITORY)?,
            token: AccessToken::new(require(GITHUB_TOKEN)?),
            workspace: PathBuf::from(require(GITHUB_WORKSPACE)?),
            rustc_stable: require(RUSTC_STABLE)?,
            rustc_nightly: require(RUSTC_NIGHTLY)?,
        })
    }
}
