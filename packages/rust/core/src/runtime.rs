//! Runtime build artifacts produced by earlier workflow jobs.
//!
//! Each runtime contributes its srtool report, downloaded to
//! `<workspace>/<name>-srtool-json/<name>_srtool_output.json`, and the
//! `spec_version` declared in `<checkout>/runtime/<name>/src/lib.rs`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use relnotes_shared::{ReleaseNotesError, Result, RuntimesConfig};
use serde::Serialize;
use tracing::{debug, instrument};

/// Matches the `spec_version: 1234,` field of a `RuntimeVersion` literal.
static SPEC_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*spec_version:\s*(\d+)").expect("spec_version regex")
});

/// Build metadata of one runtime, exposed to the template as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeArtifact {
    /// Runtime name, e.g. `tidechain`.
    pub name: String,
    /// Declared `spec_version`.
    pub spec_version: u32,
    /// Parsed srtool report.
    pub srtool: serde_json::Value,
}

/// `<workspace>/<name>-srtool-json/<name>_srtool_output.json`
pub fn srtool_output_path(workspace: &Path, name: &str) -> PathBuf {
    workspace
        .join(format!("{name}-srtool-json"))
        .join(format!("{name}_srtool_output.json"))
}

/// `<checkout>/runtime/<name>/src/lib.rs`
pub fn runtime_source_path(checkout: &Path, name: &str) -> PathBuf {
    checkout.join("runtime").join(name).join("src").join("lib.rs")
}

/// Read an srtool report. The document must be a JSON object.
pub fn read_srtool_output(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ReleaseNotesError::io(path, e))?;
    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        ReleaseNotesError::parse(format!("invalid srtool output {}: {e}", path.display()))
    })?;

    if !value.is_object() {
        return Err(ReleaseNotesError::parse(format!(
            "srtool output {} is not a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

/// Extract `spec_version` from runtime source text.
pub fn parse_spec_version(source: &str) -> Option<u32> {
    SPEC_VERSION_RE
        .captures(source)
        .and_then(|caps| caps[1].parse().ok())
}

/// Read the `spec_version` declared by a runtime crate.
pub fn read_spec_version(path: &Path) -> Result<u32> {
    let source = std::fs::read_to_string(path).map_err(|e| ReleaseNotesError::io(path, e))?;
    parse_spec_version(&source).ok_or_else(|| {
        ReleaseNotesError::lookup(format!("no spec_version found in {}", path.display()))
    })
}

/// Load one runtime's artifacts.
#[instrument(skip(workspace, checkout))]
pub fn load_runtime(name: &str, workspace: &Path, checkout: &Path) -> Result<RuntimeArtifact> {
    let spec_version = read_spec_version(&runtime_source_path(checkout, name))?;
    let srtool = read_srtool_output(&srtool_output_path(workspace, name))?;
    debug!(spec_version, "runtime loaded");

    Ok(RuntimeArtifact {
        name: name.to_string(),
        spec_version,
        srtool,
    })
}

/// Load every configured runtime, in configuration order.
pub fn load_runtimes(workspace: &Path, config: &RuntimesConfig) -> Result<Vec<RuntimeArtifact>> {
    let checkout = workspace.join(&config.checkout_dir);
    config
        .names
        .iter()
        .map(|name| load_runtime(name, workspace, &checkout))
        .collect()
}
