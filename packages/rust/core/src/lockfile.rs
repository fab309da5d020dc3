//! Lockfile inspection: which revision of the paired repository a release pins.
//!
//! The released repository depends on the paired repository through git
//! dependencies, so the `source` of any of its crates in `Cargo.lock` carries
//! the pinned commit after a `#`.

use relnotes_github::GithubClient;
use relnotes_shared::{LockedDependency, LockfileConfig, ReleaseNotesError, Result};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// Parsed `Cargo.lock`.
#[derive(Debug, Clone, Deserialize)]
pub struct Lockfile {
    /// Lockfile format version (absent in v1 lockfiles).
    #[serde(default)]
    pub version: Option<u32>,
    /// `[[package]]` entries in lockfile order.
    #[serde(default, rename = "package")]
    pub packages: Vec<LockedDependency>,
}

impl Lockfile {
    /// First package entry named `name`.
    pub fn find(&self, name: &str) -> Option<&LockedDependency> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Revision pinned for `name`, failing if the package or its fragment is absent.
    pub fn pinned_revision(&self, name: &str) -> Result<&str> {
        let package = self
            .find(name)
            .ok_or_else(|| ReleaseNotesError::lookup(format!("package '{name}' not found in lockfile")))?;

        let source = package.source.as_deref().ok_or_else(|| {
            ReleaseNotesError::lookup(format!("package '{name}' has no source in lockfile"))
        })?;

        package.pinned_revision().ok_or_else(|| {
            ReleaseNotesError::lookup(format!(
                "source of package '{name}' has no '#' revision: {source}"
            ))
        })
    }
}

/// Parse lockfile text.
pub fn parse_lockfile(content: &str) -> Result<Lockfile> {
    toml::from_str(content).map_err(|e| ReleaseNotesError::parse(format!("invalid lockfile: {e}")))
}

// ---------------------------------------------------------------------------
// Inspector
// ---------------------------------------------------------------------------

/// Reads the lockfile of one repository at arbitrary references.
#[derive(Debug, Clone)]
pub struct LockfileInspector<'a> {
    client: &'a GithubClient,
    repository: String,
    config: LockfileConfig,
}

impl<'a> LockfileInspector<'a> {
    pub fn new(client: &'a GithubClient, repository: impl Into<String>, config: LockfileConfig) -> Self {
        Self {
            client,
            repository: repository.into(),
            config,
        }
    }

    /// Fetch and parse the lockfile as of `reference`.
    pub async fn lockfile_at(&self, reference: &str) -> Result<Lockfile> {
        let file = self
            .client
            .contents(&self.repository, &self.config.path, reference)
            .await?;
        let text = file.decode_utf8()?;
        debug!(bytes = text.len(), "lockfile fetched");
        parse_lockfile(&text)
    }

    /// The paired-repository commit pinned by the lockfile at `reference`.
    #[instrument(skip(self), fields(repository = %self.repository, package = %self.config.package))]
    pub async fn get_substrate_commit(&self, reference: &str) -> Result<String> {
        let lockfile = self.lockfile_at(reference).await?;
        let revision = lockfile.pinned_revision(&self.config.package)?.to_string();
        info!(%revision, "pinned revision resolved");
        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCKFILE: &str = r#"
version = 3

[[package]]
name = "array-bytes"
version = "4.2.0"
source = "registry+https://github.com/rust-lang/crates.io-index"
checksum = "f52f63c5c1316a16a4b35eaac8b76a98248961a533f061684cb2a7cb0eafb6c6"

[[package]]
name = "sc-cli"
version = "0.10.0-dev"
source = "git+https://github.com/tide-labs/substrate?branch=tidechain#abcdef123456"
dependencies = [
 "array-bytes",
]

[[package]]
name = "tidechain-runtime"
version = "0.1.0"
"#;

    #[test]
    fn finds_pinned_revision() {
        let lockfile = parse_lockfile(LOCKFILE).unwrap();
        assert_eq!(lockfile.version, Some(3));
        assert_eq!(lockfile.packages.len(), 3);
        assert_eq!(lockfile.pinned_revision("sc-cli").unwrap(), "abcdef123456");
    }

    #[test]
    fn missing_package_is_lookup_error() {
        let lockfile = parse_lockfile(LOCKFILE).unwrap();
        let err = lockfile.pinned_revision("sc-service").unwrap_err();
        assert!(matches!(err, ReleaseNotesError::Lookup { .. }));
    }

    #[test]
    fn path_dependency_has_no_revision() {
        let lockfile = parse_lockfile(LOCKFILE).unwrap();
        let err = lockfile.pinned_revision("tidechain-runtime").unwrap_err();
        assert!(err.to_string().contains("has no source"));
    }

    #[test]
    fn registry_dependency_has_no_revision() {
        let lockfile = parse_lockfile(LOCKFILE).unwrap();
        let err = lockfile.pinned_revision("array-bytes").unwrap_err();
        assert!(err.to_string().contains("no '#' revision"));
    }

    #[test]
    fn malformed_lockfile_is_parse_error() {
        let err = parse_lockfile("[[package]\nname = ").unwrap_err();
        assert!(matches!(err, ReleaseNotesError::Parse { .. }));
    }

    #[test]
    fn empty_lockfile_has_no_packages() {
        let lockfile = parse_lockfile("").unwrap();
        assert!(lockfile.packages.is_empty());
        assert!(lockfile.find("sc-cli").is_none());
    }
}
