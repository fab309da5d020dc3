//! Core domain types for release notes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LockedDependency
// ---------------------------------------------------------------------------

/// A `[[package]]` entry of a Cargo lockfile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedDependency {
    /// Crate name.
    pub name: String,
    /// Resolved version.
    #[serde(default)]
    pub version: String,
    /// Source URL, absent for path dependencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LockedDependency {
    /// The revision pinned in the source URL: everything after the first `#`.
    ///
    /// `git+https://github.com/org/repo?branch=x#abcdef` yields `abcdef`.
    pub fn pinned_revision(&self) -> Option<&str> {
        self.source
            .as_deref()
            .and_then(|source| source.split_once('#'))
            .map(|(_, rev)| rev)
    }
}

// ---------------------------------------------------------------------------
// ChangeRecord
// ---------------------------------------------------------------------------

/// A merged change request between two references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Change request number within its repository.
    pub number: u64,
    /// Title as written by the author.
    pub title: String,
    /// Link to the change request.
    pub url: String,
    /// `owner/name` of the originating repository.
    pub repository: String,
    /// Label names attached to the change request.
    pub labels: BTreeSet<String>,
    /// Display title, annotated during classification.
    pub pretty_title: String,
}

impl ChangeRecord {
    /// Whether the record carries `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(source: Option<&str>) -> LockedDependency {
        LockedDependency {
            name: "sc-cli".into(),
            version: "0.10.0-dev".into(),
            source: source.map(String::from),
        }
    }

    #[test]
    fn pinned_revision_after_first_hash() {
        let d = dep(Some(
            "git+https://github.com/tide-labs/substrate?branch=tidechain#abcdef123456",
        ));
        assert_eq!(d.pinned_revision(), Some("abcdef123456"));
    }

    #[test]
    fn pinned_revision_keeps_later_hashes() {
        let d = dep(Some("git+https://example.com/repo#abc#def"));
        assert_eq!(d.pinned_revision(), Some("abc#def"));
    }

    #[test]
    fn registry_source_has_no_revision() {
        let d = dep(Some("registry+https://github.com/rust-lang/crates.io-index"));
        assert_eq!(d.pinned_revision(), None);
        assert_eq!(dep(None).pinned_revision(), None);
    }

    #[test]
    fn lockfile_entry_deserializes() {
        let d: LockedDependency = toml::from_str(
            r#"
name = "sc-cli"
version = "0.10.0-dev"
source = "git+https://github.com/tide-labs/substrate?branch=tidechain#0123abc"
dependencies = ["array-bytes"]
"#,
        )
        .expect("parse package entry");
        assert_eq!(d.name, "sc-cli");
        assert_eq!(d.pinned_revision(), Some("0123abc"));
    }
}
