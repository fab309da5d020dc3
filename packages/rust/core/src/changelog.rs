//! Changelog between two references: retrieval, merging and classification.
//!
//! Retrieval walks the commits of a comparison, resolves each merge
//! reference (`(#N)` squash suffix or `Merge pull request #N` subject) to its
//! pull request and keeps the merged ones. References that do not exist in
//! the repository, such as upstream numbers carried by a fork, are skipped. Classification
//! is pure: buckets by label, one audit prefix per runtime change, and the
//! release priority from client changes.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use relnotes_github::GithubClient;
use relnotes_shared::{ChangeRecord, ChangelogConfig, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Matches the `(#1234)` reference squash merges append to the subject line.
static PR_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(#(\d+)\)").expect("PR reference regex"));

/// Matches the subject of a merge commit created by the merge button.
static MERGE_COMMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Merge pull request #(\d+) from ").expect("merge commit regex"));

// ---------------------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------------------

/// Merged change requests of `repository` between `base` and `head`.
///
/// With `prefixed`, the repository short name is shown in the display link,
/// which keeps records of the paired repository distinguishable once merged.
#[instrument(skip(client))]
pub async fn fetch_changes(
    client: &GithubClient,
    repository: &str,
    base: &str,
    head: &str,
    prefixed: bool,
) -> Result<Vec<ChangeRecord>> {
    let comparison = client.compare(repository, base, head).await?;
    let numbers = pull_request_numbers(comparison.commits.iter().map(|c| c.commit.message.as_str()));

    info!(
        commits = comparison.commits.len(),
        pull_requests = numbers.len(),
        "comparison fetched"
    );

    let prefix = if prefixed {
        repository.rsplit('/').next().unwrap_or(repository)
    } else {
        ""
    };

    let mut changes = Vec::with_capacity(numbers.len());
    for number in numbers {
        let pr = match client.pull_request(repository, number).await {
            Ok(pr) => pr,
            Err(e) if e.is_not_found() => {
                debug!(number, %repository, "no such pull request, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };
        if !pr.is_merged() {
            debug!(number, "skipping unmerged pull request");
            continue;
        }

        let pretty_title = format!("{} ([{prefix}#{}]({}))", pr.title, pr.number, pr.html_url);
        changes.push(ChangeRecord {
            number: pr.number,
            title: pr.title,
            url: pr.html_url,
            repository: repository.to_string(),
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
            pretty_title,
        });
    }

    Ok(changes)
}

/// Distinct pull request numbers referenced by commit subjects, first occurrence order.
///
/// A merge-button subject names its pull request directly. Otherwise, when a
/// subject carries several `(#N)` references the last one wins; earlier ones
/// are usually cherry-picked originals.
pub(crate) fn pull_request_numbers<'m>(messages: impl Iterator<Item = &'m str>) -> Vec<u64> {
    let mut seen = HashSet::new();
    let mut numbers = Vec::new();

    for message in messages {
        let subject = message.lines().next().unwrap_or_default();
        let Some(number) = MERGE_COMMIT_RE
            .captures(subject)
            .or_else(|| PR_REF_RE.captures_iter(subject).last())
            .and_then(|caps| caps[1].parse::<u64>().ok())
        else {
            continue;
        };

        if seen.insert(number) {
            numbers.push(number);
        }
    }

    numbers
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Case-insensitive substring match on the title.
pub fn is_companion(change: &ChangeRecord, pattern: &str) -> bool {
    change.title.to_lowercase().contains(&pattern.to_lowercase())
}

/// Concatenate both repositories' changes, dropping companion changes.
pub fn merge_changes(
    primary: Vec<ChangeRecord>,
    paired: Vec<ChangeRecord>,
    companion_pattern: &str,
) -> Vec<ChangeRecord> {
    primary
        .into_iter()
        .chain(paired)
        .filter(|c| !is_companion(c, companion_pattern))
        .collect()
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Records carrying `label`, in input order.
pub fn changes_with_label(changes: &[ChangeRecord], label: &str) -> Vec<ChangeRecord> {
    changes.iter().filter(|c| c.has_label(label)).cloned().collect()
}

/// Audit state of a runtime change, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Audited,
    NotLive,
    Trivial,
    PendingNonCriticalAudit,
    NeedsAudit,
    Unknown,
}

/// Audit labels, highest precedence first.
const AUDIT_LABELS: [(&str, AuditStatus); 5] = [
    ("D1-audited 👍", AuditStatus::Audited),
    ("D2-notlive 💤", AuditStatus::NotLive),
    ("D3-trivial 🧸", AuditStatus::Trivial),
    ("D5-nicetohaveaudit ⚠️", AuditStatus::PendingNonCriticalAudit),
    ("D9-needsaudit 👮", AuditStatus::NeedsAudit),
];

impl AuditStatus {
    /// Highest-precedence audit label present, or [`AuditStatus::Unknown`].
    pub fn from_labels(labels: &BTreeSet<String>) -> Self {
        AUDIT_LABELS
            .iter()
            .find(|(label, _)| labels.contains(*label))
            .map(|(_, status)| *status)
            .unwrap_or(Self::Unknown)
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Audited => "✅ `audited`",
            Self::NotLive => "✅ `not live`",
            Self::Trivial => "✅ `trivial`",
            Self::PendingNonCriticalAudit => "⏳ `pending non-critical audit`",
            Self::NeedsAudit => "❌ `AWAITING AUDIT`",
            Self::Unknown => "⭕️ `unknown audit requirements`",
        }
    }
}

/// Prefix each record's display title with its audit status.
pub fn annotate_audit_status(changes: &mut [ChangeRecord]) {
    for change in changes {
        let status = AuditStatus::from_labels(&change.labels);
        change.pretty_title = format!("{} {}", status.prefix(), change.pretty_title);
    }
}

/// One row of the upgrade priority table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReleasePriority {
    /// Ordering key; higher is more urgent.
    pub value: u8,
    /// Label that marks a change with this priority.
    pub label: &'static str,
    /// Short name shown in the release note.
    pub name: &'static str,
    /// Guidance for node operators.
    pub text: &'static str,
}

/// Upgrade priorities, ascending.
pub const PRIORITIES: [ReleasePriority; 4] = [
    ReleasePriority {
        value: 1,
        label: "C1-low 📌",
        name: "Low",
        text: "upgrade at your convenience",
    },
    ReleasePriority {
        value: 3,
        label: "C3-medium 📣",
        name: "Medium",
        text: "upgrade within a few days",
    },
    ReleasePriority {
        value: 7,
        label: "C7-high ❗️",
        name: "High",
        text: "upgrade as soon as possible",
    },
    ReleasePriority {
        value: 9,
        label: "C9-critical ‼️",
        name: "Critical",
        text: "upgrade immediately",
    },
];

impl Default for ReleasePriority {
    fn default() -> Self {
        PRIORITIES[0]
    }
}

/// Most urgent priority label carried by any of `changes`; lowest priority if none.
pub fn highest_priority(changes: &[ChangeRecord]) -> ReleasePriority {
    PRIORITIES
        .iter()
        .rev()
        .find(|p| changes.iter().any(|c| c.has_label(p.label)))
        .copied()
        .unwrap_or_default()
}

/// Changes split into the buckets the release note shows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Changelog {
    pub release_notes: Vec<ChangeRecord>,
    pub client: Vec<ChangeRecord>,
    pub runtime: Vec<ChangeRecord>,
    pub priority: ReleasePriority,
}

/// Bucket, annotate and prioritise already merged changes.
pub fn classify(changes: &[ChangeRecord], config: &ChangelogConfig) -> Changelog {
    let release_notes = changes_with_label(changes, &config.release_notes_label);
    let client = changes_with_label(changes, &config.client_label);
    let mut runtime = changes_with_label(changes, &config.runtime_label);
    annotate_audit_status(&mut runtime);
    let priority = highest_priority(&client);

    info!(
        total = changes.len(),
        release_notes = release_notes.len(),
        client = client.len(),
        runtime = runtime.len(),
        priority = priority.name,
        "changelog classified"
    );

    Changelog {
        release_notes,
        client,
        runtime,
        priority,
    }
}
