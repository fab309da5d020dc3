//! Response payloads of the REST endpoints we call.
//!
//! Only the fields the release pipeline reads are modelled; serde ignores the rest.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use relnotes_shared::{ReleaseNotesError, Result};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Contents
// ---------------------------------------------------------------------------

/// `GET /repos/{repo}/contents/{path}` for a single file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileContents {
    pub path: String,
    /// Payload; base64 wrapped at 60 columns for `encoding = "base64"`.
    #[serde(default)]
    pub content: String,
    /// `"base64"`, or `"none"` when the file exceeds the inline size limit.
    #[serde(default)]
    pub encoding: String,
}

impl FileContents {
    /// Decode the payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        if self.encoding != "base64" {
            return Err(ReleaseNotesError::parse(format!(
                "{}: unsupported content encoding '{}'",
                self.path, self.encoding
            )));
        }

        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        BASE64
            .decode(compact)
            .map_err(|e| ReleaseNotesError::parse(format!("{}: invalid base64: {e}", self.path)))
    }

    /// Decode the payload as UTF-8 text.
    pub fn decode_utf8(&self) -> Result<String> {
        String::from_utf8(self.decode()?)
            .map_err(|e| ReleaseNotesError::parse(format!("{}: not UTF-8: {e}", self.path)))
    }
}

// ---------------------------------------------------------------------------
// Releases
// ---------------------------------------------------------------------------

/// `GET /repos/{repo}/releases/latest`.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
}

// ---------------------------------------------------------------------------
// Compare
// ---------------------------------------------------------------------------

/// `GET /repos/{repo}/compare/{base}...{head}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Comparison {
    /// Commits in the whole range; `commits` holds at most one page of them.
    #[serde(default)]
    pub total_commits: u64,
    #[serde(default)]
    pub commits: Vec<CommitSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

/// `GET /repos/{repo}/pulls/{number}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    /// Set once the pull request has been merged.
    #[serde(default)]
    pub merged_at: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(content: &str, encoding: &str) -> FileContents {
        FileContents {
            path: "Cargo.lock".into(),
            content: content.into(),
            encoding: encoding.into(),
        }
    }

    #[test]
    fn decode_ignores_line_wrapping() {
        // "version = 3\n" split across lines the way the API wraps it
        let file = contents("dmVyc2lv\nbiA9IDMK\n", "base64");
        assert_eq!(file.decode_utf8().unwrap(), "version = 3\n");
    }

    #[test]
    fn decode_rejects_inline_size_overflow() {
        let file = contents("", "none");
        let err = file.decode().unwrap_err();
        assert!(err.to_string().contains("unsupported content encoding 'none'"));
    }

    #[test]
    fn decode_rejects_garbage() {
        let file = contents("!!not base64!!", "base64");
        assert!(matches!(file.decode(), Err(ReleaseNotesError::Parse { .. })));
    }

    #[test]
    fn pull_request_merge_state() {
        let pr: PullRequest = serde_json::from_str(
            r#"{"number": 7, "title": "t", "html_url": "u", "merged_at": null, "labels": []}"#,
        )
        .unwrap();
        assert!(!pr.is_merged());
    }
}
