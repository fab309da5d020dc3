//! Minimal GitHub REST client for release-note generation.
//!
//! Covers the four calls the release pipeline makes: file contents at a
//! reference, the latest release, a commit comparison, and a single pull
//! request. Every call is authenticated with the workflow token and awaited
//! on its own; there is no retry, a failed call surfaces as an error.

mod models;

use std::time::Duration;

use relnotes_shared::{AccessToken, GithubConfig, ReleaseNotesError, Result};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

pub use models::{
    CommitDetail, CommitSummary, Comparison, FileContents, Label, PullRequest, Release,
};

/// Default timeout in seconds for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// REST API version pinned in every request.
const API_VERSION: &str = "2022-11-28";

/// Commits requested per compare page (the API maximum).
const COMPARE_PAGE_SIZE: u32 = 100;

/// User-Agent string; the API rejects requests without one.
const USER_AGENT: &str = concat!("relnotes/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Client options
// ---------------------------------------------------------------------------

/// Configuration for [`GithubClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API base URL, `https://api.github.com` for github.com.
    pub api_url: String,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl From<&GithubConfig> for ClientOptions {
    fn from(config: &GithubConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated API client, built once per run.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    api_url: Url,
}

impl GithubClient {
    /// Build a client sending `Authorization: Bearer <token>` on every request.
    pub fn new(token: &AccessToken, opts: &ClientOptions) -> Result<Self> {
        let api_url = Url::parse(&opts.api_url).map_err(|e| {
            ReleaseNotesError::config(format!("invalid API URL '{}': {e}", opts.api_url))
        })?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| ReleaseNotesError::config("access token is not a valid header value"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| ReleaseNotesError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, api_url })
    }

    /// Fetch a file's contents at `reference` (tag, branch or commit).
    #[instrument(skip(self))]
    pub async fn contents(&self, repo: &str, path: &str, reference: &str) -> Result<FileContents> {
        let mut segments = vec!["repos"];
        segments.extend(repo.split('/'));
        segments.push("contents");
        segments.extend(path.split('/').filter(|s| !s.is_empty()));

        let url = self.endpoint(&segments)?;
        self.get_json(url, &[("ref", reference)]).await
    }

    /// Fetch the most recent published release.
    #[instrument(skip(self))]
    pub async fn latest_release(&self, repo: &str) -> Result<Release> {
        let mut segments = vec!["repos"];
        segments.extend(repo.split('/'));
        segments.extend(["releases", "latest"]);

        let url = self.endpoint(&segments)?;
        self.get_json(url, &[]).await
    }

    /// Compare two references; commits come back oldest first.
    ///
    /// The endpoint pages its commit list, so pages are fetched until every
    /// commit in `total_commits` has been collected. A range that ends early
    /// is a parse error rather than a silently truncated list.
    #[instrument(skip(self))]
    pub async fn compare(&self, repo: &str, base: &str, head: &str) -> Result<Comparison> {
        let range = format!("{}...{}", short_ref(base), short_ref(head));
        let mut segments = vec!["repos"];
        segments.extend(repo.split('/'));
        segments.extend(["compare", range.as_str()]);
        let url = self.endpoint(&segments)?;

        let per_page = COMPARE_PAGE_SIZE.to_string();
        let mut page = 1u32;
        let mut comparison: Comparison = self
            .get_json(url.clone(), &[("per_page", per_page.as_str()), ("page", "1")])
            .await?;

        while (comparison.commits.len() as u64) < comparison.total_commits {
            page += 1;
            let page_str = page.to_string();
            let next: Comparison = self
                .get_json(url.clone(), &[("per_page", per_page.as_str()), ("page", page_str.as_str())])
                .await?;

            if next.commits.is_empty() {
                return Err(ReleaseNotesError::parse(format!(
                    "{url}: comparison ended after {} of {} commits",
                    comparison.commits.len(),
                    comparison.total_commits
                )));
            }
            debug!(page, commits = next.commits.len(), "comparison page");
            comparison.commits.extend(next.commits);
        }

        Ok(comparison)
    }

    /// Fetch a single pull request with its labels.
    #[instrument(skip(self))]
    pub async fn pull_request(&self, repo: &str, number: u64) -> Result<PullRequest> {
        let number = number.to_string();
        let mut segments = vec!["repos"];
        segments.extend(repo.split('/'));
        segments.extend(["pulls", number.as_str()]);

        let url = self.endpoint(&segments)?;
        self.get_json(url, &[]).await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Append percent-encoded path segments to the API base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ReleaseNotesError::config(format!("API URL cannot be a base: {}", self.api_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a URL and decode its JSON body, mapping non-2xx to [`ReleaseNotesError::Api`].
    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        debug!(%url, "GET");

        let response = self
            .http
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| ReleaseNotesError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReleaseNotesError::Network(format!("{url}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(ReleaseNotesError::Api {
                url: url.to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            ReleaseNotesError::parse(format!("{url}: unexpected response body: {e}"))
        })
    }
}

/// Strip `refs/tags/` or `refs/heads/` so the reference fits in a compare range.
pub fn short_ref(reference: &str) -> &str {
    reference
        .strip_prefix("refs/tags/")
        .or_else(|| reference.strip_prefix("refs/heads/"))
        .unwrap_or(reference)
}

/// Pull `message` out of an API error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "test-token";

    fn client_for(server: &MockServer) -> GithubClient {
        let opts = ClientOptions {
            api_url: server.uri(),
            ..ClientOptions::default()
        };
        GithubClient::new(&AccessToken::new(TOKEN), &opts).unwrap()
    }

    /// Encode the way the contents API does: base64 wrapped at 60 columns.
    fn wrapped_base64(content: &str) -> String {
        let encoded = BASE64.encode(content);
        encoded
            .as_bytes()
            .chunks(60)
            .map(|chunk| std::str::from_utf8(chunk).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_short_ref() {
        assert_eq!(short_ref("refs/tags/v1.2.3"), "v1.2.3");
        assert_eq!(short_ref("refs/heads/main"), "main");
        assert_eq!(short_ref("abcdef123456"), "abcdef123456");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"message":"Not Found"}"#), "Not Found");
        assert_eq!(error_message("Bad gateway\n"), "Bad gateway");
    }

    #[test]
    fn test_invalid_api_url() {
        let opts = ClientOptions {
            api_url: "not a url".into(),
            ..ClientOptions::default()
        };
        let err = GithubClient::new(&AccessToken::new(TOKEN), &opts).unwrap_err();
        assert!(matches!(err, ReleaseNotesError::Config { .. }));
    }

    #[tokio::test]
    async fn test_contents_at_ref() {
        let server = MockServer::start().await;
        let lockfile = "version = 3\n\n[[package]]\nname = \"sc-cli\"\n";

        Mock::given(method("GET"))
            .and(path("/repos/tide-labs/tidechain/contents/Cargo.lock"))
            .and(query_param("ref", "refs/tags/v1.2.3"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "path": "Cargo.lock",
                "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
                "encoding": "base64",
                "content": wrapped_base64(lockfile),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = client_for(&server)
            .contents("tide-labs/tidechain", "Cargo.lock", "refs/tags/v1.2.3")
            .await
            .unwrap();

        assert_eq!(file.path, "Cargo.lock");
        assert_eq!(file.decode_utf8().unwrap(), lockfile);
    }

    #[tokio::test]
    async fn test_not_found_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/tide-labs/tidechain/contents/Cargo.lock"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({"message": "Not Found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .contents("tide-labs/tidechain", "Cargo.lock", "refs/tags/v9.9.9")
            .await
            .unwrap_err();

        match err {
            ReleaseNotesError::Api {
                status, message, ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/tide-labs/tidechain/releases/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .latest_release("tide-labs/tidechain")
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseNotesError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_latest_release() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/tide-labs/tidechain/releases/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tag_name": "v1.2.2",
                "name": "Tidechain v1.2.2",
                "draft": false,
            })))
            .mount(&server)
            .await;

        let release = client_for(&server)
            .latest_release("tide-labs/tidechain")
            .await
            .unwrap();
        assert_eq!(release.tag_name, "v1.2.2");
    }

    #[tokio::test]
    async fn test_compare_uses_short_refs() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/tide-labs/tidechain/compare/v1.2.2...v1.2.3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ahead",
                "total_commits": 2,
                "commits": [
                    {"sha": "a1", "commit": {"message": "Bump deps (#10)"}},
                    {"sha": "b2", "commit": {"message": "Fix staking payout (#11)\n\nDetails"}},
                ],
            })))
            .mount(&server)
            .await;

        let cmp = client_for(&server)
            .compare("tide-labs/tidechain", "refs/tags/v1.2.2", "refs/tags/v1.2.3")
            .await
            .unwrap();
        assert_eq!(cmp.total_commits, 2);
        assert_eq!(cmp.commits[1].commit.message, "Fix staking payout (#11)\n\nDetails");
    }

    fn commits(range: std::ops::Range<u32>) -> Vec<serde_json::Value> {
        range
            .map(|i| serde_json::json!({"sha": format!("c{i}"), "commit": {"message": format!("Change {i} (#{i})")}}))
            .collect()
    }

    #[tokio::test]
    async fn test_compare_collects_every_page() {
        let server = MockServer::start().await;

        for (page, range) in [("1", 0..100), ("2", 100..130)] {
            Mock::given(method("GET"))
                .and(path("/repos/tide-labs/substrate/compare/aaa111...bbb222"))
                .and(query_param("per_page", "100"))
                .and(query_param("page", page))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "total_commits": 130,
                    "commits": commits(range),
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let cmp = client_for(&server)
            .compare("tide-labs/substrate", "aaa111", "bbb222")
            .await
            .unwrap();
        assert_eq!(cmp.commits.len(), 130);
        assert_eq!(cmp.commits[0].sha, "c0");
        assert_eq!(cmp.commits[129].sha, "c129");
    }

    #[tokio::test]
    async fn test_compare_short_range_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/tide-labs/substrate/compare/aaa111...bbb222"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_commits": 300,
                "commits": commits(0..1),
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/tide-labs/substrate/compare/aaa111...bbb222"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_commits": 300,
                "commits": [],
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .compare("tide-labs/substrate", "aaa111", "bbb222")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ended after 1 of 300 commits"), "{err}");
    }

    #[tokio::test]
    async fn test_pull_request_labels() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/tide-labs/tidechain/pulls/11"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "number": 11,
                "title": "Fix staking payout",
                "html_url": "https://github.com/tide-labs/tidechain/pull/11",
                "merged_at": "2025-03-01T10:00:00Z",
                "labels": [{"name": "B7-runtimenoteworthy"}, {"name": "C3-medium 📣"}],
            })))
            .mount(&server)
            .await;

        let pr = client_for(&server)
            .pull_request("tide-labs/tidechain", 11)
            .await
            .unwrap();
        assert!(pr.is_merged());
        let labels: Vec<_> = pr.labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(labels, ["B7-runtimenoteworthy", "C3-medium 📣"]);
    }
}
