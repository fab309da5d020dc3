//! Release note rendering.
//!
//! The renderer is a pure function of a [`RenderContext`]: every value is
//! resolved before rendering and the engine runs with strict undefined
//! handling, so a placeholder naming a missing value aborts instead of
//! rendering as an empty string.

use std::path::Path;

use minijinja::{Environment, UndefinedBehavior};
use relnotes_shared::{ChangeRecord, ReleaseNotesError, Result};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::changelog::{Changelog, ReleasePriority};
use crate::runtime::RuntimeArtifact;

/// Template shipped with the binary.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/release.md.j2");

/// Name the template is registered under.
const TEMPLATE_NAME: &str = "release";

/// Everything the template can reference.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    /// Short form of `current_ref`, e.g. `v1.2.3`.
    pub version: String,
    pub current_ref: String,
    /// Reference of the previous release, when the changelog was computed.
    pub previous_ref: Option<String>,
    pub repository: String,
    pub rustc_stable: String,
    pub rustc_nightly: String,
    /// Paired-repository revision pinned at `current_ref`.
    pub substrate_commit: Option<String>,
    /// Paired-repository revision pinned at `previous_ref`.
    pub substrate_previous_commit: Option<String>,
    pub changelog_enabled: bool,
    pub release_priority: ReleasePriority,
    pub release_notes: Vec<ChangeRecord>,
    pub client_changes: Vec<ChangeRecord>,
    pub runtime_changes: Vec<ChangeRecord>,
    pub runtimes: Vec<RuntimeArtifact>,
}

impl RenderContext {
    /// Fill the changelog fields from a classified changelog.
    pub fn with_changelog(mut self, previous_ref: String, changelog: Changelog) -> Self {
        self.changelog_enabled = true;
        self.previous_ref = Some(previous_ref);
        self.release_priority = changelog.priority;
        self.release_notes = changelog.release_notes;
        self.client_changes = changelog.client;
        self.runtime_changes = changelog.runtime;
        self
    }
}

/// Compiled release template.
pub struct ReleaseNoteRenderer {
    env: Environment<'static>,
}

impl ReleaseNoteRenderer {
    /// Compile `source`; syntax errors surface here rather than at render time.
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_template_owned(TEMPLATE_NAME, source.into())
            .map_err(|e| ReleaseNotesError::Render(format!("invalid template: {e}")))?;

        Ok(Self { env })
    }

    /// Renderer using [`DEFAULT_TEMPLATE`].
    pub fn with_default_template() -> Result<Self> {
        Self::new(DEFAULT_TEMPLATE)
    }

    /// Renderer using a template file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| ReleaseNotesError::io(path, e))?;
        debug!(path = %path.display(), "loaded template");
        Self::new(source)
    }

    /// Render the release note.
    #[instrument(skip_all, fields(version = %context.version))]
    pub fn render(&self, context: &RenderContext) -> Result<String> {
        let template = self
            .env
            .get_template(TEMPLATE_NAME)
            .map_err(|e| ReleaseNotesError::Render(e.to_string()))?;

        template
            .render(context)
            .map_err(|e| ReleaseNotesError::Render(e.to_string()))
    }
}
