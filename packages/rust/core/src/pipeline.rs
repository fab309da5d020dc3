//! End-to-end release pipeline: environment → lockfile → changelog → rendered note.

use std::path::Path;

use tracing::{info, instrument};

use relnotes_github::{ClientOptions, GithubClient, short_ref};
use relnotes_shared::{AppConfig, BuildContext, Result};

use crate::changelog::{self, Changelog};
use crate::lockfile::LockfileInspector;
use crate::render::{ReleaseNoteRenderer, RenderContext};
use crate::runtime;

/// Changelog data resolved from the remote repositories.
#[derive(Debug, Clone)]
pub struct ChangelogSummary {
    /// Reference of the last published release.
    pub previous_ref: String,
    /// Paired-repository revision pinned at the previous release.
    pub substrate_previous: String,
    /// Paired-repository revision pinned at the current reference.
    pub substrate_current: String,
    /// Classified changes of both repositories.
    pub changelog: Changelog,
}

/// Run the full pipeline and return the release note text.
///
/// 1. Compile the template (fails before any network call)
/// 2. Load runtime artifacts
/// 3. Resolve the changelog, if enabled
/// 4. Render
#[instrument(skip_all, fields(current_ref = %ctx.current_ref, repository = %ctx.repository))]
pub async fn generate_release_text(ctx: &BuildContext, config: &AppConfig) -> Result<String> {
    let renderer = match &config.template.path {
        Some(path) => ReleaseNoteRenderer::from_file(path)?,
        None => ReleaseNoteRenderer::with_default_template()?,
    };

    info!("connecting to GitHub");
    let client = GithubClient::new(&ctx.token, &ClientOptions::from(&config.github))?;

    let context = build_render_context(&client, ctx, config).await?;
    let text = renderer.render(&context)?;

    info!(bytes = text.len(), "release note rendered");
    Ok(text)
}

/// Assemble the finalized render context.
pub async fn build_render_context(
    client: &GithubClient,
    ctx: &BuildContext,
    config: &AppConfig,
) -> Result<RenderContext> {
    let runtimes = load_runtimes(&ctx.workspace, config)?;

    let context = RenderContext {
        version: short_ref(&ctx.current_ref).to_string(),
        current_ref: ctx.current_ref.clone(),
        previous_ref: None,
        repository: ctx.repository.clone(),
        rustc_stable: ctx.rustc_stable.clone(),
        rustc_nightly: ctx.rustc_nightly.clone(),
        substrate_commit: None,
        substrate_previous_commit: None,
        changelog_enabled: false,
        release_priority: Default::default(),
        release_notes: Vec::new(),
        client_changes: Vec::new(),
        runtime_changes: Vec::new(),
        runtimes,
    };

    if !config.changelog.enabled {
        info!("changelog disabled");
        return Ok(context);
    }

    let summary = collect_changelog(client, ctx, config).await?;
    let mut context = context.with_changelog(summary.previous_ref, summary.changelog);
    context.substrate_commit = Some(summary.substrate_current);
    context.substrate_previous_commit = Some(summary.substrate_previous);
    Ok(context)
}

/// Compute the classified changelog between the last release and the current reference.
#[instrument(skip_all)]
pub async fn collect_changelog(
    client: &GithubClient,
    ctx: &BuildContext,
    config: &AppConfig,
) -> Result<ChangelogSummary> {
    let latest = client.latest_release(&ctx.repository).await?;
    let previous_ref = format!("refs/tags/{}", latest.tag_name);
    info!(%previous_ref, "last release");

    info!(repository = %ctx.repository, "generating changelog");
    let primary =
        changelog::fetch_changes(client, &ctx.repository, &previous_ref, &ctx.current_ref, false)
            .await?;

    let inspector = LockfileInspector::new(client, ctx.repository.clone(), config.lockfile.clone());
    let substrate_previous = inspector.get_substrate_commit(&previous_ref).await?;
    let substrate_current = inspector.get_substrate_commit(&ctx.current_ref).await?;

    let paired_repository = &config.changelog.paired_repository;
    info!(repository = %paired_repository, "generating changelog");
    let paired = changelog::fetch_changes(
        client,
        paired_repository,
        &substrate_previous,
        &substrate_current,
        true,
    )
    .await?;

    let all = changelog::merge_changes(primary, paired, &config.changelog.companion_pattern);
    let changelog = changelog::classify(&all, &config.changelog);

    Ok(ChangelogSummary {
        previous_ref,
        substrate_previous,
        substrate_current,
        changelog,
    })
}

fn load_runtimes(workspace: &Path, config: &AppConfig) -> Result<Vec<runtime::RuntimeArtifact>> {
    let runtimes = runtime::load_runtimes(workspace, &config.runtimes)?;
    info!(count = runtimes.len(), "runtime artifacts loaded");
    Ok(runtimes)
}
