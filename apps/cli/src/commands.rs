//! CLI definition, tracing setup, and the release command.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use relnotes_core::pipeline::generate_release_text;
use relnotes_shared::{AppConfig, BuildContext, RunMode, load_config, load_config_from, report_env};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Render the release note for the reference being built.
///
/// Release identifiers come from the CI environment: GITHUB_REF, GITHUB_TOKEN,
/// GITHUB_WORKSPACE, GITHUB_REPOSITORY, RUSTC_STABLE and RUSTC_NIGHTLY.
#[derive(Parser, Debug)]
#[command(name = "generate-release-text", version, long_about = None)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.relnotes/relnotes.toml when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Template file replacing the built-in release template.
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Compute the changelog since the last release.
    #[arg(long)]
    pub changelog: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Log level for the given flags; local runs start one level more verbose.
fn log_level(verbose: u8, mode: RunMode) -> &'static str {
    let bump = u8::from(mode.is_local());
    match verbose.saturating_add(bump) {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize tracing on stderr; stdout carries the release note.
pub(crate) fn init_tracing(cli: &Cli, mode: RunMode) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = log_level(cli.verbose, mode);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("relnotes={level},generate_release_text={level}")));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Run the release pipeline and print the note.
pub(crate) async fn run(cli: Cli, mode: RunMode) -> Result<()> {
    let env = |name: &str| std::env::var(name).ok();

    if mode.is_local() {
        report_env(env);
    }

    let ctx = BuildContext::from_lookup(env)?;
    let config = resolve_config(&cli)?;

    info!(
        current_ref = %ctx.current_ref,
        repository = %ctx.repository,
        changelog = config.changelog.enabled,
        "generating release text"
    );

    let text = generate_release_text(&ctx, &config).await?;

    let stdout = std::io::stdout();
    write_release_text(&mut stdout.lock(), &text).wrap_err("failed to write release text")?;
    Ok(())
}

/// Load the config file and apply flag overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(apply_overrides(config, cli))
}

fn apply_overrides(mut config: AppConfig, cli: &Cli) -> AppConfig {
    if cli.changelog {
        config.changelog.enabled = true;
    }
    if let Some(template) = &cli.template {
        config.template.path = Some(template.clone());
    }
    config
}

/// Write the note, terminated by exactly one trailing newline if it lacks one.
fn write_release_text(out: &mut impl Write, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_without_flags() {
        let cli = Cli::try_parse_from(["generate-release-text"]).unwrap();
        assert!(!cli.changelog);
        assert!(cli.config.is_none());
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "generate-release-text",
            "--changelog",
            "--template",
            "scripts/github/tidechain_release.md.j2",
        ])
        .unwrap();

        let config = apply_overrides(AppConfig::default(), &cli);
        assert!(config.changelog.enabled);
        assert_eq!(
            config.template.path,
            Some(PathBuf::from("scripts/github/tidechain_release.md.j2"))
        );
    }

    #[test]
    fn local_runs_log_more() {
        assert_eq!(log_level(0, RunMode::Ci), "info");
        assert_eq!(log_level(0, RunMode::Local), "debug");
        assert_eq!(log_level(1, RunMode::Ci), "debug");
        assert_eq!(log_level(2, RunMode::Local), "trace");
    }

    #[test]
    fn release_text_gets_trailing_newline() {
        let mut out = Vec::new();
        write_release_text(&mut out, "# Tidechain v1.2.3").unwrap();
        assert_eq!(out, b"# Tidechain v1.2.3\n");

        let mut out = Vec::new();
        write_release_text(&mut out, "done\n").unwrap();
        assert_eq!(out, b"done\n");
    }
}
