//! Promote command — thin CLI layer over `rcbump_core::promote`.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use rcbump_core::config::{Config, PromoteConfig};
use rcbump_core::outputs;
use rcbump_core::promote::{self, PromotePlan};

/// Arguments for the `promote` subcommand.
#[derive(Args, Debug, Default)]
pub struct PromoteArgs {
    /// Allow promotion from this ref (repeatable; overrides config)
    #[arg(long = "stable-ref", value_name = "REF")]
    pub stable_refs: Vec<String>,

    /// Step-output file (defaults to $GITHUB_OUTPUT when set)
    #[arg(long, value_name = "FILE")]
    pub github_output: Option<Utf8PathBuf>,

    /// Run without making changes (show what would happen)
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the promote command.
#[instrument(name = "cmd_promote", skip_all, fields(json_output))]
pub fn cmd_promote(
    args: PromoteArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing promote command");

    // CLI flags override config
    let mut config = config.clone();
    if !args.stable_refs.is_empty() {
        let promote_cfg = config.promote.get_or_insert_with(PromoteConfig::default);
        promote_cfg.stable_refs = Some(args.stable_refs.clone());
    }

    // Plan the promotion (all logic in core); promotion never commits
    let plan = promote::plan_promote(cwd, &config).context("promotion planning failed")?;

    let outcome = match plan {
        PromotePlan::Skip(skip) => {
            if global_json {
                let report = serde_json::json!({ "status": "skipped", "reason": skip });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} {}", "Skipped:".yellow().bold(), skip);
            }
            return Ok(());
        }
        PromotePlan::Ready(outcome) => outcome,
    };

    // The outputs append is promotion's only side effect.
    if !args.dry_run
        && let Some(ref path) = super::resolve_output_path(args.github_output.clone())
    {
        outputs::append(path, "next_version", &outcome.stable.to_string())
            .context("failed to write step output")?;
    }

    // Display result
    if global_json {
        if args.dry_run {
            let plan_json = serde_json::json!({
                "status": "planned",
                "baseline_tag": outcome.baseline_tag,
                "stable": outcome.stable.to_string(),
                "dry_run": true,
            });
            println!("{}", serde_json::to_string_pretty(&plan_json)?);
            return Ok(());
        }
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if let Some(ref tag) = outcome.baseline_tag {
        println!(
            "{}: {} → {}",
            "Version".bold(),
            tag.dimmed(),
            outcome.stable.to_string().green().bold()
        );
    } else {
        println!(
            "{}: {} {}",
            "Version".bold(),
            outcome.stable.to_string().green().bold(),
            "(first release)".yellow()
        );
    }
    if args.dry_run {
        println!();
        println!("{}", "Dry run — no changes made.".yellow());
    }

    Ok(())
}
