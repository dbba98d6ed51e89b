//! Align command — thin CLI layer over `rcbump_core::align`.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use rcbump_core::align::{self, AlignPlan, SkipReason};
use rcbump_core::config::{AlignConfig, Config};
use rcbump_core::outputs;

/// Arguments for the `align` subcommand.
#[derive(Args, Debug, Default)]
pub struct AlignArgs {
    /// Gate on this ref instead of the configured target
    #[arg(long, value_name = "REF")]
    pub target_ref: Option<String>,

    /// Push to this remote instead of the configured one
    #[arg(long, value_name = "NAME")]
    pub remote: Option<String>,

    /// Step-output file (defaults to $GITHUB_OUTPUT when set)
    #[arg(long, value_name = "FILE")]
    pub github_output: Option<Utf8PathBuf>,

    /// Commit but do not push
    #[arg(long)]
    pub no_push: bool,

    /// Run without making changes (show what would happen)
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the align command.
#[instrument(name = "cmd_align", skip_all, fields(json_output))]
pub fn cmd_align(
    args: AlignArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing align command");

    // CLI flags override config
    let mut config = config.clone();
    if args.target_ref.is_some() || args.remote.is_some() || args.no_push {
        let align_cfg = config.align.get_or_insert_with(AlignConfig::default);
        if let Some(ref target) = args.target_ref {
            align_cfg.target_ref = Some(target.clone());
        }
        if let Some(ref remote) = args.remote {
            align_cfg.remote = Some(remote.clone());
        }
        if args.no_push {
            align_cfg.push = Some(false);
        }
    }

    // Plan the alignment (all logic in core)
    let plan = align::plan_align(cwd, &config).context("alignment planning failed")?;

    let output_path = super::resolve_output_path(args.github_output.clone());

    let ready = match plan {
        AlignPlan::Skip(reason) => {
            // Later pipeline steps key off an empty value. A ref mismatch
            // publishes nothing; the job was gated off entirely.
            if !matches!(reason, SkipReason::RefMismatch { .. })
                && !args.dry_run
                && let Some(ref path) = output_path
            {
                outputs::append(path, "next_version", "")
                    .context("failed to write step output")?;
            }

            if global_json {
                let report = serde_json::json!({ "status": "skipped", "reason": reason });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} {}", "Skipped:".yellow().bold(), reason);
            }
            return Ok(());
        }
        AlignPlan::Ready(ready) => ready,
    };

    // Display the plan
    if global_json {
        if args.dry_run {
            let plan_json = serde_json::json!({
                "status": "planned",
                "baseline": ready.baseline.to_string(),
                "classification": ready.classification.to_string(),
                "next_version": ready.next.to_string(),
                "dry_run": true,
            });
            println!("{}", serde_json::to_string_pretty(&plan_json)?);
            return Ok(());
        }
    } else {
        println!(
            "{}: {} → {}",
            "Version".bold(),
            ready.baseline.to_string().dimmed(),
            ready.next.to_string().green().bold()
        );
        println!("{}: {}", "Classification".dimmed(), ready.classification);

        if args.dry_run {
            println!();
            println!("{}", "Dry run — no changes made.".yellow());
            return Ok(());
        }
    }

    // Execute: marker commit, then push. The credential is read here, at the
    // process boundary, and handed down explicitly.
    let token = std::env::var(config.token_env()).ok();
    let outcome = ready
        .execute(cwd, &config, token.as_deref())
        .context("alignment failed")?;

    if let Some(ref path) = output_path {
        outputs::append(path, "next_version", &outcome.next.to_string())
            .context("failed to write step output")?;
    }

    // Display result
    if global_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!();
        println!(
            "  {} Marker commit pins {}",
            "✓".green(),
            outcome.next.to_string().green().bold()
        );
        if outcome.pushed {
            println!("  {} Pushed to {}", "✓".green(), config.remote().cyan());
        } else {
            println!("  {} Push skipped", "→".dimmed());
        }
    }

    Ok(())
}
