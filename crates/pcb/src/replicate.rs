use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use pcb_replicate::{
    Coverage, PerKind, Progress, ReplicationPolicy, ReplicationRequest, Replicator, Stage,
    build_catalog, candidate_anchors,
};

use crate::board::AnchorArgs;

#[derive(Args, Debug)]
#[command(about = "Replicate the layout of the anchor's sheet onto other instances")]
pub struct ReplicateArgs {
    #[command(flatten)]
    pub anchor: AnchorArgs,

    /// Index of a destination sheet as listed by `pcb sheets` (can be
    /// specified multiple times, defaults to every candidate)
    #[arg(short = 's', long = "sheet", value_name = "INDEX")]
    pub sheets: Vec<usize>,

    /// Replication policy file (TOML)
    #[arg(short = 'c', long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Only take items fully inside the sheet area
    #[arg(long)]
    pub contain: bool,

    /// Select items by the anchor's group instead of the sheet area
    #[arg(long)]
    pub by_group: bool,

    /// Also take items outside the sheet area that share the anchor's group
    #[arg(long)]
    pub include_group_items: bool,

    /// Replicate locked items and move locked footprints
    #[arg(long)]
    pub locked: bool,

    /// Remove existing items on the destination sheets first
    #[arg(long)]
    pub remove_existing: bool,

    /// Remove duplicated tracks, zones, text and drawings afterwards
    #[arg(long)]
    pub remove_duplicates: bool,

    /// Collect everything replicated onto a sheet into one group per sheet
    #[arg(long)]
    pub group: bool,

    #[arg(long)]
    pub no_tracks: bool,

    #[arg(long)]
    pub no_zones: bool,

    #[arg(long)]
    pub no_text: bool,

    #[arg(long)]
    pub no_drawings: bool,

    /// Write the board here instead of overwriting the input
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the replication report as JSON
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl ReplicateArgs {
    fn policy(&self) -> Result<ReplicationPolicy> {
        let mut policy = match &self.config {
            Some(path) => ReplicationPolicy::load(path)
                .with_context(|| format!("Failed to load policy {}", path.display()))?,
            None => ReplicationPolicy::default(),
        };
        if self.contain {
            policy.coverage = Coverage::Contain;
        }
        policy.by_group |= self.by_group;
        policy.include_group_items |= self.include_group_items;
        policy.remove_existing |= self.remove_existing;
        policy.remove_duplicates |= self.remove_duplicates;
        if self.locked {
            policy.locked = PerKind::all(true);
        }
        if self.group {
            policy.group = PerKind::all(true);
        }
        policy.tracks &= !self.no_tracks;
        policy.zones &= !self.no_zones;
        policy.text &= !self.no_text;
        policy.drawings &= !self.no_drawings;
        Ok(policy)
    }
}

pub fn execute(args: ReplicateArgs) -> Result<()> {
    let policy = args.policy()?;
    debug!("Replication policy: {policy:?}");

    let mut board = args.anchor.load_board()?;
    let catalog = build_catalog(&board).context("Failed to read the board hierarchy")?;
    let anchor = args.anchor.anchor(&catalog)?;

    let candidates = candidate_anchors(&catalog, anchor.id, args.anchor.level)?;
    let destinations = if args.sheets.is_empty() {
        candidates.iter().map(|c| c.prefix.clone()).collect()
    } else {
        args.sheets
            .iter()
            .map(|&index| {
                candidates
                    .get(index)
                    .map(|c| c.prefix.clone())
                    .with_context(|| {
                        format!("No candidate sheet {index}, run `pcb sheets` to list them")
                    })
            })
            .collect::<Result<Vec<_>>>()?
    };
    if destinations.is_empty() {
        println!("{}", "Nothing to replicate onto".yellow());
        return Ok(());
    }

    let request = ReplicationRequest {
        anchor: anchor.id,
        level: args.anchor.level,
        destinations,
    };

    let bar = ProgressBar::new(100);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} {msg:40} [{bar:30.cyan/blue}] {pos:>3}%",
    )?);
    let mut current: Option<Stage> = None;
    let mut on_progress = |p: Progress| {
        if current != Some(p.stage) {
            current = Some(p.stage);
            bar.set_message(p.stage.to_string());
        }
        if let Some(message) = &p.message {
            debug!("{}: {message}", p.stage);
        }
        bar.set_position((p.fraction * 100.0).round() as u64);
    };

    let replicator = Replicator::new(&catalog);
    let result = replicator.replicate(&mut board, &request, &policy, &mut on_progress);
    bar.finish_and_clear();
    let report = result?;

    for issue in &report.issues {
        println!("{}", format!("Check connectivity of {issue}").yellow());
    }
    println!(
        "{} Replicated onto {} sheets: {} footprints, {} tracks, {} zones, {} text, {} drawings",
        "✓".green(),
        request.destinations.len(),
        report.placed_components,
        report.cloned.tracks,
        report.cloned.zones,
        report.cloned.text,
        report.cloned.drawings,
    );

    let output = args.output.as_ref().unwrap_or(&args.anchor.board);
    fs::write(output, board.to_json()?)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if let Some(path) = &args.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}
