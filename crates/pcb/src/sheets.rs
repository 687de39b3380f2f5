use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pcb_replicate::{build_catalog, candidate_anchors};

use crate::board::AnchorArgs;

#[derive(Args, Debug)]
#[command(about = "List the sheets an anchor footprint's layout can be replicated onto")]
pub struct SheetsArgs {
    #[command(flatten)]
    pub anchor: AnchorArgs,
}

pub fn execute(args: SheetsArgs) -> Result<()> {
    let board = args.anchor.load_board()?;
    let catalog = build_catalog(&board).context("Failed to read the board hierarchy")?;
    let anchor = args.anchor.anchor(&catalog)?;

    println!("{}", format!("Sheet levels of {}", anchor.reference()).bold());
    for (level, (name, file)) in anchor
        .sheet
        .names
        .iter()
        .zip(&anchor.sheet.files)
        .enumerate()
    {
        let line = format!("  {level}: {name} ({file})");
        if level == args.anchor.level {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }

    let candidates = candidate_anchors(&catalog, anchor.id, args.anchor.level)?;
    if candidates.is_empty() {
        println!("{}", "No other instances of this sheet".yellow());
        return Ok(());
    }

    println!("{}", "Candidate sheets".bold());
    for (index, sheet) in candidates.iter().enumerate() {
        println!(
            "  {index}: {} {}",
            sheet.names.join("/"),
            format!("(anchor {})", sheet.anchor).dimmed()
        );
    }
    Ok(())
}
