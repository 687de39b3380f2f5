use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pcb_replicate::{Catalog, CatalogComponent, MemoryBoard};

/// Arguments shared by commands that work from an anchor footprint.
#[derive(Args, Debug, Clone)]
pub struct AnchorArgs {
    /// Board snapshot (JSON)
    #[arg(value_name = "BOARD", value_hint = clap::ValueHint::FilePath)]
    pub board: PathBuf,

    /// KiCad board the snapshot was taken from. The root schematic is looked
    /// up next to it (defaults to the snapshot path)
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub pcb: Option<PathBuf>,

    /// Reference of the anchor footprint
    #[arg(short = 'a', long, value_name = "REF")]
    pub anchor: String,

    /// Hierarchy level of the source sheet, 0 being the outermost sheet
    #[arg(short = 'l', long, default_value_t = 0)]
    pub level: usize,
}

impl AnchorArgs {
    pub fn load_board(&self) -> Result<MemoryBoard> {
        let json = fs::read_to_string(&self.board)
            .with_context(|| format!("Failed to read {}", self.board.display()))?;
        let board = MemoryBoard::from_json(&json)
            .with_context(|| format!("Invalid board snapshot {}", self.board.display()))?;
        let pcb = self.pcb.clone().unwrap_or_else(|| self.board.clone());
        Ok(board.with_file_name(pcb))
    }

    pub fn anchor<'a>(&self, catalog: &'a Catalog) -> Result<&'a CatalogComponent> {
        catalog
            .by_reference(&self.anchor)
            .with_context(|| format!("No footprint with reference {} on the board", self.anchor))
    }
}
