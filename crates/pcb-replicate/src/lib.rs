//! Hierarchical layout replication for KiCad boards.
//!
//! Given an anchor footprint on one instance of a hierarchical sheet, the
//! engine copies the placement of that sheet's footprints, together with its
//! tracks, zones, text and drawings, onto other instances of the same sheet.
//!
//! ```no_run
//! use pcb_replicate::{
//!     Catalog, MemoryBoard, ReplicationPolicy, ReplicationRequest, Replicator,
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut board = MemoryBoard::from_json(&std::fs::read_to_string("board.json")?)?
//!     .with_file_name("board.kicad_pcb");
//! let catalog = Catalog::build(&board)?;
//! let anchor = catalog.by_reference("Q1").map(|c| c.id).unwrap_or_default();
//! let destinations = pcb_replicate::list_replication_candidate_sheets(&catalog, anchor, 0)?;
//! let request = ReplicationRequest { anchor, level: 0, destinations };
//! let report = Replicator::new(&catalog).replicate(
//!     &mut board,
//!     &request,
//!     &ReplicationPolicy::default(),
//!     &mut |_| {},
//! )?;
//! println!("{} uncertain pads", report.issues.len());
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod catalog;
pub mod duplicates;
pub mod error;
pub mod geometry;
pub mod hierarchy;
pub mod matcher;
pub mod memory;
pub mod nets;
pub mod policy;
pub mod replicator;
pub mod resolver;
pub mod scope;
pub mod transform;

pub use board::{BoardItem, Component, Document, ItemId, ItemKind, Transform};
pub use catalog::{Catalog, CatalogComponent};
pub use duplicates::{DuplicateRemover, ExactDuplicateRemover};
pub use error::{ConnectivityIssue, DocumentError, ReplicateError};
pub use geometry::{BoundingBox, Point};
pub use memory::MemoryBoard;
pub use policy::{Coverage, PerKind, PolicyError, ReplicationPolicy};
pub use replicator::{
    Progress, ReplicationReport, ReplicationRequest, Replicator, SourceSheet, Stage,
    clear_highlight, highlight_scope,
};
pub use resolver::{CandidateSheet, SheetPrefix};
pub use scope::SourceScope;

/// Snapshot `doc` for replication.
pub fn build_catalog(doc: &dyn Document) -> Result<Catalog, ReplicateError> {
    Catalog::build(doc)
}

/// Other instances of the anchor's sheet at hierarchy `level`.
pub fn list_replication_candidate_sheets(
    catalog: &Catalog,
    anchor: ItemId,
    level: usize,
) -> Result<Vec<SheetPrefix>, ReplicateError> {
    resolver::replication_candidates(catalog, catalog.anchor(anchor)?, level)
}

/// Candidate sheets with the footprint that plays the anchor on each.
pub fn candidate_anchors(
    catalog: &Catalog,
    anchor: ItemId,
    level: usize,
) -> Result<Vec<CandidateSheet>, ReplicateError> {
    resolver::candidate_sheets(catalog, catalog.anchor(anchor)?, level)
}

/// Run a replication with the default duplicate remover.
pub fn replicate(
    doc: &mut dyn Document,
    catalog: &Catalog,
    request: &ReplicationRequest,
    policy: &ReplicationPolicy,
    progress: &mut dyn FnMut(Progress),
) -> Result<ReplicationReport, ReplicateError> {
    Replicator::new(catalog).replicate(doc, request, policy, progress)
}
