use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::ItemId;

/// Failures reported by a [`crate::Document`] host.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("No item with id {0}")]
    UnknownItem(ItemId),

    #[error("Item {0} is not a footprint")]
    NotAComponent(ItemId),

    #[error("Group {0} does not exist")]
    UnknownGroup(String),

    #[error("Group {0} already exists")]
    DuplicateGroup(String),

    #[error("Failed to serialize board item")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ReplicateError {
    #[error(
        "Footprint {reference} has no Sheetfile and Sheetname properties. \
         Update the layout from the schematic"
    )]
    MissingSheetMetadata { reference: String },

    #[error("Schematic file {} does not exist", .0.display())]
    MissingSchematic(PathBuf),

    #[error("Schematic file {} has a sheet without Sheetname/Sheetfile keys", .0.display())]
    SchematicWithoutSheetKeys(PathBuf),

    #[error("Failed to read schematic {}: {source}", path.display())]
    SchematicRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse schematic {}: {source}", path.display())]
    SchematicParse {
        path: PathBuf,
        source: pcb_sexpr::ParseError,
    },

    #[error("Sheets {ids:?} are not described by any footprint or schematic file")]
    UnresolvedSheets { ids: Vec<String> },

    #[error(
        "Could not find a matching footprint for {reference}. \
         Make sure the schematic and layout are in sync"
    )]
    NoDestinationMatch { reference: String },

    #[error(
        "Source footprint {src_ref} has {src_count} text items \
         but footprint {dst_ref} has {dst_count}"
    )]
    TextCountMismatch {
        src_ref: String,
        src_count: usize,
        dst_ref: String,
        dst_count: usize,
    },

    #[error("Footprint {reference} already belongs to group {group}")]
    ConflictingGroup { reference: String, group: String },

    #[error("Group {0} already exists, remove it before replicating")]
    GroupExists(String),

    #[error("No footprint with reference {0}")]
    UnknownAnchor(String),

    #[error("Footprint {0} is not linked to the schematic")]
    AnchorNotLinked(String),

    #[error("Hierarchy level {level} is out of range, {reference} is {depth} sheets deep")]
    InvalidLevel {
        reference: String,
        level: usize,
        depth: usize,
    },

    #[error("No footprints found on source sheet {0}")]
    NoSourceComponents(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl ReplicateError {
    /// Whether the failure is a schematic/board mismatch the user can fix,
    /// as opposed to an I/O or host failure.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            ReplicateError::SchematicRead { .. } | ReplicateError::Document(_)
        )
    }
}

/// A net pairing made below the similarity threshold.
///
/// Replication still goes ahead; the caller should review the pad.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectivityIssue {
    /// Destination footprint reference
    pub reference: String,
    pub pad: String,
}

impl std::fmt::Display for ConnectivityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} pad {}", self.reference, self.pad)
    }
}
