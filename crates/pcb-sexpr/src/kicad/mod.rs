//! KiCad-specific S-expression helpers.
//!
//! - [`props`] - property query helpers
//! - [`schematic`] - KiCad schematic (`.kicad_sch`) sheet helpers

pub mod props;
pub mod schematic;

pub use props::atom_prop;
pub use schematic::{SheetSymbol, schematic_properties, schematic_sheets};
