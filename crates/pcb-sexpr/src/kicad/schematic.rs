//! KiCad schematic (`.kicad_sch`) helpers.

use crate::Sexpr;
use log::warn;
use std::collections::BTreeMap;

use super::props::atom_prop;

/// A hierarchical sheet symbol placed in a schematic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSymbol {
    pub uuid: String,
    /// Sheet instance name, if the symbol carries one
    pub name: Option<String>,
    /// Child schematic file as written in the parent (may be relative)
    pub file: Option<String>,
}

/// Extract all `(property "NAME" "VALUE" ...)` pairs from a schematic list node.
pub fn schematic_properties(node: &[Sexpr]) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for child in node.iter().skip(1) {
        let Some(items) = child.as_list() else {
            continue;
        };
        if items.first().and_then(Sexpr::as_sym) != Some("property") {
            continue;
        }
        let Some(name) = items.get(1).and_then(Sexpr::as_atom) else {
            continue;
        };
        let value = items
            .get(2)
            .and_then(Sexpr::as_atom)
            .unwrap_or_default()
            .to_string();
        out.insert(name.to_string(), value);
    }
    out
}

/// Collect the `(sheet ...)` symbols placed directly in a parsed schematic.
///
/// KiCad 6+ writes `Sheetname`/`Sheetfile`; KiCad 5 conversions use
/// `Sheet name`/`Sheet file`. Both spellings are accepted.
pub fn schematic_sheets(root: &Sexpr) -> Vec<SheetSymbol> {
    root.find_all_lists("sheet")
        .into_iter()
        .filter_map(|sheet| {
            let props = schematic_properties(sheet);
            let Some(uuid) = atom_prop(sheet, "uuid") else {
                let name = props.get("Sheetname").or_else(|| props.get("Sheet name"));
                warn!("Skipping sheet {} without a uuid", name.map_or("<unnamed>", String::as_str));
                return None;
            };
            let lookup = |a: &str, b: &str| props.get(a).or_else(|| props.get(b)).cloned();
            Some(SheetSymbol {
                uuid,
                name: lookup("Sheetname", "Sheet name"),
                file: lookup("Sheetfile", "Sheet file"),
            })
        })
        .collect()
}
