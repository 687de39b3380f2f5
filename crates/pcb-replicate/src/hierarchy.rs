//! Sheet-instance paths for footprints.
//!
//! A footprint's schematic identity path looks like `/<sheet>/<sheet>/<symbol>`.
//! The trailing element is the symbol id, shared by every instance of the
//! same symbol across repeated sheets. The leading elements are sheet
//! instance ids, resolved to a display name and a schematic file through a
//! table built from footprint `Sheetname`/`Sheetfile` properties. Sheets
//! holding no footprints never appear in those properties, so their entries
//! are recovered by walking the schematic files themselves.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use pcb_sexpr::kicad::schematic_sheets;

use crate::board::Component;
use crate::error::ReplicateError;

/// Prefix KiCad 5 writes in front of timestamp-based paths.
const LEGACY_PATH_PREFIX: &str = "00000000-0000-0000-0000-0000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    pub name: String,
    pub file: String,
}

/// The sheet instances a footprint sits in, root first.
///
/// `ids`, `names` and `files` are parallel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetPath {
    pub ids: Vec<String>,
    pub names: Vec<String>,
    pub files: Vec<String>,
}

impl SheetPath {
    pub fn depth(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn starts_with(&self, prefix: &[String]) -> bool {
        !prefix.is_empty() && self.ids.starts_with(prefix)
    }
}

/// Split an identity path into sheet ids and the symbol id.
///
/// Returns `None` for footprints that exist only in the layout.
pub fn split_identity_path(path: &str) -> Option<(Vec<String>, String)> {
    let normalized = path.trim().to_uppercase().replace(LEGACY_PATH_PREFIX, "");
    let mut segments: Vec<String> = normalized
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let symbol = segments.pop()?;
    Some((segments, symbol))
}

#[derive(Debug, Clone, Default)]
pub struct HierarchyIndex {
    sheets: HashMap<String, SheetInfo>,
}

impl HierarchyIndex {
    /// Build the sheet table from footprint properties, falling back to the
    /// schematic rooted at `schematic` for sheets no footprint describes.
    pub fn build<'a, I>(components: I, schematic: Option<&Path>) -> Result<Self, ReplicateError>
    where
        I: IntoIterator<Item = &'a Component>,
    {
        let mut sheets = HashMap::new();
        let mut referenced: Vec<String> = Vec::new();

        for component in components {
            let Some((ids, _)) = split_identity_path(&component.path) else {
                debug!("Footprint {} is only in the layout", component.reference);
                continue;
            };
            let Some(sheet_id) = ids.last() else {
                // Symbol on the root sheet
                continue;
            };
            let Some(file) = component.property("Sheetfile") else {
                return Err(ReplicateError::MissingSheetMetadata {
                    reference: component.reference.clone(),
                });
            };
            let name = component.property("Sheetname").unwrap_or_default();
            sheets.insert(
                sheet_id.clone(),
                SheetInfo {
                    name: name.to_string(),
                    file: file.to_string(),
                },
            );
            referenced.extend(ids);
        }

        let mut missing: Vec<String> = referenced
            .into_iter()
            .filter(|id| !sheets.contains_key(id))
            .collect();
        missing.sort();
        missing.dedup();

        if !missing.is_empty() {
            info!(
                "{} sheets have no footprints, reading them from the schematic",
                missing.len()
            );
            let Some(root) = schematic else {
                return Err(ReplicateError::UnresolvedSheets { ids: missing });
            };
            let parsed = read_schematic_hierarchy(root)?;
            let mut unresolved = Vec::new();
            for id in missing {
                match parsed.get(&id) {
                    Some(info) => {
                        sheets.insert(id, info.clone());
                    }
                    None => unresolved.push(id),
                }
            }
            if !unresolved.is_empty() {
                return Err(ReplicateError::UnresolvedSheets { ids: unresolved });
            }
        }

        Ok(Self { sheets })
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Resolve the sheet path of an identity path.
    ///
    /// Footprints without schematic linkage get an empty path.
    pub fn sheet_path(&self, identity: &str) -> SheetPath {
        let Some((ids, _)) = split_identity_path(identity) else {
            return SheetPath::default();
        };
        let mut path = SheetPath::default();
        for id in ids {
            if let Some(info) = self.sheets.get(&id) {
                path.names.push(info.name.clone());
                path.files.push(info.file.clone());
                path.ids.push(id);
            }
        }
        path
    }
}

/// Read every sheet block reachable from `root`, keyed by upper-cased
/// sheet instance id.
pub fn read_schematic_hierarchy(root: &Path) -> Result<HashMap<String, SheetInfo>, ReplicateError> {
    let mut sheets = HashMap::new();
    let mut visited = HashSet::new();
    read_schematic(root, &mut sheets, &mut visited)?;
    Ok(sheets)
}

fn read_schematic(
    path: &Path,
    sheets: &mut HashMap<String, SheetInfo>,
    visited: &mut HashSet<PathBuf>,
) -> Result<(), ReplicateError> {
    if !path.exists() {
        return Err(ReplicateError::MissingSchematic(path.to_path_buf()));
    }
    if !visited.insert(path.to_path_buf()) {
        return Ok(());
    }
    debug!("Reading sheets from {}", path.display());

    let content = fs::read_to_string(path).map_err(|source| ReplicateError::SchematicRead {
        path: path.to_path_buf(),
        source,
    })?;
    let root = pcb_sexpr::parse(&content).map_err(|source| ReplicateError::SchematicParse {
        path: path.to_path_buf(),
        source,
    })?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    for sheet in schematic_sheets(&root) {
        let (Some(name), Some(file)) = (sheet.name, sheet.file) else {
            return Err(ReplicateError::SchematicWithoutSheetKeys(path.to_path_buf()));
        };
        let child = resolve_sheet_file(dir, &file);
        sheets.insert(sheet.uuid.to_uppercase(), SheetInfo { name, file });
        read_schematic(&child, sheets, visited)?;
    }
    Ok(())
}

/// Child sheet files are relative to the parent schematic's directory.
fn resolve_sheet_file(dir: &Path, file: &str) -> PathBuf {
    let file = file.strip_prefix("${KIPRJMOD}/").unwrap_or(file);
    dir.join(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingBox, Point};
    use std::collections::BTreeMap;

    fn footprint(reference: &str, path: &str, sheet: Option<(&str, &str)>) -> Component {
        let mut properties = BTreeMap::new();
        if let Some((name, file)) = sheet {
            properties.insert("Sheetname".to_string(), name.to_string());
            properties.insert("Sheetfile".to_string(), file.to_string());
        }
        Component {
            reference: reference.into(),
            value: String::new(),
            path: path.into(),
            properties,
            position: Point::default(),
            orientation: 0.0,
            layer: "F.Cu".into(),
            locked: false,
            group: None,
            body: BoundingBox::default(),
            pads: vec![],
            texts: vec![],
            settings: Default::default(),
        }
    }

    #[test]
    fn test_split_identity_path() {
        assert_eq!(
            split_identity_path("/aa/bb/cc"),
            Some((vec!["AA".to_string(), "BB".to_string()], "CC".to_string()))
        );
        assert_eq!(split_identity_path("/cc"), Some((vec![], "CC".to_string())));
        assert_eq!(split_identity_path(""), None);
        assert_eq!(
            split_identity_path("/00000000-0000-0000-0000-00005d3f1a2b/5D3F1A2C"),
            Some((vec!["5D3F1A2B".to_string()], "5D3F1A2C".to_string()))
        );
    }

    #[test]
    fn test_index_from_properties() {
        let parts = [
            footprint("R1", "/s1/r", Some(("A", "ch.kicad_sch"))),
            footprint("R2", "/s2/r", Some(("B", "ch.kicad_sch"))),
            footprint("J1", "/j", None),
            footprint("H1", "", None),
        ];
        let index = HierarchyIndex::build(&parts, None).unwrap();
        assert_eq!(index.len(), 2);

        let path = index.sheet_path("/s2/r");
        assert_eq!(path.ids, ["S2"]);
        assert_eq!(path.names, ["B"]);
        assert_eq!(path.files, ["ch.kicad_sch"]);
        assert!(index.sheet_path("").is_empty());
        assert!(index.sheet_path("/j").is_empty());
    }

    #[test]
    fn test_missing_sheetfile_is_structural() {
        let parts = [footprint("R7", "/s1/r", None)];
        let err = HierarchyIndex::build(&parts, None).unwrap_err();
        assert!(matches!(
            err,
            ReplicateError::MissingSheetMetadata { ref reference } if reference == "R7"
        ));
        assert!(err.is_structural());
    }

    #[test]
    fn test_unresolved_without_schematic() {
        // Outer sheet holds no footprints itself.
        let parts = [footprint("R1", "/outer/inner/r", Some(("In", "in.kicad_sch")))];
        let err = HierarchyIndex::build(&parts, None).unwrap_err();
        assert!(matches!(err, ReplicateError::UnresolvedSheets { ref ids } if ids == &["OUTER"]));
    }
}
