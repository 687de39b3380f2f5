//! Pairing source footprints with their counterparts on a destination sheet.

use std::collections::HashSet;

use log::warn;

use crate::board::Component;
use crate::catalog::CatalogComponent;
use crate::error::ReplicateError;

/// Index of the candidate path sharing the most elements with `source`.
///
/// Ties go to the earliest candidate. Returns `None` for no candidates.
pub fn best_path_overlap<P: AsRef<[String]>>(
    source: &[String],
    candidates: &[P],
) -> Option<usize> {
    let source: HashSet<&String> = source.iter().collect();
    let mut best: Option<(usize, usize)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let overlap = candidate
            .as_ref()
            .iter()
            .collect::<HashSet<_>>()
            .intersection(&source)
            .count();
        if best.is_none_or(|(_, score)| overlap > score) {
            best = Some((index, overlap));
        }
    }
    best.map(|(index, _)| index)
}

#[derive(Debug, Clone, Copy)]
pub struct ComponentPair<'a> {
    pub source: &'a CatalogComponent,
    pub destination: &'a CatalogComponent,
}

/// Find the destination footprint that corresponds to `source`.
pub fn match_component<'a>(
    source: &CatalogComponent,
    destination_sheet: &[&'a CatalogComponent],
) -> Result<&'a CatalogComponent, ReplicateError> {
    let candidates: Vec<&'a CatalogComponent> = destination_sheet
        .iter()
        .copied()
        .filter(|c| c.symbol_id.is_some() && c.symbol_id == source.symbol_id)
        .collect();

    match candidates.as_slice() {
        [] => Err(ReplicateError::NoDestinationMatch {
            reference: source.reference().to_string(),
        }),
        [only] => Ok(*only),
        _ => {
            let paths: Vec<&[String]> =
                candidates.iter().map(|c| c.sheet.ids.as_slice()).collect();
            let index = best_path_overlap(&source.sheet.ids, &paths).unwrap_or(0);
            warn!(
                "{} has {} candidates on the destination sheet, picked {}",
                source.reference(),
                candidates.len(),
                candidates[index].reference()
            );
            Ok(candidates[index])
        }
    }
}

/// Pair every source footprint with one destination footprint.
pub fn match_sheet<'a>(
    sources: &[&'a CatalogComponent],
    destination_sheet: &[&'a CatalogComponent],
) -> Result<Vec<ComponentPair<'a>>, ReplicateError> {
    sources
        .iter()
        .map(|&source| {
            Ok(ComponentPair {
                source,
                destination: match_component(source, destination_sheet)?,
            })
        })
        .collect()
}

/// Footprint text must line up one to one between a pair.
pub fn check_text_count(source: &Component, destination: &Component) -> Result<(), ReplicateError> {
    if source.texts.len() != destination.texts.len() {
        return Err(ReplicateError::TextCountMismatch {
            src_ref: source.reference.clone(),
            src_count: source.texts.len(),
            dst_ref: destination.reference.clone(),
            dst_count: destination.texts.len(),
        });
    }
    Ok(())
}
