//! The replication pipeline.
//!
//! One call to [`Replicator::replicate`] copies the layout of the anchor's
//! sheet onto each requested destination sheet:
//!
//! 1. prepare: resolve the source scope, match footprints and nets for every
//!    destination and create destination groups
//! 2. remove existing destination items (optional)
//! 3. place destination footprints
//! 4. remove existing destination items again, now that footprints moved
//!    (optional)
//! 5. clone tracks, zones, text and drawings (each optional)
//! 6. remove exact duplicates (optional)
//! 7. refill copper zones
//!
//! A failing stage aborts the run. Changes already made to the document are
//! left in place.

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::board::{BoardItem, Component, Document, ItemId, ItemKind};
use crate::catalog::{Catalog, CatalogComponent, components_bounding_box};
use crate::duplicates::{DuplicateRemover, ExactDuplicateRemover};
use crate::error::{ConnectivityIssue, DocumentError, ReplicateError};
use crate::matcher::{ComponentPair, match_component, match_sheet};
use crate::nets::{NetMap, SheetNets, pair_nets};
use crate::policy::{PerKind, ReplicationPolicy};
use crate::resolver::{SheetPrefix, source_prefix};
use crate::scope::{Region, SourceScope, select_source, selects};
use crate::transform::{AnchorTransform, clone_item, place_component};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Prepare,
    RemoveBefore,
    PlaceComponents,
    RemoveAfter,
    Tracks,
    Zones,
    Text,
    Drawings,
    RemoveDuplicates,
    RefillZones,
}

impl Stage {
    fn cloning(kind: ItemKind) -> Stage {
        match kind {
            ItemKind::Track => Stage::Tracks,
            ItemKind::Zone => Stage::Zones,
            ItemKind::Text => Stage::Text,
            ItemKind::Drawing => Stage::Drawings,
            ItemKind::Component => Stage::PlaceComponents,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Prepare => "Preparing for replication",
            Stage::RemoveBefore => "Removing existing items",
            Stage::PlaceComponents => "Replicating footprints",
            Stage::RemoveAfter => "Removing items in the new footprint area",
            Stage::Tracks => "Replicating tracks",
            Stage::Zones => "Replicating zones",
            Stage::Text => "Replicating text",
            Stage::Drawings => "Replicating drawings",
            Stage::RemoveDuplicates => "Removing duplicates",
            Stage::RefillZones => "Refilling zones",
        };
        f.write_str(name)
    }
}

/// Progress of the current stage, `fraction` in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub stage: Stage,
    pub fraction: f64,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationRequest {
    /// Footprint defining the source sheet and the alignment
    pub anchor: ItemId,
    /// Hierarchy level of the source sheet, 0 being the outermost sheet
    pub level: usize,
    /// Sheets to replicate onto, usually a subset of the candidates
    pub destinations: Vec<SheetPrefix>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplicationReport {
    /// Uncertain net pairings across all destinations
    pub issues: BTreeSet<ConnectivityIssue>,
    pub placed_components: usize,
    pub cloned: PerKind<usize>,
    pub removed: PerKind<usize>,
    pub removed_duplicates: usize,
    pub refilled_zones: usize,
}

/// The anchor's sheet and everything selected on it.
#[derive(Debug, Clone)]
pub struct SourceSheet<'c> {
    pub anchor: &'c CatalogComponent,
    pub prefix: SheetPrefix,
    pub components: Vec<&'c CatalogComponent>,
    pub nets: SheetNets,
    pub scope: SourceScope,
}

impl<'c> SourceSheet<'c> {
    pub fn resolve(
        catalog: &'c Catalog,
        anchor: ItemId,
        level: usize,
        policy: &ReplicationPolicy,
    ) -> Result<Self, ReplicateError> {
        let anchor = catalog.anchor(anchor)?;
        let prefix = source_prefix(anchor, level)?;
        let components = catalog.on_sheet(&prefix);
        if components.is_empty() {
            return Err(ReplicateError::NoSourceComponents(prefix.join("/")));
        }
        let nets = SheetNets::for_sheet(catalog, &prefix);
        let scope = select_source(
            catalog,
            &prefix,
            &nets,
            anchor.component.group.as_deref(),
            policy,
        );
        info!(
            "Source sheet {} holds {} footprints and {} other items",
            anchor.sheet.names[..prefix.len()].join("/"),
            scope.components.len(),
            scope.items.len()
        );
        Ok(Self {
            anchor,
            prefix,
            components,
            nets,
            scope,
        })
    }
}

/// Everything known about one destination sheet before it is modified.
struct Destination<'c> {
    name: String,
    anchor: &'c CatalogComponent,
    pairs: Vec<ComponentPair<'c>>,
    nets: SheetNets,
    net_map: NetMap,
    transform: AnchorTransform,
    group: Option<String>,
}

impl Destination<'_> {
    /// Current extent of the destination footprints in `doc`.
    fn region<'a>(&'a self, doc: &'a dyn Document) -> Result<Region<'a>, ReplicateError> {
        let components = self
            .pairs
            .iter()
            .map(|p| doc.component(p.destination.id))
            .collect::<Result<Vec<&Component>, DocumentError>>()?;
        Ok(Region {
            bbox: components_bounding_box(components).unwrap_or_default(),
            nets: &self.nets,
            group: doc.component(self.anchor.id)?.group.as_deref(),
        })
    }
}

pub struct Replicator<'c> {
    catalog: &'c Catalog,
    duplicates: Box<dyn DuplicateRemover>,
}

impl<'c> Replicator<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            duplicates: Box::new(ExactDuplicateRemover),
        }
    }

    pub fn with_duplicate_remover(mut self, remover: Box<dyn DuplicateRemover>) -> Self {
        self.duplicates = remover;
        self
    }

    /// Run the pipeline against `doc`, which must be the document the
    /// catalog was built from.
    pub fn replicate(
        &self,
        doc: &mut dyn Document,
        request: &ReplicationRequest,
        policy: &ReplicationPolicy,
        progress: &mut dyn FnMut(Progress),
    ) -> Result<ReplicationReport, ReplicateError> {
        let mut report = ReplicationReport::default();

        info!("{}", Stage::Prepare);
        report_progress(progress, Stage::Prepare, 0.0, None);
        let source = SourceSheet::resolve(self.catalog, request.anchor, request.level, policy)?;
        let destinations = self.prepare(doc, &source, request, policy, &mut report.issues)?;
        report_progress(progress, Stage::Prepare, 1.0, None);

        if policy.remove_existing {
            self.remove_existing(
                doc,
                Stage::RemoveBefore,
                &source,
                &destinations,
                policy,
                &mut report,
                progress,
            )?;
        }

        info!("{}", Stage::PlaceComponents);
        report_progress(progress, Stage::PlaceComponents, 0.0, None);
        let total: usize = destinations.iter().map(|dst| dst.pairs.len()).sum();
        let mut done = 0;
        for dst in &destinations {
            for pair in &dst.pairs {
                if place(doc, dst, pair, policy)? {
                    report.placed_components += 1;
                }
                done += 1;
                report_progress(
                    progress,
                    Stage::PlaceComponents,
                    fraction(done, total),
                    Some(&dst.name),
                );
            }
        }
        report_progress(progress, Stage::PlaceComponents, 1.0, None);

        if policy.remove_existing {
            self.remove_existing(
                doc,
                Stage::RemoveAfter,
                &source,
                &destinations,
                policy,
                &mut report,
                progress,
            )?;
        }

        for kind in ItemKind::CLONED {
            if !policy.replicates(kind) {
                continue;
            }
            let stage = Stage::cloning(kind);
            info!("{stage}");
            report_progress(progress, stage, 0.0, None);
            let items: Vec<&BoardItem> = source.scope.items_of(self.catalog, kind).collect();
            let total = items.len() * destinations.len();
            let mut done = 0;
            for dst in &destinations {
                for &item in &items {
                    let mut cloned = clone_item(&dst.transform, item, &dst.net_map);
                    if policy.group.get(kind) {
                        cloned.set_group(dst.group.clone());
                    }
                    let id = doc.add(cloned)?;
                    debug!("Cloned {kind} {id} onto {}", dst.name);
                    *report.cloned.get_mut(kind) += 1;
                    done += 1;
                    report_progress(progress, stage, fraction(done, total), Some(&dst.name));
                }
            }
            report_progress(progress, stage, 1.0, None);
        }

        if policy.remove_duplicates {
            info!("{}", Stage::RemoveDuplicates);
            report_progress(progress, Stage::RemoveDuplicates, 0.0, None);
            report.removed_duplicates = self.duplicates.remove_duplicates(doc)?;
            report_progress(progress, Stage::RemoveDuplicates, 1.0, None);
        }

        info!("{}", Stage::RefillZones);
        report_progress(progress, Stage::RefillZones, 0.0, None);
        report.refilled_zones = doc.refill_zones();
        report_progress(progress, Stage::RefillZones, 1.0, None);

        info!(
            "Replicated onto {} sheets, {} uncertain net pairings",
            destinations.len(),
            report.issues.len()
        );
        Ok(report)
    }

    /// Match every destination and create its group. All destinations are
    /// validated before any group is created.
    fn prepare(
        &self,
        doc: &mut dyn Document,
        source: &SourceSheet<'c>,
        request: &ReplicationRequest,
        policy: &ReplicationPolicy,
        issues: &mut BTreeSet<ConnectivityIssue>,
    ) -> Result<Vec<Destination<'c>>, ReplicateError> {
        let mut destinations: Vec<Destination<'c>> = Vec::with_capacity(request.destinations.len());
        for prefix in &request.destinations {
            let sheet = self.catalog.on_sheet(prefix);
            let anchor = match_component(source.anchor, &sheet)?;
            let pairs = match_sheet(&source.components, &sheet)?;
            let nets = SheetNets::for_sheet(self.catalog, prefix);
            let net_map = pair_nets(&pairs, &source.nets, &nets, issues);
            let name = anchor.sheet.names[..prefix.len().min(anchor.sheet.depth())].join("/");
            debug!(
                "Sheet {name}: anchor {}, {} footprints, {} net pairs",
                anchor.reference(),
                pairs.len(),
                net_map.len()
            );

            let group = if policy.group.any() {
                let group = format!("Replicated - {name}");
                let taken = destinations.iter().any(|d| d.group.as_ref() == Some(&group));
                if taken || doc.group_exists(&group) {
                    return Err(ReplicateError::GroupExists(group));
                }
                if let Some((reference, foreign)) = foreign_group(&pairs, &group) {
                    return Err(ReplicateError::ConflictingGroup {
                        reference: reference.to_string(),
                        group: foreign.to_string(),
                    });
                }
                Some(group)
            } else {
                None
            };

            destinations.push(Destination {
                transform: AnchorTransform::between(&source.anchor.component, &anchor.component),
                name,
                anchor,
                pairs,
                nets,
                net_map,
                group,
            });
        }

        for dst in &destinations {
            if let Some(group) = &dst.group {
                doc.create_group(group)?;
            }
        }
        Ok(destinations)
    }

    #[allow(clippy::too_many_arguments)]
    fn remove_existing(
        &self,
        doc: &mut dyn Document,
        stage: Stage,
        source: &SourceSheet<'_>,
        destinations: &[Destination<'_>],
        policy: &ReplicationPolicy,
        report: &mut ReplicationReport,
        progress: &mut dyn FnMut(Progress),
    ) -> Result<(), ReplicateError> {
        info!("{stage}");
        report_progress(progress, stage, 0.0, None);
        for (index, dst) in destinations.iter().enumerate() {
            let doomed: Vec<(ItemId, ItemKind)> = {
                let region = dst.region(doc)?;
                doc.items()
                    .into_iter()
                    .filter(|(id, item)| {
                        item.kind() != ItemKind::Component
                            && policy.replicates(item.kind())
                            && !source.scope.contains(*id)
                            && selects(policy, &region, item)
                    })
                    .map(|(id, item)| (id, item.kind()))
                    .collect()
            };
            for (id, kind) in doomed {
                doc.remove(id)?;
                debug!("Removed {kind} {id} from {}", dst.name);
                *report.removed.get_mut(kind) += 1;
            }
            report_progress(
                progress,
                stage,
                fraction(index + 1, destinations.len()),
                Some(&dst.name),
            );
        }
        report_progress(progress, stage, 1.0, None);
        Ok(())
    }
}

/// First matched destination footprint already sitting in a group other
/// than `group`.
fn foreign_group<'a>(pairs: &'a [ComponentPair<'_>], group: &str) -> Option<(&'a str, &'a str)> {
    pairs.iter().find_map(|pair| {
        let current = pair.destination.component.group.as_deref()?;
        (current != group).then_some((pair.destination.reference(), current))
    })
}

/// Move one destination footprint into place. Returns whether it was
/// updated.
fn place(
    doc: &mut dyn Document,
    dst: &Destination<'_>,
    pair: &ComponentPair<'_>,
    policy: &ReplicationPolicy,
) -> Result<bool, ReplicateError> {
    let id = pair.destination.id;
    let current = doc.component(id)?;
    if current.locked && !policy.locked.components {
        debug!("Skipping locked footprint {}", current.reference);
        return Ok(false);
    }
    let mut placed = place_component(
        &dst.transform,
        &pair.source.component,
        current,
        id == dst.anchor.id,
    )?;
    if policy.group.components {
        placed.group = dst.group.clone();
    }
    doc.update(id, BoardItem::Component(placed))?;
    Ok(true)
}

fn fraction(done: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        done as f64 / total as f64
    }
}

fn report_progress(
    progress: &mut dyn FnMut(Progress),
    stage: Stage,
    fraction: f64,
    message: Option<&str>,
) {
    progress(Progress {
        stage,
        fraction,
        message: message.map(str::to_string),
    });
}

/// Highlight the footprints and items that would be replicated.
pub fn highlight_scope(
    doc: &mut dyn Document,
    catalog: &Catalog,
    anchor: ItemId,
    level: usize,
    policy: &ReplicationPolicy,
) -> Result<SourceScope, ReplicateError> {
    let source = SourceSheet::resolve(catalog, anchor, level, policy)?;
    for id in source.scope.components.iter().chain(&source.scope.items) {
        doc.set_highlighted(*id, true)?;
    }
    Ok(source.scope)
}

/// Undo [`highlight_scope`].
pub fn clear_highlight(doc: &mut dyn Document, scope: &SourceScope) -> Result<(), DocumentError> {
    for id in scope.components.iter().chain(&scope.items) {
        doc.set_highlighted(*id, false)?;
    }
    Ok(())
}
