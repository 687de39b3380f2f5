//! Which items belong to a sheet instance.
//!
//! The same rule picks the source items to clone and the destination items
//! to clear before replacement. An item qualifies when
//!
//! 1. its box meets the sheet box and its net is used on the sheet (or it
//!    has no meaningful net), or
//! 2. its net is local to the sheet, wherever it is routed, or
//! 3. group items are included, it shares the anchor's group, and its net
//!    is used on the sheet.
//!
//! In group mode only rule 3's group test applies. Locked items are skipped
//! unless the policy allows locked items of their kind.

use log::debug;

use crate::board::{BoardItem, ItemId, ItemKind};
use crate::catalog::{Catalog, components_bounding_box};
use crate::geometry::BoundingBox;
use crate::nets::SheetNets;
use crate::policy::{Coverage, ReplicationPolicy};

/// The area and connectivity of one sheet instance.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    pub bbox: BoundingBox,
    pub nets: &'a SheetNets,
    /// Group of the sheet's anchor footprint
    pub group: Option<&'a str>,
}

impl Region<'_> {
    fn covers(&self, coverage: Coverage, bbox: &BoundingBox) -> bool {
        match coverage {
            Coverage::Contain => self.bbox.contains(bbox),
            Coverage::Intersect => self.bbox.intersects(bbox),
        }
    }

    fn in_group(&self, item: &BoardItem) -> bool {
        self.group.is_some() && item.group() == self.group
    }
}

/// Whether `item` belongs to `region` under `policy`.
pub fn selects(policy: &ReplicationPolicy, region: &Region<'_>, item: &BoardItem) -> bool {
    if item.is_locked() && !policy.locked.get(item.kind()) {
        return false;
    }
    if policy.by_group {
        return region.in_group(item);
    }

    let net = item.net().unwrap_or_default();
    let on_sheet_net = item.is_net_agnostic() || region.nets.contains(net);

    if on_sheet_net && region.covers(policy.coverage, &item.bounding_box()) {
        return true;
    }
    if !net.is_empty() && region.nets.is_local(net) {
        return true;
    }
    policy.include_group_items && on_sheet_net && region.in_group(item)
}

/// The items making up the source sheet.
#[derive(Debug, Clone, Default)]
pub struct SourceScope {
    pub components: Vec<ItemId>,
    pub items: Vec<ItemId>,
    pub bbox: BoundingBox,
}

impl SourceScope {
    pub fn contains(&self, id: ItemId) -> bool {
        self.components.contains(&id) || self.items.contains(&id)
    }

    pub fn items_of<'a>(
        &'a self,
        catalog: &'a Catalog,
        kind: ItemKind,
    ) -> impl Iterator<Item = &'a BoardItem> + 'a {
        self.items
            .iter()
            .filter_map(|id| catalog.item(*id))
            .filter(move |i| i.kind() == kind)
            .map(|i| &i.item)
    }
}

/// Select the footprints and items of the sheet instance `prefix`.
///
/// `nets` must describe the same sheet; `group` is the anchor's group.
pub fn select_source(
    catalog: &Catalog,
    prefix: &[String],
    nets: &SheetNets,
    group: Option<&str>,
    policy: &ReplicationPolicy,
) -> SourceScope {
    let components = catalog.on_sheet(prefix);
    let bbox = components_bounding_box(components.iter().map(|c| &c.component)).unwrap_or_default();
    let region = Region { bbox, nets, group };

    let items = catalog
        .items()
        .iter()
        .filter(|i| {
            let selected = selects(policy, &region, &i.item);
            debug!(
                "{} {} {}",
                i.kind(),
                i.id,
                if selected { "selected" } else { "excluded" }
            );
            selected
        })
        .map(|i| i.id)
        .collect();

    SourceScope {
        components: components.iter().map(|c| c.id).collect(),
        items,
        bbox,
    }
}
