//! Moving layout from the source anchor's frame to a destination anchor's.

use log::debug;

use crate::board::{BoardItem, Component, Transform};
use crate::error::ReplicateError;
use crate::geometry::{Point, flipped_angle, normalize_angle};
use crate::matcher::check_text_count;
use crate::nets::NetMap;

/// Rigid motion taking the source anchor onto a destination anchor.
///
/// Items are translated by the anchor offset, flipped about the destination
/// anchor when the anchors sit on opposite sides, then rotated about the
/// destination anchor. When the anchors are flipped relative to each other
/// the rotation is derived from the flipped source orientation, so the
/// source anchor always lands exactly on the destination anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorTransform {
    pub src_pos: Point,
    pub dst_pos: Point,
    pub mirror: bool,
    pub rotation: f64,
}

impl AnchorTransform {
    pub fn between(source: &Component, destination: &Component) -> Self {
        let mirror = source.is_flipped() != destination.is_flipped();
        let src_angle = if mirror {
            flipped_angle(source.orientation)
        } else {
            source.orientation
        };
        Self {
            src_pos: source.position,
            dst_pos: destination.position,
            mirror,
            rotation: normalize_angle(destination.orientation - src_angle),
        }
    }

    pub fn apply<T: Transform + ?Sized>(&self, item: &mut T) {
        item.translate(self.dst_pos - self.src_pos);
        if self.mirror {
            item.flip(self.dst_pos);
        }
        item.rotate(self.dst_pos, self.rotation);
    }
}

/// Lay out `destination` the way `source` sits relative to its anchor.
///
/// The destination keeps its identity, reference, value and pads. It takes
/// the transformed pose, the source's local settings and the transformed
/// layout of each footprint text. The destination anchor keeps its own
/// pose.
pub fn place_component(
    transform: &AnchorTransform,
    source: &Component,
    destination: &Component,
    is_anchor: bool,
) -> Result<Component, ReplicateError> {
    check_text_count(source, destination)?;

    let mut placed = source.clone();
    transform.apply(&mut placed);

    let mut result = destination.clone();
    if !is_anchor {
        result.position = placed.position;
        result.orientation = placed.orientation;
        result.layer = placed.layer;
    }
    for (text, layout) in result.texts.iter_mut().zip(&placed.texts) {
        text.copy_layout_from(layout);
    }
    result.settings = source.settings.clone();

    debug!(
        "Placed {} at ({}, {}) {} on {}",
        result.reference, result.position.x, result.position.y, result.orientation, result.layer
    );
    Ok(result)
}

/// A transformed copy of a source item for one destination sheet.
///
/// The copy leaves the source item's group and carries the destination net
/// paired with its source net, or no net when there is no pairing.
pub fn clone_item(transform: &AnchorTransform, source: &BoardItem, nets: &NetMap) -> BoardItem {
    let mut item = source.clone();
    item.set_group(None);
    transform.apply(&mut item);

    let net = if source.is_net_agnostic() {
        ""
    } else {
        let net = source.net().unwrap_or_default();
        nets.destination(net).unwrap_or_else(|| {
            debug!("Net {net} has no counterpart on the destination sheet");
            ""
        })
    };
    item.set_net(net);
    item
}
