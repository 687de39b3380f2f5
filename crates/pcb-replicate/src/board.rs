//! Board item model and the host document interface.
//!
//! The engine never holds references into a host document across calls.
//! Items are read as owned snapshots through [`Document::item`] and written
//! back with [`Document::update`] or inserted with [`Document::add`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DocumentError;
use crate::geometry::{BoundingBox, Point, flipped_angle, normalize_angle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Component,
    Track,
    Zone,
    Text,
    Drawing,
}

impl ItemKind {
    /// Item kinds that are cloned rather than moved.
    pub const CLONED: [ItemKind; 4] = [
        ItemKind::Track,
        ItemKind::Zone,
        ItemKind::Text,
        ItemKind::Drawing,
    ];
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemKind::Component => "footprint",
            ItemKind::Track => "track",
            ItemKind::Zone => "zone",
            ItemKind::Text => "text",
            ItemKind::Drawing => "drawing",
        };
        f.write_str(name)
    }
}

/// Swap a front/back layer name (`F.Cu` <-> `B.Cu`).
///
/// Inner copper layers (`In1.Cu`, `In2.Cu`, ...) keep their name: a flipped
/// copy stays on the same inner layer, not the mirrored one in the stackup.
/// Board-wide layers such as `Edge.Cuts` are unchanged as well.
pub fn flip_layer(layer: &str) -> String {
    if let Some(rest) = layer.strip_prefix("F.") {
        format!("B.{rest}")
    } else if let Some(rest) = layer.strip_prefix("B.") {
        format!("F.{rest}")
    } else {
        layer.to_string()
    }
}

pub fn is_copper_layer(layer: &str) -> bool {
    layer.ends_with(".Cu")
}

/// Geometric primitives every replicated item supports.
///
/// `rotate` turns the item counter-clockwise (on screen) about `center` and
/// adds `angle` to any orientation it carries. `flip` mirrors it across the
/// horizontal line through `center` and moves it to the opposite side.
pub trait Transform {
    fn translate(&mut self, delta: Point);
    fn rotate(&mut self, center: Point, angle: f64);
    fn flip(&mut self, center: Point);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Justify {
    Start,
    #[default]
    Center,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub width: i64,
    pub height: i64,
    pub thickness: i64,
    pub bold: bool,
    pub italic: bool,
    pub h_justify: Justify,
    pub v_justify: Justify,
    pub keep_upright: bool,
    pub multiline: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            width: 1_000_000,
            height: 1_000_000,
            thickness: 150_000,
            bold: false,
            italic: false,
            h_justify: Justify::Center,
            v_justify: Justify::Center,
            keep_upright: true,
            multiline: false,
        }
    }
}

impl TextStyle {
    /// Approximate extent of `text` rendered with this style, centered on
    /// `position` and turned by `angle`.
    fn extent(&self, text: &str, position: Point, angle: f64) -> BoundingBox {
        let chars = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as i64;
        let lines = text.lines().count().max(1) as i64;
        let half = Point::new(chars * self.width / 2, lines * self.height / 2);
        let local = BoundingBox::new(-half, half);
        BoundingBox::from_points(local.corners().map(|c| position + c.rotated_vec(angle)))
            .unwrap_or(local)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FootprintTextKind {
    Reference,
    Value,
    #[default]
    User,
}

/// A text item owned by a footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintText {
    #[serde(default)]
    pub kind: FootprintTextKind,
    pub text: String,
    /// Position relative to the footprint origin, in board axes
    pub offset: Point,
    #[serde(default)]
    pub angle: f64,
    pub layer: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub mirrored: bool,
    #[serde(default)]
    pub style: TextStyle,
}

impl FootprintText {
    /// Copy placement and style from `other`, keeping this item's content.
    pub fn copy_layout_from(&mut self, other: &FootprintText) {
        self.offset = other.offset;
        self.angle = other.angle;
        self.layer = other.layer.clone();
        self.visible = other.visible;
        self.mirrored = other.mirrored;
        self.style = other.style.clone();
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub name: String,
    #[serde(default)]
    pub net: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneConnection {
    #[default]
    Inherited,
    None,
    ThermalReliefs,
    Solid,
}

/// Footprint-level overrides of the board design rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSettings {
    pub clearance: Option<i64>,
    pub solder_mask_margin: Option<i64>,
    pub solder_paste_margin: Option<i64>,
    pub solder_paste_ratio: Option<f64>,
    pub zone_connection: ZoneConnection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub reference: String,
    #[serde(default)]
    pub value: String,
    /// Schematic identity path, e.g. `/<sheet uuid>/<symbol uuid>`
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    pub position: Point,
    #[serde(default)]
    pub orientation: f64,
    pub layer: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub group: Option<String>,
    /// Courtyard extent in the footprint's own frame (unrotated, front side)
    pub body: BoundingBox,
    #[serde(default)]
    pub pads: Vec<Pad>,
    #[serde(default)]
    pub texts: Vec<FootprintText>,
    #[serde(default)]
    pub settings: LocalSettings,
}

impl Component {
    pub fn is_flipped(&self) -> bool {
        self.layer.starts_with("B.")
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let corners = self.body.corners().map(|c| {
            // Back-side footprints are mirrored in their own X axis.
            let local = if self.is_flipped() {
                Point::new(-c.x, c.y)
            } else {
                c
            };
            self.position + local.rotated_vec(self.orientation)
        });
        BoundingBox::from_points(corners).unwrap_or(self.body)
    }
}

impl Transform for Component {
    fn translate(&mut self, delta: Point) {
        self.position = self.position + delta;
    }

    fn rotate(&mut self, center: Point, angle: f64) {
        self.position = self.position.rotated(center, angle);
        self.orientation = normalize_angle(self.orientation + angle);
        for text in &mut self.texts {
            text.offset = text.offset.rotated_vec(angle);
            text.angle = normalize_angle(text.angle + angle);
        }
    }

    fn flip(&mut self, center: Point) {
        self.position = self.position.flipped(center);
        self.orientation = flipped_angle(self.orientation);
        self.layer = flip_layer(&self.layer);
        for text in &mut self.texts {
            text.offset = Point::new(text.offset.x, -text.offset.y);
            text.angle = flipped_angle(text.angle);
            text.layer = flip_layer(&text.layer);
            text.mirrored = !text.mirrored;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub start: Point,
    pub end: Point,
    pub width: i64,
    pub layer: String,
    #[serde(default)]
    pub net: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub group: Option<String>,
}

impl Transform for Track {
    fn translate(&mut self, delta: Point) {
        self.start = self.start + delta;
        self.end = self.end + delta;
    }

    fn rotate(&mut self, center: Point, angle: f64) {
        self.start = self.start.rotated(center, angle);
        self.end = self.end.rotated(center, angle);
    }

    fn flip(&mut self, center: Point) {
        self.start = self.start.flipped(center);
        self.end = self.end.flipped(center);
        self.layer = flip_layer(&self.layer);
    }
}

/// A filled copper region or a rule area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub name: Option<String>,
    pub outline: Vec<Point>,
    pub layer: String,
    #[serde(default)]
    pub net: String,
    /// Keep-out style area without connectivity
    #[serde(default)]
    pub rule_area: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub filled: bool,
}

impl Zone {
    pub fn is_copper(&self) -> bool {
        !self.rule_area && is_copper_layer(&self.layer)
    }
}

impl Transform for Zone {
    fn translate(&mut self, delta: Point) {
        self.outline.iter_mut().for_each(|p| *p = *p + delta);
    }

    fn rotate(&mut self, center: Point, angle: f64) {
        self.outline
            .iter_mut()
            .for_each(|p| *p = p.rotated(center, angle));
    }

    fn flip(&mut self, center: Point) {
        self.outline.iter_mut().for_each(|p| *p = p.flipped(center));
        self.layer = flip_layer(&self.layer);
    }
}

/// Free text on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    pub position: Point,
    #[serde(default)]
    pub angle: f64,
    pub layer: String,
    #[serde(default)]
    pub mirrored: bool,
    #[serde(default)]
    pub style: TextStyle,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub group: Option<String>,
}

impl Transform for Text {
    fn translate(&mut self, delta: Point) {
        self.position = self.position + delta;
    }

    fn rotate(&mut self, center: Point, angle: f64) {
        self.position = self.position.rotated(center, angle);
        self.angle = normalize_angle(self.angle + angle);
    }

    fn flip(&mut self, center: Point) {
        self.position = self.position.flipped(center);
        self.angle = flipped_angle(self.angle);
        self.layer = flip_layer(&self.layer);
        self.mirrored = !self.mirrored;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Line { start: Point, end: Point },
    Arc { start: Point, mid: Point, end: Point },
    /// Circle through `end` centered on `center`
    Circle { center: Point, end: Point },
    Polygon { points: Vec<Point> },
}

impl Shape {
    fn points_mut(&mut self) -> Vec<&mut Point> {
        match self {
            Shape::Line { start, end } => vec![start, end],
            Shape::Arc { start, mid, end } => vec![start, mid, end],
            Shape::Circle { center, end } => vec![center, end],
            Shape::Polygon { points } => points.iter_mut().collect(),
        }
    }

    fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Shape::Line { start, end } => Some(BoundingBox::new(*start, *end)),
            Shape::Arc { start, mid, end } => BoundingBox::from_points([*start, *mid, *end]),
            Shape::Circle { center, end } => {
                let r = center.distance(*end).round() as i64;
                Some(BoundingBox::new(*center, *center).inflate(r))
            }
            Shape::Polygon { points } => BoundingBox::from_points(points.iter().copied()),
        }
    }
}

/// A graphic shape on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub shape: Shape,
    pub layer: String,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub group: Option<String>,
}

impl Transform for Drawing {
    fn translate(&mut self, delta: Point) {
        for p in self.shape.points_mut() {
            *p = *p + delta;
        }
    }

    fn rotate(&mut self, center: Point, angle: f64) {
        for p in self.shape.points_mut() {
            *p = p.rotated(center, angle);
        }
    }

    fn flip(&mut self, center: Point) {
        for p in self.shape.points_mut() {
            *p = p.flipped(center);
        }
        self.layer = flip_layer(&self.layer);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BoardItem {
    Component(Component),
    Track(Track),
    Zone(Zone),
    Text(Text),
    Drawing(Drawing),
}

impl BoardItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            BoardItem::Component(_) => ItemKind::Component,
            BoardItem::Track(_) => ItemKind::Track,
            BoardItem::Zone(_) => ItemKind::Zone,
            BoardItem::Text(_) => ItemKind::Text,
            BoardItem::Drawing(_) => ItemKind::Drawing,
        }
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            BoardItem::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn layer(&self) -> &str {
        match self {
            BoardItem::Component(c) => &c.layer,
            BoardItem::Track(t) => &t.layer,
            BoardItem::Zone(z) => &z.layer,
            BoardItem::Text(t) => &t.layer,
            BoardItem::Drawing(d) => &d.layer,
        }
    }

    pub fn is_locked(&self) -> bool {
        match self {
            BoardItem::Component(c) => c.locked,
            BoardItem::Track(t) => t.locked,
            BoardItem::Zone(z) => z.locked,
            BoardItem::Text(t) => t.locked,
            BoardItem::Drawing(d) => d.locked,
        }
    }

    pub fn group(&self) -> Option<&str> {
        match self {
            BoardItem::Component(c) => c.group.as_deref(),
            BoardItem::Track(t) => t.group.as_deref(),
            BoardItem::Zone(z) => z.group.as_deref(),
            BoardItem::Text(t) => t.group.as_deref(),
            BoardItem::Drawing(d) => d.group.as_deref(),
        }
    }

    pub fn set_group(&mut self, group: Option<String>) {
        match self {
            BoardItem::Component(c) => c.group = group,
            BoardItem::Track(t) => t.group = group,
            BoardItem::Zone(z) => z.group = group,
            BoardItem::Text(t) => t.group = group,
            BoardItem::Drawing(d) => d.group = group,
        }
    }

    /// Net of a single-net item. Footprints, text and drawings have none.
    pub fn net(&self) -> Option<&str> {
        match self {
            BoardItem::Track(t) => Some(&t.net),
            BoardItem::Zone(z) => Some(&z.net),
            _ => None,
        }
    }

    pub fn set_net(&mut self, net: &str) {
        match self {
            BoardItem::Track(t) => t.net = net.to_string(),
            BoardItem::Zone(z) => z.net = net.to_string(),
            _ => {}
        }
    }

    /// Items whose net carries no meaning for replication: text, drawings,
    /// rule areas, non-copper zones and anything without a net.
    pub fn is_net_agnostic(&self) -> bool {
        match self {
            BoardItem::Zone(z) if !z.is_copper() => true,
            _ => self.net().is_none_or(str::is_empty),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            BoardItem::Component(c) => c.bounding_box(),
            BoardItem::Track(t) => BoundingBox::new(t.start, t.end).inflate(t.width / 2),
            BoardItem::Zone(z) => BoundingBox::from_points(z.outline.iter().copied())
                .unwrap_or_default(),
            BoardItem::Text(t) => t.style.extent(&t.text, t.position, t.angle),
            BoardItem::Drawing(d) => d
                .shape
                .bounding_box()
                .unwrap_or_default()
                .inflate(d.width / 2),
        }
    }
}

impl Transform for BoardItem {
    fn translate(&mut self, delta: Point) {
        match self {
            BoardItem::Component(c) => c.translate(delta),
            BoardItem::Track(t) => t.translate(delta),
            BoardItem::Zone(z) => z.translate(delta),
            BoardItem::Text(t) => t.translate(delta),
            BoardItem::Drawing(d) => d.translate(delta),
        }
    }

    fn rotate(&mut self, center: Point, angle: f64) {
        match self {
            BoardItem::Component(c) => c.rotate(center, angle),
            BoardItem::Track(t) => t.rotate(center, angle),
            BoardItem::Zone(z) => z.rotate(center, angle),
            BoardItem::Text(t) => t.rotate(center, angle),
            BoardItem::Drawing(d) => d.rotate(center, angle),
        }
    }

    fn flip(&mut self, center: Point) {
        match self {
            BoardItem::Component(c) => c.flip(center),
            BoardItem::Track(t) => t.flip(center),
            BoardItem::Zone(z) => z.flip(center),
            BoardItem::Text(t) => t.flip(center),
            BoardItem::Drawing(d) => d.flip(center),
        }
    }
}

/// Capabilities the engine needs from the board host.
pub trait Document {
    /// Path of the board file, used to locate the root schematic.
    fn file_name(&self) -> Option<&Path>;

    /// All items in document order.
    fn items(&self) -> Vec<(ItemId, &BoardItem)>;

    fn item(&self, id: ItemId) -> Option<&BoardItem>;

    /// Replace an existing item in place.
    fn update(&mut self, id: ItemId, item: BoardItem) -> Result<(), DocumentError>;

    /// Insert a new item. The host assigns its id.
    fn add(&mut self, item: BoardItem) -> Result<ItemId, DocumentError>;

    fn remove(&mut self, id: ItemId) -> Result<BoardItem, DocumentError>;

    /// Net code for a net name; the empty name is code 0.
    fn net_code(&self, name: &str) -> Option<u32>;

    fn group_exists(&self, name: &str) -> bool;

    fn create_group(&mut self, name: &str) -> Result<(), DocumentError>;

    fn set_highlighted(&mut self, id: ItemId, highlighted: bool) -> Result<(), DocumentError>;

    /// Refill every copper zone, returning how many were filled.
    fn refill_zones(&mut self) -> usize;

    /// Snapshot of a footprint.
    fn component(&self, id: ItemId) -> Result<&Component, DocumentError> {
        self.item(id)
            .ok_or(DocumentError::UnknownItem(id))?
            .as_component()
            .ok_or(DocumentError::NotAComponent(id))
    }
}
