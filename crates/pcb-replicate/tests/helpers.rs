#![allow(dead_code)]

use std::collections::BTreeMap;

use pcb_replicate::board::{FootprintText, FootprintTextKind, Text, TextStyle, Track};
use pcb_replicate::{BoardItem, BoundingBox, Component, Document, ItemId, MemoryBoard, Point};

pub const CHANNEL_FILE: &str = "channel.kicad_sch";

/// A footprint on `sheets` (instance ids, root first), front side at the origin.
pub fn footprint(
    reference: &str,
    sheets: &[&str],
    symbol: &str,
    pads: &[(&str, &str)],
) -> Component {
    let mut path = String::new();
    for sheet in sheets {
        path.push('/');
        path.push_str(sheet);
    }
    path.push('/');
    path.push_str(symbol);

    let properties = match sheets.last() {
        Some(sheet) => BTreeMap::from([
            ("Sheetname".to_string(), format!("Channel {sheet}")),
            ("Sheetfile".to_string(), CHANNEL_FILE.to_string()),
        ]),
        None => BTreeMap::new(),
    };

    Component {
        reference: reference.into(),
        value: String::new(),
        path,
        properties,
        position: Point::default(),
        orientation: 0.0,
        layer: "F.Cu".into(),
        locked: false,
        group: None,
        body: BoundingBox::new(Point::new(-50, -50), Point::new(50, 50)),
        pads: pads
            .iter()
            .map(|(name, net)| pcb_replicate::board::Pad {
                name: name.to_string(),
                net: net.to_string(),
            })
            .collect(),
        texts: vec![FootprintText {
            kind: FootprintTextKind::Reference,
            text: reference.into(),
            offset: Point::new(0, -80),
            angle: 0.0,
            layer: "F.SilkS".into(),
            visible: true,
            mirrored: false,
            style: small_text(),
        }],
        settings: Default::default(),
    }
}

pub fn placed(
    mut component: Component,
    x: i64,
    y: i64,
    orientation: f64,
    layer: &str,
) -> Component {
    component.position = Point::new(x, y);
    component.orientation = orientation;
    component.layer = layer.into();
    component
}

pub fn small_text() -> TextStyle {
    TextStyle {
        width: 40,
        height: 40,
        thickness: 5,
        ..Default::default()
    }
}

pub fn track(from: (i64, i64), to: (i64, i64), net: &str) -> BoardItem {
    BoardItem::Track(Track {
        start: Point::new(from.0, from.1),
        end: Point::new(to.0, to.1),
        width: 10,
        layer: "F.Cu".into(),
        net: net.into(),
        locked: false,
        group: None,
    })
}

pub fn label(text: &str, x: i64, y: i64) -> BoardItem {
    BoardItem::Text(Text {
        text: text.into(),
        position: Point::new(x, y),
        angle: 0.0,
        layer: "F.SilkS".into(),
        mirrored: false,
        style: small_text(),
        locked: false,
        group: None,
    })
}

/// Transistor `Q<n>` and resistor `R<n>` on sheet `ch<n>`.
///
/// `/ch<n>/OUT` and the resistor's second net are local to the sheet, GND and
/// `supply` are shared with the connector.
pub fn add_channel(
    board: &mut MemoryBoard,
    n: usize,
    q: (i64, i64, f64, &str),
    r: (i64, i64),
    supply: &str,
) -> (ItemId, ItemId) {
    let sheet = format!("ch{n}");
    let out = format!("/ch{n}/OUT");
    let local = format!("Net-(R{n}-Pad2)");
    let transistor = footprint(
        &format!("Q{n}"),
        &[sheet.as_str()],
        "q",
        &[("1", out.as_str()), ("2", "GND"), ("3", supply)],
    );
    let resistor = footprint(
        &format!("R{n}"),
        &[sheet.as_str()],
        "r",
        &[("1", out.as_str()), ("2", local.as_str())],
    );
    let q_id = board
        .add(BoardItem::Component(placed(transistor, q.0, q.1, q.2, q.3)))
        .unwrap();
    let r_id = board
        .add(BoardItem::Component(placed(resistor, r.0, r.1, 0.0, "F.Cu")))
        .unwrap();
    (q_id, r_id)
}

/// Two channel instances plus a connector on the root sheet.
///
/// Channel 1 is laid out: Q1 at (1000, 1000), R1 200 to its right, a GND
/// stub and a label inside the sheet box, and an output track routed below
/// the box. Channel 2 is unplaced apart from its anchor Q2.
pub fn channel_board(q2_orientation: f64, q2_layer: &str) -> MemoryBoard {
    let mut board = MemoryBoard::new();
    add_channel(&mut board, 1, (1000, 1000, 0.0, "F.Cu"), (1200, 1000), "/VIN");
    add_channel(
        &mut board,
        2,
        (5000, 1000, q2_orientation, q2_layer),
        (8000, 8000),
        "/VBAT",
    );
    let connector = footprint(
        "J1",
        &[],
        "j",
        &[("1", "GND"), ("2", "/VIN"), ("3", "/VBAT")],
    );
    board
        .add(BoardItem::Component(placed(connector, 3000, 3000, 0.0, "F.Cu")))
        .unwrap();

    board.add(track((1000, 1000), (1100, 1000), "GND")).unwrap();
    board.add(track((1000, 1200), (1400, 1200), "/ch1/OUT")).unwrap();
    board.add(track((3000, 3000), (3500, 3000), "GND")).unwrap();
    board.add(label("CH", 1100, 1020)).unwrap();
    board
}

pub fn component<'a>(board: &'a MemoryBoard, reference: &str) -> &'a Component {
    board.find_component(reference).unwrap().1
}

pub fn component_id(board: &MemoryBoard, reference: &str) -> ItemId {
    board.find_component(reference).unwrap().0
}

/// Tracks of `board` on `net`.
pub fn tracks_on<'a>(board: &'a MemoryBoard, net: &str) -> Vec<&'a Track> {
    board
        .items()
        .into_iter()
        .filter_map(|(_, item)| match item {
            BoardItem::Track(t) if t.net == net => Some(t),
            _ => None,
        })
        .collect()
}

/// Board contents without item ids.
pub fn contents(board: &MemoryBoard) -> Vec<BoardItem> {
    board.entries().iter().map(|e| e.item.clone()).collect()
}
