use std::collections::BTreeMap;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use pcb_replicate::board::Pad;
use pcb_replicate::{BoardItem, BoundingBox, Component, Document, MemoryBoard, Point};

fn footprint(reference: &str, sheet: &str, symbol: &str, x: i64, pads: &[&str]) -> BoardItem {
    BoardItem::Component(Component {
        reference: reference.into(),
        value: String::new(),
        path: format!("/{sheet}/{symbol}"),
        properties: BTreeMap::from([
            ("Sheetname".to_string(), format!("Channel {sheet}")),
            ("Sheetfile".to_string(), "channel.kicad_sch".to_string()),
        ]),
        position: Point::new(x, 1000),
        orientation: 0.0,
        layer: "F.Cu".into(),
        locked: false,
        group: None,
        body: BoundingBox::new(Point::new(-50, -50), Point::new(50, 50)),
        pads: pads
            .iter()
            .enumerate()
            .map(|(i, net)| Pad {
                name: (i + 1).to_string(),
                net: net.to_string(),
            })
            .collect(),
        texts: Vec::new(),
        settings: Default::default(),
    })
}

fn write_board(dir: &TempDir) -> anyhow::Result<()> {
    let mut board = MemoryBoard::new();
    for (n, x) in [(1, 1000), (2, 5000), (3, 9000)] {
        let sheet = format!("ch{n}");
        let out = format!("/{sheet}/OUT");
        board.add(footprint(&format!("Q{n}"), &sheet, "q", x, &[out.as_str(), "GND"]))?;
        // Only the first channel has its resistor placed.
        let r_x = if n == 1 { x + 200 } else { x + 3000 };
        board.add(footprint(&format!("R{n}"), &sheet, "r", r_x, &[out.as_str()]))?;
    }
    board.add(BoardItem::Track(pcb_replicate::board::Track {
        start: Point::new(1000, 1000),
        end: Point::new(1000, 1200),
        width: 10,
        layer: "F.Cu".into(),
        net: "/ch1/OUT".into(),
        locked: false,
        group: None,
    }))?;
    dir.child("board.json").write_str(&board.to_json()?)?;
    Ok(())
}

fn pcb(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pcb").unwrap();
    cmd.current_dir(dir.path()).env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_sheets_lists_candidates() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_board(&dir)?;

    let output = pcb(&dir).args(["sheets", "board.json", "-a", "Q2"]).output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("0: Channel ch2 (channel.kicad_sch)"));
    assert!(stdout.contains("0: Channel ch1 (anchor Q1)"));
    assert!(stdout.contains("1: Channel ch3 (anchor Q3)"));
    Ok(())
}

#[test]
fn test_replicate_selected_sheet() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_board(&dir)?;

    let output = pcb(&dir)
        .args(["replicate", "board.json", "-a", "Q1", "-s", "1"])
        .args(["-o", "out.json", "--report", "report.json"])
        .output()?;
    assert!(output.status.success(), "{output:?}");

    let board = MemoryBoard::from_json(&std::fs::read_to_string(dir.path().join("out.json"))?)?;
    let (_, r3) = board.find_component("R3").unwrap();
    assert_eq!(r3.position, Point::new(9200, 1000));
    let (_, r2) = board.find_component("R2").unwrap();
    assert_eq!(r2.position, Point::new(8000, 1000));
    let cloned = board
        .items()
        .into_iter()
        .filter(|(_, item)| item.net() == Some("/ch3/OUT"))
        .count();
    assert_eq!(cloned, 1);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("report.json"))?)?;
    assert_eq!(report["placed_components"], 2);
    assert_eq!(report["cloned"]["tracks"], 1);
    Ok(())
}

#[test]
fn test_unknown_reference() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_board(&dir)?;

    let output = pcb(&dir).args(["replicate", "board.json", "-a", "U9"]).output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("No footprint with reference U9 on the board"));
    Ok(())
}
