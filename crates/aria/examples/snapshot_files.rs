//! Snapshot from saved CDP responses
//!
//! Usage: snapshot_files <DOM.getDocument.json> [DOMSnapshot.captureSnapshot.json] [--list]

use aria::{DomService, RenderOptions, SnapshotFormat};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let list = args.iter().any(|arg| arg == "--list");
    let files: Vec<&String> = args.iter().filter(|arg| !arg.starts_with("--")).collect();
    let dom_path = files
        .first()
        .ok_or("usage: snapshot_files <dom.json> [snapshot.json] [--list]")?;

    let mut service = DomService::new();
    let dom = serde_json::from_str(&fs::read_to_string(dom_path)?)?;
    service.parse_cdp_dom_tree(&dom)?;

    if let Some(snapshot_path) = files.get(1) {
        let snapshot = serde_json::from_str(&fs::read_to_string(snapshot_path)?)?;
        service.merge_snapshot(&snapshot, 1.0)?;
    }

    let render = RenderOptions {
        format: if list {
            SnapshotFormat::List
        } else {
            SnapshotFormat::Tree
        },
        ..service.config().render.clone()
    };
    let tree = service.config().tree.clone();
    let output = service.snapshot_with(&tree, &render)?;
    println!("{}", output.text);

    for entry in service.session().registry().entries() {
        println!("{} -> backend node {}", entry.ref_id, entry.backend_node_id);
    }
    Ok(())
}
