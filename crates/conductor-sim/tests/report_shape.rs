//! The JSON printed by `conductor run` keeps the camelCase field names
//! downstream dashboards read.

use conductor_core::{KernelConfig, StaticRegistry};
use conductor_kernel::Kernel;
use conductor_sim::{run, SimOptions};

fn registry_file(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("engines.json");
    std::fs::write(
        &path,
        r#"{"engines": [
            {"name": "planner", "weight": 50},
            {"name": "critic", "weight": 30},
            {"name": "scribe", "weight": 20}
        ]}"#,
    )
    .unwrap();
    path
}

#[test]
fn test_report_json_shape() {
    let dir = tempfile::tempdir().unwrap();
    let registry = StaticRegistry::load(&registry_file(dir.path())).unwrap();
    let mut kernel = Kernel::new(&registry, KernelConfig::with_budget(10_000)).unwrap();

    let report = run(
        &mut kernel,
        &SimOptions {
            ticks: 4,
            slot_cost: 50,
        },
    )
    .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["ticks"], 4);
    assert!(json["messagesDelivered"].is_number());
    assert!(json["messagesRejected"].is_number());
    assert!(json["exceededEvents"].is_array());

    let snapshot = &json["snapshot"];
    assert_eq!(snapshot["state"], "stopped");
    assert_eq!(snapshot["tickCount"], 4);
    assert!(snapshot["headroom"].is_number());

    let engines = snapshot["engines"].as_array().unwrap();
    assert_eq!(engines.len(), 3);
    assert_eq!(engines[0]["engineName"], "planner");
    for engine in engines {
        assert!(engine["allocation"].is_number());
        assert!(engine["spent"].is_number());
        assert!(engine["remaining"].is_number());
        assert!(engine["exceeded"].is_boolean());
        assert!(engine["burstActive"].is_boolean());
    }
}

#[test]
fn test_every_heartbeat_delivered() {
    let dir = tempfile::tempdir().unwrap();
    let registry = StaticRegistry::load(&registry_file(dir.path())).unwrap();
    let mut kernel = Kernel::new(&registry, KernelConfig::default()).unwrap();

    let report = run(&mut kernel, &SimOptions::default()).unwrap();
    assert!(report.messages_delivered > 0);
    assert_eq!(report.messages_rejected, 0);
    for name in ["planner", "critic", "scribe"] {
        assert_eq!(kernel.pending_messages(name).unwrap(), 0);
    }
}
