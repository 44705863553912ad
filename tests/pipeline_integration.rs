// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end tests: install config, zone snapshot, classification, variable
//! file and per-host Ignition documents.
//!
//! The live test against a real name server is ignored by default.
//! Run with: `CLUSTER_TOPOLOGY_TEST_RESOLVER=10.0.0.2:53 cargo test --test pipeline_integration -- --ignored`

mod common;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cluster_topology::install_config::InstallConfig;
use cluster_topology::pipeline::{generate, generate_gateway};
use cluster_topology::settings::Settings;
use cluster_topology::variables::read_variable;
use cluster_topology::zone::{fetch_zone_snapshot, HickoryZoneSource};
use common::{install_dir, StaticZone, CLUSTER_DOMAIN, INSTALL_CONFIG};
use hickory_client::op::ResponseCode;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn decode_file(entry: &Value) -> String {
    let source = entry["contents"]["source"].as_str().unwrap();
    let payload = source
        .strip_prefix("data:text/plain;charset=utf-8;base64,")
        .unwrap();
    String::from_utf8(BASE64.decode(payload).unwrap()).unwrap()
}

#[test]
fn test_generate_writes_variables_and_host_documents() {
    let config = InstallConfig::from_yaml(INSTALL_CONFIG).unwrap();
    let install = install_dir();
    let out = TempDir::new().unwrap();
    let settings = Settings::new(out.path(), install.path());

    let output = generate(&config, &settings, &StaticZone::cluster()).unwrap();

    assert_eq!(output.host_documents.len(), 6);

    let variables = out.path().join("variables.tf.json");
    assert_eq!(read_variable(&variables, "master_count").unwrap(), json!(3));
    assert_eq!(read_variable(&variables, "worker_count").unwrap(), json!(2));
    assert_eq!(
        read_variable(&variables, "vsphere_network").unwrap(),
        json!("VM Network")
    );
    assert_eq!(
        read_variable(&variables, "default_route").unwrap(),
        json!("10.0.0.1")
    );
    let workers = read_variable(&variables, "worker_spec").unwrap();
    assert_eq!(
        workers["worker1"],
        json!({
            "host_name": "worker1.ocp.example.com",
            "nic1": { "ip_address": "10.0.0.21" }
        })
    );

    // The variable file keeps insertion order
    let text = fs::read_to_string(&variables).unwrap();
    let bootstrap_at = text.find("\"bootstrap_spec\"").unwrap();
    let cluster_at = text.find("\"cluster_name\"").unwrap();
    assert!(cluster_at < bootstrap_at);
}

#[test]
fn test_generate_host_document_contents() {
    let config = InstallConfig::from_yaml(INSTALL_CONFIG).unwrap();
    let install = install_dir();
    let out = TempDir::new().unwrap();
    let settings = Settings::new(out.path(), install.path());

    generate(&config, &settings, &StaticZone::cluster()).unwrap();

    let master1 = read_json(&install.path().join("master1.ign"));
    let files = master1["storage"]["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["path"], "/etc/master-marker");
    assert_eq!(files[1]["path"], "/etc/sysconfig/network-scripts/ifcfg-ens192");
    assert_eq!(files[1]["mode"], 420);

    let ifcfg = decode_file(&files[1]);
    assert!(ifcfg.contains("IPADDR=10.0.0.11\n"));
    assert!(ifcfg.contains("GATEWAY=10.0.0.1\n"));
    assert!(ifcfg.contains("DOMAIN=ocp.example.com\n"));
    assert!(ifcfg.contains("DNS1=10.0.0.2\n"));

    // Bootstrap host gets its own document; the base is untouched
    let bootstrap = read_json(&install.path().join("bootstrap-node.ign"));
    assert_eq!(bootstrap["storage"]["files"].as_array().unwrap().len(), 2);
    let base = read_json(&install.path().join("bootstrap.ign"));
    assert_eq!(base["storage"]["files"].as_array().unwrap().len(), 1);
}

#[test]
fn test_generate_twice_is_idempotent() {
    let config = InstallConfig::from_yaml(INSTALL_CONFIG).unwrap();
    let install = install_dir();
    let out = TempDir::new().unwrap();
    let settings = Settings::new(out.path(), install.path());
    let zone = StaticZone::cluster();

    generate(&config, &settings, &zone).unwrap();
    let first_vars = fs::read_to_string(out.path().join("variables.tf.json")).unwrap();
    let first_doc = fs::read_to_string(install.path().join("worker0.ign")).unwrap();

    generate(&config, &settings, &zone).unwrap();

    assert_eq!(
        fs::read_to_string(out.path().join("variables.tf.json")).unwrap(),
        first_vars
    );
    assert_eq!(
        fs::read_to_string(install.path().join("worker0.ign")).unwrap(),
        first_doc
    );
}

#[test]
fn test_generate_dual_nic() {
    let config = InstallConfig::from_yaml(INSTALL_CONFIG).unwrap();
    let install = install_dir();
    let out = TempDir::new().unwrap();
    let settings = Settings {
        dual_nic: true,
        ..Settings::new(out.path(), install.path())
    };
    let mut zone = StaticZone::cluster();
    zone.records.extend(
        StaticZone::new(&[
            ("bootstrap-lb", [10, 0, 1, 50]),
            ("master0-lb", [10, 0, 1, 10]),
        ])
        .records,
    );

    generate(&config, &settings, &zone).unwrap();

    let variables = out.path().join("variables.tf.json");
    assert_eq!(
        read_variable(&variables, "default_route").unwrap(),
        json!("10.0.1.1")
    );

    let master0 = read_json(&install.path().join("master0.ign"));
    let files = master0["storage"]["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    let primary = decode_file(&files[1]);
    let secondary = decode_file(&files[2]);
    assert!(!primary.contains("GATEWAY="));
    assert!(secondary.contains("DEVICE=ens224\n"));
    assert!(secondary.contains("GATEWAY=10.0.1.1\n"));
    assert!(!secondary.contains("DOMAIN="));
}

#[test]
fn test_generate_incomplete_topology_writes_nothing() {
    let config = InstallConfig::from_yaml(INSTALL_CONFIG).unwrap();
    let install = install_dir();
    let out = TempDir::new().unwrap();
    let settings = Settings::new(out.path(), install.path());
    let mut zone = StaticZone::cluster();
    zone.records.retain(|r| r.name != "master0");

    let err = generate(&config, &settings, &zone).unwrap_err();

    assert_eq!(err.status_reason(), "IncompleteTopology");
    assert!(err.to_string().contains("master"));
    assert!(!out.path().join("variables.tf.json").exists());
    assert!(!install.path().join("worker0.ign").exists());
}

#[test]
fn test_generate_refused_transfer() {
    let config = InstallConfig::from_yaml(INSTALL_CONFIG).unwrap();
    let install = install_dir();
    let out = TempDir::new().unwrap();
    let settings = Settings::new(out.path(), install.path());
    let mut zone = StaticZone::cluster();
    zone.response_code = ResponseCode::Refused;

    let err = generate(&config, &settings, &zone).unwrap_err();

    assert_eq!(err.status_reason(), "ZoneTransferRefused");
    assert!(err.to_string().contains(CLUSTER_DOMAIN));
    assert!(!out.path().join("variables.tf.json").exists());
}

#[test]
fn test_generate_gateway_flat_pools() {
    let config = InstallConfig::from_yaml(INSTALL_CONFIG).unwrap();
    let out = TempDir::new().unwrap();
    let settings = Settings::new(out.path(), out.path());

    let document = generate_gateway(&config, &settings, &StaticZone::cluster()).unwrap();

    assert_eq!(document.len(), 4);
    let variables = out.path().join("variables.tf.json");
    assert_eq!(
        read_variable(&variables, "control_plane_addresses").unwrap(),
        json!(["10.0.0.50", "10.0.0.10", "10.0.0.11", "10.0.0.12"])
    );
    assert_eq!(
        read_variable(&variables, "worker_addresses").unwrap(),
        json!(["10.0.0.20", "10.0.0.21"])
    );
    // No host documents in the gateway flow
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
}

#[test]
fn test_generate_gateway_failure_writes_nothing() {
    let config = InstallConfig::from_yaml(INSTALL_CONFIG).unwrap();
    let out = TempDir::new().unwrap();
    let settings = Settings::new(out.path(), out.path());
    let mut zone = StaticZone::cluster();
    zone.records.retain(|r| !r.name.starts_with("worker"));

    let err = generate_gateway(&config, &settings, &zone).unwrap_err();

    assert_eq!(err.status_reason(), "IncompleteTopology");
    assert!(err.to_string().contains("worker"));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_generate_gateway_refused_transfer() {
    let config = InstallConfig::from_yaml(INSTALL_CONFIG).unwrap();
    let out = TempDir::new().unwrap();
    let settings = Settings::new(out.path(), out.path());
    let mut zone = StaticZone::cluster();
    zone.response_code = ResponseCode::Refused;

    let err = generate_gateway(&config, &settings, &zone).unwrap_err();

    assert_eq!(err.status_reason(), "ZoneTransferRefused");
}

#[test]
#[ignore = "requires a name server allowing AXFR of ocp.example.com"]
fn test_live_zone_snapshot() {
    let Ok(resolver) = std::env::var("CLUSTER_TOPOLOGY_TEST_RESOLVER") else {
        eprintln!("Skipping live test: CLUSTER_TOPOLOGY_TEST_RESOLVER not set");
        return;
    };
    let source = HickoryZoneSource::new(resolver.parse().unwrap());

    let snapshot = fetch_zone_snapshot(&source, CLUSTER_DOMAIN).unwrap();

    assert!(!snapshot.records.is_empty());
    assert!(!snapshot.name_servers.is_empty());
}
