// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use cluster_topology::zone::{ZoneRecord, ZoneSource, ZoneTransfer};
use hickory_client::op::ResponseCode;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use tempfile::TempDir;

pub const CLUSTER_DOMAIN: &str = "ocp.example.com";

pub const INSTALL_CONFIG: &str = r"
apiVersion: v1
baseDomain: example.com
metadata:
  name: ocp
compute:
- name: worker
  replicas: 2
controlPlane:
  name: master
  replicas: 3
networking:
  machineNetwork:
  - cidr: 10.0.0.0/24
platform:
  vsphere:
    vCenter: vcenter.example.com
    username: administrator@vsphere.local
    password: secret
    datacenter: dc1
    cluster: cluster1
    defaultDatastore: datastore1
    network: VM Network
";

/// In-memory zone served by a single primary at 10.0.0.2.
pub struct StaticZone {
    pub records: Vec<ZoneRecord>,
    pub response_code: ResponseCode,
}

impl StaticZone {
    pub fn new(records: &[(&str, [u8; 4])]) -> Self {
        Self {
            records: records
                .iter()
                .map(|(name, ip)| ZoneRecord::new(*name, Ipv4Addr::from(*ip)))
                .collect(),
            response_code: ResponseCode::NoError,
        }
    }

    /// bootstrap, three masters and two workers, all on 10.0.0.0/24.
    pub fn cluster() -> Self {
        Self::new(&[
            ("bootstrap", [10, 0, 0, 50]),
            ("master0", [10, 0, 0, 10]),
            ("master1", [10, 0, 0, 11]),
            ("master2", [10, 0, 0, 12]),
            ("worker0", [10, 0, 0, 20]),
            ("worker1", [10, 0, 0, 21]),
            ("api", [10, 0, 0, 5]),
        ])
    }
}

impl ZoneSource for StaticZone {
    fn resolve_soa(&self, domain: &str) -> Result<String> {
        if domain == CLUSTER_DOMAIN {
            Ok("ns1.example.com.".to_string())
        } else {
            Err(anyhow!("NXDOMAIN for {domain}"))
        }
    }

    fn resolve_a(&self, host: &str) -> Result<Vec<Ipv4Addr>> {
        match host {
            "ns1.example.com." => Ok(vec![Ipv4Addr::new(10, 0, 0, 2)]),
            _ => Err(anyhow!("NXDOMAIN for {host}")),
        }
    }

    fn zone_transfer(&self, _primary: SocketAddr, _domain: &str) -> Result<ZoneTransfer> {
        Ok(ZoneTransfer {
            response_code: self.response_code,
            records: self.records.clone(),
            name_servers: vec!["ns1.example.com.".to_string()],
        })
    }
}

/// Install directory holding the three role base documents.
pub fn install_dir() -> TempDir {
    let dir = TempDir::new().expect("create install dir");
    for role in ["bootstrap", "master", "worker"] {
        write_base_document(dir.path(), role);
    }
    dir
}

pub fn write_base_document(dir: &Path, role: &str) {
    let document = serde_json::json!({
        "ignition": { "version": "2.2.0" },
        "storage": {
            "files": [{
                "filesystem": "root",
                "path": format!("/etc/{role}-marker"),
                "mode": 420,
                "contents": { "source": "data:," }
            }]
        }
    });
    fs::write(
        dir.join(format!("{role}.ign")),
        serde_json::to_string(&document).expect("serialize base document"),
    )
    .expect("write base document");
}
