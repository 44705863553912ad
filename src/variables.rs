// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Terraform variable document assembly and per-host materialization.
//!
//! The variable document is written as `variables.tf.json`:
//!
//! ```json
//! {
//!     "variable": {
//!         "cluster_name": { "default": "ocp" },
//!         "master_spec": {
//!             "type": "map",
//!             "default": {
//!                 "master0": {
//!                     "host_name": "master0.ocp.example.com",
//!                     "nic1": { "ip_address": "10.0.0.10" }
//!                 }
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! Variables keep their insertion order: scalars first, then the per-role
//! maps. Building the document also renders and merges the network
//! configuration of every discovered host, through the [`BuildRun`]
//! accumulator.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::{
    TF_TYPE_LIST, TF_TYPE_MAP, TF_VARIABLE_KEY, VAR_BOOTSTRAP_SPEC, VAR_BROADCAST_ADDRESS,
    VAR_CLUSTER_DOMAIN, VAR_CLUSTER_NAME, VAR_DEFAULT_ROUTE, VAR_DOMAIN_NAME, VAR_MACHINE_CIDR,
    VAR_MASTER_COUNT, VAR_MASTER_SPEC, VAR_NAME_SERVERS, VAR_NETMASK, VAR_NETWORK_ADDRESS,
    VAR_NUM_MASTER, VAR_NUM_WORKER, VAR_PREFIX_LENGTH, VAR_VSPHERE_CLUSTER, VAR_VSPHERE_DATACENTER,
    VAR_VSPHERE_DATASTORE, VAR_VSPHERE_NETWORK, VAR_VSPHERE_PASSWORD, VAR_VSPHERE_SERVER,
    VAR_VSPHERE_USER, VAR_WORKER_COUNT, VAR_WORKER_SPEC,
};
use crate::errors::{TopologyError, VariableError};
use crate::ifcfg::{render_interfaces, InterfaceRequest};
use crate::ignition::IgnitionMerger;
use crate::install_config::InstallConfig;
use crate::network::{default_route, Ipv4Network};
use crate::settings::Settings;
use crate::topology::{DiscoveredHost, HostRole, TopologyResult};

/// A single Terraform variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    pub default: Value,
}

impl Variable {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Self {
            type_tag: None,
            default: value.into(),
        }
    }

    #[must_use]
    pub fn map(value: Map<String, Value>) -> Self {
        Self {
            type_tag: Some(TF_TYPE_MAP.to_string()),
            default: Value::Object(value),
        }
    }

    #[must_use]
    pub fn list(values: Vec<Value>) -> Self {
        Self {
            type_tag: Some(TF_TYPE_LIST.to_string()),
            default: Value::Array(values),
        }
    }
}

/// Ordered set of Terraform variables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariableDocument {
    entries: Vec<(String, Variable)>,
}

impl VariableDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, keeping its position if it already exists.
    pub fn set(&mut self, name: &str, variable: Variable) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = variable,
            None => self.entries.push((name.to_string(), variable)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Variable names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as pretty JSON with four-space indentation and a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(serde::ser::Error::custom)
    }

    /// Write the document to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::Write`] if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), VariableError> {
        let write_failed = |reason: String| VariableError::Write {
            path: path.display().to_string(),
            reason,
        };
        let content = self.to_json().map_err(|e| write_failed(e.to_string()))?;
        fs::write(path, content).map_err(|e| write_failed(e.to_string()))?;
        info!("Wrote {} variables to {}", self.len(), path.display());
        Ok(())
    }
}

struct OrderedVariables<'a>(&'a [(String, Variable)]);

impl Serialize for OrderedVariables<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, variable) in self.0 {
            map.serialize_entry(name, variable)?;
        }
        map.end()
    }
}

impl Serialize for VariableDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(TF_VARIABLE_KEY, &OrderedVariables(&self.entries))?;
        map.end()
    }
}

/// Read the `default` of variable `name` from a written variable file.
///
/// # Errors
///
/// Returns [`VariableError`] if the file cannot be read or parsed, or has no
/// variable called `name`.
pub fn read_variable(path: &Path, name: &str) -> Result<Value, VariableError> {
    let content = fs::read_to_string(path).map_err(|e| VariableError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let root: Value = serde_json::from_str(&content).map_err(|e| VariableError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let variables = root
        .get(TF_VARIABLE_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| VariableError::Parse {
            path: path.display().to_string(),
            reason: format!("missing '{TF_VARIABLE_KEY}' object"),
        })?;

    variables
        .get(name)
        .and_then(|v| v.get("default"))
        .cloned()
        .ok_or_else(|| VariableError::NotFound {
            name: name.to_string(),
            path: path.display().to_string(),
        })
}

/// Network parameters shared by every host of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedNetwork {
    pub domain: String,
    pub primary: Ipv4Network,
    /// Secondary network around the bootstrap host's `-lb` address; each
    /// host's second interface uses its prefix length
    pub secondary: Ipv4Network,
    pub gateway: Ipv4Addr,
    pub name_servers: Vec<Ipv4Addr>,
}

impl SharedNetwork {
    /// Index of the interface whose network contains the gateway; the
    /// primary when none does.
    #[must_use]
    pub fn routed_interface(&self, host: &DiscoveredHost) -> usize {
        let Some(secondary) = host.secondary_address else {
            return 0;
        };
        let on_primary = self
            .primary
            .with_address(host.primary_address)
            .contains(self.gateway);
        let on_secondary = self.secondary.with_address(secondary).contains(self.gateway);

        usize::from(on_secondary && !on_primary)
    }

    /// Rendering request for `host`.
    #[must_use]
    pub fn request_for(&self, host: &DiscoveredHost) -> InterfaceRequest {
        let addresses = host.addresses();
        let prefixes = std::iter::once(self.primary.prefix_len())
            .chain(host.secondary_address.map(|_| self.secondary.prefix_len()))
            .collect();

        InterfaceRequest {
            hostname: host.hostname.clone(),
            addresses,
            prefixes,
            routed: self.routed_interface(host),
            gateway: self.gateway,
            domain: self.domain.clone(),
            name_servers: self.name_servers.clone(),
        }
    }
}

/// Output of a completed build.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildOutput {
    pub document: VariableDocument,
    /// Per-host Ignition documents written, in host order
    pub host_documents: Vec<PathBuf>,
}

/// Run-scoped accumulator: the variable document under construction plus the
/// per-host side effects performed while building it.
pub struct BuildRun<'a> {
    document: VariableDocument,
    merger: &'a IgnitionMerger,
    network: SharedNetwork,
    role_maps: [Map<String, Value>; 3],
    host_documents: Vec<PathBuf>,
}

impl<'a> BuildRun<'a> {
    #[must_use]
    pub fn new(merger: &'a IgnitionMerger, network: SharedNetwork) -> Self {
        Self {
            document: VariableDocument::new(),
            merger,
            network,
            role_maps: [Map::new(), Map::new(), Map::new()],
            host_documents: Vec::new(),
        }
    }

    #[must_use]
    pub fn network(&self) -> &SharedNetwork {
        &self.network
    }

    /// Set a scalar or list variable.
    pub fn set(&mut self, name: &str, variable: Variable) {
        self.document.set(name, variable);
    }

    /// Render and merge the network configuration of `host`, then record its
    /// entry in the role map.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] if rendering fails or the Ignition document
    /// cannot be read or written.
    pub fn add_host(&mut self, host: &DiscoveredHost) -> Result<(), TopologyError> {
        let request = self.network.request_for(host);
        let interfaces = render_interfaces(&request)?;
        let path = self
            .merger
            .materialize(host.role, &host.hostname, &interfaces)?;
        self.host_documents.push(path);

        let mut entry = Map::new();
        entry.insert(
            "host_name".to_string(),
            json!(format!("{}.{}", host.hostname, self.network.domain)),
        );
        for (position, address) in host.addresses().iter().enumerate() {
            entry.insert(
                format!("nic{}", position + 1),
                json!({ "ip_address": address.to_string() }),
            );
        }

        debug!(
            "Added {} host {} with {} interfaces",
            host.role,
            host.hostname,
            interfaces.len()
        );
        self.role_maps[role_slot(host.role)].insert(host.hostname.clone(), Value::Object(entry));
        Ok(())
    }

    /// Append the per-role maps and return the finished document.
    #[must_use]
    pub fn finish(mut self) -> BuildOutput {
        let [bootstrap, master, worker] = self.role_maps;
        self.document.set(VAR_BOOTSTRAP_SPEC, Variable::map(bootstrap));
        self.document.set(VAR_MASTER_SPEC, Variable::map(master));
        self.document.set(VAR_WORKER_SPEC, Variable::map(worker));

        BuildOutput {
            document: self.document,
            host_documents: self.host_documents,
        }
    }
}

fn role_slot(role: HostRole) -> usize {
    match role {
        HostRole::Bootstrap => 0,
        HostRole::ControlPlane => 1,
        HostRole::Worker => 2,
    }
}

/// Build the variable document for `topology` and materialize every host's
/// Ignition document.
///
/// # Errors
///
/// Returns [`TopologyError`] if a required install configuration field is
/// missing, or rendering or merging fails for any host. The first failure
/// stops the run.
pub fn build_variables(
    config: &InstallConfig,
    topology: &TopologyResult,
    settings: &Settings,
    merger: &IgnitionMerger,
) -> Result<BuildOutput, TopologyError> {
    let vsphere = config.vsphere()?;
    let machine_network = config.machine_network()?;
    let cluster_domain = config.cluster_domain()?;

    let gateway = default_route(
        &topology.bootstrap,
        settings.dual_nic,
        settings.default_route,
    );
    let name_servers = if settings.name_servers.is_empty() {
        topology.name_servers.clone()
    } else {
        settings.name_servers.clone()
    };

    let secondary = Ipv4Network::new(
        topology
            .bootstrap
            .secondary_address
            .unwrap_or(topology.bootstrap.primary_address),
        settings
            .secondary_prefix
            .unwrap_or(machine_network.prefix_len()),
    )?;

    let network = SharedNetwork {
        domain: cluster_domain.clone(),
        primary: machine_network,
        secondary,
        gateway,
        name_servers,
    };
    let mut run = BuildRun::new(merger, network);

    run.set(VAR_VSPHERE_USER, Variable::scalar(vsphere.username.as_str()));
    run.set(VAR_VSPHERE_PASSWORD, Variable::scalar(vsphere.password.as_str()));
    run.set(VAR_VSPHERE_SERVER, Variable::scalar(vsphere.v_center.as_str()));
    run.set(
        VAR_VSPHERE_DATACENTER,
        Variable::scalar(vsphere.datacenter.as_str()),
    );
    run.set(
        VAR_VSPHERE_CLUSTER,
        Variable::scalar(vsphere.cluster.clone().unwrap_or_default()),
    );
    run.set(
        VAR_VSPHERE_DATASTORE,
        Variable::scalar(vsphere.default_datastore.as_str()),
    );
    run.set(
        VAR_VSPHERE_NETWORK,
        Variable::scalar(vsphere.network.clone().unwrap_or_default()),
    );

    run.set(VAR_DOMAIN_NAME, Variable::scalar(config.base_domain.as_str()));
    run.set(VAR_CLUSTER_NAME, Variable::scalar(config.metadata.name.as_str()));
    run.set(VAR_CLUSTER_DOMAIN, Variable::scalar(cluster_domain.as_str()));

    let master_count = topology.control_plane.len();
    let worker_count = topology.worker.len();
    if let Some(declared) = config.control_plane_replicas() {
        check_replicas(HostRole::ControlPlane, declared, master_count);
        run.set(VAR_NUM_MASTER, Variable::scalar(declared));
    }
    if let Some(declared) = config.compute_replicas() {
        check_replicas(HostRole::Worker, declared, worker_count);
        run.set(VAR_NUM_WORKER, Variable::scalar(declared));
    }

    run.set(
        VAR_MACHINE_CIDR,
        Variable::scalar(machine_network.to_string()),
    );
    run.set(
        VAR_NETWORK_ADDRESS,
        Variable::scalar(machine_network.network_address().to_string()),
    );
    run.set(
        VAR_BROADCAST_ADDRESS,
        Variable::scalar(machine_network.broadcast_address().to_string()),
    );
    run.set(
        VAR_NETMASK,
        Variable::scalar(machine_network.netmask().to_string()),
    );
    run.set(
        VAR_PREFIX_LENGTH,
        Variable::scalar(machine_network.prefix_len()),
    );
    run.set(VAR_DEFAULT_ROUTE, Variable::scalar(gateway.to_string()));
    let servers = run
        .network()
        .name_servers
        .iter()
        .map(|s| json!(s.to_string()))
        .collect();
    run.set(VAR_NAME_SERVERS, Variable::list(servers));

    run.set(VAR_MASTER_COUNT, Variable::scalar(master_count));
    run.set(VAR_WORKER_COUNT, Variable::scalar(worker_count));

    for host in topology.hosts() {
        run.add_host(host)?;
    }

    let output = run.finish();
    info!(
        "Built {} variables for {} ({} host documents)",
        output.document.len(),
        cluster_domain,
        output.host_documents.len()
    );
    Ok(output)
}

fn check_replicas(role: HostRole, declared: u32, discovered: usize) {
    if usize::try_from(declared).ok() != Some(discovered) {
        warn!(
            "Install config declares {} {} replicas but {} were discovered; using discovered count",
            declared, role, discovered
        );
    }
}

#[cfg(test)]
#[path = "variables_tests.rs"]
mod variables_tests;
