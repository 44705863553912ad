// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Classification of zone records into cluster roles.
//!
//! Hosts are recognized purely by name, using a closed set of rules evaluated
//! in a fixed priority order:
//!
//! | Rule        | Role           | Indexed |
//! |-------------|----------------|---------|
//! | `bootstrap` | Bootstrap      | no      |
//! | `master<N>` | ControlPlane N | yes     |
//! | `worker<N>` | Worker N       | yes     |
//!
//! Indexed roles are discovered by linear probe: `master0`, `master1`, ...
//! until the first name that is not in the zone. Hosts past a gap are not
//! part of the topology; each one is logged so the operator can see it.
//!
//! In dual-NIC mode, a record named `<host>-lb` supplies the secondary
//! address of `<host>`.

use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

use crate::constants::{BOOTSTRAP_HOSTNAME, CONTROL_PLANE_STEM, SECONDARY_SUFFIX, WORKER_STEM};
use crate::errors::IncompleteTopologyError;
use crate::zone::{ZoneRecord, ZoneSnapshot};

/// The three host categories of a cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HostRole {
    Bootstrap,
    ControlPlane,
    Worker,
}

impl HostRole {
    /// Name of the role as used for base Ignition documents and error messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::ControlPlane => "master",
            Self::Worker => "worker",
        }
    }
}

impl fmt::Display for HostRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Naming rule mapping a hostname shape onto a role.
#[derive(Clone, Copy, Debug)]
pub struct RoleRule {
    pub role: HostRole,
    pub stem: &'static str,
    pub indexed: bool,
}

/// Rules in priority order.
pub const ROLE_RULES: [RoleRule; 3] = [
    RoleRule {
        role: HostRole::Bootstrap,
        stem: BOOTSTRAP_HOSTNAME,
        indexed: false,
    },
    RoleRule {
        role: HostRole::ControlPlane,
        stem: CONTROL_PLANE_STEM,
        indexed: true,
    },
    RoleRule {
        role: HostRole::Worker,
        stem: WORKER_STEM,
        indexed: true,
    },
];

impl RoleRule {
    /// Hostname this rule expects for `index` (ignored for unindexed rules).
    #[must_use]
    pub fn hostname(&self, index: usize) -> String {
        if self.indexed {
            format!("{}{index}", self.stem)
        } else {
            self.stem.to_string()
        }
    }

    /// Match `name` exactly against this rule.
    ///
    /// Returns `Some(None)` for an unindexed match, `Some(Some(n))` for an
    /// indexed match and `None` otherwise. Index digits must be canonical, so
    /// `master01` does not match.
    #[must_use]
    pub fn matches(&self, name: &str) -> Option<Option<usize>> {
        if !self.indexed {
            return (name == self.stem).then_some(None);
        }

        let digits = name.strip_prefix(self.stem)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index: usize = digits.parse().ok()?;
        (index.to_string() == digits).then_some(Some(index))
    }
}

/// Role of `name` under [`ROLE_RULES`], with its index for indexed roles.
#[must_use]
pub fn match_role(name: &str) -> Option<(HostRole, Option<usize>)> {
    ROLE_RULES
        .iter()
        .find_map(|rule| rule.matches(name).map(|index| (rule.role, index)))
}

/// A classified host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredHost {
    pub hostname: String,
    pub role: HostRole,
    /// Position in the role sequence; `None` for the bootstrap host
    pub role_index: Option<usize>,
    pub primary_address: Ipv4Addr,
    /// Address of the `-lb` record, only in dual-NIC mode
    pub secondary_address: Option<Ipv4Addr>,
}

impl DiscoveredHost {
    /// Addresses in interface order (primary first).
    #[must_use]
    pub fn addresses(&self) -> Vec<Ipv4Addr> {
        std::iter::once(self.primary_address)
            .chain(self.secondary_address)
            .collect()
    }
}

/// Complete classified topology of a cluster domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopologyResult {
    pub domain: String,
    pub bootstrap: DiscoveredHost,
    /// Control-plane hosts, `role_index` 0..N-1 in order
    pub control_plane: Vec<DiscoveredHost>,
    /// Worker hosts, `role_index` 0..M-1 in order
    pub worker: Vec<DiscoveredHost>,
    pub name_servers: Vec<Ipv4Addr>,
}

impl TopologyResult {
    /// All hosts: bootstrap, then control plane, then workers.
    pub fn hosts(&self) -> impl Iterator<Item = &DiscoveredHost> {
        std::iter::once(&self.bootstrap)
            .chain(self.control_plane.iter())
            .chain(self.worker.iter())
    }
}

/// Flat address projection used by the gateway provisioning flow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlatTopology {
    /// Bootstrap address followed by control-plane addresses in index order
    pub control_plane_addresses: Vec<Ipv4Addr>,
    /// Worker addresses in index order
    pub worker_addresses: Vec<Ipv4Addr>,
}

impl From<&TopologyResult> for FlatTopology {
    fn from(topology: &TopologyResult) -> Self {
        Self {
            control_plane_addresses: std::iter::once(&topology.bootstrap)
                .chain(topology.control_plane.iter())
                .map(|h| h.primary_address)
                .collect(),
            worker_addresses: topology
                .worker
                .iter()
                .map(|h| h.primary_address)
                .collect(),
        }
    }
}

/// Classify the records of `snapshot` into a [`TopologyResult`].
///
/// # Errors
///
/// Returns [`IncompleteTopologyError`] listing every role that has no host:
/// a missing `bootstrap` record, or no `master0` / `worker0`.
pub fn classify(
    snapshot: &ZoneSnapshot,
    dual_nic: bool,
) -> Result<TopologyResult, IncompleteTopologyError> {
    let index: HashMap<&str, Ipv4Addr> = snapshot
        .records
        .iter()
        .map(|r| (r.name.as_str(), r.address))
        .collect();

    let mut bootstrap = None;
    let mut control_plane = Vec::new();
    let mut worker = Vec::new();

    for rule in &ROLE_RULES {
        let hosts = probe(rule, &index, dual_nic);
        match rule.role {
            HostRole::Bootstrap => bootstrap = hosts.into_iter().next(),
            HostRole::ControlPlane => control_plane = hosts,
            HostRole::Worker => worker = hosts,
        }
    }

    report_ignored(&snapshot.records, control_plane.len(), worker.len());

    let mut missing = Vec::new();
    if bootstrap.is_none() {
        missing.push(HostRole::Bootstrap);
    }
    if control_plane.is_empty() {
        missing.push(HostRole::ControlPlane);
    }
    if worker.is_empty() {
        missing.push(HostRole::Worker);
    }

    let Some(bootstrap) = bootstrap.filter(|_| missing.is_empty()) else {
        return Err(IncompleteTopologyError {
            domain: snapshot.domain.clone(),
            missing,
        });
    };

    info!(
        "Classified {}: bootstrap, {} control-plane, {} worker hosts",
        snapshot.domain,
        control_plane.len(),
        worker.len()
    );

    Ok(TopologyResult {
        domain: snapshot.domain.clone(),
        bootstrap,
        control_plane,
        worker,
        name_servers: snapshot.name_servers.clone(),
    })
}

/// Classify `snapshot` and project it onto flat address lists.
///
/// # Errors
///
/// Same completeness check as [`classify`].
pub fn classify_flat(snapshot: &ZoneSnapshot) -> Result<FlatTopology, IncompleteTopologyError> {
    classify(snapshot, false).map(|topology| FlatTopology::from(&topology))
}

/// Linear probe for the hosts of one rule.
fn probe(rule: &RoleRule, index: &HashMap<&str, Ipv4Addr>, dual_nic: bool) -> Vec<DiscoveredHost> {
    let mut hosts = Vec::new();

    loop {
        let position = hosts.len();
        let hostname = rule.hostname(position);
        let Some(&primary_address) = index.get(hostname.as_str()) else {
            break;
        };

        let secondary_address = if dual_nic {
            let lb_name = format!("{hostname}{SECONDARY_SUFFIX}");
            let secondary = index.get(lb_name.as_str()).copied();
            if secondary.is_none() {
                debug!("No {} record, {} is single-homed", lb_name, hostname);
            }
            secondary
        } else {
            None
        };

        debug!(
            "Discovered {} host {} at {}",
            rule.role, hostname, primary_address
        );
        hosts.push(DiscoveredHost {
            hostname,
            role: rule.role,
            role_index: rule.indexed.then_some(position),
            primary_address,
            secondary_address,
        });

        if !rule.indexed {
            break;
        }
    }

    hosts
}

/// Log indexed hosts that exist in the zone but lie past the first gap.
fn report_ignored(records: &[ZoneRecord], control_plane: usize, worker: usize) {
    for record in records {
        let ignored = match match_role(&record.name) {
            Some((HostRole::ControlPlane, Some(n))) => n >= control_plane,
            Some((HostRole::Worker, Some(n))) => n >= worker,
            _ => false,
        };
        if ignored {
            warn!(
                "Ignoring {} ({}): index follows a gap in the host sequence",
                record.name, record.address
            );
        }
    }
}

#[cfg(test)]
#[path = "topology_tests.rs"]
mod topology_tests;
