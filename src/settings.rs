// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Run settings that are not part of the install configuration.

use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::{DEFAULT_RESOLVER_IP, DNS_PORT, VARIABLES_FILE_NAME};

/// Settings for one discovery and materialization run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Directory receiving `variables.tf.json`
    pub output_dir: PathBuf,
    /// Directory holding the role base Ignition documents and receiving
    /// per-host documents
    pub install_dir: PathBuf,
    /// Attach a second interface from `<host>-lb` records
    pub dual_nic: bool,
    /// Explicit default route, overriding the guess from the bootstrap host
    pub default_route: Option<Ipv4Addr>,
    /// Prefix length of the secondary network; defaults to the machine
    /// network prefix
    pub secondary_prefix: Option<u8>,
    /// Name servers to render instead of the ones discovered in the zone
    pub name_servers: Vec<Ipv4Addr>,
}

impl Settings {
    pub fn new(output_dir: impl Into<PathBuf>, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            install_dir: install_dir.into(),
            dual_nic: false,
            default_route: None,
            secondary_prefix: None,
            name_servers: Vec::new(),
        }
    }

    /// Path of the variable file in the output directory.
    #[must_use]
    pub fn variables_path(&self) -> PathBuf {
        variables_path(&self.output_dir)
    }
}

/// Path of the variable file in `output_dir`.
#[must_use]
pub fn variables_path(output_dir: &Path) -> PathBuf {
    output_dir.join(VARIABLES_FILE_NAME)
}

/// First IPv4 `nameserver` entry of a resolv.conf document.
#[must_use]
pub fn parse_resolv_conf(content: &str) -> Option<SocketAddr> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some("nameserver"), Some(addr)) => addr.parse::<Ipv4Addr>().ok(),
                _ => None,
            }
        })
        .map(|addr| SocketAddr::from((addr, DNS_PORT)))
        .next()
}

/// Resolver for SOA/A/NS lookups: the explicit one if given, else the first
/// IPv4 name server in `resolv_conf`, else [`DEFAULT_RESOLVER_IP`].
#[must_use]
pub fn resolver_addr(explicit: Option<SocketAddr>, resolv_conf: &Path) -> SocketAddr {
    if let Some(addr) = explicit {
        return addr;
    }

    match fs::read_to_string(resolv_conf) {
        Ok(content) => {
            if let Some(addr) = parse_resolv_conf(&content) {
                debug!("Using resolver {} from {}", addr, resolv_conf.display());
                return addr;
            }
            warn!(
                "No IPv4 nameserver in {}, falling back to {}",
                resolv_conf.display(),
                DEFAULT_RESOLVER_IP
            );
        }
        Err(e) => warn!(
            "Could not read {} ({}), falling back to {}",
            resolv_conf.display(),
            e,
            DEFAULT_RESOLVER_IP
        ),
    }

    SocketAddr::from((DEFAULT_RESOLVER_IP, DNS_PORT))
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod settings_tests;
