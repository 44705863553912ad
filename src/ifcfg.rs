// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Rendering of static `ifcfg` network interface definitions.
//!
//! One definition is produced per host address. The first address is bound
//! to `ens192`, the second (dual-NIC hosts) to `ens224`. Only the interface
//! the caller marks as routed carries a `GATEWAY` line, and only the first
//! interface carries `DOMAIN`. Every interface lists the name servers as
//! `DNS1`, `DNS2`, ... in the order given.
//!
//! # Example
//!
//! ```rust
//! use cluster_topology::ifcfg::{render_interfaces, InterfaceRequest};
//! use std::net::Ipv4Addr;
//!
//! let request = InterfaceRequest {
//!     hostname: "master0".to_string(),
//!     addresses: vec![Ipv4Addr::new(10, 0, 0, 10)],
//!     prefixes: vec![24],
//!     routed: 0,
//!     gateway: Ipv4Addr::new(10, 0, 0, 1),
//!     domain: "ocp.example.com".to_string(),
//!     name_servers: vec![Ipv4Addr::new(10, 0, 0, 2)],
//! };
//!
//! let interfaces = render_interfaces(&request).unwrap();
//! assert_eq!(interfaces.len(), 1);
//! assert!(interfaces[0].text.contains("GATEWAY=10.0.0.1\n"));
//! ```

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::fmt::Write;
use std::net::Ipv4Addr;

use crate::constants::{NETWORK_SCRIPTS_DIR, PRIMARY_NIC, SECONDARY_NIC};
use crate::errors::RenderError;

/// Devices in interface order.
const NIC_DEVICES: [&str; 2] = [PRIMARY_NIC, SECONDARY_NIC];

/// Inputs for rendering a host's interfaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceRequest {
    pub hostname: String,
    /// One or two addresses, primary first
    pub addresses: Vec<Ipv4Addr>,
    /// Prefix length for each address
    pub prefixes: Vec<u8>,
    /// Index of the interface carrying the default gateway
    pub routed: usize,
    pub gateway: Ipv4Addr,
    pub domain: String,
    pub name_servers: Vec<Ipv4Addr>,
}

/// A rendered definition for one interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedInterface {
    /// Device name (`ens192`, `ens224`)
    pub device: &'static str,
    /// Target path on the node
    pub path: String,
    /// Plain `ifcfg` text
    pub text: String,
}

impl RenderedInterface {
    /// Standard base64 encoding of the text, for inline embedding.
    #[must_use]
    pub fn encoded(&self) -> String {
        BASE64.encode(self.text.as_bytes())
    }
}

/// Target path of the `ifcfg` file for `device`.
#[must_use]
pub fn ifcfg_path(device: &str) -> String {
    format!("{NETWORK_SCRIPTS_DIR}/ifcfg-{device}")
}

/// Render one interface definition per address in `request`.
///
/// # Errors
///
/// Returns [`RenderError`] when the request does not hold one or two
/// addresses, when the prefix count differs from the address count, or when
/// the routed index names no interface.
pub fn render_interfaces(request: &InterfaceRequest) -> Result<Vec<RenderedInterface>, RenderError> {
    let count = request.addresses.len();
    if count == 0 || count > NIC_DEVICES.len() {
        return Err(RenderError::AddressCount {
            host: request.hostname.clone(),
            count,
        });
    }
    if request.prefixes.len() != count {
        return Err(RenderError::PrefixMismatch {
            host: request.hostname.clone(),
            addresses: count,
            prefixes: request.prefixes.len(),
        });
    }
    if request.routed >= count {
        return Err(RenderError::RoutedInterfaceOutOfRange {
            host: request.hostname.clone(),
            index: request.routed,
        });
    }

    Ok(request
        .addresses
        .iter()
        .zip(&request.prefixes)
        .zip(NIC_DEVICES)
        .enumerate()
        .map(|(position, ((address, prefix), device))| RenderedInterface {
            device,
            path: ifcfg_path(device),
            text: render_one(request, position, device, *address, *prefix),
        })
        .collect())
}

fn render_one(
    request: &InterfaceRequest,
    position: usize,
    device: &str,
    address: Ipv4Addr,
    prefix: u8,
) -> String {
    let mut text = format!(
        "TYPE=Ethernet\nBOOTPROTO=none\nNAME={device}\nDEVICE={device}\nONBOOT=yes\nIPADDR={address}\nPREFIX={prefix}\n"
    );

    // writeln! into a String cannot fail
    if position == request.routed {
        let _ = writeln!(text, "GATEWAY={}", request.gateway);
    }
    if position == 0 {
        let _ = writeln!(text, "DOMAIN={}", request.domain);
    }
    for (k, server) in request.name_servers.iter().enumerate() {
        let _ = writeln!(text, "DNS{}={server}", k + 1);
    }

    text
}

#[cfg(test)]
#[path = "ifcfg_tests.rs"]
mod ifcfg_tests;
