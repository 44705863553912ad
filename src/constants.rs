// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for cluster topology discovery.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

use std::net::Ipv4Addr;

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Standard DNS port for queries and zone transfers
pub const DNS_PORT: u16 = 53;

/// Resolver used for SOA/A/NS lookups when `/etc/resolv.conf` has no usable entry
pub const DEFAULT_RESOLVER_IP: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// System resolver configuration consulted for the default resolver
pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

/// Relative name used for records at the zone apex
pub const ZONE_APEX: &str = "@";

// ============================================================================
// Host Naming Constants
// ============================================================================

/// Hostname of the singular bootstrap node
pub const BOOTSTRAP_HOSTNAME: &str = "bootstrap";

/// Hostname stem for control-plane nodes (`master0`, `master1`, ...)
pub const CONTROL_PLANE_STEM: &str = "master";

/// Hostname stem for worker nodes (`worker0`, `worker1`, ...)
pub const WORKER_STEM: &str = "worker";

/// Suffix of the record carrying a host's secondary (load-balancer) address
pub const SECONDARY_SUFFIX: &str = "-lb";

// ============================================================================
// Network Interface Constants
// ============================================================================

/// Device name of the primary interface
pub const PRIMARY_NIC: &str = "ens192";

/// Device name of the secondary interface
pub const SECONDARY_NIC: &str = "ens224";

/// Directory holding `ifcfg-*` interface definitions on the node
pub const NETWORK_SCRIPTS_DIR: &str = "/etc/sysconfig/network-scripts";

/// Last octet substituted into a host address to guess the default gateway
pub const DEFAULT_GATEWAY_OCTET: u8 = 1;

// ============================================================================
// Ignition Constants
// ============================================================================

/// File extension of Ignition documents
pub const IGNITION_EXTENSION: &str = "ign";

/// Suffix for derived documents whose hostname equals a role name
pub const HOST_DOCUMENT_SUFFIX: &str = "-node";

/// File mode for rendered interface files (0644: owner rw, world readable)
pub const IFCFG_FILE_MODE: u32 = 420;

/// Ignition filesystem name that files are written to
pub const IGNITION_FILESYSTEM: &str = "root";

/// Data URL prefix for inline base64 file contents
pub const DATA_URL_BASE64_PREFIX: &str = "data:text/plain;charset=utf-8;base64,";

// ============================================================================
// Terraform Variable Constants
// ============================================================================

/// Name of the variable file written to the output directory
pub const VARIABLES_FILE_NAME: &str = "variables.tf.json";

/// Top-level key of a Terraform JSON variable file
pub const TF_VARIABLE_KEY: &str = "variable";

/// Terraform type tag for map variables
pub const TF_TYPE_MAP: &str = "map";

/// Terraform type tag for list variables
pub const TF_TYPE_LIST: &str = "list";

pub const VAR_VSPHERE_USER: &str = "vsphere_user";
pub const VAR_VSPHERE_PASSWORD: &str = "vsphere_password";
pub const VAR_VSPHERE_SERVER: &str = "vsphere_server";
pub const VAR_VSPHERE_DATACENTER: &str = "vsphere_datacenter";
pub const VAR_VSPHERE_CLUSTER: &str = "vsphere_cluster";
pub const VAR_VSPHERE_DATASTORE: &str = "vsphere_datastore";
pub const VAR_VSPHERE_NETWORK: &str = "vsphere_network";
pub const VAR_DOMAIN_NAME: &str = "domain_name";
pub const VAR_CLUSTER_NAME: &str = "cluster_name";
pub const VAR_CLUSTER_DOMAIN: &str = "cluster_domain";
pub const VAR_NUM_MASTER: &str = "num_master";
pub const VAR_NUM_WORKER: &str = "num_worker";
pub const VAR_MACHINE_CIDR: &str = "machine_cidr";
pub const VAR_NETWORK_ADDRESS: &str = "network_address";
pub const VAR_BROADCAST_ADDRESS: &str = "broadcast_address";
pub const VAR_NETMASK: &str = "netmask";
pub const VAR_PREFIX_LENGTH: &str = "prefix_length";
pub const VAR_DEFAULT_ROUTE: &str = "default_route";
pub const VAR_NAME_SERVERS: &str = "name_servers";
pub const VAR_MASTER_COUNT: &str = "master_count";
pub const VAR_WORKER_COUNT: &str = "worker_count";
pub const VAR_BOOTSTRAP_SPEC: &str = "bootstrap_spec";
pub const VAR_MASTER_SPEC: &str = "master_spec";
pub const VAR_WORKER_SPEC: &str = "worker_spec";
pub const VAR_CONTROL_PLANE_ADDRESSES: &str = "control_plane_addresses";
pub const VAR_WORKER_ADDRESSES: &str = "worker_addresses";
