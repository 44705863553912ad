// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Variables for the network-gateway provisioning flow.
//!
//! The gateway (load balancer) only needs two pools of addresses: the
//! bootstrap and control-plane hosts, and the workers. No per-host Ignition
//! documents are produced.

use serde_json::json;

use crate::constants::{
    VAR_CLUSTER_NAME, VAR_CONTROL_PLANE_ADDRESSES, VAR_DOMAIN_NAME, VAR_WORKER_ADDRESSES,
};
use crate::install_config::InstallConfig;
use crate::topology::FlatTopology;
use crate::variables::{Variable, VariableDocument};

/// Build the gateway variable document from flat address pools.
#[must_use]
pub fn build_gateway_variables(config: &InstallConfig, flat: &FlatTopology) -> VariableDocument {
    let mut document = VariableDocument::new();

    document.set(VAR_CLUSTER_NAME, Variable::scalar(config.metadata.name.as_str()));
    document.set(VAR_DOMAIN_NAME, Variable::scalar(config.base_domain.as_str()));
    document.set(
        VAR_CONTROL_PLANE_ADDRESSES,
        Variable::list(
            flat.control_plane_addresses
                .iter()
                .map(|a| json!(a.to_string()))
                .collect(),
        ),
    );
    document.set(
        VAR_WORKER_ADDRESSES,
        Variable::list(
            flat.worker_addresses
                .iter()
                .map(|a| json!(a.to_string()))
                .collect(),
        ),
    );

    document
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod gateway_tests;
