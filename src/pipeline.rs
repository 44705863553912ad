// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end runs: discover, classify, build, write.
//!
//! Each step halts the run on its first error; nothing is retried and no
//! partial topology is written. The variable file is only written after every
//! host document has been materialized.

use tracing::{error, info};

use crate::errors::TopologyError;
use crate::gateway::build_gateway_variables;
use crate::ignition::IgnitionMerger;
use crate::install_config::InstallConfig;
use crate::settings::Settings;
use crate::topology::{classify, classify_flat};
use crate::variables::{build_variables, BuildOutput, VariableDocument};
use crate::zone::{fetch_zone_snapshot, ZoneSource};

/// Discover the cluster topology, write every host's Ignition document and
/// the Terraform variable file.
///
/// # Errors
///
/// Returns the first [`TopologyError`] encountered.
pub fn generate<S: ZoneSource + ?Sized>(
    config: &InstallConfig,
    settings: &Settings,
    source: &S,
) -> Result<BuildOutput, TopologyError> {
    let domain = config.cluster_domain()?;
    info!("Generating configuration for cluster domain {}", domain);

    let result = run_generate(config, settings, source, &domain);
    if let Err(e) = &result {
        error!(
            "Generation for {} failed ({}): {}",
            domain,
            e.status_reason(),
            e
        );
    }
    result
}

fn run_generate<S: ZoneSource + ?Sized>(
    config: &InstallConfig,
    settings: &Settings,
    source: &S,
    domain: &str,
) -> Result<BuildOutput, TopologyError> {
    let snapshot = fetch_zone_snapshot(source, domain)?;
    let topology = classify(&snapshot, settings.dual_nic)?;

    let merger = IgnitionMerger::new(settings.install_dir.clone());
    let output = build_variables(config, &topology, settings, &merger)?;
    output.document.write(&settings.variables_path())?;
    Ok(output)
}

/// Discover the cluster topology and write the gateway variable file.
///
/// # Errors
///
/// Returns the first [`TopologyError`] encountered.
pub fn generate_gateway<S: ZoneSource + ?Sized>(
    config: &InstallConfig,
    settings: &Settings,
    source: &S,
) -> Result<VariableDocument, TopologyError> {
    let domain = config.cluster_domain()?;
    info!("Generating gateway configuration for cluster domain {}", domain);

    let result = run_generate_gateway(config, settings, source, &domain);
    if let Err(e) = &result {
        error!(
            "Gateway generation for {} failed ({}): {}",
            domain,
            e.status_reason(),
            e
        );
    }
    result
}

fn run_generate_gateway<S: ZoneSource + ?Sized>(
    config: &InstallConfig,
    settings: &Settings,
    source: &S,
    domain: &str,
) -> Result<VariableDocument, TopologyError> {
    let snapshot = fetch_zone_snapshot(source, domain)?;
    let flat = classify_flat(&snapshot)?;

    let document = build_gateway_variables(config, &flat);
    document.write(&settings.variables_path())?;
    Ok(document)
}
