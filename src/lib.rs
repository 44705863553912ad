// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Cluster Topology - DNS-driven cluster discovery and host materialization
//!
//! This library turns a cluster install configuration plus the live DNS zone
//! of the cluster domain into:
//!
//! - a Terraform variable file (`variables.tf.json`) describing vCenter
//!   coordinates, network facts and every discovered host, and
//! - one Ignition document per host with static network configuration
//!   merged into the installer's per-role base document.
//!
//! ## Modules
//!
//! - [`zone`] - Zone snapshot via SOA lookup and AXFR
//! - [`topology`] - Classification of records into bootstrap, control-plane and worker hosts
//! - [`network`] - CIDR facts and default route derivation
//! - [`ifcfg`] - Static interface definition rendering
//! - [`ignition`] - Merging interface files into per-host Ignition documents
//! - [`variables`] - Terraform variable document assembly
//! - [`gateway`] - Flat address pools for gateway provisioning
//! - [`pipeline`] - End-to-end runs
//!
//! ## Example
//!
//! ```rust,no_run
//! use cluster_topology::install_config::InstallConfig;
//! use cluster_topology::pipeline::generate;
//! use cluster_topology::settings::Settings;
//! use cluster_topology::zone::HickoryZoneSource;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = InstallConfig::load(Path::new("install-config.yaml"))?;
//! let settings = Settings::new("terraform", "install");
//! let source = HickoryZoneSource::new("10.0.0.2:53".parse()?);
//!
//! let output = generate(&config, &settings, &source)?;
//! println!("wrote {} host documents", output.host_documents.len());
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod errors;
pub mod gateway;
pub mod ifcfg;
pub mod ignition;
pub mod install_config;
pub mod network;
pub mod pipeline;
pub mod settings;
pub mod topology;
pub mod variables;
pub mod zone;
