// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed view of the cluster install configuration (`install-config.yaml`).
//!
//! Only the fields discovery and variable generation need are modeled;
//! everything else in the document is ignored.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::errors::ConfigError;
use crate::network::Ipv4Network;

/// Root of the install configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallConfig {
    #[serde(default)]
    pub base_domain: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub networking: Networking,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub control_plane: Option<MachinePool>,
    #[serde(default)]
    pub compute: Vec<MachinePool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Networking {
    #[serde(default)]
    pub machine_network: Vec<MachineNetwork>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineNetwork {
    pub cidr: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    #[serde(default)]
    pub vsphere: Option<VsphereConfig>,
}

/// vCenter coordinates from `platform.vsphere`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VsphereConfig {
    #[serde(rename = "vCenter")]
    pub v_center: String,
    pub username: String,
    pub password: String,
    pub datacenter: String,
    #[serde(default)]
    pub cluster: Option<String>,
    pub default_datastore: String,
    #[serde(default)]
    pub network: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MachinePool {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub replicas: Option<u32>,
}

impl InstallConfig {
    /// Read and decode an install configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!("Read install config {}", path.display());
        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Decode an install configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the YAML does not decode.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Fully-qualified cluster domain: `<metadata.name>.<baseDomain>`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if either part is empty.
    pub fn cluster_domain(&self) -> Result<String, ConfigError> {
        let name = require(&self.metadata.name, "metadata.name")?;
        let base = require(&self.base_domain, "baseDomain")?;
        Ok(format!("{name}.{}", base.trim_end_matches('.')))
    }

    /// The first machine network.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if no machine network is listed,
    /// or [`ConfigError::InvalidCidr`] if it does not parse.
    pub fn machine_network(&self) -> Result<Ipv4Network, ConfigError> {
        let cidr = self
            .networking
            .machine_network
            .first()
            .map(|n| n.cidr.as_str())
            .unwrap_or_default();
        require(cidr, "networking.machineNetwork[0].cidr")?.parse()
    }

    /// vCenter coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if `platform.vsphere` is absent.
    pub fn vsphere(&self) -> Result<&VsphereConfig, ConfigError> {
        self.platform
            .vsphere
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField {
                field: "platform.vsphere".to_string(),
            })
    }

    /// Declared control-plane replica count.
    #[must_use]
    pub fn control_plane_replicas(&self) -> Option<u32> {
        self.control_plane.as_ref().and_then(|pool| pool.replicas)
    }

    /// Declared replica count of the first compute pool.
    #[must_use]
    pub fn compute_replicas(&self) -> Option<u32> {
        self.compute.first().and_then(|pool| pool.replicas)
    }
}

fn require<'a>(value: &'a str, field: &str) -> Result<&'a str, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::MissingField {
            field: field.to_string(),
        })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
#[path = "install_config_tests.rs"]
mod install_config_tests;
