// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for topology discovery and host materialization.
//!
//! This module provides specialized error types for:
//! - Zone discovery (SOA lookup, primary resolution, zone transfer)
//! - Topology completeness checks after classification
//! - Boot-config (Ignition) document reads and writes
//! - Install configuration decoding
//! - Interface rendering and variable file lookups
//!
//! None of these errors are retried. Every variant carries the domain, host,
//! role or path it concerns so the run can report what was implicated before
//! it halts.

use crate::topology::HostRole;
use thiserror::Error;

/// Errors raised while obtaining a zone snapshot.
#[derive(Error, Debug, Clone)]
pub enum DiscoveryError {
    /// The SOA query for the cluster domain failed or returned no SOA record
    #[error("SOA lookup for domain '{domain}' failed: {reason}")]
    SoaLookupFailed {
        /// The cluster domain being discovered
        domain: String,
        /// Underlying cause
        reason: String,
    },

    /// The SOA primary name server could not be resolved to an IPv4 address
    #[error("Could not resolve primary name server '{server}' for domain '{domain}': {reason}")]
    PrimaryLookupFailed {
        /// The cluster domain being discovered
        domain: String,
        /// The primary name server host from the SOA record
        server: String,
        /// Underlying cause
        reason: String,
    },

    /// The primary answered the transfer request with a non-success response code
    #[error("Zone transfer for '{domain}' refused by primary {primary}: {reason}")]
    TransferRefused {
        /// The cluster domain being transferred
        domain: String,
        /// The primary server address
        primary: String,
        /// Response code returned by the server
        reason: String,
    },

    /// A name server listed for the zone could not be resolved
    #[error("Could not resolve name server '{server}' for domain '{domain}': {reason}")]
    NameServerLookupFailed {
        /// The cluster domain being discovered
        domain: String,
        /// The NS target that failed to resolve
        server: String,
        /// Underlying cause
        reason: String,
    },

    /// Transport or protocol failure during the zone transfer
    #[error("Zone transfer for '{domain}' from {primary} failed: {reason}")]
    TransferFailed {
        /// The cluster domain being transferred
        domain: String,
        /// The primary server address
        primary: String,
        /// Underlying cause
        reason: String,
    },

    /// The domain is not a valid DNS name
    #[error("Invalid domain name '{domain}': {reason}")]
    InvalidName {
        /// The offending domain
        domain: String,
        /// Parser error
        reason: String,
    },
}

impl DiscoveryError {
    /// Domain implicated by this error.
    #[must_use]
    pub fn domain(&self) -> &str {
        match self {
            Self::SoaLookupFailed { domain, .. }
            | Self::PrimaryLookupFailed { domain, .. }
            | Self::TransferRefused { domain, .. }
            | Self::NameServerLookupFailed { domain, .. }
            | Self::TransferFailed { domain, .. }
            | Self::InvalidName { domain, .. } => domain,
        }
    }
}

/// One or more required roles were absent after classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Incomplete topology for domain '{domain}': missing {}", format_roles(.missing))]
pub struct IncompleteTopologyError {
    /// The cluster domain that was classified
    pub domain: String,
    /// Roles with no discovered host, in rule priority order
    pub missing: Vec<HostRole>,
}

fn format_roles(roles: &[HostRole]) -> String {
    roles
        .iter()
        .map(HostRole::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors reading a base Ignition document or writing a derived one.
#[derive(Error, Debug, Clone)]
pub enum DocumentIoError {
    /// The base document for a role is missing or unreadable
    #[error("Could not read {role} base document {path} for host '{host}': {reason}")]
    ReadFailed {
        /// Role whose base document was requested
        role: String,
        /// Host being materialized
        host: String,
        /// Path of the base document
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// The derived per-host document could not be written
    #[error("Could not write document {path} for host '{host}': {reason}")]
    WriteFailed {
        /// Host being materialized
        host: String,
        /// Path of the output document
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// The base document does not have the expected shape
    #[error("Malformed document {path}: {reason}")]
    Malformed {
        /// Path of the offending document
        path: String,
        /// What was wrong with it
        reason: String,
    },
}

/// Errors loading the install configuration.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// The install configuration file could not be read
    #[error("Can not open install config file {path}: {reason}")]
    Read {
        /// Path to the install configuration
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// The install configuration is not valid YAML for the expected schema
    #[error("Can not parse install config file {path}: {reason}")]
    Parse {
        /// Path to the install configuration
        path: String,
        /// Parser error
        reason: String,
    },

    /// A field required by discovery is absent or empty
    #[error("Install config is missing required field '{field}'")]
    MissingField {
        /// Dotted path of the missing field
        field: String,
    },

    /// A CIDR could not be parsed
    #[error("Invalid CIDR '{value}': {reason}")]
    InvalidCidr {
        /// The offending value
        value: String,
        /// Parser error
        reason: String,
    },
}

/// Invalid interface rendering request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Hosts carry one or two interfaces
    #[error("Host '{host}' must have 1 or 2 addresses, got {count}")]
    AddressCount {
        /// Host being rendered
        host: String,
        /// Number of addresses supplied
        count: usize,
    },

    /// Every address needs a prefix length
    #[error("Host '{host}' has {addresses} addresses but {prefixes} prefix lengths")]
    PrefixMismatch {
        /// Host being rendered
        host: String,
        /// Number of addresses supplied
        addresses: usize,
        /// Number of prefix lengths supplied
        prefixes: usize,
    },

    /// The routed interface index does not name a rendered interface
    #[error("Host '{host}' routed interface {index} is out of range")]
    RoutedInterfaceOutOfRange {
        /// Host being rendered
        host: String,
        /// The requested routed interface index
        index: usize,
    },
}

/// Errors reading a previously written variable file.
#[derive(Error, Debug, Clone)]
pub enum VariableError {
    /// The variable file could not be read
    #[error("Can not open terraform variable file {path}: {reason}")]
    Read {
        /// Path to the variable file
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// The variable file is not a Terraform JSON variable file
    #[error("Can not parse terraform variable file {path}: {reason}")]
    Parse {
        /// Path to the variable file
        path: String,
        /// Parser error
        reason: String,
    },

    /// The variable file could not be written
    #[error("Could not write variable file {path}: {reason}")]
    Write {
        /// Path to the variable file
        path: String,
        /// Underlying cause
        reason: String,
    },

    /// No variable with that name exists
    #[error("Variable '{name}' not found in {path}")]
    NotFound {
        /// Requested variable name
        name: String,
        /// Path to the variable file
        path: String,
    },
}

/// Composite error type for a discovery and materialization run.
#[derive(Error, Debug, Clone)]
pub enum TopologyError {
    /// Zone discovery error
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Required roles missing
    #[error(transparent)]
    IncompleteTopology(#[from] IncompleteTopologyError),

    /// Ignition document read or write error
    #[error(transparent)]
    DocumentIo(#[from] DocumentIoError),

    /// Install configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Interface rendering error
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Variable file error
    #[error(transparent)]
    Variable(#[from] VariableError),
}

impl TopologyError {
    /// Returns a stable reason code for this error, suitable for log fields.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Discovery(DiscoveryError::SoaLookupFailed { .. }) => "SoaLookupFailed",
            Self::Discovery(DiscoveryError::PrimaryLookupFailed { .. }) => "PrimaryLookupFailed",
            Self::Discovery(DiscoveryError::TransferRefused { .. }) => "ZoneTransferRefused",
            Self::Discovery(DiscoveryError::NameServerLookupFailed { .. }) => {
                "NameServerLookupFailed"
            }
            Self::Discovery(DiscoveryError::TransferFailed { .. }) => "ZoneTransferFailed",
            Self::Discovery(DiscoveryError::InvalidName { .. }) => "InvalidDomainName",

            Self::IncompleteTopology(_) => "IncompleteTopology",

            Self::DocumentIo(DocumentIoError::ReadFailed { .. }) => "BaseDocumentUnreadable",
            Self::DocumentIo(DocumentIoError::WriteFailed { .. }) => "DocumentWriteFailed",
            Self::DocumentIo(DocumentIoError::Malformed { .. }) => "MalformedDocument",

            Self::Config(ConfigError::Read { .. }) => "ConfigUnreadable",
            Self::Config(ConfigError::Parse { .. }) => "ConfigInvalid",
            Self::Config(ConfigError::MissingField { .. }) => "ConfigMissingField",
            Self::Config(ConfigError::InvalidCidr { .. }) => "InvalidCidr",

            Self::Render(_) => "InvalidInterfaceRequest",

            Self::Variable(VariableError::Read { .. }) => "VariableFileUnreadable",
            Self::Variable(VariableError::Parse { .. }) => "VariableFileInvalid",
            Self::Variable(VariableError::Write { .. }) => "VariableFileWriteFailed",
            Self::Variable(VariableError::NotFound { .. }) => "VariableNotFound",
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
