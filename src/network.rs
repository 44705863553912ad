// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! IPv4 network facts derived from the machine network CIDR.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::constants::DEFAULT_GATEWAY_OCTET;
use crate::errors::ConfigError;
use crate::topology::DiscoveredHost;

/// IPv4 network with CIDR notation
///
/// Only constructed through [`Ipv4Network::new`] or parsing, so the prefix
/// length is always at most 32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Network {
    address: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Network {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCidr`] if `prefix_len` exceeds 32.
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self, ConfigError> {
        if prefix_len > 32 {
            return Err(ConfigError::InvalidCidr {
                value: format!("{address}/{prefix_len}"),
                reason: "IPv4 prefix length must be <= 32".into(),
            });
        }
        Ok(Self {
            address,
            prefix_len,
        })
    }

    #[must_use]
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    #[must_use]
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Network of the same prefix length around `address`.
    #[must_use]
    pub fn with_address(&self, address: Ipv4Addr) -> Self {
        Self {
            address,
            prefix_len: self.prefix_len,
        }
    }

    #[must_use]
    pub fn netmask(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.mask_bits())
    }

    /// First address of the network (host bits cleared).
    #[must_use]
    pub fn network_address(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) & self.mask_bits())
    }

    /// Last address of the network (host bits set).
    #[must_use]
    pub fn broadcast_address(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) | !self.mask_bits())
    }

    /// Whether `addr` lies inside this network.
    #[must_use]
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask_bits() == u32::from(self.network_address())
    }

    fn mask_bits(&self) -> u32 {
        u32::MAX
            .checked_shl(32 - u32::from(self.prefix_len.min(32)))
            .unwrap_or(0)
    }
}

impl fmt::Display for Ipv4Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for Ipv4Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ConfigError::InvalidCidr {
            value: s.to_string(),
            reason,
        };

        let (address, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid("expected <address>/<prefix>".into()))?;

        let address = address
            .parse::<Ipv4Addr>()
            .map_err(|e| invalid(format!("Invalid IPv4 address: {e}")))?;

        let prefix_len = prefix
            .parse::<u8>()
            .map_err(|e| invalid(format!("Invalid prefix length: {e}")))?;

        Self::new(address, prefix_len)
    }
}

impl TryFrom<String> for Ipv4Network {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ipv4Network> for String {
    fn from(network: Ipv4Network) -> Self {
        network.to_string()
    }
}

/// Guess a gateway by replacing the last octet of `address` with `.1`.
#[must_use]
pub fn gateway_guess(address: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = address.octets();
    Ipv4Addr::new(a, b, c, DEFAULT_GATEWAY_OCTET)
}

/// Default route for the cluster.
///
/// An explicit override always wins. Otherwise the route is guessed from the
/// bootstrap host: its secondary (`-lb`) address in dual-NIC mode when
/// present, its primary address otherwise.
#[must_use]
pub fn default_route(
    bootstrap: &DiscoveredHost,
    dual_nic: bool,
    explicit: Option<Ipv4Addr>,
) -> Ipv4Addr {
    if let Some(route) = explicit {
        return route;
    }

    let base = match (dual_nic, bootstrap.secondary_address) {
        (true, Some(secondary)) => secondary,
        _ => bootstrap.primary_address,
    };
    gateway_guess(base)
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod network_tests;
