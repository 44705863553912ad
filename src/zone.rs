// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone snapshot fetching via SOA lookup and full zone transfer (AXFR).
//!
//! Discovery needs every address record in the cluster domain, so the
//! snapshot is always taken with a zone transfer over TCP from the zone's
//! primary name server rather than with individual queries:
//!
//! 1. Query the SOA record of the domain to learn the primary name server
//! 2. Resolve the primary's IPv4 address
//! 3. Request an AXFR from the primary
//! 4. Resolve the apex NS targets into the zone's name-server address list
//!
//! DNS access goes through the [`ZoneSource`] trait so the fetch logic can be
//! exercised without a live server. [`HickoryZoneSource`] is the production
//! implementation built on the synchronous hickory client.
//!
//! Every failure is reported as a [`DiscoveryError`] naming the domain. Nothing
//! is retried.

use anyhow::{bail, Context, Result};
use hickory_client::client::{Client, SyncClient};
use hickory_client::op::ResponseCode;
use hickory_client::rr::{DNSClass, Name, RData, Record, RecordType};
use hickory_client::tcp::TcpClientConnection;
use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::constants::{DNS_PORT, ZONE_APEX};
use crate::errors::DiscoveryError;

/// A single address record from the zone, named relative to the zone origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneRecord {
    /// Relative owner name (e.g. `master0`), `@` for the apex
    pub name: String,
    /// IPv4 address from the A record
    pub address: Ipv4Addr,
}

impl ZoneRecord {
    pub fn new(name: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

/// Result of a zone transfer as seen by the fetcher.
#[derive(Clone, Debug)]
pub struct ZoneTransfer {
    /// Response code of the transfer; anything but `NoError` is a refusal
    pub response_code: ResponseCode,
    /// Address records, names relative to the zone origin
    pub records: Vec<ZoneRecord>,
    /// Targets of the apex NS records, as fully-qualified names
    pub name_servers: Vec<String>,
}

/// Point-in-time copy of a zone's address records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneSnapshot {
    /// The cluster domain the snapshot was taken from
    pub domain: String,
    /// All address records in the zone
    pub records: Vec<ZoneRecord>,
    /// Addresses of the zone's name servers, in discovery order without duplicates
    pub name_servers: Vec<Ipv4Addr>,
}

/// DNS operations needed to take a zone snapshot.
///
/// Each operation may fail independently; the fetcher turns every failure
/// into a fatal [`DiscoveryError`].
pub trait ZoneSource {
    /// Return the primary name server (SOA MNAME) of `domain`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or no SOA record is returned.
    fn resolve_soa(&self, domain: &str) -> Result<String>;

    /// Return the IPv4 addresses of `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn resolve_a(&self, host: &str) -> Result<Vec<Ipv4Addr>>;

    /// Perform a full zone transfer of `domain` from `primary`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or protocol failure. A refusal is
    /// reported through [`ZoneTransfer::response_code`].
    fn zone_transfer(&self, primary: SocketAddr, domain: &str) -> Result<ZoneTransfer>;
}

/// Convert a fully-qualified owner name into a name relative to `domain`.
///
/// The comparison is case-insensitive and ignores trailing dots. Names outside
/// the zone are returned lower-cased but otherwise unchanged.
#[must_use]
pub fn relative_name(fqdn: &str, domain: &str) -> String {
    let name = fqdn.trim_end_matches('.').to_ascii_lowercase();
    let origin = domain.trim_end_matches('.').to_ascii_lowercase();

    if name == origin {
        return ZONE_APEX.to_string();
    }

    match name.strip_suffix(&format!(".{origin}")) {
        Some(relative) => relative.to_string(),
        None => name,
    }
}

/// Take a complete snapshot of the address records in `domain`.
///
/// # Errors
///
/// Returns a [`DiscoveryError`] if `domain` is not a valid DNS name, the SOA
/// lookup fails, the primary cannot be resolved, the transfer is refused or
/// fails, or a name server cannot be resolved.
pub fn fetch_zone_snapshot<S: ZoneSource + ?Sized>(
    source: &S,
    domain: &str,
) -> Result<ZoneSnapshot, DiscoveryError> {
    info!("Fetching zone snapshot for {}", domain);

    Name::from_str(domain).map_err(|e| DiscoveryError::InvalidName {
        domain: domain.to_string(),
        reason: e.to_string(),
    })?;

    let primary_host =
        source
            .resolve_soa(domain)
            .map_err(|e| DiscoveryError::SoaLookupFailed {
                domain: domain.to_string(),
                reason: format!("{e:#}"),
            })?;
    debug!("SOA primary for {} is {}", domain, primary_host);

    let primary_addr = source
        .resolve_a(&primary_host)
        .and_then(|addrs| {
            addrs
                .first()
                .copied()
                .with_context(|| format!("no A record for {primary_host}"))
        })
        .map_err(|e| DiscoveryError::PrimaryLookupFailed {
            domain: domain.to_string(),
            server: primary_host.clone(),
            reason: format!("{e:#}"),
        })?;
    let primary = SocketAddr::from((primary_addr, DNS_PORT));

    let transfer =
        source
            .zone_transfer(primary, domain)
            .map_err(|e| DiscoveryError::TransferFailed {
                domain: domain.to_string(),
                primary: primary.to_string(),
                reason: format!("{e:#}"),
            })?;

    if transfer.response_code != ResponseCode::NoError {
        return Err(DiscoveryError::TransferRefused {
            domain: domain.to_string(),
            primary: primary.to_string(),
            reason: format!("{:?}", transfer.response_code),
        });
    }

    let mut seen: HashSet<String> = HashSet::with_capacity(transfer.records.len());
    let mut records: Vec<ZoneRecord> = Vec::with_capacity(transfer.records.len());
    for record in transfer.records {
        if !seen.insert(record.name.clone()) {
            debug!(
                "Ignoring additional address {} for {} in {}",
                record.address, record.name, domain
            );
            continue;
        }
        records.push(record);
    }

    let name_servers = resolve_name_servers(source, domain, &records, &transfer.name_servers)?;
    let name_servers = if name_servers.is_empty() {
        warn!(
            "Zone {} lists no resolvable NS records, using primary {} as name server",
            domain, primary_addr
        );
        vec![primary_addr]
    } else {
        name_servers
    };

    info!(
        "Zone snapshot for {}: {} address records, {} name servers",
        domain,
        records.len(),
        name_servers.len()
    );

    Ok(ZoneSnapshot {
        domain: domain.to_string(),
        records,
        name_servers,
    })
}

/// Resolve NS targets to addresses, preferring in-zone glue from the snapshot.
fn resolve_name_servers<S: ZoneSource + ?Sized>(
    source: &S,
    domain: &str,
    records: &[ZoneRecord],
    targets: &[String],
) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
    let mut addresses: Vec<Ipv4Addr> = Vec::new();

    for target in targets {
        let relative = relative_name(target, domain);
        let resolved = match records.iter().find(|r| r.name == relative) {
            Some(record) => vec![record.address],
            None => source
                .resolve_a(target)
                .map_err(|e| DiscoveryError::NameServerLookupFailed {
                    domain: domain.to_string(),
                    server: target.clone(),
                    reason: format!("{e:#}"),
                })?,
        };

        for address in resolved {
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }
    }

    Ok(addresses)
}

/// [`ZoneSource`] backed by the synchronous hickory DNS client over TCP.
///
/// SOA and A lookups are sent to `resolver`; the zone transfer is sent to the
/// primary returned by the SOA lookup.
#[derive(Clone, Debug)]
pub struct HickoryZoneSource {
    resolver: SocketAddr,
}

impl HickoryZoneSource {
    #[must_use]
    pub fn new(resolver: SocketAddr) -> Self {
        Self { resolver }
    }

    fn query(&self, name: &str, record_type: RecordType) -> Result<Vec<Record>> {
        let fqdn = Name::from_str(name).with_context(|| format!("Invalid name: {name}"))?;

        let conn = TcpClientConnection::new(self.resolver).with_context(|| {
            format!("Failed to create TCP connection to {}", self.resolver)
        })?;
        let client = SyncClient::new(conn);

        let response = client
            .query(&fqdn, DNSClass::IN, record_type)
            .with_context(|| format!("Failed to query {record_type:?} record for {fqdn}"))?;

        if response.response_code() != ResponseCode::NoError {
            bail!(
                "{record_type:?} query for {fqdn} returned {:?}",
                response.response_code()
            );
        }

        Ok(response
            .answers()
            .iter()
            .filter(|r| r.record_type() == record_type)
            .cloned()
            .collect())
    }
}

impl ZoneSource for HickoryZoneSource {
    fn resolve_soa(&self, domain: &str) -> Result<String> {
        self.query(domain, RecordType::SOA)?
            .iter()
            .find_map(|r| match r.data() {
                Some(RData::SOA(soa)) => Some(soa.mname().to_string()),
                _ => None,
            })
            .with_context(|| format!("No SOA record returned for {domain}"))
    }

    fn resolve_a(&self, host: &str) -> Result<Vec<Ipv4Addr>> {
        Ok(self
            .query(host, RecordType::A)?
            .iter()
            .filter_map(|r| match r.data() {
                Some(RData::A(a)) => Some(a.0),
                _ => None,
            })
            .collect())
    }

    fn zone_transfer(&self, primary: SocketAddr, domain: &str) -> Result<ZoneTransfer> {
        let zone = Name::from_str(domain).with_context(|| format!("Invalid zone name: {domain}"))?;

        let conn = TcpClientConnection::new(primary)
            .with_context(|| format!("Failed to create TCP connection to {primary}"))?;
        let client = SyncClient::new(conn);

        info!("Requesting AXFR of {} from {}", domain, primary);
        let responses = client
            .zone_transfer(&zone, None)
            .with_context(|| format!("Failed to start zone transfer of {zone}"))?;

        let mut records = Vec::new();
        let mut name_servers = Vec::new();

        for response in responses {
            let response =
                response.with_context(|| format!("Zone transfer of {zone} interrupted"))?;

            if response.response_code() != ResponseCode::NoError {
                return Ok(ZoneTransfer {
                    response_code: response.response_code(),
                    records: Vec::new(),
                    name_servers: Vec::new(),
                });
            }

            for record in response.answers() {
                let owner = relative_name(&record.name().to_string(), domain);
                match record.data() {
                    Some(RData::A(a)) => records.push(ZoneRecord::new(owner, a.0)),
                    Some(RData::NS(ns)) if owner == ZONE_APEX => {
                        let target = ns.0.to_string();
                        if !name_servers.contains(&target) {
                            name_servers.push(target);
                        }
                    }
                    _ => {}
                }
            }
        }

        debug!(
            "AXFR of {} returned {} A records and {} NS targets",
            domain,
            records.len(),
            name_servers.len()
        );

        Ok(ZoneTransfer {
            response_code: ResponseCode::NoError,
            records,
            name_servers,
        })
    }
}

#[cfg(test)]
#[path = "zone_tests.rs"]
mod zone_tests;
