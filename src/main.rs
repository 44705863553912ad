// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cluster_topology::{
    constants::RESOLV_CONF_PATH,
    install_config::InstallConfig,
    pipeline::{generate, generate_gateway},
    settings::{resolver_addr, variables_path, Settings},
    variables::read_variable,
    zone::HickoryZoneSource,
};
use serde_json::Value;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read a cluster install config, discover its hosts from DNS and build
/// Terraform variables and per-host Ignition network config.
#[derive(Debug, Parser)]
#[command(name = "cluster-topology", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover hosts, write per-host Ignition documents and variables.tf.json
    Generate {
        #[command(flatten)]
        discovery: DiscoveryArgs,

        /// Directory holding bootstrap.ign, master.ign and worker.ign
        #[arg(long)]
        install_dir: PathBuf,

        /// Give every host a second interface from its `<host>-lb` record
        #[arg(long)]
        dual_nic: bool,

        /// Default route, instead of `.1` of the bootstrap network
        #[arg(long)]
        default_route: Option<Ipv4Addr>,

        /// Prefix length of the secondary network (defaults to the machine network prefix)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=32))]
        secondary_prefix: Option<u8>,

        /// Name server to render instead of the zone's own (repeatable)
        #[arg(long = "name-server")]
        name_servers: Vec<Ipv4Addr>,
    },

    /// Discover hosts and write flat address pools for gateway provisioning
    Gateway {
        #[command(flatten)]
        discovery: DiscoveryArgs,
    },

    /// Print one variable from a previously written variables.tf.json
    Get {
        /// Terraform directory containing variables.tf.json
        #[arg(long)]
        dir: PathBuf,

        /// Variable name
        name: String,
    },
}

#[derive(Debug, clap::Args)]
struct DiscoveryArgs {
    /// Install configuration (install-config.yaml)
    #[arg(long)]
    file: PathBuf,

    /// Terraform directory receiving variables.tf.json
    #[arg(long)]
    dir: PathBuf,

    /// Resolver for SOA and address lookups (defaults to /etc/resolv.conf)
    #[arg(long)]
    resolver: Option<SocketAddr>,
}

impl DiscoveryArgs {
    fn load(&self) -> Result<(InstallConfig, HickoryZoneSource)> {
        let config = InstallConfig::load(&self.file)
            .with_context(|| format!("Loading install config {}", self.file.display()))?;
        let resolver = resolver_addr(self.resolver, Path::new(RESOLV_CONF_PATH));
        debug!("Using resolver {}", resolver);
        Ok((config, HickoryZoneSource::new(resolver)))
    }
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            discovery,
            install_dir,
            dual_nic,
            default_route,
            secondary_prefix,
            name_servers,
        } => {
            let (config, source) = discovery.load()?;
            let settings = Settings {
                dual_nic,
                default_route,
                secondary_prefix,
                name_servers,
                ..Settings::new(discovery.dir.clone(), install_dir)
            };

            let output = generate(&config, &settings, &source)
                .context("Cluster configuration generation failed")?;
            info!(
                "Generated {} variables and {} host documents",
                output.document.len(),
                output.host_documents.len()
            );
        }
        Command::Gateway { discovery } => {
            let (config, source) = discovery.load()?;
            let settings = Settings::new(discovery.dir.clone(), discovery.dir.clone());

            let document = generate_gateway(&config, &settings, &source)
                .context("Gateway configuration generation failed")?;
            info!("Generated {} gateway variables", document.len());
        }
        Command::Get { dir, name } => {
            let value = read_variable(&variables_path(&dir), &name)?;
            match value {
                Value::String(s) => println!("{s}"),
                other => println!("{other}"),
            }
        }
    }

    Ok(())
}

fn init_logging() {
    // Format: timestamp file:line LEVEL message
    //
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Respects RUST_LOG_FORMAT=json for JSON output
    //
    // Logs go to stderr so `get` output stays clean on stdout
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}
