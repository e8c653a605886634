//! Discovery probe
//!
//! Seeds an in-process registry with the instances given on the command line,
//! runs a number of discoveries with the chosen strategy and prints every
//! pick together with the request frame that would be sent to it.
//!
//! ```text
//! discovery_probe --instance order-service=10.0.0.1:8080 \
//!                 --instance order-service=10.0.0.2:8080 --calls 4
//! ```

use anyhow::{bail, Context, Result};
use bytes::{Bytes, BytesMut};
use clap::Parser;
use rpc_codec::{Frame, MessageHeader, SequenceGenerator};
use rpc_config::{load_config, LoadBalanceKind, RpcConfig};
use rpc_network::{InMemoryCoordinator, RegistryClient, ServiceDiscovery, ServiceInfo};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load balance strategy (random, round_robin, weighted_random, consistent_hash)
    #[arg(short, long)]
    strategy: Option<String>,

    /// Instance to register, as name=host:port[:weight]; repeatable
    #[arg(short, long = "instance")]
    instances: Vec<String>,

    /// Service to discover
    #[arg(long, default_value = "order-service")]
    service: String,

    /// Number of discoveries to run
    #[arg(short = 'n', long, default_value_t = 4)]
    calls: usize,

    /// Affinity key for keyed selection
    #[arg(short, long)]
    key: Option<String>,

    /// Serializer name stamped into request headers
    #[arg(long)]
    serializer: Option<String>,
}

fn parse_instance(spec: &str) -> Result<ServiceInfo> {
    let (name, endpoint) = spec
        .split_once('=')
        .with_context(|| format!("instance '{}' is not name=host:port", spec))?;

    let mut parts = endpoint.split(':');
    let (Some(host), Some(port)) = (parts.next(), parts.next()) else {
        bail!("instance '{}' is missing a port", spec);
    };
    let port: u16 = port
        .parse()
        .with_context(|| format!("invalid port in '{}'", spec))?;

    let mut instance = ServiceInfo::new(name, host, port);
    if let Some(weight) = parts.next() {
        let weight = weight
            .parse()
            .with_context(|| format!("invalid weight in '{}'", spec))?;
        instance = instance.with_weight(weight);
    }
    if parts.next().is_some() {
        bail!("instance '{}' has trailing fields", spec);
    }
    Ok(instance)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RpcConfig::load(Some(path), None)?,
        None => load_config(None)?,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings = config.discovery_settings();
    if let Some(strategy) = &args.strategy {
        settings.load_balance = strategy.parse::<LoadBalanceKind>()?;
    }
    info!(strategy = ?settings.load_balance, service = %args.service, "starting discovery probe");

    let coordinator = Arc::new(InMemoryCoordinator::new());

    let provider = RegistryClient::new(settings.registry.clone(), coordinator.clone());
    provider.start().await?;
    for spec in &args.instances {
        let instance = parse_instance(spec)?;
        provider.register_instance(&instance).await?;
    }

    let discovery = ServiceDiscovery::connect(settings, coordinator).await?;
    let serializer = args.serializer.as_deref().unwrap_or(&config.codec.serializer);
    let sequence = SequenceGenerator::new();
    let mut buf = BytesMut::new();

    for call in 0..args.calls {
        let instance = match &args.key {
            Some(key) => discovery.discover_with_key(&args.service, key).await?,
            None => discovery.discover(&args.service).await?,
        };

        let body = serde_json::to_vec(&serde_json::json!({
            "service": args.service,
            "call": call,
        }))?;
        let frame = Frame::new(MessageHeader::build(serializer, &sequence)?, Bytes::from(body))?;

        buf.clear();
        frame.encode_with_limit(&mut buf, config.codec.max_body_len)?;
        println!(
            "call {:>3} -> {:<21} seq={} serializer={} frame={}B",
            call,
            instance.address(),
            frame.header.sequence_id,
            frame.header.serializer_type,
            buf.len()
        );
    }

    discovery.destroy().await;
    provider.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instance() {
        let instance = parse_instance("orders=10.0.0.1:8080:5").unwrap();
        assert_eq!(instance.service_name, "orders");
        assert_eq!(instance.address(), "10.0.0.1:8080");
        assert_eq!(instance.weight, 5);

        assert_eq!(parse_instance("orders=h:1").unwrap().weight, 1);
        assert!(parse_instance("orders").is_err());
        assert!(parse_instance("orders=h").is_err());
        assert!(parse_instance("orders=h:x").is_err());
        assert!(parse_instance("orders=h:1:2:3").is_err());
    }
}
