//! vinscout — resolve a vehicle's VIN from the CAN bus.
//!
//! Usage: `vinscout [config.toml] [--simulate gm|obd]`
//!
//! Prints the responding address (hex) and the VIN, or address 0 with the
//! all-zero sentinel when the vehicle stayed silent. The embedding host
//! bridges real hardware onto the hub; `--simulate` wires an in-process
//! vehicle instead, for demos and smoke runs.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use vs_bus::CanHub;
use vs_vin::ResolverConfig;

mod sim;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config_path: Option<String> = None;
    let mut simulate: Option<sim::SimMode> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--simulate" => {
                let mode = args
                    .next()
                    .context("--simulate needs a mode: gm or obd")?;
                simulate = Some(mode.parse().map_err(anyhow::Error::msg)?);
            }
            flag if flag.starts_with("--") => anyhow::bail!("unknown flag: {flag}"),
            path => config_path = Some(path.to_string()),
        }
    }

    let config = match &config_path {
        Some(path) => {
            ResolverConfig::from_file(path).with_context(|| format!("loading {path}"))?
        }
        None => ResolverConfig::default(),
    };
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bus = config.bus,
        retries = config.query_retries,
        "vinscout starting"
    );

    let hub = CanHub::default();
    if let Some(mode) = simulate {
        tracing::info!(?mode, "spawning simulated vehicle traffic");
        sim::spawn(&hub, &config, mode);
    }

    let result = vs_vin::get_vin(&hub, &config).await;
    if result.is_unknown() {
        tracing::warn!("VIN could not be resolved");
    }
    println!("{:#05x} {}", result.address, result.vin);
    Ok(())
}
