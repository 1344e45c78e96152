//! Basic example: Find a light bulb and list what it exposes
//!
//! Run with: cargo run --example discover_bulb [device-name]

use magicblue_rust_ble::ble::format_services;
use magicblue_rust_ble::{DeviceSession, Result, SessionConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("magicblue_rust_ble=debug".parse().unwrap()),
        )
        .init();

    let mut config = SessionConfig::default().with_scan_timeout(Duration::from_secs(15));
    if let Some(name) = std::env::args().nth(1) {
        config = config.with_device_name(name);
    }

    println!("Looking for a bulb advertising {}...", config.service_uuid);
    println!("Make sure the bulb is powered and not connected to a phone.\n");

    let session = DeviceSession::with_bluetooth(config).await?;

    let _connected = session.on_connected(|event| {
        println!("Connected to {:?} at {}", event.identifier, event.timestamp);
    });
    let _lost = session.on_connection_lost(|_| {
        println!("\nBulb disconnected");
    });

    session.connect().await?;

    println!(
        "\nBulb: {}",
        session.device_name().as_deref().unwrap_or("(unnamed)")
    );
    println!("{}", format_services(&session.services()));

    session.disconnect().await?;
    println!("\nDone!");

    Ok(())
}
