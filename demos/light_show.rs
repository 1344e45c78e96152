//! Example: Cycle a bulb through the color presets
//!
//! Run with: cargo run --example light_show

use magicblue_rust_ble::{CommandSink, DeviceSession, Result, Rgb, SessionConfig};
use std::sync::Arc;
use std::time::Duration;

/// Step through every preset, then flash the power.
async fn show(sink: &dyn CommandSink) -> Result<()> {
    for (name, color) in Rgb::PRESETS {
        println!("  {:<8} {}", name, color);
        sink.set_color(color).await?;
        tokio::time::sleep(Duration::from_millis(800)).await;
    }

    for on in [false, true, false, true] {
        sink.set_power(on).await?;
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("magicblue_rust_ble=info".parse().unwrap()),
        )
        .init();

    let session = Arc::new(DeviceSession::with_bluetooth(SessionConfig::default()).await?);
    session.connect().await?;

    if !session.is_powered_on() {
        session.power_on().await?;
    }

    println!("Running light show. Press Ctrl+C to stop.\n");

    let sink: Arc<dyn CommandSink> = session.clone();
    tokio::select! {
        result = show(sink.as_ref()) => result?,
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted!");
        }
    }

    session.set_rgb(Rgb::WHITE).await?;
    session.disconnect().await?;

    Ok(())
}
