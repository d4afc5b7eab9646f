//! Enrollment example
//!
//! Usage: `SENSOR_PORT=/dev/ttyUSB0 cargo run --example enroll`

use fpsensor::{Enrollment, Sensor};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (RUST_LOG=fpsensor=debug for protocol details)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let port = std::env::var("SENSOR_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let mut sensor = Sensor::serial(port, 57_600);
    sensor.open().await?;
    println!("✓ Sensor ready");

    let usage = sensor.storage_usage().await?;
    println!("Templates in use: {}", usage);

    match sensor.enroll_fingerprint(|prompt| println!("{}", prompt)).await? {
        Enrollment::Enrolled(position) => println!("✓ New template #{}", position),
        Enrollment::AlreadyEnrolled(position) => println!("✓ Already known as #{}", position),
    }

    sensor.close().await?;
    Ok(())
}
