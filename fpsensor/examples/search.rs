//! Search example with a bounded, cancellable finger wait
//!
//! Press Ctrl-C to stop waiting for a finger.

use std::time::Duration;

use fpsensor::{CancellationToken, Error, Sensor, SensorConfig, SerialTransport, TemplateMatch, WaitPolicy};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let port = std::env::var("SENSOR_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let cancel = CancellationToken::new();
    let config = SensorConfig::default().with_wait(
        WaitPolicy::new()
            .with_poll_interval(Duration::from_millis(100))
            .with_max_attempts(300)
            .with_cancellation(cancel.clone()),
    );

    let mut sensor = Sensor::new(SerialTransport::new(port), config);
    sensor.open().await?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    match sensor.search_fingerprint(|prompt| println!("{}", prompt)).await {
        Ok(found) => {
            let (position, score) = TemplateMatch::as_pair(found);
            println!("Result: position {}, score {}", position, score);
        }
        Err(Error::Cancelled) => println!("Cancelled"),
        Err(Error::FingerNotDetected { attempts }) => {
            println!("No finger after {} attempts", attempts)
        }
        Err(e) => return Err(e.into()),
    }

    sensor.close().await?;
    Ok(())
}
