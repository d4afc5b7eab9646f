//! Sensor over an in-process byte pipe, answered by a simulated module

mod common;

use bytes::BytesMut;
use common::{ack, ADDRESS};
use fpsensor::{Sensor, SensorConfig, StreamTransport};
use fpsensor_core::{Instruction, PacketDecoder};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

const VERIFY_PASSWORD: u8 = Instruction::VerifyPassword as u8;
const TEMPLATE_COUNT: u8 = Instruction::TemplateCount as u8;
const RANDOM_NUMBER: u8 = Instruction::GenerateRandomNumber as u8;

/// Answers every command frame until the pipe closes
async fn simulated_sensor(mut link: DuplexStream, password: u32) {
    let mut decoder = PacketDecoder::new();
    let mut buf = BytesMut::with_capacity(256);

    loop {
        buf.clear();
        match link.read_buf(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => decoder.push(&buf),
        }

        while let Ok(Some(packet)) = decoder.next_packet() {
            let reply = match packet.payload[0] {
                VERIFY_PASSWORD => {
                    if packet.payload[1..] == password.to_be_bytes() {
                        ack(0x00, &[])
                    } else {
                        ack(0x13, &[])
                    }
                }
                TEMPLATE_COUNT => ack(0x00, &[0x00, 0x03]),
                RANDOM_NUMBER => ack(0x00, &[0, 0, 0, 4]),
                _ => ack(0x01, &[]),
            };

            if link.write_all(&reply).await.is_err() {
                return;
            }
        }
    }
}

#[tokio::test]
async fn commands_over_a_byte_stream() {
    let (host, module) = duplex(1024);
    let simulator = tokio::spawn(simulated_sensor(module, 0x0000_0042));

    let transport = StreamTransport::new(host).with_label("duplex");
    let mut sensor = Sensor::new(transport, SensorConfig::default().with_password(0x42));

    sensor.open().await.unwrap();
    assert_eq!(sensor.session().address(), ADDRESS);
    assert_eq!(sensor.template_count().await.unwrap(), 3);
    assert_eq!(sensor.generate_random_number().await.unwrap(), 4);

    sensor.close().await.unwrap();
    simulator.await.unwrap();
}

#[tokio::test]
async fn wrong_password_over_a_byte_stream() {
    let (host, module) = duplex(1024);
    let simulator = tokio::spawn(simulated_sensor(module, 1));

    let mut sensor = Sensor::new(StreamTransport::new(host), SensorConfig::default());

    assert!(matches!(
        sensor.open().await,
        Err(fpsensor::Error::WrongPassword)
    ));

    drop(sensor);
    simulator.await.unwrap();
}
