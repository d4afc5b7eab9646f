use criterion::{criterion_group, criterion_main, Criterion};
use fpsensor_core::{Packet, PacketDecoder, PacketKind};
use std::hint::black_box;

const ADDRESS: u32 = 0xFFFF_FFFF;

fn bench_encoding_packets(c: &mut Criterion) {
    let packet = Packet::with_payload(PacketKind::Data, vec![0x5A; 128]);
    c.bench_function("encode data packet", |b| {
        b.iter(|| black_box(&packet).encode(ADDRESS))
    });
}

fn bench_decoding_packets(c: &mut Criterion) {
    // One characteristics download: three data packets and the end packet
    let mut stream = Vec::new();
    for kind in [PacketKind::Data, PacketKind::Data, PacketKind::Data, PacketKind::EndData] {
        stream.extend_from_slice(&Packet::with_payload(kind, vec![0xA5; 128]).encode(ADDRESS));
    }

    c.bench_function("decode transfer stream", |b| {
        b.iter(|| {
            let mut decoder = PacketDecoder::new();
            decoder.push(black_box(&stream));
            while let Ok(Some(packet)) = decoder.next_packet() {
                black_box(packet);
            }
        })
    });
}

criterion_group!(benches, bench_encoding_packets, bench_decoding_packets);
criterion_main!(benches);
