use criterion::{criterion_group, criterion_main, Criterion, black_box};
use std::time::Duration;
use xbee_serial::port::{MockSerialPort, PortConfig, MAX_BUFFER_SIZE};
use xbee_serial::reader::{LineAssembler, LineReader, CR};

pub fn bench_line_assembly(c: &mut Criterion) {
    let mut wire = vec![b'A'; MAX_BUFFER_SIZE];
    wire.push(CR);

    c.bench_function("assemble_max_line", |b| {
        let mut assembler = LineAssembler::new(MAX_BUFFER_SIZE);
        b.iter(|| {
            for &byte in &wire {
                if let Some(line) = assembler.push(byte).unwrap() {
                    black_box(line);
                }
            }
        })
    });
}

pub fn bench_read_response(c: &mut Criterion) {
    c.bench_function("read_response_mock", |b| {
        let mut peer = MockSerialPort::new("BENCH0");
        let mut session = peer.session(PortConfig::default());
        let mut reader = LineReader::new(MAX_BUFFER_SIZE, Some(Duration::from_secs(1)));
        b.iter(|| {
            peer.enqueue_read(b"1A2B\r");
            black_box(reader.read_response(&mut session).unwrap());
        })
    });
}

criterion_group!{
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_line_assembly, bench_read_response
}
criterion_main!(benches);
