//! Performance benchmarks for the reachability notifier
//!
//! Covers the per-probe hot path: rendering result lines, parsing them
//! back, parsing ping output and parsing target port lists.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use reachability_notifier::{
    dns::filter_addresses,
    input::TargetLoader,
    models::{parse_ports, ProbeResult},
    output::{format_line, parse_line},
    probe::parse_ping_output,
    types::{ProbeMethod, ProbeStatus},
};
use std::{net::IpAddr, time::Duration};

const LINUX_PING: &str = "PING example.com (93.184.216.34) 56(84) bytes of data.\n\
64 bytes from 93.184.216.34: icmp_seq=1 ttl=56 time=11.9 ms\n\
\n\
--- example.com ping statistics ---\n\
1 packets transmitted, 1 received, 0% packet loss, time 0ms\n\
rtt min/avg/max/mdev = 11.912/11.912/11.912/0.000 ms\n";

fn sample_result() -> ProbeResult {
    ProbeResult::new(
        "example.com",
        "93.184.216.34".parse().unwrap(),
        Duration::from_micros(42_317),
        Some(443),
        ProbeStatus::Opened,
        ProbeMethod::Http,
    )
}

fn sample_target_list(rows: usize) -> String {
    let mut list = String::from("target;ports\n");
    for i in 0..rows {
        list.push_str(&format!("host-{}.example.com;80,443,8080\n", i));
    }
    list
}

fn bench_result_lines(c: &mut Criterion) {
    let result = sample_result();
    let line = format_line(&result);

    c.bench_function("format_line", |b| b.iter(|| format_line(black_box(&result))));
    c.bench_function("parse_line", |b| b.iter(|| parse_line(black_box(&line))));
}

fn bench_ping_output(c: &mut Criterion) {
    c.bench_function("parse_ping_output", |b| {
        b.iter(|| parse_ping_output(black_box(LINUX_PING)))
    });
}

fn bench_target_parsing(c: &mut Criterion) {
    c.bench_function("parse_ports", |b| {
        b.iter(|| parse_ports(black_box("80, 443,abc,8080,70000,22")))
    });

    let mut group = c.benchmark_group("load_targets");
    for rows in [10usize, 100, 1000] {
        let list = sample_target_list(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &list, |b, list| {
            b.iter(|| TargetLoader::default().load_reader(black_box(list.as_bytes())))
        });
    }
    group.finish();
}

fn bench_address_filter(c: &mut Criterion) {
    let addresses: Vec<IpAddr> = (0..64u8)
        .map(|i| IpAddr::from([10, 0, i / 8, i % 8]))
        .chain(std::iter::repeat("10.0.0.1".parse().unwrap()).take(16))
        .collect();

    c.bench_function("filter_addresses", |b| {
        b.iter(|| filter_addresses(black_box(addresses.clone())))
    });
}

criterion_group!(
    benches,
    bench_result_lines,
    bench_ping_output,
    bench_target_parsing,
    bench_address_filter
);
criterion_main!(benches);
