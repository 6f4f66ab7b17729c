//! Parser and merge benchmarks
//!
//! Run with: cargo bench -p geobank-core

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use geobank_core::parse::{parse_tsv, AlternateNameFormat, CityFormat};
use geobank_core::translate::TranslationMerger;
use std::hint::black_box;

const ROWS: u64 = 20_000;

fn city_dump() -> String {
    (0..ROWS)
        .map(|i| {
            let id = (1_000_000 + i).to_string();
            let population = (i * 7 % 50_000).to_string();
            [
                id.as_str(), "Town", "Town", "", "48.5", "7.7", "P", "PPL", "FR", "", "A8", "",
                "", "", population.as_str(), "", "", "Europe/Paris", "2024-01-01",
            ]
            .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn alternate_dump() -> String {
    let langs = ["de", "fr", "it", "en", "es"];
    (0..ROWS)
        .map(|i| {
            let preferred = if i % 3 == 0 { "1" } else { "" };
            format!(
                "{i}\t{}\t{}\tName {i}\t{preferred}\t\t\t\t\t",
                1_000_000 + i % 2_000,
                langs[(i % 5) as usize]
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(ROWS));

    let cities = city_dump();
    group.bench_function("cities_15000", |b| {
        b.iter(|| parse_tsv(black_box(cities.as_bytes()), CityFormat::new(15000)).count())
    });

    let names = alternate_dump();
    group.bench_function("alternate_names", |b| {
        b.iter(|| parse_tsv(black_box(names.as_bytes()), AlternateNameFormat).count())
    });

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let names = alternate_dump();
    let rows: Vec<_> = parse_tsv(names.as_bytes(), AlternateNameFormat)
        .filter_map(Result::ok)
        .collect();

    let mut group = c.benchmark_group("merge");
    group.throughput(Throughput::Elements(rows.len() as u64));
    group.bench_function("offer_all", |b| {
        b.iter(|| {
            let mut merger = TranslationMerger::new();
            for row in &rows {
                merger.offer(row.geoname_id, &row.language, &row.name, row.preferred);
            }
            black_box(merger.len())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_merge);
criterion_main!(benches);
