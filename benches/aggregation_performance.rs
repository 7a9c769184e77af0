use birdstrikes::ChartSet;
use birdstrikes::charts::svg::ChartSvgGenerator;
use birdstrikes::data::{aggregate_by_year_and_phase, filter_phases, parse_records};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::fmt::Write;
use std::time::Duration;

const PHASES: [&str; 7] = [
    "Approach",
    "Climb",
    "Descent",
    "Landing Roll",
    "Take-off run",
    "Taxi",
    "Parked",
];

fn create_sample_csv(rows: usize) -> String {
    let mut csv = String::from("Airport: Name,Flight Date,Phase of flight,Wildlife: Species\n");
    for i in 0..rows {
        let month = i % 12 + 1;
        let day = i % 28 + 1;
        let year = 2000 + (i % 12);
        // every 50th row carries a date that cannot be parsed
        if i % 50 == 0 {
            writeln!(csv, "AIRPORT {},N/A,{},Gulls", i % 40, PHASES[i % PHASES.len()]).unwrap();
        } else {
            writeln!(
                csv,
                "AIRPORT {},{}/{}/{} 0:00,{},Gulls",
                i % 40,
                month,
                day,
                year,
                PHASES[i % PHASES.len()]
            )
            .unwrap();
        }
    }
    csv
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    for rows in [1_000, 25_000] {
        let csv = create_sample_csv(rows);
        group.bench_function(format!("parse_{}_records", rows), |b| {
            b.iter(|| black_box(parse_records(black_box(&csv)).unwrap()));
        });
    }

    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    let dataset = parse_records(&create_sample_csv(25_000)).unwrap();
    group.bench_function("aggregate_25000_records", |b| {
        b.iter(|| black_box(aggregate_by_year_and_phase(dataset.valid_records())));
    });

    let counts = dataset.aggregate();
    let excluded = vec!["approach".to_string()];
    group.bench_function("filter_approach", |b| {
        b.iter(|| black_box(filter_phases(&counts, &excluded)));
    });

    group.bench_function("build_chart_set", |b| {
        b.iter(|| black_box(ChartSet::build(&counts)));
    });

    group.finish();
}

fn bench_svg(c: &mut Criterion) {
    let mut group = c.benchmark_group("svg_export");

    let dataset = parse_records(&create_sample_csv(25_000)).unwrap();
    let charts = ChartSet::build(&dataset.aggregate());
    let generator = ChartSvgGenerator::new();

    group.bench_function("line_chart", |b| {
        b.iter(|| black_box(generator.generate_line_chart(&charts.line).unwrap()));
    });

    group.bench_function("stacked_bar_chart", |b| {
        b.iter(|| black_box(generator.generate_stacked_bar_chart(&charts.stacked_bar).unwrap()));
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets = bench_parsing, bench_aggregation, bench_svg
}
criterion_main!(benches);
