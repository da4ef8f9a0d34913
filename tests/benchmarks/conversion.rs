// Benchmark of the per-tick work: clock conversion and alarm matching.
use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use decha::schedule::AlarmDraft;
use decha::time::ClockSnapshot;
use decha::{earth_seconds_to_decha_time, Alarm, AlarmMatcher, AlarmRepeat, DechaClock};

fn conversion_benchmarks(c: &mut Criterion) {
    c.bench_function("earth_to_decha", |b| {
        b.iter(|| earth_seconds_to_decha_time(black_box(45_123.456)));
    });

    c.bench_function("snapshot_at", |b| {
        let instant = DateTime::parse_from_rfc3339("2024-06-03T06:00:00+02:00").unwrap();
        b.iter(|| ClockSnapshot::at(black_box(&instant)));
    });

    let alarms: Vec<Alarm> = (0..200u32)
        .map(|i| {
            let time = DechaClock::from_total_seconds(i * 487);
            let draft = AlarmDraft::new(time, format!("alarm {i}")).repeat(AlarmRepeat::Weekdays);
            Alarm::new(draft, Utc::now()).unwrap()
        })
        .collect();
    let matcher = AlarmMatcher::new(alarms);
    let snapshot = ClockSnapshot::at(&DateTime::parse_from_rfc3339("2024-06-03T06:00:00+00:00").unwrap());

    c.bench_function("match_200_alarms", |b| {
        b.iter(|| black_box(matcher.due(black_box(&snapshot))).len());
    });
}

criterion_group!(benches, conversion_benchmarks);
criterion_main!(benches);
