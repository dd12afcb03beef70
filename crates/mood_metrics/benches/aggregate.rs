use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use mood_metrics::{
    Mood, MoodRecord, NewMoodRecord, SeriesOptions, build_daily_series, summarize_at,
};
use std::hint::black_box;

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 30, 20, 0, 0).unwrap()
}

// A year of records, several per day.
fn records(n: i64) -> Vec<MoodRecord> {
    (0..n)
        .map(|i| {
            let mut r = NewMoodRecord::new("u1", Mood::ALL[(i % 5) as usize])
                .into_record(format!("r{i}"), reference() - TimeDelta::minutes(i * 97));
            r.tags = vec![format!("tag{}", i % 23), format!("tag{}", i % 7)];
            r.sleep_hours = Some(7.0);
            r
        })
        .collect()
}

fn bench_summarize(c: &mut Criterion) {
    let input = records(5_000);
    c.bench_function("summarize_5k", |b| {
        b.iter(|| summarize_at(black_box(&input), reference()).expect("summary"))
    });
}

fn bench_daily_series(c: &mut Criterion) {
    let input = records(5_000);
    let options = SeriesOptions::default();
    c.bench_function("build_daily_series_30d_5k", |b| {
        b.iter(|| build_daily_series(black_box(&input), 30, reference(), &options).expect("series"))
    });
}

criterion_group!(benches, bench_summarize, bench_daily_series);
criterion_main!(benches);
