use std::hint::black_box;
use std::time::Instant;
use tempo_timeline::{Beat, TICKS_PER_BEAT, TempoChange, TempoTimelineIndex, Time};

const BEATS: i32 = 4_000;
const QUERIES: i32 = 2_000_000;

fn tempo_map() -> Vec<TempoChange> {
    // A tempo change every 3 beats, sweeping 90..=270 BPM with a reverse segment now and then.
    (0..BEATS / 3)
        .map(|i| {
            let bpm = 90.0 + (i % 19) as f64 * 10.0;
            let bpm = if i % 23 == 22 { -bpm } else { bpm };
            TempoChange::at_tick(i * 3 * TICKS_PER_BEAT, bpm)
        })
        .collect()
}

fn report(label: &str, start: Instant, n: i32) {
    let elapsed = start.elapsed();
    let per = elapsed.as_nanos() as f64 / n as f64;
    let total_ms = elapsed.as_secs_f64() * 1000.0;
    log::info!("{label:<28} {total_ms:>10.3} ms total  {per:>8.2} ns/query");
}

fn main() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .try_init();

    let changes = tempo_map();
    let start = Instant::now();
    let mut index = TempoTimelineIndex::new();
    index.rebuild(&changes);
    report("rebuild", start, 1);
    log::info!("{} ticks, {} tempo changes", index.len(), changes.len());

    let total_ticks = index.len() as i32;
    let end_time = index.last_calculated_time().to_sec();

    let start = Instant::now();
    let mut acc = 0.0;
    for i in 0..QUERIES {
        let tick = ((i as i64 * 7919) % (total_ticks as i64 + 400)) as i32 - 200;
        acc += index.beat_to_time(Beat::from_ticks(tick)).to_sec();
    }
    black_box(acc);
    report("beat_to_time", start, QUERIES);

    let start = Instant::now();
    let mut acc = 0_i64;
    for i in 0..QUERIES {
        let s = (i as f64 / QUERIES as f64) * (end_time + 2.0) - 1.0;
        acc += index.time_to_beat(Time::from_sec(s)).ticks as i64;
    }
    black_box(acc);
    report("time_to_beat", start, QUERIES);

    let start = Instant::now();
    let mut acc = 0.0;
    for i in 0..QUERIES {
        let s = (i as f64 / QUERIES as f64) * (end_time + 2.0) - 1.0;
        acc += index.time_to_hb_scroll_tick(Time::from_sec(s));
    }
    black_box(acc);
    report("time_to_hb_scroll_tick", start, QUERIES);
}
