#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
#[cfg(not(target_arch = "wasm32"))]
use hda_codec::verb::{AC_VERB_SET_CHANNEL_STREAMID, AC_VERB_SET_STREAM_FORMAT};
#[cfg(not(target_arch = "wasm32"))]
use hda_codec::{HdaAudio, HdaAudioConfig, HdaCodecBus, MemoryBackend, HDA_TIMER_TICK_NS};

#[cfg(not(target_arch = "wasm32"))]
fn criterion_config() -> Criterion {
    match std::env::var("HDA_BENCH_PROFILE").as_deref() {
        Ok("ci") => Criterion::default()
            // Keep PR runtime low.
            .warm_up_time(Duration::from_millis(200))
            .measurement_time(Duration::from_secs(1))
            .sample_size(10)
            .noise_threshold(0.05),
        _ => Criterion::default()
            .warm_up_time(Duration::from_secs(1))
            .measurement_time(Duration::from_secs(2))
            .sample_size(30)
            .noise_threshold(0.03),
    }
}

/// Controller stand-in that accepts every transfer without touching the data.
#[cfg(not(target_arch = "wasm32"))]
struct NullBus;

#[cfg(not(target_arch = "wasm32"))]
impl HdaCodecBus for NullBus {
    #[inline]
    fn xfer(&mut self, _stream_tag: u8, _output: bool, buf: &mut [u8]) -> bool {
        black_box(buf);
        true
    }

    #[inline]
    fn response(&mut self, _solicited: bool, data: u32) {
        black_box(data);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn playing_device(use_timer: bool) -> HdaAudio<MemoryBackend> {
    let config = HdaAudioConfig {
        use_timer,
        ..HdaAudioConfig::default()
    };
    let mut dev = HdaAudio::new(config, MemoryBackend::new()).unwrap();
    // 48 kHz, 16-bit stereo on tag 1.
    dev.execute(0x02, AC_VERB_SET_STREAM_FORMAT, 0x0011, 0);
    dev.execute(0x02, AC_VERB_SET_CHANNEL_STREAMID, 0x10, 0);
    dev.stream_notice(1, true, true, 0);
    dev
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_timer_tick(c: &mut Criterion) {
    let mut dev = playing_device(true);
    let mut bus = NullBus;
    let voice = dev.stream(0).unwrap().voice().unwrap();
    let mut now = 0u64;

    let mut group = c.benchmark_group("stream_pacing");
    // One tick moves 192 bytes at 48 kHz stereo S16.
    group.throughput(Throughput::Bytes(192));
    group.bench_function("timer_tick_and_drain", |b| {
        b.iter(|| {
            now += HDA_TIMER_TICK_NS;
            dev.run_timers(black_box(now), &mut bus);
            dev.backend_callback(0, 192, now, &mut bus);
            black_box(dev.backend_mut().take_played(voice))
        })
    });
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_compat_callback(c: &mut Criterion) {
    let mut dev = playing_device(false);
    let mut bus = NullBus;
    let voice = dev.stream(0).unwrap().voice().unwrap();

    let mut group = c.benchmark_group("stream_pacing");
    group.throughput(Throughput::Bytes(4096));
    group.bench_function("compat_callback_4k", |b| {
        b.iter(|| {
            dev.backend_callback(0, black_box(4096), 0, &mut bus);
            black_box(dev.backend_mut().take_played(voice))
        })
    });
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_command(c: &mut Criterion) {
    let mut dev = playing_device(true);
    let mut bus = NullBus;

    let mut group = c.benchmark_group("command");
    group.throughput(Throughput::Elements(1));
    group.bench_function("get_parameter_widget_cap", |b| {
        b.iter(|| dev.process_command(black_box(0x14), black_box(0x000f_0009), 0, &mut bus))
    });
    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_timer_tick, bench_compat_callback, bench_command
}
#[cfg(not(target_arch = "wasm32"))]
criterion_main!(benches);
