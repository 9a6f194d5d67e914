#![allow(dead_code)]

use hda_codec::{HdaAudio, HdaAudioConfig, HdaCodecBus, MemoryBackend};

/// Bus that serves a counting byte pattern for playback and records capture.
#[derive(Debug, Default)]
pub struct ScriptBus {
    pub responses: Vec<(bool, u32)>,
    /// `(stream tag, output, len)` per successful transfer.
    pub xfers: Vec<(u8, bool, usize)>,
    /// Successful transfers left before the bus starts refusing; `None` is unlimited.
    pub budget: Option<usize>,
    pub captured: Vec<u8>,
    pub next: u8,
}

impl ScriptBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transferred(&self) -> usize {
        self.xfers.iter().map(|&(_, _, len)| len).sum()
    }
}

impl HdaCodecBus for ScriptBus {
    fn xfer(&mut self, stream_tag: u8, output: bool, buf: &mut [u8]) -> bool {
        match self.budget.as_mut() {
            Some(0) => return false,
            Some(n) => *n -= 1,
            None => {}
        }
        if output {
            for b in buf.iter_mut() {
                *b = self.next;
                self.next = self.next.wrapping_add(1);
            }
        } else {
            self.captured.extend_from_slice(buf);
        }
        self.xfers.push((stream_tag, output, buf.len()));
        true
    }

    fn response(&mut self, solicited: bool, data: u32) {
        self.responses.push((solicited, data));
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

pub fn device(config: HdaAudioConfig) -> HdaAudio<MemoryBackend> {
    init_tracing();
    HdaAudio::new(config, MemoryBackend::new()).expect("ALC885 table is valid")
}

pub fn timer_device() -> HdaAudio<MemoryBackend> {
    device(HdaAudioConfig::default())
}

pub fn compat_device() -> HdaAudio<MemoryBackend> {
    device(HdaAudioConfig {
        use_timer: false,
        ..HdaAudioConfig::default()
    })
}

/// Nanoseconds in `ms` milliseconds.
pub const fn ms(ms: u64) -> u64 {
    ms * 1_000_000
}
