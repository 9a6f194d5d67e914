//! Per-slot stream state and the two pacing algorithms.
//!
//! Timer pacing moves guest data between the bus and a [`RingBuffer`] on a fixed guest-time tick,
//! while the host backend drains/fills the ring from its own callback. Drift between the two clocks
//! is corrected by nudging the tick's time anchor. Callback ("compat") pacing has no tick: the
//! backend callback pulls/pushes fixed blocks straight through a small staging buffer.

use hda_time::{TimerId, TimerQueue, NANOS_PER_MS, NANOS_PER_SEC};
use tracing::{debug, trace, warn};

use crate::amp::AmpState;
use crate::backend::{AudioBackend, VoiceId};
use crate::bus::HdaCodecBus;
use crate::ring::RingBuffer;

/// Pacing tick period in guest nanoseconds.
pub const HDA_TIMER_TICK_NS: u64 = NANOS_PER_MS;

/// Size of the callback-paced staging buffer.
pub const HDA_COMPAT_BUF_SIZE: usize = 256;

/// Raw format installed on every converter at power-on.
pub const HDA_DEFAULT_FORMAT: u32 = 0xe0560;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Output,
    Input,
}

impl Direction {
    pub fn is_output(self) -> bool {
        self == Direction::Output
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SampleFormat {
    S8,
    S16,
    S32,
}

impl SampleFormat {
    pub fn bits(self) -> u8 {
        match self {
            SampleFormat::S8 => 8,
            SampleFormat::S16 => 16,
            SampleFormat::S32 => 32,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SampleFormat::S8 => "s8",
            SampleFormat::S16 => "s16",
            SampleFormat::S32 => "s32",
        }
    }
}

/// Decoded stream format word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub sample_format: SampleFormat,
    pub channels: u8,
}

impl StreamFormat {
    pub fn from_hda_fmt(fmt: u32) -> Self {
        // Bit 14 selects the 44.1 kHz base; clear means 48 kHz.
        let base = if fmt & (1 << 14) != 0 { 44_100 } else { 48_000 };
        let mult = match (fmt >> 11) & 0x7 {
            1 => 2,
            2 => 3,
            3 => 4,
            _ => 1,
        };
        let div = ((fmt >> 8) & 0x7) + 1;
        let sample_format = match (fmt >> 4) & 0x7 {
            0 => SampleFormat::S8,
            1 => SampleFormat::S16,
            2..=4 => SampleFormat::S32,
            _ => SampleFormat::S16,
        };

        Self {
            sample_rate: base * mult / div,
            sample_format,
            channels: (fmt & 0xf) as u8 + 1,
        }
    }

    /// Rate used to pace the ring; always counts two bytes per sample.
    pub fn bytes_per_second(&self) -> u64 {
        2 * u64::from(self.channels) * u64::from(self.sample_rate)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CompatBuffer {
    pub buf: [u8; HDA_COMPAT_BUF_SIZE],
    pub bpos: usize,
}

impl CompatBuffer {
    fn new(bpos: usize) -> Self {
        Self {
            buf: [0; HDA_COMPAT_BUF_SIZE],
            bpos,
        }
    }

    fn is_full(&self) -> bool {
        self.bpos == HDA_COMPAT_BUF_SIZE
    }
}

/// Engine state for one bound stream slot.
#[derive(Debug)]
pub struct HdaAudioStream {
    pub(crate) slot: usize,
    pub(crate) nid: u32,
    pub(crate) name: &'static str,
    pub(crate) direction: Direction,
    pub(crate) running: bool,
    pub(crate) tag: u8,
    pub(crate) channel: u8,
    pub(crate) format: u32,
    pub(crate) decoded: StreamFormat,
    pub(crate) amp: AmpState,
    pub(crate) ring: RingBuffer,
    pub(crate) compat: CompatBuffer,
    /// Guest time at which the ring position was last zero.
    pub(crate) buft_start: i64,
    pub(crate) timer: Option<TimerId>,
    pub(crate) voice: Option<VoiceId>,
}

impl HdaAudioStream {
    pub(crate) fn new(slot: usize, nid: u32, name: &'static str, direction: Direction) -> Self {
        let (amp, bpos) = match direction {
            // Playback starts unmuted with an exhausted staging block.
            Direction::Output => (AmpState::full_scale(), HDA_COMPAT_BUF_SIZE),
            Direction::Input => (AmpState::default(), 0),
        };
        Self {
            slot,
            nid,
            name,
            direction,
            running: false,
            tag: 0,
            channel: 0,
            format: HDA_DEFAULT_FORMAT,
            decoded: StreamFormat::from_hda_fmt(HDA_DEFAULT_FORMAT),
            amp,
            ring: RingBuffer::new(),
            compat: CompatBuffer::new(bpos),
            buft_start: 0,
            timer: None,
            voice: None,
        }
    }

    pub fn nid(&self) -> u32 {
        self.nid
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stream_tag(&self) -> u8 {
        self.tag
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn raw_format(&self) -> u32 {
        self.format
    }

    pub fn format(&self) -> StreamFormat {
        self.decoded
    }

    pub fn amp(&self) -> AmpState {
        self.amp
    }

    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    pub fn timer_anchor_ns(&self) -> i64 {
        self.buft_start
    }

    pub fn compat_bpos(&self) -> usize {
        self.compat.bpos
    }

    pub fn voice(&self) -> Option<VoiceId> {
        self.voice
    }

    /// Store and decode a raw format word.
    pub(crate) fn set_format(&mut self, raw: u32) {
        self.format = raw;
        self.decoded = StreamFormat::from_hda_fmt(raw);
    }

    /// (Re)open the host voice for the current format, reusing the existing handle.
    pub(crate) fn setup(&mut self, backend: &mut dyn AudioBackend) {
        debug!(
            node = self.name,
            channels = self.decoded.channels,
            format = self.decoded.sample_format.name(),
            rate = self.decoded.sample_rate,
            "hda stream format"
        );
        self.voice = backend.open(self.voice, self.name, self.direction, &self.decoded);
    }

    /// Push the current amp state to the host voice.
    pub(crate) fn apply_amp(&self, backend: &mut dyn AudioBackend, mixer: bool) {
        if !mixer {
            return;
        }
        if let Some(voice) = self.voice {
            backend.set_volume(voice, self.amp.volume());
        }
    }

    pub(crate) fn set_running(
        &mut self,
        running: bool,
        now_ns: u64,
        use_timer: bool,
        timers: &mut TimerQueue<usize>,
        backend: &mut dyn AudioBackend,
    ) {
        if self.running == running {
            return;
        }
        self.running = running;
        debug!(node = self.name, stream = self.tag, running, "hda stream running");

        if use_timer {
            if running {
                self.ring.reset();
                self.buft_start = now_ns as i64;
                self.arm_timer(now_ns + HDA_TIMER_TICK_NS, timers);
            } else {
                self.disarm_timer(timers);
            }
        }
        if let Some(voice) = self.voice {
            backend.set_active(voice, running);
        }
    }

    /// Enter the running state keeping restored ring contents and anchor.
    pub(crate) fn resume(
        &mut self,
        deadline_ns: u64,
        use_timer: bool,
        timers: &mut TimerQueue<usize>,
        backend: &mut dyn AudioBackend,
    ) {
        if self.running {
            return;
        }
        self.running = true;
        debug!(node = self.name, stream = self.tag, "hda stream resumed");
        if use_timer {
            self.arm_timer(deadline_ns, timers);
        }
        if let Some(voice) = self.voice {
            backend.set_active(voice, true);
        }
    }

    pub(crate) fn arm_timer(&mut self, deadline_ns: u64, timers: &mut TimerQueue<usize>) {
        self.disarm_timer(timers);
        self.timer = Some(timers.schedule(deadline_ns, self.slot));
    }

    pub(crate) fn disarm_timer(&mut self, timers: &mut TimerQueue<usize>) {
        if let Some(id) = self.timer.take() {
            timers.cancel(id);
        }
    }

    /// Ring position the guest should have reached by `now_ns`, frame aligned.
    fn wanted_pos(&self, now_ns: u64) -> i64 {
        let elapsed = i128::from(now_ns) - i128::from(self.buft_start);
        let pos = i128::from(self.decoded.bytes_per_second()) * elapsed / i128::from(NANOS_PER_SEC);
        (pos as i64) & !3
    }

    /// Timer tick. Fired with `timer` already consumed.
    pub(crate) fn on_timer(
        &mut self,
        now_ns: u64,
        bus: &mut dyn HdaCodecBus,
        timers: &mut TimerQueue<usize>,
    ) {
        match self.direction {
            Direction::Output => self.output_timer(now_ns, bus),
            Direction::Input => self.input_timer(now_ns, bus),
        }
        if self.running {
            self.arm_timer(now_ns + HDA_TIMER_TICK_NS, timers);
        }
    }

    fn output_timer(&mut self, now_ns: u64, bus: &mut dyn HdaCodecBus) {
        let wanted = self.wanted_pos(now_ns);
        let wpos = self.ring.wpos() as i64;
        if wanted <= wpos {
            return;
        }
        let mut to_transfer = self.ring.free().min((wanted - wpos) as usize);
        while to_transfer > 0 {
            let chunk = self.ring.write_chunk(to_transfer);
            let len = chunk.len();
            if !bus.xfer(self.tag, true, chunk) {
                break;
            }
            self.ring.commit_write(len);
            to_transfer -= len;
        }
    }

    fn input_timer(&mut self, now_ns: u64, bus: &mut dyn HdaCodecBus) {
        let wanted = self.wanted_pos(now_ns);
        let rpos = self.ring.rpos() as i64;
        if wanted <= rpos {
            return;
        }
        let mut to_transfer = self.ring.used().min((wanted - rpos) as usize);
        while to_transfer > 0 {
            let chunk = self.ring.read_chunk_mut(to_transfer);
            let len = chunk.len();
            if !bus.xfer(self.tag, false, chunk) {
                break;
            }
            self.ring.commit_read(len);
            to_transfer -= len;
        }
    }

    /// Host backend wants up to `avail` bytes of playback (timer pacing).
    pub(crate) fn output_callback(
        &mut self,
        avail: usize,
        now_ns: u64,
        backend: &mut dyn AudioBackend,
    ) {
        if self.ring.is_full() {
            self.ring.reset();
            self.buft_start = now_ns as i64;
            warn!(node = self.name, "hda output overrun, dropping buffered audio");
            return;
        }
        let Some(voice) = self.voice else {
            return;
        };
        let mut to_transfer = self.ring.used().min(avail);
        while to_transfer > 0 {
            let chunk = self.ring.read_chunk(to_transfer);
            let len = chunk.len();
            let written = backend.write(voice, chunk).min(len);
            self.ring.commit_read(written);
            to_transfer -= written;
            if written < len {
                break;
            }
        }
        let target = self.ring.used() as i64 - (self.ring.capacity() as i64 >> 1);
        self.sync_adjust(target);
    }

    /// Host backend has up to `avail` bytes of capture ready (timer pacing).
    pub(crate) fn input_callback(&mut self, avail: usize, backend: &mut dyn AudioBackend) {
        let Some(voice) = self.voice else {
            return;
        };
        let mut to_transfer = self.ring.free().min(avail);
        while to_transfer > 0 {
            let chunk = self.ring.write_chunk(to_transfer);
            let len = chunk.len();
            let read = backend.read(voice, chunk).min(len);
            self.ring.commit_write(read);
            to_transfer -= read;
            if read < len {
                break;
            }
        }
        let target = self.ring.used() as i64 - (self.ring.capacity() as i64 >> 1);
        self.sync_adjust(-target);
    }

    /// Nudge the time anchor toward a half-full ring.
    pub(crate) fn sync_adjust(&mut self, target: i64) {
        let limit = self.ring.capacity() as i64 / 8;
        let tick = HDA_TIMER_TICK_NS as i64;
        let mut corr = 0;
        if target > limit {
            corr = tick;
        }
        if target < -limit {
            corr = -tick;
        }
        if target < -(2 * limit) {
            corr = -(4 * tick);
        }
        if corr == 0 {
            return;
        }
        trace!(node = self.name, skew = target, "hda timer adjust");
        self.buft_start += corr;
    }

    /// Host backend wants up to `avail` bytes of playback (callback pacing).
    pub(crate) fn compat_output_callback(
        &mut self,
        avail: usize,
        bus: &mut dyn HdaCodecBus,
        backend: &mut dyn AudioBackend,
    ) {
        let Some(voice) = self.voice else {
            return;
        };
        let mut sent = 0;
        while avail - sent >= HDA_COMPAT_BUF_SIZE {
            if self.compat.is_full() {
                if !bus.xfer(self.tag, true, &mut self.compat.buf) {
                    break;
                }
                self.compat.bpos = 0;
            }
            let pending = &self.compat.buf[self.compat.bpos..];
            let len = backend.write(voice, pending).min(pending.len());
            self.compat.bpos += len;
            sent += len;
            if !self.compat.is_full() {
                break;
            }
        }
    }

    /// Host backend has up to `avail` bytes of capture ready (callback pacing).
    pub(crate) fn compat_input_callback(
        &mut self,
        avail: usize,
        bus: &mut dyn HdaCodecBus,
        backend: &mut dyn AudioBackend,
    ) {
        let Some(voice) = self.voice else {
            return;
        };
        let mut recv = 0;
        while avail - recv >= HDA_COMPAT_BUF_SIZE {
            if !self.compat.is_full() {
                let space = &mut self.compat.buf[self.compat.bpos..];
                let len = backend.read(voice, space).min(space.len());
                self.compat.bpos += len;
                recv += len;
                if !self.compat.is_full() {
                    break;
                }
            }
            if !bus.xfer(self.tag, false, &mut self.compat.buf) {
                break;
            }
            self.compat.bpos = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_common_formats() {
        // 48 kHz, 16-bit, stereo.
        let fmt = StreamFormat::from_hda_fmt(0x0011);
        assert_eq!(
            fmt,
            StreamFormat {
                sample_rate: 48_000,
                sample_format: SampleFormat::S16,
                channels: 2,
            }
        );
        assert_eq!(fmt.bytes_per_second(), 192_000);

        // 44.1 kHz, 16-bit, stereo.
        assert_eq!(StreamFormat::from_hda_fmt(0x4011).sample_rate, 44_100);
        // 96 kHz (x2), 24-bit in a 32-bit container, 6 channels.
        let fmt = StreamFormat::from_hda_fmt(0x0835);
        assert_eq!(fmt.sample_rate, 96_000);
        assert_eq!(fmt.sample_format, SampleFormat::S32);
        assert_eq!(fmt.channels, 6);
        // 192 kHz (x4), 8-bit, mono.
        let fmt = StreamFormat::from_hda_fmt(0x1800);
        assert_eq!(fmt.sample_rate, 192_000);
        assert_eq!(fmt.sample_format, SampleFormat::S8);
    }

    #[test]
    fn power_on_format_is_8khz_mono() {
        let fmt = StreamFormat::from_hda_fmt(HDA_DEFAULT_FORMAT);
        assert_eq!(fmt.sample_rate, 8_000);
        assert_eq!(fmt.sample_format, SampleFormat::S16);
        assert_eq!(fmt.channels, 1);
    }

    #[test]
    fn reserved_multiplier_and_depth_fall_back() {
        let fmt = StreamFormat::from_hda_fmt((5 << 11) | (6 << 4));
        assert_eq!(fmt.sample_rate, 48_000);
        assert_eq!(fmt.sample_format, SampleFormat::S16);
    }

    #[test]
    fn power_on_defaults_depend_on_direction() {
        let out = HdaAudioStream::new(0, 2, "dac", Direction::Output);
        assert_eq!(out.amp().gain_left, 0x4a);
        assert_eq!(out.compat_bpos(), HDA_COMPAT_BUF_SIZE);
        let inp = HdaAudioStream::new(1, 7, "adc", Direction::Input);
        assert_eq!(inp.amp().gain_left, 0);
        assert_eq!(inp.compat_bpos(), 0);
        assert_eq!(inp.raw_format(), HDA_DEFAULT_FORMAT);
    }

    #[test]
    fn sync_adjust_thresholds() {
        let mut st = HdaAudioStream::new(0, 2, "dac", Direction::Output);
        let limit = (RingBuffer::CAPACITY / 8) as i64;
        let tick = HDA_TIMER_TICK_NS as i64;

        st.sync_adjust(limit);
        assert_eq!(st.buft_start, 0);
        st.sync_adjust(limit + 1);
        assert_eq!(st.buft_start, tick);
        st.sync_adjust(-limit - 1);
        assert_eq!(st.buft_start, 0);
        st.sync_adjust(-2 * limit);
        assert_eq!(st.buft_start, -tick);
        st.sync_adjust(-2 * limit - 1);
        assert_eq!(st.buft_start, -5 * tick);
    }

    #[test]
    fn wanted_position_is_frame_aligned() {
        let mut st = HdaAudioStream::new(0, 2, "dac", Direction::Output);
        st.set_format(0x0011);
        st.buft_start = 1_000;
        // 192000 B/s * 1 ms = 192 bytes.
        assert_eq!(st.wanted_pos(1_000 + HDA_TIMER_TICK_NS), 192);
        // 8 kHz mono: 16 B/ms, 1.1 ms -> 17.6 -> 16.
        st.set_format(HDA_DEFAULT_FORMAT);
        assert_eq!(st.wanted_pos(1_000 + 1_100_000), 16);
        // Anchor nudged past "now".
        st.buft_start = 2 * NANOS_PER_SEC as i64;
        assert!(st.wanted_pos(0) < 0);
    }
}
