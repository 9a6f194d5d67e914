//! Host audio backend seam.

use std::collections::VecDeque;

use crate::stream::{Direction, StreamFormat};

/// Opaque handle to an open host voice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u32);

/// Host volume for a voice, `0..=255` per channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct VoiceVolume {
    pub mute: bool,
    pub left: u8,
    pub right: u8,
}

/// Host audio output/capture primitives.
///
/// The backend reports readiness by having its owner call
/// [`HdaAudio::backend_callback`](crate::HdaAudio::backend_callback) with the number of bytes it
/// can accept (playback) or has available (capture).
pub trait AudioBackend {
    /// Open a voice, or reconfigure `existing` for a new format. Returns `None` if the host cannot
    /// provide one; the stream then stays silent.
    fn open(
        &mut self,
        existing: Option<VoiceId>,
        name: &str,
        direction: Direction,
        format: &StreamFormat,
    ) -> Option<VoiceId>;

    fn close(&mut self, voice: VoiceId);

    /// Queue playback bytes. Returns how many were accepted.
    fn write(&mut self, voice: VoiceId, data: &[u8]) -> usize;

    /// Fetch capture bytes. Returns how many were produced.
    fn read(&mut self, voice: VoiceId, out: &mut [u8]) -> usize;

    fn set_volume(&mut self, voice: VoiceId, volume: VoiceVolume);

    fn set_active(&mut self, voice: VoiceId, active: bool);
}

/// State of one voice of a [`MemoryBackend`].
#[derive(Debug, Clone)]
pub struct MemoryVoice {
    pub name: String,
    pub direction: Direction,
    pub format: StreamFormat,
    pub active: bool,
    pub closed: bool,
    /// Times the voice was opened or reconfigured.
    pub opens: u32,
    pub volume: Option<VoiceVolume>,
    /// Bytes accepted by `write`.
    pub played: Vec<u8>,
    /// Bytes waiting to be returned by `read`.
    pub capture: VecDeque<u8>,
}

/// In-memory backend for tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    voices: Vec<MemoryVoice>,
    io_limit: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap every `write`/`read` call at `limit` bytes, to model a backend that accepts short
    /// transfers.
    pub fn set_io_limit(&mut self, limit: Option<usize>) {
        self.io_limit = limit;
    }

    pub fn voice(&self, id: VoiceId) -> Option<&MemoryVoice> {
        self.voices.get(id.0 as usize)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut MemoryVoice> {
        self.voices.get_mut(id.0 as usize)
    }

    pub fn voices(&self) -> &[MemoryVoice] {
        &self.voices
    }

    /// Make `data` available to the next reads of a capture voice.
    pub fn queue_capture(&mut self, id: VoiceId, data: &[u8]) {
        if let Some(v) = self.voice_mut(id) {
            v.capture.extend(data);
        }
    }

    pub fn take_played(&mut self, id: VoiceId) -> Vec<u8> {
        self.voice_mut(id)
            .map(|v| std::mem::take(&mut v.played))
            .unwrap_or_default()
    }

    fn limit(&self, len: usize) -> usize {
        self.io_limit.map_or(len, |l| l.min(len))
    }
}

impl AudioBackend for MemoryBackend {
    fn open(
        &mut self,
        existing: Option<VoiceId>,
        name: &str,
        direction: Direction,
        format: &StreamFormat,
    ) -> Option<VoiceId> {
        if let Some(id) = existing {
            if let Some(v) = self.voice_mut(id) {
                v.name = name.to_string();
                v.direction = direction;
                v.format = *format;
                v.closed = false;
                v.opens += 1;
                return Some(id);
            }
        }
        let id = VoiceId(self.voices.len() as u32);
        self.voices.push(MemoryVoice {
            name: name.to_string(),
            direction,
            format: *format,
            active: false,
            closed: false,
            opens: 1,
            volume: None,
            played: Vec::new(),
            capture: VecDeque::new(),
        });
        Some(id)
    }

    fn close(&mut self, voice: VoiceId) {
        if let Some(v) = self.voice_mut(voice) {
            v.active = false;
            v.closed = true;
        }
    }

    fn write(&mut self, voice: VoiceId, data: &[u8]) -> usize {
        let n = self.limit(data.len());
        match self.voice_mut(voice) {
            Some(v) if !v.closed => {
                v.played.extend_from_slice(&data[..n]);
                n
            }
            _ => 0,
        }
    }

    fn read(&mut self, voice: VoiceId, out: &mut [u8]) -> usize {
        let n = self.limit(out.len());
        match self.voice_mut(voice) {
            Some(v) if !v.closed => {
                let n = n.min(v.capture.len());
                for (dst, src) in out[..n].iter_mut().zip(v.capture.drain(..n)) {
                    *dst = src;
                }
                n
            }
            _ => 0,
        }
    }

    fn set_volume(&mut self, voice: VoiceId, volume: VoiceVolume) {
        if let Some(v) = self.voice_mut(voice) {
            v.volume = Some(volume);
        }
    }

    fn set_active(&mut self, voice: VoiceId, active: bool) {
        if let Some(v) = self.voice_mut(voice) {
            v.active = active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo() -> StreamFormat {
        StreamFormat::from_hda_fmt(0x0011)
    }

    #[test]
    fn reopen_reuses_handle_and_keeps_active_state() {
        let mut backend = MemoryBackend::new();
        let id = backend
            .open(None, "dac", Direction::Output, &StreamFormat::from_hda_fmt(0xe0560))
            .unwrap();
        backend.set_active(id, true);
        let again = backend.open(Some(id), "dac", Direction::Output, &stereo()).unwrap();
        assert_eq!(again, id);
        let v = backend.voice(id).unwrap();
        assert!(v.active);
        assert_eq!(v.opens, 2);
        assert_eq!(v.format.channels, 2);
        assert_eq!(backend.voices().len(), 1);
    }

    #[test]
    fn io_limit_shortens_transfers() {
        let mut backend = MemoryBackend::new();
        let out = backend.open(None, "dac", Direction::Output, &stereo()).unwrap();
        let inp = backend.open(None, "adc", Direction::Input, &stereo()).unwrap();
        backend.set_io_limit(Some(3));
        assert_eq!(backend.write(out, &[1, 2, 3, 4, 5]), 3);
        assert_eq!(backend.take_played(out), vec![1, 2, 3]);

        backend.queue_capture(inp, &[9, 8]);
        let mut buf = [0u8; 8];
        assert_eq!(backend.read(inp, &mut buf), 2);
        assert_eq!(&buf[..2], &[9, 8]);
        assert_eq!(backend.read(inp, &mut buf), 0);

        backend.close(out);
        assert_eq!(backend.write(out, &[1]), 0);
    }
}
