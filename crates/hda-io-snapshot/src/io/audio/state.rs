use crate::io::state::codec::{Decoder, Encoder};
use crate::io::state::{
    IoSnapshot, SnapshotError, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter,
};

/// Number of stream slots carried per codec instance.
pub const HDA_AUDIO_MAX_STREAMS: usize = 4;

/// Number of stream tags per direction in the running-state arrays.
pub const HDA_AUDIO_STREAM_TAGS: usize = 16;

// Upper bounds applied while decoding untrusted snapshot bytes.
const MAX_COMPAT_BUF_LEN: usize = 4096;
const MAX_RING_BUF_LEN: usize = 1 << 20;

/// Per-stream registers that always survive a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HdaAudioStreamState {
    pub stream: u8,
    pub channel: u8,
    pub format: u32,
    pub gain_left: u8,
    pub gain_right: u8,
    pub mute_left: bool,
    pub mute_right: bool,
    pub compat_bpos: u32,
    pub compat_buf: Vec<u8>,
    /// Ring buffer + pacing anchor; only present for timer-paced devices.
    pub buffer: Option<HdaAudioStreamBufferState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HdaAudioStreamBufferState {
    pub buf: Vec<u8>,
    pub rpos: i64,
    pub wpos: i64,
    /// Guest-time deadline of the armed pacing tick, if any.
    pub timer_deadline_ns: Option<u64>,
    pub buft_start: i64,
}

/// Snapshot record for an HDA codec device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdaAudioState {
    pub streams: Vec<HdaAudioStreamState>,
    /// Legacy running array indexed by stream tag only.
    pub running_compat: [bool; HDA_AUDIO_STREAM_TAGS],
    /// Running array indexed by `output * 16 + tag`.
    ///
    /// `None` when the snapshot predates the two-direction layout (device version 1.x); the
    /// consumer must then derive it from `running_compat`.
    pub running_real: Option<[bool; 2 * HDA_AUDIO_STREAM_TAGS]>,
}

impl Default for HdaAudioState {
    fn default() -> Self {
        Self {
            streams: Vec::new(),
            running_compat: [false; HDA_AUDIO_STREAM_TAGS],
            running_real: Some([false; 2 * HDA_AUDIO_STREAM_TAGS]),
        }
    }
}

impl HdaAudioState {
    /// Device version of snapshots that only carry `running_compat`.
    pub const LEGACY_VERSION: SnapshotVersion = SnapshotVersion::new(1, 0);

    /// Encode as a 1.x blob for consumers that predate the two-direction running array.
    pub fn save_legacy_state(&self) -> Vec<u8> {
        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::LEGACY_VERSION);
        self.write_fields(&mut w, false);
        w.finish()
    }

    fn write_fields(&self, w: &mut SnapshotWriter, with_real: bool) {
        let mut streams = Encoder::new().u32(self.streams.len() as u32);
        for s in &self.streams {
            streams = streams
                .u8(s.stream)
                .u8(s.channel)
                .u32(s.format)
                .u8(s.gain_left)
                .u8(s.gain_right)
                .bool(s.mute_left)
                .bool(s.mute_right)
                .u32(s.compat_bpos)
                .vec_u8(&s.compat_buf);
        }
        w.field_bytes(TAG_STREAMS, streams.finish());

        let buffered: Vec<(usize, &HdaAudioStreamBufferState)> = self
            .streams
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.buffer.as_ref().map(|b| (i, b)))
            .collect();
        if !buffered.is_empty() {
            let mut bufs = Encoder::new().u32(buffered.len() as u32);
            for (index, b) in buffered {
                bufs = bufs
                    .u8(index as u8)
                    .vec_u8(&b.buf)
                    .i64(b.rpos)
                    .i64(b.wpos)
                    .bool(b.timer_deadline_ns.is_some())
                    .u64(b.timer_deadline_ns.unwrap_or(0))
                    .i64(b.buft_start);
            }
            w.field_bytes(TAG_STREAM_BUFFERS, bufs.finish());
        }

        w.field_bytes(TAG_RUNNING_COMPAT, encode_bools(&self.running_compat));
        if with_real {
            if let Some(real) = &self.running_real {
                w.field_bytes(TAG_RUNNING_REAL, encode_bools(real));
            }
        }
    }
}

const TAG_STREAMS: u16 = 1;
const TAG_RUNNING_COMPAT: u16 = 2;
const TAG_RUNNING_REAL: u16 = 3;
const TAG_STREAM_BUFFERS: u16 = 4;

fn encode_bools(bools: &[bool]) -> Vec<u8> {
    bools.iter().map(|&b| u8::from(b)).collect()
}

fn decode_bools<const N: usize>(bytes: &[u8], what: &'static str) -> SnapshotResult<[bool; N]> {
    if bytes.len() != N {
        return Err(SnapshotError::InvalidFieldEncoding(what));
    }
    let mut d = Decoder::new(bytes);
    let mut out = [false; N];
    for slot in out.iter_mut() {
        *slot = d.bool()?;
    }
    d.finish()?;
    Ok(out)
}

impl IoSnapshot for HdaAudioState {
    const DEVICE_ID: [u8; 4] = *b"HDAC";
    const DEVICE_VERSION: SnapshotVersion = SnapshotVersion::new(2, 0);

    fn save_state(&self) -> Vec<u8> {
        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::DEVICE_VERSION);
        self.write_fields(&mut w, true);
        w.finish()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        let r = SnapshotReader::parse(bytes, Self::DEVICE_ID)?;
        let major = r.header().device_version.major;
        if major == 0 || major > Self::DEVICE_VERSION.major {
            return Err(SnapshotError::UnsupportedDeviceMajorVersion(major));
        }

        self.streams.clear();
        if let Some(buf) = r.bytes(TAG_STREAMS) {
            let mut d = Decoder::new(buf);
            let count = d.u32()? as usize;
            if count > HDA_AUDIO_MAX_STREAMS {
                return Err(SnapshotError::InvalidFieldEncoding("too many streams"));
            }
            self.streams.reserve(count);
            for _ in 0..count {
                let s = HdaAudioStreamState {
                    stream: d.u8()?,
                    channel: d.u8()?,
                    format: d.u32()?,
                    gain_left: d.u8()?,
                    gain_right: d.u8()?,
                    mute_left: d.bool()?,
                    mute_right: d.bool()?,
                    compat_bpos: d.u32()?,
                    compat_buf: d.vec_u8(MAX_COMPAT_BUF_LEN)?,
                    buffer: None,
                };
                if s.compat_bpos as usize > s.compat_buf.len() {
                    return Err(SnapshotError::InvalidFieldEncoding(
                        "compat buffer position out of range",
                    ));
                }
                self.streams.push(s);
            }
            d.finish()?;
        }

        if let Some(buf) = r.bytes(TAG_STREAM_BUFFERS) {
            let mut d = Decoder::new(buf);
            let count = d.u32()? as usize;
            if count > self.streams.len() {
                return Err(SnapshotError::InvalidFieldEncoding("too many stream buffers"));
            }
            for _ in 0..count {
                let index = d.u8()? as usize;
                let buf = d.vec_u8(MAX_RING_BUF_LEN)?;
                let rpos = d.i64()?;
                let wpos = d.i64()?;
                let has_timer = d.bool()?;
                let deadline = d.u64()?;
                let buft_start = d.i64()?;

                if rpos < 0 || wpos < rpos || (wpos - rpos) as u64 > buf.len() as u64 {
                    return Err(SnapshotError::InvalidFieldEncoding(
                        "ring cursors out of range",
                    ));
                }
                let stream = self
                    .streams
                    .get_mut(index)
                    .ok_or(SnapshotError::InvalidFieldEncoding("stream buffer index"))?;
                stream.buffer = Some(HdaAudioStreamBufferState {
                    buf,
                    rpos,
                    wpos,
                    timer_deadline_ns: has_timer.then_some(deadline),
                    buft_start,
                });
            }
            d.finish()?;
        }

        self.running_compat = match r.bytes(TAG_RUNNING_COMPAT) {
            Some(buf) => decode_bools(buf, "running_compat length")?,
            None => [false; HDA_AUDIO_STREAM_TAGS],
        };

        self.running_real = if major < 2 {
            None
        } else {
            match r.bytes(TAG_RUNNING_REAL) {
                Some(buf) => Some(decode_bools(buf, "running_real length")?),
                // Only 1.x blobs fall back to the legacy array.
                None => Some([false; 2 * HDA_AUDIO_STREAM_TAGS]),
            }
        };

        Ok(())
    }
}
