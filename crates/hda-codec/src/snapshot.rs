//! Snapshot save/restore for [`HdaAudio`].

use hda_io_snapshot::io::audio::state::{
    HdaAudioState, HdaAudioStreamBufferState, HdaAudioStreamState,
};
use hda_io_snapshot::io::state::{IoSnapshot, SnapshotError, SnapshotResult};
use tracing::debug;

use crate::backend::AudioBackend;
use crate::codec::HdaAudio;
use crate::ring::RingBuffer;
use crate::stream::{HdaAudioStream, HDA_COMPAT_BUF_SIZE, HDA_TIMER_TICK_NS};

fn stream_state(
    st: &HdaAudioStream,
    use_timer: bool,
    deadline_ns: Option<u64>,
) -> HdaAudioStreamState {
    HdaAudioStreamState {
        stream: st.tag,
        channel: st.channel,
        format: st.format,
        gain_left: st.amp.gain_left,
        gain_right: st.amp.gain_right,
        mute_left: st.amp.mute_left,
        mute_right: st.amp.mute_right,
        compat_bpos: st.compat.bpos as u32,
        compat_buf: st.compat.buf.to_vec(),
        // Ring contents only matter while a tick is pacing them.
        buffer: use_timer.then(|| HdaAudioStreamBufferState {
            buf: st.ring.as_bytes().to_vec(),
            rpos: st.ring.rpos() as i64,
            wpos: st.ring.wpos() as i64,
            timer_deadline_ns: deadline_ns,
            buft_start: st.buft_start,
        }),
    }
}

fn validate_stream(saved: &HdaAudioStreamState) -> SnapshotResult<()> {
    if saved.compat_bpos as usize > HDA_COMPAT_BUF_SIZE {
        return Err(SnapshotError::InvalidFieldEncoding(
            "compat buffer position out of range",
        ));
    }
    if !saved.compat_buf.is_empty() && saved.compat_buf.len() != HDA_COMPAT_BUF_SIZE {
        return Err(SnapshotError::InvalidFieldEncoding("compat buffer size"));
    }
    if let Some(b) = &saved.buffer {
        if b.buf.len() != RingBuffer::CAPACITY {
            return Err(SnapshotError::InvalidFieldEncoding("ring buffer size"));
        }
        if b.rpos < 0 || b.wpos < b.rpos || b.wpos - b.rpos > RingBuffer::CAPACITY as i64 {
            return Err(SnapshotError::InvalidFieldEncoding("ring cursors out of range"));
        }
    }
    Ok(())
}

impl<B: AudioBackend> HdaAudio<B> {
    /// Capture the device state.
    pub fn snapshot_state(&self) -> HdaAudioState {
        let use_timer = self.config.use_timer;
        let streams = self
            .streams
            .iter()
            .map(|slot| match slot {
                Some(st) => {
                    let deadline = st.timer.and_then(|id| self.timers.deadline_ns(id));
                    stream_state(st, use_timer, deadline)
                }
                None => HdaAudioStreamState::default(),
            })
            .collect();

        HdaAudioState {
            streams,
            running_compat: *self.ledger.compat(),
            running_real: Some(*self.ledger.real()),
        }
    }

    /// Reinstall a captured state.
    ///
    /// Formats are re-decoded, host voices reconfigured and amps re-applied. Streams whose
    /// `(direction, tag)` is running in the ledger are resumed; in timer mode the saved ring
    /// contents, cursors and anchor are kept and the tick is re-armed at its saved deadline.
    /// Nothing is modified if the state is rejected.
    pub fn restore_snapshot_state(
        &mut self,
        state: &HdaAudioState,
        now_ns: u64,
    ) -> SnapshotResult<()> {
        for saved in &state.streams {
            validate_stream(saved)?;
        }

        self.reset(now_ns);
        self.ledger.restore(state.running_compat, state.running_real);
        debug!(
            legacy = state.running_real.is_none(),
            "hda codec restoring snapshot"
        );

        let use_timer = self.config.use_timer;
        let mixer = self.config.mixer;
        for (slot, saved) in self.streams.iter_mut().zip(&state.streams) {
            let Some(st) = slot.as_mut() else {
                continue;
            };
            st.tag = saved.stream & 0xf;
            st.channel = saved.channel & 0xf;
            st.amp.gain_left = saved.gain_left;
            st.amp.gain_right = saved.gain_right;
            st.amp.mute_left = saved.mute_left;
            st.amp.mute_right = saved.mute_right;
            st.compat.bpos = saved.compat_bpos as usize;
            if !saved.compat_buf.is_empty() {
                st.compat.buf.copy_from_slice(&saved.compat_buf);
            }

            let mut deadline = None;
            let mut resumable = false;
            if let (true, Some(b)) = (use_timer, &saved.buffer) {
                resumable = st.ring.restore(&b.buf, b.rpos as u64, b.wpos as u64);
                st.buft_start = b.buft_start;
                deadline = b.timer_deadline_ns;
            }

            st.set_format(saved.format);
            st.setup(&mut self.backend);
            st.apply_amp(&mut self.backend, mixer);

            if self.ledger.is_running(st.direction, st.tag) {
                if resumable {
                    let at = deadline.unwrap_or(now_ns + HDA_TIMER_TICK_NS);
                    st.resume(at, use_timer, &mut self.timers, &mut self.backend);
                } else {
                    st.set_running(true, now_ns, use_timer, &mut self.timers, &mut self.backend);
                }
            }
        }
        Ok(())
    }

    /// Serialize the device state.
    pub fn save_snapshot(&self) -> Vec<u8> {
        self.snapshot_state().save_state()
    }

    /// Parse and reinstall a serialized state. Version 1.x blobs carry only the legacy running
    /// array, which is taken as the output half of the ledger.
    pub fn load_snapshot(&mut self, bytes: &[u8], now_ns: u64) -> SnapshotResult<()> {
        let state = HdaAudioState::decode(bytes)?;
        self.restore_snapshot_state(&state, now_ns)
    }
}
