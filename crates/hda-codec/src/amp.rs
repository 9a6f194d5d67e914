use crate::backend::VoiceVolume;
use crate::verb::{AmpSetFlags, AC_AMP_GAIN, AC_AMP_GET_LEFT, AC_AMP_MUTE};

/// Number of gain steps; the top step maps to full host volume.
pub const HDA_AMP_STEPS: u8 = 0x4a;

/// Per-stream gain and mute, in raw codec units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct AmpState {
    pub gain_left: u8,
    pub gain_right: u8,
    pub mute_left: bool,
    pub mute_right: bool,
}

impl AmpState {
    /// Unmuted, both channels at the top step.
    pub fn full_scale() -> Self {
        Self {
            gain_left: HDA_AMP_STEPS,
            gain_right: HDA_AMP_STEPS,
            mute_left: false,
            mute_right: false,
        }
    }

    /// `GET_AMP_GAIN_MUTE` response for `payload`.
    pub fn get(&self, payload: u32) -> u32 {
        let (gain, mute) = if payload & AC_AMP_GET_LEFT != 0 {
            (self.gain_left, self.mute_left)
        } else {
            (self.gain_right, self.mute_right)
        };
        u32::from(gain) | if mute { AC_AMP_MUTE } else { 0 }
    }

    /// Apply a `SET_AMP_GAIN_MUTE` payload. Output/input and index selectors are accepted but
    /// there is only one amp per stream.
    pub fn set(&mut self, payload: u32) {
        let flags = AmpSetFlags::from_bits_truncate(payload);
        let gain = ((payload & AC_AMP_GAIN) as u8).min(HDA_AMP_STEPS);
        let mute = flags.contains(AmpSetFlags::MUTE);
        if flags.contains(AmpSetFlags::LEFT) {
            self.gain_left = gain;
            self.mute_left = mute;
        }
        if flags.contains(AmpSetFlags::RIGHT) {
            self.gain_right = gain;
            self.mute_right = mute;
        }
    }

    /// Host volume: `gain * 255 / 0x4a` per channel, zero when that channel is muted.
    pub fn volume(&self) -> VoiceVolume {
        VoiceVolume {
            mute: self.mute_left && self.mute_right,
            left: gain_to_volume(if self.mute_left { 0 } else { self.gain_left }),
            right: gain_to_volume(if self.mute_right { 0 } else { self.gain_right }),
        }
    }
}

pub fn gain_to_volume(gain: u8) -> u8 {
    let gain = u32::from(gain.min(HDA_AMP_STEPS));
    (gain * 255 / u32::from(HDA_AMP_STEPS)) as u8
}
