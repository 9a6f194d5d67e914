//! HDA verb/payload protocol constants and command word decoding.

use bitflags::bitflags;

// Verb ids.
pub const AC_VERB_GET_STREAM_FORMAT: u32 = 0xa00;
pub const AC_VERB_GET_AMP_GAIN_MUTE: u32 = 0xb00;
pub const AC_VERB_PARAMETERS: u32 = 0xf00;
pub const AC_VERB_GET_CONNECT_LIST: u32 = 0xf02;
pub const AC_VERB_GET_CONV: u32 = 0xf06;
pub const AC_VERB_GET_PIN_WIDGET_CONTROL: u32 = 0xf07;
pub const AC_VERB_GET_CONFIG_DEFAULT: u32 = 0xf1c;
pub const AC_VERB_GET_SUBSYSTEM_ID: u32 = 0xf20;
pub const AC_VERB_SET_STREAM_FORMAT: u32 = 0x200;
pub const AC_VERB_SET_AMP_GAIN_MUTE: u32 = 0x300;
pub const AC_VERB_SET_CHANNEL_STREAMID: u32 = 0x706;

// Parameter ids.
pub const AC_PAR_VENDOR_ID: u32 = 0x00;
pub const AC_PAR_SUBSYSTEM_ID: u32 = 0x01;
pub const AC_PAR_NODE_COUNT: u32 = 0x04;
pub const AC_PAR_FUNCTION_TYPE: u32 = 0x05;
pub const AC_PAR_AUDIO_WIDGET_CAP: u32 = 0x09;
pub const AC_PAR_PCM: u32 = 0x0a;
pub const AC_PAR_STREAM: u32 = 0x0b;
pub const AC_PAR_PIN_CAP: u32 = 0x0c;
pub const AC_PAR_AMP_IN_CAP: u32 = 0x0d;
pub const AC_PAR_CONNLIST_LEN: u32 = 0x0e;
pub const AC_PAR_POWER_STATE: u32 = 0x0f;
pub const AC_PAR_AMP_OUT_CAP: u32 = 0x12;

// Audio widget capabilities.
pub const AC_WCAP_TYPE_MASK: u32 = 0xf << 20;
pub const AC_WCAP_TYPE_SHIFT: u32 = 20;

// Amp payload fields.
pub const AC_AMP_GAIN: u32 = 0x7f;
pub const AC_AMP_MUTE: u32 = 1 << 7;
pub const AC_AMP_GET_LEFT: u32 = 1 << 13;
pub const AC_AMP_GET_OUTPUT: u32 = 1 << 15;
pub const AC_AMP_SET_INDEX_MASK: u32 = 0xf << 8;
pub const AC_AMP_SET_INDEX_SHIFT: u32 = 8;

/// Subsystem id reported by `GET_SUBSYSTEM_ID`.
pub const HDA_SUBSYSTEM_ID: u32 = 0x106b_3800;

bitflags! {
    /// Selector bits of a `SET_AMP_GAIN_MUTE` payload.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct AmpSetFlags: u32 {
        const MUTE = 1 << 7;
        const RIGHT = 1 << 12;
        const LEFT = 1 << 13;
        const INPUT = 1 << 14;
        const OUTPUT = 1 << 15;
    }
}

/// Raw command word split into verb id and payload.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CodecCommand {
    pub verb: u32,
    pub payload: u32,
}

impl CodecCommand {
    /// Split a command word.
    ///
    /// Words with any of bits 19:16, 11 or 8 set use the 4-bit verb / 16-bit payload layout;
    /// everything else uses the 12-bit verb / 8-bit payload layout.
    pub fn decode(data: u32) -> Self {
        if Self::is_wide(data) {
            Self {
                verb: (data >> 8) & 0xf00,
                payload: data & 0xffff,
            }
        } else {
            Self {
                verb: (data >> 8) & 0xfff,
                payload: data & 0xff,
            }
        }
    }

    /// True when the word used the 4-bit verb / 16-bit payload layout.
    pub fn is_wide(data: u32) -> bool {
        data & 0xf0900 != 0
    }
}

/// Logical verbs understood by the dispatcher.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Verb {
    GetParameter,
    GetSubsystemId,
    GetConnectList,
    GetConfigDefault,
    GetPinWidgetControl,
    SetChannelStreamId,
    GetConv,
    SetStreamFormat,
    GetStreamFormat,
    /// `GET_AMP_GAIN_MUTE`; the low 8 bits of the verb id are the amp index.
    GetAmpGainMute(u8),
    /// `SET_AMP_GAIN_MUTE`; the low 8 bits of the verb id are the amp index.
    SetAmpGainMute(u8),
    Unknown(u32),
}

impl Verb {
    pub fn from_id(verb: u32) -> Self {
        match verb {
            AC_VERB_PARAMETERS => Verb::GetParameter,
            AC_VERB_GET_SUBSYSTEM_ID => Verb::GetSubsystemId,
            AC_VERB_GET_CONNECT_LIST => Verb::GetConnectList,
            AC_VERB_GET_CONFIG_DEFAULT => Verb::GetConfigDefault,
            AC_VERB_GET_PIN_WIDGET_CONTROL => Verb::GetPinWidgetControl,
            AC_VERB_SET_CHANNEL_STREAMID => Verb::SetChannelStreamId,
            AC_VERB_GET_CONV => Verb::GetConv,
            AC_VERB_SET_STREAM_FORMAT => Verb::SetStreamFormat,
            AC_VERB_GET_STREAM_FORMAT => Verb::GetStreamFormat,
            v if v & 0xf00 == AC_VERB_GET_AMP_GAIN_MUTE => Verb::GetAmpGainMute((v & 0xff) as u8),
            v if v & 0xf00 == AC_VERB_SET_AMP_GAIN_MUTE => Verb::SetAmpGainMute((v & 0xff) as u8),
            v => Verb::Unknown(v),
        }
    }
}
