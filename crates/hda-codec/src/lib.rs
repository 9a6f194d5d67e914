//! Emulated HD Audio codec (Realtek ALC885/ALC889A class).
//!
//! [`HdaAudio`] answers the verb/response protocol for a fixed node graph and turns guest DMA
//! transfers into host audio with guest-time pacing. The controller side is reached through
//! [`HdaCodecBus`] and the host side through [`AudioBackend`]. Guest time is passed explicitly
//! to every entry point as nanoseconds.

pub mod alc885;
pub mod amp;
pub mod backend;
pub mod bus;
pub mod codec;
pub mod config;
pub mod desc;
pub mod error;
pub mod ledger;
pub mod ring;
#[cfg(feature = "io-snapshot")]
pub mod snapshot;
pub mod stream;
pub mod verb;

pub use amp::{AmpState, HDA_AMP_STEPS};
pub use backend::{AudioBackend, MemoryBackend, MemoryVoice, VoiceId, VoiceVolume};
pub use bus::{HdaCodecBus, HdaResponse};
pub use codec::{HdaAudio, HDA_MAX_STREAMS};
pub use config::{HdaAudioConfig, Personality};
pub use desc::{CodecDesc, ConnectionList, Node, Param, WidgetType};
pub use error::{HdaError, Result};
pub use ledger::RunningLedger;
pub use ring::RingBuffer;
pub use stream::{
    Direction, HdaAudioStream, SampleFormat, StreamFormat, HDA_COMPAT_BUF_SIZE, HDA_DEFAULT_FORMAT,
    HDA_TIMER_TICK_NS,
};
pub use verb::CodecCommand;
