//! Realtek ALC885/ALC889A-class node graph.
//!
//! One table is shared by every personality; personalities differ only in the name the guest and
//! host see. Converters bind to stream slot 0 (playback) or 1 (capture).

use crate::config::Personality;
use crate::desc::{CodecDesc, ConnectionList, Node, Param};

/// Slot shared by all playback converters.
pub const OUTPUT_SLOT: u8 = 0;
/// Slot shared by all capture converters.
pub const INPUT_SLOT: u8 = 1;

const fn p(id: u32, val: u32) -> Param {
    Param::new(id, val)
}

static ROOT: [Param; 4] = [
    p(0x00, 0x10ec_0885),
    p(0x01, 0x106b_3800),
    p(0x02, 0x0010_0103),
    p(0x04, 0x0001_0001),
];

static AFG: [Param; 4] = [
    p(0x05, 0x1),
    p(0x04, 0x0002_0025),
    p(0x0f, 0xf),
    p(0x01, 0x106b_3800),
];

static DAC: [Param; 4] = [p(0x05, 0), p(0x09, 0x11), p(0x0b, 0x1), p(0x0a, 0x0002_0040)];

static DAC_DIGITAL: [Param; 4] = [p(0x05, 0), p(0x09, 0x211), p(0x0b, 0x1), p(0x0a, 0x0002_0040)];

static ADC: [Param; 6] = [
    p(0x05, 0),
    p(0x09, 0x0010_011b),
    p(0x0e, 0x1),
    p(0x0d, 0x8003_2e10),
    p(0x0b, 0x1),
    p(0x0a, 0x0002_0040),
];

static ADC_DIGITAL: [Param; 5] = [
    p(0x05, 0),
    p(0x09, 0x0010_0391),
    p(0x0e, 0x1),
    p(0x0b, 0x1),
    p(0x0a, 0x0002_0040),
];

// Duplicate 0x05 entries are part of the datasheet dump; lookups take the first.
static INPUT_MIXER: [Param; 6] = [
    p(0x05, 0),
    p(0x09, 0x0020_010b),
    p(0x0e, 0xa),
    p(0x0d, 0x8005_1f17),
    p(0x05, 0),
    p(0x05, 0),
];

static OUTPUT_MIXER_AMP: [Param; 5] = [
    p(0x05, 0),
    p(0x09, 0x0020_010f),
    p(0x0e, 0x2),
    p(0x12, 0x0003_4040),
    p(0x0d, 0x8000_0000),
];

static OUTPUT_MIXER: [Param; 3] = [p(0x05, 0), p(0x09, 0x0020_010f), p(0x0e, 0x2)];

static VENDOR: [Param; 2] = [p(0x05, 0), p(0x09, 0x00f0_0000)];

static PIN_OUT: [Param; 5] = [
    p(0x05, 0),
    p(0x09, 0x0040_018f),
    p(0x0c, 0x373c),
    p(0x0e, 0x5),
    p(0x12, 0x8000_0000),
];

static PIN_IN: [Param; 5] = [
    p(0x05, 0),
    p(0x09, 0x0040_018f),
    p(0x0c, 0x373c),
    p(0x0d, 0x0027_0300),
    p(0x0e, 0x5),
];

static PIN_JACK: [Param; 2] = [p(0x05, 0), p(0x0c, 0x3c)];

static PIN_JACK_VREF: [Param; 2] = [p(0x05, 0), p(0x0c, 0x373c)];

static PIN_CD: [Param; 3] = [p(0x05, 0), p(0x09, 0x0040_0001), p(0x0c, 0x20)];

static PIN_BEEP: [Param; 3] = [p(0x05, 0), p(0x09, 0x0040_0000), p(0x0c, 0x20)];

static PIN_SPDIF_OUT: [Param; 4] = [
    p(0x05, 0),
    p(0x09, 0x0040_0300),
    p(0x0c, 0x10),
    p(0x0e, 0x1),
];

static PIN_SPDIF_IN: [Param; 3] = [p(0x05, 0), p(0x09, 0x0040_0200), p(0x0c, 0x20)];

static COEF: [Param; 2] = [p(0x05, 0), p(0x09, 0x00f0_0040)];

static VOLUME_KNOB: [Param; 2] = [p(0x05, 0), p(0x09, 0x0060_0080)];

static ADC_MUX: [Param; 4] = [
    p(0x05, 0),
    p(0x09, 0x0020_010b),
    p(0x0e, 0xb),
    p(0x0d, 0x8000_0000),
];

const PIN_UNUSED: u32 = 0x4000_00f0;
const MIXER_INPUTS: ConnectionList = ConnectionList::packed(0x1b1a_1918);
const PIN_SOURCES: ConnectionList = ConnectionList::packed(0x0f0e_0d0c);

static NODES: [Node; 39] = [
    Node::new(0x00, "root", &ROOT),
    Node::new(0x01, "afg", &AFG),
    Node::new(0x02, "dac-front", &DAC).with_stream_slot(OUTPUT_SLOT),
    Node::new(0x03, "dac-surround", &DAC).with_stream_slot(OUTPUT_SLOT),
    Node::new(0x04, "dac-clfe", &DAC).with_stream_slot(OUTPUT_SLOT),
    Node::new(0x05, "dac-side", &DAC).with_stream_slot(OUTPUT_SLOT),
    Node::new(0x06, "dac-spdif", &DAC_DIGITAL).with_stream_slot(OUTPUT_SLOT),
    Node::new(0x07, "adc-0", &ADC)
        .with_stream_slot(INPUT_SLOT)
        .with_conn(ConnectionList::packed(0x24)),
    Node::new(0x08, "adc-1", &ADC)
        .with_stream_slot(INPUT_SLOT)
        .with_conn(ConnectionList::packed(0x23)),
    Node::new(0x09, "adc-2", &ADC)
        .with_stream_slot(INPUT_SLOT)
        .with_conn(ConnectionList::packed(0x22)),
    Node::new(0x0a, "adc-spdif", &ADC_DIGITAL)
        .with_stream_slot(INPUT_SLOT)
        .with_conn(ConnectionList::packed(0x1f)),
    Node::new(0x0b, "input-mixer", &INPUT_MIXER).with_conn(MIXER_INPUTS),
    Node::new(0x0c, "mix-front", &OUTPUT_MIXER_AMP).with_conn(ConnectionList::packed(0x0b02)),
    Node::new(0x0d, "mix-surround", &OUTPUT_MIXER_AMP).with_conn(ConnectionList::packed(0x0b03)),
    Node::new(0x0e, "mix-clfe", &OUTPUT_MIXER).with_conn(ConnectionList::packed(0x0b04)),
    Node::new(0x0f, "mix-side", &OUTPUT_MIXER).with_conn(ConnectionList::packed(0x0b05)),
    Node::new(0x10, "vendor-10", &VENDOR),
    Node::new(0x11, "vendor-11", &VENDOR),
    Node::new(0x12, "vendor-12", &VENDOR),
    Node::new(0x13, "vendor-13", &VENDOR),
    Node::new(0x14, "speaker", &PIN_OUT)
        .with_conn(PIN_SOURCES)
        .with_pin(0x9010_0140, 0x40),
    Node::new(0x15, "headphone", &PIN_OUT)
        .with_conn(PIN_SOURCES)
        .with_pin(0x012b_4050, 0xc4),
    Node::new(0x16, "pin-16", &PIN_JACK).with_pin(PIN_UNUSED, 0x20),
    Node::new(0x17, "pin-17", &PIN_JACK).with_pin(PIN_UNUSED, 0x20),
    Node::new(0x18, "mic", &PIN_IN)
        .with_conn(PIN_SOURCES)
        .with_pin(0x90a0_0110, 0x24),
    Node::new(0x19, "pin-19", &PIN_JACK_VREF).with_pin(PIN_UNUSED, 0x24),
    Node::new(0x1a, "line-in", &PIN_IN)
        .with_conn(PIN_SOURCES)
        .with_pin(0x018b_3020, 0x20),
    Node::new(0x1b, "pin-1b", &PIN_JACK_VREF).with_pin(PIN_UNUSED, 0x20),
    Node::new(0x1c, "cd-in", &PIN_CD).with_pin(PIN_UNUSED, 0x20),
    Node::new(0x1d, "beep", &PIN_BEEP).with_pin(PIN_UNUSED, 0x20),
    Node::new(0x1e, "spdif-out", &PIN_SPDIF_OUT)
        .with_conn(ConnectionList::packed(0x06))
        .with_pin(0x014b_e060, 0x40),
    Node::new(0x1f, "spdif-in", &PIN_SPDIF_IN).with_pin(0x01cb_e030, 0x20),
    Node::new(0x20, "coef", &COEF),
    Node::new(0x21, "volume-knob", &VOLUME_KNOB),
    Node::new(0x22, "adc-mux-2", &ADC_MUX).with_conn(MIXER_INPUTS),
    Node::new(0x23, "adc-mux-1", &ADC_MUX).with_conn(MIXER_INPUTS),
    Node::new(0x24, "adc-mux-0", &ADC_MUX).with_conn(MIXER_INPUTS),
    Node::new(0x25, "dac-aux", &DAC).with_stream_slot(OUTPUT_SLOT),
    Node::new(0x26, "mix-aux", &OUTPUT_MIXER).with_conn(ConnectionList::packed(0x0b25)),
];

pub static OUTPUT: CodecDesc = CodecDesc {
    name: "output",
    nodes: &NODES,
};

pub static DUPLEX: CodecDesc = CodecDesc {
    name: "duplex",
    nodes: &NODES,
};

pub static MICRO: CodecDesc = CodecDesc {
    name: "micro",
    nodes: &NODES,
};

/// Descriptor for a personality.
pub fn codec_desc(personality: Personality) -> &'static CodecDesc {
    match personality {
        Personality::Output => &OUTPUT,
        Personality::Duplex => &DUPLEX,
        Personality::Micro => &MICRO,
    }
}
