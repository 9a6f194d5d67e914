//! The codec device: command dispatch, stream notices, pacing entry points and lifecycle.

use std::collections::BTreeSet;

use hda_time::TimerQueue;
use tracing::{debug, trace};

use crate::alc885;
use crate::backend::AudioBackend;
use crate::bus::{HdaCodecBus, HdaResponse};
use crate::config::HdaAudioConfig;
use crate::desc::{CodecDesc, Node, WidgetType};
use crate::error::{HdaError, Result};
use crate::ledger::{RunningLedger, HDA_STREAM_TAGS};
use crate::stream::{Direction, HdaAudioStream};
use crate::verb::{CodecCommand, Verb, AC_PAR_CONNLIST_LEN, HDA_SUBSYSTEM_ID};

/// Stream slots per device.
pub const HDA_MAX_STREAMS: usize = 4;

/// An emulated HDA codec attached to one host audio backend.
#[derive(Debug)]
pub struct HdaAudio<B: AudioBackend> {
    pub(crate) desc: &'static CodecDesc,
    pub(crate) config: HdaAudioConfig,
    pub(crate) backend: B,
    pub(crate) streams: [Option<HdaAudioStream>; HDA_MAX_STREAMS],
    pub(crate) ledger: RunningLedger,
    pub(crate) timers: TimerQueue<usize>,
}

impl<B: AudioBackend> HdaAudio<B> {
    /// Build the device for the configured personality.
    pub fn new(config: HdaAudioConfig, backend: B) -> Result<Self> {
        Self::with_desc(alc885::codec_desc(config.personality), config, backend)
    }

    /// Build the device over an arbitrary node table.
    ///
    /// Every audio converter binds the stream slot it declares; when several converters declare
    /// the same slot the last one in table order owns it.
    pub fn with_desc(
        desc: &'static CodecDesc,
        config: HdaAudioConfig,
        mut backend: B,
    ) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for node in desc.nodes {
            if !seen.insert(node.nid) {
                return Err(HdaError::DuplicateNode { nid: node.nid });
            }
        }

        let mut bindings: [Option<(&Node, Direction)>; HDA_MAX_STREAMS] = [None; HDA_MAX_STREAMS];
        for node in desc.nodes {
            let direction = match node.widget_type() {
                Some(WidgetType::AudioOutput) => Direction::Output,
                Some(WidgetType::AudioInput) => Direction::Input,
                _ => continue,
            };
            let slot = node
                .stream_slot
                .ok_or(HdaError::MissingStreamSlot { nid: node.nid })?;
            let entry = bindings
                .get_mut(usize::from(slot))
                .ok_or(HdaError::StreamSlotOutOfRange {
                    nid: node.nid,
                    slot,
                })?;
            *entry = Some((node, direction));
        }

        let streams = std::array::from_fn(|slot| {
            bindings[slot].map(|(node, direction)| {
                let mut st = HdaAudioStream::new(slot, node.nid, node.name, direction);
                st.setup(&mut backend);
                st
            })
        });

        debug!(codec = desc.name, "hda codec initialized");
        Ok(Self {
            desc,
            config,
            backend,
            streams,
            ledger: RunningLedger::new(),
            timers: TimerQueue::new(),
        })
    }

    pub fn desc(&self) -> &'static CodecDesc {
        self.desc
    }

    pub fn config(&self) -> &HdaAudioConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn stream(&self, slot: usize) -> Option<&HdaAudioStream> {
        self.streams.get(slot)?.as_ref()
    }

    pub fn ledger(&self) -> &RunningLedger {
        &self.ledger
    }

    /// Stream owned by the node's slot, if the node has one and it is bound.
    fn node_stream(&self, node: &Node) -> Option<&HdaAudioStream> {
        self.streams.get(usize::from(node.stream_slot?))?.as_ref()
    }

    /// Decode and execute one command word.
    pub fn command(&mut self, nid: u32, data: u32, now_ns: u64) -> HdaResponse {
        let cmd = CodecCommand::decode(data);
        trace!(nid, data, verb = cmd.verb, payload = cmd.payload, "hda command");
        HdaResponse::solicited(self.execute(nid, cmd.verb, cmd.payload, now_ns))
    }

    /// Execute a command and hand the response to the bus.
    pub fn process_command(&mut self, nid: u32, data: u32, now_ns: u64, bus: &mut dyn HdaCodecBus) {
        let resp = self.command(nid, data, now_ns);
        bus.response(resp.solicited, resp.data);
    }

    /// Execute an already-split verb. Anything that cannot be handled answers 0.
    pub fn execute(&mut self, nid: u32, verb: u32, payload: u32, now_ns: u64) -> u32 {
        let desc = self.desc;
        let Some(node) = desc.find_node(nid) else {
            debug!(nid, verb, payload, "hda command for unknown node");
            return 0;
        };

        match Verb::from_id(verb) {
            Verb::GetParameter => node.find_param(payload).unwrap_or(0),
            Verb::GetSubsystemId => HDA_SUBSYSTEM_ID,
            Verb::GetConnectList => connect_list_response(node, payload),
            Verb::GetConfigDefault => node.config,
            Verb::GetPinWidgetControl => node.pinctl,
            Verb::SetChannelStreamId => {
                if let Some(slot) = node.stream_slot {
                    self.set_channel_stream_id(usize::from(slot), payload, now_ns);
                }
                0
            }
            Verb::GetConv => self
                .node_stream(node)
                .map_or(0, |st| (u32::from(st.tag) << 4) | u32::from(st.channel)),
            Verb::SetStreamFormat => {
                if let Some(st) = bound_stream_mut(&mut self.streams, node) {
                    st.set_format(payload);
                    st.setup(&mut self.backend);
                }
                0
            }
            Verb::GetStreamFormat => self.node_stream(node).map_or(0, |st| st.format),
            Verb::GetAmpGainMute(_) => self.node_stream(node).map_or(0, |st| st.amp.get(payload)),
            Verb::SetAmpGainMute(_) => {
                let mixer = self.config.mixer;
                if let Some(st) = bound_stream_mut(&mut self.streams, node) {
                    st.amp.set(payload);
                    st.apply_amp(&mut self.backend, mixer);
                }
                0
            }
            Verb::Unknown(verb) => {
                debug!(nid, verb, payload, "hda unhandled verb");
                0
            }
        }
    }

    fn set_channel_stream_id(&mut self, slot: usize, payload: u32, now_ns: u64) {
        let use_timer = self.config.use_timer;
        let Some(st) = self.streams.get_mut(slot).and_then(Option::as_mut) else {
            return;
        };
        st.set_running(false, now_ns, use_timer, &mut self.timers, &mut self.backend);
        st.tag = ((payload >> 4) & 0xf) as u8;
        st.channel = (payload & 0xf) as u8;
        trace!(node = st.name, stream = st.tag, channel = st.channel, "hda stream id");
        let running = self.ledger.is_running(st.direction, st.tag);
        st.set_running(running, now_ns, use_timer, &mut self.timers, &mut self.backend);
    }

    /// Controller notice that stream `tag` in `direction` started or stopped.
    pub fn stream_notice(&mut self, tag: u8, running: bool, output: bool, now_ns: u64) {
        let direction = if output {
            Direction::Output
        } else {
            Direction::Input
        };
        if usize::from(tag) >= HDA_STREAM_TAGS {
            debug!(tag, "hda stream notice for out-of-range tag ignored");
            return;
        }
        self.ledger.set(direction, tag, running);
        let use_timer = self.config.use_timer;
        for st in self.streams.iter_mut().flatten() {
            if st.direction == direction && st.tag == tag {
                st.set_running(running, now_ns, use_timer, &mut self.timers, &mut self.backend);
            }
        }
    }

    /// Guest time of the earliest armed pacing tick.
    pub fn next_deadline_ns(&self) -> Option<u64> {
        self.timers.next_deadline_ns()
    }

    /// Fire every pacing tick due at `now_ns`.
    pub fn run_timers(&mut self, now_ns: u64, bus: &mut dyn HdaCodecBus) {
        while let Some(ev) = self.timers.pop_due(now_ns) {
            let Some(st) = self.streams.get_mut(ev.payload).and_then(Option::as_mut) else {
                continue;
            };
            if st.timer != Some(ev.id) {
                continue;
            }
            st.timer = None;
            st.on_timer(now_ns, bus, &mut self.timers);
        }
    }

    /// Host backend readiness for the voice of `slot`: `avail` bytes can be written (playback) or
    /// read (capture).
    pub fn backend_callback(
        &mut self,
        slot: usize,
        avail: usize,
        now_ns: u64,
        bus: &mut dyn HdaCodecBus,
    ) {
        let use_timer = self.config.use_timer;
        let Some(st) = self.streams.get_mut(slot).and_then(Option::as_mut) else {
            return;
        };
        match (st.direction, use_timer) {
            (Direction::Output, true) => st.output_callback(avail, now_ns, &mut self.backend),
            (Direction::Input, true) => st.input_callback(avail, &mut self.backend),
            (Direction::Output, false) => st.compat_output_callback(avail, bus, &mut self.backend),
            (Direction::Input, false) => st.compat_input_callback(avail, bus, &mut self.backend),
        }
    }

    /// Stop every bound stream.
    pub fn reset(&mut self, now_ns: u64) {
        debug!(codec = self.desc.name, "hda codec reset");
        let use_timer = self.config.use_timer;
        for st in self.streams.iter_mut().flatten() {
            st.set_running(false, now_ns, use_timer, &mut self.timers, &mut self.backend);
        }
    }

    /// Disarm pacing and close every host voice.
    pub fn shutdown(&mut self) {
        debug!(codec = self.desc.name, "hda codec shutdown");
        for st in self.streams.iter_mut().flatten() {
            st.timer = None;
            st.running = false;
            if let Some(voice) = st.voice.take() {
                self.backend.close(voice);
            }
        }
        self.timers.clear();
    }
}

fn bound_stream_mut<'a>(
    streams: &'a mut [Option<HdaAudioStream>; HDA_MAX_STREAMS],
    node: &Node,
) -> Option<&'a mut HdaAudioStream> {
    streams.get_mut(usize::from(node.stream_slot?))?.as_mut()
}

/// Pack up to four connection-list entries starting at `offset`, first entry in the low byte.
///
/// The length comes from the node's declared parameter; entries past the stored list read as 0.
fn connect_list_response(node: &Node, offset: u32) -> u32 {
    let count = node.find_param(AC_PAR_CONNLIST_LEN).unwrap_or(0);
    let mut index = offset;
    let mut shift = 0;
    let mut resp = 0u32;
    while index < count && shift < 32 {
        let entry = node.conn.get(index as usize).unwrap_or(0);
        resp |= u32::from(entry) << shift;
        index += 1;
        shift += 8;
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::desc::{ConnectionList, Param};
    use crate::verb::*;

    static THREE_CONN: [Param; 2] = [Param::new(0x09, 0x0020_0000), Param::new(0x0e, 3)];
    static NODE: Node =
        Node::new(0x0b, "mix", &THREE_CONN).with_conn(ConnectionList::list(&[0x18, 0x19, 0x1a]));

    #[test]
    fn connect_list_packs_from_offset() {
        assert_eq!(connect_list_response(&NODE, 0), 0x001a_1918);
        assert_eq!(connect_list_response(&NODE, 1), 0x0000_1a19);
        assert_eq!(connect_list_response(&NODE, 3), 0);
    }

    #[test]
    fn connect_list_shortfall_reads_zero() {
        let dev = HdaAudio::new(HdaAudioConfig::default(), MemoryBackend::new()).unwrap();
        let speaker = dev.desc().find_node(0x14).unwrap();
        // Five declared, four stored.
        assert_eq!(connect_list_response(speaker, 0), 0x0f0e_0d0c);
        assert_eq!(connect_list_response(speaker, 2), 0x0000_0f0e);
        assert_eq!(connect_list_response(speaker, 4), 0);
    }

    #[test]
    fn init_binds_last_converter_per_slot() {
        let dev = HdaAudio::new(HdaAudioConfig::default(), MemoryBackend::new()).unwrap();
        let out = dev.stream(0).unwrap();
        assert_eq!((out.nid(), out.direction()), (0x25, Direction::Output));
        let inp = dev.stream(1).unwrap();
        assert_eq!((inp.nid(), inp.direction()), (0x0a, Direction::Input));
        assert!(dev.stream(2).is_none());
        assert!(dev.stream(3).is_none());
        assert_eq!(dev.backend().voices().len(), 2);
    }

    #[test]
    fn fixed_responses() {
        let mut dev = HdaAudio::new(HdaAudioConfig::default(), MemoryBackend::new()).unwrap();
        assert_eq!(dev.execute(0x00, AC_VERB_PARAMETERS, AC_PAR_VENDOR_ID, 0), 0x10ec_0885);
        assert_eq!(dev.execute(0x01, AC_VERB_GET_SUBSYSTEM_ID, 0, 0), HDA_SUBSYSTEM_ID);
        assert_eq!(dev.execute(0x14, AC_VERB_GET_CONFIG_DEFAULT, 0, 0), 0x9010_0140);
        assert_eq!(dev.execute(0x15, AC_VERB_GET_PIN_WIDGET_CONTROL, 0, 0), 0xc4);
        assert_eq!(dev.execute(0x02, AC_VERB_GET_CONFIG_DEFAULT, 0, 0), 0);
    }

    #[test]
    fn unknown_node_and_verb_answer_zero() {
        let mut dev = HdaAudio::new(HdaAudioConfig::default(), MemoryBackend::new()).unwrap();
        assert_eq!(dev.execute(0x7f, AC_VERB_GET_SUBSYSTEM_ID, 0, 0), 0);
        assert_eq!(dev.execute(0x02, 0x7ff, 0x12, 0), 0);
        let resp = dev.command(0x7f, 0x000f_0000, 0);
        assert_eq!(resp, HdaResponse { solicited: true, data: 0 });
    }

    #[test]
    fn stream_verbs_need_a_bound_slot() {
        let mut dev = HdaAudio::new(HdaAudioConfig::default(), MemoryBackend::new()).unwrap();
        // Pin: no slot.
        assert_eq!(dev.execute(0x14, AC_VERB_GET_STREAM_FORMAT, 0, 0), 0);
        assert_eq!(dev.execute(0x14, AC_VERB_SET_AMP_GAIN_MUTE, 0xb000, 0), 0);
        assert_eq!(dev.execute(0x14, AC_VERB_GET_AMP_GAIN_MUTE, 0x2000, 0), 0);
        // Converter.
        assert_eq!(dev.execute(0x02, AC_VERB_GET_STREAM_FORMAT, 0, 0), 0xe0560);
        assert_eq!(dev.execute(0x02, AC_VERB_GET_AMP_GAIN_MUTE, 0x2000, 0), 0x4a);
    }
}
