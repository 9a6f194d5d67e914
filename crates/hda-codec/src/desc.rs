//! Static codec descriptors: the node graph a guest driver enumerates.
//!
//! Descriptors are plain `'static` data shared by every device instance. Nothing here is ever
//! mutated after construction.

use crate::verb::{AC_PAR_AUDIO_WIDGET_CAP, AC_WCAP_TYPE_MASK, AC_WCAP_TYPE_SHIFT};

/// Maximum number of entries a normalized connection list can hold.
pub const MAX_CONNECTIONS: usize = 16;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Param {
    pub id: u32,
    pub val: u32,
}

impl Param {
    pub const fn new(id: u32, val: u32) -> Self {
        Self { id, val }
    }
}

/// Ordered list of node ids a widget can take input from.
///
/// Tables may describe a list either explicitly or as the packed 8-bits-per-entry word used by
/// real codec datasheets; both are normalized here when the table is built.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ConnectionList {
    entries: [u8; MAX_CONNECTIONS],
    len: u8,
}

impl ConnectionList {
    pub const EMPTY: Self = Self {
        entries: [0; MAX_CONNECTIONS],
        len: 0,
    };

    /// Unpack up to four node ids stored low byte first. A zero byte terminates the list.
    pub const fn packed(word: u32) -> Self {
        let mut entries = [0u8; MAX_CONNECTIONS];
        let mut len = 0usize;
        while len < 4 {
            let nid = ((word >> (len * 8)) & 0xff) as u8;
            if nid == 0 {
                break;
            }
            entries[len] = nid;
            len += 1;
        }
        Self {
            entries,
            len: len as u8,
        }
    }

    /// Build from an explicit list. Panics (at compile time for `const` tables) if the list is
    /// longer than [`MAX_CONNECTIONS`].
    pub const fn list(nids: &[u8]) -> Self {
        assert!(nids.len() <= MAX_CONNECTIONS, "connection list too long");
        let mut entries = [0u8; MAX_CONNECTIONS];
        let mut i = 0;
        while i < nids.len() {
            entries[i] = nids[i];
            i += 1;
        }
        Self {
            entries,
            len: nids.len() as u8,
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.as_slice().get(index).copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.entries[..self.len as usize]
    }
}

impl Default for ConnectionList {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WidgetType {
    AudioOutput,
    AudioInput,
    Other(u8),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub nid: u32,
    pub name: &'static str,
    pub params: &'static [Param],
    pub conn: ConnectionList,
    pub config: u32,
    pub pinctl: u32,
    /// Stream slot owned by this node; only audio converters carry one.
    pub stream_slot: Option<u8>,
}

impl Node {
    /// A node with no connections, pin configuration or stream slot.
    pub const fn new(nid: u32, name: &'static str, params: &'static [Param]) -> Self {
        Self {
            nid,
            name,
            params,
            conn: ConnectionList::EMPTY,
            config: 0,
            pinctl: 0,
            stream_slot: None,
        }
    }

    pub const fn with_conn(mut self, conn: ConnectionList) -> Self {
        self.conn = conn;
        self
    }

    pub const fn with_pin(mut self, config: u32, pinctl: u32) -> Self {
        self.config = config;
        self.pinctl = pinctl;
        self
    }

    pub const fn with_stream_slot(mut self, slot: u8) -> Self {
        self.stream_slot = Some(slot);
        self
    }

    /// First parameter with a matching id.
    pub fn find_param(&self, id: u32) -> Option<u32> {
        self.params.iter().find(|p| p.id == id).map(|p| p.val)
    }

    /// Widget type from the audio widget capabilities parameter, if the node declares one.
    pub fn widget_type(&self) -> Option<WidgetType> {
        let caps = self.find_param(AC_PAR_AUDIO_WIDGET_CAP)?;
        Some(match (caps & AC_WCAP_TYPE_MASK) >> AC_WCAP_TYPE_SHIFT {
            0 => WidgetType::AudioOutput,
            1 => WidgetType::AudioInput,
            other => WidgetType::Other(other as u8),
        })
    }
}

#[derive(Debug)]
pub struct CodecDesc {
    pub name: &'static str,
    pub nodes: &'static [Node],
}

impl CodecDesc {
    /// First node with a matching id.
    pub fn find_node(&self, nid: u32) -> Option<&Node> {
        self.nodes.iter().find(|n| n.nid == nid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static PARAMS: [Param; 3] = [
        Param::new(0x09, 0x0010_0011),
        Param::new(0x0e, 2),
        Param::new(0x09, 0xdead),
    ];
    static NODES: [Node; 2] = [
        Node::new(0x01, "afg", &[]),
        Node::new(0x07, "adc", &PARAMS).with_conn(ConnectionList::packed(0x0b02)),
    ];
    static DESC: CodecDesc = CodecDesc {
        name: "test",
        nodes: &NODES,
    };

    #[test]
    fn lookups_return_first_match_or_none() {
        let node = DESC.find_node(0x07).unwrap();
        assert_eq!(node.name, "adc");
        assert_eq!(node.find_param(0x09), Some(0x0010_0011));
        assert_eq!(node.find_param(0x0c), None);
        assert!(DESC.find_node(0x42).is_none());
        assert_eq!(DESC.find_node(0x01).unwrap().find_param(0x00), None);
    }

    #[test]
    fn widget_type_comes_from_caps_bits_23_20() {
        assert_eq!(
            DESC.find_node(0x07).unwrap().widget_type(),
            Some(WidgetType::AudioInput)
        );
        assert_eq!(DESC.find_node(0x01).unwrap().widget_type(), None);
    }

    #[test]
    fn packed_lists_stop_at_zero_byte() {
        assert_eq!(ConnectionList::packed(0x1b1a_1918).as_slice(), &[0x18, 0x19, 0x1a, 0x1b]);
        assert_eq!(ConnectionList::packed(0x0b02).as_slice(), &[0x02, 0x0b]);
        assert_eq!(ConnectionList::packed(0x24).as_slice(), &[0x24]);
        assert!(ConnectionList::packed(0).is_empty());
        assert_eq!(ConnectionList::list(&[5, 6, 7]).get(2), Some(7));
        assert_eq!(ConnectionList::list(&[5, 6, 7]).get(3), None);
    }
}
