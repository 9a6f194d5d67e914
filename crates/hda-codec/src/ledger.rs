use crate::stream::Direction;

/// Stream tags per direction.
pub const HDA_STREAM_TAGS: usize = 16;

/// Which `(direction, stream tag)` pairs the controller currently has running.
///
/// Kept per device so a stream whose tag changes can pick up the running state of its new tag.
/// A tag-only legacy view is maintained alongside for older snapshot consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningLedger {
    compat: [bool; HDA_STREAM_TAGS],
    real: [bool; 2 * HDA_STREAM_TAGS],
}

impl Default for RunningLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Slot of `(direction, tag)` in the two-direction array, `None` for tags that do not fit in
/// four bits.
fn index(direction: Direction, tag: u8) -> Option<usize> {
    let tag = usize::from(tag);
    (tag < HDA_STREAM_TAGS).then(|| usize::from(direction.is_output()) * HDA_STREAM_TAGS + tag)
}

impl RunningLedger {
    pub fn new() -> Self {
        Self {
            compat: [false; HDA_STREAM_TAGS],
            real: [false; 2 * HDA_STREAM_TAGS],
        }
    }

    pub fn is_running(&self, direction: Direction, tag: u8) -> bool {
        index(direction, tag).map_or(false, |i| self.real[i])
    }

    /// Record a running change. Out-of-range tags are dropped.
    pub fn set(&mut self, direction: Direction, tag: u8, running: bool) {
        let Some(i) = index(direction, tag) else {
            return;
        };
        self.compat[usize::from(tag)] = running;
        self.real[i] = running;
    }

    pub fn compat(&self) -> &[bool; HDA_STREAM_TAGS] {
        &self.compat
    }

    pub fn real(&self) -> &[bool; 2 * HDA_STREAM_TAGS] {
        &self.real
    }

    /// Reinstall saved arrays. Without a two-direction array the legacy one is taken as the
    /// output half and the input half is cleared.
    pub fn restore(
        &mut self,
        compat: [bool; HDA_STREAM_TAGS],
        real: Option<[bool; 2 * HDA_STREAM_TAGS]>,
    ) {
        self.compat = compat;
        self.real = match real {
            Some(real) => real,
            None => {
                let mut real = [false; 2 * HDA_STREAM_TAGS];
                real[HDA_STREAM_TAGS..].copy_from_slice(&compat);
                real
            }
        };
    }
}
