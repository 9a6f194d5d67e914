use thiserror::Error;

pub type Result<T> = std::result::Result<T, HdaError>;

/// Failures raised while building a device. Command handling itself never fails.
#[derive(Debug, Error)]
pub enum HdaError {
    #[error("node {nid:#x} declares stream slot {slot}, device has 4")]
    StreamSlotOutOfRange { nid: u32, slot: u8 },

    #[error("converter node {nid:#x} declares no stream slot")]
    MissingStreamSlot { nid: u32 },

    #[error("node id {nid:#x} appears more than once")]
    DuplicateNode { nid: u32 },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
