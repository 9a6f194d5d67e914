use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Codec variant exposed to the guest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Personality {
    /// Line-out only.
    Output,
    /// Line-out plus line-in.
    #[default]
    Duplex,
    /// Speaker plus microphone.
    Micro,
}

/// Device-level options, fixed for the lifetime of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HdaAudioConfig {
    pub personality: Personality,
    /// Forward amp changes to the host backend.
    pub mixer: bool,
    /// Pace transfers with a guest-time tick instead of backend callbacks.
    pub use_timer: bool,
}

impl Default for HdaAudioConfig {
    fn default() -> Self {
        Self {
            personality: Personality::default(),
            mixer: true,
            use_timer: true,
        }
    }
}

impl HdaAudioConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
