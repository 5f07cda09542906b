//! Bridge wire types.
//!
//! Every frame is one JSON object tagged by its `kind` field. Outbound
//! frames carry the subscription and control requests to the host;
//! inbound frames carry provider pushes and user input forwarded by the
//! host surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::snapshot::ProviderOutputs;

/// Maximum frame size in either direction (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Per-provider subscription options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Media,
    Komorebi {
        #[serde(rename = "refreshInterval")]
        refresh_interval_ms: u64,
    },
    Cpu,
    Date {
        formatting: String,
        locale: String,
    },
    Memory,
    Weather {
        latitude: f64,
        longitude: f64,
    },
    Audio,
    Systray,
}

/// Provider group configuration: provider name → options.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProviderGroupConfig(pub BTreeMap<String, ProviderConfig>);

impl ProviderGroupConfig {
    pub fn with(mut self, name: &str, config: ProviderConfig) -> Self {
        self.0.insert(name.to_string(), config);
        self
    }
}

/// Playback control actions understood by the media provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaAction {
    TogglePlayPause,
    Next,
    Previous,
}

/// Frames sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outbound {
    Subscribe {
        config: ProviderGroupConfig,
    },
    Media {
        action: MediaAction,
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    SetVolume {
        volume: u32,
    },
    Render {
        line: String,
    },
}

/// Widget section a user input targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Media,
    Volume,
    Workspace,
    Layout,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputAction {
    #[default]
    Click,
    Wheel,
    Slide,
    Flip,
    Close,
    Maximize,
    Minimize,
}

/// Modifier keys held at the moment of activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// A user activation forwarded by the host surface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputEvent {
    pub section: Section,
    #[serde(default)]
    pub action: InputAction,
    #[serde(flatten)]
    pub modifiers: Modifiers,
    /// Wheel delta; positive scrolls down.
    #[serde(default)]
    pub delta: Option<f64>,
    /// Slider value.
    #[serde(default)]
    pub value: Option<f64>,
    /// Workspace name or layout key.
    #[serde(default)]
    pub target: Option<String>,
}

/// Frames received from the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inbound {
    Output { outputs: ProviderOutputs },
    Input(InputEvent),
}

/// Minimal envelope for reporting frames with an unknown `kind`.
#[derive(Debug, Deserialize)]
pub struct RawEnvelope {
    pub kind: String,
}
