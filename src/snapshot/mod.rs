//! Provider snapshot: one immutable aggregate of the latest output of every
//! provider in the group.
//!
//! Each provider field is decoded independently from the raw output map. A
//! provider that has not reported yet, is disabled, or sent a payload that
//! does not decode is simply absent; it never poisons the other fields.

pub mod change;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::access::safe_number;

/// Raw provider-group output map as pushed by the host, keyed by provider name.
pub type ProviderOutputs = Map<String, Value>;

/// Decode `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a loosely typed number; anything that does not coerce is absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let n = safe_number(raw.as_ref(), f64::NAN);
    Ok(n.is_finite().then_some(n))
}

// -- Media --

/// One controllable playback stream exposed by the media provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaSession {
    #[serde(deserialize_with = "null_as_default")]
    pub session_id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_playing: bool,
    /// Playback position in seconds.
    #[serde(deserialize_with = "lenient_number")]
    pub position: Option<f64>,
    /// Track length in seconds.
    #[serde(deserialize_with = "lenient_number")]
    pub end_time: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaOutput {
    /// The host's own notion of the current session.
    pub current_session: Option<MediaSession>,
    #[serde(deserialize_with = "null_as_default")]
    pub all_sessions: Vec<MediaSession>,
}

// -- System stats --

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CpuOutput {
    #[serde(deserialize_with = "lenient_number")]
    pub usage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryOutput {
    #[serde(deserialize_with = "lenient_number")]
    pub usage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioDevice {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioOutput {
    pub default_playback_device: Option<AudioDevice>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateOutput {
    pub formatted: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherOutput {
    #[serde(deserialize_with = "lenient_number")]
    pub celsius_temp: Option<f64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystrayIcon {
    pub id: Option<String>,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystrayOutput {
    #[serde(deserialize_with = "null_as_default")]
    pub icons: Vec<SystrayIcon>,
}

// -- Tiling window manager --

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WmWindow {
    pub title: Option<String>,
    pub exe: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WmContainer {
    #[serde(deserialize_with = "null_as_default")]
    pub windows: Vec<WmWindow>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WmWorkspace {
    pub name: Option<String>,
    pub layout: Option<String>,
    pub layout_flip: Option<String>,
    pub maximized_window: Option<WmWindow>,
    pub monocle_container: Option<WmContainer>,
    #[serde(deserialize_with = "null_as_default")]
    pub tiling_containers: Vec<WmContainer>,
    #[serde(deserialize_with = "null_as_default")]
    pub floating_windows: Vec<WmWindow>,
    pub focused_container_index: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WmMonitor {
    #[serde(deserialize_with = "null_as_default")]
    pub workspaces: Vec<WmWorkspace>,
    pub focused_workspace_index: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KomorebiOutput {
    pub focused_workspace: Option<WmWorkspace>,
    pub current_monitor: Option<WmMonitor>,
}

// -- Snapshot --

/// Immutable aggregate of every provider's latest output.
///
/// Published behind an `Arc` and replaced wholesale on change; consumers
/// compare snapshots by pointer to skip work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderSnapshot {
    pub media: Option<MediaOutput>,
    pub komorebi: Option<KomorebiOutput>,
    pub cpu: Option<CpuOutput>,
    pub memory: Option<MemoryOutput>,
    pub audio: Option<AudioOutput>,
    pub date: Option<DateOutput>,
    pub weather: Option<WeatherOutput>,
    pub systray: Option<SystrayOutput>,
}

impl ProviderSnapshot {
    /// Build a snapshot from one provider-group push.
    pub fn from_outputs(outputs: &ProviderOutputs) -> Self {
        Self {
            media: decode_field(outputs, "media"),
            komorebi: decode_field(outputs, "komorebi"),
            cpu: decode_field(outputs, "cpu"),
            memory: decode_field(outputs, "memory"),
            audio: decode_field(outputs, "audio"),
            date: decode_field(outputs, "date"),
            weather: decode_field(outputs, "weather"),
            systray: decode_field(outputs, "systray"),
        }
    }

    pub fn current_session(&self) -> Option<&MediaSession> {
        self.media.as_ref()?.current_session.as_ref()
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.current_session().map(|s| s.session_id.as_str())
    }

    pub fn is_playing(&self) -> Option<bool> {
        self.current_session().map(|s| s.is_playing)
    }

    /// Every session known to the media provider, empty when absent.
    pub fn sessions(&self) -> &[MediaSession] {
        self.media
            .as_ref()
            .map(|m| m.all_sessions.as_slice())
            .unwrap_or_default()
    }

    pub fn cpu_usage(&self) -> Option<f64> {
        self.cpu.as_ref()?.usage
    }

    pub fn memory_usage(&self) -> Option<f64> {
        self.memory.as_ref()?.usage
    }

    pub fn volume(&self) -> Option<f64> {
        self.audio.as_ref()?.default_playback_device.as_ref()?.volume
    }

    pub fn formatted_date(&self) -> Option<&str> {
        self.date.as_ref()?.formatted.as_deref()
    }

    pub fn focused_workspace(&self) -> Option<&WmWorkspace> {
        self.komorebi.as_ref()?.focused_workspace.as_ref()
    }

    pub fn focused_workspace_name(&self) -> Option<&str> {
        self.focused_workspace()?.name.as_deref()
    }
}

/// Decode one provider's output. Absent, null, or undecodable → `None`.
fn decode_field<T>(outputs: &ProviderOutputs, key: &str) -> Option<T>
where
    T: for<'de> Deserialize<'de>,
{
    let raw = outputs.get(key).filter(|v| !v.is_null())?;
    match T::deserialize(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(provider = key, error = %e, "undecodable provider output dropped");
            None
        }
    }
}
