//! Media session selection.
//!
//! The media provider exposes one authoritative "current" session, but the
//! widget lets the user browse and control any concurrently open session
//! without moving the host's focus. [`MediaSessionSelector`] owns that
//! locally diverging choice.
//!
//! Re-derivation rule on every new session list: if the selected session's
//! id is still present, the index follows it (reorders are transparent);
//! otherwise the selection resets to the upstream current session, or 0.

pub mod progress;

use crate::host::protocol::{MediaAction, Modifiers};
use crate::snapshot::{MediaSession, ProviderSnapshot};

/// A playback request for the host, addressed to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCommand {
    pub action: MediaAction,
    pub session_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct MediaSessionSelector {
    sessions: Vec<MediaSession>,
    selected_index: usize,
}

impl MediaSessionSelector {
    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn sessions(&self) -> &[MediaSession] {
        &self.sessions
    }

    /// The session the widget currently displays and controls.
    pub fn selected(&self) -> Option<&MediaSession> {
        self.sessions.get(self.selected_index)
    }

    /// Replace the session list, re-deriving the selection.
    ///
    /// Returns whether the selected session (by id) changed.
    pub fn sync(&mut self, sessions: Vec<MediaSession>, upstream_current: Option<&str>) -> bool {
        let previous_id = self.selected().map(|s| s.session_id.clone());

        let index = previous_id
            .as_deref()
            .and_then(|id| sessions.iter().position(|s| s.session_id == id))
            .unwrap_or_else(|| upstream_index(&sessions, upstream_current));

        self.sessions = sessions;
        self.selected_index = index;

        let current_id = self.selected().map(|s| s.session_id.as_str());
        current_id != previous_id.as_deref()
    }

    pub fn sync_snapshot(&mut self, snapshot: &ProviderSnapshot) -> bool {
        self.sync(snapshot.sessions().to_vec(), snapshot.current_session_id())
    }

    /// Handle a user activation. Modifiers are checked shift, ctrl, alt in
    /// that order; the first one held wins.
    ///
    /// Alt only cycles the local selection and never reaches the host.
    pub fn activate(&mut self, modifiers: Modifiers) -> Option<MediaCommand> {
        if modifiers.shift {
            return self.command(MediaAction::Previous);
        }
        if modifiers.ctrl {
            return self.command(MediaAction::Next);
        }
        if modifiers.alt {
            if !self.sessions.is_empty() {
                self.selected_index = (self.selected_index + 1) % self.sessions.len();
                tracing::debug!(index = self.selected_index, "media selection cycled");
            }
            return None;
        }
        self.command(MediaAction::TogglePlayPause)
    }

    fn command(&self, action: MediaAction) -> Option<MediaCommand> {
        let session = self.selected()?;
        Some(MediaCommand {
            action,
            session_id: session.session_id.clone(),
        })
    }
}

fn upstream_index(sessions: &[MediaSession], upstream_current: Option<&str>) -> usize {
    upstream_current
        .and_then(|id| sessions.iter().position(|s| s.session_id == id))
        .unwrap_or(0)
}
