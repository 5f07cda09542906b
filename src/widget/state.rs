//! Local widget state derived from published snapshots and user input.

use std::sync::Arc;

use crate::media::MediaSessionSelector;
use crate::media::progress::PlaybackProgress;
use crate::snapshot::{KomorebiOutput, MediaSession, ProviderSnapshot};
use crate::wm::WmStatus;

#[derive(Debug, Default)]
pub struct WidgetState {
    pub snapshot: Option<Arc<ProviderSnapshot>>,
    pub selector: MediaSessionSelector,
    pub progress: PlaybackProgress,
    pub tiling_size: Option<f64>,
    pub wm_status: WmStatus,
    /// Layout menu open.
    pub layout_expanded: bool,
    /// Volume slider shown.
    pub volume_expanded: bool,
}

impl WidgetState {
    /// Adopt a newly published snapshot. Returns `false` when it is the
    /// snapshot already held.
    pub fn apply_snapshot(&mut self, snapshot: Option<Arc<ProviderSnapshot>>) -> bool {
        let same = match (&self.snapshot, &snapshot) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return false;
        }

        match &snapshot {
            Some(snap) => {
                if self.selector.sync_snapshot(snap) {
                    tracing::debug!(
                        session = ?self.selector.selected().map(|s| &s.session_id),
                        "selected media session changed"
                    );
                }
            }
            None => self.selector = MediaSessionSelector::default(),
        }
        self.snapshot = snapshot;
        self.progress.update(self.selector.selected());
        true
    }

    /// Re-derive progress after a local selection change.
    pub fn selection_moved(&mut self) {
        self.progress.update(self.selector.selected());
    }

    pub fn selected_session(&self) -> Option<&MediaSession> {
        self.selector.selected()
    }

    pub fn komorebi(&self) -> Option<&KomorebiOutput> {
        self.snapshot.as_ref()?.komorebi.as_ref()
    }

    pub fn volume(&self) -> Option<f64> {
        self.snapshot.as_ref()?.volume()
    }

    /// Current layout flip of the focused workspace.
    pub fn layout_flip(&self) -> Option<&str> {
        self.komorebi()?.focused_workspace.as_ref()?.layout_flip.as_deref()
    }
}
