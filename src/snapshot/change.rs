//! Semantic change detection between successive snapshots.
//!
//! Only fields that affect visible content are watched: current media
//! session id, its playing flag, CPU usage, memory usage, default playback
//! volume, formatted date, and the focused workspace name. Changes to any
//! other field (weather, systray, session titles, ...) do not count.

use std::sync::Arc;

use super::ProviderSnapshot;

/// Whether `next` differs from `prev` in a way the UI must redraw for.
///
/// Identical references and two absent snapshots are unchanged. A presence
/// transition (one side absent) always counts as a change.
pub fn has_changed(
    prev: Option<&Arc<ProviderSnapshot>>,
    next: Option<&Arc<ProviderSnapshot>>,
) -> bool {
    match (prev, next) {
        (None, None) => false,
        (Some(p), Some(n)) if Arc::ptr_eq(p, n) => false,
        (Some(p), Some(n)) => watched_fields_differ(p, n),
        _ => true,
    }
}

fn watched_fields_differ(prev: &ProviderSnapshot, next: &ProviderSnapshot) -> bool {
    prev.current_session_id() != next.current_session_id()
        || prev.is_playing() != next.is_playing()
        || prev.cpu_usage() != next.cpu_usage()
        || prev.memory_usage() != next.memory_usage()
        || prev.volume() != next.volume()
        || prev.formatted_date() != next.formatted_date()
        || prev.focused_workspace_name() != next.focused_workspace_name()
}
