//! Workspace and focused-window derivations over window-manager output.

use crate::snapshot::{KomorebiOutput, WmMonitor, WmWindow, WmWorkspace};

pub const MAX_TITLE_CHARS: usize = 50;
pub const NO_ACTIVE_WINDOW: &str = "No active window";

/// Whether a workspace holds any window at all.
pub fn is_occupied(ws: &WmWorkspace) -> bool {
    ws.maximized_window.is_some()
        || ws
            .monocle_container
            .as_ref()
            .is_some_and(|c| !c.windows.is_empty())
        || !ws.floating_windows.is_empty()
        || ws.tiling_containers.iter().any(|c| !c.windows.is_empty())
}

/// One workspace button on the bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceEntry {
    pub index: usize,
    /// Name handed to `focus --workspace`; may be empty.
    pub name: String,
    pub label: String,
    pub focused: bool,
}

/// Occupied workspaces plus the focused one, in monitor order.
pub fn visible_workspaces(monitor: &WmMonitor) -> Vec<WorkspaceEntry> {
    let focused = monitor.focused_workspace_index.unwrap_or(0);
    monitor
        .workspaces
        .iter()
        .enumerate()
        .filter(|(index, ws)| *index == focused || is_occupied(ws))
        .map(|(index, ws)| {
            let name = ws.name.clone().unwrap_or_default();
            let label = if name.is_empty() {
                (index + 1).to_string()
            } else {
                name.clone()
            };
            WorkspaceEntry {
                index,
                name,
                label,
                focused: index == focused,
            }
        })
        .collect()
}

/// The window the user is looking at: maximized, then monocle, then the
/// focused tiling container, then the first floating window.
pub fn focused_window(ws: &WmWorkspace) -> Option<&WmWindow> {
    if let Some(window) = &ws.maximized_window {
        return Some(window);
    }
    if let Some(window) = ws.monocle_container.as_ref().and_then(|c| c.windows.first()) {
        return Some(window);
    }
    if let Some(window) = ws
        .focused_container_index
        .and_then(|i| ws.tiling_containers.get(i))
        .and_then(|c| c.windows.first())
    {
        return Some(window);
    }
    ws.floating_windows.first()
}

/// Title text for the bar. `None` when the window manager has not reported.
pub fn focused_window_title(komorebi: &KomorebiOutput) -> Option<String> {
    let ws = komorebi.focused_workspace.as_ref()?;
    let title = focused_window(ws)
        .and_then(|w| w.title.as_deref())
        .filter(|t| !t.is_empty())
        .or(ws.name.as_deref().filter(|n| !n.is_empty()))
        .unwrap_or(NO_ACTIVE_WINDOW);
    Some(title.chars().take(MAX_TITLE_CHARS).collect())
}
