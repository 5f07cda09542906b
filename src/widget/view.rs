//! Text rendering of the status line.
//!
//! Each section renders inside its own [`Boundary`]; sections with nothing
//! to show are left out of the line.

use std::sync::Arc;

use crate::access::{is_present, with_default};
use crate::boundary::{Boundary, FaultSink};
use crate::wm::layout::{self, DEFAULT_LAYOUT};
use crate::wm::workspace::{focused_window_title, visible_workspaces};

use super::state::WidgetState;

pub const SEPARATOR: &str = " | ";

type SectionFn = fn(&WidgetState) -> Option<String>;

const SECTIONS: [(&str, SectionFn); 9] = [
    ("workspaces", workspaces),
    ("layout", layout_section),
    ("window", window_title),
    ("media", media),
    ("stats", stats),
    ("volume", volume),
    ("weather", weather),
    ("date", date),
    ("tiling", tiling),
];

pub struct View {
    sections: Vec<(Boundary, SectionFn)>,
}

impl View {
    pub fn new(sink: Arc<dyn FaultSink>) -> Self {
        let sections = SECTIONS
            .iter()
            .map(|(name, render)| (Boundary::new(*name, Arc::clone(&sink)), *render))
            .collect();
        Self { sections }
    }

    pub fn render(&self, state: &WidgetState) -> String {
        self.sections
            .iter()
            .filter_map(|(boundary, render)| {
                let render = *render;
                let mut present = true;
                let text = boundary.render(|| match render(state) {
                    Some(text) => text,
                    None => {
                        present = false;
                        String::new()
                    }
                });
                present.then_some(text)
            })
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }
}

fn workspaces(state: &WidgetState) -> Option<String> {
    let monitor = state.komorebi()?.current_monitor.as_ref()?;
    let labels: Vec<String> = visible_workspaces(monitor)
        .into_iter()
        .map(|entry| {
            if entry.focused {
                format!("[{}]", entry.label)
            } else {
                entry.label
            }
        })
        .collect();
    Some(labels.join(" "))
}

fn layout_section(state: &WidgetState) -> Option<String> {
    let ws = state.komorebi()?.focused_workspace.as_ref()?;
    let current = with_default(ws.layout.as_deref(), DEFAULT_LAYOUT);

    let mut text = layout::display_name(current).to_string();
    text.push_str(match state.layout_flip() {
        Some("horizontal") => " ↔",
        _ => " ↕",
    });
    if state.wm_status.is_processing {
        text.push_str(" …");
    } else if is_present(state.wm_status.last_error.as_ref()) {
        text.push_str(" !");
    }
    if state.layout_expanded {
        let others: Vec<_> = layout::alternatives(current)
            .map(layout::display_name)
            .collect();
        text.push_str(&format!(" [{}]", others.join(" ")));
    }
    Some(text)
}

fn window_title(state: &WidgetState) -> Option<String> {
    focused_window_title(state.komorebi()?)
}

fn clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn media(state: &WidgetState) -> Option<String> {
    let session = state.selected_session()?;
    let icon = if session.is_playing { "▶" } else { "⏸" };
    let title = with_default(session.title.as_deref(), "Unknown");

    let mut text = format!("{icon} {title}");
    if let Some(artist) = session.artist.as_deref().filter(|a| !a.is_empty()) {
        text.push_str(&format!(" - {artist}"));
    }

    let progress = &state.progress;
    if progress.end_time() > 0.0 {
        text.push_str(&format!(
            " {}/{} ({:.0}%)",
            clock(progress.position()),
            clock(progress.end_time()),
            progress.percent()
        ));
    }

    let count = state.selector.sessions().len();
    if count > 1 {
        text.push_str(&format!(" ({}/{count})", state.selector.selected_index() + 1));
    }
    Some(text)
}

fn stats(state: &WidgetState) -> Option<String> {
    let snapshot = state.snapshot.as_ref()?;
    let mut parts = Vec::new();
    if let Some(cpu) = snapshot.cpu_usage() {
        parts.push(format!("cpu {}%", cpu.round()));
    }
    if let Some(memory) = snapshot.memory_usage() {
        parts.push(format!("mem {}%", memory.round()));
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn volume(state: &WidgetState) -> Option<String> {
    let volume = state.volume()?;
    let mut text = format!("vol {}%", volume.round());
    if state.volume_expanded {
        let filled = (volume.clamp(0.0, 100.0) / 10.0).round() as usize;
        text.push_str(&format!(" [{}{}]", "=".repeat(filled), "-".repeat(10 - filled)));
    }
    Some(text)
}

fn weather(state: &WidgetState) -> Option<String> {
    let temp = state.snapshot.as_ref()?.weather.as_ref()?.celsius_temp?;
    Some(format!("{}°C", temp.round()))
}

fn date(state: &WidgetState) -> Option<String> {
    state.snapshot.as_ref()?.formatted_date().map(str::to_string)
}

fn tiling(state: &WidgetState) -> Option<String> {
    state.tiling_size.map(|size| format!("tile {size:.2}"))
}
