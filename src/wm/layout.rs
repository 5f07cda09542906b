//! Tiling layout names.
//!
//! The window manager reports layouts by snake_case key; its CLI takes
//! kebab-case names. Unknown keys fall back to `bsp` on the CLI side and
//! `Custom` for display.

/// Every layout the bar offers, in menu order.
pub const LAYOUTS: [&str; 8] = [
    "bsp",
    "vertical_stack",
    "horizontal_stack",
    "ultrawide_vertical_stack",
    "rows",
    "grid",
    "right_main_vertical_stack",
    "custom",
];

/// Layout assumed when the window manager reports none.
pub const DEFAULT_LAYOUT: &str = "bsp";

pub fn display_name(key: &str) -> &'static str {
    match key {
        "bsp" => "BSP",
        "vertical_stack" => "V-Stack",
        "horizontal_stack" => "H-Stack",
        "ultrawide_vertical_stack" => "Ultrawide",
        "rows" => "Rows",
        "grid" => "Grid",
        "right_main_vertical_stack" => "R-Main",
        _ => "Custom",
    }
}

pub fn cli_name(key: &str) -> &'static str {
    match key {
        "vertical_stack" => "vertical-stack",
        "horizontal_stack" => "horizontal-stack",
        "ultrawide_vertical_stack" => "ultrawide-vertical-stack",
        "rows" => "rows",
        "grid" => "grid",
        "right_main_vertical_stack" => "right-main-vertical-stack",
        "custom" => "custom",
        _ => "bsp",
    }
}

/// Layouts the user can switch to from `current`.
pub fn alternatives(current: &str) -> impl Iterator<Item = &'static str> + '_ {
    LAYOUTS.into_iter().filter(move |key| *key != current)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Horizontal,
    Vertical,
}

impl FlipDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }

    /// Direction to flip to given the workspace's current flip.
    pub fn next(current: Option<&str>) -> Self {
        match current {
            Some("horizontal") => Self::Vertical,
            _ => Self::Horizontal,
        }
    }
}
