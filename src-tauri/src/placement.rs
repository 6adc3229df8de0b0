//! Where the upload window goes: top-right corner of the work area.
//!
//! Pure geometry so it can be tested without a display. The desktop shell
//! feeds it the monitor's work area in physical pixels.

/// Gap between the window and the screen edges.
pub const WINDOW_MARGIN: i32 = 20;
pub const WINDOW_MIN_WIDTH: u32 = 500;
pub const WINDOW_MAX_HEIGHT: u32 = 80;

/// A screen's usable area in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenArea {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Top-left corner for a window of `window_width` pinned to the top-right of
/// `area`. A window wider than the area is pinned to its left edge instead.
pub fn top_right_position(area: ScreenArea, window_width: u32) -> (i32, i32) {
    let right = area.x + area.width as i32;
    let x = (right - window_width as i32 - WINDOW_MARGIN).max(area.x);
    let y = area.y + WINDOW_MARGIN;
    (x, y)
}
