//! Color constants and auto-scaling helpers for the TUI.

use ratatui::style::Color;

/// Solar-used line color.
pub const SOLAR_COLOR: Color = Color::Yellow;
/// Grid import line color.
pub const GRID_COLOR: Color = Color::Red;
/// Shared energy line color.
pub const SHARED_COLOR: Color = Color::Cyan;
/// Battery gauge color when high (>= 50%).
pub const BATTERY_HIGH: Color = Color::Green;
/// Battery gauge color when medium (>= 30%).
pub const BATTERY_MID: Color = Color::Yellow;
/// Battery gauge color when low (< 30%).
pub const BATTERY_LOW: Color = Color::Red;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Peer sharing indicator color.
pub const SHARING_ACTIVE: Color = Color::Magenta;

/// Returns a color based on the mean battery fraction.
pub fn battery_color(fraction: f32) -> Color {
    if fraction >= 0.5 {
        BATTERY_HIGH
    } else if fraction >= 0.3 {
        BATTERY_MID
    } else {
        BATTERY_LOW
    }
}

/// Computes Y-axis bounds from chart series with 10% headroom.
///
/// Energy series are non-negative, so the lower bound is pinned at zero.
pub fn auto_bounds_y(series: &[&[(f64, f64)]]) -> [f64; 2] {
    let max = series
        .iter()
        .flat_map(|s| s.iter().map(|&(_, y)| y))
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() || max <= 0.0 {
        return [0.0, 1.0];
    }
    [0.0, max * 1.1]
}
