// Screen clamping and monitor lookup

use crate::geometry::{Point, Rect, Size};

/// Display query collaborator.
///
/// `monitor_at` returns `None` when no monitor contains the point, which can
/// happen while a display is being disconnected. Callers fall back to
/// [`MonitorQuery::primary_monitor`].
pub trait MonitorQuery {
    /// Usable bounds of the monitor containing `p`
    fn monitor_at(&self, p: Point) -> Option<Rect>;

    /// Usable bounds of the primary monitor
    fn primary_monitor(&self) -> Rect;
}

/// Bounds of the monitor containing `p`, or the primary monitor
pub fn screen_bounds_for<M: MonitorQuery + ?Sized>(monitors: &M, p: Point) -> Rect {
    match monitors.monitor_at(p) {
        Some(bounds) => bounds,
        None => {
            log::debug!("no monitor at ({}, {}), using primary", p.x, p.y);
            monitors.primary_monitor()
        }
    }
}

/// Move a rectangle of `size` placed at `desired` so it fits inside `screen`.
///
/// Bottom is corrected before top and right before left, so content larger
/// than the screen keeps its top-left corner visible.
pub fn clamp(desired: Point, size: Size, screen: Rect) -> Point {
    Point::new(
        clamp_axis(desired.x, size.width, screen.left(), screen.right()),
        clamp_axis(desired.y, size.height, screen.top(), screen.bottom()),
    )
}

fn clamp_axis(start: i32, extent: i32, min: i32, max: i32) -> i32 {
    let mut start = start;
    if start + extent > max {
        start = max - extent;
    }
    if start < min {
        start = min;
    }
    start
}

/// Clamp against whichever monitor contains `desired`
pub fn clamp_to_monitor<M: MonitorQuery + ?Sized>(monitors: &M, desired: Point, size: Size) -> Point {
    clamp(desired, size, screen_bounds_for(monitors, desired))
}
