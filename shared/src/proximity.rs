// Proximity monitor: polled "is the pointer still near the overlay" check.
//
// Polling rather than enter/leave tracking, because the overlay is its own
// window. Leaving the reference widget to reach a link inside the overlay
// must not dismiss it.

use crate::config::OverlayConfig;
use crate::geometry::{Circle, Point, Rect};
use std::time::Duration;

/// Area around whatever asked for the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vicinity {
    /// Screen rectangle of the reference widget
    Widget(Rect),
    /// Small circle around the bare anchor point
    Anchor(Circle),
    /// The reference widget is gone; only the overlay itself counts
    None,
}

/// Expanded overlay rectangle united with the vicinity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainmentRegion {
    pub overlay: Rect,
    pub vicinity: Vicinity,
}

impl ContainmentRegion {
    pub fn contains(&self, p: Point) -> bool {
        if self.overlay.contains(p) {
            return true;
        }
        match self.vicinity {
            Vicinity::Widget(rect) => rect.contains(p),
            Vicinity::Anchor(circle) => circle.contains(p),
            Vicinity::None => false,
        }
    }
}

/// Outcome of one monitor tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A context menu from the overlay is open; no decision
    Skipped,
    Keep,
    Dismiss,
}

#[derive(Debug, Clone, Copy)]
pub struct ProximityMonitor {
    interval: Duration,
    margin: i32,
    anchor_radius: i32,
}

impl ProximityMonitor {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            interval: config.proximity_interval(),
            margin: config.proximity_margin,
            anchor_radius: config.anchor_radius,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn region(&self, overlay: Rect, reference: Option<Rect>, anchor: Option<Point>) -> ContainmentRegion {
        let vicinity = match (reference, anchor) {
            (Some(rect), _) => Vicinity::Widget(rect),
            (None, Some(center)) => Vicinity::Anchor(Circle {
                center,
                radius: self.anchor_radius,
            }),
            (None, None) => Vicinity::None,
        };
        ContainmentRegion {
            overlay: overlay.expanded(self.margin),
            vicinity,
        }
    }

    pub fn check(&self, menu_active: bool, pointer: Point, region: &ContainmentRegion) -> Verdict {
        if menu_active {
            return Verdict::Skipped;
        }
        if region.contains(pointer) {
            Verdict::Keep
        } else {
            Verdict::Dismiss
        }
    }
}
