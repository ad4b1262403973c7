// Collaborator seams between the overlay logic and a native backend

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::geometry::{Point, Rect, Size};
use crate::markup::RichText;
use crate::router::{EventBus, WindowId};
use crate::screen::MonitorQuery;
use std::time::Duration;

/// The two timers the manager owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Repeating proximity check
    Proximity,
    /// One-shot dismissal after a fixed delay
    AutoHide,
}

/// Scheduled callbacks on the UI thread. Expiry is reported back through
/// `OverlayManager::on_timer`; timers repeat until stopped.
pub trait TimerHost {
    fn start_timer(&mut self, id: TimerId, period: Duration);
    fn stop_timer(&mut self, id: TimerId);
}

/// The floating tooltip window. Only the manager mutates it.
pub trait OverlaySurface {
    fn window(&self) -> WindowId;

    /// Top-level native window hosting the surface (often the same)
    fn top_level(&self) -> WindowId {
        self.window()
    }

    /// Replace the content and resize to fit it
    fn set_content(&mut self, text: RichText);
    fn size(&self) -> Size;
    fn position(&self) -> Point;
    fn move_to(&mut self, top_left: Point);
    fn show(&mut self);
    fn hide(&mut self);
    fn is_visible(&self) -> bool;

    fn frame(&self) -> Rect {
        Rect::from_origin_size(self.position(), self.size())
    }
}

/// A widget that asked for the overlay. The manager only holds it weakly.
pub trait ReferenceWidget {
    /// Stable identity used for the no-jitter check
    fn widget_id(&self) -> u64;

    /// Bounds in screen coordinates, if the widget is still mapped
    fn screen_rect(&self) -> Option<Rect>;
}

/// Performs navigation for an activated link
pub trait LinkOpener {
    fn open(&self, target: &str);
}

/// Everything the manager needs from the host toolkit
pub trait Platform: MonitorQuery + TimerHost + EventBus {
    type Surface: OverlaySurface;

    fn create_surface(&mut self, config: &OverlayConfig) -> Result<Self::Surface, OverlayError>;

    fn cursor_pos(&self) -> Point;

    /// Window whose deactivation dismisses the overlay
    fn host_window(&self) -> Option<WindowId>;
}
