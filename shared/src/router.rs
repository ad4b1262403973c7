// Application-wide event interception while the overlay is up

use crate::error::AttachError;

/// Opaque native window identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

/// Events the host forwards while the router is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    PointerPress { target: WindowId },
    KeyPress { target: WindowId },
    /// A top-level window lost activation
    Deactivated { window: WindowId },
    /// A link inside the overlay was clicked (press and release on it)
    LinkActivated { target: String },
}

/// Whether an event should continue to its normal target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Handled,
}

/// Application-wide interception collaborator.
///
/// While attached, the host delivers matching native events to
/// `OverlayManager::handle_event`. Attach and detach are strictly paired by
/// the manager.
pub trait EventBus {
    fn attach(&mut self) -> Result<(), AttachError>;
    fn detach(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Ignore,
    Hide,
    Activate(String),
}

/// Classifies intercepted events against the overlay's own windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRouter {
    surface: WindowId,
    surface_top_level: WindowId,
    host: Option<WindowId>,
}

impl EventRouter {
    pub fn new(surface: WindowId, surface_top_level: WindowId, host: Option<WindowId>) -> Self {
        Self {
            surface,
            surface_top_level,
            host,
        }
    }

    fn is_own(&self, target: WindowId) -> bool {
        target == self.surface || target == self.surface_top_level
    }

    pub fn route(&self, event: &AppEvent) -> RouteDecision {
        match event {
            AppEvent::PointerPress { target } | AppEvent::KeyPress { target } => {
                if self.is_own(*target) {
                    RouteDecision::Ignore
                } else {
                    RouteDecision::Hide
                }
            }
            AppEvent::Deactivated { window } => {
                if Some(*window) == self.host {
                    RouteDecision::Hide
                } else {
                    RouteDecision::Ignore
                }
            }
            AppEvent::LinkActivated { target } => RouteDecision::Activate(target.clone()),
        }
    }
}
