//! Clickable hover overlay: a tooltip-like bubble that stays up while the
//! pointer travels into it, so links inside can be clicked.
//!
//! The crate is toolkit-agnostic. A backend implements [`Platform`] (surface
//! creation, monitors, timers, event interception) and the host drives an
//! [`OverlayManager`] from its event loop.

pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod manager;
pub mod markup;
pub mod opener;
pub mod platform;
pub mod proximity;
pub mod router;
pub mod screen;

pub use config::OverlayConfig;
pub use error::{AttachError, ConfigError, OverlayError};
pub use geometry::{Point, Rect, Size};
pub use manager::{LinkListener, OverlayHandle, OverlayManager, Phase};
pub use platform::{LinkOpener, OverlaySurface, Platform, ReferenceWidget, TimerHost, TimerId};
pub use router::{AppEvent, EventBus, Propagation, WindowId};
pub use screen::MonitorQuery;
