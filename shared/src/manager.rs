// Overlay manager: owns the single overlay surface and its lifecycle.
//
// State machine:
//   Hidden -> Showing -> Visible -> Hidden
//   Visible -> MenuOpen -> Visible | Hidden
//
// Every dismissal path (proximity tick, auto-hide timer, outside click,
// host deactivation, link activation) ends in `hide()`, and all teardown
// happens in `teardown()`.

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::geometry::{Point, Rect};
use crate::markup::RichText;
use crate::platform::{OverlaySurface, Platform, ReferenceWidget, TimerId};
use crate::proximity::{ContainmentRegion, ProximityMonitor, Verdict};
use crate::router::{AppEvent, EventRouter, Propagation, RouteDecision};
use crate::screen;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Receives the target of an activated link
pub type LinkListener = Box<dyn FnMut(&str)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Hidden,
    /// Transient while `show_near` reconfigures the surface
    Showing,
    Visible,
    /// A context menu spawned from the overlay is open; hides are deferred
    MenuOpen {
        content_changed: bool,
        hide_requested: bool,
    },
}

struct OverlayState<S> {
    surface: Option<S>,
    reference: Option<Weak<dyn ReferenceWidget>>,
    anchor: Option<Point>,
    phase: Phase,
    proximity_timer_active: bool,
    auto_hide_timer_active: bool,
}

/// Returned by [`OverlayManager::show_near`] to attach the link listener
pub struct OverlayHandle<'a> {
    listener: &'a mut Option<LinkListener>,
    visible: bool,
}

impl OverlayHandle<'_> {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Replace the link listener. Only one listener exists at a time and
    /// it is dropped on the next show or hide.
    pub fn on_link_activated(self, listener: impl FnMut(&str) + 'static) {
        if self.visible {
            *self.listener = Some(Box::new(listener));
        }
    }
}

pub struct OverlayManager<P: Platform> {
    platform: P,
    config: OverlayConfig,
    monitor: ProximityMonitor,
    state: OverlayState<P::Surface>,
    router: Option<EventRouter>,
    listener: Option<LinkListener>,
    surfaces_created: u32,
}

impl<P: Platform> OverlayManager<P> {
    pub fn new(platform: P, config: OverlayConfig) -> Self {
        Self {
            platform,
            monitor: ProximityMonitor::new(&config),
            config,
            state: OverlayState {
                surface: None,
                reference: None,
                anchor: None,
                phase: Phase::Hidden,
                proximity_timer_active: false,
                auto_hide_timer_active: false,
            },
            router: None,
            listener: None,
            surfaces_created: 0,
        }
    }

    /// Show `text` near the screen point `position`.
    ///
    /// Blank text is a hide request. A zero `auto_hide` disables the
    /// auto-hide timer.
    pub fn show_near(
        &mut self,
        position: Point,
        text: &str,
        reference: Option<&Rc<dyn ReferenceWidget>>,
        auto_hide: Duration,
    ) -> Result<OverlayHandle<'_>, OverlayError> {
        let content = RichText::parse(text);
        if content.is_blank() {
            self.hide();
            let visible = self.is_visible();
            return Ok(OverlayHandle {
                listener: &mut self.listener,
                visible,
            });
        }

        let mut surface = match self.state.surface.take() {
            Some(surface) => surface,
            None => self.create_surface()?,
        };

        let menu_open = self.is_menu_active();
        let keep_place = self.is_visible() && self.same_place(position, reference);
        if !menu_open {
            self.state.phase = Phase::Showing;
        }
        self.stop_timers();
        self.listener = None;

        surface.set_content(content);
        let size = surface.size();
        if keep_place {
            // Content may have grown past the screen edge
            let current = surface.position();
            let target = screen::clamp_to_monitor(&self.platform, current, size);
            if target != current {
                surface.move_to(target);
            }
        } else {
            let desired = position.offset(self.config.cursor_offset_x, self.config.cursor_offset_y);
            surface.move_to(screen::clamp_to_monitor(&self.platform, desired, size));
        }

        match reference {
            Some(widget) => {
                self.state.reference = Some(Rc::downgrade(widget));
                self.state.anchor = None;
            }
            None => {
                self.state.reference = None;
                if !keep_place {
                    self.state.anchor = Some(position);
                }
            }
        }

        if !surface.is_visible() {
            surface.show();
        }
        let (window, top_level) = (surface.window(), surface.top_level());
        self.state.surface = Some(surface);

        self.attach_router(EventRouter::new(window, top_level, self.platform.host_window()));
        self.start_timer(TimerId::Proximity, self.monitor.interval());
        if !auto_hide.is_zero() {
            self.start_timer(TimerId::AutoHide, auto_hide);
        }

        self.state.phase = if menu_open {
            Phase::MenuOpen {
                content_changed: true,
                hide_requested: false,
            }
        } else {
            Phase::Visible
        };
        log::debug!(
            "overlay shown near ({}, {}), repositioned: {}",
            position.x,
            position.y,
            !keep_place
        );

        Ok(OverlayHandle {
            listener: &mut self.listener,
            visible: true,
        })
    }

    /// Hide the overlay. Safe to call at any time; deferred while a context
    /// menu from the overlay is open.
    pub fn hide(&mut self) {
        if let Phase::MenuOpen {
            content_changed,
            hide_requested,
        } = &mut self.state.phase
        {
            if !*hide_requested {
                log::debug!("hide deferred until the context menu closes");
            }
            // The latest request wins over content shown earlier in the menu
            *content_changed = false;
            *hide_requested = true;
            return;
        }
        self.teardown();
    }

    /// Expiry of a timer started by this manager
    pub fn on_timer(&mut self, id: TimerId) {
        match id {
            TimerId::Proximity => {
                if self.state.proximity_timer_active {
                    self.check_proximity();
                }
            }
            TimerId::AutoHide => {
                if self.state.auto_hide_timer_active {
                    self.platform.stop_timer(TimerId::AutoHide);
                    self.state.auto_hide_timer_active = false;
                    log::debug!("auto-hide delay elapsed");
                    self.hide();
                }
            }
        }
    }

    /// Feed an application event. Intercepted events are ignored while the
    /// router is detached; link activations come from the surface itself
    /// and count whenever the overlay is visible.
    pub fn handle_event(&mut self, event: &AppEvent) -> Propagation {
        let decision = match (self.router, event) {
            (Some(router), _) => router.route(event),
            (None, AppEvent::LinkActivated { target }) if self.is_visible() => {
                RouteDecision::Activate(target.clone())
            }
            (None, _) => return Propagation::Continue,
        };
        match decision {
            RouteDecision::Ignore => Propagation::Continue,
            RouteDecision::Hide => {
                log::debug!("dismissing overlay on {event:?}");
                self.hide();
                Propagation::Continue
            }
            RouteDecision::Activate(target) => {
                match self.listener.as_mut() {
                    Some(listener) => listener(&target),
                    None => log::debug!("link {target} activated with no listener"),
                }
                self.hide();
                Propagation::Handled
            }
        }
    }

    /// A context menu was opened from inside the overlay
    pub fn menu_opened(&mut self) {
        if self.state.phase == Phase::Visible {
            self.state.phase = Phase::MenuOpen {
                content_changed: false,
                hide_requested: false,
            };
            log::debug!("overlay context menu opened");
        }
    }

    /// The overlay's context menu closed; settle any deferred hide
    pub fn menu_closed(&mut self) {
        let Phase::MenuOpen {
            content_changed,
            hide_requested,
        } = self.state.phase
        else {
            return;
        };
        self.state.phase = Phase::Visible;
        log::debug!("overlay context menu closed");
        if content_changed {
            return;
        }
        if hide_requested || !self.pointer_near() {
            self.hide();
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state.phase, Phase::Visible | Phase::MenuOpen { .. })
    }

    pub fn is_menu_active(&self) -> bool {
        matches!(self.state.phase, Phase::MenuOpen { .. })
    }

    pub fn anchor(&self) -> Option<Point> {
        self.state.anchor
    }

    pub fn has_reference(&self) -> bool {
        self.state.reference.is_some()
    }

    pub fn is_router_attached(&self) -> bool {
        self.router.is_some()
    }

    pub fn is_timer_active(&self, id: TimerId) -> bool {
        match id {
            TimerId::Proximity => self.state.proximity_timer_active,
            TimerId::AutoHide => self.state.auto_hide_timer_active,
        }
    }

    pub fn has_link_listener(&self) -> bool {
        self.listener.is_some()
    }

    pub fn surface(&self) -> Option<&P::Surface> {
        self.state.surface.as_ref()
    }

    /// Surfaces constructed over the manager's lifetime (0 or 1)
    pub fn surfaces_created(&self) -> u32 {
        self.surfaces_created
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    fn create_surface(&mut self) -> Result<P::Surface, OverlayError> {
        let surface = self.platform.create_surface(&self.config)?;
        self.surfaces_created += 1;
        log::debug!("overlay surface created");
        Ok(surface)
    }

    /// Whether a new request targets the spot the overlay already occupies
    fn same_place(&self, position: Point, reference: Option<&Rc<dyn ReferenceWidget>>) -> bool {
        match (reference, &self.state.reference) {
            (Some(new), Some(old)) => old
                .upgrade()
                .is_some_and(|old| old.widget_id() == new.widget_id()),
            (None, None) => self.state.anchor.is_some_and(|anchor| {
                anchor.manhattan_distance(position) <= self.config.reposition_tolerance
            }),
            _ => false,
        }
    }

    fn containment_region(&self, frame: Rect) -> ContainmentRegion {
        let reference = self
            .state
            .reference
            .as_ref()
            .and_then(Weak::upgrade)
            .and_then(|widget| widget.screen_rect());
        self.monitor.region(frame, reference, self.state.anchor)
    }

    fn pointer_near(&self) -> bool {
        match self.state.surface.as_ref() {
            Some(surface) => self
                .containment_region(surface.frame())
                .contains(self.platform.cursor_pos()),
            None => false,
        }
    }

    fn check_proximity(&mut self) {
        let Some(frame) = self.state.surface.as_ref().map(OverlaySurface::frame) else {
            return;
        };
        let pointer = self.platform.cursor_pos();
        let region = self.containment_region(frame);
        if self.monitor.check(self.is_menu_active(), pointer, &region) == Verdict::Dismiss {
            log::debug!("pointer left overlay vicinity at ({}, {})", pointer.x, pointer.y);
            self.hide();
        }
    }

    fn attach_router(&mut self, router: EventRouter) {
        if self.router.is_some() {
            return;
        }
        match self.platform.attach() {
            Ok(()) => self.router = Some(router),
            Err(e) => log::warn!("{e}; overlay relies on proximity dismissal only"),
        }
    }

    fn detach_router(&mut self) {
        if self.router.take().is_some() {
            self.platform.detach();
        }
    }

    fn start_timer(&mut self, id: TimerId, period: Duration) {
        self.platform.start_timer(id, period);
        match id {
            TimerId::Proximity => self.state.proximity_timer_active = true,
            TimerId::AutoHide => self.state.auto_hide_timer_active = true,
        }
    }

    fn stop_timers(&mut self) {
        if self.state.proximity_timer_active {
            self.platform.stop_timer(TimerId::Proximity);
            self.state.proximity_timer_active = false;
        }
        if self.state.auto_hide_timer_active {
            self.platform.stop_timer(TimerId::AutoHide);
            self.state.auto_hide_timer_active = false;
        }
    }

    fn teardown(&mut self) {
        self.stop_timers();
        self.detach_router();
        if let Some(surface) = self.state.surface.as_mut() {
            if surface.is_visible() {
                surface.hide();
            }
        }
        self.state.reference = None;
        self.state.anchor = None;
        self.listener = None;
        if self.state.phase != Phase::Hidden {
            log::debug!("overlay hidden");
        }
        self.state.phase = Phase::Hidden;
    }
}

impl<P: Platform> Drop for OverlayManager<P> {
    fn drop(&mut self) {
        // Never leave interception installed behind us
        self.stop_timers();
        self.detach_router();
    }
}
