// In-memory platform with a simulated clock for driving the overlay manager

#![allow(dead_code)]

use clicktip_shared::error::{AttachError, OverlayError};
use clicktip_shared::markup::RichText;
use clicktip_shared::{
    EventBus, MonitorQuery, OverlayConfig, OverlayManager, OverlaySurface, Platform, Point, Rect,
    ReferenceWidget, Size, TimerHost, TimerId, WindowId,
};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

pub const PRIMARY: Rect = Rect::new(0, 0, 1920, 1080);
pub const SECONDARY: Rect = Rect::new(1920, 0, 1280, 1024);
pub const HOST: WindowId = WindowId(1);
pub const SURFACE: WindowId = WindowId(100);
pub const STEP: Duration = Duration::from_millis(10);

/// Counters that outlive the manager
#[derive(Debug, Default)]
pub struct Counters {
    pub attaches: Cell<u32>,
    pub detaches: Cell<u32>,
    pub surfaces: Cell<u32>,
}

pub struct FakeSurface {
    pos: Point,
    size: Size,
    visible: bool,
    pub text: String,
    pub moves: u32,
}

impl OverlaySurface for FakeSurface {
    fn window(&self) -> WindowId {
        SURFACE
    }

    fn set_content(&mut self, text: RichText) {
        self.text = text.plain_text();
        let chars = self.text.chars().count() as i32;
        self.size = Size::new((chars * 8).min(360) + 12, 24);
    }

    fn size(&self) -> Size {
        self.size
    }

    fn position(&self) -> Point {
        self.pos
    }

    fn move_to(&mut self, top_left: Point) {
        self.pos = top_left;
        self.moves += 1;
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

struct Timer {
    period: Duration,
    due: Duration,
}

pub struct FakePlatform {
    pub cursor: Point,
    pub fail_attach: bool,
    pub attached: bool,
    pub now: Duration,
    pub counters: Rc<Counters>,
    timers: BTreeMap<u8, (TimerId, Timer)>,
}

fn slot(id: TimerId) -> u8 {
    match id {
        TimerId::Proximity => 0,
        TimerId::AutoHide => 1,
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            cursor: Point::new(0, 0),
            fail_attach: false,
            attached: false,
            now: Duration::ZERO,
            counters: Rc::new(Counters::default()),
            timers: BTreeMap::new(),
        }
    }

    pub fn is_running(&self, id: TimerId) -> bool {
        self.timers.contains_key(&slot(id))
    }

    pub fn timer_period(&self, id: TimerId) -> Option<Duration> {
        self.timers.get(&slot(id)).map(|(_, t)| t.period)
    }

    /// Advance the clock by one step and report which timers expired
    fn tick(&mut self) -> Vec<TimerId> {
        self.now += STEP;
        let now = self.now;
        let mut fired = Vec::new();
        for (id, timer) in self.timers.values_mut() {
            if timer.due <= now {
                timer.due += timer.period;
                fired.push(*id);
            }
        }
        fired
    }
}

impl MonitorQuery for FakePlatform {
    fn monitor_at(&self, p: Point) -> Option<Rect> {
        [PRIMARY, SECONDARY].into_iter().find(|m| m.contains(p))
    }

    fn primary_monitor(&self) -> Rect {
        PRIMARY
    }
}

impl TimerHost for FakePlatform {
    fn start_timer(&mut self, id: TimerId, period: Duration) {
        let due = self.now + period;
        self.timers.insert(slot(id), (id, Timer { period, due }));
    }

    fn stop_timer(&mut self, id: TimerId) {
        self.timers.remove(&slot(id));
    }
}

impl EventBus for FakePlatform {
    fn attach(&mut self) -> Result<(), AttachError> {
        if self.fail_attach {
            return Err(AttachError("hooks unavailable".into()));
        }
        assert!(!self.attached, "router attached twice");
        self.attached = true;
        self.counters.attaches.set(self.counters.attaches.get() + 1);
        Ok(())
    }

    fn detach(&mut self) {
        assert!(self.attached, "router detached while not attached");
        self.attached = false;
        self.counters.detaches.set(self.counters.detaches.get() + 1);
    }
}

impl Platform for FakePlatform {
    type Surface = FakeSurface;

    fn create_surface(&mut self, _config: &OverlayConfig) -> Result<FakeSurface, OverlayError> {
        self.counters.surfaces.set(self.counters.surfaces.get() + 1);
        Ok(FakeSurface {
            pos: Point::default(),
            size: Size::default(),
            visible: false,
            text: String::new(),
            moves: 0,
        })
    }

    fn cursor_pos(&self) -> Point {
        self.cursor
    }

    fn host_window(&self) -> Option<WindowId> {
        Some(HOST)
    }
}

pub fn manager() -> OverlayManager<FakePlatform> {
    OverlayManager::new(FakePlatform::new(), OverlayConfig::default())
}

/// Run the simulated event loop for `total`, delivering timer expiries
pub fn run_for(manager: &mut OverlayManager<FakePlatform>, total: Duration) {
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        elapsed += STEP;
        for id in manager.platform_mut().tick() {
            manager.on_timer(id);
        }
    }
}

pub fn move_cursor(manager: &mut OverlayManager<FakePlatform>, to: Point) {
    manager.platform_mut().cursor = to;
}

pub struct FakeWidget {
    pub id: u64,
    pub rect: Rect,
}

impl ReferenceWidget for FakeWidget {
    fn widget_id(&self) -> u64 {
        self.id
    }

    fn screen_rect(&self) -> Option<Rect> {
        Some(self.rect)
    }
}

pub fn widget(id: u64, rect: Rect) -> Rc<dyn ReferenceWidget> {
    Rc::new(FakeWidget { id, rect })
}
