// Native collaborators for the overlay manager on the UI thread

use crate::hooks::{self, window_id};
use crate::overlay::Win32Surface;
use clicktip_shared::{
    AttachError, EventBus, MonitorQuery, OverlayConfig, OverlayError, Platform, Point, Rect,
    TimerHost, TimerId, WindowId,
};
use std::time::Duration;
use windows::Win32::Foundation::{HWND, POINT, RECT};
use windows::Win32::Graphics::Gdi::{
    GetMonitorInfoW, MonitorFromPoint, MONITORINFO, MONITOR_DEFAULTTONULL,
    MONITOR_DEFAULTTOPRIMARY, MONITOR_FROM_FLAGS,
};
use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, KillTimer, SetTimer};

pub const PROXIMITY_TIMER_ID: usize = 200;
pub const AUTO_HIDE_TIMER_ID: usize = 201;

pub fn timer_from_raw(raw: usize) -> Option<TimerId> {
    match raw {
        PROXIMITY_TIMER_ID => Some(TimerId::Proximity),
        AUTO_HIDE_TIMER_ID => Some(TimerId::AutoHide),
        _ => None,
    }
}

fn timer_to_raw(id: TimerId) -> usize {
    match id {
        TimerId::Proximity => PROXIMITY_TIMER_ID,
        TimerId::AutoHide => AUTO_HIDE_TIMER_ID,
    }
}

fn to_rect(r: RECT) -> Rect {
    Rect::from_edges(r.left, r.top, r.right, r.bottom)
}

/// Work area of a monitor, or `None` if the handle is null
fn work_area(pt: Point, flags: MONITOR_FROM_FLAGS) -> Option<Rect> {
    unsafe {
        let monitor = MonitorFromPoint(POINT { x: pt.x, y: pt.y }, flags);
        if monitor.is_invalid() {
            return None;
        }
        let mut mi = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if GetMonitorInfoW(monitor, &mut mi).as_bool() {
            Some(to_rect(mi.rcWork))
        } else {
            None
        }
    }
}

/// Everything the manager touches, bound to the demo host window
pub struct Win32Platform {
    host: HWND,
}

impl Win32Platform {
    pub fn new(host: HWND) -> Self {
        hooks::set_host(host);
        Self { host }
    }
}

impl MonitorQuery for Win32Platform {
    fn monitor_at(&self, pt: Point) -> Option<Rect> {
        work_area(pt, MONITOR_DEFAULTTONULL)
    }

    fn primary_monitor(&self) -> Rect {
        work_area(Point::default(), MONITOR_DEFAULTTOPRIMARY)
            .unwrap_or_else(|| Rect::new(0, 0, 1024, 768))
    }
}

impl TimerHost for Win32Platform {
    fn start_timer(&mut self, id: TimerId, period: Duration) {
        let ms = period.as_millis().clamp(1, u32::MAX as u128) as u32;
        // Re-arming an existing id replaces it
        let set = unsafe { SetTimer(Some(self.host), timer_to_raw(id), ms, None) };
        if set == 0 {
            log::warn!("SetTimer failed for {id:?}");
        }
    }

    fn stop_timer(&mut self, id: TimerId) {
        unsafe {
            let _ = KillTimer(Some(self.host), timer_to_raw(id));
        }
    }
}

impl EventBus for Win32Platform {
    fn attach(&mut self) -> Result<(), AttachError> {
        hooks::install()
    }

    fn detach(&mut self) {
        hooks::uninstall();
    }
}

impl Platform for Win32Platform {
    type Surface = Win32Surface;

    fn create_surface(&mut self, config: &OverlayConfig) -> Result<Win32Surface, OverlayError> {
        Win32Surface::create(self.host, config)
    }

    fn cursor_pos(&self) -> Point {
        let mut pt = POINT::default();
        unsafe {
            let _ = GetCursorPos(&mut pt);
        }
        Point::new(pt.x, pt.y)
    }

    fn host_window(&self) -> Option<WindowId> {
        Some(window_id(self.host))
    }
}
