// Demo host window.
//
// Three hover zones, each acting as the reference widget for the overlay:
//   • Links: rich text with two clickable links, stays up while the pointer
//     is near
//   • Auto-hide: dismisses itself after a fixed delay
//   • Plain: a single line of text
//
// The manager lives in a thread-local and is only borrowed from this
// window's procedure or from the overlay's. Anything arriving from hooks
// goes through WM_APP_ROUTE so the borrow is never re-entered.

use crate::hooks::{self, WM_APP_ROUTE};
use crate::painting::{self, Fonts};
use crate::platform::{self, Win32Platform};
use crate::shell::ShellOpener;
use anyhow::{anyhow, Result};
use clicktip_shared::{
    LinkOpener, OverlayConfig, OverlayManager, Point, Rect, ReferenceWidget,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{TrackMouseEvent, TME_LEAVE, TRACKMOUSEEVENT};
use windows::Win32::UI::WindowsAndMessaging::*;

const CLASS_NAME: &str = "ClickTipHost";
const WINDOW_WIDTH: i32 = 420;
const WINDOW_HEIGHT: i32 = 320;
const PADDING: i32 = 24;
const ZONE_HEIGHT: i32 = 72;
const GAP: i32 = 16;

const CLR_BACKGROUND: COLORREF = COLORREF(0x00F7F4F2);
const CLR_ZONE: COLORREF = COLORREF(0x00FFFFFF);
const CLR_ZONE_HOT: COLORREF = COLORREF(0x00FFF0E3);
const CLR_BORDER: COLORREF = COLORREF(0x00D6CFC9);
const CLR_TEXT: COLORREF = COLORREF(0x00332B26);

struct ZoneContent {
    label: &'static str,
    text: &'static str,
    auto_hide: Duration,
}

const ZONES: [ZoneContent; 3] = [
    ZoneContent {
        label: "Links",
        text: "<b>ClickTip</b> overlays stay open while you move towards them.<br>\
               Try the <a href=\"https://www.rust-lang.org\">Rust site</a> or \
               <a href=\"https://docs.rs\">docs.rs</a>.",
        auto_hide: Duration::ZERO,
    },
    ZoneContent {
        label: "Auto-hide",
        text: "This one goes away by itself after <i>two seconds</i>.",
        auto_hide: Duration::from_secs(2),
    },
    ZoneContent {
        label: "Plain",
        text: "Just text. Right-click for the menu.",
        auto_hide: Duration::ZERO,
    },
];

/// A hover zone as seen by the overlay manager
struct Zone {
    id: u64,
    host: HWND,
    client: RECT,
}

impl ReferenceWidget for Zone {
    fn widget_id(&self) -> u64 {
        self.id
    }

    fn screen_rect(&self) -> Option<Rect> {
        unsafe {
            if !IsWindowVisible(self.host).as_bool() || IsIconic(self.host).as_bool() {
                return None;
            }
            let mut origin = POINT {
                x: self.client.left,
                y: self.client.top,
            };
            if !ClientToScreen(self.host, &mut origin).as_bool() {
                return None;
            }
            Some(Rect::new(
                origin.x,
                origin.y,
                self.client.right - self.client.left,
                self.client.bottom - self.client.top,
            ))
        }
    }
}

struct App {
    manager: OverlayManager<Win32Platform>,
    zones: Vec<Rc<Zone>>,
    hover: Hover,
}

/// Which zone the pointer is over, and whether a leave notification is armed
#[derive(Debug, Default)]
struct Hover {
    zone: Option<usize>,
    tracking_leave: bool,
}

impl Hover {
    /// Pointer moved over `zone`. Returns whether the highlight changed.
    fn moved(&mut self, zone: Option<usize>) -> bool {
        if self.zone == zone {
            return false;
        }
        self.zone = zone;
        true
    }

    /// Pointer left the client area. Returns whether a zone was lit.
    fn left(&mut self) -> bool {
        self.tracking_leave = false;
        self.zone.take().is_some()
    }
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Run `f` against the overlay manager. Returns `None` when there is no
/// manager yet or it is already borrowed further up the stack.
pub fn with_manager<R>(f: impl FnOnce(&mut OverlayManager<Win32Platform>) -> R) -> Option<R> {
    APP.with(|app| match app.try_borrow_mut() {
        Ok(mut app) => app.as_mut().map(|app| f(&mut app.manager)),
        Err(_) => {
            log::debug!("overlay manager busy, dropping nested call");
            None
        }
    })
}

fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|app| app.try_borrow_mut().ok()?.as_mut().map(f))
}

fn zone_rect(index: usize) -> RECT {
    let top = PADDING + index as i32 * (ZONE_HEIGHT + GAP);
    RECT {
        left: PADDING,
        top,
        right: WINDOW_WIDTH - PADDING,
        bottom: top + ZONE_HEIGHT,
    }
}

fn point_in_rect(x: i32, y: i32, r: &RECT) -> bool {
    x >= r.left && x < r.right && y >= r.top && y < r.bottom
}

/// Create the host window and the manager bound to it (initially hidden)
pub fn create_window(config: OverlayConfig) -> Result<HWND> {
    let class_name = wide(CLASS_NAME);

    let hwnd = unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null())?;

        let wc = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(wnd_proc),
            hInstance: hinstance.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            hIcon: LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            return Err(anyhow!("failed to register the host window class"));
        }

        // Calculate window size to get desired client area
        let mut wr = RECT {
            left: 0,
            top: 0,
            right: WINDOW_WIDTH,
            bottom: WINDOW_HEIGHT,
        };
        let style = WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU | WS_MINIMIZEBOX;
        let _ = AdjustWindowRectEx(&mut wr, style, false, WINDOW_EX_STYLE::default());

        let title = wide("ClickTip demo");
        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            PCWSTR(class_name.as_ptr()),
            PCWSTR(title.as_ptr()),
            style,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            wr.right - wr.left,
            wr.bottom - wr.top,
            None,
            None,
            Some(hinstance.into()),
            None,
        )?
    };

    let zones = (0..ZONES.len())
        .map(|i| {
            Rc::new(Zone {
                id: i as u64 + 1,
                host: hwnd,
                client: zone_rect(i),
            })
        })
        .collect();

    let manager = OverlayManager::new(Win32Platform::new(hwnd), config);
    APP.with(|app| {
        *app.borrow_mut() = Some(App {
            manager,
            zones,
            hover: Hover::default(),
        })
    });

    log::info!("host window created");
    Ok(hwnd)
}

/// Show and focus the host window
pub fn show_window(hwnd: HWND) {
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = SetForegroundWindow(hwnd);
    }
}

/// Pointer entered a zone: show its overlay beside the cursor
fn enter_zone(app: &mut App, index: usize) {
    let mut cursor = POINT::default();
    unsafe {
        let _ = GetCursorPos(&mut cursor);
    }
    let content = &ZONES[index];
    let widget: Rc<dyn ReferenceWidget> = app.zones[index].clone();

    match app.manager.show_near(
        Point::new(cursor.x, cursor.y),
        content.text,
        Some(&widget),
        content.auto_hide,
    ) {
        Ok(handle) => handle.on_link_activated(|target| ShellOpener.open(target)),
        Err(e) => log::warn!("could not show the {} overlay: {e}", content.label),
    }
}

/// Ask for one WM_MOUSELEAVE when the pointer leaves the client area
fn track_mouse_leave(hwnd: HWND) -> bool {
    let mut tme = TRACKMOUSEEVENT {
        cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
        dwFlags: TME_LEAVE,
        hwndTrack: hwnd,
        dwHoverTime: 0,
    };
    unsafe { TrackMouseEvent(&mut tme).is_ok() }
}

fn paint(hdc: HDC, client: &RECT, hovered: Option<usize>) {
    painting::fill_rect_color(hdc, client, CLR_BACKGROUND);

    let font = Fonts::with(Fonts::regular);
    for (i, content) in ZONES.iter().enumerate() {
        let r = zone_rect(i);
        let fill = if hovered == Some(i) { CLR_ZONE_HOT } else { CLR_ZONE };
        painting::draw_rounded_rect(hdc, &r, 8, fill, CLR_BORDER);
        painting::draw_text_simple(
            hdc,
            &format!("Hover here: {}", content.label),
            r.left + 16,
            r.top + (ZONE_HEIGHT - 16) / 2,
            CLR_TEXT,
            font,
        );
    }
}

unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);

            // Double-buffer to avoid flicker
            let mut client = RECT::default();
            let _ = GetClientRect(hwnd, &mut client);

            let mem_dc = CreateCompatibleDC(Some(hdc));
            let mem_bmp = CreateCompatibleBitmap(hdc, client.right, client.bottom);
            let old_bmp = SelectObject(mem_dc, HGDIOBJ::from(mem_bmp));

            let hovered = with_app(|app| app.hover.zone).flatten();
            paint(mem_dc, &client, hovered);

            let _ = BitBlt(
                hdc,
                0,
                0,
                client.right,
                client.bottom,
                Some(mem_dc),
                0,
                0,
                SRCCOPY,
            );

            SelectObject(mem_dc, old_bmp);
            let _ = DeleteObject(HGDIOBJ::from(mem_bmp));
            let _ = DeleteDC(mem_dc);
            let _ = EndPaint(hwnd, &ps);
            LRESULT(0)
        }

        WM_MOUSEMOVE => {
            let x = (lparam.0 & 0xFFFF) as i16 as i32;
            let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;
            let zone = (0..ZONES.len()).find(|&i| point_in_rect(x, y, &zone_rect(i)));

            let changed = with_app(|app| {
                if !app.hover.tracking_leave {
                    app.hover.tracking_leave = track_mouse_leave(hwnd);
                }
                if !app.hover.moved(zone) {
                    return false;
                }
                // Leaving a zone is left to the proximity check
                if let Some(index) = zone {
                    enter_zone(app, index);
                }
                true
            });
            if changed == Some(true) {
                let _ = InvalidateRect(Some(hwnd), None, false);
            }
            LRESULT(0)
        }

        WM_MOUSELEAVE => {
            // Re-entering the same zone must show its overlay again
            let cleared = with_app(|app| app.hover.left());
            if cleared == Some(true) {
                let _ = InvalidateRect(Some(hwnd), None, false);
            }
            LRESULT(0)
        }

        WM_TIMER => {
            if let Some(id) = platform::timer_from_raw(wparam.0) {
                with_manager(|m| m.on_timer(id));
            }
            LRESULT(0)
        }

        WM_APP_ROUTE => {
            for event in hooks::drain() {
                with_manager(|m| m.handle_event(&event));
            }
            LRESULT(0)
        }

        WM_DESTROY => {
            // Dropping the manager unhooks the router and kills its timers
            let app = APP.with(|app| app.try_borrow_mut().ok().and_then(|mut a| a.take()));
            drop(app);
            PostQuitMessage(0);
            LRESULT(0)
        }

        WM_ERASEBKGND => {
            // Handled in WM_PAINT with double buffering
            LRESULT(1)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
