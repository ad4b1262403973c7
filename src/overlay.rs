// The clickable tooltip window.
//
// A single popup created on first use and then only moved, resized and
// shown/hidden by the overlay manager:
//   • WS_EX_TOPMOST | WS_EX_TOOLWINDOW keeps it above the host and out of
//     the taskbar
//   • WS_EX_NOACTIVATE plus MA_NOACTIVATE means clicking a link never steals
//     focus from the host window
//   • The window region follows the themed tooltip shape on every WM_SIZE
//
// Paint and hit-testing data lives in a thread-local so the window
// procedure never needs to reach into the manager that owns the surface.

use crate::hooks::{self, window_id};
use crate::painting::{self, Fonts, GdiMeasure};
use clicktip_shared::layout::{self, LinkTracker, TextLayout};
use clicktip_shared::markup::RichText;
use clicktip_shared::{AppEvent, OverlayConfig, OverlayError, OverlaySurface, Point, Size, WindowId};
use std::cell::{Cell, RefCell};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture};
use windows::Win32::UI::WindowsAndMessaging::*;

const CLASS_NAME: &str = "ClickTipOverlay\0";
const MA_NOACTIVATE: isize = 3;

const IDM_OPEN_LINK: u32 = 1;
const IDM_CLOSE: u32 = 2;

/// What the window procedure needs to paint and hit-test
struct Content {
    text: RichText,
    layout: TextLayout,
    padding: i32,
    tracker: LinkTracker,
}

thread_local! {
    static CONTENT: RefCell<Option<Content>> = const { RefCell::new(None) };
    static CLASS_REGISTERED: Cell<bool> = const { Cell::new(false) };
    static MENU_OWNER: Cell<isize> = const { Cell::new(0) };
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn register_class() -> Result<(), OverlayError> {
    if CLASS_REGISTERED.with(Cell::get) {
        return Ok(());
    }

    unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null()).unwrap_or_default();
        let class_name: Vec<u16> = CLASS_NAME.encode_utf16().collect();

        let wc = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW | CS_DROPSHADOW,
            lpfnWndProc: Some(window_proc),
            hInstance: hinstance.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            ..Default::default()
        };

        if RegisterClassW(&wc) == 0 {
            return Err(OverlayError::SurfaceCreation(
                "RegisterClassW failed for the overlay class".into(),
            ));
        }
    }
    CLASS_REGISTERED.with(|r| r.set(true));
    Ok(())
}

/// Client point -> link index, accounting for padding
fn link_at(lparam: LPARAM) -> Option<usize> {
    let x = (lparam.0 & 0xFFFF) as i16 as i32;
    let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;
    CONTENT.with(|content| {
        content.borrow().as_ref().and_then(|c| {
            c.layout
                .link_at(Point::new(x - c.padding, y - c.padding))
        })
    })
}

fn link_target(index: usize) -> Option<String> {
    CONTENT.with(|content| {
        content
            .borrow()
            .as_ref()
            .and_then(|c| c.text.link_target(index).map(str::to_string))
    })
}

fn with_tracker<R>(f: impl FnOnce(&mut LinkTracker) -> R) -> Option<R> {
    CONTENT.with(|content| content.borrow_mut().as_mut().map(|c| f(&mut c.tracker)))
}

/// Right-click menu. The manager is told around the modal loop so its
/// timers and router do not dismiss the overlay underneath the menu.
unsafe fn show_context_menu(hwnd: HWND, link: Option<usize>) {
    let Ok(menu) = CreatePopupMenu() else {
        return;
    };
    let open_text = wide("Open link");
    let close_text = wide("Close");
    if link.is_some() {
        let _ = AppendMenuW(
            menu,
            MF_STRING,
            IDM_OPEN_LINK as usize,
            PCWSTR(open_text.as_ptr()),
        );
    }
    let _ = AppendMenuW(menu, MF_STRING, IDM_CLOSE as usize, PCWSTR(close_text.as_ptr()));

    let mut pt = POINT::default();
    let _ = GetCursorPos(&mut pt);

    // Owned by the host so the overlay itself never activates
    let owner = match MENU_OWNER.with(Cell::get) {
        0 => hwnd,
        raw => HWND(raw as *mut std::ffi::c_void),
    };

    crate::host::with_manager(|m| m.menu_opened());
    hooks::suppress_input(true);
    let cmd = TrackPopupMenu(
        menu,
        TPM_LEFTALIGN | TPM_TOPALIGN | TPM_RETURNCMD | TPM_RIGHTBUTTON,
        pt.x,
        pt.y,
        Some(0),
        owner,
        None,
    );
    hooks::suppress_input(false);
    let _ = DestroyMenu(menu);

    // Delivered while the menu guard still holds, so the link survives
    // the pointer having wandered off over the menu
    if cmd.0 as u32 == IDM_OPEN_LINK {
        if let Some(target) = link.and_then(link_target) {
            crate::host::with_manager(|m| m.handle_event(&AppEvent::LinkActivated { target }));
        }
    }
    crate::host::with_manager(|m| m.menu_closed());
    if cmd.0 as u32 == IDM_CLOSE {
        crate::host::with_manager(|m| m.hide());
    }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_MOUSEACTIVATE => LRESULT(MA_NOACTIVATE),

        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);

            let mut client = RECT::default();
            let _ = GetClientRect(hwnd, &mut client);

            // Double-buffer to avoid flicker
            let mem_dc = CreateCompatibleDC(Some(hdc));
            let mem_bmp = CreateCompatibleBitmap(hdc, client.right, client.bottom);
            let old_bmp = SelectObject(mem_dc, HGDIOBJ::from(mem_bmp));

            CONTENT.with(|content| {
                if let Some(c) = content.borrow().as_ref() {
                    painting::paint_tooltip(mem_dc, hwnd, &client, &c.layout, c.padding);
                }
            });

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

        WM_ERASEBKGND => LRESULT(1),

        WM_SIZE => {
            let width = (lparam.0 & 0xFFFF) as i32;
            let height = ((lparam.0 >> 16) & 0xFFFF) as i32;
            painting::apply_tooltip_region(hwnd, width, height);
            LRESULT(0)
        }

        WM_SETCURSOR => {
            let mut pt = POINT::default();
            let _ = GetCursorPos(&mut pt);
            let _ = ScreenToClient(hwnd, &mut pt);
            let packed = ((pt.y as u16 as isize) << 16) | (pt.x as u16 as isize);
            if link_at(LPARAM(packed)).is_some() {
                if let Ok(hand) = LoadCursorW(None, IDC_HAND) {
                    SetCursor(Some(hand));
                    return LRESULT(1);
                }
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        WM_LBUTTONDOWN => {
            let link = link_at(lparam);
            with_tracker(|t| t.press(link));
            if link.is_some() {
                SetCapture(hwnd);
            }
            LRESULT(0)
        }

        WM_LBUTTONUP => {
            let link = link_at(lparam);
            // Activation on release, only over the link that was pressed.
            // Settle the tracker first; losing capture cancels it.
            let released = with_tracker(|t| t.release(link)).flatten();
            let _ = ReleaseCapture();
            if let Some(index) = released {
                if let Some(target) = link_target(index) {
                    hooks::dispatch(AppEvent::LinkActivated { target });
                }
            }
            LRESULT(0)
        }

        WM_CAPTURECHANGED => {
            with_tracker(LinkTracker::cancel);
            LRESULT(0)
        }

        WM_RBUTTONUP => {
            show_context_menu(hwnd, link_at(lparam));
            LRESULT(0)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Native overlay surface
pub struct Win32Surface {
    hwnd: HWND,
    pos: Point,
    size: Size,
    visible: bool,
    padding: i32,
    max_width: i32,
}

impl Win32Surface {
    pub fn create(host: HWND, config: &OverlayConfig) -> Result<Self, OverlayError> {
        register_class()?;
        MENU_OWNER.with(|owner| owner.set(host.0 as isize));

        let class_name = wide(CLASS_NAME.trim_end_matches('\0'));
        let hwnd = unsafe {
            let hinstance = GetModuleHandleW(PCWSTR::null()).unwrap_or_default();
            CreateWindowExW(
                WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE,
                PCWSTR(class_name.as_ptr()),
                PCWSTR::null(),
                WS_POPUP,
                0,
                0,
                1,
                1,
                Some(host),
                None,
                Some(hinstance.into()),
                None,
            )
        }
        .map_err(|e| OverlayError::SurfaceCreation(e.to_string()))?;

        log::debug!("overlay window created");
        Ok(Self {
            hwnd,
            pos: Point::default(),
            size: Size::default(),
            visible: false,
            padding: config.text_padding,
            max_width: config.max_text_width,
        })
    }

    fn measure(&self, text: &RichText) -> TextLayout {
        unsafe {
            let hdc = GetDC(Some(self.hwnd));
            let layout = Fonts::with(|fonts| {
                layout::layout(text, &GdiMeasure { hdc, fonts }, self.max_width)
            });
            ReleaseDC(Some(self.hwnd), hdc);
            layout
        }
    }
}

impl OverlaySurface for Win32Surface {
    fn window(&self) -> WindowId {
        window_id(self.hwnd)
    }

    fn set_content(&mut self, text: RichText) {
        let unchanged = CONTENT.with(|content| {
            content
                .borrow()
                .as_ref()
                .is_some_and(|c| c.text == text)
        });
        if unchanged {
            return;
        }

        let layout = self.measure(&text);
        self.size = Size::new(
            layout.size.width + 2 * self.padding,
            layout.size.height + 2 * self.padding,
        );
        CONTENT.with(|content| {
            *content.borrow_mut() = Some(Content {
                text,
                layout,
                padding: self.padding,
                tracker: LinkTracker::default(),
            });
        });

        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                None,
                0,
                0,
                self.size.width,
                self.size.height,
                SWP_NOMOVE | SWP_NOZORDER | SWP_NOACTIVATE,
            );
            let _ = InvalidateRect(Some(self.hwnd), None, false);
        }
    }

    fn size(&self) -> Size {
        self.size
    }

    fn position(&self) -> Point {
        self.pos
    }

    fn move_to(&mut self, top_left: Point) {
        self.pos = top_left;
        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                Some(HWND_TOPMOST),
                top_left.x,
                top_left.y,
                0,
                0,
                SWP_NOSIZE | SWP_NOACTIVATE,
            );
        }
    }

    fn show(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOWNOACTIVATE);
            let _ = SetWindowPos(
                self.hwnd,
                Some(HWND_TOPMOST),
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            );
        }
        self.visible = true;
    }

    fn hide(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_HIDE);
        }
        with_tracker(LinkTracker::cancel);
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

impl Drop for Win32Surface {
    fn drop(&mut self) {
        unsafe {
            if IsWindow(Some(self.hwnd)).as_bool() {
                let _ = DestroyWindow(self.hwnd);
            }
        }
        CONTENT.with(|content| content.borrow_mut().take());
    }
}
