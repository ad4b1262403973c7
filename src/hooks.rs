// Application-wide event interception for the overlay router.
//
// Two thread-local hooks on the UI thread:
//   • WH_GETMESSAGE sees posted input (mouse presses, key presses) for every
//     window of the thread, child controls included
//   • WH_CALLWNDPROC sees sent messages, which is how WM_ACTIVATE arrives
//
// Hook procs run while the overlay manager may be mid-update, so they never
// call into it. Events are queued and the host window is poked with
// WM_APP_ROUTE to drain them from its own window procedure.

use clicktip_shared::{AppEvent, AttachError, WindowId};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetAncestor, PostMessageW, SetWindowsHookExW, UnhookWindowsHookEx, CWPSTRUCT,
    GA_ROOT, HHOOK, MSG, PM_REMOVE, WA_INACTIVE, WH_CALLWNDPROC, WH_GETMESSAGE, WM_ACTIVATE,
    WM_ACTIVATEAPP, WM_APP, WM_KEYDOWN, WM_LBUTTONDOWN, WM_MBUTTONDOWN, WM_NCLBUTTONDOWN,
    WM_NCMBUTTONDOWN, WM_NCRBUTTONDOWN, WM_RBUTTONDOWN, WM_SYSKEYDOWN, WM_XBUTTONDOWN,
};

/// Posted to the host window when intercepted events are waiting
pub const WM_APP_ROUTE: u32 = WM_APP + 1;

struct Hooks {
    get_message: HHOOK,
    call_wnd_proc: HHOOK,
}

thread_local! {
    static HOOKS: RefCell<Option<Hooks>> = const { RefCell::new(None) };
    static PENDING: RefCell<VecDeque<AppEvent>> = const { RefCell::new(VecDeque::new()) };
    static HOST: Cell<isize> = const { Cell::new(0) };
    static SUPPRESSED: Cell<bool> = const { Cell::new(false) };
}

pub fn window_id(hwnd: HWND) -> WindowId {
    WindowId(hwnd.0 as usize as u64)
}

/// Top-level ancestor, so clicks on child controls count as their window
fn root_id(hwnd: HWND) -> WindowId {
    let root = unsafe { GetAncestor(hwnd, GA_ROOT) };
    if root.is_invalid() {
        window_id(hwnd)
    } else {
        window_id(root)
    }
}

/// Remember which window drains the queue
pub fn set_host(host: HWND) {
    HOST.with(|h| h.set(host.0 as isize));
}

/// Queue an event for the manager and wake the host
pub fn dispatch(event: AppEvent) {
    PENDING.with(|queue| queue.borrow_mut().push_back(event));
    let host = HOST.with(Cell::get);
    if host != 0 {
        unsafe {
            let hwnd = HWND(host as *mut std::ffi::c_void);
            if let Err(e) = PostMessageW(Some(hwnd), WM_APP_ROUTE, WPARAM(0), LPARAM(0)) {
                log::warn!("failed to post routed event: {e}");
            }
        }
    }
}

/// Ignore input while a modal menu owned by the overlay is tracking.
/// Presses on the menu itself are not outside clicks.
pub fn suppress_input(on: bool) {
    SUPPRESSED.with(|s| s.set(on));
}

/// Take everything queued since the last drain
pub fn drain() -> Vec<AppEvent> {
    PENDING.with(|queue| queue.borrow_mut().drain(..).collect())
}

unsafe extern "system" fn get_message_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    // Only messages actually leaving the queue; PM_NOREMOVE peeks repeat them
    if code >= 0 && wparam.0 == PM_REMOVE.0 as usize && !SUPPRESSED.with(Cell::get) {
        let msg = &*(lparam.0 as *const MSG);
        match msg.message {
            WM_LBUTTONDOWN | WM_RBUTTONDOWN | WM_MBUTTONDOWN | WM_XBUTTONDOWN
            | WM_NCLBUTTONDOWN | WM_NCRBUTTONDOWN | WM_NCMBUTTONDOWN => {
                dispatch(AppEvent::PointerPress {
                    target: root_id(msg.hwnd),
                });
            }
            WM_KEYDOWN | WM_SYSKEYDOWN => {
                dispatch(AppEvent::KeyPress {
                    target: root_id(msg.hwnd),
                });
            }
            _ => {}
        }
    }
    // Never swallow; the event still reaches its real target
    CallNextHookEx(None, code, wparam, lparam)
}

unsafe extern "system" fn call_wnd_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code >= 0 {
        let cwp = &*(lparam.0 as *const CWPSTRUCT);
        let deactivated = match cwp.message {
            WM_ACTIVATE => (cwp.wParam.0 & 0xFFFF) as u32 == WA_INACTIVE,
            WM_ACTIVATEAPP => cwp.wParam.0 == 0,
            _ => false,
        };
        if deactivated {
            dispatch(AppEvent::Deactivated {
                window: window_id(cwp.hwnd),
            });
        }
    }
    CallNextHookEx(None, code, wparam, lparam)
}

/// Install both hooks. Calling this twice without `uninstall` is a bug in
/// the caller; the manager's router slot prevents it.
pub fn install() -> Result<(), AttachError> {
    HOOKS.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(AttachError("hooks already installed".into()));
        }
        unsafe {
            let thread = GetCurrentThreadId();
            let get_message = SetWindowsHookExW(WH_GETMESSAGE, Some(get_message_proc), None, thread)
                .map_err(|e| AttachError(format!("WH_GETMESSAGE: {e}")))?;
            let call_wnd_proc = match SetWindowsHookExW(WH_CALLWNDPROC, Some(call_wnd_hook_proc), None, thread) {
                Ok(hook) => hook,
                Err(e) => {
                    let _ = UnhookWindowsHookEx(get_message);
                    return Err(AttachError(format!("WH_CALLWNDPROC: {e}")));
                }
            };
            *slot = Some(Hooks {
                get_message,
                call_wnd_proc,
            });
        }
        log::debug!("event router hooks installed");
        Ok(())
    })
}

/// Remove both hooks and drop anything still queued
pub fn uninstall() {
    let hooks = HOOKS.with(|slot| slot.borrow_mut().take());
    if let Some(hooks) = hooks {
        unsafe {
            let _ = UnhookWindowsHookEx(hooks.get_message);
            let _ = UnhookWindowsHookEx(hooks.call_wnd_proc);
        }
        log::debug!("event router hooks removed");
    }
    PENDING.with(|queue| queue.borrow_mut().clear());
}
