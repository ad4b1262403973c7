// Link navigation through the Windows shell

use clicktip_shared::opener::{is_navigable, SystemOpener};
use clicktip_shared::LinkOpener;
use windows::core::PCWSTR;
use windows::Win32::UI::Shell::ShellExecuteW;
use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

/// Opens activated links with the default handler for their scheme
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellOpener;

impl LinkOpener for ShellOpener {
    fn open(&self, target: &str) {
        if !is_navigable(target) {
            log::warn!("refusing to open link target {target:?}");
            return;
        }

        let url_wide: Vec<u16> = target.encode_utf16().chain(std::iter::once(0)).collect();
        let verb: Vec<u16> = "open\0".encode_utf16().collect();
        let result = unsafe {
            ShellExecuteW(
                None,
                PCWSTR(verb.as_ptr()),
                PCWSTR(url_wide.as_ptr()),
                None,
                None,
                SW_SHOWNORMAL,
            )
        };

        // Values above 32 mean success
        if result.0 as isize > 32 {
            log::info!("opened {target}");
        } else {
            log::warn!("ShellExecuteW failed for {target}, trying the command line");
            SystemOpener.open(target);
        }
    }
}
