// Prevents console window in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod logging;

#[cfg(windows)]
mod hooks;
#[cfg(windows)]
mod host;
#[cfg(windows)]
mod overlay;
#[cfg(windows)]
mod painting;
#[cfg(windows)]
mod platform;
#[cfg(windows)]
mod shell;

use clicktip_shared::{config, OverlayConfig};

/// Read the config and start logging with it. Problems reading the file are
/// only reported once the subscriber is up; a missing file is seeded with
/// the defaults so there is something to edit.
fn startup() -> OverlayConfig {
    let path = config::config_path();
    let loaded = path.exists().then(|| config::read_config(&path));
    let cfg = match &loaded {
        Some(Ok(cfg)) => cfg.clone(),
        _ => OverlayConfig::default(),
    };

    logging::init(cfg.debug_logging);
    match loaded {
        Some(Ok(_)) => log::info!("config from {}", path.display()),
        Some(Err(e)) => log::warn!("{e}; using defaults"),
        None => match config::save_config(&cfg) {
            Ok(()) => log::info!("wrote default config to {}", path.display()),
            Err(e) => log::warn!("{e}"),
        },
    }
    cfg
}

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, GetMessageW, TranslateMessage, MSG,
    };

    let cfg = startup();
    let hwnd = host::create_window(cfg)?;
    host::show_window(hwnd);

    // Message loop
    unsafe {
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    log::info!("exiting");
    Ok(())
}

#[cfg(not(windows))]
fn main() -> anyhow::Result<()> {
    startup();
    anyhow::bail!("the ClickTip demo host needs Windows")
}
