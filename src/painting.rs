// GDI rendering for the tooltip surface and the demo host

use clicktip_shared::layout::{TextLayout, TextMeasure};
use clicktip_shared::markup::SpanStyle;
use clicktip_shared::Size;
use std::cell::OnceCell;
use windows::core::w;
use windows::Win32::Foundation::{COLORREF, HWND, RECT};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::UI::Controls::{
    CloseThemeData, DrawThemeBackground, GetThemeBackgroundRegion, OpenThemeData, HTHEME,
};
use windows::Win32::UI::WindowsAndMessaging::SetWindowRgn;

// vsstyle.h: TOOLTIP class, TTP_STANDARD part, TTSS_NORMAL state
const TTP_STANDARD: i32 = 1;
const TTSS_NORMAL: i32 = 1;

/// Hyperlink blue (#0066CC)
pub const CLR_LINK: COLORREF = COLORREF(0x00CC6600);

pub const FONT_SIZE: i32 = -12;
pub const FONT_NAME: &str = "Segoe UI";

// ── Helpers ──────────────────────────────────────────────────────────────────

fn create_font(size: i32, style: SpanStyle, underline: bool, family: &str) -> HFONT {
    let face: Vec<u16> = family.encode_utf16().chain(std::iter::once(0)).collect();
    unsafe {
        let mut lf = LOGFONTW {
            lfHeight: size,
            lfWeight: if style.bold { FW_BOLD.0 as i32 } else { FW_NORMAL.0 as i32 },
            lfItalic: style.italic as u8,
            lfUnderline: underline as u8,
            lfQuality: CLEARTYPE_QUALITY,
            lfCharSet: DEFAULT_CHARSET,
            ..Default::default()
        };
        let len = face.len().min(32);
        lf.lfFaceName[..len].copy_from_slice(&face[..len]);
        CreateFontIndirectW(&lf)
    }
}

pub fn fill_rect_color(hdc: HDC, r: &RECT, color: COLORREF) {
    unsafe {
        let brush = CreateSolidBrush(color);
        FillRect(hdc, r, brush);
        let _ = DeleteObject(HGDIOBJ::from(brush));
    }
}

pub fn draw_rounded_rect(hdc: HDC, r: &RECT, radius: i32, fill: COLORREF, border: COLORREF) {
    unsafe {
        let fill_brush = CreateSolidBrush(fill);
        let border_pen = CreatePen(PS_SOLID, 1, border);
        let old_brush = SelectObject(hdc, HGDIOBJ::from(fill_brush));
        let old_pen = SelectObject(hdc, HGDIOBJ::from(border_pen));
        let _ = RoundRect(hdc, r.left, r.top, r.right, r.bottom, radius, radius);
        SelectObject(hdc, old_pen);
        SelectObject(hdc, old_brush);
        let _ = DeleteObject(HGDIOBJ::from(fill_brush));
        let _ = DeleteObject(HGDIOBJ::from(border_pen));
    }
}

pub fn draw_text_simple(hdc: HDC, text: &str, x: i32, y: i32, color: COLORREF, font: HFONT) {
    unsafe {
        let old_font = SelectObject(hdc, HGDIOBJ::from(font));
        SetTextColor(hdc, color);
        SetBkMode(hdc, TRANSPARENT);
        let wide: Vec<u16> = text.encode_utf16().collect();
        let _ = TextOutW(hdc, x, y, &wide);
        SelectObject(hdc, old_font);
    }
}

fn measure_text(hdc: HDC, text: &str, font: HFONT) -> (i32, i32) {
    unsafe {
        let old_font = SelectObject(hdc, HGDIOBJ::from(font));
        let wide: Vec<u16> = text.encode_utf16().collect();
        let mut size = windows::Win32::Foundation::SIZE::default();
        let _ = GetTextExtentPoint32W(hdc, &wide, &mut size);
        SelectObject(hdc, old_font);
        (size.cx, size.cy)
    }
}

// ── Font cache ──────────────────────────────────────────────────────────────

/// Every style/underline combination the tooltip can draw. Created once per
/// UI thread and released when the thread ends.
pub struct Fonts {
    fonts: [HFONT; 8],
}

thread_local! {
    static FONTS: OnceCell<Fonts> = const { OnceCell::new() };
}

impl Fonts {
    fn create() -> Self {
        let mut fonts = [HFONT::default(); 8];
        for (i, font) in fonts.iter_mut().enumerate() {
            let style = SpanStyle {
                bold: i & 1 != 0,
                italic: i & 2 != 0,
            };
            *font = create_font(FONT_SIZE, style, i & 4 != 0, FONT_NAME);
        }
        Self { fonts }
    }

    /// Run `f` with this thread's fonts, creating them on first use
    pub fn with<R>(f: impl FnOnce(&Fonts) -> R) -> R {
        FONTS.with(|cell| f(cell.get_or_init(Fonts::create)))
    }

    pub fn get(&self, style: SpanStyle, underline: bool) -> HFONT {
        let i = style.bold as usize | (style.italic as usize) << 1 | (underline as usize) << 2;
        self.fonts[i]
    }

    pub fn regular(&self) -> HFONT {
        self.fonts[0]
    }
}

impl Drop for Fonts {
    fn drop(&mut self) {
        for font in self.fonts {
            unsafe {
                let _ = DeleteObject(HGDIOBJ::from(font));
            }
        }
    }
}

/// `TextMeasure` backed by a device context
pub struct GdiMeasure<'a> {
    pub hdc: HDC,
    pub fonts: &'a Fonts,
}

impl TextMeasure for GdiMeasure<'_> {
    fn measure(&self, text: &str, style: SpanStyle) -> Size {
        let (w, h) = measure_text(self.hdc, text, self.fonts.get(style, false));
        Size::new(w, h)
    }
}

// ── Tooltip surface ─────────────────────────────────────────────────────────

fn open_tooltip_theme(hwnd: HWND) -> Option<HTHEME> {
    let theme = unsafe { OpenThemeData(Some(hwnd), w!("TOOLTIP")) };
    if theme.is_invalid() {
        None
    } else {
        Some(theme)
    }
}

/// Shape the window like the themed tooltip background. Called on every
/// resize; falls back to a plain rectangle when theming is off.
pub fn apply_tooltip_region(hwnd: HWND, width: i32, height: i32) {
    let rect = RECT {
        left: 0,
        top: 0,
        right: width,
        bottom: height,
    };
    unsafe {
        let region = open_tooltip_theme(hwnd).and_then(|theme| {
            let region = GetThemeBackgroundRegion(theme, None, TTP_STANDARD, TTSS_NORMAL, &rect);
            let _ = CloseThemeData(theme);
            region.ok()
        });
        // The window owns the region after this call
        let _ = SetWindowRgn(hwnd, region, true);
    }
}

/// Paint the tooltip background and the laid-out text
pub fn paint_tooltip(hdc: HDC, hwnd: HWND, client: &RECT, layout: &TextLayout, padding: i32) {
    unsafe {
        match open_tooltip_theme(hwnd) {
            Some(theme) => {
                let _ = DrawThemeBackground(theme, hdc, TTP_STANDARD, TTSS_NORMAL, client, None);
                let _ = CloseThemeData(theme);
            }
            None => {
                FillRect(hdc, client, GetSysColorBrush(COLOR_INFOBK));
                let frame = CreateSolidBrush(COLORREF(GetSysColor(COLOR_INFOTEXT)));
                FrameRect(hdc, client, frame);
                let _ = DeleteObject(HGDIOBJ::from(frame));
            }
        }

        let text_color = COLORREF(GetSysColor(COLOR_INFOTEXT));
        Fonts::with(|fonts| {
            for run in &layout.runs {
                let (color, underline) = match run.link {
                    Some(_) => (CLR_LINK, true),
                    None => (text_color, false),
                };
                draw_text_simple(
                    hdc,
                    &run.text,
                    padding + run.rect.x,
                    padding + run.rect.y,
                    color,
                    fonts.get(run.style, underline),
                );
            }
        });
    }
}
