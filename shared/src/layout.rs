// Word-wrapped layout of tooltip text and link hit-testing

use crate::geometry::{Point, Rect, Size};
use crate::markup::{Fragment, RichText, SpanStyle};

/// Text measurement provided by the rendering backend
pub trait TextMeasure {
    /// Extent of `text` drawn in `style`
    fn measure(&self, text: &str, style: SpanStyle) -> Size;

    fn line_height(&self) -> i32 {
        self.measure("Ag", SpanStyle::default()).height
    }

    fn space_width(&self, style: SpanStyle) -> i32 {
        self.measure(" ", style).width
    }
}

/// One positioned word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    /// Relative to the top-left of the text block
    pub rect: Rect,
    pub style: SpanStyle,
    pub link: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextLayout {
    pub runs: Vec<Run>,
    pub size: Size,
}

impl TextLayout {
    /// Link under `p` (block-relative)
    pub fn link_at(&self, p: Point) -> Option<usize> {
        self.runs
            .iter()
            .find(|run| run.link.is_some() && run.rect.contains(p))
            .and_then(|run| run.link)
    }
}

/// Lay `text` out greedily, wrapping at `max_width`.
///
/// A word wider than `max_width` gets a line of its own and overflows it.
pub fn layout(text: &RichText, measure: &dyn TextMeasure, max_width: i32) -> TextLayout {
    let mut builder = LineBuilder {
        measure,
        max_width,
        line_height: measure.line_height(),
        x: 0,
        y: 0,
        widest: 0,
        pending_space: false,
        line_used: false,
        runs: Vec::new(),
    };

    for fragment in text.fragments() {
        match fragment {
            Fragment::Text { text, style, link } => builder.fragment(text, *style, *link),
            Fragment::LineBreak => builder.break_line(),
        }
    }

    let height = if builder.runs.is_empty() {
        0
    } else if builder.line_used {
        builder.y + builder.line_height
    } else {
        builder.y
    };
    TextLayout {
        size: Size::new(builder.widest, height),
        runs: builder.runs,
    }
}

struct LineBuilder<'a> {
    measure: &'a dyn TextMeasure,
    max_width: i32,
    line_height: i32,
    x: i32,
    y: i32,
    widest: i32,
    pending_space: bool,
    line_used: bool,
    runs: Vec<Run>,
}

impl LineBuilder<'_> {
    fn fragment(&mut self, text: &str, style: SpanStyle, link: Option<usize>) {
        // U+00A0 binds words together
        let is_gap = |c: char| c.is_whitespace() && c != '\u{a0}';
        let mut word_start: Option<usize> = None;
        for (i, c) in text.char_indices() {
            if is_gap(c) {
                if let Some(start) = word_start.take() {
                    self.word(&text[start..i], style, link);
                }
                self.pending_space = true;
            } else if word_start.is_none() {
                word_start = Some(i);
            }
        }
        if let Some(start) = word_start {
            self.word(&text[start..], style, link);
        }
    }

    fn word(&mut self, word: &str, style: SpanStyle, link: Option<usize>) {
        let extent = self.measure.measure(word, style);
        let mut gap = if self.pending_space && self.x > 0 {
            self.measure.space_width(style)
        } else {
            0
        };
        if self.x > 0 && self.x + gap + extent.width > self.max_width {
            self.y += self.line_height;
            self.x = 0;
            gap = 0;
        }
        let left = self.x + gap;
        self.runs.push(Run {
            text: word.to_string(),
            rect: Rect::new(left, self.y, extent.width, self.line_height),
            style,
            link,
        });
        self.x = left + extent.width;
        self.widest = self.widest.max(self.x);
        self.pending_space = false;
        self.line_used = true;
    }

    fn break_line(&mut self) {
        self.y += self.line_height;
        self.x = 0;
        self.pending_space = false;
        self.line_used = false;
    }
}

/// Pairs a press with its release so a link activates only when both land
/// on the same link
#[derive(Debug, Default)]
pub struct LinkTracker {
    pressed: Option<usize>,
}

impl LinkTracker {
    pub fn press(&mut self, link: Option<usize>) {
        self.pressed = link;
    }

    /// Returns the activated link, if any
    pub fn release(&mut self, link: Option<usize>) -> Option<usize> {
        match (self.pressed.take(), link) {
            (Some(pressed), Some(released)) if pressed == released => Some(pressed),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pressed = None;
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.is_some()
    }
}
