// Tooltip markup: plain text with a small subset of inline HTML.
//
// Recognised: <a href=..>, <b>/<strong>, <i>/<em>, <br>, </p>, newlines and
// the common character entities. Anything else is dropped with its text kept.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text {
        text: String,
        style: SpanStyle,
        /// Index into [`RichText::links`]
        link: Option<usize>,
    },
    LineBreak,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    fragments: Vec<Fragment>,
    links: Vec<String>,
}

impl RichText {
    pub fn parse(source: &str) -> Self {
        Parser::default().run(source)
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub fn link_target(&self, index: usize) -> Option<&str> {
        self.links.get(index).map(String::as_str)
    }

    /// Text content with markup stripped
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Text { text, .. } => out.push_str(text),
                Fragment::LineBreak => out.push('\n'),
            }
        }
        out
    }

    /// Nothing visible to show
    pub fn is_blank(&self) -> bool {
        self.fragments.iter().all(|f| match f {
            Fragment::Text { text, .. } => text.trim().is_empty(),
            Fragment::LineBreak => true,
        })
    }
}

#[derive(Default)]
struct Parser {
    out: RichText,
    bold: u32,
    italic: u32,
    link: Option<usize>,
}

impl Parser {
    fn run(mut self, source: &str) -> RichText {
        let mut rest = source;
        while let Some(lt) = rest.find('<') {
            self.text(&rest[..lt]);
            let after = &rest[lt + 1..];
            match after.find('>') {
                Some(gt) => {
                    self.tag(&after[..gt]);
                    rest = &after[gt + 1..];
                }
                None => {
                    // Unterminated tag, keep it as literal text
                    self.text(&rest[lt..]);
                    rest = "";
                }
            }
        }
        self.text(rest);
        self.out
    }

    fn style(&self) -> SpanStyle {
        SpanStyle {
            bold: self.bold > 0,
            italic: self.italic > 0,
        }
    }

    fn text(&mut self, raw: &str) {
        for (i, line) in raw.split('\n').enumerate() {
            if i > 0 {
                self.out.fragments.push(Fragment::LineBreak);
            }
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                continue;
            }
            self.push_text(decode_entities(line));
        }
    }

    fn push_text(&mut self, text: String) {
        let style = self.style();
        let link = self.link;
        if let Some(Fragment::Text {
            text: prev,
            style: prev_style,
            link: prev_link,
        }) = self.out.fragments.last_mut()
        {
            if *prev_style == style && *prev_link == link {
                prev.push_str(&text);
                return;
            }
        }
        self.out.fragments.push(Fragment::Text { text, style, link });
    }

    fn tag(&mut self, body: &str) {
        let body = body.trim();
        let (closing, body) = match body.strip_prefix('/') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, body),
        };
        let body = body.trim_end_matches('/').trim_end();
        let name_end = body
            .find(|c: char| c.is_whitespace())
            .unwrap_or(body.len());
        let name = body[..name_end].to_ascii_lowercase();
        let attrs = &body[name_end..];

        match (name.as_str(), closing) {
            ("a", false) => {
                self.link = href(attrs).map(|target| {
                    self.out.links.push(target);
                    self.out.links.len() - 1
                });
            }
            ("a", true) => self.link = None,
            ("b" | "strong", false) => self.bold += 1,
            ("b" | "strong", true) => self.bold = self.bold.saturating_sub(1),
            ("i" | "em", false) => self.italic += 1,
            ("i" | "em", true) => self.italic = self.italic.saturating_sub(1),
            ("br", _) | ("p", true) => self.out.fragments.push(Fragment::LineBreak),
            _ => {}
        }
    }
}

/// Extract the href attribute value, quoted or bare
fn href(attrs: &str) -> Option<String> {
    let lower = attrs.to_ascii_lowercase();
    let mut search = 0;
    while let Some(found) = lower[search..].find("href") {
        let start = search + found;
        search = start + 4;
        let preceded_ok = start == 0
            || lower[..start]
                .chars()
                .next_back()
                .is_some_and(char::is_whitespace);
        let rest = attrs[search..].trim_start();
        if !preceded_ok || !rest.starts_with('=') {
            continue;
        }
        let value = rest[1..].trim_start();
        let raw = match value.chars().next() {
            Some(q @ ('\'' | '"')) => {
                let inner = &value[1..];
                &inner[..inner.find(q).unwrap_or(inner.len())]
            }
            Some(_) => &value[..value.find(char::is_whitespace).unwrap_or(value.len())],
            None => return None,
        };
        return Some(decode_entities(raw));
    }
    None
}

fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
