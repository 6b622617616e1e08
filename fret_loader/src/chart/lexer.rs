use std::str::Lines;

use fret_schema::Tick;

/// Largest tick magnitude a record can carry. Larger values are clamped, which keeps
/// tick and row arithmetic in range for any resolution.
pub(crate) const MAX_TICK: Tick = 1 << 24;

/// Line reader shared by the section parsers. Tabs are removed before a line is split
/// on whitespace.
pub(crate) struct ChartReader<'a> {
    lines: Lines<'a>,
    line_no: usize,
}

impl<'a> ChartReader<'a> {
    /// A leading byte-order mark is dropped.
    pub(crate) fn new(src: &'a str) -> Self {
        let src = src.strip_prefix('\u{feff}').unwrap_or(src);
        Self {
            lines: src.lines(),
            line_no: 0,
        }
    }

    pub(crate) fn line_no(&self) -> usize {
        self.line_no
    }

    /// Next non-blank line as words, or `None` at end of input.
    pub(crate) fn next_words(&mut self) -> Option<Vec<String>> {
        loop {
            let raw = self.lines.next()?;
            self.line_no += 1;
            let words = line_words(raw);
            if !words.is_empty() {
                return Some(words);
            }
        }
    }

    /// Next line inside a section body. Returns `None` at the closing brace or end of input;
    /// an opening brace is skipped.
    pub(crate) fn next_section_line(&mut self) -> Option<Vec<String>> {
        loop {
            let words = self.next_words()?;
            if words[0].starts_with('{') {
                continue;
            }
            if words[0].starts_with('}') {
                return None;
            }
            return Some(words);
        }
    }

    /// Consumes a section body without interpreting it.
    pub(crate) fn skip_section(&mut self) {
        while self.next_section_line().is_some() {}
    }
}

pub(crate) fn line_words(line: &str) -> Vec<String> {
    let line: String = line.chars().filter(|c| *c != '\t').collect();
    line.split_whitespace().map(str::to_string).collect()
}

/// A `tick = TAG args...` data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record<'w> {
    pub(crate) tick: Tick,
    pub(crate) tag: &'w str,
    pub(crate) args: &'w [String],
}

impl<'w> Record<'w> {
    pub(crate) fn from_words(words: &'w [String]) -> Self {
        Self {
            tick: words.first().map(|w| parse_tick(w)).unwrap_or(0),
            tag: words.get(2).map(String::as_str).unwrap_or(""),
            args: words.get(3..).unwrap_or(&[]),
        }
    }

    pub(crate) fn arg(&self, i: usize) -> Option<&'w str> {
        self.args.get(i).map(String::as_str)
    }

    /// Integer argument, or `default` when absent. Present but garbled values read as 0;
    /// values are clamped like ticks.
    pub(crate) fn int_arg(&self, i: usize, default: i64) -> i64 {
        self.arg(i).map(parse_tick).unwrap_or(default)
    }
}

/// Parses a leading optionally-signed run of digits. Anything else reads as 0.
pub(crate) fn parse_lenient_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative {
        -value
    } else {
        value
    }
}

/// `parse_lenient_int` clamped to `±MAX_TICK`.
pub(crate) fn parse_tick(s: &str) -> Tick {
    parse_lenient_int(s).clamp(-MAX_TICK, MAX_TICK)
}

/// Parses the longest numeric prefix as a float. Anything else reads as 0.
pub(crate) fn parse_lenient_float(s: &str) -> f64 {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    s[..end].parse().unwrap_or(0.0)
}

/// Re-joins the words of a value that the whitespace split broke apart, then drops one
/// pair of surrounding quotes.
pub(crate) fn joined_value(words: &[String]) -> String {
    let joined = words.join(" ");
    unquote(&joined).to_string()
}

pub(crate) fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}
