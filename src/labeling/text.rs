use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::feature::Feature;
use crate::canvas::LabelCanvas;
use crate::config::LabelingConfig;
use crate::error::{LabelError, Result};
use crate::style::LabelFont;
use crate::text_metrics::TextSize;

static COLUMN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]]+)\]").unwrap());
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<prefix>[^#0,.]*)(?P<int>[#0,]*[#0])(?:\.(?P<frac>[#0]+))?(?P<suffix>[^#0]*)$")
        .unwrap()
});

const DATE_TIME_INPUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];
const DATE_INPUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Label text for a feature, or `None` when the feature has nothing to show.
///
/// `text_column` is either a column name or a template with `[column]`
/// placeholders; unknown placeholders expand to nothing. Numeric and date
/// patterns apply to the resolved text and fail loudly on a mismatch.
pub fn resolve_label_text(feature: &Feature, config: &LabelingConfig) -> Result<Option<String>> {
    let column = config.text_column.as_str();
    let raw = if COLUMN_RE.is_match(column) {
        COLUMN_RE
            .replace_all(column, |caps: &regex::Captures<'_>| {
                feature.column(caps[1].trim()).unwrap_or_default().to_string()
            })
            .into_owned()
    } else {
        match feature.column(column) {
            Some(value) => value.to_string(),
            None => return Ok(None),
        }
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let mut text = raw;
    if let Some(pattern) = config.numeric_format.as_deref() {
        text = format_numeric(&text, pattern)?;
    }
    if let Some(pattern) = config.date_format.as_deref() {
        text = format_date(&text, pattern)?;
    }
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(text))
}

/// Formats `value` with a pattern such as `#,##0.00` or `0.0 km`. A `,` in
/// the integer part turns on thousands grouping; the digits after `.` give
/// the number of decimals.
pub fn format_numeric(value: &str, pattern: &str) -> Result<String> {
    let fail = || LabelError::NumericFormat {
        value: value.to_string(),
        pattern: pattern.to_string(),
    };
    let caps = NUMERIC_RE.captures(pattern).ok_or_else(fail)?;
    let number: f64 = value.trim().parse().map_err(|_| fail())?;
    if !number.is_finite() {
        return Err(fail());
    }
    let grouped = caps["int"].contains(',');
    let decimals = caps.name("frac").map_or(0, |m| m.as_str().len());

    let formatted = format!("{:.*}", decimals, number.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };
    let mut out = String::new();
    out.push_str(&caps["prefix"]);
    let negative = number < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    if negative {
        out.push('-');
    }
    if grouped {
        out.push_str(&group_thousands(int_part));
    } else {
        out.push_str(int_part);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out.push_str(&caps["suffix"]);
    Ok(out)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Reformats a date or date-time value with a `strftime` pattern.
pub fn format_date(value: &str, pattern: &str) -> Result<String> {
    let fail = || LabelError::DateFormat {
        value: value.to_string(),
        pattern: pattern.to_string(),
    };
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(fail());
    }
    let trimmed = value.trim();
    let mut out = String::new();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        write!(out, "{}", dt.format(pattern)).map_err(|_| fail())?;
        return Ok(out);
    }
    let naive = DATE_TIME_INPUTS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_INPUTS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(fail)?;
    // Offset specifiers have nothing to format on a naive value and error here.
    write!(out, "{}", naive.format(pattern)).map_err(|_| fail())?;
    Ok(out)
}

/// Greedy word wrap: words are added to a line until the measured width
/// would pass `max_width`. A single word wider than the limit keeps its own
/// line.
pub fn wrap_text(
    text: &str,
    max_width: f64,
    mut measure: impl FnMut(&str) -> TextSize,
) -> Vec<String> {
    if measure(text).width <= max_width {
        return vec![text.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if measure(&candidate).width > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(word);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Text sizes measured during one draw pass, keyed by text and font.
///
/// Created at the start of a pass and dropped at its end, so canvas or font
/// changes between passes are always picked up.
#[derive(Debug, Default)]
pub struct MeasureCache {
    sizes: HashMap<(String, String), TextSize>,
}

impl MeasureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn measure(&mut self, canvas: &mut dyn LabelCanvas, text: &str, font: &LabelFont) -> TextSize {
        let key = (text.to_string(), font.cache_key());
        if let Some(size) = self.sizes.get(&key) {
            return *size;
        }
        let size = canvas.measure_text(text, font);
        self.sizes.insert(key, size);
        size
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn clear(&mut self) {
        self.sizes.clear();
    }
}
