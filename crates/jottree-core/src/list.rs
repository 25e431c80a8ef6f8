//! List marker classification and list bookkeeping.
//!
//! List items arrive as `+list_item` / `-list_item` pairs with no enclosing
//! list event. Consecutive items whose markers share a style form one list.
//! A marker such as `i.` fits both the alphabetic and the roman style, so a
//! list carries the set of styles still consistent with every marker seen.

use crate::ast::ListKind;
use crate::error::NumeralError;
use crate::numeral::get_list_start;

const BULLETS: [&str; 3] = ["-", "*", "+"];

/// State of a list container while its items are being collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListData {
    /// Candidate styles consistent with every marker so far.
    pub styles: Vec<String>,
    /// Marker text of the first item.
    pub marker: String,
    pub tight: bool,
    /// A blank line was seen since the last item closed.
    pub blank_pending: bool,
}

impl ListData {
    /// Start a list whose first item has `marker`, already classified into
    /// `styles` by [`marker_styles`].
    pub fn new(marker: &str, styles: Vec<String>) -> Self {
        Self {
            styles,
            marker: marker.trim().to_string(),
            tight: true,
            blank_pending: false,
        }
    }

    /// Narrow the candidate styles to those shared with `styles`.
    ///
    /// Returns `false`, leaving the list untouched, when nothing is shared
    /// and the item must start a new list.
    pub fn continue_with(&mut self, styles: &[String]) -> bool {
        let shared: Vec<String> = self
            .styles
            .iter()
            .filter(|s| styles.contains(*s))
            .cloned()
            .collect();
        if shared.is_empty() {
            return false;
        }
        self.styles = shared;
        if self.blank_pending {
            self.tight = false;
            self.blank_pending = false;
        }
        true
    }

    /// Pick the final style, kind and start number.
    ///
    /// `has_checkbox` tells whether the first item carried a checkbox.
    pub fn resolve(
        &self,
        has_checkbox: bool,
    ) -> Result<(ListKind, String, Option<i64>), NumeralError> {
        let style = resolve_style(&self.styles, &self.marker);
        if BULLETS.contains(&style.as_str()) {
            let kind = if has_checkbox {
                ListKind::Task
            } else {
                ListKind::Bullet
            };
            return Ok((kind, style, None));
        }
        match get_list_start(&self.marker, &style)? {
            Some(start) => Ok((ListKind::Ordered, style, Some(start))),
            None if is_ordered_style(&style) => Ok((ListKind::Ordered, style, None)),
            None => Ok((ListKind::Bullet, style, None)),
        }
    }
}

/// State of a list item container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemData {
    pub checkbox: Option<bool>,
    /// A blank line was seen since the item's last child.
    pub blank_pending: bool,
    /// A blank line separated two of the item's children.
    pub loose: bool,
}

fn strip_decoration(s: &str) -> &str {
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        inner
    } else if let Some(inner) = s.strip_suffix('.').or_else(|| s.strip_suffix(')')) {
        inner
    } else {
        s
    }
}

fn is_roman_digit(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'i' | 'v' | 'x' | 'l' | 'c' | 'd' | 'm')
}

fn is_ordered_style(style: &str) -> bool {
    matches!(strip_decoration(style), "1" | "a" | "A" | "i" | "I")
}

fn core_styles(core: &str) -> Vec<&'static str> {
    if core.is_empty() {
        return Vec::new();
    }
    if core.bytes().all(|b| b.is_ascii_digit()) {
        return vec!["1"];
    }

    let (alpha, roman) = if core.chars().all(|c| c.is_ascii_lowercase()) {
        ("a", "i")
    } else if core.chars().all(|c| c.is_ascii_uppercase()) {
        ("A", "I")
    } else {
        return Vec::new();
    };
    let single = core.chars().count() == 1;
    let all_roman = core.chars().all(is_roman_digit);

    match (single, all_roman) {
        (true, true) => vec![alpha, roman],
        (true, false) => vec![alpha],
        (false, true) => vec![roman],
        (false, false) => Vec::new(),
    }
}

/// Candidate styles for a list marker.
///
/// Styles keep the marker's decoration: `3)` gives `1)`, `(b)` gives `(a)`.
/// A lone roman-digit letter is ambiguous and yields both readings.
///
/// ```rust
/// use jottree_core::list::marker_styles;
///
/// assert_eq!(marker_styles("-"), vec!["-"]);
/// assert_eq!(marker_styles("12."), vec!["1."]);
/// assert_eq!(marker_styles("(i)"), vec!["(a)", "(i)"]);
/// assert_eq!(marker_styles("iv)"), vec!["i)"]);
/// ```
pub fn marker_styles(marker: &str) -> Vec<String> {
    let marker = marker.trim();
    if BULLETS.contains(&marker) {
        return vec![marker.to_string()];
    }

    let core = strip_decoration(marker);
    let (open, close) = if marker.starts_with('(') && marker.ends_with(')') && marker.len() > 1 {
        ("(", ")")
    } else if marker.ends_with('.') {
        ("", ".")
    } else if marker.ends_with(')') {
        ("", ")")
    } else {
        ("", "")
    };

    let styles = core_styles(core);
    if styles.is_empty() {
        // Unrecognised markers form lists only with identical markers.
        return vec![marker.to_string()];
    }
    styles
        .into_iter()
        .map(|s| format!("{open}{s}{close}"))
        .collect()
}

/// Choose one style from the remaining candidates.
///
/// Ambiguous alphabetic/roman lists are read as roman only when the first
/// marker is `i` or `I`.
pub fn resolve_style(styles: &[String], first_marker: &str) -> String {
    if styles.len() <= 1 {
        return styles.first().cloned().unwrap_or_default();
    }
    let core = strip_decoration(first_marker);
    let prefer_roman = core == "i" || core == "I";
    styles
        .iter()
        .find(|s| matches!(strip_decoration(s), "i" | "I") == prefer_roman)
        .or_else(|| styles.first())
        .cloned()
        .unwrap_or_default()
}
