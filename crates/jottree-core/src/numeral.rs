//! Ordinal conversion for ordered-list markers.

use crate::error::NumeralError;

#[inline]
fn roman_digit(c: char) -> Option<i64> {
    match c.to_ascii_lowercase() {
        'i' => Some(1),
        'v' => Some(5),
        'x' => Some(10),
        'l' => Some(50),
        'c' => Some(100),
        'd' => Some(500),
        'm' => Some(1000),
        _ => None,
    }
}

/// Convert a roman numeral (either case) to its value.
///
/// Digits are read from last to first; a digit smaller than the one to its
/// right is subtracted, so `ix` is 9 and `xi` is 11.
///
/// ```rust
/// use jottree_core::numeral::roman_to_number;
///
/// assert_eq!(roman_to_number("mcmxciv").unwrap(), 1994);
/// assert!(roman_to_number("x1").is_err());
/// ```
pub fn roman_to_number(s: &str) -> Result<i64, NumeralError> {
    let mut total = 0i64;
    let mut prev = 0i64;
    for c in s.chars().rev() {
        let n = roman_digit(c).ok_or_else(|| NumeralError::InvalidCharacter {
            numeral: s.to_string(),
            ch: c,
        })?;
        if n < prev {
            total -= n;
        } else {
            total += n;
        }
        prev = n;
    }
    Ok(total)
}

#[inline]
fn strip_decoration(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '(' | ')' | '.')).collect()
}

fn leading_decimal(s: &str) -> Option<i64> {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}

fn letter_offset(s: &str, base: char) -> i64 {
    let first = s.chars().next().unwrap_or(base);
    i64::from(u32::from(first)) - i64::from(u32::from(base)) + 1
}

/// Determine the first ordinal of a list from its marker and style.
///
/// Parentheses and periods are stripped from both arguments before the style
/// token selects the numbering system. Unrecognised styles, and decimal
/// markers with no leading digits, yield `Ok(None)`; an invalid roman
/// numeral is an error.
///
/// ```rust
/// use jottree_core::numeral::get_list_start;
///
/// assert_eq!(get_list_start("iii", "i.").unwrap(), Some(3));
/// assert_eq!(get_list_start("(C)", "(A)").unwrap(), Some(3));
/// assert_eq!(get_list_start("x", "1)").unwrap(), None);
/// ```
pub fn get_list_start(marker: &str, style: &str) -> Result<Option<i64>, NumeralError> {
    let numtype = strip_decoration(style);
    let s = strip_decoration(marker);
    let start = match numtype.as_str() {
        "1" => leading_decimal(&s),
        "A" => Some(letter_offset(&s, 'A')),
        "a" => Some(letter_offset(&s, 'a')),
        "I" | "i" => Some(roman_to_number(&s)?),
        _ => None,
    };
    Ok(start)
}

