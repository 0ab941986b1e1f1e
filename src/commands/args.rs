//! Parsers for free-text command arguments.
//!
//! Each parser returns `None` for input it does not recognize; the caller
//! turns that into a user-facing rejection and leaves the setting alone.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::color::{Color, Tolerance};

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#?([0-9a-fA-F]{6})$").unwrap());

/// Tri-state switch parse: `Some(true)`, `Some(false)`, or `None` when the
/// word is not a recognized switch.
pub fn parse_flag(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "enable" | "enabled" | "1" => Some(true),
        "false" | "no" | "off" | "disable" | "disabled" | "0" => Some(false),
        _ => None,
    }
}

/// Non-negative whole seconds.
pub fn parse_seconds(word: &str) -> Option<u64> {
    word.trim().parse().ok()
}

pub fn parse_offset(word: &str) -> Option<i64> {
    word.trim().parse().ok()
}

pub fn parse_tolerance(word: &str) -> Option<Tolerance> {
    word.trim().parse::<f64>().ok().and_then(Tolerance::new)
}

/// A color written as `#rrggbb`, `rrggbb`, `r g b` or `r,g,b`.
pub fn parse_color(words: &[&str]) -> Option<Color> {
    let joined = words.join(" ");
    if let Some(hex) = HEX_COLOR.captures(joined.trim()) {
        return u32::from_str_radix(&hex[1], 16).ok().map(Color::from_u32);
    }

    let channels: Vec<u8> = joined
        .replace(',', " ")
        .split_whitespace()
        .map(str::parse::<u8>)
        .collect::<Result<_, _>>()
        .ok()?;
    match channels.as_slice() {
        &[r, g, b] => Some(Color::new(r, g, b)),
        _ => None,
    }
}

/// Split an optional trailing tolerance off `words`.
///
/// The last word counts as a tolerance only when it is a number and the
/// words before it still satisfy `head_ok`. Returns the head words and the
/// raw tolerance word.
pub fn split_tolerance<'a>(
    words: &'a [&'a str],
    head_ok: impl Fn(&[&str]) -> bool,
) -> (&'a [&'a str], Option<&'a str>) {
    if let Some((last, head)) = words.split_last() {
        if !head.is_empty() && last.parse::<f64>().is_ok() && head_ok(head) {
            return (head, Some(*last));
        }
    }
    (words, None)
}
