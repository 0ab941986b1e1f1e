//! File naming for per-community records.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::GuildId;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").unwrap());

const MAX_NAME_PART: usize = 32;

/// Deterministic, file-safe key for a community.
///
/// The id prefix keeps keys unique; the sanitized display name keeps the
/// data directory readable. Runs of unsafe characters collapse to `_` and
/// the name part is truncated to 32 characters.
pub fn guild_key(id: GuildId, display_name: &str) -> String {
    let sanitized = UNSAFE_CHARS.replace_all(display_name.trim(), "_");
    let name: String = sanitized.chars().take(MAX_NAME_PART).collect();
    let name = name.trim_matches('_');
    if name.is_empty() {
        id.to_string()
    } else {
        format!("{}_{}", id, name)
    }
}

/// `<dir>/<stem>.json`
pub fn record_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}.json"))
}

/// Archive name for the `attempt`-th try: `<stem>_old.json`, then
/// `<stem>_old1.json`, `<stem>_old2.json`, ...
pub fn archive_path(dir: &Path, stem: &str, attempt: usize) -> PathBuf {
    if attempt == 0 {
        dir.join(format!("{stem}_old.json"))
    } else {
        dir.join(format!("{stem}_old{attempt}.json"))
    }
}
