//! Blacklisted colors and their derived exclusion ranges.
//!
//! A blacklist entry is a base color plus a tolerance fraction. Each entry
//! derives one inclusive per-channel range
//! `[floor(c * (1 - tol)), ceil(c * (1 + tol))]`, clamped to `[0, 255]`.
//! [`Blacklist`] owns both the entries and the derived ranges and rebuilds the
//! ranges on every change, so the two never drift apart.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Color;

/// Guards `floor`/`ceil` against binary representation error, e.g.
/// `100 * (1 - 0.2)` landing a hair under 80.
const ROUNDING_GUARD: f64 = 1e-9;

/// A tolerance fraction strictly between 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Tolerance(f64);

impl Tolerance {
    /// Returns `None` unless `0 < value < 1`.
    pub fn new(value: f64) -> Option<Self> {
        (value > 0.0 && value < 1.0).then_some(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(0.1)
    }
}

impl TryFrom<f64> for Tolerance {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("tolerance {value} is outside (0, 1)"))
    }
}

impl From<Tolerance> for f64 {
    fn from(tolerance: Tolerance) -> Self {
        tolerance.0
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A blacklisted base color and how far around it sampling must stay away.
///
/// Persisted as `[[r, g, b], tolerance]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "([u8; 3], Tolerance)", into = "([u8; 3], Tolerance)")]
pub struct BlacklistEntry {
    pub color: Color,
    pub tolerance: Tolerance,
}

impl BlacklistEntry {
    pub fn new(color: Color, tolerance: Tolerance) -> Self {
        Self { color, tolerance }
    }

    /// The inclusive per-channel range this entry excludes.
    pub fn exclusion_range(&self) -> ExclusionRange {
        let tol = self.tolerance.get();
        let bound = |channel: u8| {
            let c = f64::from(channel);
            let lo = (c * (1.0 - tol) + ROUNDING_GUARD).floor().clamp(0.0, 255.0);
            let hi = (c * (1.0 + tol) - ROUNDING_GUARD).ceil().clamp(0.0, 255.0);
            (lo as u8, hi as u8)
        };
        let (r_lo, r_hi) = bound(self.color.r);
        let (g_lo, g_hi) = bound(self.color.g);
        let (b_lo, b_hi) = bound(self.color.b);
        ExclusionRange {
            low: [r_lo, g_lo, b_lo],
            high: [r_hi, g_hi, b_hi],
        }
    }
}

impl From<([u8; 3], Tolerance)> for BlacklistEntry {
    fn from((rgb, tolerance): ([u8; 3], Tolerance)) -> Self {
        Self::new(Color::from(rgb), tolerance)
    }
}

impl From<BlacklistEntry> for ([u8; 3], Tolerance) {
    fn from(entry: BlacklistEntry) -> Self {
        (entry.color.channels(), entry.tolerance)
    }
}

/// Inclusive bounds on all three channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionRange {
    pub low: [u8; 3],
    pub high: [u8; 3],
}

impl ExclusionRange {
    /// True when every channel of `color` lies within the bounds.
    pub fn contains(&self, color: Color) -> bool {
        color
            .channels()
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .all(|(c, (lo, hi))| lo <= c && c <= hi)
    }
}

impl fmt::Display for ExclusionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}) to ({}, {}, {})",
            self.low[0], self.low[1], self.low[2], self.high[0], self.high[1], self.high[2]
        )
    }
}

/// The ordered blacklist of a community with its cached exclusion ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<BlacklistEntry>", into = "Vec<BlacklistEntry>")]
pub struct Blacklist {
    entries: Vec<BlacklistEntry>,
    ranges: Vec<ExclusionRange>,
}

impl Blacklist {
    /// Build a blacklist and derive its ranges.
    pub fn new(entries: Vec<BlacklistEntry>) -> Self {
        let mut blacklist = Self {
            entries,
            ranges: Vec::new(),
        };
        blacklist.rebuild_ranges();
        blacklist
    }

    pub fn entries(&self) -> &[BlacklistEntry] {
        &self.entries
    }

    pub fn ranges(&self) -> &[ExclusionRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: BlacklistEntry) {
        self.entries.push(entry);
        self.rebuild_ranges();
    }

    /// Remove the entry at `index` (0-based).
    pub fn remove(&mut self, index: usize) -> Option<BlacklistEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(index);
        self.rebuild_ranges();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.rebuild_ranges();
    }

    /// Whether `color` falls inside any exclusion range.
    pub fn excludes(&self, color: Color) -> bool {
        self.ranges.iter().any(|range| range.contains(color))
    }

    fn rebuild_ranges(&mut self) {
        self.ranges = self.entries.iter().map(BlacklistEntry::exclusion_range).collect();
    }
}

impl From<Vec<BlacklistEntry>> for Blacklist {
    fn from(entries: Vec<BlacklistEntry>) -> Self {
        Self::new(entries)
    }
}

impl From<Blacklist> for Vec<BlacklistEntry> {
    fn from(blacklist: Blacklist) -> Self {
        blacklist.entries
    }
}
