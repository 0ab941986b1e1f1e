//! Constrained random color sampling.
//!
//! Whole triples are drawn uniformly and re-rolled when they land inside any
//! exclusion range. Rejection sampling is capped; past the cap a scan over
//! the full 24-bit space from a random start finds the first allowed color,
//! so a saturated blacklist yields `None` instead of spinning forever.

use rand::Rng;

use super::{Color, ExclusionRange};

/// Rejection attempts before falling back to a scan.
pub const MAX_REJECTION_ATTEMPTS: usize = 4096;

const COLOR_SPACE: u32 = 1 << 24;

/// Samples colors outside a set of exclusion ranges.
#[derive(Debug, Clone, Copy)]
pub struct ColorSampler {
    max_attempts: usize,
}

impl Default for ColorSampler {
    fn default() -> Self {
        Self {
            max_attempts: MAX_REJECTION_ATTEMPTS,
        }
    }
}

impl ColorSampler {
    /// Sampler giving up on rejection sampling after `max_attempts` draws.
    pub fn with_max_attempts(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    /// Draw a color outside every range in `ranges`.
    ///
    /// Returns `None` only when the ranges cover the whole color space.
    pub fn sample<R: Rng + ?Sized>(&self, ranges: &[ExclusionRange], rng: &mut R) -> Option<Color> {
        for _ in 0..self.max_attempts {
            let candidate = Color::new(rng.gen(), rng.gen(), rng.gen());
            if !is_excluded(ranges, candidate) {
                return Some(candidate);
            }
        }

        tracing::warn!(
            ranges = ranges.len(),
            attempts = self.max_attempts,
            "rejection sampling exhausted, scanning color space"
        );
        let start = rng.gen_range(0..COLOR_SPACE);
        (0..COLOR_SPACE)
            .map(|offset| Color::from_u32((start + offset) % COLOR_SPACE))
            .find(|candidate| !is_excluded(ranges, *candidate))
    }
}

/// Sample with the thread-local generator and default attempt cap.
pub fn sample_color(ranges: &[ExclusionRange]) -> Option<Color> {
    ColorSampler::default().sample(ranges, &mut rand::thread_rng())
}

fn is_excluded(ranges: &[ExclusionRange], color: Color) -> bool {
    ranges.iter().any(|range| range.contains(color))
}
