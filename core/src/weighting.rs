//! Weighted random selection shared by the spawn scheduler and the catch minigame.

use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

/// Total weight at or below which a table is treated as all-zero.
pub const WEIGHT_EPSILON: f32 = 1e-6;

/// Result of a weighted draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightedPick {
    /// Index of the selected entry.
    pub index: usize,
    /// Whether the table summed to roughly zero and a uniform draw was used.
    pub degraded: bool,
}

/// Draws an index with probability proportional to its weight.
///
/// Negative and non-finite weights count as zero. A zero-weight entry is
/// never selected unless every weight is roughly zero, in which case the draw
/// falls back to a uniform choice and reports itself as degraded. Returns
/// `None` for an empty table.
pub fn pick_weighted<R: Rng + ?Sized>(rng: &mut R, weights: &[f32]) -> Option<WeightedPick> {
    if weights.is_empty() {
        return None;
    }

    let sanitized: Vec<f32> = weights
        .iter()
        .map(|weight| {
            if weight.is_finite() && *weight > 0.0 {
                *weight
            } else {
                0.0
            }
        })
        .collect();
    let total: f32 = sanitized.iter().sum();

    if total > WEIGHT_EPSILON {
        if let Ok(distribution) = WeightedIndex::new(&sanitized) {
            return Some(WeightedPick {
                index: distribution.sample(rng),
                degraded: false,
            });
        }
    }

    Some(WeightedPick {
        index: rng.gen_range(0..weights.len()),
        degraded: true,
    })
}
