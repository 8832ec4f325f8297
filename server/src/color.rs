//! Random color assignment for new users

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::PALETTE;
use std::sync::Mutex;

/// ANSI color code taken from [`PALETTE`]
pub type Color = &'static str;

/// Picks a palette color for each joining user
///
/// Colors are cosmetic. Two users may end up with the same one and nothing
/// is remembered between calls apart from the RNG position.
pub struct ColorAssigner {
    rng: Mutex<StdRng>,
}

impl ColorAssigner {
    /// Creates an assigner seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates an assigner with a fixed seed, for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Returns a color drawn uniformly from the palette
    pub fn assign(&self) -> Color {
        // A panic elsewhere cannot leave the RNG in a broken state
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        PALETTE[rng.gen_range(0..PALETTE.len())]
    }
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_assign_stays_in_palette() {
        let colors = ColorAssigner::new();
        for _ in 0..200 {
            assert!(PALETTE.contains(&colors.assign()));
        }
    }

    #[test]
    fn test_seeded_assigners_agree() {
        let a = ColorAssigner::with_seed(7);
        let b = ColorAssigner::with_seed(7);

        let first: Vec<Color> = (0..20).map(|_| a.assign()).collect();
        let second: Vec<Color> = (0..20).map(|_| b.assign()).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_every_color_is_reachable() {
        let colors = ColorAssigner::with_seed(42);
        let seen: HashSet<Color> = (0..500).map(|_| colors.assign()).collect();
        assert_eq!(seen.len(), PALETTE.len());
    }

    #[test]
    fn test_colors_repeat() {
        // Seven draws from six colors must repeat at least once
        let colors = ColorAssigner::with_seed(1);
        let drawn: Vec<Color> = (0..7).map(|_| colors.assign()).collect();
        let unique: HashSet<&Color> = drawn.iter().collect();
        assert!(unique.len() < drawn.len());
    }
}
