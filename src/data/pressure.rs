//! Atmospheric pressure grid.

use crate::domain::PT_KNOTS;

/// Levels for a clear atmosphere.
pub const CLEAR_LEVELS: usize = 180;
/// Levels for a cloudy atmosphere (refined around the cloud decks).
pub const CLOUDY_LEVELS: usize = 1440;
/// Levels handed to the radiative transfer in either case.
pub const RADTRANS_LEVELS: usize = 60;

const LOG_P_TOP: f64 = -6.0;
const LOG_P_BOTTOM: f64 = 3.0;

/// Log-spaced pressures (bar) from the top to the bottom of the atmosphere.
///
/// The temperature profile is evaluated on every level; the radiative
/// transfer only sees every `stride`-th level.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureGrid {
    levels: Vec<f64>,
    stride: usize,
}

impl PressureGrid {
    pub fn for_atmosphere(cloudy: bool) -> Self {
        let n = if cloudy { CLOUDY_LEVELS } else { CLEAR_LEVELS };
        Self {
            levels: log_space(LOG_P_TOP, LOG_P_BOTTOM, n),
            stride: n / RADTRANS_LEVELS,
        }
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn top(&self) -> f64 {
        self.levels[0]
    }

    pub fn bottom(&self) -> f64 {
        self.levels[self.levels.len() - 1]
    }

    /// Pressures seen by the radiative transfer.
    pub fn radtrans_levels(&self) -> Vec<f64> {
        self.subsample(&self.levels)
    }

    /// Take every `stride`-th value of a per-level quantity.
    pub fn subsample(&self, values: &[f64]) -> Vec<f64> {
        values.iter().step_by(self.stride).copied().collect()
    }

    /// Knot pressures of the `free` and `monotonic` profiles.
    pub fn knot_pressures(&self) -> Vec<f64> {
        log_space(self.top().log10(), self.bottom().log10(), PT_KNOTS)
    }
}

/// `steps` points evenly spaced in log10 between `10^log_min` and `10^log_max` (inclusive).
pub fn log_space(log_min: f64, log_max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![10f64.powf(log_min)],
        _ => {
            let step = (log_max - log_min) / (steps as f64 - 1.0);
            (0..steps)
                .map(|i| 10f64.powf(log_min + step * i as f64))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_grids_hand_sixty_levels_to_radtrans() {
        for cloudy in [false, true] {
            let grid = PressureGrid::for_atmosphere(cloudy);
            assert_eq!(grid.radtrans_levels().len(), RADTRANS_LEVELS);
            assert!((grid.top() - 1e-6).abs() < 1e-18);
            assert!((grid.bottom() - 1e3).abs() < 1e-9);
        }
        assert_eq!(PressureGrid::for_atmosphere(false).stride(), 3);
        assert_eq!(PressureGrid::for_atmosphere(true).stride(), 24);
    }

    #[test]
    fn knots_span_the_grid() {
        let grid = PressureGrid::for_atmosphere(false);
        let knots = grid.knot_pressures();
        assert_eq!(knots.len(), PT_KNOTS);
        assert!((knots[0] - grid.top()).abs() < 1e-18);
        assert!((knots[PT_KNOTS - 1] - grid.bottom()).abs() < 1e-9);
        assert!(knots.windows(2).all(|w| w[1] > w[0]));
    }
}
