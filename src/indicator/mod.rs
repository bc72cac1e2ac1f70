//! # Progress Indicator Module
//!
//! Animates the run's progress on the 8x8 LED matrix: a static Earth
//! image at the center, and a single white dot orbiting the rim through
//! 24 discrete positions.
//!
//! One `advance()` clears the previous rim cell and lights the next, a
//! closed ring that wraps after 24 steps. The indicator is advanced on
//! its own tick-count modulus and is entirely independent of whether the
//! same tick's sample succeeded.

use tracing::debug;

use crate::board::{LedMatrix, Rgb, MATRIX_CELLS};
use crate::error::Result;

/// Number of discrete orbit positions on the rim
pub const ORBIT_STEPS: usize = 24;

/// White dot marking the satellite
const SATELLITE: Rgb = (255, 255, 255);

const OFF: Rgb = (0, 0, 0);
const GREEN: Rgb = (0, 255, 0);
const BLUE: Rgb = (0, 0, 255);

/// Rim cells visited by the dot, in orbit order; one `advance()` moves
/// from `ORBIT_TRACK[i-1]` to `ORBIT_TRACK[i]`, wrapping at the end
const ORBIT_TRACK: [(usize, usize); ORBIT_STEPS] = [
    (7, 1), (6, 0), (5, 0), (4, 0), (3, 0), (2, 0), (1, 0), (0, 1),
    (0, 2), (0, 3), (0, 4), (0, 5), (0, 6), (1, 7), (2, 7), (3, 7),
    (4, 7), (5, 7), (6, 7), (7, 6), (7, 5), (7, 4), (7, 3), (7, 2),
];

/// Earth backdrop at the matrix center
#[rustfmt::skip]
const EARTH: [Rgb; MATRIX_CELLS] = {
    const O: Rgb = OFF;
    const G: Rgb = GREEN;
    const B: Rgb = BLUE;
    [
        O, O, O, O, O, O, O, O,
        O, O, O, O, O, O, O, O,
        O, O, O, B, B, O, O, O,
        O, O, B, G, B, G, O, O,
        O, O, G, B, G, B, O, O,
        O, O, O, G, B, O, O, O,
        O, O, O, O, O, O, O, O,
        O, O, O, O, O, O, O, O,
    ]
};

/// Orbit-progress indicator over an LED matrix
pub struct ProgressIndicator {
    matrix: Box<dyn LedMatrix>,
    index: usize,
}

impl ProgressIndicator {
    /// Draw the Earth backdrop and the dot at its initial rim position.
    pub fn new(mut matrix: Box<dyn LedMatrix>) -> Result<Self> {
        matrix.set_pixels(&EARTH)?;
        let (x, y) = ORBIT_TRACK[ORBIT_STEPS - 1];
        matrix.set_pixel(x, y, SATELLITE)?;
        debug!("progress indicator initialized");
        Ok(Self { matrix, index: 0 })
    }

    /// Current ring position; equals the number of advances mod 24
    pub fn index(&self) -> usize {
        self.index
    }

    /// Move the dot one step around the ring.
    pub fn advance(&mut self) -> Result<()> {
        let (prev_x, prev_y) = ORBIT_TRACK[(self.index + ORBIT_STEPS - 1) % ORBIT_STEPS];
        let (next_x, next_y) = ORBIT_TRACK[self.index];
        self.matrix.set_pixel(prev_x, prev_y, OFF)?;
        self.matrix.set_pixel(next_x, next_y, SATELLITE)?;
        self.index = (self.index + 1) % ORBIT_STEPS;
        Ok(())
    }

    /// Blank the matrix at session end.
    pub fn clear(&mut self) -> Result<()> {
        self.matrix.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::mocks::{MatrixOp, MockLedMatrix};

    fn indicator(mock: &MockLedMatrix) -> ProgressIndicator {
        ProgressIndicator::new(Box::new(mock.clone())).unwrap()
    }

    #[test]
    fn test_track_covers_the_rim_without_repeats() {
        assert_eq!(ORBIT_TRACK.len(), 24);
        for (x, y) in ORBIT_TRACK {
            assert!(x < 8 && y < 8);
            // Every track cell sits on the matrix rim
            assert!(x == 0 || x == 7 || y == 0 || y == 7, "({x},{y}) is not a rim cell");
        }
        let mut cells: Vec<_> = ORBIT_TRACK.to_vec();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), 24, "track cells must be distinct");
    }

    #[test]
    fn test_init_draws_backdrop_and_initial_dot() {
        let mock = MockLedMatrix::new();
        let _indicator = indicator(&mock);

        let ops = mock.recorded_ops();
        assert_eq!(ops[0], MatrixOp::SetAll);
        assert_eq!(ops[1], MatrixOp::SetPixel(7, 2, SATELLITE));
    }

    #[test]
    fn test_index_is_advances_mod_24() {
        let mock = MockLedMatrix::new();
        let mut indicator = indicator(&mock);

        for k in 1..=60 {
            indicator.advance().unwrap();
            assert_eq!(indicator.index(), k % ORBIT_STEPS);
        }
    }

    #[test]
    fn test_advance_touches_exactly_two_cells() {
        let mock = MockLedMatrix::new();
        let mut indicator = indicator(&mock);
        let before = mock.recorded_ops().len();

        indicator.advance().unwrap();

        let ops = mock.recorded_ops();
        assert_eq!(ops.len() - before, 2);
        // First advance clears the initial cell and lights the first track cell
        assert_eq!(ops[before], MatrixOp::SetPixel(7, 2, OFF));
        assert_eq!(ops[before + 1], MatrixOp::SetPixel(7, 1, SATELLITE));
    }

    #[test]
    fn test_full_ring_returns_to_initial_state() {
        let mock = MockLedMatrix::new();
        let mut indicator = indicator(&mock);

        for _ in 0..ORBIT_STEPS {
            indicator.advance().unwrap();
        }

        assert_eq!(indicator.index(), 0);
        // The 24th advance relights the initial cell
        let ops = mock.recorded_ops();
        assert_eq!(*ops.last().unwrap(), MatrixOp::SetPixel(7, 2, SATELLITE));
    }

    #[test]
    fn test_clear_blanks_the_matrix() {
        let mock = MockLedMatrix::new();
        let mut indicator = indicator(&mock);
        indicator.clear().unwrap();
        assert_eq!(*mock.recorded_ops().last().unwrap(), MatrixOp::Clear);
    }

    #[test]
    fn test_matrix_fault_surfaces_as_display_error() {
        let mock = MockLedMatrix::new();
        let mut indicator = indicator(&mock);
        mock.set_failing(true);
        assert!(indicator.advance().is_err());

        // Recovery on the next advance once the fault clears
        mock.set_failing(false);
        assert!(indicator.advance().is_ok());
    }
}
