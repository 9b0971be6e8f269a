//! Position evaluation.

pub mod suicide;

use crate::board::board::Board;
use crate::board::chess_types::GameResult;

pub use suicide::SuicideEvaluator;

/// Variant evaluation seam.
pub trait Evaluator {
    /// Classify a finished position, or `Unknown` while the game is live.
    /// Win and loss are relative to the side to move.
    fn result(&self, board: &Board) -> GameResult;

    /// Heuristic score of the position for the side to move. May make and
    /// unmake moves internally; the board is returned unchanged.
    fn evaluate(&self, board: &mut Board) -> i32;
}
