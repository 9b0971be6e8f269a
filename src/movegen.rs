//! Move generation.
//!
//! The search and EGTB layers consume generation through the
//! `MoveGenerator` trait so they stay independent of the variant rules.

pub mod attacks;
pub mod suicide;

use crate::board::board::Board;
use crate::board::moves::Move;

pub use suicide::SuicideMoveGenerator;

/// Variant move generation seam. Implementations observe the board but
/// never mutate it.
pub trait MoveGenerator {
    /// All legal moves for the side to move, in a deterministic emission
    /// order.
    fn generate(&self, board: &Board) -> Vec<Move>;

    /// Number of legal moves for the side to move.
    fn count_moves(&self, board: &Board) -> usize;

    /// Whether `mv` is legal in the current position.
    fn is_valid(&self, board: &Board, mv: Move) -> bool;
}
