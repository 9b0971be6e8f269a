//! Move-stack entries for `Board::make` / `Board::unmake`.

use crate::board::chess_types::{CastlingRights, Piece, Square};
use crate::board::moves::Move;

/// One entry of the board's move stack.
///
/// Rights, en-passant target, and Zobrist key are the values *after* the
/// move was played, so the top of the stack always describes the current
/// position and unmaking is a pop plus piece restoration. The stack is
/// seeded with a sentinel entry describing the root position.
#[derive(Debug, Clone, Copy)]
pub struct HistoryEntry {
    pub mv: Move,
    pub captured: Option<Piece>,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub zobrist_key: u64,
}
