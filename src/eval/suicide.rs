//! Static evaluation for the Suicide variant.
//!
//! `result` classifies finished positions (stalemate with fewer pieces wins;
//! lone rival bishops on opposite square colors cannot ever meet). The
//! heuristic score leans on mobility: with captures mandatory, giving the
//! opponent moves that feed your pieces to them is the core of the game.

use crate::board::board::Board;
use crate::board::chess_types::*;
use crate::egtb::reader::Egtb;
use crate::eval::Evaluator;
use crate::movegen::{MoveGenerator, SuicideMoveGenerator};

/// Score returned for a won position; a lost one scores its negation.
pub const WIN_SCORE: i32 = 10_000;

const MOBILITY_FACTOR: i32 = 25;
const PIECE_COUNT_FACTOR: i32 = -50;
const TEMPO: i32 = 250;

// Suicide piece values. The king is just a big piece here, and queens are
// easier to give away than rooks.
mod pv {
    pub const KING: i32 = 10;
    pub const QUEEN: i32 = 6;
    pub const ROOK: i32 = 7;
    pub const BISHOP: i32 = 3;
    pub const KNIGHT: i32 = 3;
    pub const PAWN: i32 = 2;
}

pub struct SuicideEvaluator<'a> {
    egtb: Option<&'a Egtb>,
}

impl SuicideEvaluator<'_> {
    pub fn new() -> SuicideEvaluator<'static> {
        SuicideEvaluator { egtb: None }
    }

    pub fn with_egtb(egtb: &Egtb) -> SuicideEvaluator<'_> {
        SuicideEvaluator { egtb: Some(egtb) }
    }
}

impl Default for SuicideEvaluator<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for SuicideEvaluator<'_> {
    fn result(&self, board: &Board) -> GameResult {
        let side = board.side_to_move();
        let self_pieces = board.num_pieces(side);
        let opp_pieces = board.num_pieces(side.opposite());

        if self_pieces == 1 && opp_pieces == 1 && rival_bishops_on_opposite_colors(board) {
            return GameResult::Draw;
        }

        if SuicideMoveGenerator.count_moves(board) == 0 {
            return match self_pieces.cmp(&opp_pieces) {
                std::cmp::Ordering::Less => GameResult::Win,
                std::cmp::Ordering::Equal => GameResult::Draw,
                std::cmp::Ordering::Greater => GameResult::Loss,
            };
        }

        GameResult::Unknown
    }

    fn evaluate(&self, board: &mut Board) -> i32 {
        let side = board.side_to_move();
        let self_pieces = board.num_pieces(side);
        let opp_pieces = board.num_pieces(side.opposite());
        let generator = SuicideMoveGenerator;

        if self_pieces == 1 && opp_pieces == 1 {
            if let Some(egtb) = self.egtb {
                if let Some(entry) = egtb.lookup(board) {
                    return match entry.result(side) {
                        GameResult::Win => WIN_SCORE,
                        GameResult::Loss => -WIN_SCORE,
                        _ => 0,
                    };
                }
            }
            if rival_bishops_on_opposite_colors(board) {
                return 0;
            }
        }

        let self_moves = generator.count_moves(board);
        if self_moves == 0 {
            return match self_pieces.cmp(&opp_pieces) {
                std::cmp::Ordering::Less => WIN_SCORE,
                std::cmp::Ordering::Equal => 0,
                std::cmp::Ordering::Greater => -WIN_SCORE,
            };
        }

        // A forced reply is scored as the position it leads to.
        if self_moves == 1 {
            let moves = generator.generate(board);
            board.make(moves[0]);
            let score = -self.evaluate(board);
            board.unmake();
            return score;
        }

        board.flip_side_to_move();
        let opp_moves = generator.count_moves(board);
        board.flip_side_to_move();

        // A stalemated opponent means every move of ours hands the turn to
        // a finished or nearly finished position; take the best of them.
        if opp_moves == 0 {
            let mut best = i32::MIN;
            for mv in generator.generate(board) {
                board.make(mv);
                let score = -self.evaluate(board);
                board.unmake();
                if score > best {
                    best = score;
                }
            }
            return best;
        }

        (self_moves as i32 - opp_moves as i32) * MOBILITY_FACTOR
            + piece_value_difference(board)
            + TEMPO
            + PIECE_COUNT_FACTOR * piece_count_difference(board)
    }
}

fn side_piece_value(board: &Board, color: Color) -> i32 {
    board.piece_bitboard(color, PieceKind::King).count_ones() as i32 * pv::KING
        + board.piece_bitboard(color, PieceKind::Queen).count_ones() as i32 * pv::QUEEN
        + board.piece_bitboard(color, PieceKind::Rook).count_ones() as i32 * pv::ROOK
        + board.piece_bitboard(color, PieceKind::Bishop).count_ones() as i32 * pv::BISHOP
        + board.piece_bitboard(color, PieceKind::Knight).count_ones() as i32 * pv::KNIGHT
        + board.piece_bitboard(color, PieceKind::Pawn).count_ones() as i32 * pv::PAWN
}

fn piece_value_difference(board: &Board) -> i32 {
    let side = board.side_to_move();
    side_piece_value(board, side) - side_piece_value(board, side.opposite())
}

fn piece_count_difference(board: &Board) -> i32 {
    let side = board.side_to_move();
    board.num_pieces(side) as i32 - board.num_pieces(side.opposite()) as i32
}

fn rival_bishops_on_opposite_colors(board: &Board) -> bool {
    const DARK_SQUARES: u64 = 0xAA55_AA55_AA55_AA55;
    const LIGHT_SQUARES: u64 = 0x55AA_55AA_55AA_55AA;

    let white_bishops = board.piece_bitboard(Color::White, PieceKind::Bishop);
    let black_bishops = board.piece_bitboard(Color::Black, PieceKind::Bishop);

    white_bishops != 0
        && black_bishops != 0
        && ((white_bishops & LIGHT_SQUARES != 0 && black_bishops & DARK_SQUARES != 0)
            || (white_bishops & DARK_SQUARES != 0 && black_bishops & LIGHT_SQUARES != 0))
}
