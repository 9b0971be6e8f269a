//! Retrograde endgame table generation.
//!
//! Positions for a fixed piece configuration are classified by fixed-point
//! propagation: the winning side takes the shortest path into a known win,
//! while the losing side is only classified once every legal move has been
//! refuted, and is credited with the longest delay it can put up.

use std::error::Error;
use std::fmt;

use log::{debug, info};

use crate::board::board::Board;
use crate::board::chess_types::*;
use crate::board::moves::Move;
use crate::egtb::store::EgtbStore;
use crate::eval::{Evaluator, SuicideEvaluator};
use crate::movegen::{MoveGenerator, SuicideMoveGenerator};

pub type EgtbGenResult<T> = Result<T, EgtbGenError>;

#[derive(Debug)]
pub enum EgtbGenError {
    InvalidFen { fen: String, reason: String },
}

impl fmt::Display for EgtbGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EgtbGenError::InvalidFen { fen, reason } => {
                write!(f, "invalid FEN in position list: {fen}: {reason}")
            }
        }
    }
}

impl Error for EgtbGenError {}

/// Classify every position in `all_pos_list` that can be resolved for the
/// given `winning_side`, writing results into `store`.
///
/// `final_pos_list` holds positions where the game is already over; they
/// are recorded at distance 0 with `winner = winning_side`, so the caller
/// must supply lists consistent with that convention.
pub fn generate(
    final_pos_list: &[String],
    all_pos_list: &[String],
    winning_side: Color,
    store: &mut EgtbStore,
) -> EgtbGenResult<()> {
    for fen in final_pos_list {
        store.put(fen.clone(), 0, None, Some(winning_side));
    }

    // Seed statically decidable positions; draws simply leave the working
    // set, the rest stays for the fixed-point passes.
    let evaluator = SuicideEvaluator::new();
    let mut working = Vec::with_capacity(all_pos_list.len());
    for fen in all_pos_list {
        let board = parse_position(fen)?;
        match evaluator.result(&board) {
            GameResult::Win => {
                store.put(fen.clone(), 0, None, Some(board.side_to_move()));
            }
            GameResult::Loss => {
                store.put(fen.clone(), 0, None, Some(board.side_to_move().opposite()));
            }
            GameResult::Draw => {}
            GameResult::Unknown => working.push(fen.clone()),
        }
    }

    propagate(working, winning_side, store)
}

fn propagate(
    mut working: Vec<String>,
    winning_side: Color,
    store: &mut EgtbStore,
) -> EgtbGenResult<()> {
    let generator = SuicideMoveGenerator;
    let mut pass = 0u32;
    let mut longest = 0u32;

    loop {
        info!(
            "egtb pass {pass}: {} unclassified, longest distance {longest}",
            working.len()
        );

        let mut additions = EgtbStore::new();
        let mut remaining = Vec::with_capacity(working.len());

        for fen in working {
            let mut board = parse_position(&fen)?;
            let moves = generator.generate(&board);

            let classified = if board.side_to_move() == winning_side {
                classify_winning_side(&mut board, &moves, winning_side, store)
            } else {
                classify_losing_side(&mut board, &moves, winning_side, store)
            };

            match classified {
                Some((distance, mv)) => {
                    longest = longest.max(distance);
                    additions.put(fen, distance, Some(mv), Some(winning_side));
                }
                None => remaining.push(fen),
            }
        }

        if additions.is_empty() {
            debug!(
                "egtb fixed point after {pass} passes, {} positions left unclassified",
                remaining.len()
            );
            return Ok(());
        }

        store.merge_from(additions);
        working = remaining;
        pass += 1;
    }
}

/// The winning side needs one move into a classified win; it takes the
/// shortest.
fn classify_winning_side(
    board: &mut Board,
    moves: &[Move],
    winning_side: Color,
    store: &EgtbStore,
) -> Option<(u32, Move)> {
    let mut best: Option<(u32, Move)> = None;

    for &mv in moves {
        board.make(mv);
        let fen = board.to_fen();
        if let Some(element) = store.get(&fen) {
            if element.winner == Some(winning_side)
                && best.is_none_or(|(distance, _)| element.moves_to_end + 1 < distance)
            {
                best = Some((element.moves_to_end + 1, mv));
            }
        }
        board.unmake();
    }

    best
}

/// The losing side is classified only when every legal move runs into a
/// classified win; it gets credit for the longest delay.
fn classify_losing_side(
    board: &mut Board,
    moves: &[Move],
    winning_side: Color,
    store: &EgtbStore,
) -> Option<(u32, Move)> {
    let mut best: Option<(u32, Move)> = None;

    for &mv in moves {
        board.make(mv);
        let fen = board.to_fen();
        let element = store.get(&fen);
        board.unmake();

        match element {
            Some(element) if element.winner == Some(winning_side) => {
                if best.is_none_or(|(distance, _)| element.moves_to_end + 1 > distance) {
                    best = Some((element.moves_to_end + 1, mv));
                }
            }
            // One unrefuted escape and the position stays open.
            _ => return None,
        }
    }

    best
}

fn parse_position(fen: &str) -> EgtbGenResult<Board> {
    Board::from_fen(Variant::Suicide, fen).map_err(|reason| EgtbGenError::InvalidFen {
        fen: fen.to_owned(),
        reason,
    })
}

/// Enumerate every placement of one `white_kind` piece and one
/// `black_kind` piece, with either side to move, as FEN strings. Pawns are
/// never placed on the first or last rank.
pub fn enumerate_positions(white_kind: PieceKind, black_kind: PieceKind) -> Vec<String> {
    let mut positions = Vec::new();

    for white_sq in 0..64u8 {
        if white_kind == PieceKind::Pawn && !(8..56).contains(&white_sq) {
            continue;
        }
        for black_sq in 0..64u8 {
            if black_sq == white_sq {
                continue;
            }
            if black_kind == PieceKind::Pawn && !(8..56).contains(&black_sq) {
                continue;
            }

            let mut board = Board::from_fen(Variant::Suicide, "8/8/8/8/8/8/8/8 w - - 0 1")
                .expect("empty board FEN parses");
            board.set_piece(white_sq, Some(Piece::new(Color::White, white_kind)));
            board.set_piece(black_sq, Some(Piece::new(Color::Black, black_kind)));

            for side in [Color::White, Color::Black] {
                board.set_side_to_move(side);
                positions.push(board.to_fen());
            }
        }
    }

    positions
}

/// Enumerate the game-over positions for a lone `kind` piece of `color`,
/// with the opponent (who has nothing left, and so has won) to move.
pub fn enumerate_final_positions(color: Color, kind: PieceKind) -> Vec<String> {
    let mut positions = Vec::new();

    for sq in 0..64u8 {
        if kind == PieceKind::Pawn && !(8..56).contains(&sq) {
            continue;
        }
        let mut board = Board::from_fen(Variant::Suicide, "8/8/8/8/8/8/8/8 w - - 0 1")
            .expect("empty board FEN parses");
        board.set_piece(sq, Some(Piece::new(color, kind)));
        board.set_side_to_move(color.opposite());
        positions.push(board.to_fen());
    }

    positions
}
