//! Suicide (antichess) move generation.
//!
//! Capturing is mandatory: if any capture exists for the side to move, only
//! captures are legal. There is no check and no castling, the king moves as
//! an ordinary piece, and pawns may promote to any kind including a king.
//!
//! Generation and counting share one emission routine through a `FnMut`
//! sink, so `count_moves` never allocates.

use crate::board::board::Board;
use crate::board::chess_types::*;
use crate::board::moves::{pack_move, Move};
use crate::movegen::attacks::{bishop_attacks, king_attacks, knight_attacks, queen_attacks, rook_attacks};
use crate::movegen::MoveGenerator;

pub struct SuicideMoveGenerator;

impl MoveGenerator for SuicideMoveGenerator {
    fn generate(&self, board: &Board) -> Vec<Move> {
        let mut moves = Vec::new();
        emit_moves(board, true, &mut |mv| moves.push(mv));
        if moves.is_empty() {
            emit_moves(board, false, &mut |mv| moves.push(mv));
        }
        moves
    }

    fn count_moves(&self, board: &Board) -> usize {
        let mut count = 0usize;
        emit_moves(board, true, &mut |_| count += 1);
        if count == 0 {
            emit_moves(board, false, &mut |_| count += 1);
        }
        count
    }

    fn is_valid(&self, board: &Board, mv: Move) -> bool {
        self.generate(board).contains(&mv)
    }
}

const PROMOTION_KINDS: [PieceKind; 5] = [
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
    PieceKind::King,
];

/// Emit captures only (`captures_only`) or quiet moves only, for the side
/// to move. The mandatory-capture rule is applied by the callers: captures
/// first, quiets only when no capture exists.
fn emit_moves(board: &Board, captures_only: bool, sink: &mut impl FnMut(Move)) {
    let side = board.side_to_move();
    let own_occ = board.side_bitboard(side);
    let enemy_occ = board.side_bitboard(side.opposite());
    let occupancy = own_occ | enemy_occ;

    let targets = if captures_only {
        enemy_occ
    } else {
        !occupancy
    };

    emit_pawn_moves(board, captures_only, sink);

    for kind in [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ] {
        let mut pieces = board.piece_bitboard(side, kind);
        while pieces != 0 {
            let from = pieces.trailing_zeros() as Square;
            let attacks = match kind {
                PieceKind::Knight => knight_attacks(from),
                PieceKind::Bishop => bishop_attacks(from, occupancy),
                PieceKind::Rook => rook_attacks(from, occupancy),
                PieceKind::Queen => queen_attacks(from, occupancy),
                PieceKind::King => king_attacks(from),
                PieceKind::Pawn => unreachable!(),
            };

            let mut destinations = attacks & targets;
            while destinations != 0 {
                let to = destinations.trailing_zeros() as Square;
                sink(pack_move(from, to, None));
                destinations &= destinations - 1;
            }

            pieces &= pieces - 1;
        }
    }
}

fn emit_pawn_moves(board: &Board, captures_only: bool, sink: &mut impl FnMut(Move)) {
    let side = board.side_to_move();
    let enemy_occ = board.side_bitboard(side.opposite());
    let empty = !board.bitboard();
    let promotion_rank = match side {
        Color::White => 7,
        Color::Black => 0,
    };

    let mut pawns = board.piece_bitboard(side, PieceKind::Pawn);
    while pawns != 0 {
        let from = pawns.trailing_zeros() as Square;
        let file = from % 8;
        let rank = from / 8;

        if captures_only {
            for file_delta in [-1i8, 1i8] {
                let target_file = file as i8 + file_delta;
                if !(0..8).contains(&target_file) {
                    continue;
                }
                let to = match side {
                    Color::White => from + 8,
                    Color::Black => from - 8,
                }
                .wrapping_add(file_delta as Square);
                let to_mask = 1u64 << to;

                if (to_mask & enemy_occ) != 0 || board.en_passant_target() == Some(to) {
                    emit_pawn_move(from, to, promotion_rank, sink);
                }
            }
        } else {
            let one_step = match side {
                Color::White => from + 8,
                Color::Black => from - 8,
            };
            if (1u64 << one_step) & empty != 0 {
                emit_pawn_move(from, one_step, promotion_rank, sink);

                let start_rank = match side {
                    Color::White => 1,
                    Color::Black => 6,
                };
                if rank == start_rank {
                    let two_step = match side {
                        Color::White => from + 16,
                        Color::Black => from - 16,
                    };
                    if (1u64 << two_step) & empty != 0 {
                        sink(pack_move(from, two_step, None));
                    }
                }
            }
        }

        pawns &= pawns - 1;
    }
}

#[inline]
fn emit_pawn_move(from: Square, to: Square, promotion_rank: u8, sink: &mut impl FnMut(Move)) {
    if to / 8 == promotion_rank {
        for kind in PROMOTION_KINDS {
            sink(pack_move(from, to, Some(kind)));
        }
    } else {
        sink(pack_move(from, to, None));
    }
}
