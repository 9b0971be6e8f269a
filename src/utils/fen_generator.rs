//! Board-to-FEN rendering.
//!
//! Emits six-field FEN. The clock fields are always `0 1`: the board does
//! not track clocks, and EGTB code relies on a position always rendering
//! to the same string.

use crate::board::board::Board;
use crate::board::chess_types::*;
use crate::utils::algebraic::square_to_algebraic;

pub fn generate_fen(board: &Board) -> String {
    let placement = generate_board_field(board);
    let side_to_move = match board.side_to_move() {
        Color::White => "w",
        Color::Black => "b",
    };
    let castling = generate_castling_field(board.castling_rights());
    let en_passant = match board.en_passant_target() {
        Some(sq) => square_to_algebraic(sq).expect("en-passant square is in range"),
        None => "-".to_owned(),
    };

    format!("{placement} {side_to_move} {castling} {en_passant} 0 1")
}

fn generate_board_field(board: &Board) -> String {
    let mut out = String::new();

    for rank in (0..8u8).rev() {
        let mut empty_count = 0u8;

        for file in 0..8u8 {
            let sq = rank * 8 + file;
            if let Some(piece) = board.piece_at(sq) {
                if empty_count > 0 {
                    out.push(char::from(b'0' + empty_count));
                    empty_count = 0;
                }
                out.push(piece_to_fen_char(piece));
            } else {
                empty_count += 1;
            }
        }

        if empty_count > 0 {
            out.push(char::from(b'0' + empty_count));
        }

        if rank > 0 {
            out.push('/');
        }
    }

    out
}

fn generate_castling_field(rights: CastlingRights) -> String {
    if rights == 0 {
        return "-".to_owned();
    }

    let mut out = String::new();
    if rights & CASTLE_WHITE_KINGSIDE != 0 {
        out.push('K');
    }
    if rights & CASTLE_WHITE_QUEENSIDE != 0 {
        out.push('Q');
    }
    if rights & CASTLE_BLACK_KINGSIDE != 0 {
        out.push('k');
    }
    if rights & CASTLE_BLACK_QUEENSIDE != 0 {
        out.push('q');
    }
    out
}

fn piece_to_fen_char(piece: Piece) -> char {
    let base = match piece.kind {
        PieceKind::Pawn => 'p',
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        PieceKind::Queen => 'q',
        PieceKind::King => 'k',
    };
    match piece.color {
        Color::White => base.to_ascii_uppercase(),
        Color::Black => base,
    }
}
