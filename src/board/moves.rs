//! Packed move representation and UCI-string conversions.
//!
//! A move is a `u32` holding the from-square, the to-square, and an optional
//! promotion kind. Capture, en-passant, and castling effects are derived by
//! the board from the position, so they need no bits here.

use crate::board::chess_types::{PieceKind, Square};
use crate::utils::algebraic::{algebraic_to_square, square_to_algebraic};

/// Packed move: 6 bits from-square, 6 bits to-square, 3 bits promotion kind.
pub type Move = u32;

const FROM_SHIFT: u32 = 0;
const TO_SHIFT: u32 = 6;
const PROMOTION_SHIFT: u32 = 12;

const SQUARE_MASK: u32 = 0x3F;
const PIECE_MASK: u32 = 0x7;
pub const NO_PIECE_CODE: u32 = 0x7;

#[inline]
pub fn pack_move(from: Square, to: Square, promotion: Option<PieceKind>) -> Move {
    let mut out = 0u32;
    out |= (from as u32) << FROM_SHIFT;
    out |= (to as u32) << TO_SHIFT;
    out |= promotion
        .map(|kind| kind.index() as u32)
        .unwrap_or(NO_PIECE_CODE)
        << PROMOTION_SHIFT;
    out
}

#[inline]
pub fn move_from(mv: Move) -> Square {
    ((mv >> FROM_SHIFT) & SQUARE_MASK) as Square
}

#[inline]
pub fn move_to(mv: Move) -> Square {
    ((mv >> TO_SHIFT) & SQUARE_MASK) as Square
}

#[inline]
pub fn move_promotion(mv: Move) -> Option<PieceKind> {
    piece_kind_from_code((mv >> PROMOTION_SHIFT) & PIECE_MASK)
}

#[inline]
pub fn piece_kind_from_code(code: u32) -> Option<PieceKind> {
    match code {
        0 => Some(PieceKind::Pawn),
        1 => Some(PieceKind::Knight),
        2 => Some(PieceKind::Bishop),
        3 => Some(PieceKind::Rook),
        4 => Some(PieceKind::Queen),
        5 => Some(PieceKind::King),
        _ => None,
    }
}

/// Render a move in long algebraic (UCI) form, e.g. `e2e4` or `f2f1q`.
pub fn move_to_uci(mv: Move) -> String {
    let from = square_to_algebraic(move_from(mv)).expect("packed from-square is in range");
    let to = square_to_algebraic(move_to(mv)).expect("packed to-square is in range");
    match move_promotion(mv) {
        Some(kind) => format!("{from}{to}{}", promotion_char(kind)),
        None => format!("{from}{to}"),
    }
}

/// Parse a long algebraic (UCI) move string, e.g. `e2e4` or `f2f1q`.
pub fn move_from_uci(text: &str) -> Result<Move, String> {
    if !text.is_ascii() || (text.len() != 4 && text.len() != 5) {
        return Err(format!("Invalid UCI move: {text}"));
    }
    let from = algebraic_to_square(&text[0..2])?;
    let to = algebraic_to_square(&text[2..4])?;
    let promotion = match text.as_bytes().get(4) {
        None => None,
        Some(&ch) => Some(promotion_kind(ch as char)?),
    };
    Ok(pack_move(from, to, promotion))
}

fn promotion_char(kind: PieceKind) -> char {
    match kind {
        PieceKind::Pawn => 'p',
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        PieceKind::Queen => 'q',
        PieceKind::King => 'k',
    }
}

fn promotion_kind(ch: char) -> Result<PieceKind, String> {
    match ch {
        'n' => Ok(PieceKind::Knight),
        'b' => Ok(PieceKind::Bishop),
        'r' => Ok(PieceKind::Rook),
        'q' => Ok(PieceKind::Queen),
        'k' => Ok(PieceKind::King),
        _ => Err(format!("Invalid promotion piece: {ch}")),
    }
}
