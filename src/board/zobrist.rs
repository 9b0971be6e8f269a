//! Zobrist hashing support for fast position identity.
//!
//! The nonce tables are generated once per process from a fixed seed so
//! hashes are deterministic across runs, which is useful for testing and
//! for reproducible search orderings.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::board::Board;
use crate::board::chess_types::*;

const ZOBRIST_SEED: u64 = 0x1B5A_D2C8_9F0E_6D41;

#[derive(Debug)]
struct ZobristTables {
    piece_square: [[[u64; 64]; 6]; 2],
    black_to_move: u64,
    castling: [u64; 16],
    en_passant_file: [u64; 8],
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

    let mut piece_square = [[[0u64; 64]; 6]; 2];
    for color in &mut piece_square {
        for piece in color {
            for sq in piece {
                *sq = rng.random::<u64>();
            }
        }
    }

    let black_to_move = rng.random::<u64>();

    let mut castling = [0u64; 16];
    for key in &mut castling {
        *key = rng.random::<u64>();
    }

    let mut en_passant_file = [0u64; 8];
    for key in &mut en_passant_file {
        *key = rng.random::<u64>();
    }

    ZobristTables {
        piece_square,
        black_to_move,
        castling,
        en_passant_file,
    }
}

/// Return the Zobrist key for a `(color, kind, square)` occupancy term.
#[inline]
pub fn piece_square_key(color: Color, kind: PieceKind, square: Square) -> u64 {
    tables().piece_square[color.index()][kind.index()][square as usize]
}

/// Return the Zobrist key contribution for a castling rights mask (`0..=15`).
#[inline]
pub fn castling_key(castling_rights: CastlingRights) -> u64 {
    tables().castling[(castling_rights & 0x0F) as usize]
}

/// Return the Zobrist key contribution for a valid en-passant file.
#[inline]
pub fn en_passant_file_key(file: u8) -> u64 {
    tables().en_passant_file[file as usize]
}

/// Return the side-to-move toggle key (xor in when black is to move).
#[inline]
pub fn black_to_move_key() -> u64 {
    tables().black_to_move
}

/// Compute the full position key from scratch. `Board::make` maintains the
/// same key incrementally; this is the authoritative reference for audits
/// and for seeding the key when a board is built from FEN.
pub fn compute_zobrist_key(board: &Board) -> u64 {
    let mut key = 0u64;

    for sq in 0..64u8 {
        if let Some(piece) = board.piece_at(sq) {
            key ^= piece_square_key(piece.color, piece.kind, sq);
        }
    }

    if board.side_to_move() == Color::Black {
        key ^= black_to_move_key();
    }

    key ^= castling_key(board.castling_rights());

    if let Some(ep) = board.en_passant_target() {
        key ^= en_passant_file_key(ep % 8);
    }

    key
}
