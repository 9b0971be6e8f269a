//! Memory-mapped endgame table lookup.
//!
//! A compiled table is a flat array of fixed-width records indexed by the
//! canonical one-piece-per-side position index. The search probes it only
//! when each side has exactly one piece left.

use std::error::Error;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::Path;

use memmap2::Mmap;

use crate::board::board::Board;
use crate::board::chess_types::*;
use crate::board::moves::Move;
use crate::egtb::store::EgtbStore;

/// One slot per (white kind, white square, black kind, black square, side
/// to move).
pub const TABLE_ENTRIES: usize = 6 * 64 * 6 * 64 * 2;
const RECORD_SIZE: usize = 8;

const TAG_EMPTY: u8 = 0;
const TAG_WHITE_WINS: u8 = 1;
const TAG_BLACK_WINS: u8 = 2;
const TAG_DRAW: u8 = 3;

pub type EgtbResult<T> = Result<T, EgtbError>;

#[derive(Debug)]
pub enum EgtbError {
    Io(io::Error),
    Format(String),
}

impl fmt::Display for EgtbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EgtbError::Io(err) => write!(f, "egtb I/O error: {err}"),
            EgtbError::Format(msg) => write!(f, "egtb format error: {msg}"),
        }
    }
}

impl Error for EgtbError {}

impl From<io::Error> for EgtbError {
    fn from(err: io::Error) -> Self {
        EgtbError::Io(err)
    }
}

/// Decoded table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EgtbEntry {
    /// Winning side, `None` for draws.
    pub winner: Option<Color>,
    pub moves_to_end: u16,
    /// Best move from here, `None` for finished positions.
    pub next_move: Option<Move>,
}

impl EgtbEntry {
    /// Terminal result from the viewpoint of the side to move.
    pub fn result(&self, side_to_move: Color) -> GameResult {
        match self.winner {
            None => GameResult::Draw,
            Some(winner) if winner == side_to_move => GameResult::Win,
            Some(_) => GameResult::Loss,
        }
    }
}

/// Read-only memory-mapped endgame table.
pub struct Egtb {
    mapping: Mmap,
}

impl Egtb {
    pub fn open<P: AsRef<Path>>(path: P) -> EgtbResult<Self> {
        let file = File::open(path)?;
        let mapping = unsafe { Mmap::map(&file)? };
        if mapping.len() != TABLE_ENTRIES * RECORD_SIZE {
            return Err(EgtbError::Format(format!(
                "table has {} bytes, expected {}",
                mapping.len(),
                TABLE_ENTRIES * RECORD_SIZE
            )));
        }
        Ok(Self { mapping })
    }

    /// Probe the table. Returns `None` unless each side has exactly one
    /// piece and the slot for this position is populated.
    pub fn lookup(&self, board: &Board) -> Option<EgtbEntry> {
        let index = position_index(board)?;
        decode_record(&self.mapping[index * RECORD_SIZE..(index + 1) * RECORD_SIZE])
    }
}

/// Canonical index for positions with exactly one piece per side.
pub fn position_index(board: &Board) -> Option<usize> {
    if board.num_pieces(Color::White) != 1 || board.num_pieces(Color::Black) != 1 {
        return None;
    }

    let white_sq = board.side_bitboard(Color::White).trailing_zeros() as usize;
    let black_sq = board.side_bitboard(Color::Black).trailing_zeros() as usize;
    let white_kind = board.piece_at(white_sq as Square)?.kind.index();
    let black_kind = board.piece_at(black_sq as Square)?.kind.index();

    let index = (((white_kind * 64 + white_sq) * 6 + black_kind) * 64 + black_sq) * 2
        + board.side_to_move().index();
    Some(index)
}

/// Compile a generated store into a binary table file. Store entries whose
/// position is not one-piece-per-side (final positions, for instance) have
/// no slot and are skipped.
pub fn compile_table<P: AsRef<Path>>(store: &EgtbStore, path: P) -> EgtbResult<()> {
    let mut data = vec![0u8; TABLE_ENTRIES * RECORD_SIZE];

    for (fen, element) in store.iter() {
        let board = Board::from_fen(Variant::Suicide, fen)
            .map_err(|reason| EgtbError::Format(format!("bad FEN {fen}: {reason}")))?;
        let Some(index) = position_index(&board) else {
            continue;
        };

        let record = &mut data[index * RECORD_SIZE..(index + 1) * RECORD_SIZE];
        record[0] = match element.winner {
            Some(Color::White) => TAG_WHITE_WINS,
            Some(Color::Black) => TAG_BLACK_WINS,
            None => TAG_DRAW,
        };
        let distance = u16::try_from(element.moves_to_end).unwrap_or(u16::MAX);
        record[1..3].copy_from_slice(&distance.to_le_bytes());
        record[3..7].copy_from_slice(&element.next_move.unwrap_or(0).to_le_bytes());
    }

    fs::write(path, data)?;
    Ok(())
}

fn decode_record(record: &[u8]) -> Option<EgtbEntry> {
    let winner = match record[0] {
        TAG_EMPTY => return None,
        TAG_WHITE_WINS => Some(Color::White),
        TAG_BLACK_WINS => Some(Color::Black),
        TAG_DRAW => None,
        tag => panic!("corrupt egtb record tag {tag}"),
    };
    let moves_to_end = u16::from_le_bytes([record[1], record[2]]);
    let next_move = u32::from_le_bytes([record[3], record[4], record[5], record[6]]);

    Some(EgtbEntry {
        winner,
        moves_to_end,
        next_move: if next_move == 0 { None } else { Some(next_move) },
    })
}
