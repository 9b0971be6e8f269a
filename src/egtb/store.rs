//! In-memory endgame table store used during generation.

use std::collections::HashMap;
use std::io;

use crate::board::chess_types::Color;
use crate::board::moves::{move_to_uci, Move};

/// One classified position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgtbElement {
    pub moves_to_end: u32,
    /// Best move from here, `None` for positions where the game is over.
    pub next_move: Option<Move>,
    /// Winning side, `None` for draws.
    pub winner: Option<Color>,
}

/// FEN-keyed map of classified positions.
#[derive(Debug, Default)]
pub struct EgtbStore {
    store: HashMap<String, EgtbElement>,
}

impl EgtbStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, fen: &str) -> Option<&EgtbElement> {
        self.store.get(fen)
    }

    pub fn put(
        &mut self,
        fen: String,
        moves_to_end: u32,
        next_move: Option<Move>,
        winner: Option<Color>,
    ) {
        self.store.insert(
            fen,
            EgtbElement {
                moves_to_end,
                next_move,
                winner,
            },
        );
    }

    /// Merge another store into this one; entries from `other` win ties.
    pub fn merge_from(&mut self, other: EgtbStore) {
        self.store.extend(other.store);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EgtbElement)> {
        self.store.iter()
    }

    /// Emit `<fen>|<uci-move or "LOST">|<moves_to_end>|<W|B|N>` lines,
    /// sorted by FEN so output is deterministic.
    pub fn write<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let mut entries: Vec<_> = self.store.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        for (fen, element) in entries {
            let mv = match element.next_move {
                Some(mv) => move_to_uci(mv),
                None => "LOST".to_owned(),
            };
            let winner = match element.winner {
                Some(Color::White) => 'W',
                Some(Color::Black) => 'B',
                None => 'N',
            };
            writeln!(out, "{fen}|{mv}|{}|{winner}", element.moves_to_end)?;
        }
        Ok(())
    }
}
