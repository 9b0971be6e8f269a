//! Incremental board state with make/unmake support.
//!
//! `Board` is the central model for the engine: a 64-square array mirrored
//! by per-(color, kind) bitboards, plus a move stack that records exactly
//! the state needed to reverse a move. The Zobrist key is maintained
//! incrementally in `make` and restored by popping the stack in `unmake`,
//! which keeps make/unmake cycles cheap enough for best-first search.

use crate::board::chess_types::*;
use crate::board::history::HistoryEntry;
use crate::board::moves::{move_from, move_promotion, move_to, Move};
use crate::board::zobrist;
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;

/// Maximum number of plies the move stack can hold. This also bounds the
/// maximum search depth.
pub const MAX_GAME_LENGTH: usize = 1000;

#[derive(Debug, Clone)]
pub struct Board {
    squares: [Option<Piece>; 64],
    pieces: [[u64; 6]; 2],
    occupancy_by_color: [u64; 2],
    side_to_move: Color,
    castling_allowed: bool,
    history: Vec<HistoryEntry>,
}

impl Board {
    /// Construct the starting position for the variant.
    pub fn new(variant: Variant) -> Self {
        Self::from_fen(variant, variant.starting_fen())
            .expect("starting FEN should always parse")
    }

    /// Construct from a FEN string for the variant.
    pub fn from_fen(variant: Variant, fen: &str) -> Result<Self, String> {
        let fields = parse_fen(fen)?;

        let mut board = Self {
            squares: fields.placement,
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            side_to_move: fields.side_to_move,
            castling_allowed: variant.castling_allowed(),
            history: Vec::with_capacity(MAX_GAME_LENGTH + 1),
        };

        for sq in 0..64 {
            if let Some(piece) = board.squares[sq] {
                let mask = 1u64 << sq;
                board.pieces[piece.color.index()][piece.kind.index()] |= mask;
                board.occupancy_by_color[piece.color.index()] |= mask;
            }
        }

        let castling_rights = if board.castling_allowed {
            fields.castling_rights
        } else {
            0
        };

        // Sentinel entry describing the root position.
        board.history.push(HistoryEntry {
            mv: 0,
            captured: None,
            castling_rights,
            en_passant: fields.en_passant,
            zobrist_key: 0,
        });
        board.history[0].zobrist_key = zobrist::compute_zobrist_key(&board);

        Ok(board)
    }

    /// Render the current position as a FEN string.
    pub fn to_fen(&self) -> String {
        generate_fen(self)
    }

    /// Apply `mv` to the board. The move is not checked for legality.
    pub fn make(&mut self, mv: Move) {
        assert!(
            self.ply() < MAX_GAME_LENGTH,
            "move stack overflow at ply {}",
            self.ply()
        );

        let top = *self.top();
        let mut key = top.zobrist_key;
        let mut rights = top.castling_rights;

        let from = move_from(mv);
        let to = move_to(mv);
        let mover = self.squares[from as usize].expect("no piece on from-square");

        if let Some(ep) = top.en_passant {
            key ^= zobrist::en_passant_file_key(ep % 8);
        }

        // Captures. A pawn changing file onto an empty square is an
        // en-passant capture; the victim sits behind the destination.
        let mut captured = self.squares[to as usize];
        if captured.is_some() {
            self.remove_piece(to, &mut key);
        } else if mover.kind == PieceKind::Pawn && from % 8 != to % 8 {
            let victim_sq = if mover.color == Color::White {
                to - 8
            } else {
                to + 8
            };
            captured = self.squares[victim_sq as usize];
            self.remove_piece(victim_sq, &mut key);
        }

        self.remove_piece(from, &mut key);
        let placed_kind = move_promotion(mv).unwrap_or(mover.kind);
        self.place_piece(to, Piece::new(mover.color, placed_kind), &mut key);

        if self.castling_allowed {
            if mover.kind == PieceKind::King && from.abs_diff(to) == 2 {
                let (rook_from, rook_to) = match (from, to) {
                    (4, 6) => (7, 5),
                    (4, 2) => (0, 3),
                    (60, 62) => (63, 61),
                    (60, 58) => (56, 59),
                    _ => panic!("invalid castling move {from}->{to}"),
                };
                let rook = self.squares[rook_from as usize].expect("castling without rook");
                self.remove_piece(rook_from, &mut key);
                self.place_piece(rook_to, rook, &mut key);
            }
            rights = updated_castling_rights(rights, mover, from, to);
            if rights != top.castling_rights {
                key ^= zobrist::castling_key(top.castling_rights);
                key ^= zobrist::castling_key(rights);
            }
        }

        // A double pawn advance publishes the jumped-over square.
        let en_passant = if mover.kind == PieceKind::Pawn && from.abs_diff(to) == 16 {
            Some((from + to) / 2)
        } else {
            None
        };
        if let Some(ep) = en_passant {
            key ^= zobrist::en_passant_file_key(ep % 8);
        }

        key ^= zobrist::black_to_move_key();
        self.side_to_move = self.side_to_move.opposite();

        self.history.push(HistoryEntry {
            mv,
            captured,
            castling_rights: rights,
            en_passant,
            zobrist_key: key,
        });
    }

    /// Undo the last move. Returns `false` if only the sentinel remains.
    pub fn unmake(&mut self) -> bool {
        if self.history.len() <= 1 {
            return false;
        }
        let entry = self.history.pop().expect("history is non-empty");
        let mv = entry.mv;
        let from = move_from(mv);
        let to = move_to(mv);

        let mover_color = self.side_to_move.opposite();
        self.side_to_move = mover_color;

        let arrived = self.squares[to as usize].expect("no piece on to-square");
        self.remove_piece_no_key(to);

        // A promotion put a non-pawn on the back rank; the pawn comes back.
        let original_kind = if move_promotion(mv).is_some() {
            PieceKind::Pawn
        } else {
            arrived.kind
        };
        self.place_piece_no_key(from, Piece::new(mover_color, original_kind));

        if let Some(captured) = entry.captured {
            // If the destination was the pre-move en-passant target, the
            // captured pawn lived behind it, not on it.
            let was_en_passant =
                original_kind == PieceKind::Pawn && self.top().en_passant == Some(to);
            let victim_sq = if was_en_passant {
                if mover_color == Color::White {
                    to - 8
                } else {
                    to + 8
                }
            } else {
                to
            };
            self.place_piece_no_key(victim_sq, captured);
        }

        if self.castling_allowed && original_kind == PieceKind::King && from.abs_diff(to) == 2 {
            let (rook_from, rook_to) = match (from, to) {
                (4, 6) => (7, 5),
                (4, 2) => (0, 3),
                (60, 62) => (63, 61),
                (60, 58) => (56, 59),
                _ => panic!("invalid castling move {from}->{to}"),
            };
            let rook = self.squares[rook_to as usize].expect("castling rook missing");
            self.remove_piece_no_key(rook_to);
            self.place_piece_no_key(rook_from, rook);
        }

        true
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square as usize]
    }

    /// Bitboard of all occupied squares.
    #[inline]
    pub fn bitboard(&self) -> u64 {
        self.occupancy_by_color[0] | self.occupancy_by_color[1]
    }

    #[inline]
    pub fn side_bitboard(&self, color: Color) -> u64 {
        self.occupancy_by_color[color.index()]
    }

    #[inline]
    pub fn piece_bitboard(&self, color: Color, kind: PieceKind) -> u64 {
        self.pieces[color.index()][kind.index()]
    }

    #[inline]
    pub fn num_pieces(&self, color: Color) -> u32 {
        self.occupancy_by_color[color.index()].count_ones()
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// The Zobrist key of the current position (top of the move stack).
    #[inline]
    pub fn zobrist_key(&self) -> u64 {
        self.top().zobrist_key
    }

    /// En-passant target square published by the last move, if any.
    #[inline]
    pub fn en_passant_target(&self) -> Option<Square> {
        self.top().en_passant
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.top().castling_rights
    }

    /// Whether the side to move may still castle on the given wing.
    pub fn can_castle(&self, wing: CastleSide) -> bool {
        if !self.castling_allowed {
            return false;
        }
        let bit = match (self.side_to_move, wing) {
            (Color::White, CastleSide::KingSide) => CASTLE_WHITE_KINGSIDE,
            (Color::White, CastleSide::QueenSide) => CASTLE_WHITE_QUEENSIDE,
            (Color::Black, CastleSide::KingSide) => CASTLE_BLACK_KINGSIDE,
            (Color::Black, CastleSide::QueenSide) => CASTLE_BLACK_QUEENSIDE,
        };
        self.castling_rights() & bit != 0
    }

    /// Number of plies played on this board so far.
    #[inline]
    pub fn ply(&self) -> usize {
        self.history.len() - 1
    }

    /// Recompute the Zobrist key from scratch. Audit companion to the
    /// incrementally maintained `zobrist_key`.
    pub fn recompute_zobrist_key(&self) -> u64 {
        zobrist::compute_zobrist_key(self)
    }

    // The setters below are for offline EGTB processing only. They do not
    // maintain the Zobrist key or the move stack.

    pub fn set_piece(&mut self, square: Square, piece: Option<Piece>) {
        if self.squares[square as usize].is_some() {
            self.remove_piece_no_key(square);
        }
        if let Some(piece) = piece {
            self.place_piece_no_key(square, piece);
        }
    }

    pub fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    /// Flip the side to move without recording a move.
    pub fn flip_side_to_move(&mut self) {
        self.side_to_move = self.side_to_move.opposite();
    }

    #[inline]
    fn top(&self) -> &HistoryEntry {
        self.history.last().expect("history holds at least the sentinel")
    }

    fn place_piece(&mut self, square: Square, piece: Piece, key: &mut u64) {
        self.place_piece_no_key(square, piece);
        *key ^= zobrist::piece_square_key(piece.color, piece.kind, square);
    }

    fn remove_piece(&mut self, square: Square, key: &mut u64) {
        let piece = self.squares[square as usize].expect("remove from empty square");
        self.remove_piece_no_key(square);
        *key ^= zobrist::piece_square_key(piece.color, piece.kind, square);
    }

    fn place_piece_no_key(&mut self, square: Square, piece: Piece) {
        debug_assert!(self.squares[square as usize].is_none());
        let mask = 1u64 << square;
        self.squares[square as usize] = Some(piece);
        self.pieces[piece.color.index()][piece.kind.index()] |= mask;
        self.occupancy_by_color[piece.color.index()] |= mask;
    }

    fn remove_piece_no_key(&mut self, square: Square) {
        let piece = self.squares[square as usize]
            .take()
            .expect("remove from empty square");
        let mask = 1u64 << square;
        self.pieces[piece.color.index()][piece.kind.index()] &= !mask;
        self.occupancy_by_color[piece.color.index()] &= !mask;
    }
}

fn updated_castling_rights(
    rights: CastlingRights,
    mover: Piece,
    from: Square,
    to: Square,
) -> CastlingRights {
    let mut rights = rights;

    if mover.kind == PieceKind::King {
        rights &= match mover.color {
            Color::White => !(CASTLE_WHITE_KINGSIDE | CASTLE_WHITE_QUEENSIDE),
            Color::Black => !(CASTLE_BLACK_KINGSIDE | CASTLE_BLACK_QUEENSIDE),
        };
    }

    // A rook leaving, or anything landing on, a corner kills that wing.
    for corner in [from, to] {
        rights &= match corner {
            0 => !CASTLE_WHITE_QUEENSIDE,
            7 => !CASTLE_WHITE_KINGSIDE,
            56 => !CASTLE_BLACK_QUEENSIDE,
            63 => !CASTLE_BLACK_KINGSIDE,
            _ => !0,
        };
    }

    rights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::moves::{move_from_uci, pack_move};

    fn assert_boards_identical(a: &Board, b: &Board) {
        assert_eq!(a.side_to_move(), b.side_to_move());
        assert_eq!(a.castling_rights(), b.castling_rights());
        assert_eq!(a.en_passant_target(), b.en_passant_target());
        assert_eq!(a.zobrist_key(), b.zobrist_key());
        assert_eq!(a.occupancy_by_color, b.occupancy_by_color);
        assert_eq!(a.pieces, b.pieces);
        for sq in 0..64u8 {
            assert_eq!(a.piece_at(sq), b.piece_at(sq), "square {sq} differs");
        }
    }

    fn assert_consistent(board: &Board) {
        // Array and bitboards must agree square by square.
        for sq in 0..64u8 {
            let mask = 1u64 << sq;
            match board.piece_at(sq) {
                Some(piece) => {
                    assert_ne!(board.piece_bitboard(piece.color, piece.kind) & mask, 0);
                    assert_ne!(board.side_bitboard(piece.color) & mask, 0);
                    assert_eq!(board.side_bitboard(piece.color.opposite()) & mask, 0);
                }
                None => {
                    assert_eq!(board.bitboard() & mask, 0);
                }
            }
        }
        assert_eq!(
            board.side_bitboard(Color::White) & board.side_bitboard(Color::Black),
            0
        );
        assert_eq!(board.zobrist_key(), board.recompute_zobrist_key());
    }

    #[test]
    fn startpos_layout_and_counts() {
        let board = Board::new(Variant::Suicide);
        assert_eq!(board.num_pieces(Color::White), 16);
        assert_eq!(board.num_pieces(Color::Black), 16);
        assert_eq!(board.side_to_move(), Color::White);
        assert_eq!(board.ply(), 0);
        assert_eq!(board.castling_rights(), 0);
        assert_consistent(&board);
    }

    #[test]
    fn make_unmake_round_trip_simple_moves() {
        let mut board = Board::new(Variant::Suicide);
        let initial = board.clone();

        let line = ["e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5a5"];
        for text in line {
            board.make(move_from_uci(text).unwrap());
            assert_consistent(&board);
        }
        assert_eq!(board.ply(), line.len());

        for _ in 0..line.len() {
            assert!(board.unmake());
            assert_consistent(&board);
        }
        assert!(!board.unmake());
        assert_boards_identical(&board, &initial);
    }

    #[test]
    fn en_passant_capture_and_round_trip() {
        let mut board =
            Board::from_fen(Variant::Suicide, "8/8/8/8/4p3/8/3P4/8 w - - 0 1").unwrap();
        let initial = board.clone();

        board.make(move_from_uci("d2d4").unwrap());
        assert_eq!(board.en_passant_target(), Some(19)); // d3
        assert_consistent(&board);

        board.make(move_from_uci("e4d3").unwrap());
        assert_eq!(board.piece_at(27), None, "captured pawn leaves d4");
        assert_eq!(
            board.piece_at(19),
            Some(Piece::new(Color::Black, PieceKind::Pawn))
        );
        assert_consistent(&board);

        assert!(board.unmake());
        assert!(board.unmake());
        assert_boards_identical(&board, &initial);
    }

    #[test]
    fn promotion_to_king_and_round_trip() {
        let mut board =
            Board::from_fen(Variant::Suicide, "8/5P2/8/8/8/8/8/7b w - - 0 1").unwrap();
        let initial = board.clone();

        board.make(move_from_uci("f7f8k").unwrap());
        assert_eq!(
            board.piece_at(61),
            Some(Piece::new(Color::White, PieceKind::King))
        );
        assert_eq!(board.piece_bitboard(Color::White, PieceKind::Pawn), 0);
        assert_consistent(&board);

        assert!(board.unmake());
        assert_boards_identical(&board, &initial);
    }

    #[test]
    fn capture_promotion_round_trip() {
        let mut board =
            Board::from_fen(Variant::Suicide, "6n1/5P2/8/8/8/8/8/8 w - - 0 1").unwrap();
        let initial = board.clone();

        board.make(move_from_uci("f7g8q").unwrap());
        assert_eq!(
            board.piece_at(62),
            Some(Piece::new(Color::White, PieceKind::Queen))
        );
        assert_eq!(board.num_pieces(Color::Black), 0);
        assert_consistent(&board);

        assert!(board.unmake());
        assert_boards_identical(&board, &initial);
    }

    #[test]
    fn castling_round_trip_in_standard_variant() {
        let mut board = Board::from_fen(
            Variant::Standard,
            "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let initial = board.clone();

        assert!(board.can_castle(CastleSide::KingSide));
        assert!(board.can_castle(CastleSide::QueenSide));

        board.make(move_from_uci("e1g1").unwrap());
        assert_eq!(
            board.piece_at(5),
            Some(Piece::new(Color::White, PieceKind::Rook)),
            "rook teleports to f1"
        );
        assert_eq!(
            board.castling_rights(),
            CASTLE_BLACK_KINGSIDE | CASTLE_BLACK_QUEENSIDE,
            "white rights are gone after castling"
        );
        assert_consistent(&board);

        board.make(move_from_uci("e8c8").unwrap());
        assert_eq!(
            board.piece_at(59),
            Some(Piece::new(Color::Black, PieceKind::Rook)),
            "rook teleports to d8"
        );
        assert_consistent(&board);

        assert!(board.unmake());
        assert!(board.unmake());
        assert_boards_identical(&board, &initial);
    }

    #[test]
    fn rook_moves_clear_castling_rights() {
        let mut board = Board::from_fen(
            Variant::Standard,
            "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
        )
        .unwrap();

        board.make(move_from_uci("a1a2").unwrap());
        board.make(move_from_uci("h8h7").unwrap());
        assert_eq!(
            board.castling_rights(),
            CASTLE_WHITE_KINGSIDE | CASTLE_BLACK_QUEENSIDE
        );
        assert_consistent(&board);
    }

    #[test]
    fn fen_round_trip_through_board() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1",
            "8/5P2/8/8/8/8/8/7b w - - 0 1",
            "8/8/8/8/8/Np6/1p6/1r6 w - - 0 1",
        ];
        for fen in fens {
            let board = Board::from_fen(Variant::Suicide, fen).unwrap();
            assert_eq!(board.to_fen(), fen);
        }
    }

    #[test]
    fn fen_without_clocks_is_accepted() {
        let board = Board::from_fen(Variant::Suicide, "8/8/8/8/8/8/5p2/7K b - -").unwrap();
        assert_eq!(board.to_fen(), "8/8/8/8/8/8/5p2/7K b - - 0 1");
    }

    #[test]
    fn set_piece_rebuilds_consistent_bitboards() {
        let mut board = Board::from_fen(Variant::Suicide, "8/8/8/8/8/8/8/8 w - - 0 1").unwrap();
        board.set_piece(27, Some(Piece::new(Color::White, PieceKind::Bishop)));
        board.set_piece(36, Some(Piece::new(Color::Black, PieceKind::Knight)));
        board.set_side_to_move(Color::Black);

        assert_eq!(board.num_pieces(Color::White), 1);
        assert_eq!(board.num_pieces(Color::Black), 1);
        assert_eq!(board.to_fen(), "8/8/8/4n3/8/3B4/8/8 b - - 0 1");

        board.set_piece(27, None);
        assert_eq!(board.num_pieces(Color::White), 0);
    }

    #[test]
    fn zobrist_differs_for_en_passant_and_side() {
        let with_ep =
            Board::from_fen(Variant::Suicide, "8/8/8/8/4p3/8/8/8 b - e3 0 1").unwrap();
        let without_ep =
            Board::from_fen(Variant::Suicide, "8/8/8/8/4p3/8/8/8 b - - 0 1").unwrap();
        assert_ne!(with_ep.zobrist_key(), without_ep.zobrist_key());

        let white_to_move =
            Board::from_fen(Variant::Suicide, "8/8/8/8/4p3/8/8/8 w - - 0 1").unwrap();
        assert_ne!(without_ep.zobrist_key(), white_to_move.zobrist_key());
    }

    #[test]
    fn deep_make_unmake_preserves_key() {
        let mut board = Board::new(Variant::Suicide);
        let root_key = board.zobrist_key();

        // Shuffle knights back and forth; the final position equals the
        // starting one except for the en-passant/castling state, which is
        // empty throughout.
        for _ in 0..50 {
            board.make(pack_move(1, 16, None)); // Nb1-a3
            board.make(pack_move(57, 40, None)); // Nb8-a6
            board.make(pack_move(16, 1, None));
            board.make(pack_move(40, 57, None));
        }
        assert_eq!(board.zobrist_key(), root_key);
        assert_eq!(board.ply(), 200);

        while board.unmake() {}
        assert_eq!(board.zobrist_key(), root_key);
        assert_eq!(board.ply(), 0);
    }
}
