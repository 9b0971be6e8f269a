//! Textual conversions: algebraic coordinates and FEN.

pub mod algebraic;
pub mod fen_generator;
pub mod fen_parser;
