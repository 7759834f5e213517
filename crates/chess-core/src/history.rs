//! FEN history: replays a game's move list and materializes the position
//! after every ply.

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position, Role};
use tracing::{debug, warn};

use crate::error::GameError;
use crate::game_data::GameRecord;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Exact textual encoding of a full board state (FEN).
///
/// Only constructed from a validated FEN or from a shakmaty position, so the
/// side-to-move and move-counter fields can be read back without re-parsing
/// the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FenPosition(String);

impl FenPosition {
    pub fn standard() -> Self {
        Self(STANDARD_START_FEN.to_string())
    }

    /// Validate a FEN string and store it in canonical form.
    pub fn parse(fen: &str) -> Result<Self, GameError> {
        let pos = setup_position(fen)?;
        Ok(Self::from_chess(&pos))
    }

    pub fn from_chess(pos: &Chess) -> Self {
        Self(Fen::from_position(pos, EnPassantMode::Legal).to_string())
    }

    pub fn to_chess(&self) -> Result<Chess, GameError> {
        setup_position(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Side to move, read from the second FEN field.
    pub fn side_to_move(&self) -> Color {
        match self.0.split_whitespace().nth(1) {
            Some("b") => Color::Black,
            _ => Color::White,
        }
    }

    /// Full-move counter, read from the sixth FEN field.
    pub fn fullmove_number(&self) -> u32 {
        self.0
            .split_whitespace()
            .nth(5)
            .and_then(|n| n.parse().ok())
            .unwrap_or(1)
    }
}

impl TryFrom<String> for FenPosition {
    type Error = GameError;

    fn try_from(fen: String) -> Result<Self, Self::Error> {
        Self::parse(&fen)
    }
}

impl From<FenPosition> for String {
    fn from(fen: FenPosition) -> Self {
        fen.0
    }
}

impl fmt::Display for FenPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn setup_position(fen: &str) -> Result<Chess, GameError> {
    let invalid = |reason: String| GameError::InvalidFen {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{e}")))
}

/// One ply as it was played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub san: String,
    pub uci: String,
    pub color: Color,
    /// Role of the captured piece, if this move captured one
    pub captured: Option<Role>,
}

/// Apply one SAN move to `pos`, checking legality.
pub fn apply_move(pos: &Chess, ply: usize, san: &str) -> Result<(Chess, PlayedMove), GameError> {
    let illegal = |reason: String| GameError::IllegalMove {
        ply,
        san: san.to_string(),
        reason,
    };

    let san_plus: SanPlus = san.parse().map_err(|e| illegal(format!("{e}")))?;
    let mv = san_plus
        .san
        .to_move(pos)
        .map_err(|e| illegal(format!("{e}")))?;

    let played = PlayedMove {
        san: san.to_string(),
        uci: mv.to_uci(CastlingMode::Standard).to_string(),
        color: pos.turn(),
        captured: mv.capture(),
    };
    let next = pos.clone().play(mv).map_err(|e| illegal(format!("{e}")))?;

    Ok((next, played))
}

/// Ordered positions of one game: `positions[0]` is the starting position and
/// `positions[i]` is the position after move `i`, so there is always exactly
/// one more position than there are moves.
#[derive(Debug, Clone)]
pub struct GameHistory {
    positions: Vec<FenPosition>,
    moves: Vec<PlayedMove>,
}

impl GameHistory {
    /// Replay `sans` from `start`. Any move that fails to apply makes the
    /// whole record malformed.
    pub fn build(start: &FenPosition, sans: &[String]) -> Result<Self, GameError> {
        let mut pos = start.to_chess().map_err(|e| GameError::MalformedGame(e.to_string()))?;
        let mut positions = Vec::with_capacity(sans.len() + 1);
        let mut moves = Vec::with_capacity(sans.len());
        positions.push(start.clone());

        for (ply, san) in sans.iter().enumerate() {
            let (next, played) =
                apply_move(&pos, ply, san).map_err(|e| GameError::MalformedGame(e.to_string()))?;
            positions.push(FenPosition::from_chess(&next));
            moves.push(played);
            pos = next;
        }

        debug!(plies = moves.len(), "Built FEN history");
        Ok(Self { positions, moves })
    }

    pub fn from_record(record: &GameRecord) -> Result<Self, GameError> {
        Self::build(&record.starting_position, &record.moves)
    }

    /// History holding only the starting position; used when a record cannot
    /// be replayed.
    pub fn starting_only(start: &FenPosition) -> Self {
        Self {
            positions: vec![start.clone()],
            moves: Vec::new(),
        }
    }

    /// Like `build`, but falls back to `starting_only` and hands the error back
    /// so the caller can skip analysis of this game.
    pub fn build_or_fallback(start: &FenPosition, sans: &[String]) -> (Self, Option<GameError>) {
        match Self::build(start, sans) {
            Ok(history) => (history, None),
            Err(e) => {
                warn!(error = %e, "Falling back to starting position only");
                (Self::starting_only(start), Some(e))
            }
        }
    }

    pub fn positions(&self) -> &[FenPosition] {
        &self.positions
    }

    pub fn moves(&self) -> &[PlayedMove] {
        &self.moves
    }

    pub fn starting_position(&self) -> &FenPosition {
        &self.positions[0]
    }

    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }
}
