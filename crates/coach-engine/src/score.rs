//! Centipawn scores and the one place their perspective is converted.
//!
//! Engines report scores relative to the side to move (`EvalScore`). Charts
//! and the evaluation bar want one fixed perspective (`NormalizedScore`,
//! White = positive). The two are distinct types so they cannot be mixed
//! without going through `to_fixed_reference`.

use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// Score assigned to "side to move is mated right now"; mate in N is
/// `MATE_SCORE - N`.
pub const MATE_SCORE: i32 = 30_000;

/// Any score with a larger magnitude encodes a forced mate.
pub const MATE_THRESHOLD: i32 = 29_000;

/// Longest mate that still encodes above `MATE_THRESHOLD`.
pub const MAX_MATE_DISTANCE: i32 = MATE_SCORE - MATE_THRESHOLD - 1;

/// Side every `NormalizedScore` is expressed for.
pub const REFERENCE_SIDE: Color = Color::White;

fn mate_distance(cp: i32) -> Option<u32> {
    (cp.abs() > MATE_THRESHOLD).then(|| (MATE_SCORE - cp.abs()).max(0) as u32)
}

/// Engine score in centipawns, relative to the side to move in the position
/// it was computed for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EvalScore(i32);

impl EvalScore {
    pub const NEUTRAL: Self = Self(0);

    /// Scores are kept within `±MATE_SCORE` so negation and differences
    /// never overflow.
    pub fn from_cp(cp: i32) -> Self {
        Self(cp.clamp(-MATE_SCORE, MATE_SCORE))
    }

    /// Encode "mate in `n`" for the side to move (`n < 0`: the side to move
    /// gets mated). `n == 0` means the side to move is already checkmated.
    /// Distances beyond `MAX_MATE_DISTANCE` are capped.
    pub fn from_mate(n: i32) -> Self {
        let n = n.clamp(-MAX_MATE_DISTANCE, MAX_MATE_DISTANCE);
        match n.signum() {
            0 => Self(-MATE_SCORE),
            sign => Self(sign * MATE_SCORE - n),
        }
    }

    pub fn cp(self) -> i32 {
        self.0
    }

    pub fn is_mate(self) -> bool {
        self.0.abs() > MATE_THRESHOLD
    }

    pub fn mate_distance(self) -> Option<u32> {
        mate_distance(self.0)
    }
}

/// Centipawn score from White's point of view. Positive = White is better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedScore(i32);

impl NormalizedScore {
    pub fn cp(self) -> i32 {
        self.0
    }

    pub fn is_mate(self) -> bool {
        self.0.abs() > MATE_THRESHOLD
    }

    pub fn mate_distance(self) -> Option<u32> {
        mate_distance(self.0)
    }
}

impl From<i32> for NormalizedScore {
    fn from(cp: i32) -> Self {
        Self(cp.clamp(-MATE_SCORE, MATE_SCORE))
    }
}

/// Re-express a side-to-move score for the fixed reference side.
pub fn to_fixed_reference(score: EvalScore, side_to_move: Color) -> NormalizedScore {
    if side_to_move == REFERENCE_SIDE {
        NormalizedScore(score.0)
    } else {
        NormalizedScore(-score.0)
    }
}
