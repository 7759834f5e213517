//! The position-evaluation oracle contract.

use async_trait::async_trait;
use chess_core::FenPosition;

use crate::error::AnalysisError;
use crate::score::{EvalScore, MATE_THRESHOLD, MAX_MATE_DISTANCE};

/// Raw answer from an engine for one position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleReply {
    /// Centipawn score (from engine's perspective, i.e., side to move)
    pub cp: Option<i32>,
    /// Mate in N moves (positive = side to move mates, negative = gets mated)
    pub mate: Option<i32>,
    /// Best move in UCI notation; empty when the engine has no legal move
    pub best_move: Option<String>,
}

/// Evaluator result: a side-to-move score plus the engine's preferred move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub score: EvalScore,
    pub best_move: String,
}

impl Evaluation {
    pub fn neutral() -> Self {
        Self {
            score: EvalScore::NEUTRAL,
            best_move: String::new(),
        }
    }
}

impl OracleReply {
    /// Mate reports win over centipawns. A reply missing either the score or
    /// the best-move field is malformed, as is a mate distance no engine
    /// could report. Centipawn scores are capped below the mate range.
    pub fn into_evaluation(self) -> Result<Evaluation, AnalysisError> {
        let score = match (self.mate, self.cp) {
            (Some(mate), _) if mate.unsigned_abs() > MAX_MATE_DISTANCE as u32 => {
                return Err(AnalysisError::MalformedReply(format!(
                    "mate distance {mate} out of range"
                )));
            }
            (Some(mate), _) => EvalScore::from_mate(mate),
            (None, Some(cp)) => EvalScore::from_cp(cp.clamp(-MATE_THRESHOLD, MATE_THRESHOLD)),
            (None, None) => {
                return Err(AnalysisError::MalformedReply("no score in reply".into()));
            }
        };
        let best_move = self
            .best_move
            .ok_or_else(|| AnalysisError::MalformedReply("no best move in reply".into()))?;

        Ok(Evaluation { score, best_move })
    }
}

/// Anything that can score a position: a UCI engine process, a pool of them,
/// or a remote evaluation service. Implementations report failures; the
/// `Evaluator` decides what a failure means for the pipeline.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn query(&self, position: &FenPosition) -> Result<OracleReply, AnalysisError>;
}
