//! Critical-moment detection: which of one player's moves gave away the most.

use chess_core::{FenPosition, GameHistory};
use serde::{Serialize, Serializer};
use shakmaty::Color;
use tracing::{debug, info};

use crate::cancel::CancelFlag;
use crate::error::AnalysisError;
use crate::evaluator::Evaluator;
use crate::progress::{Progress, ProgressSink};
use crate::score::EvalScore;

/// Severity thresholds (centipawn loss)
const THRESHOLD_INACCURACY: i32 = 100;
const THRESHOLD_MISTAKE: i32 = 200;

pub const DEFAULT_THRESHOLD_CP: i32 = 100;
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Inaccuracy,
    Mistake,
    Blunder,
}

impl Severity {
    pub fn from_loss(loss: i32) -> Self {
        if loss < THRESHOLD_INACCURACY {
            Severity::Inaccuracy
        } else if loss < THRESHOLD_MISTAKE {
            Severity::Mistake
        } else {
            Severity::Blunder
        }
    }
}

fn serialize_color<S: Serializer>(color: &Color, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(match color {
        Color::White => "White",
        Color::Black => "Black",
    })
}

/// A move that cost its player more than the detection threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalMoment {
    /// Full-move number from the FEN before the move
    pub move_number: u32,
    /// Index into the game's history; `history[ply]` is `position_fen`
    pub ply: usize,
    #[serde(serialize_with = "serialize_color")]
    pub player_color: Color,
    pub position_fen: FenPosition,
    pub player_move: String,
    pub engine_best_move: String,
    /// Centipawns lost, from the mover's own point of view; always positive
    pub evaluation_drop: i32,
    pub severity: Severity,
    #[serde(rename = "gameUrl")]
    pub game_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionPolicy {
    pub threshold_cp: i32,
    pub top_k: usize,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            threshold_cp: DEFAULT_THRESHOLD_CP,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Centipawns the mover gave up, measured from the mover's own side.
///
/// `before` was computed with the mover to move; `after` with the opponent to
/// move. Positive is always bad for the mover, whatever their color.
pub fn loss_for_mover(before: EvalScore, after: EvalScore) -> i32 {
    let before_own = before.cp();
    let after_own = -after.cp();
    before_own - after_own
}

/// Every move by `target` whose loss exceeds `threshold_cp`, in the order the
/// moves were played. Opponent moves are only replayed, never evaluated.
pub async fn detect_moments(
    evaluator: &Evaluator,
    history: &GameHistory,
    target: Color,
    game_id: &str,
    sink: &mut dyn ProgressSink,
    cancel: &CancelFlag,
    threshold_cp: i32,
) -> Result<Vec<CriticalMoment>, AnalysisError> {
    let positions = history.positions();
    let moves = history.moves();
    let total = moves.iter().filter(|mv| mv.color == target).count();

    let mut moments = Vec::new();
    let mut analyzed = 0usize;

    for (ply, mv) in moves.iter().enumerate() {
        if mv.color != target {
            continue;
        }
        if cancel.is_cancelled() {
            info!(game_id, analyzed, total, "Detection cancelled");
            sink.report(Progress::Incomplete);
            return Err(AnalysisError::Cancelled);
        }
        analyzed += 1;
        sink.report(Progress::AnalyzingMove {
            current: analyzed,
            total,
        });

        let before = evaluator.evaluate(&positions[ply]).await;
        let after = evaluator.evaluate(&positions[ply + 1]).await;
        let loss = loss_for_mover(before.score, after.score);

        if loss > threshold_cp && loss > 0 {
            debug!(game_id, ply, san = %mv.san, loss, "Critical moment");
            moments.push(CriticalMoment {
                move_number: positions[ply].fullmove_number(),
                ply,
                player_color: mv.color,
                position_fen: positions[ply].clone(),
                player_move: mv.san.clone(),
                engine_best_move: before.best_move,
                evaluation_drop: loss,
                severity: Severity::from_loss(loss),
                game_id: game_id.to_string(),
            });
        }
    }

    sink.report(Progress::Complete);
    Ok(moments)
}

/// Worst first; equal losses keep their encounter order.
pub fn rank_moments(mut moments: Vec<CriticalMoment>, top_k: usize) -> Vec<CriticalMoment> {
    moments.sort_by(|a, b| b.evaluation_drop.cmp(&a.evaluation_drop));
    moments.truncate(top_k);
    moments
}

/// `detect_moments` for a single game, ranked and cut to `policy.top_k`.
pub async fn find_critical_moments(
    evaluator: &Evaluator,
    history: &GameHistory,
    target: Color,
    game_id: &str,
    sink: &mut dyn ProgressSink,
    cancel: &CancelFlag,
    policy: DetectionPolicy,
) -> Result<Vec<CriticalMoment>, AnalysisError> {
    let moments =
        detect_moments(evaluator, history, target, game_id, sink, cancel, policy.threshold_cp)
            .await?;
    Ok(rank_moments(moments, policy.top_k))
}
