//! Configured entry points: single-game scans and multi-game coaching batches.

use chess_core::material::CapturedMaterial;
use chess_core::{FenPosition, GameHistory, GameRecord};
use serde::Serialize;
use shakmaty::Color;
use tracing::{info, warn};

use crate::cancel::CancelFlag;
use crate::config::PipelineConfig;
use crate::detector::{self, CriticalMoment, DetectionPolicy};
use crate::error::AnalysisError;
use crate::evaluator::Evaluator;
use crate::progress::{Progress, ProgressCadence, ProgressSink};
use crate::scanner;
use crate::score::NormalizedScore;

/// Per-position scores for one game, in history order.
#[derive(Debug, Clone, Serialize)]
pub struct GameScan {
    pub game_id: String,
    pub positions: Vec<FenPosition>,
    pub scores: Vec<NormalizedScore>,
    /// Captured-material balance (White minus Black) at each position
    pub material_balance: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedGame {
    pub game_id: String,
    pub reason: String,
}

/// Input for the coaching report: the worst moments across all analyzable
/// games. An empty `moments` list means no major mistakes were found.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub moments: Vec<CriticalMoment>,
    pub analyzed_games: usize,
    pub skipped: Vec<SkippedGame>,
}

pub struct Pipeline {
    evaluator: Evaluator,
    policy: DetectionPolicy,
    cadence: ProgressCadence,
    cancel: CancelFlag,
}

impl Pipeline {
    pub fn new(evaluator: Evaluator, config: &PipelineConfig) -> Self {
        Self::with_policy(evaluator, config.policy(), config.cadence())
    }

    pub fn with_policy(evaluator: Evaluator, policy: DetectionPolicy, cadence: ProgressCadence) -> Self {
        Self {
            evaluator,
            policy,
            cadence,
            cancel: CancelFlag::new(),
        }
    }

    /// Share an existing cancellation flag instead of the pipeline's own.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that aborts the current and any later run when cancelled.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn policy(&self) -> DetectionPolicy {
        self.policy
    }

    pub async fn scan_history(
        &self,
        positions: &[FenPosition],
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<NormalizedScore>, AnalysisError> {
        scanner::scan_history(&self.evaluator, positions, sink, &self.cancel, self.cadence).await
    }

    pub async fn find_critical_moments(
        &self,
        history: &GameHistory,
        target: Color,
        game_id: &str,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<CriticalMoment>, AnalysisError> {
        detector::find_critical_moments(
            &self.evaluator,
            history,
            target,
            game_id,
            sink,
            &self.cancel,
            self.policy,
        )
        .await
    }

    /// Replay a record and score every position for charting.
    pub async fn scan_game(
        &self,
        record: &GameRecord,
        sink: &mut dyn ProgressSink,
    ) -> Result<GameScan, AnalysisError> {
        let history = GameHistory::from_record(record)?;
        let scores = self.scan_history(history.positions(), sink).await?;
        let material_balance = (0..history.positions().len())
            .map(|ply| CapturedMaterial::at_ply(history.moves(), ply).material_balance())
            .collect();
        Ok(GameScan {
            game_id: record.game_id(),
            positions: history.positions().to_vec(),
            scores,
            material_balance,
        })
    }

    /// Find `username`'s worst moves across `games`.
    ///
    /// Games the user did not play and games whose moves cannot be replayed
    /// are skipped and listed in the report; the rest still count. Moments from
    /// all games are ranked together.
    pub async fn analyze_batch(
        &self,
        games: &[GameRecord],
        username: &str,
        sink: &mut dyn ProgressSink,
    ) -> Result<BatchReport, AnalysisError> {
        let total = games.len();
        let mut moments = Vec::new();
        let mut skipped = Vec::new();
        let mut analyzed_games = 0;

        for (i, record) in games.iter().enumerate() {
            let game_id = record.game_id();

            let Some(color) = record.metadata.color_of(username) else {
                warn!(game_id = %game_id, username, "User did not play this game, skipping");
                skipped.push(SkippedGame {
                    game_id,
                    reason: format!("{username} is neither White nor Black"),
                });
                continue;
            };

            let (history, error) =
                GameHistory::build_or_fallback(&record.starting_position, &record.moves);
            if let Some(e) = error {
                warn!(game_id = %game_id, error = %e, "Skipping unreplayable game");
                skipped.push(SkippedGame {
                    game_id,
                    reason: e.to_string(),
                });
                continue;
            }

            info!(game_id = %game_id, plies = history.ply_count(), "Analyzing game");
            let mut game_sink = |event: Progress| {
                if !event.is_terminal() {
                    sink.report(Progress::Game {
                        index: i + 1,
                        total,
                        event: Box::new(event),
                    });
                }
            };

            let found = detector::detect_moments(
                &self.evaluator,
                &history,
                color,
                &game_id,
                &mut game_sink,
                &self.cancel,
                self.policy.threshold_cp,
            )
            .await;

            match found {
                Ok(found) => {
                    analyzed_games += 1;
                    moments.extend(found);
                }
                Err(AnalysisError::Cancelled) => {
                    sink.report(Progress::Incomplete);
                    return Err(AnalysisError::Cancelled);
                }
                Err(e) => {
                    warn!(game_id = %game_id, error = %e, "Analysis failed");
                    skipped.push(SkippedGame {
                        game_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        sink.report(Progress::Complete);
        info!(
            analyzed_games,
            skipped = skipped.len(),
            moments = moments.len(),
            "Batch analysis complete"
        );

        Ok(BatchReport {
            moments: detector::rank_moments(moments, self.policy.top_k),
            analyzed_games,
            skipped,
        })
    }
}
