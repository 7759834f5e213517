//! Full-history scan: one White-relative score per position, for charting.

use chess_core::FenPosition;
use tracing::info;

use crate::cancel::CancelFlag;
use crate::error::AnalysisError;
use crate::evaluator::Evaluator;
use crate::progress::{Progress, ProgressCadence, ProgressSink};
use crate::score::{to_fixed_reference, NormalizedScore};

/// Evaluate every position in order and normalize each score using the
/// side to move recorded in that position's FEN (not ply parity, since a
/// custom start may have Black to move).
///
/// Evaluations run strictly one after another. Cancellation is checked before
/// each one; a cancelled scan returns no scores at all.
pub async fn scan_history(
    evaluator: &Evaluator,
    positions: &[FenPosition],
    sink: &mut dyn ProgressSink,
    cancel: &CancelFlag,
    cadence: ProgressCadence,
) -> Result<Vec<NormalizedScore>, AnalysisError> {
    let total = positions.len();
    let mut scores = Vec::with_capacity(total);

    for (i, position) in positions.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(evaluated = i, total, "Scan cancelled");
            sink.report(Progress::Incomplete);
            return Err(AnalysisError::Cancelled);
        }
        if cadence.should_report(i, total) {
            sink.report(Progress::Evaluating {
                current: i + 1,
                total,
            });
        }

        let eval = evaluator.evaluate(position).await;
        scores.push(to_fixed_reference(eval.score, position.side_to_move()));
    }

    sink.report(Progress::Complete);
    Ok(scores)
}
