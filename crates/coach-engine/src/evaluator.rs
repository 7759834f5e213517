//! Fail-soft position evaluation.
//!
//! A single failed evaluation must never abort a scan of hundreds of
//! positions, so every oracle failure (transport error, malformed reply,
//! timeout) collapses to a neutral result. The failure is only visible in the
//! log.

use std::sync::Arc;
use std::time::Duration;

use chess_core::FenPosition;
use tracing::warn;

use crate::error::AnalysisError;
use crate::oracle::{Evaluation, Oracle};

#[derive(Clone)]
pub struct Evaluator {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl Evaluator {
    pub fn new(oracle: Arc<dyn Oracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    /// Evaluate one position. Never fails: returns `Evaluation::neutral()` on
    /// any oracle error or when the oracle does not answer in time.
    pub async fn evaluate(&self, position: &FenPosition) -> Evaluation {
        match self.try_evaluate(position).await {
            Ok(eval) => eval,
            Err(e) => {
                warn!(fen = %position, error = %e, "Evaluation failed, using neutral score");
                Evaluation::neutral()
            }
        }
    }

    async fn try_evaluate(&self, position: &FenPosition) -> Result<Evaluation, AnalysisError> {
        let reply = tokio::time::timeout(self.timeout, self.oracle.query(position))
            .await
            .map_err(|_| AnalysisError::OracleTimeout(self.timeout))??;
        reply.into_evaluation()
    }
}
