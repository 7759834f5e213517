//! Pool of UCI engine processes with scoped checkout.
//!
//! A checked-out engine belongs to exactly one evaluation. It goes back to the
//! idle list only through `PooledEngine::checkin`, which callers invoke after a
//! search finished cleanly. Dropping the guard instead (error, timeout, or the
//! caller abandoning the future) kills the process, because its output stream
//! may still carry lines from the abandoned search. The semaphore permit is
//! released either way.

use std::sync::Mutex;

use async_trait::async_trait;
use chess_core::FenPosition;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info};

use crate::error::AnalysisError;
use crate::oracle::{Oracle, OracleReply};
use crate::uci::{EngineCommand, SearchLimit, UciEngine};

pub struct EnginePool {
    command: EngineCommand,
    limit: SearchLimit,
    idle: Mutex<Vec<UciEngine>>,
    permits: Semaphore,
    size: usize,
}

impl EnginePool {
    /// Engines are spawned lazily on first checkout; see `warm_up`.
    pub fn new(command: EngineCommand, size: usize, limit: SearchLimit) -> Self {
        let size = size.max(1);
        Self {
            command,
            limit,
            idle: Mutex::new(Vec::with_capacity(size)),
            permits: Semaphore::new(size),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Spawn every engine up front so the first evaluations don't pay for the
    /// UCI handshake.
    pub async fn warm_up(&self) -> Result<(), AnalysisError> {
        let mut spawned = Vec::with_capacity(self.size);
        for engine_id in 0..self.size {
            spawned.push(UciEngine::spawn(&self.command).await?);
            info!(engine_id, "Engine ready");
        }
        self.lock_idle().extend(spawned);
        Ok(())
    }

    /// Wait for a free slot and take an idle engine, spawning one if none is
    /// idle.
    pub async fn checkout(&self) -> Result<PooledEngine<'_>, AnalysisError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AnalysisError::OracleUnavailable("engine pool closed".into()))?;

        let reused = self.lock_idle().pop();
        let engine = match reused {
            Some(engine) => engine,
            None => {
                debug!(path = %self.command.path, "Spawning engine");
                UciEngine::spawn(&self.command).await?
            }
        };

        Ok(PooledEngine {
            pool: self,
            engine: Some(engine),
            _permit: permit,
        })
    }

    pub fn idle_count(&self) -> usize {
        self.lock_idle().len()
    }

    /// Quit all idle engines.
    pub async fn shutdown(&self) {
        let engines: Vec<UciEngine> = std::mem::take(&mut *self.lock_idle());
        info!(count = engines.len(), "Shutting down engines");
        for mut engine in engines {
            engine.quit().await;
        }
    }

    fn lock_idle(&self) -> std::sync::MutexGuard<'_, Vec<UciEngine>> {
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exclusive handle on one engine for the duration of a search.
pub struct PooledEngine<'a> {
    pool: &'a EnginePool,
    engine: Option<UciEngine>,
    _permit: SemaphorePermit<'a>,
}

impl PooledEngine<'_> {
    pub async fn evaluate(&mut self, position: &FenPosition) -> Result<OracleReply, AnalysisError> {
        let limit = self.pool.limit;
        match self.engine.as_mut() {
            Some(engine) => engine.evaluate(position, limit).await,
            None => Err(AnalysisError::OracleUnavailable("engine already returned".into())),
        }
    }

    /// Return the engine to the pool. Only call after a completed search.
    pub fn checkin(mut self) {
        if let Some(engine) = self.engine.take() {
            self.pool.lock_idle().push(engine);
        }
    }
}

impl Drop for PooledEngine<'_> {
    fn drop(&mut self) {
        if self.engine.take().is_some() {
            debug!("Discarding engine that was not checked in");
        }
    }
}

#[async_trait]
impl Oracle for EnginePool {
    async fn query(&self, position: &FenPosition) -> Result<OracleReply, AnalysisError> {
        let mut engine = self.checkout().await?;
        let reply = engine.evaluate(position).await?;
        engine.checkin();
        Ok(reply)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// A UCI "engine" written in sh that answers every search with `go_reply`.
    fn fake_engine(go_reply: &str) -> EngineCommand {
        let script = format!(
            r#"while read -r line; do
  case "$line" in
    uci) echo "id name fake"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) {go_reply} ;;
    quit) exit 0 ;;
  esac
done"#
        );
        EngineCommand {
            path: "sh".to_string(),
            args: vec!["-c".to_string(), script],
        }
    }

    #[tokio::test]
    async fn test_query_and_reuse() {
        let pool = EnginePool::new(
            fake_engine(r#"echo "info depth 1 score cp 17 pv e2e4"; echo "bestmove e2e4""#),
            1,
            SearchLimit::Depth(1),
        );

        let reply = pool.query(&FenPosition::standard()).await.unwrap();
        assert_eq!(reply.cp, Some(17));
        assert_eq!(reply.best_move.as_deref(), Some("e2e4"));
        assert_eq!(pool.idle_count(), 1);

        pool.query(&FenPosition::standard()).await.unwrap();
        assert_eq!(pool.idle_count(), 1);
        pool.shutdown().await;
        assert_eq!(pool.idle_count(), 0);
    }

    #[tokio::test]
    async fn test_mated_position() {
        let pool = EnginePool::new(
            fake_engine(r#"echo "info depth 0 score mate 0"; echo "bestmove (none)""#),
            1,
            SearchLimit::Nodes(1000),
        );

        let reply = pool.query(&FenPosition::standard()).await.unwrap();
        assert_eq!(reply.mate, Some(0));
        assert_eq!(reply.best_move.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_crashed_engine_is_discarded() {
        let pool = EnginePool::new(fake_engine("exit 1"), 1, SearchLimit::Depth(1));

        assert!(matches!(
            pool.query(&FenPosition::standard()).await,
            Err(AnalysisError::OracleUnavailable(_))
        ));
        assert_eq!(pool.idle_count(), 0);

        // The permit came back, so the next query does not deadlock
        assert!(pool.query(&FenPosition::standard()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let pool = EnginePool::new(
            EngineCommand::new("/nonexistent/stockfish"),
            2,
            SearchLimit::Depth(1),
        );
        assert!(pool.warm_up().await.is_err());
        assert!(matches!(
            pool.checkout().await,
            Err(AnalysisError::OracleUnavailable(_))
        ));
    }
}
