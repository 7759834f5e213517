#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chess_core::{FenPosition, GameHistory, GameMetadata, GameRecord};
use coach_engine::{
    AnalysisError, CancelFlag, DetectionPolicy, Evaluator, Oracle, OracleReply, Pipeline,
    Progress, ProgressCadence,
};

pub const TIMEOUT: Duration = Duration::from_millis(200);

/// Oracle answering from a FEN-keyed script; unscripted positions get
/// `cp 0, e2e4`. Every query is recorded.
#[derive(Default)]
pub struct ScriptedOracle {
    replies: HashMap<String, OracleReply>,
    queried: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cp(mut self, position: &FenPosition, cp: i32) -> Self {
        self.replies.insert(
            position.as_str().to_string(),
            OracleReply {
                cp: Some(cp),
                mate: None,
                best_move: Some("e2e4".to_string()),
            },
        );
        self
    }

    pub fn reply(mut self, position: &FenPosition, reply: OracleReply) -> Self {
        self.replies.insert(position.as_str().to_string(), reply);
        self
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn query(&self, position: &FenPosition) -> Result<OracleReply, AnalysisError> {
        self.queried.lock().unwrap().push(position.as_str().to_string());
        Ok(self
            .replies
            .get(position.as_str())
            .cloned()
            .unwrap_or(OracleReply {
                cp: Some(0),
                mate: None,
                best_move: Some("e2e4".to_string()),
            }))
    }
}

/// Never answers within any reasonable timeout.
pub struct SleepyOracle;

#[async_trait]
impl Oracle for SleepyOracle {
    async fn query(&self, _: &FenPosition) -> Result<OracleReply, AnalysisError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(OracleReply::default())
    }
}

/// Always fails.
pub struct DownOracle;

#[async_trait]
impl Oracle for DownOracle {
    async fn query(&self, _: &FenPosition) -> Result<OracleReply, AnalysisError> {
        Err(AnalysisError::OracleUnavailable("connection refused".into()))
    }
}

/// Answers neutrally but raises `flag` on query number `after`.
pub struct CancellingOracle {
    pub flag: CancelFlag,
    pub after: usize,
    pub calls: Mutex<usize>,
}

#[async_trait]
impl Oracle for CancellingOracle {
    async fn query(&self, _: &FenPosition) -> Result<OracleReply, AnalysisError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls == self.after {
            self.flag.cancel();
        }
        Ok(OracleReply {
            cp: Some(0),
            mate: None,
            best_move: Some("e2e4".to_string()),
        })
    }
}

pub fn sans(moves: &[&str]) -> Vec<String> {
    moves.iter().map(|m| m.to_string()).collect()
}

pub fn history(start: &FenPosition, moves: &[&str]) -> GameHistory {
    GameHistory::build(start, &sans(moves)).unwrap()
}

/// Position reached after playing `moves` from the standard start.
pub fn position_after(moves: &[&str]) -> FenPosition {
    history(&FenPosition::standard(), moves)
        .positions()
        .last()
        .unwrap()
        .clone()
}

pub fn record(white: &str, black: &str, link: &str, moves: &[&str]) -> GameRecord {
    GameRecord {
        metadata: GameMetadata {
            white: white.to_string(),
            black: black.to_string(),
            result: "*".to_string(),
            link: Some(link.to_string()),
            ..Default::default()
        },
        starting_position: FenPosition::standard(),
        moves: sans(moves),
        pgn: String::new(),
    }
}

pub fn pipeline(oracle: Arc<dyn Oracle>, threshold_cp: i32, top_k: usize) -> Pipeline {
    Pipeline::with_policy(
        Evaluator::new(oracle, TIMEOUT),
        DetectionPolicy {
            threshold_cp,
            top_k,
        },
        ProgressCadence::every(5),
    )
}

/// Sink that keeps every event for later inspection.
pub fn recorder(events: &mut Vec<Progress>) -> impl FnMut(Progress) + Send + '_ {
    move |event| events.push(event)
}
