//! Client for a JSON-over-HTTP evaluation service.
//!
//! Request: `POST {endpoint}` with `{"fen": "..."}`.
//! Response: `{"cp": 35, "bestMove": "e2e4"}` or `{"mate": -2, "bestMove": "..."}`;
//! `score` is accepted as an alias for `cp` and `best_move` for `bestMove`.

use std::time::Duration;

use async_trait::async_trait;
use chess_core::FenPosition;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::oracle::{Oracle, OracleReply};

#[derive(Serialize)]
struct EvalRequest<'a> {
    fen: &'a str,
}

#[derive(Debug, Deserialize)]
struct EvalResponse {
    mate: Option<i32>,
    score: Option<i32>,
    cp: Option<i32>,
    #[serde(rename = "bestMove", alias = "best_move")]
    best_move: Option<String>,
}

impl From<EvalResponse> for OracleReply {
    fn from(resp: EvalResponse) -> Self {
        OracleReply {
            cp: resp.score.or(resp.cp),
            // Some services send `"mate": 0` or null alongside a cp score
            mate: resp.mate.filter(|m| *m != 0),
            best_move: resp.best_move,
        }
    }
}

pub struct HttpOracle {
    client: Client,
    endpoint: String,
}

impl HttpOracle {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .user_agent("ChessCoach/1.0")
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::OracleUnavailable(format!("HTTP client setup: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn parse_reply(body: &str) -> Result<OracleReply, AnalysisError> {
    let resp: EvalResponse = serde_json::from_str(body)?;
    Ok(resp.into())
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn query(&self, position: &FenPosition) -> Result<OracleReply, AnalysisError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&EvalRequest {
                fen: position.as_str(),
            })
            .send()
            .await
            .map_err(|e| AnalysisError::OracleUnavailable(format!("Request error: {e}")))?;

        if !resp.status().is_success() {
            return Err(AnalysisError::OracleUnavailable(format!(
                "Evaluation service HTTP {}",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| AnalysisError::OracleUnavailable(format!("Response body: {e}")))?;
        parse_reply(&body)
    }
}
