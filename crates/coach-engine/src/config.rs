//! Pipeline configuration from environment variables

use std::env;
use std::time::Duration;

use crate::detector::{DetectionPolicy, DEFAULT_THRESHOLD_CP, DEFAULT_TOP_K};
use crate::error::AnalysisError;
use crate::progress::ProgressCadence;
use crate::uci::{EngineCommand, SearchLimit};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3001/v1/stockfish";
pub const DEFAULT_STOCKFISH_PATH: &str = "/usr/local/bin/stockfish";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OracleBackend {
    /// Remote evaluation service speaking JSON over HTTP
    Http { endpoint: String },
    /// Local UCI engine processes, one per pool slot
    Uci {
        command: EngineCommand,
        pool_size: usize,
    },
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub oracle: OracleBackend,

    /// Search depth or node budget per position (UCI backend)
    pub search: SearchLimit,

    /// Upper bound on a single evaluation; slower answers count as failures
    pub request_timeout: Duration,

    /// Minimum centipawn loss for a move to count as a critical moment
    pub mistake_threshold_cp: i32,

    /// How many of the worst moments a report keeps
    pub top_k: usize,

    /// Intermediate scan progress is reported every this many positions
    pub progress_every: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            oracle: OracleBackend::Http {
                endpoint: DEFAULT_ENDPOINT.to_string(),
            },
            search: SearchLimit::Depth(12),
            request_timeout: Duration::from_secs(10),
            mistake_threshold_cp: DEFAULT_THRESHOLD_CP,
            top_k: DEFAULT_TOP_K,
            progress_every: 5,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, AnalysisError> {
        let defaults = Self::default();
        let parsed = |key: &str| get(key).and_then(|v| v.trim().parse::<u64>().ok());

        let oracle = match get("ORACLE_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("http") => OracleBackend::Http {
                endpoint: get("ORACLE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            },
            Some("uci") | Some("stockfish") => OracleBackend::Uci {
                command: EngineCommand::new(
                    get("STOCKFISH_PATH").unwrap_or_else(|| DEFAULT_STOCKFISH_PATH.to_string()),
                ),
                pool_size: parsed("ENGINE_POOL_SIZE")
                    .map(|n| n as usize)
                    .unwrap_or_else(num_cpus::get),
            },
            Some(_) => {
                return Err(AnalysisError::Config(
                    "ORACLE_BACKEND must be 'http' or 'uci'",
                ))
            }
        };

        let search = match parsed("SEARCH_NODES") {
            Some(nodes) => SearchLimit::Nodes(nodes as u32),
            None => parsed("SEARCH_DEPTH")
                .map(|depth| SearchLimit::Depth(depth as u32))
                .unwrap_or(defaults.search),
        };

        let request_timeout = parsed("ORACLE_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_timeout);

        let mistake_threshold_cp = get("MISTAKE_THRESHOLD_CP")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.mistake_threshold_cp);

        let top_k = parsed("TOP_K")
            .map(|k| k as usize)
            .unwrap_or(defaults.top_k);

        let progress_every = parsed("PROGRESS_EVERY")
            .map(|n| n as usize)
            .unwrap_or(defaults.progress_every);

        Ok(Self {
            oracle,
            search,
            request_timeout,
            mistake_threshold_cp,
            top_k,
            progress_every,
        })
    }

    pub fn policy(&self) -> DetectionPolicy {
        DetectionPolicy {
            threshold_cp: self.mistake_threshold_cp,
            top_k: self.top_k,
        }
    }

    pub fn cadence(&self) -> ProgressCadence {
        ProgressCadence::every(self.progress_every)
    }
}
