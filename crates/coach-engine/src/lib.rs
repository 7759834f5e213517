//! Game evaluation and critical-moment detection.
//!
//! An [`Oracle`] scores positions from the side to move's point of view. The
//! [`Evaluator`] makes every query fail-soft, and the [`Pipeline`] turns those
//! scores into White-relative charts and ranked lists of a player's worst
//! moves.

pub mod cancel;
pub mod config;
pub mod detector;
pub mod display;
pub mod error;
pub mod evaluator;
pub mod http;
pub mod oracle;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod scanner;
pub mod score;
pub mod uci;

pub use cancel::CancelFlag;
pub use config::{OracleBackend, PipelineConfig};
pub use detector::{CriticalMoment, DetectionPolicy, Severity};
pub use error::AnalysisError;
pub use evaluator::Evaluator;
pub use oracle::{Evaluation, Oracle, OracleReply};
pub use pipeline::{BatchReport, GameScan, Pipeline, SkippedGame};
pub use progress::{ChannelSink, Progress, ProgressCadence, ProgressSink};
pub use score::{EvalScore, NormalizedScore};
