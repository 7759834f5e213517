//! UCI engine wrapper (Stockfish-compatible, async I/O)

use std::process::Stdio;

use chess_core::FenPosition;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use crate::error::AnalysisError;
use crate::oracle::OracleReply;

/// How long the engine searches each position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    Depth(u32),
    Nodes(u32),
}

impl SearchLimit {
    fn go_command(self) -> String {
        match self {
            SearchLimit::Depth(depth) => format!("go depth {depth}"),
            SearchLimit::Nodes(nodes) => format!("go nodes {nodes}"),
        }
    }
}

/// Program plus arguments used to launch an engine process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub path: String,
    pub args: Vec<String>,
}

impl EngineCommand {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
        }
    }
}

/// One engine process. Not safe to share: a search in flight owns the
/// process's output stream until `bestmove` arrives.
pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

fn engine_error(context: &str, e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::OracleUnavailable(format!("{context}: {e}"))
}

impl UciEngine {
    /// Spawn an engine process and complete the UCI handshake
    pub async fn spawn(command: &EngineCommand) -> Result<Self, AnalysisError> {
        let mut process = Command::new(&command.path)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| engine_error("Failed to spawn engine", e))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| AnalysisError::OracleUnavailable("engine stdin not piped".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| AnalysisError::OracleUnavailable("engine stdout not piped".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        // One thread per process; parallelism comes from the pool
        engine.send("setoption name Threads value 1").await?;
        engine.send("setoption name Hash value 64").await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), AnalysisError> {
        debug!(cmd, "UCI <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| engine_error("Failed to write to engine", e))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| engine_error("Failed to flush engine stdin", e))?;
        Ok(())
    }

    /// Read one line; a closed stream means the process died.
    async fn read_line(&mut self, line: &mut String) -> Result<(), AnalysisError> {
        line.clear();
        let read = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| engine_error("Failed to read from engine", e))?;
        if read == 0 {
            return Err(AnalysisError::OracleUnavailable(
                "engine closed its output".into(),
            ));
        }
        Ok(())
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), AnalysisError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "UCI >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Search a position and collect the last reported score and the best move.
    pub async fn evaluate(
        &mut self,
        position: &FenPosition,
        limit: SearchLimit,
    ) -> Result<OracleReply, AnalysisError> {
        self.send(&format!("position fen {position}")).await?;
        self.send(&limit.go_command()).await?;

        let mut reply = OracleReply::default();
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" score ") {
                if trimmed.contains("lowerbound") || trimmed.contains("upperbound") {
                    continue;
                }
                if let Some(cp) = parse_cp(trimmed) {
                    reply.cp = Some(cp);
                    reply.mate = None;
                }
                if let Some(mate) = parse_mate(trimmed) {
                    reply.mate = Some(mate);
                    reply.cp = None;
                }
            } else if trimmed.starts_with("bestmove") {
                reply.best_move = Some(parse_bestmove(trimmed));
                break;
            }
        }

        Ok(reply)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

fn parse_keyword_value(line: &str, keyword: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == keyword && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    parse_keyword_value(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    parse_keyword_value(line, "mate")
}

/// Parse the move from a `bestmove` line; `(none)` (no legal move) becomes empty.
fn parse_bestmove(line: &str) -> String {
    match line.split_whitespace().nth(1) {
        Some("(none)") | None => String::new(),
        Some(mv) => mv.to_string(),
    }
}
