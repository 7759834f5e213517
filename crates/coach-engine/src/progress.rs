//! Progress notifications for long-running scans.
//!
//! Purely informational: a sink may buffer, throttle or drop events without
//! affecting results. Within one run events arrive in position order and the
//! terminal event (`Complete` or `Incomplete`) is always last.

use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Full-history scan reached position `current` (1-based) of `total`
    Evaluating { current: usize, total: usize },
    /// Critical-moment detection reached the target player's `current`-th
    /// move (1-based) of the `total` moves that player made
    AnalyzingMove { current: usize, total: usize },
    /// An event from game `index` (1-based) of a batch
    Game {
        index: usize,
        total: usize,
        event: Box<Progress>,
    },
    Complete,
    Incomplete,
}

impl Progress {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Progress::Complete | Progress::Incomplete)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Evaluating { current, total } => {
                write!(f, "Evaluating position {current} of {total}...")
            }
            Progress::AnalyzingMove { current, total } => {
                write!(f, "Analyzing move {current} of {total}...")
            }
            Progress::Game {
                index,
                total,
                event,
            } => write!(f, "Game {index}/{total}: {event}"),
            Progress::Complete => f.write_str("Analysis complete."),
            Progress::Incomplete => f.write_str("Analysis incomplete: cancelled."),
        }
    }
}

pub trait ProgressSink: Send {
    fn report(&mut self, event: Progress);
}

impl<F> ProgressSink for F
where
    F: FnMut(Progress) + Send,
{
    fn report(&mut self, event: Progress) {
        self(event)
    }
}

/// Forwards events into a channel; a closed receiver just drops them.
pub struct ChannelSink(pub UnboundedSender<Progress>);

impl ProgressSink for ChannelSink {
    fn report(&mut self, event: Progress) {
        let _ = self.0.send(event);
    }
}

/// How often intermediate progress is reported during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCadence {
    every: usize,
}

impl ProgressCadence {
    pub fn every(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }

    /// Report on every `every`-th index and always on the last one.
    pub fn should_report(&self, index: usize, total: usize) -> bool {
        index % self.every == 0 || index + 1 == total
    }
}

impl Default for ProgressCadence {
    fn default() -> Self {
        Self::every(5)
    }
}
