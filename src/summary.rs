//! Summary - Post-session coaching text
//!
//! The coaching service is an external collaborator. It runs on its own
//! thread so ticks never wait on it, and any failure turns into a fixed
//! fallback message. The stats handed over are a copy; the session keeps its own.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::SummaryError;
use crate::race::session::SessionStats;

/// Shown whenever the summarizer cannot deliver
pub const FALLBACK_SUMMARY: &str =
    "Coaching notes are unavailable right now. Your lap times are still saved for this session.";

/// Default time allowed for a summary
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Turns session stats into free-form text
pub trait Summarizer: Send + Sync {
    fn summarize(&self, stats: &SessionStats) -> Result<String, SummaryError>;
}

impl<F> Summarizer for F
where
    F: Fn(&SessionStats) -> Result<String, SummaryError> + Send + Sync,
{
    fn summarize(&self, stats: &SessionStats) -> Result<String, SummaryError> {
        self(stats)
    }
}

/// Offline digest used when no coaching service is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDigest;

impl Summarizer for LocalDigest {
    fn summarize(&self, stats: &SessionStats) -> Result<String, SummaryError> {
        let Some(best) = stats.best_lap else {
            return Ok("No laps completed. Finish a full circuit to get lap feedback.".to_string());
        };

        let fastest = stats
            .laps
            .iter()
            .map(|l| l.max_speed)
            .fold(0.0_f32, f32::max);
        let off_track: u32 = stats.laps.iter().map(|l| l.off_track_count).sum();

        let mut text = format!(
            "{} laps, best {:.2}s, top speed {:.0}.",
            stats.total_laps, best, fastest
        );
        if off_track > 0 {
            text.push_str(&format!(" About {off_track}s spent off track; tidy up the corner exits."));
        } else {
            text.push_str(" Clean driving, no time lost off track.");
        }
        Ok(text)
    }
}

/// An in-flight summary call
pub struct SummaryRequest {
    rx: Receiver<Result<String, SummaryError>>,
    deadline: Instant,
    timeout: Duration,
    outcome: Option<Result<String, SummaryError>>,
    /// Text handed out once settled
    text: Option<String>,
}

impl SummaryRequest {
    /// Start the summarizer on a worker thread. Invokes it exactly once.
    pub fn spawn(summarizer: Arc<dyn Summarizer>, stats: SessionStats, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut request = Self {
            rx,
            deadline: Instant::now() + timeout,
            timeout,
            outcome: None,
            text: None,
        };

        let worker = thread::Builder::new()
            .name("summarizer".into())
            .spawn(move || {
                let result = summarizer.summarize(&stats);
                // Receiver may have given up already
                let _ = tx.send(result);
            });
        if let Err(e) = worker {
            request.settle(Err(SummaryError::Unavailable(e.to_string())));
        }

        request
    }

    /// Non-blocking check. `None` while the summarizer is still working.
    pub fn poll(&mut self) -> Option<String> {
        if self.outcome.is_none() {
            let result = match self.rx.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Disconnected) => Err(SummaryError::Panicked),
                Err(TryRecvError::Empty) if Instant::now() >= self.deadline => Err(self.timed_out()),
                Err(TryRecvError::Empty) => return None,
            };
            self.settle(result);
        }
        self.text.clone()
    }

    /// Block until the summary arrives or the deadline passes
    pub fn wait(mut self) -> String {
        if self.outcome.is_none() {
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            let result = match self.rx.recv_timeout(remaining) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => Err(self.timed_out()),
                Err(RecvTimeoutError::Disconnected) => Err(SummaryError::Panicked),
            };
            self.settle(result);
        }
        self.text.unwrap_or_else(|| FALLBACK_SUMMARY.to_string())
    }

    /// Raw result, once settled
    pub fn outcome(&self) -> Option<&Result<String, SummaryError>> {
        self.outcome.as_ref()
    }

    /// Record the final result. Fallbacks are logged here, once.
    fn settle(&mut self, result: Result<String, SummaryError>) {
        let text = match &result {
            Ok(text) if !text.trim().is_empty() => text.clone(),
            Ok(_) => {
                log::warn!("Summarizer returned empty text, using fallback");
                FALLBACK_SUMMARY.to_string()
            }
            Err(e) => {
                log::warn!("Summary failed ({}), using fallback", e);
                FALLBACK_SUMMARY.to_string()
            }
        };
        self.text = Some(text);
        self.outcome = Some(result);
    }

    fn timed_out(&self) -> SummaryError {
        SummaryError::TimedOut {
            ms: self.timeout.as_millis() as u64,
        }
    }
}
