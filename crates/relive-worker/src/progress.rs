//! Progress channel.
//!
//! Every update is written as one `PROGRESS:{json}` line and flushed
//! immediately. Reported progress never decreases, stays below 100 until
//! the run succeeds, and nothing is written after a terminal message.

use std::io::{self, Write};
use std::sync::Mutex;

use relive_models::{ProgressMessage, ProgressStage};
use tracing::warn;

/// Line prefix recognised by supervising processes.
pub const PROGRESS_PREFIX: &str = "PROGRESS:";

/// Progress reported when rendering starts.
pub const RENDER_START: u8 = 75;
/// Highest progress reported before success.
pub const RENDER_END: u8 = 99;

struct EmitterState<W> {
    writer: W,
    last: u8,
    finished: bool,
}

/// Writes progress messages to a line-oriented sink.
pub struct ProgressEmitter<W: Write + Send> {
    state: Mutex<EmitterState<W>>,
}

impl ProgressEmitter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ProgressEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            state: Mutex::new(EmitterState {
                writer,
                last: 0,
                finished: false,
            }),
        }
    }

    /// Clamp and write a message. Returns whether a line was written.
    pub fn emit(&self, mut message: ProgressMessage) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.finished {
            return false;
        }

        message.progress = match message.stage {
            ProgressStage::Success => 100,
            ProgressStage::Error => state.last,
            _ => message.progress.min(RENDER_END).max(state.last),
        };
        state.last = message.progress;
        state.finished = message.stage.is_terminal();

        let line = match serde_json::to_string(&message) {
            Ok(json) => format!("{}{}\n", PROGRESS_PREFIX, json),
            Err(e) => {
                warn!("Failed to serialize progress message: {}", e);
                return false;
            }
        };
        let written = state
            .writer
            .write_all(line.as_bytes())
            .and_then(|_| state.writer.flush());
        if let Err(e) = written {
            warn!("Failed to write progress: {}", e);
            return false;
        }
        true
    }

    /// Report a named processing step.
    pub fn step(&self, progress: u8, step: &str, message: &str) -> bool {
        self.emit(ProgressMessage::step(ProgressStage::Processing, progress, step, message))
    }

    /// Report the start of rendering.
    pub fn rendering_started(&self, message: &str) -> bool {
        self.emit(ProgressMessage::step(
            ProgressStage::Rendering,
            RENDER_START,
            "Rendering video",
            message,
        ))
    }

    /// Map a rendered frame count onto 75-99; writes only when the value grows.
    pub fn rendering(&self, frame: usize, total: usize) -> bool {
        let progress = rendering_progress(frame, total);
        if progress <= self.last() {
            return false;
        }
        self.emit(ProgressMessage::rendering(progress))
    }

    pub fn success(&self, message: &str) -> bool {
        self.emit(ProgressMessage::success(message))
    }

    /// Report a fatal error at the last reported progress.
    pub fn error(&self, message: &str) -> bool {
        let last = self.last();
        self.emit(ProgressMessage::error(last, message))
    }

    /// Last progress value written.
    pub fn last(&self) -> u8 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).last
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).finished
    }

    pub fn into_inner(self) -> W {
        self.state.into_inner().unwrap_or_else(|e| e.into_inner()).writer
    }
}

/// Rendering progress for `frame` of `total` frames.
pub fn rendering_progress(frame: usize, total: usize) -> u8 {
    if total == 0 {
        return RENDER_START;
    }
    let span = (RENDER_END - RENDER_START) as usize;
    RENDER_START + (span * frame.min(total) / total) as u8
}

/// Parse the messages out of progress channel output.
pub fn parse_progress_lines(output: &str) -> Vec<ProgressMessage> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix(PROGRESS_PREFIX))
        .filter_map(|json| serde_json::from_str(json).ok())
        .collect()
}
