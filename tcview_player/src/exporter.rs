//! JSON exporter for playback summaries.
//!
//! Records per-frame actor counts and churn so a run can be inspected or
//! diffed without re-rendering.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tcview_core::FrameStats;

/// Summary of one rendered frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    /// Frame number within the session
    pub frame: u64,

    /// Live T cell actors after the frame
    pub tcells: usize,

    /// Live dendritic cell actors after the frame
    pub dcells: usize,

    /// Bond actors after the frame
    pub bonds: usize,

    /// Reconciliation churn
    pub churn: FrameStats,
}

/// Record-level problems skipped during playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedFrame {
    pub message: String,
}

/// Complete playback export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackExport {
    /// Position file that was played
    pub source: String,

    /// All rendered frames
    pub frames: Vec<FrameSummary>,

    /// Frames skipped because of bad records
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub skipped: Vec<SkippedFrame>,

    /// Most T cells alive in any frame
    pub peak_tcells: usize,

    /// True if playback reached end of stream
    pub completed: bool,
}

impl PlaybackExport {
    /// Creates a new export container.
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            frames: Vec::new(),
            skipped: Vec::new(),
            peak_tcells: 0,
            completed: false,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: FrameSummary) {
        self.peak_tcells = self.peak_tcells.max(frame.tcells);
        self.frames.push(frame);
    }

    /// Notes a skipped frame.
    pub fn add_skipped(&mut self, message: impl Into<String>) {
        self.skipped.push(SkippedFrame {
            message: message.into(),
        });
    }

    /// Marks the run as finished.
    pub fn finalize(&mut self, completed: bool) {
        self.completed = completed;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
