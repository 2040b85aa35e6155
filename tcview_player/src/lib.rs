//! TCView player: timer-driven playback, synthetic streams and exports.
//!
//! # Usage
//!
//! ```ignore
//! use tcview_player::{play_file, PlayOptions};
//! use tcview_core::{Player, ViewerConfig};
//! use tcview_env::HeadlessScene;
//!
//! let mut player = Player::new(HeadlessScene::new(800, 600), ViewerConfig::default());
//! let report = play_file(&mut player, "cells.pos", &PlayOptions::default(), None).await?;
//! ```

mod error;
mod exporter;
mod generator;
mod session;
mod timer;
pub mod visualizer;

pub use error::PlayerError;
pub use exporter::{FrameSummary, PlaybackExport, SkippedFrame};
pub use generator::{generate, write_frame, GenerateSummary, GeneratorConfig, SyntheticSimulation};
pub use session::{play_file, play_reader, PlayOptions, PlaybackReport};
pub use timer::{FrameTimer, TimerHandle};
pub use visualizer::RerunGateway;
