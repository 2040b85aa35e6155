//! Playback Controller - drives a [`Scene`] from a position stream.
//!
//! # State machine
//!
//! ```text
//! Idle --start--> Playing <--pause/resume--> Paused
//!                    |                          |
//!                    +-----stop / end of stream-+--> Stopped --start--> Playing
//! ```
//!
//! The controller does not own a clock. Whoever owns the timer calls
//! [`Player::advance`] on every tick; the [`PlaybackTimer`] handed to
//! [`Player::start`] is only used to halt that timer when playback stops.

use crate::config::ViewerConfig;
use crate::error::ViewError;
use crate::interaction::InteractionState;
use crate::record_stream::{FrameReader, ReadOutcome};
use crate::scene::{FrameStats, Scene};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tcview_env::{FrameCapture, ImageFormat, RenderGateway};
use tracing::{debug, error, info, warn};

/// Playback lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Stopped,
}

/// What one call to [`Player::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing is playing
    Idle,

    /// Paused; no frame consumed
    Held,

    /// A frame was read and rendered
    Rendered { frame: u64, stats: FrameStats },

    /// The stream ran out and playback stopped
    EndOfStream,
}

/// Handle to the periodic timer driving playback.
pub trait PlaybackTimer {
    /// Halts the timer. Called at most once per session.
    fn stop(&mut self);
}

/// Capture armed for the current session.
#[derive(Debug, Clone)]
struct CaptureSession {
    basename: String,
    format: ImageFormat,
}

impl CaptureSession {
    fn path_for(&self, frame: u64) -> PathBuf {
        frame_path(&self.basename, frame, self.format)
    }
}

/// Builds `<basename><frame:05d>.<ext>`.
pub fn frame_path(basename: &str, frame: u64, format: ImageFormat) -> PathBuf {
    PathBuf::from(format!("{}{:05}.{}", basename, frame, format.extension()))
}

/// Plays a position stream into a scene.
pub struct Player<G> {
    scene: Scene<G>,
    state: PlaybackState,
    reader: Option<FrameReader<Box<dyn BufRead>>>,
    timer: Option<Box<dyn PlaybackTimer>>,
    capture: Option<CaptureSession>,
    frame_counter: u64,
    interaction: InteractionState,
}

impl<G: RenderGateway + FrameCapture> Player<G> {
    /// Creates an idle player around a fresh scene.
    pub fn new(gateway: G, config: ViewerConfig) -> Self {
        Self::with_scene(Scene::new(gateway, config))
    }

    /// Creates an idle player around an existing scene.
    pub fn with_scene(scene: Scene<G>) -> Self {
        let interaction = InteractionState::new(scene.config().zoom_level);
        Self {
            scene,
            state: PlaybackState::Idle,
            reader: None,
            timer: None,
            capture: None,
            frame_counter: 0,
            interaction,
        }
    }

    /// Opens `path` and starts playing it.
    ///
    /// With `save` set, every rendered frame is captured to
    /// `<save><frame:05d>.<ext>` in the configured capture format.
    ///
    /// # Errors
    /// * `ViewError::StreamOpen` - the file could not be opened; the player
    ///   is left as it was
    pub fn start(
        &mut self,
        path: impl AsRef<Path>,
        timer: Box<dyn PlaybackTimer>,
        save: Option<String>,
    ) -> Result<(), ViewError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| {
            error!("Open failure on position file {}", path.display());
            ViewError::StreamOpen {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!("Playing {}", path.display());
        self.start_reader(BufReader::new(file), timer, save)
    }

    /// Starts playing an already opened stream.
    pub fn start_reader<R: BufRead + 'static>(
        &mut self,
        reader: R,
        timer: Box<dyn PlaybackTimer>,
        save: Option<String>,
    ) -> Result<(), ViewError> {
        if self.is_active() {
            self.stop();
        }
        if self.scene.has_rendered() {
            self.scene.cleanup()?;
        }

        self.reader = Some(FrameReader::new(Box::new(reader)));
        self.timer = Some(timer);
        self.frame_counter = 0;
        self.capture = save.map(|basename| {
            let format = self.scene.config().capture_format;
            info!("Capturing frames to {}NNNNN.{}", basename, format.extension());
            CaptureSession { basename, format }
        });
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// Consumes and renders one frame.
    ///
    /// # Errors
    /// * `ViewError::Parse` - the frame was malformed and skipped; playback
    ///   continues with the next frame
    /// * `ViewError::Internal` - playback is stopped before returning
    /// * `ViewError::StreamRead`, `ViewError::Gateway`,
    ///   `ViewError::TagOutOfRange` - playback stays active
    pub fn advance(&mut self) -> Result<Tick, ViewError> {
        match self.state {
            PlaybackState::Idle | PlaybackState::Stopped => return Ok(Tick::Idle),
            PlaybackState::Paused => return Ok(Tick::Held),
            PlaybackState::Playing => {}
        }

        let outcome = match self.reader.as_mut() {
            Some(reader) => reader.next_frame()?,
            None => ReadOutcome::EndOfStream { discarded: 0 },
        };

        let frame = match outcome {
            ReadOutcome::Frame(frame) => frame,
            ReadOutcome::EndOfStream { .. } => {
                info!("No more data");
                self.stop();
                return Ok(Tick::EndOfStream);
            }
        };

        let stats = match self.scene.render_frame(&frame) {
            Ok(stats) => stats,
            Err(e) if e.is_internal() => {
                error!("Stopping playback: {}", e);
                self.stop();
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let number = self.frame_counter;
        if let Some(session) = &self.capture {
            let path = session.path_for(number);
            let image = self.scene.gateway_mut().capture()?;
            self.scene.gateway().write(&image, &path, session.format)?;
            debug!("Captured frame {} to {}", number, path.display());
        }
        self.frame_counter += 1;

        Ok(Tick::Rendered {
            frame: number,
            stats,
        })
    }

    /// Holds playback on the current frame.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Continues after [`Player::pause`].
    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Ends the session: releases capture, closes the stream and halts the
    /// timer. Calling it again does nothing.
    pub fn stop(&mut self) {
        if !self.is_active() {
            return;
        }
        self.capture = None;
        if let Some(reader) = self.reader.take() {
            debug!("Closed stream after {} frames", reader.frames_read());
        }
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }
        self.state = PlaybackState::Stopped;
        info!("Playback stopped");
    }

    /// Captures the current view to `path`.
    pub fn save_snapshot(&mut self, path: impl AsRef<Path>, format: ImageFormat) -> Result<(), ViewError> {
        let path = path.as_ref();
        let image = self.scene.gateway_mut().capture()?;
        self.scene.gateway().write(&image, path, format)?;
        debug!("Snapshot written to {}", path.display());
        Ok(())
    }

    /// Writes `<basename><number:05d>.png` and advances the frame counter.
    pub fn record(&mut self, basename: &str, number: u64) -> Result<PathBuf, ViewError> {
        let path = frame_path(basename, number, ImageFormat::Png);
        self.save_snapshot(&path, ImageFormat::Png)?;
        self.frame_counter += 1;
        Ok(path)
    }

    /// Zooms the camera and tracks the accumulated level.
    pub fn zoom(&mut self, factor: f64) {
        if factor > 0.0 && factor.is_finite() {
            self.interaction.zoom_by(factor);
            self.scene.gateway_mut().zoom_camera(factor);
        } else {
            warn!("Ignoring zoom factor {}", factor);
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Returns true while playing and not paused.
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Returns true while a session is open, paused or not.
    pub fn is_active(&self) -> bool {
        matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
    }

    /// Returns true if frames are being captured.
    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Next frame number.
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn interaction_mut(&mut self) -> &mut InteractionState {
        &mut self.interaction
    }

    pub fn scene(&self) -> &Scene<G> {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene<G> {
        &mut self.scene
    }
}
