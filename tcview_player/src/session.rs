//! Timer-driven playback loop.

use crate::error::PlayerError;
use crate::exporter::{FrameSummary, PlaybackExport};
use crate::timer::FrameTimer;
use serde::Serialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tcview_core::{Player, Tick, ViewError};
use tcview_env::{FrameCapture, ImageFormat, RenderGateway};
use tracing::{info, warn};

/// How a playback session runs.
#[derive(Debug, Clone)]
pub struct PlayOptions {
    /// Time between frames
    pub interval: Duration,

    /// Capture every frame to `<save><frame:05d>.<ext>`
    pub save: Option<String>,

    /// Write one image of the final scene
    pub snapshot: Option<(PathBuf, ImageFormat)>,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            save: None,
            snapshot: None,
        }
    }
}

/// Outcome of a playback session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackReport {
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    pub completed: bool,
}

/// Plays a position file to the end.
pub async fn play_file<G: RenderGateway + FrameCapture>(
    player: &mut Player<G>,
    path: impl AsRef<Path>,
    options: &PlayOptions,
    export: Option<&mut PlaybackExport>,
) -> Result<PlaybackReport, PlayerError> {
    let timer = FrameTimer::new(options.interval);
    player.start(path, Box::new(timer.stop_handle()), options.save.clone())?;
    drive(player, timer, options, export).await
}

/// Plays an open stream to the end.
pub async fn play_reader<G: RenderGateway + FrameCapture, R: BufRead + 'static>(
    player: &mut Player<G>,
    reader: R,
    options: &PlayOptions,
    export: Option<&mut PlaybackExport>,
) -> Result<PlaybackReport, PlayerError> {
    let timer = FrameTimer::new(options.interval);
    player.start_reader(reader, Box::new(timer.stop_handle()), options.save.clone())?;
    drive(player, timer, options, export).await
}

async fn drive<G: RenderGateway + FrameCapture>(
    player: &mut Player<G>,
    mut timer: FrameTimer,
    options: &PlayOptions,
    mut export: Option<&mut PlaybackExport>,
) -> Result<PlaybackReport, PlayerError> {
    let mut report = PlaybackReport::default();

    while timer.tick().await {
        match player.advance() {
            Ok(Tick::Rendered { frame, stats }) => {
                report.frames_rendered += 1;
                if let Some(export) = export.as_mut() {
                    let scene = player.scene();
                    export.add_frame(FrameSummary {
                        frame,
                        tcells: scene.tcells().occupied_count(),
                        dcells: scene.dcells().occupied_count(),
                        bonds: scene.bond_actors().len(),
                        churn: stats,
                    });
                }
            }
            Ok(Tick::EndOfStream) => report.completed = true,
            Ok(Tick::Held) => {}
            Ok(Tick::Idle) => break,
            Err(e @ (ViewError::Parse { .. } | ViewError::TagOutOfRange { .. })) => {
                warn!("Skipping frame: {}", e);
                report.frames_skipped += 1;
                if let Some(export) = export.as_mut() {
                    export.add_skipped(e.to_string());
                }
            }
            Err(e) => {
                player.stop();
                return Err(e.into());
            }
        }
    }

    if let Some(export) = export.as_mut() {
        export.finalize(report.completed);
    }
    if let Some((path, format)) = &options.snapshot {
        player.save_snapshot(path, *format)?;
        info!("Saved snapshot to {}", path.display());
    }

    info!(
        "Played {} frames ({} skipped)",
        report.frames_rendered, report.frames_skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tcview_core::{PlaybackState, ViewerConfig};
    use tcview_env::HeadlessScene;

    fn options() -> PlayOptions {
        PlayOptions {
            interval: Duration::from_millis(1),
            ..PlayOptions::default()
        }
    }

    fn player() -> Player<HeadlessScene> {
        Player::new(HeadlessScene::new(16, 16), ViewerConfig::default())
    }

    fn stream(text: &str) -> Cursor<Vec<u8>> {
        Cursor::new(text.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_plays_to_end() {
        let mut p = player();
        let mut export = PlaybackExport::new("inline");
        let report = play_reader(
            &mut p,
            stream("T 0 1 2 3 0.5 0\nT 1 4 5 6 0.5 0\nE\nT 0 1 2 3 0.5 0\nE\n"),
            &options(),
            Some(&mut export),
        )
        .await
        .unwrap();

        assert_eq!(report.frames_rendered, 2);
        assert!(report.completed);
        assert_eq!(p.state(), PlaybackState::Stopped);
        assert!(export.completed);
        assert_eq!(export.frames[0].tcells, 2);
        assert_eq!(export.frames[1].tcells, 1);
        assert_eq!(export.frames[1].churn.tcells.retired, 1);
    }

    #[tokio::test]
    async fn test_bad_frames_skipped() {
        let mut p = player();
        let mut export = PlaybackExport::new("inline");
        let report = play_reader(
            &mut p,
            stream("T 0 0 0 0 1 0\nE\nT oops\nE\nT 0 1 0 0 1 0\nE\n"),
            &options(),
            Some(&mut export),
        )
        .await
        .unwrap();

        assert_eq!(report.frames_rendered, 2);
        assert_eq!(report.frames_skipped, 1);
        assert_eq!(export.skipped.len(), 1);
    }

    #[tokio::test]
    async fn test_internal_error_aborts() {
        let mut p = player();
        let err = play_reader(&mut p, stream("B 0 0\nE\nE\n"), &options(), None)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(p.state(), PlaybackState::Stopped);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let mut p = player();
        let err = play_file(&mut p, "/nonexistent/tcview.pos", &options(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PlayerError::View(ViewError::StreamOpen { .. })));
        assert_eq!(err.exit_code(), 1);
    }
}
