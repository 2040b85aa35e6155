//! TCView Core - actor reconciliation for agent-based immune simulation playback
//!
//! This library keeps a set of render actors in step with a stream of
//! per-frame agent records:
//! 1. **Lifecycle**: tag-indexed registries whose actors are created, updated
//!    in place or retired as tags come and go ([`reconcile_agents`])
//! 2. **Bonds**: cylinders rebuilt every frame between bonded cells
//!    ([`rebuild_bonds`])
//! 3. **Playback**: a start/pause/stop controller that renders one frame per
//!    timer tick and can capture each frame to disk ([`Player`])

pub mod color;
pub mod config;
pub mod error;
pub mod interaction;
pub mod model;
pub mod player;
pub mod reconcile;
pub mod record_stream;
pub mod registry;
pub mod scene;

// Re-export key types for convenience
pub use color::{AntigenFade, ColorStrategy, FixedColor, PaletteKind, TcellPalette};
pub use config::ViewerConfig;
pub use error::{InvariantViolation, ViewError};
pub use interaction::{InteractionState, MouseButton};
pub use model::{AgentPosition, BondPosition, EntityClass, Frame, Tag};
pub use player::{frame_path, PlaybackState, PlaybackTimer, Player, Tick};
pub use reconcile::{
    bond_geometry, rebuild_bonds, reconcile_agents, BondGeometry, ClassStyle, ReconcileStats, UpdatePolicy,
};
pub use record_stream::{FrameReader, ReadOutcome};
pub use registry::ActorRegistry;
pub use scene::{FrameStats, Scene};
