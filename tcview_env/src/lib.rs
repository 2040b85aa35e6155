//! TCView Render Gateway Abstraction Layer
//!
//! This crate provides the seam between the TCView scene logic and whatever
//! actually draws the actors. The reconciliation engine in `tcview_core`
//! only ever talks to a [`RenderGateway`]; it never owns pixels.
//!
//! # Core Concept: Actors by Handle
//!
//! The gateway owns every actor it creates and hands back an [`ActorId`].
//! Callers keep the handles and address actors through them:
//! - `create_actor()` builds a detached actor from a [`MeshTemplate`]
//! - `add_actor()` / `remove_actor()` attach it to or drop it from the scene
//! - `set_position()`, `set_color()`, `set_scale()`, `rotate()` mutate it
//!
//! # Implementations
//!
//! - **Headless**: [`HeadlessScene`] - in-memory actor table with a small
//!   software rasterizer for captures
//! - **Viewer**: `RerunGateway` in `tcview_player` (feature `visualization`)
//!
//! # Example
//!
//! ```ignore
//! use tcview_env::{HeadlessScene, MeshTemplate, RenderGateway, Rgb};
//!
//! let mut scene = HeadlessScene::new(640, 480);
//! let id = scene.create_actor(&MeshTemplate::tcell());
//! scene.add_actor(id)?;
//! scene.set_position(id, [1.0, 2.0, 3.0])?;
//! scene.set_color(id, Rgb::from_u8(255, 0, 0))?;
//! scene.render()?;
//! ```

mod capture;
mod error;
mod gateway;
mod headless;
mod types;

pub use capture::{CapturedFrame, FrameCapture, ImageFormat};
pub use error::GatewayError;
pub use gateway::{ActorId, MeshTemplate, RenderGateway};
pub use headless::{ActorState, HeadlessScene, SceneStats};
pub use types::{Point3, Rgb};
