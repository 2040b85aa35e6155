//! Render gateway trait consumed by the TCView scene logic.

use crate::error::GatewayError;
use crate::types::{Point3, Rgb};
use serde::{Deserialize, Serialize};

/// Handle to an actor owned by a render gateway.
///
/// Handles are never reused within one gateway, so a stale handle fails
/// with [`GatewayError::UnknownActor`] instead of aliasing a newer actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Geometry shared by every actor of one entity class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeshTemplate {
    /// Sphere centered on the actor origin
    Sphere {
        radius: f64,
        theta_resolution: u32,
        phi_resolution: u32,
    },

    /// Cylinder centered on the actor origin, axis along +Y
    Cylinder {
        radius: f64,
        height: f64,
        resolution: u32,
    },
}

impl MeshTemplate {
    /// Unit-diameter sphere used for T cells.
    pub fn tcell() -> Self {
        MeshTemplate::Sphere {
            radius: 0.5,
            theta_resolution: 12,
            phi_resolution: 12,
        }
    }

    /// Sphere used for dendritic cells.
    pub fn dcell() -> Self {
        MeshTemplate::Sphere {
            radius: 1.0,
            theta_resolution: 16,
            phi_resolution: 16,
        }
    }

    /// Unit-height cylinder used for bonds; scaled along Y to bond length.
    pub fn bond() -> Self {
        MeshTemplate::Cylinder {
            radius: 0.15,
            height: 1.0,
            resolution: 8,
        }
    }

    /// Extent of the template along its widest axis at scale 1.
    pub fn nominal_diameter(&self) -> f64 {
        match self {
            MeshTemplate::Sphere { radius, .. } => 2.0 * radius,
            MeshTemplate::Cylinder { radius, .. } => 2.0 * radius,
        }
    }
}

/// The central interface to the rendering engine.
///
/// This trait abstracts the scene graph so that TCView's reconciliation
/// logic can drive a headless buffer, a remote viewer, or a test double.
///
/// # Ownership
///
/// The gateway owns actor storage. Callers own the *lifetime decision*:
/// an actor exists from `create_actor()` until `remove_actor()`.
///
/// # Implementations
///
/// - **Headless**: `HeadlessScene` - in-memory table plus software capture
/// - **Viewer**: `RerunGateway` - streams entities to a Rerun viewer
pub trait RenderGateway {
    /// Creates a detached actor from a mesh template.
    ///
    /// The actor is not drawn until `add_actor()` is called.
    fn create_actor(&mut self, mesh: &MeshTemplate) -> ActorId;

    /// Attaches an actor to the rendered scene.
    fn add_actor(&mut self, id: ActorId) -> Result<(), GatewayError>;

    /// Detaches an actor from the scene and releases it.
    ///
    /// After this call the handle is dead.
    fn remove_actor(&mut self, id: ActorId) -> Result<(), GatewayError>;

    /// Moves the actor origin.
    fn set_position(&mut self, id: ActorId, position: Point3) -> Result<(), GatewayError>;

    /// Sets the actor's surface color.
    fn set_color(&mut self, id: ActorId, color: Rgb) -> Result<(), GatewayError>;

    /// Sets a per-axis scale relative to the mesh template.
    fn set_scale(&mut self, id: ActorId, scale: Point3) -> Result<(), GatewayError>;

    /// Rotates the actor by `angle_degrees` about `axis`.
    ///
    /// A zero-length axis leaves the orientation unchanged.
    fn rotate(&mut self, id: ActorId, angle_degrees: f64, axis: Point3) -> Result<(), GatewayError>;

    /// Returns the actor origin.
    fn position(&self, id: ActorId) -> Result<Point3, GatewayError>;

    /// Draws the current scene.
    fn render(&mut self) -> Result<(), GatewayError>;

    /// Fits the camera to the actors currently in the scene.
    fn reset_camera(&mut self);

    /// Zooms the active camera; factors below 1 zoom out.
    fn zoom_camera(&mut self, factor: f64);

    /// Sets the clear color.
    fn set_background(&mut self, color: Rgb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcell_template_has_unit_diameter() {
        assert_eq!(MeshTemplate::tcell().nominal_diameter(), 1.0);
    }

    #[test]
    fn test_bond_template_is_unit_height() {
        match MeshTemplate::bond() {
            MeshTemplate::Cylinder { height, .. } => assert_eq!(height, 1.0),
            other => panic!("expected cylinder, got {:?}", other),
        }
    }

    #[test]
    fn test_actor_id_display() {
        assert_eq!(ActorId(7).to_string(), "actor#7");
    }
}
