//! Headless implementation of RenderGateway.
//!
//! Keeps every actor in an in-memory table and rasterizes the scene with a
//! simple orthographic projection onto the XY plane (camera on +Z looking
//! down). Good enough for frame captures in batch runs and for tests that
//! need to observe exactly what the reconciliation engine asked for.

use crate::capture::{CapturedFrame, FrameCapture};
use crate::error::GatewayError;
use crate::gateway::{ActorId, MeshTemplate, RenderGateway};
use crate::types::{Point3, Rgb};
use nalgebra::{Unit, UnitQuaternion, Vector3};
use std::collections::BTreeMap;

/// Everything the headless scene knows about one actor.
#[derive(Debug, Clone)]
pub struct ActorState {
    /// Geometry this actor was created from
    pub mesh: MeshTemplate,

    /// Origin in scene coordinates
    pub position: Point3,

    /// Surface color
    pub color: Rgb,

    /// Per-axis scale relative to the mesh
    pub scale: Point3,

    /// Accumulated rotation
    pub orientation: UnitQuaternion<f64>,

    /// Whether the actor is attached to the scene
    pub in_scene: bool,
}

impl ActorState {
    fn new(mesh: MeshTemplate) -> Self {
        Self {
            mesh,
            position: [0.0; 3],
            color: Rgb::default(),
            scale: [1.0; 3],
            orientation: UnitQuaternion::identity(),
            in_scene: false,
        }
    }

    /// Direction of the mesh's +Y axis after rotation.
    pub fn axis(&self) -> Point3 {
        let v = self.orientation * Vector3::y();
        [v.x, v.y, v.z]
    }

    /// Radius in scene units, taking the widest scale into account.
    pub fn screen_radius(&self) -> f64 {
        let radius = match self.mesh {
            MeshTemplate::Sphere { radius, .. } => radius,
            MeshTemplate::Cylinder { radius, .. } => radius,
        };
        match self.mesh {
            MeshTemplate::Sphere { .. } => {
                radius * self.scale[0].abs().max(self.scale[1].abs()).max(self.scale[2].abs())
            }
            MeshTemplate::Cylinder { .. } => radius * self.scale[0].abs().max(self.scale[2].abs()),
        }
    }

    /// End points of a cylinder's axis; `None` for spheres.
    pub fn segment(&self) -> Option<(Point3, Point3)> {
        let height = match self.mesh {
            MeshTemplate::Cylinder { height, .. } => height,
            MeshTemplate::Sphere { .. } => return None,
        };
        let half = height * self.scale[1] / 2.0;
        let axis = self.axis();
        let p = self.position;
        Some((
            [p[0] - axis[0] * half, p[1] - axis[1] * half, p[2] - axis[2] * half],
            [p[0] + axis[0] * half, p[1] + axis[1] * half, p[2] + axis[2] * half],
        ))
    }
}

/// Counters describing how the scene has been driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub created: u64,
    pub removed: u64,
    pub renders: u64,
    pub camera_resets: u64,
}

#[derive(Debug, Clone)]
struct Camera {
    center: [f64; 2],
    half_extent: f64,
    zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            half_extent: 1.0,
            zoom: 1.0,
        }
    }
}

/// In-memory render gateway with software capture.
pub struct HeadlessScene {
    width: u32,
    height: u32,
    actors: BTreeMap<ActorId, ActorState>,
    next_id: u64,
    background: Rgb,
    camera: Camera,
    framebuffer: Option<CapturedFrame>,
    stats: SceneStats,
}

impl HeadlessScene {
    /// Creates an empty scene rendering into a `width` x `height` buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            actors: BTreeMap::new(),
            next_id: 0,
            background: Rgb::new(0.0, 0.0, 0.0),
            camera: Camera::default(),
            framebuffer: None,
            stats: SceneStats::default(),
        }
    }

    /// Returns the state of a live actor.
    pub fn actor(&self, id: ActorId) -> Option<&ActorState> {
        self.actors.get(&id)
    }

    /// Iterates over actors attached to the scene.
    pub fn attached(&self) -> impl Iterator<Item = (ActorId, &ActorState)> + '_ {
        self.actors.iter().filter(|(_, a)| a.in_scene).map(|(id, a)| (*id, a))
    }

    /// Number of actors attached to the scene.
    pub fn scene_len(&self) -> usize {
        self.actors.values().filter(|a| a.in_scene).count()
    }

    /// Number of live actors, attached or not.
    pub fn live_len(&self) -> usize {
        self.actors.len()
    }

    /// Returns the driving counters.
    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    /// Returns the current camera zoom.
    pub fn zoom(&self) -> f64 {
        self.camera.zoom
    }

    /// Returns the clear color.
    pub fn background(&self) -> Rgb {
        self.background
    }

    fn actor_mut(&mut self, id: ActorId) -> Result<&mut ActorState, GatewayError> {
        self.actors.get_mut(&id).ok_or(GatewayError::UnknownActor(id))
    }

    /// Scene units to pixels.
    fn pixel_scale(&self) -> f64 {
        let half_px = self.width.min(self.height) as f64 / 2.0;
        half_px / self.camera.half_extent * self.camera.zoom
    }

    fn project(&self, p: Point3) -> (f64, f64) {
        let s = self.pixel_scale();
        let px = (p[0] - self.camera.center[0]) * s + self.width as f64 / 2.0;
        let py = self.height as f64 / 2.0 - (p[1] - self.camera.center[1]) * s;
        (px, py)
    }

    fn rasterize(&self) -> CapturedFrame {
        let (w, h) = (self.width, self.height);
        let bg = self.background.to_u8();
        let mut pixels = Vec::with_capacity(w as usize * h as usize * 3);
        for _ in 0..(w as usize * h as usize) {
            pixels.extend_from_slice(&bg);
        }

        // Painter's order: farthest from the +Z camera first
        let mut visible: Vec<&ActorState> = self.actors.values().filter(|a| a.in_scene).collect();
        visible.sort_by(|a, b| a.position[2].total_cmp(&b.position[2]));

        let s = self.pixel_scale();
        for actor in visible {
            let r_px = actor.screen_radius() * s;
            match actor.segment() {
                None => {
                    let (cx, cy) = self.project(actor.position);
                    fill_disc(&mut pixels, w, h, cx, cy, r_px, actor.color);
                }
                Some((a, b)) => {
                    fill_capsule(&mut pixels, w, h, self.project(a), self.project(b), r_px, actor.color);
                }
            }
        }

        CapturedFrame {
            width: w,
            height: h,
            pixels,
        }
    }
}

fn put(pixels: &mut [u8], w: u32, x: i64, y: i64, rgb: [u8; 3]) {
    let i = (y as usize * w as usize + x as usize) * 3;
    pixels[i..i + 3].copy_from_slice(&rgb);
}

fn pixel_bounds(lo: f64, hi: f64, limit: u32) -> (i64, i64) {
    let lo = lo.floor().max(0.0) as i64;
    let hi = hi.ceil().min(limit as f64 - 1.0) as i64;
    (lo, hi)
}

fn fill_disc(pixels: &mut [u8], w: u32, h: u32, cx: f64, cy: f64, r: f64, color: Rgb) {
    let r = r.max(0.5);
    let (x0, x1) = pixel_bounds(cx - r, cx + r, w);
    let (y0, y1) = pixel_bounds(cy - r, cy + r, h);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let d2 = (dx * dx + dy * dy) / (r * r);
            if d2 <= 1.0 {
                // Cheap head-on Lambert shading
                let shade = 0.55 + 0.45 * (1.0 - d2).sqrt();
                put(pixels, w, x, y, color.scaled(shade).to_u8());
            }
        }
    }
}

fn fill_capsule(
    pixels: &mut [u8],
    w: u32,
    h: u32,
    a: (f64, f64),
    b: (f64, f64),
    r: f64,
    color: Rgb,
) {
    let r = r.max(0.5);
    let (x0, x1) = pixel_bounds(a.0.min(b.0) - r, a.0.max(b.0) + r, w);
    let (y0, y1) = pixel_bounds(a.1.min(b.1) - r, a.1.max(b.1) + r, h);
    let (ex, ey) = (b.0 - a.0, b.1 - a.1);
    let len2 = ex * ex + ey * ey;
    let rgb = color.to_u8();
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
            let t = if len2 > 0.0 {
                (((px - a.0) * ex + (py - a.1) * ey) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (qx, qy) = (a.0 + t * ex - px, a.1 + t * ey - py);
            if qx * qx + qy * qy <= r * r {
                put(pixels, w, x, y, rgb);
            }
        }
    }
}

impl RenderGateway for HeadlessScene {
    fn create_actor(&mut self, mesh: &MeshTemplate) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        self.actors.insert(id, ActorState::new(mesh.clone()));
        self.stats.created += 1;
        id
    }

    fn add_actor(&mut self, id: ActorId) -> Result<(), GatewayError> {
        self.actor_mut(id)?.in_scene = true;
        Ok(())
    }

    fn remove_actor(&mut self, id: ActorId) -> Result<(), GatewayError> {
        self.actors.remove(&id).ok_or(GatewayError::UnknownActor(id))?;
        self.stats.removed += 1;
        Ok(())
    }

    fn set_position(&mut self, id: ActorId, position: Point3) -> Result<(), GatewayError> {
        self.actor_mut(id)?.position = position;
        Ok(())
    }

    fn set_color(&mut self, id: ActorId, color: Rgb) -> Result<(), GatewayError> {
        self.actor_mut(id)?.color = color;
        Ok(())
    }

    fn set_scale(&mut self, id: ActorId, scale: Point3) -> Result<(), GatewayError> {
        self.actor_mut(id)?.scale = scale;
        Ok(())
    }

    fn rotate(&mut self, id: ActorId, angle_degrees: f64, axis: Point3) -> Result<(), GatewayError> {
        let actor = self.actor_mut(id)?;
        if let Some(axis) = Unit::try_new(Vector3::from(axis), 1e-12) {
            let q = UnitQuaternion::from_axis_angle(&axis, angle_degrees.to_radians());
            actor.orientation = q * actor.orientation;
        }
        Ok(())
    }

    fn position(&self, id: ActorId) -> Result<Point3, GatewayError> {
        self.actors
            .get(&id)
            .map(|a| a.position)
            .ok_or(GatewayError::UnknownActor(id))
    }

    fn render(&mut self) -> Result<(), GatewayError> {
        self.framebuffer = Some(self.rasterize());
        self.stats.renders += 1;
        Ok(())
    }

    fn reset_camera(&mut self) {
        self.stats.camera_resets += 1;

        let mut lo = [f64::INFINITY; 2];
        let mut hi = [f64::NEG_INFINITY; 2];
        for actor in self.actors.values().filter(|a| a.in_scene) {
            let r = actor.screen_radius().max(actor.scale[1].abs() / 2.0);
            for k in 0..2 {
                lo[k] = lo[k].min(actor.position[k] - r);
                hi[k] = hi[k].max(actor.position[k] + r);
            }
        }

        if lo[0].is_finite() {
            self.camera.center = [(lo[0] + hi[0]) / 2.0, (lo[1] + hi[1]) / 2.0];
            self.camera.half_extent = ((hi[0] - lo[0]).max(hi[1] - lo[1]) / 2.0).max(1.0);
        } else {
            self.camera.center = [0.0, 0.0];
            self.camera.half_extent = 1.0;
        }
    }

    fn zoom_camera(&mut self, factor: f64) {
        if factor > 0.0 {
            self.camera.zoom *= factor;
        }
    }

    fn set_background(&mut self, color: Rgb) {
        self.background = color;
    }
}

impl FrameCapture for HeadlessScene {
    fn capture(&mut self) -> Result<CapturedFrame, GatewayError> {
        if self.framebuffer.is_none() {
            self.render()?;
        }
        self.framebuffer
            .clone()
            .ok_or_else(|| GatewayError::CaptureUnsupported("no framebuffer".to_string()))
    }
}
