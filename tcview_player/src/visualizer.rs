//! Rerun visualization of the live scene.
//!
//! [`RerunGateway`] keeps its actor table in a [`HeadlessScene`] (so
//! captures still work) and logs every attached actor to Rerun on each
//! `render()`:
//!
//! - Spheres as `Points3D` under `scene/cells`
//! - Cylinders as `LineStrips3D` under `scene/bonds`
//!
//! Visualization is only available with the `visualization` feature.

#[cfg(feature = "visualization")]
use rerun::{Color, LineStrips3D, Points3D, Position3D, Radius, RecordingStream};
use tcview_env::{
    ActorId, CapturedFrame, FrameCapture, GatewayError, HeadlessScene, MeshTemplate, Point3, RenderGateway, Rgb,
};

/// Render gateway that mirrors the scene into a Rerun viewer.
pub struct RerunGateway {
    inner: HeadlessScene,

    #[cfg(feature = "visualization")]
    rec: Option<RecordingStream>,

    frame: i64,
}

impl RerunGateway {
    /// Creates a gateway with visualization disabled.
    pub fn disabled(width: u32, height: u32) -> Self {
        Self {
            inner: HeadlessScene::new(width, height),
            #[cfg(feature = "visualization")]
            rec: None,
            frame: 0,
        }
    }

    /// Spawns a Rerun viewer and streams into it.
    #[cfg(feature = "visualization")]
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        match rerun::RecordingStreamBuilder::new(name).spawn() {
            Ok(rec) => {
                tracing::info!("Rerun visualization enabled");
                Self {
                    inner: HeadlessScene::new(width, height),
                    rec: Some(rec),
                    frame: 0,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to initialize Rerun: {:?}", e);
                Self::disabled(width, height)
            }
        }
    }

    /// Falls back to a headless gateway when built without Rerun.
    #[cfg(not(feature = "visualization"))]
    pub fn new(_name: &str, width: u32, height: u32) -> Self {
        tracing::info!("Rerun visualization not available (compile with --features visualization)");
        Self::disabled(width, height)
    }

    /// Returns whether frames are streamed to Rerun.
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "visualization")]
        {
            self.rec.is_some()
        }
        #[cfg(not(feature = "visualization"))]
        {
            false
        }
    }

    /// Number of frames rendered so far.
    pub fn frames_rendered(&self) -> i64 {
        self.frame
    }

    /// Underlying actor table.
    pub fn scene(&self) -> &HeadlessScene {
        &self.inner
    }

    #[cfg(feature = "visualization")]
    fn log_scene(&self) {
        let rec = match &self.rec {
            Some(rec) => rec,
            None => return,
        };
        rec.set_time_sequence("frame", self.frame);

        let mut points = Vec::new();
        let mut point_colors = Vec::new();
        let mut point_radii = Vec::new();
        let mut strips = Vec::new();
        let mut strip_colors = Vec::new();
        let mut strip_radii = Vec::new();

        for (_, actor) in self.inner.attached() {
            let [r, g, b] = actor.color.to_u8();
            let radius = Radius::new_scene_units(actor.screen_radius() as f32);
            match actor.segment() {
                None => {
                    let p = actor.position;
                    points.push(Position3D::new(p[0] as f32, p[1] as f32, p[2] as f32));
                    point_colors.push(Color::from_rgb(r, g, b));
                    point_radii.push(radius);
                }
                Some((a, b_end)) => {
                    strips.push([
                        [a[0] as f32, a[1] as f32, a[2] as f32],
                        [b_end[0] as f32, b_end[1] as f32, b_end[2] as f32],
                    ]);
                    strip_colors.push(Color::from_rgb(r, g, b));
                    strip_radii.push(radius);
                }
            }
        }

        let _ = rec.log(
            "scene/cells",
            &Points3D::new(points)
                .with_colors(point_colors)
                .with_radii(point_radii),
        );
        let _ = rec.log(
            "scene/bonds",
            &LineStrips3D::new(strips)
                .with_colors(strip_colors)
                .with_radii(strip_radii),
        );
    }

    #[cfg(not(feature = "visualization"))]
    fn log_scene(&self) {}
}

impl RenderGateway for RerunGateway {
    fn create_actor(&mut self, mesh: &MeshTemplate) -> ActorId {
        self.inner.create_actor(mesh)
    }

    fn add_actor(&mut self, id: ActorId) -> Result<(), GatewayError> {
        self.inner.add_actor(id)
    }

    fn remove_actor(&mut self, id: ActorId) -> Result<(), GatewayError> {
        self.inner.remove_actor(id)
    }

    fn set_position(&mut self, id: ActorId, position: Point3) -> Result<(), GatewayError> {
        self.inner.set_position(id, position)
    }

    fn set_color(&mut self, id: ActorId, color: Rgb) -> Result<(), GatewayError> {
        self.inner.set_color(id, color)
    }

    fn set_scale(&mut self, id: ActorId, scale: Point3) -> Result<(), GatewayError> {
        self.inner.set_scale(id, scale)
    }

    fn rotate(&mut self, id: ActorId, angle_degrees: f64, axis: Point3) -> Result<(), GatewayError> {
        self.inner.rotate(id, angle_degrees, axis)
    }

    fn position(&self, id: ActorId) -> Result<Point3, GatewayError> {
        self.inner.position(id)
    }

    fn render(&mut self) -> Result<(), GatewayError> {
        self.inner.render()?;
        self.log_scene();
        self.frame += 1;
        Ok(())
    }

    fn reset_camera(&mut self) {
        self.inner.reset_camera();
    }

    fn zoom_camera(&mut self, factor: f64) {
        self.inner.zoom_camera(factor);
    }

    fn set_background(&mut self, color: Rgb) {
        self.inner.set_background(color);
    }
}

impl FrameCapture for RerunGateway {
    fn capture(&mut self) -> Result<CapturedFrame, GatewayError> {
        self.inner.capture()
    }
}
