//! Reconciliation Engine - keeps actors in step with the active tags.
//!
//! # Agents
//!
//! [`reconcile_agents`] diffs one frame's records against a registry:
//! unseen tags get a new actor (gap-filling the registry up to the tag),
//! seen tags are updated in place, and occupied slots whose tag is absent
//! from the frame are retired. Records are applied in input order, so a
//! tag repeated within a frame ends up with its last record's values.
//!
//! # Bonds
//!
//! Bonds carry no identity across frames. [`rebuild_bonds`] retires every
//! bond actor and builds the frame's bonds from scratch.

use crate::color::ColorStrategy;
use crate::error::{InvariantViolation, ViewError};
use crate::model::{AgentPosition, BondPosition, EntityClass, Tag};
use crate::registry::ActorRegistry;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tcview_env::{ActorId, MeshTemplate, Point3, RenderGateway, Rgb};
use tracing::debug;

/// When existing actors get their color, scale and position refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Refresh every actor every frame (mobile agents).
    Always,

    /// Refresh only when forced, newly created, or moving/fading.
    ///
    /// Color follows the state only when `fade` is set. Otherwise new actors
    /// take the strategy's base color and keep it.
    WhenChanged { redo: bool, motion: bool, fade: bool },
}

impl UpdatePolicy {
    fn refresh(&self, created: bool) -> bool {
        match *self {
            UpdatePolicy::Always => true,
            UpdatePolicy::WhenChanged { redo, motion, fade } => redo || created || motion || fade,
        }
    }

    fn follows_state(&self) -> bool {
        match *self {
            UpdatePolicy::Always => true,
            UpdatePolicy::WhenChanged { fade, .. } => fade,
        }
    }
}

/// How one entity class is drawn.
pub struct ClassStyle<'a> {
    /// Mesh every actor of the class is created from
    pub mesh: &'a MeshTemplate,

    /// State to color mapping
    pub colors: &'a dyn ColorStrategy,

    /// Largest tag the registry may grow to
    pub max_tag: Tag,
}

/// Churn produced by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    /// Actors created and added to the scene
    pub created: usize,

    /// Existing or new actors whose properties were pushed to the gateway
    pub updated: usize,

    /// Actors removed from the scene
    pub retired: usize,
}

impl ReconcileStats {
    /// Returns true if no actor was created or retired.
    pub fn is_stable(&self) -> bool {
        self.created == 0 && self.retired == 0
    }
}

/// Rejects the first record whose tag exceeds `max_tag`.
pub fn check_tag_bound<'a>(
    class: EntityClass,
    tags: impl IntoIterator<Item = &'a Tag>,
    max_tag: Tag,
) -> Result<(), ViewError> {
    match tags.into_iter().find(|&&tag| tag > max_tag) {
        Some(&tag) => Err(ViewError::TagOutOfRange { class, tag, max: max_tag }),
        None => Ok(()),
    }
}

/// Reconciles one entity class against this frame's records.
///
/// # Arguments
/// * `registry` - Slots for this class; grows to fit new tags
/// * `records` - This frame's records, in stream order
/// * `gateway` - Render gateway receiving create/update/remove calls
/// * `style` - Mesh, palette and tag bound for the class
/// * `policy` - Update policy for actors that already exist
///
/// # Errors
/// * `ViewError::TagOutOfRange` - a tag exceeds `style.max_tag`; nothing is
///   touched
/// * `ViewError::Internal` - a slot is empty right after placement
pub fn reconcile_agents<G: RenderGateway + ?Sized>(
    registry: &mut ActorRegistry,
    records: &[AgentPosition],
    gateway: &mut G,
    style: &ClassStyle<'_>,
    policy: UpdatePolicy,
) -> Result<ReconcileStats, ViewError> {
    let class = registry.class();

    check_tag_bound(class, records.iter().map(|r| &r.tag), style.max_tag)?;

    let mut stats = ReconcileStats::default();
    let mut active: HashSet<Tag> = HashSet::with_capacity(records.len());
    let nominal = style.mesh.nominal_diameter();

    for rec in records {
        active.insert(rec.tag);

        // Unseen tag, gap slot, or a tag seen again after retirement
        let created = if registry.is_occupied(rec.tag) {
            false
        } else {
            let id = gateway.create_actor(style.mesh);
            // Registered first so a failed add is still retired later
            registry.place(rec.tag, id);
            gateway.add_actor(id)?;
            stats.created += 1;
            debug!("{} {} -> {} created", class, rec.tag, id);
            true
        };

        let id = registry
            .get(rec.tag)
            .ok_or(InvariantViolation::EmptySlot { class, tag: rec.tag })?;

        if policy.refresh(created) {
            if policy.follows_state() {
                gateway.set_color(id, style.colors.color_for_state(rec.state))?;
            } else if created {
                gateway.set_color(id, style.colors.base_color())?;
            }
            if nominal > 0.0 {
                let s = rec.diameter / nominal;
                gateway.set_scale(id, [s, s, s])?;
            }
            gateway.set_position(id, rec.position())?;
            stats.updated += 1;
        }
    }

    for tag in 0..registry.len() as Tag {
        if active.contains(&tag) {
            continue;
        }
        if let Some(id) = registry.vacate(tag) {
            gateway.remove_actor(id)?;
            stats.retired += 1;
            debug!("{} {} -> {} retired", class, tag, id);
        }
    }

    Ok(stats)
}

/// Placement of a unit +Y cylinder spanning two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondGeometry {
    /// Center of the segment
    pub midpoint: Point3,

    /// Segment length (scale along the cylinder axis)
    pub length: f64,

    /// Rotation angle in degrees
    pub angle_degrees: f64,

    /// Rotation axis; zero when no rotation is needed
    pub axis: Point3,
}

/// Computes how to place a unit cylinder from `a` to `b`.
///
/// The cylinder starts along `y = (0,1,0)`. With `v` the unit direction
/// `b - a`, the rotation axis is `y × v = (v.z, 0, -v.x)` and the angle is
/// `asin(|y × v|)`, mirrored to `180 - angle` when `v` points into -Y.
pub fn bond_geometry(a: Point3, b: Point3) -> BondGeometry {
    let a = Vector3::from(a);
    let b = Vector3::from(b);
    let mid = (a + b) / 2.0;
    let v = b - a;
    let length = v.norm();

    if length <= f64::EPSILON {
        return BondGeometry {
            midpoint: [mid.x, mid.y, mid.z],
            length: 0.0,
            angle_degrees: 0.0,
            axis: [0.0; 3],
        };
    }

    let v = v / length;
    let sina = (v.x * v.x + v.z * v.z).sqrt().min(1.0);
    let cosa = v.y;
    let mut angle_degrees = sina.asin().to_degrees();
    if cosa < 0.0 {
        angle_degrees = 180.0 - angle_degrees;
    }

    let mut axis = [v.z, 0.0, -v.x];
    if sina <= f64::EPSILON && cosa < 0.0 {
        // Antiparallel: y × v vanishes, any perpendicular axis flips it
        axis = [1.0, 0.0, 0.0];
    }

    BondGeometry {
        midpoint: [mid.x, mid.y, mid.z],
        length,
        angle_degrees,
        axis,
    }
}

/// Retires all bond actors and builds one per bond record.
///
/// Each cylinder is oriented from the dendritic cell toward the T cell.
/// Bond endpoints are read back from the gateway, so the agent registries
/// must already be reconciled for this frame.
///
/// # Errors
/// * `ViewError::Internal` - an endpoint tag has no live actor
pub fn rebuild_bonds<G: RenderGateway + ?Sized>(
    bond_actors: &mut Vec<ActorId>,
    bonds: &[BondPosition],
    tcells: &ActorRegistry,
    dcells: &ActorRegistry,
    gateway: &mut G,
    mesh: &MeshTemplate,
    color: Rgb,
) -> Result<ReconcileStats, ViewError> {
    let mut stats = ReconcileStats::default();

    for id in bond_actors.drain(..) {
        gateway.remove_actor(id)?;
        stats.retired += 1;
    }

    for (bond_index, bond) in bonds.iter().enumerate() {
        let t_actor = tcells.get(bond.tcell_tag).ok_or(InvariantViolation::BondEndpointMissing {
            bond_index,
            class: EntityClass::TCell,
            tag: bond.tcell_tag,
        })?;
        let d_actor = dcells.get(bond.dcell_tag).ok_or(InvariantViolation::BondEndpointMissing {
            bond_index,
            class: EntityClass::DCell,
            tag: bond.dcell_tag,
        })?;

        let geom = bond_geometry(gateway.position(d_actor)?, gateway.position(t_actor)?);

        let id = gateway.create_actor(mesh);
        gateway.set_color(id, color)?;
        gateway.set_scale(id, [1.0, geom.length, 1.0])?;
        gateway.set_position(id, geom.midpoint)?;
        if geom.angle_degrees != 0.0 {
            gateway.rotate(id, geom.angle_degrees, geom.axis)?;
        }
        gateway.add_actor(id)?;
        bond_actors.push(id);
        stats.created += 1;
        stats.updated += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{AntigenFade, FixedColor};
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use tcview_env::{GatewayError, HeadlessScene};

    const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);

    fn rec(tag: Tag, x: f64, y: f64, z: f64) -> AgentPosition {
        AgentPosition::new(tag, [x, y, z], 1.0, 0.0)
    }

    fn run(
        reg: &mut ActorRegistry,
        scene: &mut HeadlessScene,
        records: &[AgentPosition],
    ) -> ReconcileStats {
        let mesh = MeshTemplate::tcell();
        let colors = FixedColor(RED);
        let style = ClassStyle {
            mesh: &mesh,
            colors: &colors,
            max_tag: 10_000,
        };
        reconcile_agents(reg, records, scene, &style, UpdatePolicy::Always).unwrap()
    }

    #[test]
    fn test_gap_fill() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut reg = ActorRegistry::new(EntityClass::TCell);

        let stats = run(&mut reg, &mut scene, &[rec(0, 0.0, 0.0, 0.0), rec(3, 1.0, 1.0, 1.0)]);

        assert_eq!(reg.len(), 4);
        assert!(reg.is_occupied(0));
        assert!(!reg.is_occupied(1));
        assert!(!reg.is_occupied(2));
        assert!(reg.is_occupied(3));
        assert_eq!(stats.created, 2);
        assert_eq!(scene.scene_len(), 2);
    }

    #[test]
    fn test_second_identical_frame_is_stable() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut reg = ActorRegistry::new(EntityClass::TCell);
        let frame = [rec(2, 1.0, 2.0, 3.0), rec(5, 4.0, 5.0, 6.0)];

        run(&mut reg, &mut scene, &frame);
        let before = scene.stats();
        let stats = run(&mut reg, &mut scene, &frame);

        assert!(stats.is_stable());
        assert_eq!(stats.updated, 2);
        assert_eq!(scene.stats().created, before.created);
        assert_eq!(scene.stats().removed, before.removed);
    }

    #[test]
    fn test_retire_keeps_index() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut reg = ActorRegistry::new(EntityClass::TCell);

        run(&mut reg, &mut scene, &[rec(0, 1.0, 2.0, 3.0), rec(1, 4.0, 5.0, 6.0)]);
        let stats = run(&mut reg, &mut scene, &[rec(0, 1.0, 2.0, 3.0)]);

        assert_eq!(stats.retired, 1);
        assert_eq!(reg.len(), 2);
        assert!(!reg.is_occupied(1));
        let id = reg.get(0).unwrap();
        assert_eq!(scene.position(id).unwrap(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_last_record_wins() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut reg = ActorRegistry::new(EntityClass::TCell);

        let stats = run(&mut reg, &mut scene, &[rec(1, 1.0, 1.0, 1.0), rec(1, 9.0, 8.0, 7.0)]);

        assert_eq!(stats.created, 1);
        assert_eq!(scene.position(reg.get(1).unwrap()).unwrap(), [9.0, 8.0, 7.0]);
    }

    #[test]
    fn test_reappearing_tag_gets_new_actor() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut reg = ActorRegistry::new(EntityClass::TCell);

        run(&mut reg, &mut scene, &[rec(0, 0.0, 0.0, 0.0), rec(3, 0.0, 0.0, 0.0)]);
        let old = reg.get(3).unwrap();
        run(&mut reg, &mut scene, &[rec(0, 0.0, 0.0, 0.0)]);
        let stats = run(&mut reg, &mut scene, &[rec(1, 0.0, 0.0, 0.0), rec(3, 0.0, 0.0, 0.0)]);

        assert_eq!(stats.created, 2);
        assert_eq!(stats.retired, 1);
        assert_ne!(reg.get(3).unwrap(), old);
        assert_eq!(reg.occupied_tags(), vec![1, 3]);
    }

    #[test]
    fn test_diameter_scales_actor() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut reg = ActorRegistry::new(EntityClass::TCell);

        run(&mut reg, &mut scene, &[AgentPosition::new(0, [0.0; 3], 2.5, 0.0)]);

        let actor = scene.actor(reg.get(0).unwrap()).unwrap();
        assert_eq!(actor.scale, [2.5, 2.5, 2.5]);
        assert_eq!(actor.color, RED);
    }

    #[test]
    fn test_tag_bound_rejects_before_mutation() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut reg = ActorRegistry::new(EntityClass::TCell);
        let mesh = MeshTemplate::tcell();
        let colors = FixedColor(RED);
        let style = ClassStyle {
            mesh: &mesh,
            colors: &colors,
            max_tag: 100,
        };

        let err = reconcile_agents(
            &mut reg,
            &[rec(0, 0.0, 0.0, 0.0), rec(4_000_000, 0.0, 0.0, 0.0)],
            &mut scene,
            &style,
            UpdatePolicy::Always,
        )
        .unwrap_err();

        assert!(matches!(err, ViewError::TagOutOfRange { tag: 4_000_000, max: 100, .. }));
        assert!(reg.is_empty());
        assert_eq!(scene.live_len(), 0);
    }

    #[test]
    fn test_when_changed_skips_static_actors() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut reg = ActorRegistry::new(EntityClass::DCell);
        let mesh = MeshTemplate::dcell();
        let colors = AntigenFade::default();
        let style = ClassStyle {
            mesh: &mesh,
            colors: &colors,
            max_tag: 100,
        };
        let still = UpdatePolicy::WhenChanged { redo: false, motion: false, fade: false };

        let first = reconcile_agents(
            &mut reg,
            &[AgentPosition::new(0, [1.0, 1.0, 1.0], 2.0, 1.0)],
            &mut scene,
            &style,
            still,
        )
        .unwrap();
        assert_eq!(first.updated, 1);

        // Moved, but neither motion nor redo is set: position stays
        let second = reconcile_agents(
            &mut reg,
            &[AgentPosition::new(0, [5.0, 5.0, 5.0], 2.0, 0.0)],
            &mut scene,
            &style,
            still,
        )
        .unwrap();
        assert_eq!(second.updated, 0);
        let actor = scene.actor(reg.get(0).unwrap()).unwrap();
        assert_eq!(actor.position, [1.0, 1.0, 1.0]);
        assert_relative_eq!(actor.color.r, 1.0, epsilon = 1e-12);

        // Motion moves it but keeps the color
        let moving = UpdatePolicy::WhenChanged { redo: false, motion: true, fade: false };
        reconcile_agents(
            &mut reg,
            &[AgentPosition::new(0, [5.0, 5.0, 5.0], 2.0, 0.0)],
            &mut scene,
            &style,
            moving,
        )
        .unwrap();
        let actor = scene.actor(reg.get(0).unwrap()).unwrap();
        assert_eq!(actor.position, [5.0, 5.0, 5.0]);
        assert_relative_eq!(actor.color.r, 1.0, epsilon = 1e-12);

        // Fade recolors from antigen level
        let fading = UpdatePolicy::WhenChanged { redo: false, motion: false, fade: true };
        reconcile_agents(
            &mut reg,
            &[AgentPosition::new(0, [5.0, 5.0, 5.0], 2.0, 0.0)],
            &mut scene,
            &style,
            fading,
        )
        .unwrap();
        let actor = scene.actor(reg.get(0).unwrap()).unwrap();
        assert_relative_eq!(actor.color.r, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_new_static_actor_takes_base_color() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut reg = ActorRegistry::new(EntityClass::DCell);
        let mesh = MeshTemplate::dcell();
        let colors = AntigenFade::default();
        let style = ClassStyle {
            mesh: &mesh,
            colors: &colors,
            max_tag: 100,
        };

        // Antigen 0 would fade to 30%, but without fade the state is ignored
        reconcile_agents(
            &mut reg,
            &[AgentPosition::new(0, [0.0; 3], 2.0, 0.0)],
            &mut scene,
            &style,
            UpdatePolicy::WhenChanged { redo: true, motion: false, fade: false },
        )
        .unwrap();

        let actor = scene.actor(reg.get(0).unwrap()).unwrap();
        assert_eq!(actor.color, RED);
    }

    #[test]
    fn test_check_tag_bound() {
        let tags: [Tag; 3] = [0, 10, 11];
        assert!(check_tag_bound(EntityClass::DCell, &tags[..2], 10).is_ok());
        let err = check_tag_bound(EntityClass::DCell, &tags, 10).unwrap_err();
        assert!(matches!(
            err,
            ViewError::TagOutOfRange { class: EntityClass::DCell, tag: 11, max: 10 }
        ));
    }

    /// Headless scene whose `add_actor` always fails.
    struct RejectingScene(HeadlessScene);

    impl RenderGateway for RejectingScene {
        fn create_actor(&mut self, mesh: &MeshTemplate) -> ActorId {
            self.0.create_actor(mesh)
        }
        fn add_actor(&mut self, _id: ActorId) -> Result<(), GatewayError> {
            Err(GatewayError::backend("add rejected"))
        }
        fn remove_actor(&mut self, id: ActorId) -> Result<(), GatewayError> {
            self.0.remove_actor(id)
        }
        fn set_position(&mut self, id: ActorId, position: Point3) -> Result<(), GatewayError> {
            self.0.set_position(id, position)
        }
        fn set_color(&mut self, id: ActorId, color: Rgb) -> Result<(), GatewayError> {
            self.0.set_color(id, color)
        }
        fn set_scale(&mut self, id: ActorId, scale: Point3) -> Result<(), GatewayError> {
            self.0.set_scale(id, scale)
        }
        fn rotate(&mut self, id: ActorId, angle_degrees: f64, axis: Point3) -> Result<(), GatewayError> {
            self.0.rotate(id, angle_degrees, axis)
        }
        fn position(&self, id: ActorId) -> Result<Point3, GatewayError> {
            self.0.position(id)
        }
        fn render(&mut self) -> Result<(), GatewayError> {
            self.0.render()
        }
        fn reset_camera(&mut self) {}
        fn zoom_camera(&mut self, _factor: f64) {}
        fn set_background(&mut self, _color: Rgb) {}
    }

    #[test]
    fn test_failed_add_is_still_retired() {
        let mut gateway = RejectingScene(HeadlessScene::new(8, 8));
        let mut reg = ActorRegistry::new(EntityClass::TCell);
        let mesh = MeshTemplate::tcell();
        let colors = FixedColor(RED);
        let style = ClassStyle {
            mesh: &mesh,
            colors: &colors,
            max_tag: 100,
        };

        let err = reconcile_agents(&mut reg, &[rec(2, 0.0, 0.0, 0.0)], &mut gateway, &style, UpdatePolicy::Always)
            .unwrap_err();
        assert!(matches!(err, ViewError::Gateway(_)));
        assert!(reg.is_occupied(2));
        assert_eq!(gateway.0.live_len(), 1);

        let stats = reconcile_agents(&mut reg, &[], &mut gateway, &style, UpdatePolicy::Always).unwrap();
        assert_eq!(stats.retired, 1);
        assert_eq!(gateway.0.live_len(), 0);
    }

    #[test]
    fn test_bond_geometry_aligned() {
        let g = bond_geometry([0.0, 0.0, 0.0], [0.0, 2.0, 0.0]);
        assert_eq!(g.midpoint, [0.0, 1.0, 0.0]);
        assert_relative_eq!(g.length, 2.0);
        assert_relative_eq!(g.angle_degrees, 0.0);
    }

    #[test]
    fn test_bond_geometry_orients_cylinder() {
        let cases = [
            ([0.0, 0.0, 0.0], [3.0, 0.0, 0.0]),
            ([1.0, 1.0, 1.0], [1.0, -4.0, 1.0]),
            ([0.0, 0.0, 0.0], [1.0, -1.0, 2.0]),
            ([2.0, 0.0, -1.0], [0.0, 3.0, 4.0]),
        ];

        for (a, b) in cases {
            let mut scene = HeadlessScene::new(8, 8);
            let id = scene.create_actor(&MeshTemplate::bond());
            let g = bond_geometry(a, b);
            scene.rotate(id, g.angle_degrees, g.axis).unwrap();

            let axis = scene.actor(id).unwrap().axis();
            let d = Vector3::new(b[0] - a[0], b[1] - a[1], b[2] - a[2]).normalize();
            for k in 0..3 {
                assert_relative_eq!(axis[k], d[k], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_bond_geometry_degenerate() {
        let g = bond_geometry([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
        assert_eq!(g.length, 0.0);
        assert_eq!(g.angle_degrees, 0.0);
        assert_eq!(g.midpoint, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_rebuild_bonds_replaces_all() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut tcells = ActorRegistry::new(EntityClass::TCell);
        let mut dcells = ActorRegistry::new(EntityClass::DCell);
        run(&mut tcells, &mut scene, &[rec(0, 0.0, 0.0, 0.0)]);
        run(&mut dcells, &mut scene, &[rec(0, 0.0, 2.0, 0.0)]);

        let mesh = MeshTemplate::bond();
        let bonds = [BondPosition { tcell_tag: 0, dcell_tag: 0 }];
        let mut actors = Vec::new();

        let first = rebuild_bonds(&mut actors, &bonds, &tcells, &dcells, &mut scene, &mesh, RED).unwrap();
        assert_eq!(first.created, 1);
        let bond = scene.actor(actors[0]).unwrap();
        assert_eq!(bond.position, [0.0, 1.0, 0.0]);
        assert_eq!(bond.scale, [1.0, 2.0, 1.0]);
        assert!(bond.in_scene);

        let second = rebuild_bonds(&mut actors, &bonds, &tcells, &dcells, &mut scene, &mesh, RED).unwrap();
        assert_eq!(second.retired, 1);
        assert_eq!(second.created, 1);
        assert_eq!(actors.len(), 1);
    }

    #[test]
    fn test_bond_points_from_dcell_to_tcell() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut tcells = ActorRegistry::new(EntityClass::TCell);
        let mut dcells = ActorRegistry::new(EntityClass::DCell);
        run(&mut tcells, &mut scene, &[rec(0, 3.0, 0.0, 0.0)]);
        run(&mut dcells, &mut scene, &[rec(0, 0.0, 0.0, 0.0)]);

        let mut actors = Vec::new();
        rebuild_bonds(
            &mut actors,
            &[BondPosition { tcell_tag: 0, dcell_tag: 0 }],
            &tcells,
            &dcells,
            &mut scene,
            &MeshTemplate::bond(),
            RED,
        )
        .unwrap();

        let expected = bond_geometry([0.0, 0.0, 0.0], [3.0, 0.0, 0.0]);
        assert_relative_eq!(expected.angle_degrees, 90.0, epsilon = 1e-9);
        assert_eq!(expected.axis, [0.0, 0.0, -1.0]);

        let axis = scene.actor(actors[0]).unwrap().axis();
        assert_relative_eq!(axis[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(axis[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(axis[2], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bond_to_empty_slot_is_internal_error() {
        let mut scene = HeadlessScene::new(8, 8);
        let mut tcells = ActorRegistry::new(EntityClass::TCell);
        let dcells = ActorRegistry::new(EntityClass::DCell);
        run(&mut tcells, &mut scene, &[rec(0, 0.0, 0.0, 0.0)]);

        let mut actors = Vec::new();
        let err = rebuild_bonds(
            &mut actors,
            &[BondPosition { tcell_tag: 0, dcell_tag: 7 }],
            &tcells,
            &dcells,
            &mut scene,
            &MeshTemplate::bond(),
            RED,
        )
        .unwrap_err();

        assert!(err.is_internal());
        assert!(matches!(
            err,
            ViewError::Internal(InvariantViolation::BondEndpointMissing {
                class: EntityClass::DCell,
                tag: 7,
                ..
            })
        ));
        assert!(actors.is_empty());
    }

    fn frame_strategy() -> impl Strategy<Value = Vec<Tag>> {
        prop::collection::vec(0u32..64, 0..24)
    }

    proptest! {
        #[test]
        fn prop_occupied_slots_match_frame_tags(frames in prop::collection::vec(frame_strategy(), 1..8)) {
            let mut scene = HeadlessScene::new(8, 8);
            let mut reg = ActorRegistry::new(EntityClass::TCell);
            let mut last_len = 0;

            for tags in frames {
                let records: Vec<AgentPosition> =
                    tags.iter().map(|&t| rec(t, t as f64, 0.0, 0.0)).collect();
                run(&mut reg, &mut scene, &records);

                let expected: BTreeSet<Tag> = tags.iter().copied().collect();
                let occupied: BTreeSet<Tag> = reg.occupied_tags().into_iter().collect();
                prop_assert_eq!(occupied, expected);

                // Registry never shrinks within a session
                prop_assert!(reg.len() >= last_len);
                last_len = reg.len();

                prop_assert_eq!(scene.scene_len(), reg.occupied_count());
            }
        }

        #[test]
        fn prop_reconcile_is_idempotent(tags in frame_strategy()) {
            let mut scene = HeadlessScene::new(8, 8);
            let mut reg = ActorRegistry::new(EntityClass::TCell);
            let records: Vec<AgentPosition> =
                tags.iter().map(|&t| rec(t, 1.0, 2.0, 3.0)).collect();

            run(&mut reg, &mut scene, &records);
            let again = run(&mut reg, &mut scene, &records);
            prop_assert!(again.is_stable());
        }
    }
}
