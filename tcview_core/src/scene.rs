//! Scene - the three actor registries bound to one render gateway.

use crate::color::ColorStrategy;
use crate::config::ViewerConfig;
use crate::error::ViewError;
use crate::model::{EntityClass, Frame};
use crate::reconcile::{
    check_tag_bound, rebuild_bonds, reconcile_agents, ClassStyle, ReconcileStats, UpdatePolicy,
};
use crate::registry::ActorRegistry;
use serde::{Deserialize, Serialize};
use tcview_env::{ActorId, RenderGateway};
use tracing::{debug, info};

/// Per-class churn for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    pub tcells: ReconcileStats,
    pub dcells: ReconcileStats,
    pub bonds: ReconcileStats,
}

impl FrameStats {
    /// Total actors created this frame.
    pub fn created(&self) -> usize {
        self.tcells.created + self.dcells.created + self.bonds.created
    }

    /// Total actors removed this frame.
    pub fn retired(&self) -> usize {
        self.tcells.retired + self.dcells.retired + self.bonds.retired
    }
}

/// Owns the gateway, the registries and the color strategies.
pub struct Scene<G> {
    gateway: G,
    config: ViewerConfig,
    tcells: ActorRegistry,
    dcells: ActorRegistry,
    bonds: Vec<ActorId>,
    tcell_colors: Box<dyn ColorStrategy>,
    dcell_colors: Box<dyn ColorStrategy>,
    first_render: bool,
}

impl<G: RenderGateway> Scene<G> {
    /// Creates an empty scene and applies the background and initial zoom.
    pub fn new(mut gateway: G, config: ViewerConfig) -> Self {
        gateway.set_background(config.background);
        gateway.zoom_camera(config.zoom_level);

        Self {
            tcell_colors: config.tcell_palette.build(),
            dcell_colors: config.dcell_palette.build(),
            gateway,
            config,
            tcells: ActorRegistry::new(EntityClass::TCell),
            dcells: ActorRegistry::new(EntityClass::DCell),
            bonds: Vec::new(),
            first_render: true,
        }
    }

    /// Replaces the T cell color strategy.
    pub fn with_tcell_colors(mut self, colors: Box<dyn ColorStrategy>) -> Self {
        self.tcell_colors = colors;
        self
    }

    /// Replaces the dendritic cell color strategy.
    pub fn with_dcell_colors(mut self, colors: Box<dyn ColorStrategy>) -> Self {
        self.dcell_colors = colors;
        self
    }

    /// Reconciles every class against `frame` and renders.
    ///
    /// T cells are refreshed every frame. Dendritic cells are refreshed on
    /// the first render and afterwards only when `dc_motion` or `dc_fade`
    /// is set. Bonds are rebuilt after both agent classes.
    ///
    /// Every tag in the frame is checked against `max_tag` first, so a
    /// rejected frame leaves the scene exactly as it was.
    ///
    /// # Errors
    /// * `ViewError::TagOutOfRange` - a tag exceeds `max_tag`; nothing is
    ///   touched
    /// * `ViewError::Internal` - a registry invariant broke
    /// * `ViewError::Gateway` - the gateway rejected a call
    pub fn render_frame(&mut self, frame: &Frame) -> Result<FrameStats, ViewError> {
        let max_tag = self.config.max_tag;
        check_tag_bound(EntityClass::TCell, frame.tcells.iter().map(|r| &r.tag), max_tag)?;
        check_tag_bound(EntityClass::DCell, frame.dcells.iter().map(|r| &r.tag), max_tag)?;
        check_tag_bound(EntityClass::TCell, frame.bonds.iter().map(|b| &b.tcell_tag), max_tag)?;
        check_tag_bound(EntityClass::DCell, frame.bonds.iter().map(|b| &b.dcell_tag), max_tag)?;

        let tcell_style = ClassStyle {
            mesh: &self.config.tcell_mesh,
            colors: self.tcell_colors.as_ref(),
            max_tag: self.config.max_tag,
        };
        let tcells = reconcile_agents(
            &mut self.tcells,
            &frame.tcells,
            &mut self.gateway,
            &tcell_style,
            UpdatePolicy::Always,
        )?;

        let dcell_style = ClassStyle {
            mesh: &self.config.dcell_mesh,
            colors: self.dcell_colors.as_ref(),
            max_tag: self.config.max_tag,
        };
        let dcells = reconcile_agents(
            &mut self.dcells,
            &frame.dcells,
            &mut self.gateway,
            &dcell_style,
            UpdatePolicy::WhenChanged {
                redo: self.first_render,
                motion: self.config.dc_motion,
                fade: self.config.dc_fade,
            },
        )?;

        let bonds = rebuild_bonds(
            &mut self.bonds,
            &frame.bonds,
            &self.tcells,
            &self.dcells,
            &mut self.gateway,
            &self.config.bond_mesh,
            self.config.bond_color,
        )?;

        if self.first_render {
            info!("Initializing the renderer");
            self.gateway.reset_camera();
            self.first_render = false;
        }
        self.gateway.render()?;

        let stats = FrameStats { tcells, dcells, bonds };
        debug!(
            "Rendered frame: {} T cells, {} DCs, {} bonds ({} created, {} retired)",
            self.tcells.occupied_count(),
            self.dcells.occupied_count(),
            self.bonds.len(),
            stats.created(),
            stats.retired()
        );
        Ok(stats)
    }

    /// Removes every actor and forgets all registry slots.
    ///
    /// The next rendered frame resets the camera again.
    pub fn cleanup(&mut self) -> Result<usize, ViewError> {
        let mut removed = self.tcells.clear(&mut self.gateway)?;
        removed += self.dcells.clear(&mut self.gateway)?;
        for id in self.bonds.drain(..) {
            self.gateway.remove_actor(id)?;
            removed += 1;
        }
        self.first_render = true;
        info!("Scene cleared ({} actors removed)", removed);
        Ok(removed)
    }

    /// Returns true once a frame has been rendered since the last cleanup.
    pub fn has_rendered(&self) -> bool {
        !self.first_render
    }

    pub fn tcells(&self) -> &ActorRegistry {
        &self.tcells
    }

    pub fn dcells(&self) -> &ActorRegistry {
        &self.dcells
    }

    pub fn bond_actors(&self) -> &[ActorId] {
        &self.bonds
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }
}
