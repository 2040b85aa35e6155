//! Viewer configuration.

use crate::color::PaletteKind;
use crate::error::ViewError;
use crate::model::Tag;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tcview_env::{ImageFormat, MeshTemplate, Rgb};

/// Configuration for a viewer session.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// T cell palette policy
    pub tcell_palette: PaletteKind,

    /// Dendritic cell palette policy
    pub dcell_palette: PaletteKind,

    /// Bond color
    pub bond_color: Rgb,

    /// T cell geometry
    pub tcell_mesh: MeshTemplate,

    /// Dendritic cell geometry
    pub dcell_mesh: MeshTemplate,

    /// Bond geometry (unit height along +Y)
    pub bond_mesh: MeshTemplate,

    /// Dendritic cells move between frames
    pub dc_motion: bool,

    /// Dendritic cells are recolored by antigen level every frame
    pub dc_fade: bool,

    /// Initial camera zoom (below 1 zooms out)
    pub zoom_level: f64,

    /// Clear color
    pub background: Rgb,

    /// Largest tag a registry may grow to
    pub max_tag: Tag,

    /// Capture buffer width in pixels
    pub capture_width: u32,

    /// Capture buffer height in pixels
    pub capture_height: u32,

    /// Format of frames captured during playback
    pub capture_format: ImageFormat,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            tcell_palette: PaletteKind::tcell_default(),
            dcell_palette: PaletteKind::dcell_default(),
            bond_color: Rgb::new(0.5, 0.0, 0.0),
            tcell_mesh: MeshTemplate::tcell(),
            dcell_mesh: MeshTemplate::dcell(),
            bond_mesh: MeshTemplate::bond(),
            dc_motion: false,
            dc_fade: true,
            zoom_level: 0.7,
            background: Rgb::new(0.0, 0.0, 0.0),
            max_tag: 1_000_000,
            capture_width: 800,
            capture_height: 600,
            capture_format: ImageFormat::Jpeg,
        }
    }
}

impl ViewerConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ViewError> {
        let config: ViewerConfig =
            serde_json::from_str(json).map_err(|e| ViewError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ViewError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ViewError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ViewError> {
        if !(self.zoom_level.is_finite() && self.zoom_level > 0.0) {
            return Err(ViewError::config(format!(
                "zoom_level must be positive, got {}",
                self.zoom_level
            )));
        }
        if self.capture_width == 0 || self.capture_height == 0 {
            return Err(ViewError::config("capture size must be non-zero"));
        }
        for palette in [&self.tcell_palette, &self.dcell_palette] {
            if let PaletteKind::AntigenFade { min_level, .. } = palette {
                if !(0.0..=1.0).contains(min_level) {
                    return Err(ViewError::config(format!(
                        "min_level must be in [0, 1], got {}",
                        min_level
                    )));
                }
            }
        }
        for mesh in [&self.tcell_mesh, &self.dcell_mesh, &self.bond_mesh] {
            if !(mesh.nominal_diameter() > 0.0) {
                return Err(ViewError::config(format!("mesh radius must be positive: {:?}", mesh)));
            }
        }
        Ok(())
    }
}
