//! Position records: the per-frame data the viewer reconciles against.

use crate::error::ViewError;
use serde::{Deserialize, Serialize};
use tcview_env::Point3;

/// Stable, non-negative identifier of a simulation entity.
///
/// Used directly as an index into an [`ActorRegistry`](crate::ActorRegistry).
pub type Tag = u32;

/// Entity classes drawn by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    /// Mobile T cells (spheres, updated every frame)
    TCell,

    /// Stationary dendritic cells (spheres, updated on change)
    DCell,

    /// T cell to dendritic cell bonds (cylinders, rebuilt every frame)
    Bond,
}

impl EntityClass {
    /// Returns the human-readable class name.
    pub fn name(&self) -> &'static str {
        match self {
            EntityClass::TCell => "T cell",
            EntityClass::DCell => "dendritic cell",
            EntityClass::Bond => "bond",
        }
    }
}

impl std::fmt::Display for EntityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Position and state of one agent in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentPosition {
    pub tag: Tag,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub diameter: f64,
    /// Discrete state code (T cells) or antigen level in [0, 1] (DCs)
    pub state: f64,
}

impl AgentPosition {
    /// Creates a record.
    pub fn new(tag: Tag, position: Point3, diameter: f64, state: f64) -> Self {
        Self {
            tag,
            x: position[0],
            y: position[1],
            z: position[2],
            diameter,
            state,
        }
    }

    /// Returns the position as a point.
    pub fn position(&self) -> Point3 {
        [self.x, self.y, self.z]
    }
}

/// A bond between a T cell and a dendritic cell in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BondPosition {
    /// Tag in the T cell registry
    pub tcell_tag: Tag,
    /// Tag in the dendritic cell registry
    pub dcell_tag: Tag,
}

/// All records valid for one simulation timestep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tcells: Vec<AgentPosition>,
    pub dcells: Vec<AgentPosition>,
    pub bonds: Vec<BondPosition>,
}

impl Frame {
    /// Creates an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records of every class.
    pub fn record_count(&self) -> usize {
        self.tcells.len() + self.dcells.len() + self.bonds.len()
    }

    /// Returns true if the frame holds no records.
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Builds a frame from a live simulation's packed T cell buffer.
    ///
    /// The buffer holds `[tag, x, y, z, state]` quintuples. Every cell gets
    /// the same `diameter`.
    pub fn from_packed_tcells(packed: &[i32], diameter: f64) -> Result<Self, ViewError> {
        if packed.len() % 5 != 0 {
            return Err(ViewError::Packed {
                index: packed.len() / 5,
                reason: format!("buffer length {} is not a multiple of 5", packed.len()),
            });
        }

        let mut frame = Frame::new();
        for (index, cell) in packed.chunks_exact(5).enumerate() {
            let tag = Tag::try_from(cell[0]).map_err(|_| ViewError::Packed {
                index,
                reason: format!("negative tag {}", cell[0]),
            })?;
            frame.tcells.push(AgentPosition {
                tag,
                x: cell[1] as f64,
                y: cell[2] as f64,
                z: cell[3] as f64,
                diameter,
                state: cell[4] as f64,
            });
        }
        Ok(frame)
    }
}
