//! Seeded synthetic position streams.
//!
//! T cells enter the volume, random-walk, and leave; dendritic cells sit
//! still while their antigen level decays. A T cell within contact range of
//! a dendritic cell is bonded to the nearest one. All randomness comes from
//! one `ChaCha8Rng`, so a seed always yields the same file.

use crate::error::PlayerError;
use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, Poisson};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use tcview_core::{AgentPosition, BondPosition, Frame, Tag};

/// Parameters of a synthetic run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub frames: u64,
    pub initial_tcells: usize,
    pub dcells: usize,

    /// Cells live in `[-half_extent, half_extent]^3`
    pub half_extent: f64,

    /// Per-axis random-walk step, standard deviation
    pub step_std: f64,

    /// Chance per frame that a T cell leaves
    pub exit_probability: f64,

    /// Mean T cell arrivals per frame
    pub entry_rate: f64,

    /// Center distance at which a T cell binds a dendritic cell
    pub contact_distance: f64,

    pub tcell_diameter: f64,
    pub dcell_diameter: f64,

    /// Fraction of antigen lost per frame
    pub antigen_decay: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            frames: 100,
            initial_tcells: 40,
            dcells: 5,
            half_extent: 20.0,
            step_std: 0.8,
            exit_probability: 0.02,
            entry_rate: 0.8,
            contact_distance: 2.5,
            tcell_diameter: 1.0,
            dcell_diameter: 2.0,
            antigen_decay: 0.01,
        }
    }
}

struct SimTcell {
    position: Vector3<f64>,
    cd8: bool,
    activated: bool,
}

struct SimDcell {
    tag: Tag,
    position: Vector3<f64>,
    antigen: f64,
}

/// State code written for a T cell.
fn tcell_state(cell: &SimTcell, bound: bool) -> f64 {
    let base = if bound {
        99.0
    } else if cell.activated {
        1.0
    } else {
        0.0
    };
    if cell.cd8 {
        base + 100.0
    } else {
        base
    }
}

/// Seeded immune-cell motion model.
pub struct SyntheticSimulation {
    config: GeneratorConfig,
    rng: ChaCha8Rng,
    step: Normal<f64>,
    arrivals: Option<Poisson<f64>>,
    tcells: BTreeMap<Tag, SimTcell>,
    dcells: Vec<SimDcell>,
    next_tag: Tag,
    frames_emitted: u64,
}

impl SyntheticSimulation {
    /// Creates the simulation and places the initial population.
    pub fn new(config: GeneratorConfig) -> Result<Self, PlayerError> {
        if !(config.half_extent > 0.0) {
            return Err(PlayerError::Argument("half_extent must be positive".into()));
        }
        if !(0.0..=1.0).contains(&config.exit_probability) || !(0.0..=1.0).contains(&config.antigen_decay) {
            return Err(PlayerError::Argument(
                "exit_probability and antigen_decay must be in [0, 1]".into(),
            ));
        }
        let step = Normal::new(0.0, config.step_std).map_err(|e| PlayerError::Argument(e.to_string()))?;
        let arrivals = if config.entry_rate > 0.0 {
            Some(Poisson::new(config.entry_rate).map_err(|e| PlayerError::Argument(e.to_string()))?)
        } else {
            None
        };

        let mut sim = Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            step,
            arrivals,
            tcells: BTreeMap::new(),
            dcells: Vec::with_capacity(config.dcells),
            next_tag: 0,
            frames_emitted: 0,
            config,
        };

        for tag in 0..sim.config.dcells as Tag {
            let position = sim.random_point();
            sim.dcells.push(SimDcell {
                tag,
                position,
                antigen: 1.0,
            });
        }
        for _ in 0..sim.config.initial_tcells {
            sim.spawn_tcell();
        }
        Ok(sim)
    }

    fn random_point(&mut self) -> Vector3<f64> {
        let h = self.config.half_extent;
        Vector3::new(
            self.rng.gen_range(-h..h),
            self.rng.gen_range(-h..h),
            self.rng.gen_range(-h..h),
        )
    }

    fn spawn_tcell(&mut self) {
        let position = self.random_point();
        let cd8 = self.rng.gen_bool(0.5);
        self.tcells.insert(
            self.next_tag,
            SimTcell {
                position,
                cd8,
                activated: false,
            },
        );
        self.next_tag += 1;
    }

    /// Number of T cells currently in the volume.
    pub fn tcell_count(&self) -> usize {
        self.tcells.len()
    }

    /// Emits the current state as a frame, then advances one step.
    pub fn next_frame(&mut self) -> Frame {
        let frame = self.snapshot();
        self.advance();
        self.frames_emitted += 1;
        frame
    }

    fn snapshot(&mut self) -> Frame {
        let mut frame = Frame::new();

        for dc in &self.dcells {
            frame.dcells.push(AgentPosition::new(
                dc.tag,
                [dc.position.x, dc.position.y, dc.position.z],
                self.config.dcell_diameter,
                dc.antigen,
            ));
        }

        for (&tag, cell) in self.tcells.iter_mut() {
            let nearest = self
                .dcells
                .iter()
                .map(|dc| (dc.tag, (dc.position - cell.position).norm()))
                .filter(|&(_, d)| d <= self.config.contact_distance)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            if let Some((dcell_tag, _)) = nearest {
                cell.activated = true;
                frame.bonds.push(BondPosition {
                    tcell_tag: tag,
                    dcell_tag,
                });
            }
            frame.tcells.push(AgentPosition::new(
                tag,
                [cell.position.x, cell.position.y, cell.position.z],
                self.config.tcell_diameter,
                tcell_state(cell, nearest.is_some()),
            ));
        }

        frame
    }

    fn advance(&mut self) {
        let h = self.config.half_extent;

        let tags: Vec<Tag> = self.tcells.keys().copied().collect();
        for tag in tags {
            if self.rng.gen_bool(self.config.exit_probability) {
                self.tcells.remove(&tag);
                continue;
            }
            let delta = Vector3::new(
                self.step.sample(&mut self.rng),
                self.step.sample(&mut self.rng),
                self.step.sample(&mut self.rng),
            );
            if let Some(cell) = self.tcells.get_mut(&tag) {
                cell.position = (cell.position + delta).map(|v| v.clamp(-h, h));
            }
        }

        let arrivals = match &self.arrivals {
            Some(poisson) => poisson.sample(&mut self.rng) as usize,
            None => 0,
        };
        for _ in 0..arrivals {
            self.spawn_tcell();
        }

        for dc in self.dcells.iter_mut() {
            dc.antigen *= 1.0 - self.config.antigen_decay;
        }
    }
}

/// Writes one frame in the position-file format.
pub fn write_frame<W: Write>(frame: &Frame, out: &mut W) -> std::io::Result<()> {
    for dc in &frame.dcells {
        writeln!(
            out,
            "D {} {:.3} {:.3} {:.3} {} {:.4}",
            dc.tag, dc.x, dc.y, dc.z, dc.diameter, dc.state
        )?;
    }
    for t in &frame.tcells {
        writeln!(out, "T {} {:.3} {:.3} {:.3} {} {}", t.tag, t.x, t.y, t.z, t.diameter, t.state)?;
    }
    for b in &frame.bonds {
        writeln!(out, "B {} {}", b.tcell_tag, b.dcell_tag)?;
    }
    writeln!(out, "E")
}

/// What a generation run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateSummary {
    pub frames: u64,
    pub distinct_tcells: u32,
    pub bonds: usize,
}

/// Runs the simulation for `config.frames` frames into `out`.
pub fn generate<W: Write>(config: GeneratorConfig, out: &mut W) -> Result<GenerateSummary, PlayerError> {
    let frames = config.frames;
    let mut sim = SyntheticSimulation::new(config)?;
    let mut summary = GenerateSummary::default();

    for _ in 0..frames {
        let frame = sim.next_frame();
        summary.bonds += frame.bonds.len();
        write_frame(&frame, out)?;
    }
    out.flush()?;

    summary.frames = sim.frames_emitted;
    summary.distinct_tcells = sim.next_tag;
    Ok(summary)
}
