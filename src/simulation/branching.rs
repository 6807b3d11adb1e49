//! # Branching point layout
//!
//! Alternative initial layout: starting from a root at the origin, every
//! node spawns `fan_out` children at unit distance in a random direction,
//! down to `depth` levels. The parent/child edges are kept so a line
//! renderer can draw the tree.
//!
//! Nodes live in a flat arena (`Vec<BranchNode>`) and refer to their parent
//! by index. Generation is breadth-first from an explicit queue, so depth is
//! bounded by the arena size rather than the call stack.

use std::collections::VecDeque;
use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::simulation::error::{invalid, SimResult};
use crate::simulation::states::{sample_cube, NVec3, Particle, ParticleEnsemble};

/// Shape of the branching layout
#[derive(Debug, Clone)]
pub struct BranchSpec {
    pub depth: usize, // levels below the root
    pub fan_out: usize, // children per node
    pub mass_scale: f64, // child masses drawn from (0, mass_scale]
    pub velocity_range: f64, // velocities drawn from [-range, range]
    pub seed: u64,
}

/// One arena slot
#[derive(Debug, Clone)]
pub struct BranchNode {
    pub x: NVec3,
    pub depth: usize,
    pub parent: Option<usize>, // index into the arena, None for the root
}

/// Arena of generated nodes plus the ensemble built from them
#[derive(Debug, Clone)]
pub struct BranchLayout {
    pub nodes: Vec<BranchNode>,
}

impl BranchLayout {
    /// Number of nodes the layout will hold: 1 + f + f^2 + ... + f^depth
    pub fn node_count(spec: &BranchSpec) -> Option<usize> {
        let mut total: usize = 1;
        let mut level: usize = 1;
        for _ in 0..spec.depth {
            level = level.checked_mul(spec.fan_out)?;
            total = total.checked_add(level)?;
        }
        Some(total)
    }

    pub fn generate(spec: &BranchSpec) -> SimResult<Self> {
        if spec.fan_out == 0 || spec.depth == 0 {
            return Err(invalid("branching layout needs depth > 0 and fan_out > 0"));
        }
        let capacity = Self::node_count(spec)
            .ok_or_else(|| invalid("branching layout too large"))?;

        let mut rng = StdRng::seed_from_u64(spec.seed);
        let mut nodes = Vec::with_capacity(capacity);
        nodes.push(BranchNode { x: NVec3::zeros(), depth: 0, parent: None });

        let mut queue = VecDeque::from([0usize]);
        while let Some(id) = queue.pop_front() {
            let (origin, depth) = (nodes[id].x, nodes[id].depth);
            if depth >= spec.depth {
                continue;
            }

            for _ in 0..spec.fan_out {
                let theta = rng.gen::<f64>() * 2.0 * PI; // around z
                let phi = rng.gen::<f64>() * PI; // from z
                let dir = NVec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());

                let child = nodes.len();
                nodes.push(BranchNode { x: origin + dir, depth: depth + 1, parent: Some(id) });
                queue.push_back(child);
            }
        }

        Ok(Self { nodes })
    }

    /// (parent, child) index pairs, in arena order
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.parent.map(|p| (p, i)))
            .collect()
    }

    /// Turn the arena into particles; index i of the ensemble is node i
    pub fn into_ensemble(&self, spec: &BranchSpec) -> SimResult<ParticleEnsemble> {
        if !(spec.mass_scale > 0.0) || !spec.mass_scale.is_finite() {
            return Err(invalid(format!("mass scale must be positive, got {}", spec.mass_scale)));
        }

        // Separate stream from the geometry so changing velocity range keeps positions
        let mut rng = StdRng::seed_from_u64(spec.seed ^ 0x5DEE_CE66_D1CE_5EED);
        let particles = self
            .nodes
            .iter()
            .map(|node| {
                let m = spec.mass_scale * (1.0 - rng.gen::<f64>());
                let v = sample_cube(&mut rng, spec.velocity_range);
                let mut p = if rng.gen_bool(0.5) {
                    Particle::quantum(node.x, m)
                } else {
                    Particle::classical(node.x, m)
                };
                p.v = v;
                p
            })
            .collect();

        ParticleEnsemble::from_particles(particles)
    }
}

impl ParticleEnsemble {
    /// Branching layout as an ensemble, plus the layout for its edges
    pub fn initialize_branching(spec: &BranchSpec) -> SimResult<(Self, BranchLayout)> {
        let layout = BranchLayout::generate(spec)?;
        let ensemble = layout.into_ensemble(spec)?;
        Ok((ensemble, layout))
    }
}
