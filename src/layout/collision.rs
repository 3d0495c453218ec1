use eframe::egui::{Vec2, vec2};
use rand::rngs::StdRng;

use crate::data::UserNode;

use super::forces::{Force, ForceFrame, jiggle};
use super::quadtree::SpatialIndex;
use super::simulation::ResolvedLink;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionParams {
    pub strength: f32,
    pub same_padding: f32,
    pub different_padding: f32,
}

impl CollisionParams {
    pub const fn new(strength: f32, same_padding: f32, different_padding: f32) -> Self {
        Self {
            strength,
            same_padding,
            different_padding,
        }
    }

    fn padding_between(self, a: &UserNode, b: &UserNode) -> f32 {
        if a.cluster == b.cluster {
            self.same_padding
        } else {
            self.different_padding
        }
    }
}

/// Damped circle separation. Overlapping pairs are pushed apart along the line
/// between them by `(r - l) * strength`, half to each side, so full separation
/// takes several steps.
pub struct CollisionForce {
    params: CollisionParams,
    max_reach: f32,
    positions: Vec<Vec2>,
}

impl CollisionForce {
    pub fn new(params: CollisionParams) -> Self {
        Self {
            params,
            max_reach: 0.0,
            positions: Vec::new(),
        }
    }

    pub fn params(&self) -> CollisionParams {
        self.params
    }

    pub fn max_reach(&self) -> f32 {
        self.max_reach
    }
}

impl Force for CollisionForce {
    fn initialize(&mut self, nodes: &[UserNode], active: &[usize], _links: &[ResolvedLink]) {
        let max_radius = active
            .iter()
            .map(|&index| nodes[index].radius)
            .fold(0.0_f32, f32::max);
        self.max_reach =
            max_radius + self.params.same_padding.max(self.params.different_padding);
    }

    fn apply(&mut self, frame: &mut ForceFrame<'_>) {
        if frame.active.len() < 2 {
            return;
        }

        self.positions.clear();
        self.positions
            .extend(frame.active.iter().map(|&index| frame.nodes[index].position));
        let index = SpatialIndex::build(&self.positions);

        let mut candidates = Vec::new();
        for slot in 0..frame.active.len() {
            let node_index = frame.active[slot];
            let probe = frame.nodes[node_index].radius + self.max_reach;
            let center = frame.nodes[node_index].position;
            let (min, max) = (center - vec2(probe, probe), center + vec2(probe, probe));

            candidates.clear();
            index.visit(
                |bounds| bounds.disjoint_from(min, max),
                |indices| candidates.extend(indices.iter().copied().filter(|&other| other > slot)),
            );

            for &other_slot in &candidates {
                let other_index = frame.active[other_slot];
                separate(
                    frame.nodes,
                    node_index,
                    other_index,
                    self.params,
                    frame.rng,
                );
            }
        }
    }
}

fn separate(
    nodes: &mut [UserNode],
    a: usize,
    b: usize,
    params: CollisionParams,
    rng: &mut StdRng,
) {
    let required =
        nodes[a].radius + nodes[b].radius + params.padding_between(&nodes[a], &nodes[b]);
    let mut delta = nodes[a].position - nodes[b].position;
    if delta.x == 0.0 && delta.y == 0.0 {
        delta = vec2(jiggle(rng), jiggle(rng));
    }

    let distance = delta.length();
    if distance >= required || distance == 0.0 {
        return;
    }

    let push = delta * ((required - distance) / distance * params.strength * 0.5);
    nodes[a].position += push;
    nodes[b].position -= push;
}
