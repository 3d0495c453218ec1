use eframe::egui::Vec2;
use rand::Rng;
use rand::rngs::StdRng;

use crate::data::UserNode;

use super::quadtree::{QuadCell, SpatialIndex};
use super::simulation::ResolvedLink;

const BARNES_HUT_THETA: f32 = 0.9;
const MIN_DISTANCE_SQ: f32 = 1.0;

pub struct ForceFrame<'a> {
    pub nodes: &'a mut [UserNode],
    pub active: &'a [usize],
    pub active_mask: &'a [bool],
    pub links: &'a [ResolvedLink],
    pub alpha: f32,
    pub rng: &'a mut StdRng,
}

pub trait Force {
    fn initialize(&mut self, _nodes: &[UserNode], _active: &[usize], _links: &[ResolvedLink]) {}

    fn apply(&mut self, frame: &mut ForceFrame<'_>);
}

pub(super) fn jiggle(rng: &mut StdRng) -> f32 {
    (rng.r#gen::<f32>() - 0.5) * 1e-6
}

pub struct LinkForce {
    distance: f32,
    strengths: Vec<f32>,
    biases: Vec<f32>,
}

impl LinkForce {
    pub fn new(distance: f32) -> Self {
        Self {
            distance,
            strengths: Vec::new(),
            biases: Vec::new(),
        }
    }
}

impl Force for LinkForce {
    fn initialize(&mut self, nodes: &[UserNode], _active: &[usize], links: &[ResolvedLink]) {
        let mut degree = vec![0usize; nodes.len()];
        for link in links {
            degree[link.source] += 1;
            degree[link.target] += 1;
        }

        self.strengths = links
            .iter()
            .map(|link| 1.0 / degree[link.source].min(degree[link.target]).max(1) as f32)
            .collect();
        self.biases = links
            .iter()
            .map(|link| {
                let source = degree[link.source] as f32;
                let target = degree[link.target] as f32;
                source / (source + target).max(1.0)
            })
            .collect();
    }

    fn apply(&mut self, frame: &mut ForceFrame<'_>) {
        if self.strengths.len() != frame.links.len() {
            return;
        }

        for (index, link) in frame.links.iter().enumerate() {
            let (source, target) = (link.source, link.target);
            if source == target {
                continue;
            }

            let source_next = frame.nodes[source].position + frame.nodes[source].velocity;
            let target_next = frame.nodes[target].position + frame.nodes[target].velocity;
            let mut delta = target_next - source_next;
            if delta.x == 0.0 {
                delta.x = jiggle(frame.rng);
            }
            if delta.y == 0.0 {
                delta.y = jiggle(frame.rng);
            }

            let length = delta.length();
            let scale = (length - self.distance) / length * frame.alpha * self.strengths[index];
            let correction = delta * scale;
            let bias = self.biases[index];

            // An endpoint outside the active view acts as a fixed anchor.
            if frame.active_mask[target] {
                frame.nodes[target].velocity -= correction * bias;
            }
            if frame.active_mask[source] {
                frame.nodes[source].velocity += correction * (1.0 - bias);
            }
        }
    }
}

pub struct ManyBodyForce {
    strength: f32,
    positions: Vec<Vec2>,
    weights: Vec<f32>,
}

impl ManyBodyForce {
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            positions: Vec::new(),
            weights: Vec::new(),
        }
    }

    pub fn node_strength(&self, node: &UserNode) -> f32 {
        -self.strength * ((node.connection_count() + 1) as f32).sqrt()
    }
}

impl Force for ManyBodyForce {
    fn initialize(&mut self, nodes: &[UserNode], active: &[usize], _links: &[ResolvedLink]) {
        self.weights = active
            .iter()
            .map(|&index| self.node_strength(&nodes[index]))
            .collect();
    }

    fn apply(&mut self, frame: &mut ForceFrame<'_>) {
        if self.weights.len() != frame.active.len() || frame.active.len() < 2 {
            return;
        }

        self.positions.clear();
        self.positions
            .extend(frame.active.iter().map(|&index| frame.nodes[index].position));
        let index = SpatialIndex::build_weighted(&self.positions, &self.weights);
        let Some(root) = index.root() else {
            return;
        };

        let theta_sq = BARNES_HUT_THETA * BARNES_HUT_THETA;
        for (slot, &node_index) in frame.active.iter().enumerate() {
            let mut push = Vec2::ZERO;
            accumulate_repulsion(
                root,
                slot,
                &self.positions,
                &self.weights,
                frame.alpha,
                theta_sq,
                frame.rng,
                &mut push,
            );
            frame.nodes[node_index].velocity += push;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn accumulate_repulsion(
    cell: &QuadCell,
    slot: usize,
    positions: &[Vec2],
    weights: &[f32],
    alpha: f32,
    theta_sq: f32,
    rng: &mut StdRng,
    push: &mut Vec2,
) {
    if cell.weight == 0.0 {
        return;
    }

    let point = positions[slot];
    let delta = cell.centroid - point;
    let distance_sq = delta.length_sq();
    let side = cell.bounds.side_length();
    let can_approximate = !cell.bounds.contains(point) && (side * side / theta_sq) < distance_sq;

    if can_approximate {
        let distance_sq = soften(distance_sq);
        *push += delta * (cell.weight * alpha / distance_sq);
        return;
    }

    if cell.is_leaf() {
        for &other in cell.indices() {
            if other == slot {
                continue;
            }
            let mut delta = positions[other] - point;
            if delta.x == 0.0 {
                delta.x = jiggle(rng);
            }
            if delta.y == 0.0 {
                delta.y = jiggle(rng);
            }
            let distance_sq = soften(delta.length_sq());
            *push += delta * (weights[other] * alpha / distance_sq);
        }
        return;
    }

    for child in cell.children() {
        accumulate_repulsion(child, slot, positions, weights, alpha, theta_sq, rng, push);
    }
}

fn soften(distance_sq: f32) -> f32 {
    if distance_sq < MIN_DISTANCE_SQ {
        (MIN_DISTANCE_SQ * distance_sq).sqrt()
    } else {
        distance_sq
    }
}

pub struct CenterForce {
    center: Vec2,
    strength: f32,
}

impl CenterForce {
    pub fn new(center: Vec2, strength: f32) -> Self {
        Self { center, strength }
    }
}

impl Force for CenterForce {
    fn apply(&mut self, frame: &mut ForceFrame<'_>) {
        if frame.active.is_empty() {
            return;
        }

        let mut centroid = Vec2::ZERO;
        for &index in frame.active {
            centroid += frame.nodes[index].position;
        }
        centroid /= frame.active.len() as f32;

        let shift = (centroid - self.center) * self.strength;
        for &index in frame.active {
            frame.nodes[index].position -= shift;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

pub struct ClusterAxisForce {
    axis: Axis,
    anchors: Vec<Option<Vec2>>,
    strength: f32,
}

impl ClusterAxisForce {
    pub fn new(axis: Axis, anchors: Vec<Option<Vec2>>, strength: f32) -> Self {
        Self {
            axis,
            anchors,
            strength,
        }
    }
}

impl Force for ClusterAxisForce {
    fn apply(&mut self, frame: &mut ForceFrame<'_>) {
        let scale = self.strength * frame.alpha;
        for &index in frame.active {
            let node = &mut frame.nodes[index];
            let Some(anchor) = node
                .cluster
                .and_then(|key| self.anchors.get(key).copied().flatten())
            else {
                continue;
            };

            match self.axis {
                Axis::X => node.velocity.x += (anchor.x - node.position.x) * scale,
                Axis::Y => node.velocity.y += (anchor.y - node.position.y) * scale,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;
    use rand::SeedableRng;

    use super::*;
    use crate::data::{UserId, UserRecord};

    fn node(id: i64, connections: &[i64], position: Vec2) -> UserNode {
        let record = UserRecord {
            user_id: UserId::from(id),
            connections: connections.iter().copied().map(UserId::from).collect(),
            check_in_time: Vec::new(),
        };
        let mut node = UserNode::from_record(record, 0).unwrap();
        node.position = position;
        node
    }

    fn apply(force: &mut dyn Force, nodes: &mut [UserNode], links: &[ResolvedLink]) {
        let active = (0..nodes.len()).collect::<Vec<_>>();
        let mask = vec![true; nodes.len()];
        let mut rng = StdRng::seed_from_u64(7);
        force.initialize(nodes, &active, links);
        let mut frame = ForceFrame {
            nodes,
            active: &active,
            active_mask: &mask,
            links,
            alpha: 1.0,
            rng: &mut rng,
        };
        force.apply(&mut frame);
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let mut nodes = vec![
            node(1, &[2], vec2(0.0, 0.0)),
            node(2, &[1], vec2(400.0, 0.0)),
        ];
        let links = [ResolvedLink {
            source: 0,
            target: 1,
            weight: 1,
        }];
        apply(&mut LinkForce::new(200.0), &mut nodes, &links);
        assert!(nodes[0].velocity.x > 0.0);
        assert!(nodes[1].velocity.x < 0.0);
    }

    #[test]
    fn inactive_endpoint_is_not_moved() {
        let mut nodes = vec![
            node(1, &[2], vec2(0.0, 0.0)),
            node(2, &[1], vec2(400.0, 0.0)),
        ];
        let links = [ResolvedLink {
            source: 0,
            target: 1,
            weight: 1,
        }];
        let mut force = LinkForce::new(200.0);
        force.initialize(&nodes, &[0], &links);
        let mut rng = StdRng::seed_from_u64(1);
        let mut frame = ForceFrame {
            nodes: &mut nodes,
            active: &[0],
            active_mask: &[true, false],
            links: &links,
            alpha: 1.0,
            rng: &mut rng,
        };
        force.apply(&mut frame);
        assert!(nodes[0].velocity.x > 0.0);
        assert_eq!(nodes[1].velocity, Vec2::ZERO);
    }

    #[test]
    fn hubs_repel_harder() {
        let force = ManyBodyForce::new(30.0);
        let lonely = node(1, &[], Vec2::ZERO);
        let hub = node(2, &[3, 4, 5], Vec2::ZERO);
        assert_eq!(force.node_strength(&lonely), -30.0);
        assert_eq!(force.node_strength(&hub), -60.0);
    }

    #[test]
    fn many_body_pushes_nodes_apart() {
        let mut nodes = vec![node(1, &[], vec2(-5.0, 0.0)), node(2, &[], vec2(5.0, 0.0))];
        apply(&mut ManyBodyForce::new(30.0), &mut nodes, &[]);
        assert!(nodes[0].velocity.x < 0.0);
        assert!(nodes[1].velocity.x > 0.0);
    }

    #[test]
    fn center_force_moves_centroid_to_origin() {
        let mut nodes = vec![node(1, &[], vec2(10.0, 10.0)), node(2, &[], vec2(30.0, 10.0))];
        apply(&mut CenterForce::new(Vec2::ZERO, 1.0), &mut nodes, &[]);
        let centroid = (nodes[0].position + nodes[1].position) * 0.5;
        assert!(centroid.length() < 1e-4);
    }

    #[test]
    fn axis_force_pulls_toward_anchor() {
        let mut nodes = vec![node(1, &[], vec2(0.0, 0.0)), node(2, &[], vec2(0.0, 0.0))];
        nodes[0].cluster = Some(1);
        let anchors = vec![None, Some(vec2(100.0, -50.0))];
        apply(
            &mut ClusterAxisForce::new(Axis::X, anchors.clone(), 0.5),
            &mut nodes,
            &[],
        );
        apply(&mut ClusterAxisForce::new(Axis::Y, anchors, 0.5), &mut nodes, &[]);
        assert_eq!(nodes[0].velocity, vec2(50.0, -25.0));
        assert_eq!(nodes[1].velocity, Vec2::ZERO);
    }
}
