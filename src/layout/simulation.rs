use eframe::egui::{Vec2, vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::data::{UserGraph, UserLink, UserNode};

use super::collision::CollisionParams;
use super::forces::{Force, ForceFrame};

pub const LINK_FORCE: &str = "link";
pub const CHARGE_FORCE: &str = "charge";
pub const CENTER_FORCE: &str = "center";
pub const COLLISION_FORCE: &str = "collision";
pub const CLUSTER_X_FORCE: &str = "cluster_x";
pub const CLUSTER_Y_FORCE: &str = "cluster_y";

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub link_distance: f32,
    pub charge_strength: f32,
    pub center_strength: f32,
    pub base_collision: CollisionParams,
    pub cluster_collision: CollisionParams,
    pub cluster_axis_strength: f32,
    pub canvas: Vec2,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            link_distance: 200.0,
            charge_strength: 30.0,
            center_strength: 1.0,
            base_collision: CollisionParams::new(0.5, 36.0, 36.0),
            cluster_collision: CollisionParams::new(0.6, 2.0, 3.0),
            cluster_axis_strength: 0.5,
            canvas: vec2(1200.0, 700.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedLink {
    pub source: usize,
    pub target: usize,
    pub weight: usize,
}

pub struct StepFrame<'a> {
    pub nodes: &'a [UserNode],
    pub active: &'a [usize],
    pub links: &'a [ResolvedLink],
    pub alpha: f32,
}

pub type StepCallback = Box<dyn FnMut(&StepFrame<'_>)>;

pub struct ForceSimulation {
    config: SimulationConfig,
    active: Vec<usize>,
    active_mask: Vec<bool>,
    links: Vec<ResolvedLink>,
    forces: Vec<(&'static str, Box<dyn Force>)>,
    forces_ready: bool,
    alpha: f32,
    alpha_target: f32,
    rng: StdRng,
    on_step: Option<StepCallback>,
}

impl ForceSimulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: SimulationConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulationConfig, rng: StdRng) -> Self {
        Self {
            config,
            active: Vec::new(),
            active_mask: Vec::new(),
            links: Vec::new(),
            forces: Vec::new(),
            forces_ready: false,
            alpha: 1.0,
            alpha_target: 0.0,
            rng,
            on_step: None,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Replace the driven working set. Links that lose both endpoints are
    /// dropped, and inactive nodes lose any pin they held.
    pub fn set_nodes(&mut self, nodes: &mut [UserNode], active: Vec<usize>) {
        self.active_mask.clear();
        self.active_mask.resize(nodes.len(), false);
        self.active = active
            .into_iter()
            .filter(|&index| {
                let fresh = index < nodes.len() && !self.active_mask[index];
                if fresh {
                    self.active_mask[index] = true;
                }
                fresh
            })
            .collect();

        let mut cleared = 0usize;
        for (index, node) in nodes.iter_mut().enumerate() {
            if !self.active_mask[index] && node.pinned.take().is_some() {
                cleared += 1;
            }
        }
        if cleared > 0 {
            log::debug!("cleared {cleared} pins on nodes that left the view");
        }

        let mask = &self.active_mask;
        self.links.retain(|link| mask[link.source] || mask[link.target]);
        self.forces_ready = false;
    }

    pub fn set_links<'a>(
        &mut self,
        graph: &UserGraph,
        links: impl IntoIterator<Item = &'a UserLink>,
    ) {
        if self.active_mask.len() != graph.node_count() {
            self.active_mask.resize(graph.node_count(), false);
        }

        let mut dangling = 0usize;
        self.links.clear();
        for link in links {
            let (Some(source), Some(target)) =
                (graph.index_of(&link.source), graph.index_of(&link.target))
            else {
                dangling += 1;
                continue;
            };
            if self.active_mask[source] || self.active_mask[target] {
                self.links.push(ResolvedLink {
                    source,
                    target,
                    weight: link.weight,
                });
            }
        }
        if dangling > 0 {
            log::debug!("skipped {dangling} links with endpoints outside the graph");
        }
        self.forces_ready = false;
    }

    pub fn insert_force(&mut self, name: &'static str, force: Box<dyn Force>) {
        match self.forces.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = force,
            None => self.forces.push((name, force)),
        }
        self.forces_ready = false;
    }

    pub fn remove_force(&mut self, name: &str) -> bool {
        let before = self.forces.len();
        self.forces.retain(|(existing, _)| *existing != name);
        before != self.forces.len()
    }

    pub fn has_force(&self, name: &str) -> bool {
        self.forces.iter().any(|(existing, _)| *existing == name)
    }

    pub fn force_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.forces.iter().map(|(name, _)| *name)
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    /// Set the target and lift alpha to at least it, waking a settled simulation.
    pub fn restart(&mut self, target: f32) {
        self.set_alpha_target(target);
        self.alpha = self.alpha.max(self.alpha_target);
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active_mask.get(index).copied().unwrap_or(false)
    }

    pub fn active(&self) -> &[usize] {
        &self.active
    }

    pub fn links(&self) -> &[ResolvedLink] {
        &self.links
    }

    pub fn pin(&self, nodes: &mut [UserNode], index: usize, position: Vec2) -> bool {
        if !self.is_active(index) {
            return false;
        }
        let node = &mut nodes[index];
        node.pinned = Some(position);
        node.position = position;
        node.velocity = Vec2::ZERO;
        true
    }

    pub fn unpin(&self, nodes: &mut [UserNode], index: usize) -> bool {
        nodes
            .get_mut(index)
            .and_then(|node| node.pinned.take())
            .is_some()
    }

    pub fn on_step(&mut self, callback: StepCallback) {
        self.on_step = Some(callback);
    }

    pub fn clear_on_step(&mut self) {
        self.on_step = None;
    }

    pub fn step(&mut self, nodes: &mut [UserNode]) -> bool {
        if self.is_settled() {
            return false;
        }

        if !self.forces_ready {
            for (_, force) in &mut self.forces {
                force.initialize(nodes, &self.active, &self.links);
            }
            self.forces_ready = true;
        }

        let mut frame = ForceFrame {
            nodes: &mut *nodes,
            active: &self.active,
            active_mask: &self.active_mask,
            links: &self.links,
            alpha: self.alpha,
            rng: &mut self.rng,
        };
        for (_, force) in &mut self.forces {
            force.apply(&mut frame);
        }

        let retain = 1.0 - self.config.velocity_decay;
        for &index in &self.active {
            let node = &mut nodes[index];
            match node.pinned {
                Some(pin) => {
                    node.position = pin;
                    node.velocity = Vec2::ZERO;
                }
                None => {
                    node.position += node.velocity;
                    node.velocity *= retain;
                }
            }
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        if let Some(callback) = self.on_step.as_mut() {
            callback(&StepFrame {
                nodes,
                active: &self.active,
                links: &self.links,
                alpha: self.alpha,
            });
        }
        true
    }
}
