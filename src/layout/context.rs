use eframe::egui::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::attribute::{Attribute, RangeTable};
use crate::data::{UserGraph, UserId, UserNode};
use crate::error::{GraphError, Result};

use super::cluster::{ClusterAssignment, assign_clusters};
use super::collision::{CollisionForce, CollisionParams};
use super::filter::{FilterThresholds, FilteredView, filter};
use super::forces::{Axis, CenterForce, ClusterAxisForce, LinkForce, ManyBodyForce};
use super::simulation::{
    CENTER_FORCE, CHARGE_FORCE, CLUSTER_X_FORCE, CLUSTER_Y_FORCE, COLLISION_FORCE, ForceSimulation,
    LINK_FORCE, ResolvedLink, SimulationConfig, StepCallback,
};

const FILTER_ALPHA: f32 = 0.05;
const CLUSTER_ALPHA: f32 = 0.5;
const RESET_ALPHA: f32 = 1.0;
const DRAG_ALPHA_TARGET: f32 = 0.1;

/// Owns the node universe and the simulation driving it, and exposes the
/// operations a viewer performs between frames.
pub struct SimulationContext {
    graph: UserGraph,
    simulation: ForceSimulation,
    ranges: RangeTable,
    view: FilteredView,
    thresholds: Option<FilterThresholds>,
    clustering: Option<ClusterAssignment>,
    dragging: Option<usize>,
    rng: StdRng,
}

impl SimulationContext {
    pub fn new(graph: UserGraph, config: SimulationConfig) -> Self {
        Self::from_parts(graph, ForceSimulation::new(config), StdRng::from_entropy())
    }

    pub fn with_seed(graph: UserGraph, config: SimulationConfig, seed: u64) -> Self {
        Self::from_parts(
            graph,
            ForceSimulation::with_seed(config, seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )
    }

    fn from_parts(graph: UserGraph, simulation: ForceSimulation, rng: StdRng) -> Self {
        let view = FilteredView::all(graph.node_count(), graph.link_count());
        let mut context = Self {
            graph,
            simulation,
            ranges: RangeTable::default(),
            view,
            thresholds: None,
            clustering: None,
            dragging: None,
            rng,
        };
        context.install_base_forces();
        context.apply_view();
        context
    }

    pub fn graph(&self) -> &UserGraph {
        &self.graph
    }

    pub fn nodes(&self) -> &[UserNode] {
        &self.graph.nodes
    }

    pub fn simulation(&self) -> &ForceSimulation {
        &self.simulation
    }

    pub fn ranges(&self) -> &RangeTable {
        &self.ranges
    }

    pub fn set_ranges(&mut self, ranges: RangeTable) {
        self.ranges = ranges;
    }

    pub fn thresholds(&self) -> Option<&FilterThresholds> {
        self.thresholds.as_ref()
    }

    pub fn clustering(&self) -> Option<&ClusterAssignment> {
        self.clustering.as_ref()
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    pub fn links_visible(&self) -> bool {
        self.clustering.is_none()
    }

    pub fn active_nodes(&self) -> &[usize] {
        self.simulation.active()
    }

    pub fn active_links(&self) -> &[ResolvedLink] {
        self.simulation.links()
    }

    pub fn is_filtered(&self) -> bool {
        self.thresholds.is_some()
    }

    pub fn passes_filter(&self, index: usize) -> bool {
        self.thresholds.is_none() || self.simulation.is_active(index)
    }

    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    pub fn set_filter_thresholds(&mut self, thresholds: FilterThresholds) {
        self.view = filter(&self.graph.nodes, &self.graph.links, &thresholds);
        self.thresholds = Some(thresholds);
        self.apply_view();
        self.simulation.set_alpha(FILTER_ALPHA);
        log::info!(
            "filter kept {} of {} users and {} of {} links",
            self.view.nodes.len(),
            self.graph.node_count(),
            self.view.links.len(),
            self.graph.link_count()
        );
    }

    pub fn set_cluster_attribute(&mut self, attribute: Attribute) {
        let config = self.simulation.config().clone();
        let assignment = assign_clusters(
            &self.graph.nodes,
            attribute,
            &self.ranges,
            config.canvas,
            &mut self.rng,
        );
        assignment.apply_to(&mut self.graph.nodes, &self.ranges);

        let anchors = assignment.anchors();
        self.simulation.insert_force(
            CLUSTER_X_FORCE,
            Box::new(ClusterAxisForce::new(
                Axis::X,
                anchors.clone(),
                config.cluster_axis_strength,
            )),
        );
        self.simulation.insert_force(
            CLUSTER_Y_FORCE,
            Box::new(ClusterAxisForce::new(
                Axis::Y,
                anchors,
                config.cluster_axis_strength,
            )),
        );
        self.install_collision(config.cluster_collision);
        self.simulation.set_alpha(CLUSTER_ALPHA);

        log::info!(
            "clustered {} users by {attribute} into {} groups",
            self.graph.node_count(),
            assignment.clusters.len()
        );
        self.clustering = Some(assignment);
    }

    pub fn set_cluster_attribute_named(&mut self, name: &str) -> Result<()> {
        let attribute = name.parse::<Attribute>()?;
        self.set_cluster_attribute(attribute);
        Ok(())
    }

    pub fn reset_view(&mut self) {
        for node in &mut self.graph.nodes {
            node.cluster = None;
            node.color = None;
            node.radius = UserNode::base_radius(node.connection_count());
        }
        self.clustering = None;
        self.thresholds = None;
        self.view = FilteredView::all(self.graph.node_count(), self.graph.link_count());

        self.simulation.remove_force(CLUSTER_X_FORCE);
        self.simulation.remove_force(CLUSTER_Y_FORCE);
        self.install_base_forces();
        self.apply_view();
        self.simulation.set_alpha(RESET_ALPHA);
        log::info!("view reset to all {} users", self.graph.node_count());
    }

    pub fn drag_start(&mut self, id: &UserId, position: Vec2) -> Result<bool> {
        let index = self.require(id)?;
        if !self.simulation.pin(&mut self.graph.nodes, index, position) {
            return Ok(false);
        }
        self.simulation.restart(DRAG_ALPHA_TARGET);
        self.dragging = Some(index);
        Ok(true)
    }

    pub fn drag_move(&mut self, id: &UserId, position: Vec2) -> Result<bool> {
        let index = self.require(id)?;
        Ok(self.simulation.pin(&mut self.graph.nodes, index, position))
    }

    pub fn drag_end(&mut self, id: &UserId) -> Result<bool> {
        let index = self.require(id)?;
        self.simulation.set_alpha_target(0.0);
        if self.dragging == Some(index) {
            self.dragging = None;
        }
        Ok(self.simulation.unpin(&mut self.graph.nodes, index))
    }

    pub fn reheat(&mut self, alpha: f32) {
        self.simulation.set_alpha(alpha);
    }

    pub fn tick(&mut self) -> bool {
        let stepped = self.simulation.step(&mut self.graph.nodes);
        if stepped && self.simulation.is_settled() {
            self.refresh_cluster_density();
        }
        stepped
    }

    pub fn run(&mut self, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps && self.tick() {
            steps += 1;
        }
        self.refresh_cluster_density();
        steps
    }

    pub fn refresh_cluster_density(&mut self) {
        if let Some(assignment) = self.clustering.as_mut() {
            assignment.refresh_density(&self.graph.nodes);
        }
    }

    pub fn on_step(&mut self, callback: StepCallback) {
        self.simulation.on_step(callback);
    }

    pub fn clear_on_step(&mut self) {
        self.simulation.clear_on_step();
    }

    pub fn is_settled(&self) -> bool {
        self.simulation.is_settled()
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        let nodes = self
            .simulation
            .active()
            .iter()
            .map(|&index| {
                let node = &self.graph.nodes[index];
                NodeSnapshot {
                    id: node.id.clone(),
                    x: node.position.x,
                    y: node.position.y,
                    radius: node.radius,
                    cluster: node.cluster,
                }
            })
            .collect();

        let links = if self.links_visible() {
            self.simulation
                .links()
                .iter()
                .map(|link| LinkSnapshot {
                    source: self.graph.nodes[link.source].id.clone(),
                    target: self.graph.nodes[link.target].id.clone(),
                    weight: link.weight,
                })
                .collect()
        } else {
            Vec::new()
        };

        let clusters = self
            .clustering
            .iter()
            .flat_map(|assignment| &assignment.clusters)
            .map(|cluster| ClusterSnapshot {
                key: cluster.key,
                anchor: [cluster.anchor.x, cluster.anchor.y],
                size: cluster.members.len(),
                density: cluster.density,
            })
            .collect();

        LayoutSnapshot {
            alpha: self.simulation.alpha(),
            nodes,
            links,
            clusters,
        }
    }

    fn require(&self, id: &UserId) -> Result<usize> {
        self.graph
            .index_of(id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    fn install_base_forces(&mut self) {
        let config = self.simulation.config().clone();
        self.simulation
            .insert_force(LINK_FORCE, Box::new(LinkForce::new(config.link_distance)));
        self.simulation.insert_force(
            CHARGE_FORCE,
            Box::new(ManyBodyForce::new(config.charge_strength)),
        );
        self.simulation.insert_force(
            CENTER_FORCE,
            Box::new(CenterForce::new(Vec2::ZERO, config.center_strength)),
        );
        self.install_collision(config.base_collision);
    }

    fn install_collision(&mut self, params: CollisionParams) {
        self.simulation
            .insert_force(COLLISION_FORCE, Box::new(CollisionForce::new(params)));
    }

    fn apply_view(&mut self) {
        self.simulation
            .set_nodes(&mut self.graph.nodes, self.view.nodes.clone());
        self.simulation.set_links(
            &self.graph,
            self.view.links.iter().map(|&index| &self.graph.links[index]),
        );
        if self
            .dragging
            .is_some_and(|index| !self.simulation.is_active(index))
        {
            self.dragging = None;
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NodeSnapshot {
    pub id: UserId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub cluster: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LinkSnapshot {
    pub source: UserId,
    pub target: UserId,
    pub weight: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClusterSnapshot {
    pub key: usize,
    pub anchor: [f32; 2],
    pub size: usize,
    pub density: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct LayoutSnapshot {
    pub alpha: f32,
    pub nodes: Vec<NodeSnapshot>,
    pub links: Vec<LinkSnapshot>,
    pub clusters: Vec<ClusterSnapshot>,
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::data::UserRecord;

    fn context() -> SimulationContext {
        let records = [(1, vec![2, 3]), (2, vec![1]), (3, vec![1]), (4, vec![])]
            .into_iter()
            .map(|(id, connections)| UserRecord {
                user_id: UserId::from(id),
                connections: connections.into_iter().map(UserId::from).collect(),
                check_in_time: Vec::new(),
            })
            .collect();
        let graph = UserGraph::from_records(records).unwrap();
        SimulationContext::with_seed(graph, SimulationConfig::default(), 42)
    }

    #[test]
    fn starts_with_everything_active() {
        let context = context();
        assert_eq!(context.active_nodes(), &[0, 1, 2, 3]);
        assert_eq!(context.active_links().len(), 2);
        assert!(context.links_visible());
        assert_eq!(context.simulation().alpha(), 1.0);
    }

    #[test]
    fn filtering_swaps_the_working_set_and_cools_alpha() {
        let mut context = context();
        context.set_filter_thresholds(FilterThresholds::default().with(Attribute::Connections, 1.0));
        assert_eq!(context.active_nodes(), &[1, 2, 3]);
        assert_eq!(context.active_links().len(), 2);
        assert_eq!(context.simulation().alpha(), FILTER_ALPHA);
        assert!(!context.passes_filter(0));
    }

    #[test]
    fn clustering_hides_links_and_installs_axis_forces() {
        let mut context = context();
        context.set_cluster_attribute(Attribute::Connections);
        assert!(!context.links_visible());
        assert!(context.simulation().has_force(CLUSTER_X_FORCE));
        assert!(context.simulation().has_force(CLUSTER_Y_FORCE));
        assert!(context.simulation().has_force(LINK_FORCE));
        assert_eq!(context.simulation().alpha(), CLUSTER_ALPHA);
        assert!(context.nodes().iter().all(|node| node.color.is_some()));
        assert!(context.snapshot().links.is_empty());
    }

    #[test]
    fn unknown_cluster_attribute_is_reported() {
        let mut context = context();
        let error = context.set_cluster_attribute_named("age").unwrap_err();
        assert_eq!(error, GraphError::MissingAttribute("age".to_owned()));
        assert!(context.clustering().is_none());
    }

    #[test]
    fn reset_restores_base_state() {
        let mut context = context();
        context.set_cluster_attribute(Attribute::Connections);
        context.set_filter_thresholds(FilterThresholds::default().with(Attribute::Frequency, 0.0));
        context.run(20);
        context.reset_view();

        assert!(context.clustering().is_none());
        assert!(context.thresholds().is_none());
        assert!(!context.simulation().has_force(CLUSTER_X_FORCE));
        assert_eq!(context.active_nodes().len(), 4);
        assert_eq!(context.simulation().alpha(), RESET_ALPHA);
        let hub = &context.nodes()[0];
        assert_eq!(hub.radius, UserNode::base_radius(2));
        assert_eq!(hub.cluster, None);
    }

    #[test]
    fn drag_pins_and_releases() {
        let mut context = context();
        context.run(1000);
        assert!(context.is_settled());

        let id = UserId::from(2);
        assert!(context.drag_start(&id, vec2(10.0, 10.0)).unwrap());
        assert!(!context.is_settled());
        assert_eq!(context.simulation().alpha_target(), DRAG_ALPHA_TARGET);
        assert!(context.drag_move(&id, vec2(30.0, -5.0)).unwrap());
        context.tick();
        assert_eq!(context.nodes()[1].position, vec2(30.0, -5.0));

        assert!(context.drag_end(&id).unwrap());
        assert_eq!(context.simulation().alpha_target(), 0.0);
        assert!(!context.nodes()[1].is_pinned());
        assert_eq!(context.dragging(), None);
    }

    #[test]
    fn dragging_unknown_or_hidden_users() {
        let mut context = context();
        let missing = UserId::from(99);
        assert_eq!(
            context.drag_start(&missing, Vec2::ZERO),
            Err(GraphError::UnknownNode(missing))
        );

        context.set_filter_thresholds(FilterThresholds::default().with(Attribute::Connections, 1.0));
        assert!(!context.drag_start(&UserId::from(1), Vec2::ZERO).unwrap());
    }

    #[test]
    fn filtering_drops_a_pin_outside_the_view() {
        let mut context = context();
        let id = UserId::from(1);
        context.drag_start(&id, Vec2::ZERO).unwrap();
        context.set_filter_thresholds(FilterThresholds::default().with(Attribute::Connections, 1.0));
        assert!(!context.nodes()[0].is_pinned());
        assert_eq!(context.dragging(), None);
    }

    #[test]
    fn run_stops_when_settled() {
        let mut context = context();
        let steps = context.run(10_000);
        assert!(steps < 10_000);
        assert!(context.is_settled());
        assert!(context.nodes().iter().all(|node| node.position.is_finite()));
    }
}
