use eframe::egui::{Color32, Vec2, vec2};
use rand::Rng;

use crate::attribute::{Attribute, AttributeRange, RangeTable};
use crate::data::UserNode;

pub const CLUSTER_COUNT: usize = 4;

pub const CLUSTER_PALETTE: [Color32; CLUSTER_COUNT] = [
    Color32::from_rgb(0x37, 0x16, 0x10),
    Color32::from_rgb(0x88, 0x28, 0x1a),
    Color32::from_rgb(0xec, 0x49, 0x31),
    Color32::from_rgb(0xbd, 0xac, 0xa9),
];

const CLUSTER_MIN_RADIUS: f32 = 5.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub key: usize,
    pub anchor: Vec2,
    pub members: Vec<usize>,
    pub density: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterAssignment {
    pub attribute: Attribute,
    pub keys: Vec<usize>,
    pub clusters: Vec<Cluster>,
}

impl ClusterAssignment {
    pub fn cluster(&self, key: usize) -> Option<&Cluster> {
        self.clusters.iter().find(|cluster| cluster.key == key)
    }

    pub fn anchors(&self) -> Vec<Option<Vec2>> {
        let mut anchors = vec![None; CLUSTER_COUNT];
        for cluster in &self.clusters {
            anchors[cluster.key] = Some(cluster.anchor);
        }
        anchors
    }

    pub fn apply_to(&self, nodes: &mut [UserNode], ranges: &RangeTable) {
        for (node, &key) in nodes.iter_mut().zip(&self.keys) {
            node.cluster = Some(key);
            node.color = Some(cluster_color(key));
            node.radius = radius_for_attribute(node, self.attribute, ranges);
        }
    }

    pub fn refresh_density(&mut self, nodes: &[UserNode]) {
        let mut positions = Vec::new();
        for cluster in &mut self.clusters {
            positions.clear();
            positions.extend(cluster.members.iter().map(|&index| nodes[index].position));
            cluster.density = cluster_density(&positions);
        }
    }
}

/// Bucket a value into `0..CLUSTER_COUNT`. Values outside `range` land in the
/// nearest end bucket; non-finite values land in bucket 0.
pub fn cluster_key(value: f32, range: AttributeRange) -> usize {
    let scaled = (range.normalize(value) * (CLUSTER_COUNT - 1) as f32).floor();
    if !scaled.is_finite() || scaled < 0.0 {
        return 0;
    }
    (scaled as usize).min(CLUSTER_COUNT - 1)
}

pub fn cluster_color(key: usize) -> Color32 {
    CLUSTER_PALETTE[key % CLUSTER_COUNT]
}

pub fn assign_clusters(
    nodes: &[UserNode],
    attribute: Attribute,
    ranges: &RangeTable,
    canvas: Vec2,
    rng: &mut impl Rng,
) -> ClusterAssignment {
    let value = attribute.accessor();
    let range = ranges.get(attribute);
    let half = canvas * 0.5;

    let mut keys = Vec::with_capacity(nodes.len());
    let mut clusters: Vec<Cluster> = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        let key = cluster_key(value(node), range);
        keys.push(key);

        match clusters.iter_mut().find(|cluster| cluster.key == key) {
            Some(cluster) => cluster.members.push(index),
            None => {
                let anchor = vec2(
                    rng.gen_range(-half.x..=half.x),
                    rng.gen_range(-half.y..=half.y),
                );
                log::debug!("cluster {key} anchored at ({:.1}, {:.1})", anchor.x, anchor.y);
                clusters.push(Cluster {
                    key,
                    anchor,
                    members: vec![index],
                    density: 0.0,
                });
            }
        }
    }

    let mut assignment = ClusterAssignment {
        attribute,
        keys,
        clusters,
    };
    assignment.refresh_density(nodes);
    assignment
}

pub fn cluster_density(positions: &[Vec2]) -> f32 {
    if positions.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0_f64;
    let mut pairs = 0usize;
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            total += f64::from((*a - *b).length());
            pairs += 1;
        }
    }
    (total / pairs as f64) as f32
}

fn radius_span(attribute: Attribute) -> f32 {
    match attribute {
        Attribute::Connections => 15.0,
        Attribute::Duration => 10.0,
        Attribute::Frequency => 20.0,
    }
}

pub fn radius_for_attribute(node: &UserNode, attribute: Attribute, ranges: &RangeTable) -> f32 {
    let t = ranges.get(attribute).normalize(attribute.value(node));
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    CLUSTER_MIN_RADIUS + t * radius_span(attribute)
}
