use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use eframe::egui::{Color32, Vec2};

use crate::error::GraphError;
use crate::util::phyllotaxis;

use super::record::{UserId, UserRecord, check_in_duration_hours, parse_check_in_time};

#[derive(Clone, Debug)]
pub struct UserNode {
    pub id: UserId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pinned: Option<Vec2>,
    pub radius: f32,
    pub connections: Vec<UserId>,
    pub check_ins: Vec<DateTime<Utc>>,
    pub check_in_duration: f32,
    pub check_in_frequency: usize,
    pub cluster: Option<usize>,
    pub color: Option<Color32>,
}

impl UserNode {
    pub fn from_record(record: UserRecord, index: usize) -> Result<Self, GraphError> {
        let mut check_ins = record
            .check_in_time
            .iter()
            .map(|raw| parse_check_in_time(&record.user_id, raw))
            .collect::<Result<Vec<_>, _>>()?;
        check_ins.sort_unstable();

        let mut connections = record.connections;
        connections.retain(|id| id != &record.user_id);
        connections.sort_unstable();
        connections.dedup();

        Ok(Self {
            position: phyllotaxis(index),
            velocity: Vec2::ZERO,
            pinned: None,
            radius: Self::base_radius(connections.len()),
            check_in_duration: check_in_duration_hours(&check_ins),
            check_in_frequency: check_ins.len(),
            id: record.user_id,
            connections,
            check_ins,
            cluster: None,
            color: None,
        })
    }

    pub fn base_radius(connection_count: usize) -> f32 {
        2.0 + (connection_count as f32).sqrt()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }
}

/// Undirected link, stored with `source < target`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserLink {
    pub source: UserId,
    pub target: UserId,
    pub weight: usize,
}

#[derive(Clone, Debug)]
pub struct UserGraph {
    pub nodes: Vec<UserNode>,
    pub links: Vec<UserLink>,
    index_by_id: HashMap<UserId, usize>,
}

impl UserGraph {
    pub fn from_records(records: Vec<UserRecord>) -> Result<Self, GraphError> {
        let mut nodes = Vec::with_capacity(records.len());
        let mut index_by_id = HashMap::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            if index_by_id.contains_key(&record.user_id) {
                return Err(GraphError::DuplicateUser(record.user_id));
            }
            index_by_id.insert(record.user_id.clone(), index);
            nodes.push(UserNode::from_record(record, index)?);
        }

        let links = derive_links(&nodes, &index_by_id);
        log::debug!("derived {} links for {} users", links.len(), nodes.len());

        Ok(Self {
            nodes,
            links,
            index_by_id,
        })
    }

    pub fn index_of(&self, id: &UserId) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &UserId) -> Option<&UserNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn rederive_links(&mut self) {
        self.links = derive_links(&self.nodes, &self.index_by_id);
    }
}

fn derive_links(nodes: &[UserNode], index_by_id: &HashMap<UserId, usize>) -> Vec<UserLink> {
    let mut weights: BTreeMap<(&UserId, &UserId), usize> = BTreeMap::new();
    let mut dangling = 0usize;

    for node in nodes {
        for connection in &node.connections {
            if !index_by_id.contains_key(connection) {
                dangling += 1;
                continue;
            }
            if connection == &node.id {
                continue;
            }

            // Weight is the lister's degree; when both sides list it, the lower id wins.
            let weight = node.connection_count();
            if node.id < *connection {
                weights.insert((&node.id, connection), weight);
            } else {
                weights.entry((connection, &node.id)).or_insert(weight);
            }
        }
    }

    if dangling > 0 {
        log::debug!("dropped {dangling} connections pointing outside the dataset");
    }

    weights
        .into_iter()
        .map(|((source, target), weight)| UserLink {
            source: source.clone(),
            target: target.clone(),
            weight,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, connections: &[i64]) -> UserRecord {
        UserRecord {
            user_id: UserId::from(id),
            connections: connections.iter().copied().map(UserId::from).collect(),
            check_in_time: Vec::new(),
        }
    }

    #[test]
    fn frequency_counts_every_timestamp() {
        let mut raw = record(1, &[]);
        raw.check_in_time = vec![
            "2010-10-19T10:00:00Z".to_owned(),
            "2010-10-19T10:00:00Z".to_owned(),
            "2010-10-18T09:00:00Z".to_owned(),
        ];
        let node = UserNode::from_record(raw, 0).unwrap();
        assert_eq!(node.check_in_frequency, 3);
        assert_eq!(node.check_in_frequency, node.check_ins.len());
        assert!(node.check_ins.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn connections_are_a_set_without_self() {
        let node = UserNode::from_record(record(1, &[2, 2, 1, 3]), 0).unwrap();
        assert_eq!(node.connections, vec![UserId::from(2), UserId::from(3)]);
    }

    #[test]
    fn duplicate_users_are_rejected() {
        let error = UserGraph::from_records(vec![record(1, &[]), record(1, &[])]).unwrap_err();
        assert_eq!(error, GraphError::DuplicateUser(UserId::from(1)));
    }

    #[test]
    fn dangling_connections_produce_no_links() {
        let graph = UserGraph::from_records(vec![record(1, &[2, 99]), record(2, &[])]).unwrap();
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0].source, UserId::from(1));
        assert_eq!(graph.links[0].target, UserId::from(2));
        assert_eq!(graph.links[0].weight, 2);
    }

    #[test]
    fn one_sided_connection_takes_the_listing_users_weight() {
        let graph = UserGraph::from_records(vec![record(1, &[]), record(2, &[1])]).unwrap();
        assert_eq!(graph.links.len(), 1);
        let link = &graph.links[0];
        assert_eq!((&link.source, &link.target), (&UserId::from(1), &UserId::from(2)));
        assert_eq!(link.weight, 1);
    }

    #[test]
    fn mutual_connection_weight_ignores_input_order() {
        let forward =
            UserGraph::from_records(vec![record(1, &[2]), record(2, &[1, 3]), record(3, &[])])
                .unwrap();
        let backward =
            UserGraph::from_records(vec![record(3, &[]), record(2, &[1, 3]), record(1, &[2])])
                .unwrap();
        assert_eq!(forward.links, backward.links);
        assert_eq!(forward.links[0].weight, 1);
        assert_eq!(forward.links[1].weight, 2);
    }

    #[test]
    fn rederiving_links_is_idempotent() {
        let mut graph =
            UserGraph::from_records(vec![record(3, &[1]), record(1, &[2, 3]), record(2, &[1])])
                .unwrap();
        let first = graph.links.clone();
        graph.rederive_links();
        assert_eq!(graph.links, first);
    }
}
