use std::collections::HashSet;

use crate::attribute::Attribute;
use crate::data::{UserId, UserLink, UserNode};

/// Upper bounds per attribute. A node passes when any bound that is set
/// admits it, so adding a bound can only widen the result.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FilterThresholds {
    pub connections: Option<f32>,
    pub duration: Option<f32>,
    pub frequency: Option<f32>,
}

impl FilterThresholds {
    pub fn get(&self, attribute: Attribute) -> Option<f32> {
        match attribute {
            Attribute::Connections => self.connections,
            Attribute::Duration => self.duration,
            Attribute::Frequency => self.frequency,
        }
    }

    pub fn with(mut self, attribute: Attribute, threshold: f32) -> Self {
        let slot = match attribute {
            Attribute::Connections => &mut self.connections,
            Attribute::Duration => &mut self.duration,
            Attribute::Frequency => &mut self.frequency,
        };
        *slot = Some(threshold);
        self
    }

    pub fn is_empty(&self) -> bool {
        Attribute::ALL
            .iter()
            .all(|&attribute| self.get(attribute).is_none())
    }

    pub fn admits(&self, node: &UserNode) -> bool {
        Attribute::ALL.iter().any(|&attribute| {
            self.get(attribute)
                .is_some_and(|threshold| attribute.value(node) <= threshold)
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilteredView {
    pub nodes: Vec<usize>,
    pub links: Vec<usize>,
}

impl FilteredView {
    pub fn all(node_count: usize, link_count: usize) -> Self {
        Self {
            nodes: (0..node_count).collect(),
            links: (0..link_count).collect(),
        }
    }
}

pub fn filter(nodes: &[UserNode], links: &[UserLink], thresholds: &FilterThresholds) -> FilteredView {
    let kept_nodes = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| thresholds.admits(node))
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    let kept_ids = kept_nodes
        .iter()
        .map(|&index| &nodes[index].id)
        .collect::<HashSet<&UserId>>();
    let kept_links = links
        .iter()
        .enumerate()
        .filter(|(_, link)| kept_ids.contains(&link.source) || kept_ids.contains(&link.target))
        .map(|(index, _)| index)
        .collect();

    FilteredView {
        nodes: kept_nodes,
        links: kept_links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{UserGraph, UserRecord};

    fn graph() -> UserGraph {
        let records = vec![
            UserRecord {
                user_id: UserId::from(1),
                connections: vec![UserId::from(2), UserId::from(3), UserId::from(4)],
                check_in_time: vec![
                    "2010-10-01T00:00:00Z".to_owned(),
                    "2010-10-03T00:00:00Z".to_owned(),
                ],
            },
            UserRecord {
                user_id: UserId::from(2),
                connections: vec![UserId::from(1)],
                check_in_time: vec!["2010-10-01T00:00:00Z".to_owned()],
            },
            UserRecord {
                user_id: UserId::from(3),
                connections: vec![UserId::from(1), UserId::from(4)],
                check_in_time: Vec::new(),
            },
            UserRecord {
                user_id: UserId::from(4),
                connections: vec![UserId::from(1), UserId::from(3)],
                check_in_time: Vec::new(),
            },
        ];
        UserGraph::from_records(records).unwrap()
    }

    #[test]
    fn no_thresholds_admit_nothing() {
        let graph = graph();
        let view = filter(&graph.nodes, &graph.links, &FilterThresholds::default());
        assert!(view.nodes.is_empty());
        assert!(view.links.is_empty());
    }

    #[test]
    fn thresholds_are_inclusive_and_ored() {
        let graph = graph();
        let thresholds = FilterThresholds::default()
            .with(Attribute::Connections, 1.0)
            .with(Attribute::Frequency, 0.0);
        let view = filter(&graph.nodes, &graph.links, &thresholds);
        // user 2 by connections, users 3 and 4 by frequency
        assert_eq!(view.nodes, vec![1, 2, 3]);
    }

    #[test]
    fn a_link_needs_only_one_kept_endpoint() {
        let graph = graph();
        let thresholds = FilterThresholds::default().with(Attribute::Connections, 1.0);
        let view = filter(&graph.nodes, &graph.links, &thresholds);
        assert_eq!(view.nodes, vec![1]);
        assert_eq!(view.links.len(), 1);
        let link = &graph.links[view.links[0]];
        assert_eq!((&link.source, &link.target), (&UserId::from(1), &UserId::from(2)));
    }

    #[test]
    fn duration_threshold_uses_hours() {
        let graph = graph();
        let thresholds = FilterThresholds::default().with(Attribute::Duration, 47.0);
        let view = filter(&graph.nodes, &graph.links, &thresholds);
        assert_eq!(view.nodes, vec![1, 2, 3]);
        assert!(!thresholds.is_empty());
    }
}
