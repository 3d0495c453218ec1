use chrono::Timelike;

use crate::attribute::Attribute;
use crate::util::{quantile, sorted_values};

use super::graph::{UserGraph, UserNode};

const HUB_QUANTILE: f32 = 0.9;
const ENGAGEMENT_QUANTILE: f32 = 0.75;

impl UserGraph {
    pub fn top_by(&self, attribute: Attribute) -> Option<&UserNode> {
        let value = attribute.accessor();
        self.nodes.iter().fold(None, |best: Option<&UserNode>, node| match best {
            Some(current) if value(current) >= value(node) => Some(current),
            _ => Some(node),
        })
    }

    pub fn hub_threshold(&self) -> f32 {
        let counts = sorted_values(self.nodes.iter().map(|node| node.connection_count() as f32));
        quantile(&counts, HUB_QUANTILE).unwrap_or(0.0)
    }

    pub fn is_hub(node: &UserNode, threshold: f32) -> bool {
        node.connection_count() as f32 >= threshold
    }
}

pub fn highly_engaged<'a>(nodes: &[&'a UserNode]) -> Vec<&'a UserNode> {
    let frequencies = sorted_values(nodes.iter().map(|node| node.check_in_frequency as f32));
    let durations = sorted_values(nodes.iter().map(|node| node.check_in_duration));
    let (Some(frequency_floor), Some(duration_floor)) = (
        quantile(&frequencies, ENGAGEMENT_QUANTILE),
        quantile(&durations, ENGAGEMENT_QUANTILE),
    ) else {
        return Vec::new();
    };

    nodes
        .iter()
        .copied()
        .filter(|node| {
            node.check_in_frequency as f32 >= frequency_floor
                && node.check_in_duration >= duration_floor
        })
        .collect()
}

pub fn peak_check_in_hours(node: &UserNode) -> Vec<u32> {
    let mut counts = [0usize; 24];
    for check_in in &node.check_ins {
        counts[check_in.hour() as usize] += 1;
    }

    let peak = counts.iter().copied().max().unwrap_or(0);
    if peak == 0 {
        return Vec::new();
    }

    (0u32..24)
        .filter(|&hour| counts[hour as usize] == peak)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{UserId, UserRecord};

    fn graph() -> UserGraph {
        let records = vec![
            UserRecord {
                user_id: UserId::from(1),
                connections: vec![UserId::from(2), UserId::from(3)],
                check_in_time: vec![
                    "2010-10-19T08:10:00Z".to_owned(),
                    "2010-10-20T08:40:00Z".to_owned(),
                    "2010-10-21T17:00:00Z".to_owned(),
                ],
            },
            UserRecord {
                user_id: UserId::from(2),
                connections: vec![UserId::from(1)],
                check_in_time: vec!["2010-10-19T09:00:00Z".to_owned()],
            },
            UserRecord {
                user_id: UserId::from(3),
                connections: vec![UserId::from(1)],
                check_in_time: Vec::new(),
            },
        ];
        UserGraph::from_records(records).unwrap()
    }

    #[test]
    fn top_user_per_attribute() {
        let graph = graph();
        let top = graph.top_by(Attribute::Connections).unwrap();
        assert_eq!(top.id, UserId::from(1));
        let top = graph.top_by(Attribute::Frequency).unwrap();
        assert_eq!(top.id, UserId::from(1));
    }

    #[test]
    fn peak_hours_pick_the_busiest_hour() {
        let graph = graph();
        assert_eq!(peak_check_in_hours(&graph.nodes[0]), vec![8]);
        assert!(peak_check_in_hours(&graph.nodes[2]).is_empty());
    }

    #[test]
    fn engaged_users_clear_both_percentiles() {
        let graph = graph();
        let subset = graph.nodes.iter().collect::<Vec<_>>();
        let engaged = highly_engaged(&subset);
        assert_eq!(engaged.len(), 1);
        assert_eq!(engaged[0].id, UserId::from(1));
        assert!(highly_engaged(&[]).is_empty());
    }

    #[test]
    fn hub_threshold_uses_ninetieth_percentile() {
        let graph = graph();
        // counts sorted: [1, 1, 2] -> position 1.8 -> 1 + 0.8 * 1
        assert!((graph.hub_threshold() - 1.8).abs() < 1e-5);
        assert!(UserGraph::is_hub(&graph.nodes[0], graph.hub_threshold()));
        assert!(!UserGraph::is_hub(&graph.nodes[1], graph.hub_threshold()));
    }
}
