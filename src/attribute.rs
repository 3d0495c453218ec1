use std::fmt;
use std::str::FromStr;

use crate::data::UserNode;
use crate::error::GraphError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    Connections,
    Duration,
    Frequency,
}

impl Attribute {
    pub const ALL: [Self; 3] = [Self::Connections, Self::Duration, Self::Frequency];

    pub fn label(self) -> &'static str {
        match self {
            Self::Connections => "connections",
            Self::Duration => "duration",
            Self::Frequency => "frequency",
        }
    }

    pub fn accessor(self) -> fn(&UserNode) -> f32 {
        match self {
            Self::Connections => |node: &UserNode| node.connection_count() as f32,
            Self::Duration => |node: &UserNode| node.check_in_duration,
            Self::Frequency => |node: &UserNode| node.check_in_frequency as f32,
        }
    }

    pub fn value(self, node: &UserNode) -> f32 {
        (self.accessor())(node)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Attribute {
    type Err = GraphError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "connections" => Ok(Self::Connections),
            "duration" => Ok(Self::Duration),
            "frequency" => Ok(Self::Frequency),
            _ => Err(GraphError::MissingAttribute(value.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttributeRange {
    pub min: f32,
    pub max: f32,
}

impl AttributeRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn normalize(self, value: f32) -> f32 {
        let mut span = self.max - self.min;
        if span.abs() < f32::EPSILON {
            span = f32::EPSILON;
        }
        (value - self.min) / span
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RangeTable {
    pub connections: AttributeRange,
    pub duration: AttributeRange,
    pub frequency: AttributeRange,
}

impl RangeTable {
    pub fn get(&self, attribute: Attribute) -> AttributeRange {
        match attribute {
            Attribute::Connections => self.connections,
            Attribute::Duration => self.duration,
            Attribute::Frequency => self.frequency,
        }
    }

    pub fn set(&mut self, attribute: Attribute, range: AttributeRange) {
        match attribute {
            Attribute::Connections => self.connections = range,
            Attribute::Duration => self.duration = range,
            Attribute::Frequency => self.frequency = range,
        }
    }
}

impl Default for RangeTable {
    fn default() -> Self {
        Self {
            connections: AttributeRange::new(1.0, 64.0),
            duration: AttributeRange::new(0.0, 9684.83),
            frequency: AttributeRange::new(1.0, 2025.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names_case_insensitively() {
        assert_eq!("Frequency".parse::<Attribute>(), Ok(Attribute::Frequency));
        assert_eq!(" duration ".parse::<Attribute>(), Ok(Attribute::Duration));
    }

    #[test]
    fn unknown_name_is_reported() {
        assert_eq!(
            "latitude".parse::<Attribute>(),
            Err(GraphError::MissingAttribute("latitude".to_owned()))
        );
    }

    #[test]
    fn degenerate_range_does_not_divide_by_zero() {
        let range = AttributeRange::new(3.0, 3.0);
        assert!(range.normalize(3.0).is_finite());
        assert_eq!(range.normalize(3.0), 0.0);
    }
}
