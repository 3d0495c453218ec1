//! Force-directed layout, clustering and filtering for check-in social graphs.
//!
//! The library owns the node universe ([`data::UserGraph`]) and the physics
//! ([`layout::ForceSimulation`]); [`layout::SimulationContext`] ties them together
//! behind the controls a viewer needs (filter, cluster, reset, drag).

pub mod attribute;
pub mod data;
pub mod error;
pub mod layout;
pub mod util;

pub use attribute::{Attribute, AttributeRange, RangeTable};
pub use error::GraphError;
