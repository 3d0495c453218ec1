mod cluster;
mod collision;
mod context;
mod filter;
mod forces;
mod quadtree;
mod simulation;

pub use cluster::{
    CLUSTER_COUNT, CLUSTER_PALETTE, Cluster, ClusterAssignment, assign_clusters, cluster_color,
    cluster_density, cluster_key, radius_for_attribute,
};
pub use collision::{CollisionForce, CollisionParams};
pub use context::{ClusterSnapshot, LayoutSnapshot, LinkSnapshot, NodeSnapshot, SimulationContext};
pub use filter::{FilterThresholds, FilteredView, filter};
pub use forces::{Axis, CenterForce, ClusterAxisForce, Force, ForceFrame, LinkForce, ManyBodyForce};
pub use quadtree::{QuadBounds, QuadCell, QuadtreeCell, SpatialIndex};
pub use simulation::{
    CENTER_FORCE, CHARGE_FORCE, CLUSTER_X_FORCE, CLUSTER_Y_FORCE, COLLISION_FORCE, ForceSimulation,
    LINK_FORCE, ResolvedLink, SimulationConfig, StepCallback, StepFrame,
};
