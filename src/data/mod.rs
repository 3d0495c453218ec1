mod graph;
mod load;
mod record;
mod stats;

pub use graph::{UserGraph, UserLink, UserNode};
pub use load::{load_user_graph, parse_user_records};
pub use record::{UserId, UserRecord, check_in_duration_hours, parse_check_in_time};
pub use stats::{highly_engaged, peak_check_in_hours};
