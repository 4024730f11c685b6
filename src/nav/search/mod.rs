mod astar;
mod metrics;
mod scratch;
mod systems;
mod types;


pub use astar::NavQuery;
pub use metrics::{path_length, tactical_score};
pub use scratch::SearchScratch;
pub use systems::{process_path_requests, DeferredPathRequests, NavPath, PathFailed, PathRequest, PathStats};
pub use types::{FoundPath, SearchMetrics, SearchSettings};
