mod cache;
mod job;
mod preprocess;
mod rect;
mod systems;


pub use cache::{cache_path, load_bounds, save_bounds, BOUNDS_CACHE_VERSION};
pub use job::{GoalBoundsJob, GoalBoundsStep};
pub use preprocess::{sweep_source, EdgeBound, GoalBounds, SourceBounds, SweepScratch};
pub use rect::BoundingRect;
pub use systems::{step_goal_bounds, RebuildGoalBounds};
