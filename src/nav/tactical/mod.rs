mod model;
mod systems;
mod table;

#[cfg(test)]
mod tests;

pub use model::{ExposureProbe, TacticalInputs, TacticalModel, TacticalTuning, ThreatSource};
pub use systems::{refresh_tactical_weights, refresh_weights, RefreshWeights, WeightRefreshTimer};
pub use table::{TacticalClass, TacticalWeights, WeightTable};
