use bevy::prelude::*;
use std::fmt;

/// Which end of a query failed to resolve onto the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryEnd {
    Start,
    Goal,
}

/// Why a single input triangle was left out of a bake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MalformedReason {
    /// A corner index points past the end of the vertex array.
    IndexOutOfRange,
    /// Two or more corners welded onto the same vertex.
    Degenerate,
    /// One of the triangle's edges is already shared by two earlier triangles.
    NonManifoldEdge,
    /// The index array length is not a multiple of three; trailing indices ignored.
    TruncatedIndices,
}

/// A triangle skipped during graph construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MalformedTriangle {
    /// Index of the triangle in the input (index array offset / 3).
    pub triangle: usize,
    pub reason: MalformedReason,
}

/// Failures reported by the navigation core.
///
/// None of these abort anything: bakes degrade by skipping triangles and
/// queries hand the error back to the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum NavError {
    /// The bake skipped one or more triangles. The graph is still usable.
    MalformedTopology { skipped: Vec<MalformedTriangle> },
    /// Start or goal is not over any cell of the surface.
    PointOffSurface { point: Vec3, which: QueryEnd },
    /// Pruning was requested before goal bounds finished and the
    /// configured policy does not fall back.
    PreprocessingNotReady,
    /// The open set ran dry before the goal cell was reached.
    NoPathFound { cells_expanded: usize },
    /// A query or preprocessing step ran against a graph with no cells.
    EmptySurface,
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::MalformedTopology { skipped } => {
                write!(f, "malformed topology: {} triangle(s) skipped", skipped.len())
            }
            NavError::PointOffSurface { point, which } => {
                write!(f, "{:?} point {} is not on the walkable surface", which, point)
            }
            NavError::PreprocessingNotReady => {
                write!(f, "goal bounds are still being preprocessed")
            }
            NavError::NoPathFound { cells_expanded } => {
                write!(f, "no path found after expanding {} cells", cells_expanded)
            }
            NavError::EmptySurface => write!(f, "navigation surface has no cells"),
        }
    }
}

impl std::error::Error for NavError {}
