mod build;
mod graph;
mod locate;
mod surface;
mod systems;
mod weld;


pub use build::build_graph;
pub use graph::{Cell, CellId, NavGraph};
pub use surface::RawSurface;
pub use systems::{bake_surface, BakeSurface, NavSurface, SurfaceBaked};
pub use weld::{weld_vertices, Weld};

pub(crate) use locate::surface_height;
