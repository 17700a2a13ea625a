mod geometry;
mod hittest;
mod renderer;
mod spatial;
mod viewport;

pub use renderer::{MapLayers, MapRenderer};
pub use viewport::Viewport;
