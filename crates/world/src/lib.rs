#![warn(missing_docs)]
//! World-side collaborators of the crop engine: coordinates, block vocabulary,
//! the world query seam, and environmental state (weather, day cycle).

pub mod blocks;
mod chunk;
mod grid;
mod query;
mod time;
mod weather;

pub use chunk::*;
pub use grid::*;
pub use query::*;
pub use time::*;
pub use weather::*;
