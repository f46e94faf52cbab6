pub mod grid;
pub mod metric;
pub mod series;

pub use grid::*;
pub use metric::*;
pub use series::*;
